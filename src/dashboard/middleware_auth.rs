//! Acting-admin resolution for write routes.
//!
//! The admin panel sits behind the hosting platform's own login; requests
//! reach us with `Authorization: Bearer <jwt>` whose `sub` claim is the
//! numeric admin id. With `BULKVM_JWT_SECRET` set the token is verified
//! (HS256); without it the claims are read unverified for local setups.
//!
//! Identity never blocks a request. A missing or unusable token degrades to
//! the first enabled admin (or id 0) and is logged, so audit rows always
//! get written.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

use super::AppState;
use crate::store::ActorContext;

#[derive(Debug, Deserialize)]
struct AdminClaims {
    sub: String,
}

fn jwt_secret() -> Option<String> {
    std::env::var("BULKVM_JWT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Admin id carried by `token`.
fn decode_admin_id(token: &str, secret: Option<&str>) -> Result<i64, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    let claims = match secret {
        Some(secret) => {
            let key = DecodingKey::from_secret(secret.as_bytes());
            decode::<AdminClaims>(token, &key, &validation)
                .map_err(|e| format!("JWT verification failed: {}", e))?
                .claims
        }
        None => {
            validation.insecure_disable_signature_validation();
            validation.validate_exp = false;
            validation.required_spec_claims.clear();
            decode::<AdminClaims>(token, &DecodingKey::from_secret(b""), &validation)
                .map_err(|e| format!("JWT decode failed: {}", e))?
                .claims
        }
    };
    match claims.sub.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("subject {:?} is not an admin id", claims.sub)),
    }
}

fn session_admin_id(parts: &Parts) -> Result<i64, String> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "no Authorization header".to_string())?
        .to_str()
        .map_err(|_| "Authorization header is not ASCII".to_string())?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| "Authorization header is not a bearer token".to_string())?;
    decode_admin_id(token, jwt_secret().as_deref())
}

/// The admin on whose behalf the request acts.
pub struct Actor(pub ActorContext);

impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match session_admin_id(parts) {
            Ok(id) => Ok(Actor(ActorContext::session(id))),
            Err(reason) => {
                let fallback = match state.db.fallback_admin_id().await {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(error = %e, "fallback admin lookup failed");
                        None
                    }
                };
                let actor = ActorContext::fallback(fallback);
                warn!(
                    reason = %reason,
                    admin_id = actor.admin_id,
                    "no session identity, attributing changes to fallback admin"
                );
                Ok(Actor(actor))
            }
        }
    }
}
