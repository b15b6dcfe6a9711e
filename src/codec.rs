//! # Codec: Setting Value Encoding
//!
//! The Proxmox provisioning modules store every product setting as a JSON
//! document produced by PHP's `json_encode` with default flags. That encoder
//! differs from `serde_json` in two visible ways:
//!
//! - `/` is written as `\/`
//! - every non-ASCII character is written as a lowercase `\uXXXX` escape
//!   (UTF-16 surrogate pairs above the BMP)
//!
//! Values written by this crate must be byte-identical to what the module
//! itself writes, because the preview diff compares encoded text exactly.
//! [`PhpFormatter`] plugs that behavior into `serde_json`'s serializer.
//!
//! ## Encoded vs. display form
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`encode`] | display text typed by an admin | JSON string literal |
//! | [`decode`] | raw stored value | display text (raw on non-string scalars) |
//! | [`display`] | raw or proposed encoded value | display text for before/after tables |
//!
//! Array-shaped input is deliberately double encoded: `["a"]` is stored as
//! the JSON *string* `"[\"a\"]"`, matching the module's own convention.

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;

/// `serde_json` formatter reproducing PHP `json_encode` string escaping.
///
/// `escape_slashes = false` corresponds to `JSON_UNESCAPED_SLASHES`.
#[derive(Clone, Copy, Debug)]
pub struct PhpFormatter {
    pub escape_slashes: bool,
}

impl Formatter for PhpFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let slash = ch == '/' && self.escape_slashes;
            if !slash && ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            if slash {
                writer.write_all(b"\\/")?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

fn to_php_json<T: Serialize + ?Sized>(value: &T, escape_slashes: bool) -> String {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PhpFormatter { escape_slashes });
    if value.serialize(&mut ser).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

/// Encode a display value for storage (PHP `json_encode($value)`).
pub fn encode(value: &str) -> String {
    to_php_json(value, true)
}

/// Decode a stored value into its display form.
///
/// Arrays and objects become compact JSON, strings are returned verbatim, and
/// everything else (numbers, booleans, null, unparseable text) is returned
/// as the raw stored text.
pub fn decode(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Array(_) | Value::Object(_))) => compact(v),
        Ok(Value::String(s)) => s,
        _ => raw.to_string(),
    }
}

/// Display form of an encoded value in a preview table.
///
/// Same as [`decode`] except that numbers and booleans render as JSON text
/// and only null or a parse failure falls back to the encoded text.
pub fn display(encoded: &str) -> String {
    match serde_json::from_str::<Value>(encoded) {
        Ok(v @ (Value::Array(_) | Value::Object(_))) => compact(v),
        Ok(Value::String(s)) => s,
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        Ok(Value::Null) | Err(_) => encoded.to_string(),
    }
}

/// Compact re-serialization with unescaped slashes, after applying PHP array
/// semantics (a decoded object with keys `"0".."n-1"` is a list).
fn compact(value: Value) -> String {
    to_php_json(&php_array(value), false)
}

fn php_array(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(php_array).collect()),
        Value::Object(map) => {
            let is_list = map
                .keys()
                .enumerate()
                .all(|(i, key)| *key == i.to_string());
            if is_list {
                Value::Array(map.into_iter().map(|(_, v)| php_array(v)).collect())
            } else {
                Value::Object(map.into_iter().map(|(k, v)| (k, php_array(v))).collect())
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_plain_strings() {
        assert_eq!(encode("on"), r#""on""#);
        assert_eq!(encode(""), r#""""#);
        assert_eq!(encode("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn encode_escapes_slashes_like_php() {
        assert_eq!(encode("local/iso"), r#""local\/iso""#);
    }

    #[test]
    fn encode_escapes_non_ascii_as_lowercase_utf16() {
        assert_eq!(encode("café"), r#""caf\u00e9""#);
        assert_eq!(encode("😀"), r#""\ud83d\ude00""#);
    }

    #[test]
    fn encode_control_characters() {
        assert_eq!(encode("a\nb\tc"), r#""a\nb\tc""#);
        assert_eq!(encode("\u{1}"), r#""\u0001""#);
    }

    #[test]
    fn encode_double_encodes_array_shaped_values() {
        assert_eq!(encode(r#"["a","b"]"#), r#""[\"a\",\"b\"]""#);
        assert_eq!(encode("[]"), r#""[]""#);
    }

    #[test]
    fn decode_string_returns_inner_text() {
        assert_eq!(decode(r#""off""#), "off");
        assert_eq!(decode(r#""local\/iso""#), "local/iso");
        assert_eq!(decode(r#""caf\u00e9""#), "café");
    }

    #[test]
    fn decode_array_is_compact_with_unescaped_slashes() {
        assert_eq!(decode(r#"[ "vmbr0", "a\/b" ]"#), r#"["vmbr0","a/b"]"#);
        assert_eq!(decode(r#"{"x": 1, "y": [2, 3]}"#), r#"{"x":1,"y":[2,3]}"#);
    }

    #[test]
    fn decode_keeps_object_key_order() {
        assert_eq!(decode(r#"{"b":1,"a":2}"#), r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn decode_treats_sequential_keys_as_list() {
        assert_eq!(decode(r#"{"0":"a","1":"b"}"#), r#"["a","b"]"#);
        assert_eq!(decode("{}"), "[]");
        assert_eq!(decode(r#"{"1":"a"}"#), r#"{"1":"a"}"#);
    }

    #[test]
    fn decode_non_string_scalars_return_raw() {
        assert_eq!(decode("42"), "42");
        assert_eq!(decode("true"), "true");
        assert_eq!(decode("null"), "null");
        assert_eq!(decode("not json"), "not json");
        assert_eq!(decode(""), "");
    }

    #[test]
    fn decode_of_double_encoded_array_yields_array_text() {
        assert_eq!(decode(r#""[\"a\",\"b\"]""#), r#"["a","b"]"#);
    }

    #[test]
    fn display_falls_back_on_null_and_garbage() {
        assert_eq!(display("null"), "null");
        assert_eq!(display(""), "");
        assert_eq!(display("{broken"), "{broken");
    }

    #[test]
    fn display_renders_scalars_as_json_text() {
        assert_eq!(display("5"), "5");
        assert_eq!(display("false"), "false");
        assert_eq!(display(r#""on""#), "on");
    }

    #[test]
    fn round_trip_plain_values() {
        for v in ["on", "off", "", "a/b", "ünïcödé", "tab\there", "{not json"] {
            assert_eq!(decode(&encode(v)), v);
        }
    }
}
