//! # Schema: Product Configuration Table Variants
//!
//! Two Proxmox provisioning modules keep product settings in slightly
//! different tables:
//!
//! | Module | Table | Discriminator |
//! |--------|-------|---------------|
//! | `cloud` (ProxmoxVeVpsCloud) | `ProxmoxVeVpsCloud_ProductConfiguration` | `type = 'product'` |
//! | `addon` (ProxmoxAddon) | `ProxmoxAddon_ProductConfiguration` | none |
//!
//! The active variant is chosen once at startup and handed around as a
//! `&'static dyn ConfigSchema`. It decides the table name, the extra WHERE /
//! INSERT column, and which resource-allocation settings are never editable.
//! Value encoding is identical for both.

use serde::{Deserialize, Serialize};
use std::fmt;

const CLOUD_FORBIDDEN: [&str; 7] = [
    "cores",
    "cpulimit",
    "cpuunits",
    "memory",
    "vcpus",
    "additionalDiskSize",
    "diskSize",
];

const ADDON_FORBIDDEN: [&str; 6] = [
    "cores",
    "cpulimit",
    "cpuunits",
    "memory",
    "vcpus",
    "storageSize",
];

/// One physical layout of the external product configuration table.
pub trait ConfigSchema: Send + Sync + fmt::Debug {
    /// Module name as stored in the addon configuration (`cloud` / `addon`).
    fn module(&self) -> ModuleType;

    /// Quoted table identifier, ready to splice into SQL.
    fn table(&self) -> &'static str;

    /// Discriminator `(column, value)` scoping rows to product settings.
    fn discriminator(&self) -> Option<(&'static str, &'static str)>;

    /// Setting names that must never be offered for bulk editing.
    fn forbidden_settings(&self) -> &'static [&'static str];

    fn is_forbidden(&self, setting: &str) -> bool {
        self.forbidden_settings().contains(&setting)
    }

    /// `AND <column> = '<value>'` when the variant has a discriminator.
    fn scope_clause(&self) -> String {
        match self.discriminator() {
            Some((column, value)) => format!(" AND \"{}\" = '{}'", column, value),
            None => String::new(),
        }
    }
}

#[derive(Debug)]
pub struct CloudSchema;

impl ConfigSchema for CloudSchema {
    fn module(&self) -> ModuleType {
        ModuleType::Cloud
    }

    fn table(&self) -> &'static str {
        "\"ProxmoxVeVpsCloud_ProductConfiguration\""
    }

    fn discriminator(&self) -> Option<(&'static str, &'static str)> {
        Some(("type", "product"))
    }

    fn forbidden_settings(&self) -> &'static [&'static str] {
        &CLOUD_FORBIDDEN
    }
}

#[derive(Debug)]
pub struct AddonSchema;

impl ConfigSchema for AddonSchema {
    fn module(&self) -> ModuleType {
        ModuleType::Addon
    }

    fn table(&self) -> &'static str {
        "\"ProxmoxAddon_ProductConfiguration\""
    }

    fn discriminator(&self) -> Option<(&'static str, &'static str)> {
        None
    }

    fn forbidden_settings(&self) -> &'static [&'static str] {
        &ADDON_FORBIDDEN
    }
}

static CLOUD: CloudSchema = CloudSchema;
static ADDON: AddonSchema = AddonSchema;

/// Which Proxmox module's table layout is in use.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    #[default]
    Cloud,
    Addon,
}

impl ModuleType {
    /// Interpret the stored addon setting. Anything but `addon` means cloud.
    pub fn from_stored(value: &str) -> Self {
        match value.trim() {
            "addon" => ModuleType::Addon,
            _ => ModuleType::Cloud,
        }
    }

    pub fn schema(self) -> &'static dyn ConfigSchema {
        match self {
            ModuleType::Cloud => &CLOUD,
            ModuleType::Addon => &ADDON,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleType::Cloud => "cloud",
            ModuleType::Addon => "addon",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
