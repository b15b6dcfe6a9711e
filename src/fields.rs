//! Input hints for known Proxmox product settings.
//!
//! The edit form needs to know whether a setting is an on/off toggle, a
//! fixed-choice dropdown, a JSON array, long free text, or a plain text
//! field. Names follow the provisioning module's own setting keys (including
//! its `buttonSyle` and `firewalOption*` spellings). Unknown names are text.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Toggle,
    Array,
    Textarea,
    Dropdown,
    Text,
}

/// A selectable dropdown entry: `(value, label)`.
pub type DropdownOption = (&'static str, &'static str);

pub fn field_kind(setting: &str) -> FieldKind {
    match setting {
        "acpi"
        | "additionalDisk"
        | "additionalDiskDiscard"
        | "additionalDiskIoThread"
        | "additionalDiskReplicate"
        | "additionalDiskSpeed"
        | "additionalDiskSsd"
        | "aes"
        | "agent"
        | "agentConfigureNetwork"
        | "agentFreezeFsOnBackup"
        | "agentGuestTrim"
        | "agentServiceHostname"
        | "agentServicePassword"
        | "agentTemplateUser"
        | "autoAssignPrivateIp"
        | "autoCreatePrivateNetwork"
        | "autostart"
        | "backupRouting"
        | "backupVmBeforeReinstall"
        | "calculateSocketsAndCores"
        | "cloneOnTheSameStorage"
        | "cloudInit"
        | "cloudInitServiceNameservers"
        | "cloudInitServicePassword"
        | "cloudInitServiceUsername"
        | "deleteBackups"
        | "deleteBackupsOnPackageChange"
        | "destroyUnreferencedDisks"
        | "discard"
        | "diskSpeed"
        | "firewalOptionDhcp"
        | "firewalOptionEnable"
        | "firewalOptionIpfilter"
        | "firewalOptionMacfilter"
        | "firewalOptionNdp"
        | "firewalOptionRadv"
        | "freeze"
        | "generateRandomPassword"
        | "ioThread"
        | "ipsetIpFilter"
        | "kvm"
        | "loadBalancer"
        | "loadBalancerMigrationWithLocalDisks"
        | "loadBalancerShutdownOnUpgrade"
        | "loadBalancerStopOnUpgrade"
        | "managedView"
        | "networkFirewall"
        | "numa"
        | "onboot"
        | "oneNetworkDevice"
        | "oneUserPerVps"
        | "orderPublicIp"
        | "osTemplatesInAllNodes"
        | "permissionAdditionalDiskBackup"
        | "permissionAllVmsBackups"
        | "permissionBackup"
        | "permissionBackupJob"
        | "permissionBackupSchedule"
        | "permissionChangeHostname"
        | "permissionDisk"
        | "permissionDownloadBackupFile"
        | "permissionFirewall"
        | "permissionFirewallOption"
        | "permissionGraph"
        | "permissionIsoImage"
        | "permissionNetwork"
        | "permissionNetworkReconfigure"
        | "permissionNovnc"
        | "permissionOsTemplate"
        | "permissionReboot"
        | "permissionReinstall"
        | "permissionResourcesNotification"
        | "permissionRestoreBackupFile"
        | "permissionServerMonitoring"
        | "permissionShutdown"
        | "permissionSnapshot"
        | "permissionSnapshotJob"
        | "permissionSpice"
        | "permissionSshkeys"
        | "permissionStart"
        | "permissionStop"
        | "permissionTaskHistory"
        | "permissionVmPowerTasks"
        | "permissionXtermjs"
        | "privateNetwork"
        | "privateNetworkDhcp"
        | "privateNetworkFirewall"
        | "reassignPrivateNetwork"
        | "reassignPublicNetwork"
        | "reboot"
        | "rebootVmAfterChangePackage"
        | "replicate"
        | "serverNameservers"
        | "snapshotRouting"
        | "ssd"
        | "start"
        | "suspendOnBandwidthOverage"
        | "tablet"
        | "toDoList"
        | "tpm"
        | "useServiceIdAsVmId" => FieldKind::Toggle,

        "additionalDiskFormat"
        | "additionalDiskType"
        | "alternativeMode"
        | "archive"
        | "availableServers"
        | "bridges"
        | "clientAreaSectionsOrder"
        | "cloudInitScript"
        | "firewallGroups"
        | "firewallInterfaces"
        | "hotplug"
        | "locations"
        | "permissionBackupCompress"
        | "permissionFirewalOptions"
        | "permissionInformation"
        | "permissionIsoImages"
        | "permissionOsTemplates"
        | "permissionOstype"
        | "permissionSecondaryIsoImages"
        | "permissionSnapshotJobPeriod"
        | "privateBridges"
        | "serverGroup"
        | "tags" => FieldKind::Array,

        "args" | "description" | "randomPasswordAvailableCharacters" | "userComment" => {
            FieldKind::Textarea
        }

        "buttonSyle" | "detailsView" | "memoryUnit" | "productType" | "storageUnit" => {
            FieldKind::Dropdown
        }

        _ => FieldKind::Text,
    }
}

/// Fixed choices for dropdown settings; `None` renders as a text input.
pub fn dropdown_options(setting: &str) -> Option<&'static [DropdownOption]> {
    match setting {
        "buttonSyle" => Some(&[("tiles", "Tiles"), ("list", "List")]),
        "detailsView" => Some(&[("standard", "Standard"), ("advanced", "Advanced")]),
        "storageUnit" | "memoryUnit" => Some(&[("mb", "MB"), ("gb", "GB"), ("tb", "TB")]),
        "productType" => Some(&[("vps", "VPS"), ("cloud", "Cloud")]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kinds() {
        assert_eq!(field_kind("onboot"), FieldKind::Toggle);
        assert_eq!(field_kind("bridges"), FieldKind::Array);
        assert_eq!(field_kind("description"), FieldKind::Textarea);
        assert_eq!(field_kind("memoryUnit"), FieldKind::Dropdown);
    }

    #[test]
    fn unknown_settings_are_text() {
        assert_eq!(field_kind("osTemplate"), FieldKind::Text);
        assert_eq!(field_kind(""), FieldKind::Text);
    }

    #[test]
    fn every_dropdown_kind_has_options() {
        for name in ["buttonSyle", "detailsView", "memoryUnit", "productType", "storageUnit"] {
            assert_eq!(field_kind(name), FieldKind::Dropdown);
            assert!(dropdown_options(name).is_some(), "{} has no options", name);
        }
        assert!(dropdown_options("onboot").is_none());
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FieldKind::Toggle).unwrap(), "\"toggle\"");
    }
}
