use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a remote-owned managed object.
///
/// `kind` is the remote type name (`Folder`, `HostSystem`, ...) and `value`
/// the opaque identifier the endpoint assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedObjectRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ManagedObjectRef {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    pub fn folder(value: impl Into<String>) -> Self {
        Self::new("Folder", value)
    }

    pub fn host(value: impl Into<String>) -> Self {
        Self::new("HostSystem", value)
    }

    pub fn resource_pool(value: impl Into<String>) -> Self {
        Self::new("ResourcePool", value)
    }

    pub fn datastore(value: impl Into<String>) -> Self {
        Self::new("Datastore", value)
    }

    pub fn lease(value: impl Into<String>) -> Self {
        Self::new("HttpNfcLease", value)
    }

    pub fn virtual_machine(value: impl Into<String>) -> Self {
        Self::new("VirtualMachine", value)
    }

    /// Returns `true` when the reference carries no identifier.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for ManagedObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// Disk provisioning mode for the imported virtual disks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiskProvisioning {
    #[default]
    Thin,
    Thick,
    EagerZeroedThick,
}

/// Maps a network name declared in the descriptor to a target network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMapping {
    pub name: String,
    pub network: ManagedObjectRef,
}

/// A descriptor property assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Parameters submitted alongside the descriptor when requesting an
/// import spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpecParams {
    pub host_system: ManagedObjectRef,
    pub locale: String,
    pub entity_name: String,
    pub deployment_option: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_mapping: Vec<NetworkMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_mapping: Vec<KeyValue>,
    pub disk_provisioning: DiskProvisioning,
}

/// Opaque import specification produced by the endpoint and handed back
/// verbatim when the import is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportSpec(pub serde_json::Value);

/// A file referenced by the descriptor that must be uploaded to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub device_id: String,
    /// Path relative to the descriptor's location.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Result of the import-spec request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpecResult {
    pub import_spec: ImportSpec,
    #[serde(default)]
    pub file_items: Vec<FileItem>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Remote lease lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LeaseState {
    Initializing,
    Ready,
    Error { message: String },
}

impl LeaseState {
    pub fn is_initializing(&self) -> bool {
        matches!(self, LeaseState::Initializing)
    }
}

/// Negotiated transfer URL for one device of the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUrl {
    /// Matches [`FileItem::device_id`].
    pub import_key: String,
    /// Upload URL; its host may be the `*` placeholder.
    pub url: String,
}

impl DeviceUrl {
    /// Returns the URL with the `*` host placeholder replaced by `host`.
    pub fn resolve_host(&self, host: &str) -> String {
        self.url.replace('*', host)
    }
}

/// Lease details available once the lease is ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseInfo {
    #[serde(default)]
    pub device_urls: Vec<DeviceUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<ManagedObjectRef>,
}

impl LeaseInfo {
    /// Finds the device URL negotiated for `device_id`.
    pub fn device_url(&self, device_id: &str) -> Option<&DeviceUrl> {
        self.device_urls.iter().find(|d| d.import_key == device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_provisioning_wire_names() {
        assert_eq!(
            serde_json::to_string(&DiskProvisioning::EagerZeroedThick).unwrap(),
            r#""eagerZeroedThick""#
        );
        assert_eq!(DiskProvisioning::default(), DiskProvisioning::Thin);
    }

    #[test]
    fn import_spec_params_field_names() {
        let params = ImportSpecParams {
            host_system: ManagedObjectRef::host("host-12"),
            locale: "US".into(),
            entity_name: "web-01".into(),
            deployment_option: String::new(),
            network_mapping: vec![NetworkMapping {
                name: "VM Network".into(),
                network: ManagedObjectRef::new("Network", "network-7"),
            }],
            property_mapping: Vec::new(),
            disk_provisioning: DiskProvisioning::Thin,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["hostSystem"]["type"], "HostSystem");
        assert_eq!(json["entityName"], "web-01");
        assert_eq!(json["deploymentOption"], "");
        assert_eq!(json["diskProvisioning"], "thin");
        assert_eq!(json["networkMapping"][0]["name"], "VM Network");
        assert!(json.get("propertyMapping").is_none());
    }

    #[test]
    fn lease_state_tagged() {
        let state: LeaseState =
            serde_json::from_str(r#"{"state":"error","message":"disk full"}"#).unwrap();
        assert_eq!(
            state,
            LeaseState::Error {
                message: "disk full".into()
            }
        );
        let state: LeaseState = serde_json::from_str(r#"{"state":"initializing"}"#).unwrap();
        assert!(state.is_initializing());
    }

    #[test]
    fn import_spec_result_defaults_empty_lists() {
        let json = r#"{"importSpec":{"configSpec":{}}}"#;
        let result: ImportSpecResult = serde_json::from_str(json).unwrap();
        assert!(result.file_items.is_empty());
        assert!(result.warnings.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn device_url_lookup_and_host_substitution() {
        let info = LeaseInfo {
            device_urls: vec![
                DeviceUrl {
                    import_key: "/vm/VirtualLsiLogicController0:0".into(),
                    url: "https://*/nfc/52a1/disk-0.vmdk".into(),
                },
                DeviceUrl {
                    import_key: "/vm/VirtualLsiLogicController0:1".into(),
                    url: "https://*/nfc/52a1/disk-1.vmdk".into(),
                },
            ],
            entity: Some(ManagedObjectRef::virtual_machine("vm-42")),
        };

        let url = info.device_url("/vm/VirtualLsiLogicController0:1").unwrap();
        assert_eq!(
            url.resolve_host("10.0.0.5"),
            "https://10.0.0.5/nfc/52a1/disk-1.vmdk"
        );
        assert!(info.device_url("/vm/missing").is_none());
    }

    #[test]
    fn moref_display_and_empty() {
        let r = ManagedObjectRef::resource_pool("resgroup-9");
        assert_eq!(r.to_string(), "ResourcePool:resgroup-9");
        assert!(!r.is_empty());
        assert!(ManagedObjectRef::folder("").is_empty());
    }
}
