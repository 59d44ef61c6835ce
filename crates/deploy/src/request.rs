//! Deployment request and its builder.

use std::collections::HashSet;

use ovfdeploy_vim::{DiskProvisioning, ImportSpecParams, KeyValue, ManagedObjectRef, NetworkMapping};

use crate::descriptor::DescriptorLocation;
use crate::error::DeployError;

/// Locale submitted with every import-spec request.
pub const IMPORT_LOCALE: &str = "US";

/// Everything needed to deploy one OVF package. Built through
/// [`DeploymentRequest::builder`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRequest {
    descriptor: DescriptorLocation,
    vm_name: String,
    folder: ManagedObjectRef,
    host: ManagedObjectRef,
    resource_pool: ManagedObjectRef,
    datastore: ManagedObjectRef,
    disk_provisioning: DiskProvisioning,
    network_mappings: Vec<NetworkMapping>,
    property_mappings: Vec<KeyValue>,
}

impl DeploymentRequest {
    pub fn builder() -> DeploymentRequestBuilder {
        DeploymentRequestBuilder::default()
    }

    pub fn descriptor(&self) -> &DescriptorLocation {
        &self.descriptor
    }

    pub fn vm_name(&self) -> &str {
        &self.vm_name
    }

    pub fn folder(&self) -> &ManagedObjectRef {
        &self.folder
    }

    pub fn host(&self) -> &ManagedObjectRef {
        &self.host
    }

    pub fn resource_pool(&self) -> &ManagedObjectRef {
        &self.resource_pool
    }

    pub fn datastore(&self) -> &ManagedObjectRef {
        &self.datastore
    }

    pub fn disk_provisioning(&self) -> DiskProvisioning {
        self.disk_provisioning
    }

    pub fn network_mappings(&self) -> &[NetworkMapping] {
        &self.network_mappings
    }

    pub fn property_mappings(&self) -> &[KeyValue] {
        &self.property_mappings
    }

    /// Parameters for the import-spec request.
    pub fn import_spec_params(&self) -> ImportSpecParams {
        ImportSpecParams {
            host_system: self.host.clone(),
            locale: IMPORT_LOCALE.to_string(),
            entity_name: self.vm_name.clone(),
            deployment_option: String::new(),
            network_mapping: self.network_mappings.clone(),
            property_mapping: self.property_mappings.clone(),
            disk_provisioning: self.disk_provisioning,
        }
    }
}

/// Collects request fields; [`DeploymentRequestBuilder::build`] checks them.
#[derive(Debug, Clone, Default)]
pub struct DeploymentRequestBuilder {
    descriptor: Option<DescriptorLocation>,
    vm_name: Option<String>,
    folder: Option<ManagedObjectRef>,
    host: Option<ManagedObjectRef>,
    resource_pool: Option<ManagedObjectRef>,
    datastore: Option<ManagedObjectRef>,
    disk_provisioning: DiskProvisioning,
    network_mappings: Vec<NetworkMapping>,
    property_mappings: Vec<KeyValue>,
}

impl DeploymentRequestBuilder {
    pub fn descriptor(mut self, location: impl Into<DescriptorLocation>) -> Self {
        self.descriptor = Some(location.into());
        self
    }

    pub fn vm_name(mut self, name: impl Into<String>) -> Self {
        self.vm_name = Some(name.into());
        self
    }

    pub fn folder(mut self, folder: ManagedObjectRef) -> Self {
        self.folder = Some(folder);
        self
    }

    pub fn host(mut self, host: ManagedObjectRef) -> Self {
        self.host = Some(host);
        self
    }

    pub fn resource_pool(mut self, pool: ManagedObjectRef) -> Self {
        self.resource_pool = Some(pool);
        self
    }

    pub fn datastore(mut self, datastore: ManagedObjectRef) -> Self {
        self.datastore = Some(datastore);
        self
    }

    pub fn disk_provisioning(mut self, mode: DiskProvisioning) -> Self {
        self.disk_provisioning = mode;
        self
    }

    /// Maps descriptor network `name` onto `network`. Order is kept.
    pub fn network_mapping(mut self, name: impl Into<String>, network: ManagedObjectRef) -> Self {
        self.network_mappings.push(NetworkMapping {
            name: name.into(),
            network,
        });
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.property_mappings.push(KeyValue {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Validates and freezes the request.
    ///
    /// Fails with [`DeployError::MissingParameter`] naming the first absent
    /// or empty mandatory field, and with
    /// [`DeployError::DuplicateNetworkMapping`] when a network name repeats.
    pub fn build(self) -> Result<DeploymentRequest, DeployError> {
        let descriptor = self
            .descriptor
            .filter(|d| !d.is_empty())
            .ok_or(DeployError::MissingParameter { field: "descriptor" })?;
        let vm_name = self
            .vm_name
            .filter(|n| !n.is_empty())
            .ok_or(DeployError::MissingParameter { field: "vm_name" })?;
        let folder = required(self.folder, "folder")?;
        let host = required(self.host, "host")?;
        let resource_pool = required(self.resource_pool, "resource_pool")?;
        let datastore = required(self.datastore, "datastore")?;

        let mut seen = HashSet::new();
        for mapping in &self.network_mappings {
            if !seen.insert(mapping.name.as_str()) {
                return Err(DeployError::DuplicateNetworkMapping(mapping.name.clone()));
            }
        }

        Ok(DeploymentRequest {
            descriptor,
            vm_name,
            folder,
            host,
            resource_pool,
            datastore,
            disk_provisioning: self.disk_provisioning,
            network_mappings: self.network_mappings,
            property_mappings: self.property_mappings,
        })
    }
}

fn required(
    value: Option<ManagedObjectRef>,
    field: &'static str,
) -> Result<ManagedObjectRef, DeployError> {
    value
        .filter(|r| !r.is_empty())
        .ok_or(DeployError::MissingParameter { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> DeploymentRequestBuilder {
        DeploymentRequest::builder()
            .descriptor("/srv/ovf/web.ovf")
            .vm_name("web-01")
            .folder(ManagedObjectRef::folder("group-v3"))
            .host(ManagedObjectRef::host("host-12"))
            .resource_pool(ManagedObjectRef::resource_pool("resgroup-8"))
            .datastore(ManagedObjectRef::datastore("datastore-15"))
    }

    #[test]
    fn builds_with_defaults() {
        let request = complete().build().unwrap();
        assert_eq!(request.vm_name(), "web-01");
        assert_eq!(request.disk_provisioning(), DiskProvisioning::Thin);
        assert!(request.network_mappings().is_empty());
        assert!(request.property_mappings().is_empty());
        assert!(!request.descriptor().is_remote());
    }

    #[test]
    fn each_mandatory_field_is_checked() {
        let cases: [(DeploymentRequestBuilder, &str); 6] = [
            (
                DeploymentRequestBuilder {
                    descriptor: None,
                    ..complete()
                },
                "descriptor",
            ),
            (complete().vm_name(""), "vm_name"),
            (
                DeploymentRequestBuilder {
                    folder: None,
                    ..complete()
                },
                "folder",
            ),
            (complete().host(ManagedObjectRef::host("")), "host"),
            (
                DeploymentRequestBuilder {
                    resource_pool: None,
                    ..complete()
                },
                "resource_pool",
            ),
            (
                DeploymentRequestBuilder {
                    datastore: None,
                    ..complete()
                },
                "datastore",
            ),
        ];

        for (builder, expected) in cases {
            match builder.build() {
                Err(DeployError::MissingParameter { field }) => assert_eq!(field, expected),
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn duplicate_network_names_rejected() {
        let err = complete()
            .network_mapping("VM Network", ManagedObjectRef::new("Network", "network-1"))
            .network_mapping("Storage", ManagedObjectRef::new("Network", "network-2"))
            .network_mapping("VM Network", ManagedObjectRef::new("Network", "network-3"))
            .build()
            .unwrap_err();
        assert!(matches!(err, DeployError::DuplicateNetworkMapping(name) if name == "VM Network"));
    }

    #[test]
    fn import_spec_params_carry_request() {
        let request = complete()
            .disk_provisioning(DiskProvisioning::EagerZeroedThick)
            .network_mapping("VM Network", ManagedObjectRef::new("Network", "network-1"))
            .property("guestinfo.hostname", "web-01")
            .build()
            .unwrap();

        let params = request.import_spec_params();
        assert_eq!(params.locale, "US");
        assert_eq!(params.deployment_option, "");
        assert_eq!(params.entity_name, "web-01");
        assert_eq!(params.host_system, ManagedObjectRef::host("host-12"));
        assert_eq!(params.disk_provisioning, DiskProvisioning::EagerZeroedThick);
        assert_eq!(params.network_mapping[0].name, "VM Network");
        assert_eq!(params.property_mapping[0].key, "guestinfo.hostname");
    }
}
