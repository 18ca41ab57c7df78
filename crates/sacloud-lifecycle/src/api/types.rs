//! Wire types of the control-plane API
//!
//! Field names follow the provider's PascalCase JSON. Collections the provider
//! leaves out or sends as `null` decode as empty.

use sacloud_lifecycle_common::{
    Availability, Resource, ResourceId, ResourceKind, ResourceState, SearchResult, SourceLink,
};
use serde::{Deserialize, Serialize};

/// Link to the disk or archive a resource was copied from
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceDto {
    #[serde(rename = "ID")]
    pub id: ResourceId,
    #[serde(default)]
    pub availability: Option<String>,
}

impl SourceDto {
    fn into_link(self) -> SourceLink {
        SourceLink::new(self.id, Availability::from_provider(self.availability.as_deref()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceDto {
    #[serde(rename = "ID")]
    pub id: ResourceId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceDto {
    #[serde(default)]
    pub status: Option<String>,
}

/// One resource as the API returns it, for any collection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceDto {
    #[serde(rename = "ID")]
    pub id: ResourceId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Any non-null value marks a bundled image
    #[serde(default)]
    pub bundle_info: Option<serde_json::Value>,
    #[serde(default)]
    pub source_disk: Option<SourceDto>,
    #[serde(default)]
    pub source_archive: Option<SourceDto>,
    #[serde(default)]
    pub interfaces: Option<Vec<InterfaceDto>>,
    #[serde(default)]
    pub instance: Option<InstanceDto>,
}

impl ResourceDto {
    pub fn into_resource(self, kind: ResourceKind) -> Resource {
        let mut resource = Resource::new(kind, self.id, self.name.unwrap_or_default());
        resource.state = ResourceState::from_availability(self.availability.as_deref());
        resource.availability = self.availability;
        resource.tags = self.tags.unwrap_or_default();
        resource.bundle_info = self.bundle_info.is_some_and(|v| !v.is_null());
        resource.source_disk = self.source_disk.map(SourceDto::into_link);
        resource.source_archive = self.source_archive.map(SourceDto::into_link);
        for nic in self.interfaces.unwrap_or_default() {
            resource = resource.with_interface(nic.id);
        }
        resource.instance_status = self.instance.and_then(|i| i.status);
        resource
    }
}

/// Name filter sent as the JSON query string of a list request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchQuery<'a> {
    pub count: usize,
    pub filter: NameFilter<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameFilter<'a> {
    pub name: &'a str,
}

impl<'a> SearchQuery<'a> {
    pub fn by_name(token: &'a str, limit: usize) -> Self {
        Self {
            count: limit,
            filter: NameFilter { name: token },
        }
    }
}

/// Pull the single resource out of a `{"Disk": {...}}` style envelope
pub fn decode_resource(kind: ResourceKind, body: &str) -> Result<Resource, String> {
    let mut envelope: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(body).map_err(|e| e.to_string())?;
    let value = envelope
        .remove(kind.envelope_key())
        .ok_or_else(|| format!("response has no {} field", kind.envelope_key()))?;
    let dto: ResourceDto = serde_json::from_value(value).map_err(|e| e.to_string())?;
    Ok(dto.into_resource(kind))
}

/// Pull the records out of a `{"Total": n, "Disks": [...]}` style envelope
pub fn decode_search(kind: ResourceKind, body: &str) -> Result<SearchResult, String> {
    let mut envelope: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(body).map_err(|e| e.to_string())?;

    let records: Vec<ResourceDto> = match envelope.remove(kind.list_key()) {
        Some(serde_json::Value::Null) | None => Vec::new(),
        Some(value) => serde_json::from_value(value).map_err(|e| e.to_string())?,
    };
    let resources: Vec<Resource> = records.into_iter().map(|r| r.into_resource(kind)).collect();
    let total = envelope
        .get("Total")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(resources.len() as u64);

    Ok(SearchResult { total, resources })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISK_JSON: &str = r#"{
        "Disk": {
            "ID": "112900000001",
            "Name": "web-01",
            "Availability": "migrating",
            "Tags": ["os-linux", "@virtio-net-pci"],
            "BundleInfo": null,
            "SourceDisk": null,
            "SourceArchive": { "ID": "112900000002", "Availability": "discontinued" }
        },
        "is_ok": true
    }"#;

    #[test]
    fn test_decode_disk() {
        let disk = decode_resource(ResourceKind::Disk, DISK_JSON).unwrap();
        assert_eq!(disk.id, ResourceId::new(112_900_000_001));
        assert_eq!(disk.name, "web-01");
        assert_eq!(disk.state, ResourceState::InProgress);
        assert_eq!(disk.availability.as_deref(), Some("migrating"));
        assert!(disk.has_tag("os-linux"));
        assert!(!disk.bundle_info);
        assert!(disk.source_disk.is_none());
        assert_eq!(
            disk.source_archive,
            Some(SourceLink::discontinued(ResourceId::new(112_900_000_002)))
        );
    }

    #[test]
    fn test_decode_bundle_and_numeric_id() {
        let body = r#"{"Archive": {"ID": 7, "BundleInfo": {"HostClass": "ms_windows"}}}"#;
        let archive = decode_resource(ResourceKind::Archive, body).unwrap();
        assert_eq!(archive.id, ResourceId::new(7));
        assert!(archive.bundle_info);
        assert_eq!(archive.state, ResourceState::Pending);
        assert!(archive.is_blank_sourced());
    }

    #[test]
    fn test_decode_server_interfaces() {
        let body = r#"{
            "Server": {
                "ID": "10",
                "Name": "app",
                "Instance": { "Status": "up" },
                "Interfaces": [{ "ID": "100" }, { "ID": "101" }]
            }
        }"#;
        let server = decode_resource(ResourceKind::Server, body).unwrap();
        assert_eq!(server.interfaces.len(), 2);
        assert_eq!(server.interfaces[1].id, ResourceId::new(101));
        assert_eq!(server.instance_status.as_deref(), Some("up"));
    }

    #[test]
    fn test_decode_missing_envelope() {
        let err = decode_resource(ResourceKind::Disk, r#"{"Archive": {"ID": "1"}}"#).unwrap_err();
        assert!(err.contains("Disk"));
    }

    #[test]
    fn test_decode_search() {
        let body = r#"{
            "Total": 3,
            "From": 0,
            "Count": 1,
            "PacketFilters": [{ "ID": "42", "Name": "prod-filter" }]
        }"#;
        let found = decode_search(ResourceKind::PacketFilter, body).unwrap();
        assert_eq!(found.total, 3);
        assert_eq!(found.first().map(|r| r.id), Some(ResourceId::new(42)));
    }

    #[test]
    fn test_decode_empty_search() {
        let body = r#"{"Total": 0, "PacketFilters": null}"#;
        let found = decode_search(ResourceKind::PacketFilter, body).unwrap();
        assert!(found.is_empty());
        assert_eq!(found.total, 0);
    }

    #[test]
    fn test_search_query_json() {
        let query = serde_json::to_string(&SearchQuery::by_name("prod", 1)).unwrap();
        assert_eq!(query, r#"{"Count":1,"Filter":{"Name":"prod"}}"#);
    }
}
