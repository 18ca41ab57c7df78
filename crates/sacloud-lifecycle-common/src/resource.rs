//! Resource snapshots returned by the gateway

use crate::id::ResourceId;
use crate::resource_kind::ResourceKind;
use crate::status::{Availability, ResourceState};

/// Reference from a derived resource to the resource it was copied from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLink {
    pub id: ResourceId,
    pub availability: Availability,
}

impl SourceLink {
    pub fn new(id: ResourceId, availability: Availability) -> Self {
        Self { id, availability }
    }

    /// Link to an active source
    pub fn active(id: ResourceId) -> Self {
        Self::new(id, Availability::Active)
    }

    /// Link to a retired source
    pub fn discontinued(id: ResourceId) -> Self {
        Self::new(id, Availability::Discontinued)
    }
}

/// Network interface attached to a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRef {
    pub id: ResourceId,
}

/// Point-in-time view of a remote resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub name: String,
    /// Readiness derived from `availability`
    pub state: ResourceState,
    /// Raw provider availability string
    pub availability: Option<String>,
    pub tags: Vec<String>,
    /// Pre-bundled image marker (set on licensed, typically non-Unix images)
    pub bundle_info: bool,
    pub source_disk: Option<SourceLink>,
    pub source_archive: Option<SourceLink>,
    /// Server interfaces in connection order (servers only)
    pub interfaces: Vec<InterfaceRef>,
    /// Raw instance status such as "up" or "down" (servers only)
    pub instance_status: Option<String>,
}

impl Resource {
    /// Create a resource with no tags, links or interfaces
    pub fn new(kind: ResourceKind, id: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            state: ResourceState::Pending,
            availability: None,
            tags: Vec::new(),
            bundle_info: false,
            source_disk: None,
            source_archive: None,
            interfaces: Vec::new(),
            instance_status: None,
        }
    }

    /// Set the provider availability string and the derived state
    pub fn with_availability(mut self, availability: impl Into<String>) -> Self {
        let availability = availability.into();
        self.state = ResourceState::from_availability(Some(&availability));
        self.availability = Some(availability);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_bundle_info(mut self) -> Self {
        self.bundle_info = true;
        self
    }

    pub fn with_source_disk(mut self, link: SourceLink) -> Self {
        self.source_disk = Some(link);
        self
    }

    pub fn with_source_archive(mut self, link: SourceLink) -> Self {
        self.source_archive = Some(link);
        self
    }

    pub fn with_interface(mut self, id: ResourceId) -> Self {
        self.interfaces.push(InterfaceRef { id });
        self
    }

    pub fn with_instance_status(mut self, status: impl Into<String>) -> Self {
        self.instance_status = Some(status.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.state == ResourceState::Available
    }

    pub fn is_failed(&self) -> bool {
        self.state == ResourceState::Failed
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// True when the resource was created from a blank template
    pub fn is_blank_sourced(&self) -> bool {
        self.source_disk.is_none() && self.source_archive.is_none()
    }

    /// Human-readable label for logs and errors, e.g. `disk 1234`
    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.id)
    }
}

/// Result of a name search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Total number of matches reported by the provider
    pub total: u64,
    /// Returned records, capped at the requested limit
    pub resources: Vec<Resource>,
}

impl SearchResult {
    pub fn first(&self) -> Option<&Resource> {
        self.resources.first()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0 || self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk() -> Resource {
        Resource::new(ResourceKind::Disk, ResourceId::new(1), "web-01")
    }

    #[test]
    fn test_with_availability_sets_state() {
        let r = disk().with_availability("migrating");
        assert_eq!(r.state, ResourceState::InProgress);
        assert_eq!(r.availability.as_deref(), Some("migrating"));

        let r = r.with_availability("available");
        assert!(r.is_available());
        assert!(!r.is_failed());
    }

    #[test]
    fn test_blank_sourced() {
        assert!(disk().is_blank_sourced());
        assert!(
            !disk()
                .with_source_archive(SourceLink::active(ResourceId::new(9)))
                .is_blank_sourced()
        );
    }

    #[test]
    fn test_has_tag_exact_match() {
        let r = disk().with_tag("os-linux");
        assert!(r.has_tag("os-linux"));
        assert!(!r.has_tag("os-lin"));
    }

    #[test]
    fn test_label() {
        assert_eq!(disk().label(), "disk 1");
    }

    #[test]
    fn test_search_result_empty() {
        assert!(SearchResult::default().is_empty());
        let hit = SearchResult {
            total: 1,
            resources: vec![disk()],
        };
        assert!(!hit.is_empty());
        assert_eq!(hit.first().map(|r| r.id), Some(ResourceId::new(1)));
    }
}
