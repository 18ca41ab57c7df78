//! Edit-capability resolution from a resource's provenance chain
//!
//! A disk may be edited in place when it, or the nearest ancestor still
//! reachable through an active link, carries an allow-listed OS tag. Bundled
//! images and blank disks are never editable.

use crate::config::EditPolicy;
use crate::error::ResolveError;
use sacloud_lifecycle_common::{Resource, ResourceGateway, ResourceId, ResourceKind};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Why the walk stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditReason {
    /// Pre-bundled image
    BundleInfo,
    /// Created from a blank template
    BlankSource,
    /// Carries an allow-listed tag
    AllowTag(String),
    /// Every provenance link is discontinued
    NoActiveSource,
}

impl EditReason {
    pub fn is_editable(&self) -> bool {
        matches!(self, EditReason::AllowTag(_))
    }
}

impl std::fmt::Display for EditReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditReason::BundleInfo => write!(f, "bundled image"),
            EditReason::BlankSource => write!(f, "blank source"),
            EditReason::AllowTag(tag) => write!(f, "tag {tag}"),
            EditReason::NoActiveSource => write!(f, "no active source"),
        }
    }
}

/// Outcome of a provenance walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditAssessment {
    pub editable: bool,
    pub reason: EditReason,
    /// Resource the decision was made on
    pub decided_by: (ResourceKind, ResourceId),
    /// Resources fetched, starting with the queried one
    pub chain: Vec<(ResourceKind, ResourceId)>,
}

/// Result of inspecting a single resource
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Decided(EditReason),
    Follow(ResourceKind, ResourceId),
}

/// Apply the edit rules to one resource without fetching anything.
///
/// Order matters: the bundle flag beats tags, and a blank source beats tags.
fn evaluate(policy: &EditPolicy, resource: &Resource) -> Verdict {
    if resource.bundle_info {
        return Verdict::Decided(EditReason::BundleInfo);
    }
    if resource.is_blank_sourced() {
        return Verdict::Decided(EditReason::BlankSource);
    }
    if let Some(tag) = policy.matching_tag(&resource.tags) {
        return Verdict::Decided(EditReason::AllowTag(tag.to_string()));
    }

    let disk = resource
        .source_disk
        .filter(|link| !link.availability.is_discontinued())
        .map(|link| (ResourceKind::Disk, link.id));
    let archive = resource
        .source_archive
        .filter(|link| !link.availability.is_discontinued())
        .map(|link| (ResourceKind::Archive, link.id));

    match disk.or(archive) {
        Some((kind, id)) => Verdict::Follow(kind, id),
        None => Verdict::Decided(EditReason::NoActiveSource),
    }
}

/// Decides whether a derived resource may be edited in place
pub struct ProvenanceResolver<G> {
    gateway: Arc<G>,
    policy: EditPolicy,
}

impl<G> Clone for ProvenanceResolver<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            policy: self.policy.clone(),
        }
    }
}

impl<G: ResourceGateway> ProvenanceResolver<G> {
    /// Resolver using the default `os-unix`/`os-linux` allow list
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_policy(gateway, EditPolicy::default())
    }

    pub fn with_policy(gateway: Arc<G>, policy: EditPolicy) -> Self {
        Self { gateway, policy }
    }

    pub fn policy(&self) -> &EditPolicy {
        &self.policy
    }

    /// Whether the resource may be edited in place
    pub async fn can_edit(&self, kind: ResourceKind, id: ResourceId) -> Result<bool, ResolveError> {
        Ok(self.assess(kind, id).await?.editable)
    }

    /// Walk the provenance chain and report how the decision was reached.
    ///
    /// Fetches each resource at most once; a chain of N followed ancestors
    /// costs N+1 reads. Revisiting a resource fails with
    /// `ResolveError::ProvenanceCycle`, following more than
    /// `EditPolicy::max_depth` ancestors with `ResolveError::ProvenanceTooDeep`.
    /// Kinds other than disks and archives fail with `ResolveError::NoProvenance`
    /// before any read.
    pub async fn assess(&self, kind: ResourceKind, id: ResourceId) -> Result<EditAssessment, ResolveError> {
        if !kind.has_provenance() {
            return Err(ResolveError::NoProvenance { kind });
        }
        let start = id;
        let mut current = (kind, id);
        let mut visited = HashSet::new();
        let mut chain = Vec::new();

        loop {
            if !visited.insert(current) {
                return Err(ResolveError::ProvenanceCycle {
                    start,
                    kind: current.0,
                    id: current.1,
                });
            }

            let resource = self.gateway.read_resource(current.0, current.1).await?;
            chain.push(current);

            match evaluate(&self.policy, &resource) {
                Verdict::Decided(reason) => {
                    info!(
                        kind = %kind,
                        id = %start,
                        decided_by = %resource.label(),
                        reason = %reason,
                        fetches = chain.len(),
                        "Resolved edit capability"
                    );
                    return Ok(EditAssessment {
                        editable: reason.is_editable(),
                        reason,
                        decided_by: current,
                        chain,
                    });
                }
                Verdict::Follow(next_kind, next_id) => {
                    // chain holds the start plus every ancestor followed so far
                    if chain.len() > self.policy.max_depth {
                        return Err(ResolveError::ProvenanceTooDeep {
                            start,
                            max_depth: self.policy.max_depth,
                        });
                    }
                    debug!(
                        from = %resource.label(),
                        to_kind = %next_kind,
                        to_id = %next_id,
                        "Following provenance link"
                    );
                    current = (next_kind, next_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sacloud_lifecycle_common::SourceLink;
    use sacloud_lifecycle_test_utils::{
        FakeGateway, archive, disk, disk_chain, disk_from_archive, disk_from_disk, id, server,
    };

    fn resolver(gateway: &Arc<FakeGateway>) -> ProvenanceResolver<FakeGateway> {
        ProvenanceResolver::new(Arc::clone(gateway))
    }

    #[test]
    fn test_evaluate_bundle_beats_tag() {
        let resource = disk_from_archive(1, SourceLink::active(id(2)))
            .with_tag("os-linux")
            .with_bundle_info();
        assert_eq!(
            evaluate(&EditPolicy::default(), &resource),
            Verdict::Decided(EditReason::BundleInfo)
        );
    }

    #[test]
    fn test_evaluate_blank_beats_tag() {
        let resource = disk(1, "available").with_tag("os-unix");
        assert_eq!(
            evaluate(&EditPolicy::default(), &resource),
            Verdict::Decided(EditReason::BlankSource)
        );
    }

    #[test]
    fn test_evaluate_prefers_source_disk() {
        let resource = disk_from_disk(1, SourceLink::active(id(2)))
            .with_source_archive(SourceLink::active(id(3)));
        assert_eq!(
            evaluate(&EditPolicy::default(), &resource),
            Verdict::Follow(ResourceKind::Disk, id(2))
        );
    }

    #[test]
    fn test_evaluate_discontinued_disk_falls_through_to_archive() {
        let resource = disk_from_disk(1, SourceLink::discontinued(id(2)))
            .with_source_archive(SourceLink::active(id(3)));
        assert_eq!(
            evaluate(&EditPolicy::default(), &resource),
            Verdict::Follow(ResourceKind::Archive, id(3))
        );

        let resource = disk_from_disk(1, SourceLink::discontinued(id(2)))
            .with_source_archive(SourceLink::discontinued(id(3)));
        assert_eq!(
            evaluate(&EditPolicy::default(), &resource),
            Verdict::Decided(EditReason::NoActiveSource)
        );
    }

    #[tokio::test]
    async fn test_bundled_is_not_editable() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(
            disk_from_archive(1, SourceLink::active(id(2)))
                .with_tag("os-linux")
                .with_bundle_info(),
        );

        assert!(!resolver(&gateway).can_edit(ResourceKind::Disk, id(1)).await.unwrap());
        assert_eq!(gateway.total_reads(), 1);
    }

    #[tokio::test]
    async fn test_blank_untagged_is_not_editable() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(disk(1, "available"));

        let assessment = resolver(&gateway).assess(ResourceKind::Disk, id(1)).await.unwrap();
        assert!(!assessment.editable);
        assert_eq!(assessment.reason, EditReason::BlankSource);
    }

    #[tokio::test]
    async fn test_tagged_archive_without_source_is_blank() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(disk_from_archive(1, SourceLink::active(id(2))));
        gateway.insert(archive(2).with_tag("os-linux"));

        let assessment = resolver(&gateway).assess(ResourceKind::Disk, id(1)).await.unwrap();
        assert!(!assessment.editable);
        assert_eq!(assessment.reason, EditReason::BlankSource);
        assert_eq!(assessment.decided_by, (ResourceKind::Archive, id(2)));
        assert_eq!(gateway.total_reads(), 2);
    }

    #[tokio::test]
    async fn test_kind_without_provenance_is_rejected() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(server(1, &[10]));

        let err = resolver(&gateway)
            .assess(ResourceKind::Server, id(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NoProvenance {
                kind: ResourceKind::Server
            }
        ));
        assert_eq!(gateway.total_reads(), 0);
    }

    #[tokio::test]
    async fn test_tag_wins_over_discontinued_ancestor() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(disk_from_disk(1, SourceLink::discontinued(id(2))).with_tag("os-unix"));

        assert!(resolver(&gateway).can_edit(ResourceKind::Disk, id(1)).await.unwrap());
        assert_eq!(gateway.total_reads(), 1);
    }

    #[tokio::test]
    async fn test_chain_costs_one_fetch_per_ancestor() {
        let gateway = Arc::new(FakeGateway::new());
        for resource in disk_chain(10, 3, Some("os-linux")) {
            gateway.insert(resource);
        }

        let assessment = resolver(&gateway).assess(ResourceKind::Disk, id(10)).await.unwrap();

        assert!(assessment.editable);
        assert_eq!(assessment.reason, EditReason::AllowTag("os-linux".to_string()));
        assert_eq!(assessment.decided_by, (ResourceKind::Archive, id(13)));
        assert_eq!(
            assessment.chain,
            vec![
                (ResourceKind::Disk, id(10)),
                (ResourceKind::Disk, id(11)),
                (ResourceKind::Disk, id(12)),
                (ResourceKind::Archive, id(13)),
            ]
        );
        assert_eq!(gateway.total_reads(), 4);
    }

    #[tokio::test]
    async fn test_untagged_chain_ends_at_blank_root() {
        let gateway = Arc::new(FakeGateway::new());
        for resource in disk_chain(10, 2, None) {
            gateway.insert(resource);
        }

        let assessment = resolver(&gateway).assess(ResourceKind::Disk, id(10)).await.unwrap();
        assert!(!assessment.editable);
        assert_eq!(assessment.reason, EditReason::BlankSource);
        assert_eq!(gateway.total_reads(), 3);
    }

    #[tokio::test]
    async fn test_discontinued_links_stop_walk() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(
            disk_from_disk(1, SourceLink::discontinued(id(2)))
                .with_source_archive(SourceLink::discontinued(id(3))),
        );
        gateway.insert(archive(3).with_tag("os-linux"));

        let assessment = resolver(&gateway).assess(ResourceKind::Disk, id(1)).await.unwrap();
        assert_eq!(assessment.reason, EditReason::NoActiveSource);
        assert_eq!(gateway.total_reads(), 1);
    }

    #[tokio::test]
    async fn test_cycle_is_reported() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(disk_from_disk(1, SourceLink::active(id(2))));
        gateway.insert(disk_from_disk(2, SourceLink::active(id(1))));

        let err = resolver(&gateway)
            .assess(ResourceKind::Disk, id(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ProvenanceCycle { id: cycle_id, .. } if cycle_id == id(1)
        ));
        assert_eq!(gateway.total_reads(), 2);
    }

    #[tokio::test]
    async fn test_depth_cap() {
        let gateway = Arc::new(FakeGateway::new());
        for resource in disk_chain(100, 40, Some("os-linux")) {
            gateway.insert(resource);
        }

        let err = resolver(&gateway)
            .assess(ResourceKind::Disk, id(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ProvenanceTooDeep { max_depth: 32, .. }));
        assert_eq!(gateway.total_reads(), 33);
    }

    #[tokio::test]
    async fn test_chain_at_depth_cap_resolves() {
        let gateway = Arc::new(FakeGateway::new());
        // 3 disks then the tagged archive: 3 ancestors followed
        for resource in disk_chain(1, 3, Some("os-unix")) {
            gateway.insert(resource);
        }
        let policy = EditPolicy {
            max_depth: 3,
            ..EditPolicy::default()
        };

        let resolver = ProvenanceResolver::with_policy(Arc::clone(&gateway), policy);
        assert!(resolver.can_edit(ResourceKind::Disk, id(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_ancestor_propagates() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(disk_from_archive(1, SourceLink::active(id(2))));

        let err = resolver(&gateway)
            .can_edit(ResourceKind::Disk, id(1))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_custom_allow_tags() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(disk_from_archive(1, SourceLink::active(id(2))).with_tag("os-bsd"));
        gateway.insert(archive(2));

        let default = resolver(&gateway);
        assert!(!default.can_edit(ResourceKind::Disk, id(1)).await.unwrap());

        let custom = ProvenanceResolver::with_policy(Arc::clone(&gateway), EditPolicy::with_tags(["os-bsd"]));
        assert!(custom.can_edit(ResourceKind::Disk, id(1)).await.unwrap());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bundle_is_never_editable(tags in proptest::collection::vec("[a-z-]{1,12}", 0..6)) {
                let mut resource = disk_from_archive(1, SourceLink::active(id(2))).with_bundle_info();
                resource.tags = tags;
                prop_assert_eq!(
                    evaluate(&EditPolicy::default(), &resource),
                    Verdict::Decided(EditReason::BundleInfo)
                );
            }

            #[test]
            fn allow_tag_anywhere_in_list_is_found(pos in 0usize..5, filler in "[a-z]{3,8}") {
                let mut tags: Vec<String> = (0..5).map(|i| format!("{filler}-{i}")).collect();
                tags[pos] = "os-linux".to_string();
                let mut resource = disk_from_archive(1, SourceLink::discontinued(id(2)));
                resource.tags = tags;
                prop_assert!(matches!(
                    evaluate(&EditPolicy::default(), &resource),
                    Verdict::Decided(EditReason::AllowTag(_))
                ));
            }
        }
    }
}
