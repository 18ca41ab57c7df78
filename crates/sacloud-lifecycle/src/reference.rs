//! Id-or-name reference resolution
//!
//! Operators name packet filters either by numeric id or by display name.
//! A token made only of digits is always treated as an id; anything else is
//! looked up by name prefix and the first match wins.

use crate::error::ResolveError;
use sacloud_lifecycle_common::{
    ResourceGateway, ResourceId, ResourceKind, is_numeric_token,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Interface slot on a server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicSlot {
    /// First interface, connected to the shared segment
    Shared,
    /// Second interface, connected to a private switch
    Private,
}

impl NicSlot {
    pub fn index(self) -> usize {
        match self {
            NicSlot::Shared => 0,
            NicSlot::Private => 1,
        }
    }
}

/// Resolves id-or-name tokens and attaches the result to interfaces
pub struct ReferenceResolver<G> {
    gateway: Arc<G>,
    kind: ResourceKind,
}

impl<G> Clone for ReferenceResolver<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            kind: self.kind,
        }
    }
}

impl<G: ResourceGateway> ReferenceResolver<G> {
    /// Resolver for packet filter references
    pub fn new(gateway: Arc<G>) -> Self {
        Self::for_kind(gateway, ResourceKind::PacketFilter)
    }

    /// Resolver for another resource collection
    pub fn for_kind(gateway: Arc<G>, kind: ResourceKind) -> Self {
        Self { gateway, kind }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Resolve a token to exactly one id.
    ///
    /// Returns `Ok(None)` for an empty token without touching the gateway.
    /// A numeric token is read directly and its errors propagate; it never
    /// falls back to a name search.
    pub async fn resolve(&self, token: &str) -> Result<Option<ResourceId>, ResolveError> {
        if token.is_empty() {
            return Ok(None);
        }

        if is_numeric_token(token) {
            let id: ResourceId = token.parse()?;
            let resource = self.gateway.read_resource(self.kind, id).await?;
            debug!(kind = %self.kind, token, id = %resource.id, "Resolved reference by id");
            return Ok(Some(resource.id));
        }

        let found = self.gateway.search_by_name_prefix(self.kind, token, 1).await?;
        match found.first() {
            Some(resource) => {
                debug!(
                    kind = %self.kind,
                    token,
                    id = %resource.id,
                    total = found.total,
                    "Resolved reference by name"
                );
                Ok(Some(resource.id))
            }
            None => Err(ResolveError::NotFound {
                kind: self.kind,
                token: token.to_string(),
            }),
        }
    }

    /// Resolve `token` and attach it to `interface`.
    ///
    /// An empty token is a no-op and returns `Ok(None)`.
    pub async fn connect(
        &self,
        interface: ResourceId,
        token: &str,
    ) -> Result<Option<ResourceId>, ResolveError> {
        let Some(reference) = self.resolve(token).await? else {
            return Ok(None);
        };

        self.gateway.attach_reference(interface, reference).await?;
        info!(
            interface = %interface,
            kind = %self.kind,
            reference = %reference,
            "Attached reference to interface"
        );
        Ok(Some(reference))
    }

    /// Attach to the server's first interface; no-op when it has none
    pub async fn connect_to_shared_nic(
        &self,
        server: ResourceId,
        token: &str,
    ) -> Result<Option<ResourceId>, ResolveError> {
        self.connect_to_nic(server, NicSlot::Shared, token).await
    }

    /// Attach to the server's second interface; no-op when it has fewer than two
    pub async fn connect_to_private_nic(
        &self,
        server: ResourceId,
        token: &str,
    ) -> Result<Option<ResourceId>, ResolveError> {
        self.connect_to_nic(server, NicSlot::Private, token).await
    }

    pub async fn connect_to_nic(
        &self,
        server: ResourceId,
        slot: NicSlot,
        token: &str,
    ) -> Result<Option<ResourceId>, ResolveError> {
        if token.is_empty() {
            return Ok(None);
        }

        let server = self.gateway.read_resource(ResourceKind::Server, server).await?;
        let Some(nic) = server.interfaces.get(slot.index()) else {
            debug!(server = %server.id, ?slot, "Server has no interface in slot, skipping");
            return Ok(None);
        };
        self.connect(nic.id, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sacloud_lifecycle_test_utils::{FakeGateway, archive, id, packet_filter, server};

    fn setup() -> (Arc<FakeGateway>, ReferenceResolver<FakeGateway>) {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(packet_filter(42, "prod-filter"));
        gateway.insert(packet_filter(43, "prod-filter-v2"));
        gateway.insert(packet_filter(50, "staging"));
        let resolver = ReferenceResolver::new(Arc::clone(&gateway));
        (gateway, resolver)
    }

    #[tokio::test]
    async fn test_numeric_token_reads_directly() {
        let (gateway, resolver) = setup();
        assert_eq!(resolver.resolve("42").await.unwrap(), Some(id(42)));
        assert_eq!(gateway.reads(), vec![(ResourceKind::PacketFilter, id(42))]);
        assert!(gateway.searches().is_empty());
    }

    #[tokio::test]
    async fn test_missing_numeric_token_does_not_search() {
        let (gateway, resolver) = setup();
        let err = resolver.resolve("999").await.unwrap_err();
        assert!(err.is_transport());
        assert!(gateway.searches().is_empty());
    }

    #[tokio::test]
    async fn test_numeric_name_is_not_searched() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(packet_filter(7, "2024"));
        let resolver = ReferenceResolver::new(Arc::clone(&gateway));

        assert!(resolver.resolve("2024").await.unwrap_err().is_transport());
        assert!(gateway.searches().is_empty());
    }

    #[tokio::test]
    async fn test_zero_is_invalid_id() {
        let (gateway, resolver) = setup();
        let err = resolver.resolve("0").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidId(_)));
        assert_eq!(gateway.total_reads(), 0);
    }

    #[tokio::test]
    async fn test_name_resolves_first_match() {
        let (gateway, resolver) = setup();
        assert_eq!(resolver.resolve("prod-filter").await.unwrap(), Some(id(42)));
        assert_eq!(
            gateway.searches(),
            vec![(ResourceKind::PacketFilter, "prod-filter".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_found() {
        let (_, resolver) = setup();
        let err = resolver.resolve("nonexistent").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nonexistent"));
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let (gateway, resolver) = setup();
        gateway.fail_search("service unavailable");
        assert!(resolver.resolve("staging").await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_empty_token_is_noop() {
        let (gateway, resolver) = setup();
        assert_eq!(resolver.resolve("").await.unwrap(), None);
        assert_eq!(resolver.connect(id(100), "").await.unwrap(), None);
        assert_eq!(gateway.total_reads(), 0);
        assert!(gateway.searches().is_empty());
        assert!(gateway.attachments().is_empty());
    }

    #[tokio::test]
    async fn test_connect_attaches() {
        let (gateway, resolver) = setup();
        let attached = resolver.connect(id(100), "staging").await.unwrap();
        assert_eq!(attached, Some(id(50)));
        assert_eq!(gateway.attachments(), vec![(id(100), id(50))]);
    }

    #[tokio::test]
    async fn test_connect_not_found_does_not_attach() {
        let (gateway, resolver) = setup();
        assert!(resolver.connect(id(100), "missing").await.is_err());
        assert!(gateway.attachments().is_empty());
    }

    #[tokio::test]
    async fn test_attach_failure_propagates() {
        let (gateway, resolver) = setup();
        gateway.fail_attach("interface busy");
        let err = resolver.connect(id(100), "42").await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_nic_slots() {
        let (gateway, resolver) = setup();
        gateway.insert(server(1, &[100, 101]));
        gateway.insert(server(2, &[200]));

        resolver.connect_to_shared_nic(id(1), "42").await.unwrap();
        resolver.connect_to_private_nic(id(1), "staging").await.unwrap();
        assert_eq!(
            resolver.connect_to_private_nic(id(2), "42").await.unwrap(),
            None
        );

        assert_eq!(
            gateway.attachments(),
            vec![(id(100), id(42)), (id(101), id(50))]
        );
    }

    #[tokio::test]
    async fn test_for_kind_searches_that_collection() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.insert(archive(5));
        gateway.insert(packet_filter(6, "archive-like"));
        let resolver = ReferenceResolver::for_kind(Arc::clone(&gateway), ResourceKind::Archive);

        assert_eq!(resolver.kind(), ResourceKind::Archive);
        assert_eq!(resolver.resolve("archive").await.unwrap(), Some(id(5)));
        assert_eq!(ReferenceResolver::new(gateway).kind(), ResourceKind::PacketFilter);
    }

    #[test]
    fn test_nic_slot_index() {
        assert_eq!(NicSlot::Shared.index(), 0);
        assert_eq!(NicSlot::Private.index(), 1);
    }
}
