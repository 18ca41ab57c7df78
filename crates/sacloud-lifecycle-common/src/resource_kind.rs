//! Resource collections addressed by the control-plane API

/// Types of resources managed through the gateway
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ResourceKind {
    /// Block-storage volume
    #[strum(serialize = "disk")]
    Disk,
    /// Read-only image a disk can be copied from
    #[strum(serialize = "archive")]
    Archive,
    /// Compute instance
    #[strum(serialize = "server")]
    Server,
    /// Network filter attached to interfaces
    #[strum(to_string = "packetfilter", serialize = "packet-filter")]
    PacketFilter,
    /// Network interface of a server
    #[strum(serialize = "interface")]
    Interface,
}

impl ResourceKind {
    /// API collection path segment for this kind
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Disk => "disk",
            ResourceKind::Archive => "archive",
            ResourceKind::Server => "server",
            ResourceKind::PacketFilter => "packetfilter",
            ResourceKind::Interface => "interface",
        }
    }

    /// Top-level JSON key wrapping a single resource in API responses
    pub fn envelope_key(self) -> &'static str {
        match self {
            ResourceKind::Disk => "Disk",
            ResourceKind::Archive => "Archive",
            ResourceKind::Server => "Server",
            ResourceKind::PacketFilter => "PacketFilter",
            ResourceKind::Interface => "Interface",
        }
    }

    /// Top-level JSON key wrapping a list of resources in search responses
    pub fn list_key(self) -> &'static str {
        match self {
            ResourceKind::Disk => "Disks",
            ResourceKind::Archive => "Archives",
            ResourceKind::Server => "Servers",
            ResourceKind::PacketFilter => "PacketFilters",
            ResourceKind::Interface => "Interfaces",
        }
    }

    /// Whether resources of this kind can carry provenance links
    pub fn has_provenance(self) -> bool {
        matches!(self, ResourceKind::Disk | ResourceKind::Archive)
    }
}
