//! Resource fixtures
//!
//! Builders for the handful of resource shapes the tests need. Ids are plain
//! integers so assertions stay readable.

use sacloud_lifecycle_common::{Resource, ResourceId, ResourceKind, SourceLink};

/// Shorthand for `ResourceId::new`
pub fn id(raw: u64) -> ResourceId {
    ResourceId::new(raw)
}

/// A disk in the given provider availability
pub fn disk(raw: u64, availability: &str) -> Resource {
    Resource::new(ResourceKind::Disk, id(raw), format!("disk-{raw}")).with_availability(availability)
}

/// An available archive
pub fn archive(raw: u64) -> Resource {
    Resource::new(ResourceKind::Archive, id(raw), format!("archive-{raw}"))
        .with_availability("available")
}

/// An available disk copied from another disk
pub fn disk_from_disk(raw: u64, source: SourceLink) -> Resource {
    disk(raw, "available").with_source_disk(source)
}

/// An available disk copied from an archive
pub fn disk_from_archive(raw: u64, source: SourceLink) -> Resource {
    disk(raw, "available").with_source_archive(source)
}

/// A packet filter with a display name
pub fn packet_filter(raw: u64, name: &str) -> Resource {
    Resource::new(ResourceKind::PacketFilter, id(raw), name).with_availability("available")
}

/// A running server with the given interface ids in connection order
pub fn server(raw: u64, interfaces: &[u64]) -> Resource {
    interfaces.iter().fold(
        Resource::new(ResourceKind::Server, id(raw), format!("server-{raw}"))
            .with_availability("available")
            .with_instance_status("up"),
        |server, nic| server.with_interface(id(*nic)),
    )
}

/// Build a chain of `len` disks, each copied from the next, ending in an archive.
///
/// Returns the resources in order from the leaf (`first_id`) to the root archive.
pub fn disk_chain(first_id: u64, len: u64, root_tag: Option<&str>) -> Vec<Resource> {
    let mut chain = Vec::new();
    for offset in 0..len {
        let raw = first_id + offset;
        let resource = if offset + 1 < len {
            disk_from_disk(raw, SourceLink::active(id(raw + 1)))
        } else {
            disk_from_archive(raw, SourceLink::active(id(raw + 1)))
        };
        chain.push(resource);
    }
    let mut root = archive(first_id + len);
    if let Some(tag) = root_tag {
        root = root
            .with_tag(tag)
            .with_source_archive(SourceLink::active(id(first_id + len + 1)));
    }
    chain.push(root);
    chain
}
