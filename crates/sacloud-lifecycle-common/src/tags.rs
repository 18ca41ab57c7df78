//! Well-known resource tags
//!
//! The provider marks archives and disks installed from a supported OS image
//! with an `os-*` tag. Presence of one of these is enough to allow in-place
//! disk editing regardless of provenance.
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `os-unix` | Unix-family image with edit support |
//! | `os-linux` | Linux image with edit support |

/// Tag marking a Unix-family OS image
pub const TAG_OS_UNIX: &str = "os-unix";

/// Tag marking a Linux OS image
pub const TAG_OS_LINUX: &str = "os-linux";

/// Tags that make a disk editable when present
pub const ALLOW_EDIT_TAGS: &[&str] = &[TAG_OS_UNIX, TAG_OS_LINUX];
