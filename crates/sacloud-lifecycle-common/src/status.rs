//! Resource readiness states
//!
//! Provides the `ResourceState` enum derived from the provider's
//! `Availability` field, and the `Availability` marker carried on
//! provenance links.

/// Readiness of a monitored resource
///
/// Transitions only move forward:
/// `Pending -> InProgress -> {Available | Failed}`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ResourceState {
    /// Accepted by the provider, work not yet started
    #[default]
    #[strum(serialize = "pending")]
    Pending,
    /// Copy, migration or upload underway
    #[strum(serialize = "in-progress")]
    InProgress,
    /// Ready for use
    #[strum(serialize = "available")]
    Available,
    /// Provisioning failed
    #[strum(serialize = "failed")]
    Failed,
}

impl ResourceState {
    /// Map a provider `Availability` string to a state.
    ///
    /// Unknown or missing values are treated as `Pending`. `discontinued` is
    /// not terminal: a monitor keeps polling such a resource until its
    /// deadline. Provenance walks read the marker through [`Availability`].
    pub fn from_availability(availability: Option<&str>) -> Self {
        match availability.map(str::trim) {
            Some("available") => Self::Available,
            Some("failed") => Self::Failed,
            Some("migrating") | Some("uploading") | Some("transferring")
            | Some("discontinued") => Self::InProgress,
            _ => Self::Pending,
        }
    }

    /// Check if the state is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Available | Self::Failed)
    }
}

/// Availability marker on a provenance link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::AsRefStr)]
pub enum Availability {
    #[default]
    #[strum(serialize = "active")]
    Active,
    /// Source was retired; its lineage is not followed
    #[strum(serialize = "discontinued")]
    Discontinued,
}

impl Availability {
    /// Map a provider `Availability` string to a link marker
    pub fn from_provider(availability: Option<&str>) -> Self {
        match availability.map(str::trim) {
            Some("discontinued") => Self::Discontinued,
            _ => Self::Active,
        }
    }

    pub fn is_discontinued(self) -> bool {
        matches!(self, Self::Discontinued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_availability() {
        assert_eq!(
            ResourceState::from_availability(Some("available")),
            ResourceState::Available
        );
        assert_eq!(
            ResourceState::from_availability(Some("failed")),
            ResourceState::Failed
        );
        assert_eq!(
            ResourceState::from_availability(Some("migrating")),
            ResourceState::InProgress
        );
        assert_eq!(
            ResourceState::from_availability(Some("uploading")),
            ResourceState::InProgress
        );
        assert_eq!(
            ResourceState::from_availability(None),
            ResourceState::Pending
        );
        assert_eq!(
            ResourceState::from_availability(Some("")),
            ResourceState::Pending
        );
        assert_eq!(
            ResourceState::from_availability(Some("something-new")),
            ResourceState::Pending
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(ResourceState::Available.is_terminal());
        assert!(ResourceState::Failed.is_terminal());
        assert!(!ResourceState::Pending.is_terminal());
        assert!(!ResourceState::InProgress.is_terminal());
    }

    #[test]
    fn test_discontinued_is_not_terminal() {
        let state = ResourceState::from_availability(Some("discontinued"));
        assert_eq!(state, ResourceState::InProgress);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_display_from_str() {
        assert_eq!(ResourceState::InProgress.to_string(), "in-progress");
        assert_eq!(
            "AVAILABLE".parse::<ResourceState>(),
            Ok(ResourceState::Available)
        );
        assert!("bogus".parse::<ResourceState>().is_err());
    }

    #[test]
    fn test_link_availability() {
        assert!(Availability::from_provider(Some("discontinued")).is_discontinued());
        assert!(!Availability::from_provider(Some("available")).is_discontinued());
        assert!(!Availability::from_provider(None).is_discontinued());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Only the two terminal strings map to terminal states
            #[test]
            fn terminal_only_for_known_strings(s in "[a-z]{0,16}") {
                let state = ResourceState::from_availability(Some(&s));
                if state.is_terminal() {
                    prop_assert!(s == "available" || s == "failed");
                }
            }
        }
    }
}
