use serde::{Deserialize, Serialize};

/// Lifecycle state of a Version. Serialized as the uppercase variant name
/// everywhere it crosses a boundary (journal payload, persisted column, API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "version_state", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionState {
    Enabled,
    Disabled,
    Deprecated,
}

impl VersionState {
    /// Whether `self -> next` is a defined transition (§4.B state machine).
    /// Deletion is modeled separately (it removes the row outright) and is
    /// therefore not a member of this state machine at all.
    pub fn can_transition_to(self, next: VersionState) -> bool {
        use VersionState::*;
        matches!(
            (self, next),
            (Enabled, Disabled)
                | (Disabled, Enabled)
                | (Enabled, Deprecated)
                | (Deprecated, Enabled)
        )
    }
}

impl std::fmt::Display for VersionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VersionState::Enabled => "ENABLED",
            VersionState::Disabled => "DISABLED",
            VersionState::Deprecated => "DEPRECATED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::VersionState::*;

    #[test]
    fn enabled_disabled_is_reversible() {
        assert!(Enabled.can_transition_to(Disabled));
        assert!(Disabled.can_transition_to(Enabled));
    }

    #[test]
    fn enabled_deprecated_is_reversible() {
        assert!(Enabled.can_transition_to(Deprecated));
        assert!(Deprecated.can_transition_to(Enabled));
    }

    #[test]
    fn disabled_deprecated_is_undefined() {
        assert!(!Disabled.can_transition_to(Deprecated));
        assert!(!Deprecated.can_transition_to(Disabled));
    }

    #[test]
    fn self_transition_is_undefined() {
        assert!(!Enabled.can_transition_to(Enabled));
    }
}
