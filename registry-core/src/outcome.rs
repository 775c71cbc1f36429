use registry_models::{Artifact, Comment, ConfigProperty, Download, Group, RoleMapping, Rule, Version};

/// Everything an applied message can hand back to its originating caller
/// (§4.G, §4.I). The Coordinator stores one of these (or a `StorageError`)
/// per UUID; the Local Store Facade's write methods each know which variant
/// their own message type produces and unwrap it, never guessing across
/// variants (§9 "dual-mode facade").
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    Group(Group),
    Artifact(Artifact),
    ArtifactAndVersion(Artifact, Version),
    Version(Version),
    Rule(Rule),
    Comment(Comment),
    RoleMapping(RoleMapping),
    Download(Download),
    ConfigProperty(ConfigProperty),
    Unit,
}

macro_rules! outcome_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        impl ApplyOutcome {
            pub fn $name(self) -> $ty {
                match self {
                    ApplyOutcome::$variant(v) => v,
                    other => unreachable_outcome(stringify!($variant), &other),
                }
            }
        }
    };
}

outcome_accessor!(into_group, Group, Group);
outcome_accessor!(into_artifact, Artifact, Artifact);
outcome_accessor!(into_version, Version, Version);
outcome_accessor!(into_rule, Rule, Rule);
outcome_accessor!(into_comment, Comment, Comment);
outcome_accessor!(into_role_mapping, RoleMapping, RoleMapping);
outcome_accessor!(into_download, Download, Download);
outcome_accessor!(into_config_property, ConfigProperty, ConfigProperty);

impl ApplyOutcome {
    pub fn into_artifact_and_version(self) -> (Artifact, Version) {
        match self {
            ApplyOutcome::ArtifactAndVersion(a, v) => (a, v),
            other => unreachable_outcome("ArtifactAndVersion", &other),
        }
    }

    pub fn into_unit(self) {
        match self {
            ApplyOutcome::Unit => (),
            other => unreachable_outcome("Unit", &other),
        }
    }
}

/// The Sink always builds the outcome variant that matches the message type
/// it just applied, and the facade method that submitted that message type is
/// the only caller that ever unwraps it; a mismatch means the Sink and the
/// facade have drifted out of sync with each other, which is a programming
/// error, not a runtime condition a caller can recover from.
fn unreachable_outcome(expected: &str, got: &ApplyOutcome) -> ! {
    panic!("expected ApplyOutcome::{expected}, got {got:?}");
}
