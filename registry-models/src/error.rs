/// The kind of coordinate or row a `NotFound`/`AlreadyExists` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Group,
    Artifact,
    Version,
    Content,
    Rule,
    Comment,
    RoleMapping,
    Download,
    Markdown,
    ConfigProperty,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Group => "group",
            ErrorKind::Artifact => "artifact",
            ErrorKind::Version => "version",
            ErrorKind::Content => "content",
            ErrorKind::Rule => "rule",
            ErrorKind::Comment => "comment",
            ErrorKind::RoleMapping => "role mapping",
            ErrorKind::Download => "download",
            ErrorKind::Markdown => "markdown",
            ErrorKind::ConfigProperty => "config property",
        };
        f.write_str(s)
    }
}

/// The polymorphic error channel threaded through the Local Store Facade, the
/// Coordinator, and the Sink. A single tagged enum replaces the exception
/// hierarchy of the source system (see DESIGN.md).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{kind} not found: {coordinates}")]
    NotFound { kind: ErrorKind, coordinates: String },

    #[error("{kind} already exists: {coordinates}")]
    AlreadyExists { kind: ErrorKind, coordinates: String },

    #[error("cannot transition version from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: crate::state::VersionState,
        to: crate::state::VersionState,
    },

    #[error("rule {rule_type} rejected content: {detail}")]
    RuleViolation { rule_type: String, detail: String },

    #[error("reference invalid: {detail}")]
    ReferenceInvalid { detail: String },

    #[error("timed out waiting for the journal to apply this mutation")]
    Timeout,

    #[error("storage unavailable")]
    StorageUnavailable(#[source] anyhow::Error),

    #[error("conflict: {detail}")]
    Conflict { detail: String },

    #[error("fatal: {detail}")]
    Fatal { detail: String },
}

impl StorageError {
    pub fn not_found(kind: ErrorKind, coordinates: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            coordinates: coordinates.into(),
        }
    }

    pub fn already_exists(kind: ErrorKind, coordinates: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            coordinates: coordinates.into(),
        }
    }

    /// Whether this error is safe to swallow when it surfaces from applying a
    /// message that was produced during bootstrap replay (§4.I idempotence
    /// policy). Only errors that a re-delivered, already-applied message would
    /// deterministically produce qualify.
    pub fn is_idempotent_replay_error(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::NotFound { .. })
    }

    /// HTTP status hint for a REST layer that wraps this core. The core itself
    /// never depends on an HTTP crate; this keeps that boundary thin.
    pub fn as_http_status_hint(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } => 409,
            Self::Conflict { .. } => 409,
            Self::InvalidStateTransition { .. } => 422,
            Self::RuleViolation { .. } => 422,
            Self::ReferenceInvalid { .. } => 422,
            Self::Timeout => 504,
            Self::StorageUnavailable(_) => 503,
            Self::Fatal { .. } => 500,
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound {
                kind: ErrorKind::Artifact,
                coordinates: "<unspecified>".to_string(),
            },
            other => StorageError::StorageUnavailable(other.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
