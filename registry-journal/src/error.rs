#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("failed to encode journal record")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode journal record")]
    Decode(#[source] serde_json::Error),

    #[error("journal record had no payload where one was required")]
    EmptyPayload,

    #[error("journal producer unavailable")]
    ProducerUnavailable(#[source] anyhow::Error),

    #[error("journal consumer unavailable")]
    ConsumerUnavailable(#[source] anyhow::Error),

    #[error("journal closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, JournalError>;
