use crate::event::Stream;
use thiserror::Error;

/// A failure raised by a [`Publisher`](crate::Publisher).
///
/// Per-message delivery failures are not errors; they arrive as
/// [`DeliveryReport`](crate::DeliveryReport)s.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to create producer: {0}")]
    Connect(String),
    #[error("message {key} rejected by `{topic}`: {reason}")]
    Rejected {
        topic: String,
        key: String,
        reason: String,
    },
}

/// A malformed configuration value.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {name}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

/// A failure that ends a journey early.
#[derive(Debug, Error)]
pub enum JourneyError {
    #[error("failed to encode {stream} event {key}: {source}")]
    Encode {
        stream: Stream,
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
