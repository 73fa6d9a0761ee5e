//! Projection error types.

use thiserror::Error;

/// Errors raised while feeding events into the read models.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The event stream could not be read.
    #[error("event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// A stored payload did not decode as the event type it claims to be.
    ///
    /// Usually a schema drift between the writer and this reader; the
    /// offending event is named so it can be found in the log.
    #[error("malformed {event_type} payload: {source}")]
    MalformedPayload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProjectionError {
    /// Wraps a payload decode failure with the event type it came from.
    pub fn malformed(event_type: &str, source: serde_json::Error) -> Self {
        Self::MalformedPayload {
            event_type: event_type.to_string(),
            source,
        }
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
