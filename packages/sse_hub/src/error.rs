use thiserror::Error;

/// Errors surfaced by hub setup and lifecycle operations.
///
/// Decode failures and render failures are deliberately absent: both are
/// contained where they happen (raw-text fallback, per-consumer logging) and
/// never escalate past a single message or a single consumer.
#[derive(Debug, Error)]
pub enum HubError {
    /// Configuration had no stream URL; the target is left unconfigured.
    #[error("stream URL not resolved")]
    MissingUrl,

    /// The transport factory failed to open a stream.
    #[error("failed to open transport: {0}")]
    Transport(String),

    /// A connection actor went away mid-request.
    #[error("connection channel closed: {0}")]
    ChannelClosed(String),
}
