use thiserror::Error;

use crate::credentials::CredentialsError;
use crate::stream::TopicType;

/// Process exit code is in range (0, 255)
pub const RETURN_CODE_MASK: u32 = 0xff;

/// Exit code for failures that carry no status code
pub const UNKNOWN_ERROR_EXIT_CODE: u8 = 0xf0;

/// Base of the stream manager status code space
pub const STATUS_ERROR_BASE: u32 = 0x1000;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Callback setup failed: {0}")]
    CallbackSetup(String),

    #[error("Producer initialization failed: {0}")]
    ProducerInit(String),

    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("Failed to create stream {stream}: {reason}")]
    CreateStream { stream: String, reason: String },

    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    #[error("No callback registered for topic type {0}")]
    NoCallback(TopicType),

    #[error("Subscription failed for topic {topic}: {reason}")]
    Subscription { topic: String, reason: String },

    #[error("Topic not subscribed: {0}")]
    NotSubscribed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StreamError {
    /// Numeric status code, used for the process exit code
    #[must_use]
    pub const fn status_code(&self) -> u32 {
        let offset = match self {
            Self::CallbackSetup(_) => 0x01,
            Self::ProducerInit(_) => 0x02,
            Self::Credentials(_) => 0x03,
            Self::CreateStream { .. } => 0x04,
            Self::StreamNotFound(_) => 0x05,
            Self::NoCallback(_) => 0x06,
            Self::Subscription { .. } => 0x07,
            Self::NotSubscribed(_) => 0x08,
            Self::Internal(_) => 0xff,
        };
        STATUS_ERROR_BASE + offset
    }
}

pub type StreamResult<T> = Result<T, StreamError>;

/// Map a fatal error to a process exit code
///
/// Stream errors exit with their status code masked to a single byte;
/// anything else exits with [`UNKNOWN_ERROR_EXIT_CODE`].
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StreamError>())
        .and_then(|stream_err| u8::try_from(stream_err.status_code() & RETURN_CODE_MASK).ok())
        .filter(|code| *code != 0)
        .unwrap_or(UNKNOWN_ERROR_EXIT_CODE)
}
