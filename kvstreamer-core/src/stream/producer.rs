// Producer facade
//
// The media producer owns the outbound streams. The controller only calls
// these operations and interprets success or failure.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::StreamResult;

/// One unit of media pushed into a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Bytes,
    pub timestamp: DateTime<Utc>,
    pub key_frame: bool,
}

impl Frame {
    pub fn new(data: impl Into<Bytes>, key_frame: bool) -> Self {
        Self {
            data: data.into(),
            timestamp: Utc::now(),
            key_frame,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProducerClient: Send + Sync {
    /// Prepare the producer for `region`, resolving credentials
    async fn initialize(&self, region: &str) -> StreamResult<()>;

    /// Create the named stream; creating an existing stream is a no-op
    async fn create_stream(&self, stream_name: &str) -> StreamResult<()>;

    /// Release the named stream and its resources
    async fn free_stream(&self, stream_name: &str) -> StreamResult<()>;

    async fn put_frame(&self, stream_name: &str, frame: Frame) -> StreamResult<()>;
}
