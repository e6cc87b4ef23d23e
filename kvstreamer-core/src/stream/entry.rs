use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::StreamConfig;

/// Kind of input a topic carries; selects the default callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicType {
    /// Pre-encoded video frames
    #[default]
    KinesisVideoFrame,
    /// Raw images
    Image,
    /// Pre-encoded video frames whose stream also feeds video analysis
    KinesisVideoFrameWithAnalysis,
    /// Raw images whose stream also feeds video analysis
    ImageWithAnalysis,
}

impl TopicType {
    pub const ALL: [Self; 4] = [
        Self::KinesisVideoFrame,
        Self::Image,
        Self::KinesisVideoFrameWithAnalysis,
        Self::ImageWithAnalysis,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KinesisVideoFrame => "kinesis_video_frame",
            Self::Image => "image",
            Self::KinesisVideoFrameWithAnalysis => "kinesis_video_frame_with_analysis",
            Self::ImageWithAnalysis => "image_with_analysis",
        }
    }

    #[must_use]
    pub const fn with_analysis(self) -> bool {
        matches!(
            self,
            Self::KinesisVideoFrameWithAnalysis | Self::ImageWithAnalysis
        )
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a stream's ingestion path is currently in place
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Installed,
    #[default]
    NotInstalled,
}

/// One configured stream of the group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    pub index: usize,
    pub stream_name: String,
    pub topic_name: String,
    pub topic_type: TopicType,
    pub status: InstallStatus,
}

impl StreamEntry {
    #[must_use]
    pub fn from_config(index: usize, config: &StreamConfig) -> Self {
        Self {
            index,
            stream_name: config.stream_name.clone(),
            topic_name: config.topic_name.clone(),
            topic_type: config.topic_type,
            status: InstallStatus::NotInstalled,
        }
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.status == InstallStatus::Installed
    }
}
