// Stream group controller
//
// Brings the configured streams up or down as a unit. Enabling stops at the
// first failing stream and leaves earlier streams installed; disabling
// sweeps every stream and always succeeds.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::entry::{InstallStatus, StreamEntry};
use super::producer::ProducerClient;
use super::status::LatchedStatus;
use super::subscription::SubscriptionInstaller;
use crate::config::{Config, StreamConfig};
use crate::error::StreamResult;

/// Inputs read once at startup
#[derive(Debug, Clone, Default)]
pub struct ControllerSettings {
    pub region: String,
    pub enabled: bool,
    pub streams: Vec<StreamConfig>,
}

impl ControllerSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            region: config.region.clone(),
            enabled: config.enabled,
            streams: config.streams.clone(),
        }
    }
}

struct GroupState {
    enabled: bool,
    streams: Vec<StreamEntry>,
}

pub struct StreamGroupController {
    producer: Arc<dyn ProducerClient>,
    installer: Arc<SubscriptionInstaller>,
    status: LatchedStatus,
    /// Held for the whole of a command
    state: Mutex<GroupState>,
}

impl StreamGroupController {
    /// Bind callbacks, initialize the producer and apply the configured
    /// `enabled` flag. The resulting flag is published exactly once.
    pub async fn initialize(
        settings: ControllerSettings,
        producer: Arc<dyn ProducerClient>,
        installer: Arc<SubscriptionInstaller>,
    ) -> StreamResult<Self> {
        installer.set_default_callbacks().map_err(|e| {
            error!(error = %e, "Failed to set up topic callbacks");
            e
        })?;

        producer.initialize(&settings.region).await.map_err(|e| {
            error!(region = %settings.region, error = %e, "Failed to initialize producer");
            e
        })?;

        let mut streams: Vec<StreamEntry> = settings
            .streams
            .iter()
            .enumerate()
            .map(|(index, config)| StreamEntry::from_config(index, config))
            .collect();
        info!(
            region = %settings.region,
            stream_count = streams.len(),
            enabled = settings.enabled,
            "Initializing stream group"
        );

        let controller = Self {
            producer,
            installer,
            status: LatchedStatus::new(false),
            state: Mutex::new(GroupState {
                enabled: false,
                streams: Vec::new(),
            }),
        };

        if settings.enabled {
            controller.enable_all(&mut streams).await?;
        }

        {
            let mut state = controller.state.lock().await;
            state.enabled = settings.enabled;
            state.streams = streams;
        }
        controller.status.publish(settings.enabled);

        Ok(controller)
    }

    /// Transition the group to `enable`
    ///
    /// Requesting the current state succeeds without side effects. On failure
    /// the flag is left unchanged and nothing is published.
    pub async fn command(&self, enable: bool) -> StreamResult<()> {
        let mut state = self.state.lock().await;
        if state.enabled == enable {
            debug!(enable, "Stream group already in requested state");
            return Ok(());
        }

        let result = if enable {
            self.enable_all(&mut state.streams).await
        } else {
            self.disable_all(&mut state.streams).await
        };

        match result {
            Ok(()) => {
                state.enabled = enable;
                self.status.publish(enable);
                info!(enabled = enable, "Stream group transitioned");
                Ok(())
            }
            Err(e) => {
                error!(enable, error = %e, "Stream group transition failed");
                Err(e)
            }
        }
    }

    async fn enable_all(&self, streams: &mut [StreamEntry]) -> StreamResult<()> {
        for entry in streams.iter_mut() {
            if entry.is_installed() {
                continue;
            }

            self.producer
                .create_stream(&entry.stream_name)
                .await
                .map_err(|e| {
                    error!(
                        stream = %entry.stream_name,
                        index = entry.index,
                        error = %e,
                        "Failed to create stream"
                    );
                    e
                })?;

            self.installer.install(entry).map_err(|e| {
                error!(
                    stream = %entry.stream_name,
                    topic = %entry.topic_name,
                    error = %e,
                    "Failed to install subscription"
                );
                e
            })?;

            entry.status = InstallStatus::Installed;
        }
        Ok(())
    }

    async fn disable_all(&self, streams: &mut [StreamEntry]) -> StreamResult<()> {
        for entry in streams.iter_mut() {
            if !self.installer.uninstall(&entry.topic_name) {
                debug!(topic = %entry.topic_name, "Topic was not subscribed");
            }

            if let Err(e) = self.producer.free_stream(&entry.stream_name).await {
                warn!(stream = %entry.stream_name, error = %e, "Failed to free stream");
            }

            entry.status = InstallStatus::NotInstalled;
        }
        Ok(())
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.lock().await.enabled
    }

    /// Snapshot of the configured streams in index order
    pub async fn streams(&self) -> Vec<StreamEntry> {
        self.state.lock().await.streams.clone()
    }

    #[must_use]
    pub fn installer(&self) -> &Arc<SubscriptionInstaller> {
        &self.installer
    }

    #[must_use]
    pub fn status(&self) -> &LatchedStatus {
        &self.status
    }

    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }
}
