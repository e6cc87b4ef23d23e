// Local producer
//
// Keeps per-stream accounting in memory and refreshes credentials on the
// producer's pull schedule. Uploading to the cloud service is not part of
// this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::producer::{Frame, ProducerClient};
use crate::credentials::ProducerCredentialsProvider;
use crate::error::{StreamError, StreamResult};

/// Counters for one stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub frames: u64,
    pub key_frames: u64,
    pub bytes: u64,
    pub last_frame_at: Option<DateTime<Utc>>,
}

struct Session {
    region: String,
    credentials_expiration: DateTime<Utc>,
}

pub struct LocalProducer {
    credentials: ProducerCredentialsProvider,
    session: RwLock<Option<Session>>,
    streams: DashMap<String, StreamStats>,
}

impl LocalProducer {
    #[must_use]
    pub fn new(credentials: ProducerCredentialsProvider) -> Self {
        Self {
            credentials,
            session: RwLock::new(None),
            streams: DashMap::new(),
        }
    }

    #[must_use]
    pub fn region(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.region.clone())
    }

    #[must_use]
    pub fn stream_stats(&self, stream_name: &str) -> Option<StreamStats> {
        self.streams.get(stream_name).map(|s| s.clone())
    }

    #[must_use]
    pub fn stream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn credentials_expiration(&self) -> StreamResult<DateTime<Utc>> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.credentials_expiration)
            .ok_or_else(|| StreamError::ProducerInit("producer is not initialized".to_string()))
    }

    async fn refresh_credentials_if_due(&self) -> StreamResult<()> {
        if Utc::now() < self.credentials_expiration()? {
            return Ok(());
        }

        let creds = self.credentials.fetch().await.map_err(|e| {
            warn!(error = %e, "Failed to refresh producer credentials");
            StreamError::Credentials(e)
        })?;
        debug!(expiration = %creds.expiration, "Refreshed producer credentials");
        if let Some(session) = self.session.write().as_mut() {
            session.credentials_expiration = creds.expiration;
        }
        Ok(())
    }
}

#[async_trait]
impl ProducerClient for LocalProducer {
    async fn initialize(&self, region: &str) -> StreamResult<()> {
        if region.is_empty() {
            return Err(StreamError::ProducerInit("region must not be empty".to_string()));
        }

        let creds = self.credentials.fetch().await?;
        info!(
            region,
            access_key = %creds.access_key,
            expiration = %creds.expiration,
            "Producer initialized"
        );

        *self.session.write() = Some(Session {
            region: region.to_string(),
            credentials_expiration: creds.expiration,
        });
        Ok(())
    }

    async fn create_stream(&self, stream_name: &str) -> StreamResult<()> {
        self.credentials_expiration()?;
        if stream_name.is_empty() {
            return Err(StreamError::CreateStream {
                stream: stream_name.to_string(),
                reason: "stream name must not be empty".to_string(),
            });
        }

        if self.streams.contains_key(stream_name) {
            debug!(stream = stream_name, "Stream already exists");
        } else {
            self.streams.insert(stream_name.to_string(), StreamStats::default());
            info!(stream = stream_name, "Created stream");
        }
        Ok(())
    }

    async fn free_stream(&self, stream_name: &str) -> StreamResult<()> {
        match self.streams.remove(stream_name) {
            Some((_, stats)) => {
                info!(
                    stream = stream_name,
                    frames = stats.frames,
                    bytes = stats.bytes,
                    "Freed stream"
                );
                Ok(())
            }
            None => Err(StreamError::StreamNotFound(stream_name.to_string())),
        }
    }

    async fn put_frame(&self, stream_name: &str, frame: Frame) -> StreamResult<()> {
        self.refresh_credentials_if_due().await?;

        let mut stats = self
            .streams
            .get_mut(stream_name)
            .ok_or_else(|| StreamError::StreamNotFound(stream_name.to_string()))?;
        stats.frames += 1;
        stats.bytes += frame.data.len() as u64;
        if frame.key_frame {
            stats.key_frames += 1;
        }
        stats.last_frame_at = Some(frame.timestamp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credentials, CredentialsError, CredentialsProvider, ProviderKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingProvider {
        fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CredentialsProvider for CountingProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Environment
        }

        async fn credentials(&self) -> Result<Credentials, CredentialsError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(CredentialsError::ChainExhausted { tried: vec!["environment"] })
            } else {
                Ok(Credentials::new("AKID", "secret", None))
            }
        }
    }

    fn producer(provider: Arc<CountingProvider>) -> LocalProducer {
        LocalProducer::new(ProducerCredentialsProvider::new(Some(provider)))
    }

    #[tokio::test]
    async fn test_initialize_requires_credentials() {
        let provider = Arc::new(CountingProvider {
            fail: true,
            ..CountingProvider::default()
        });
        let producer = producer(provider);

        let err = producer.initialize("us-west-2").await.unwrap_err();
        assert!(matches!(err, StreamError::Credentials(_)));
        assert_eq!(producer.region(), None);
    }

    #[tokio::test]
    async fn test_create_requires_initialize() {
        let producer = producer(Arc::new(CountingProvider::default()));

        let err = producer.create_stream("front").await.unwrap_err();
        assert!(matches!(err, StreamError::ProducerInit(_)));
    }

    #[tokio::test]
    async fn test_stream_lifecycle() {
        let provider = Arc::new(CountingProvider::default());
        let producer = producer(provider.clone());
        producer.initialize("us-west-2").await.unwrap();
        assert_eq!(producer.region().as_deref(), Some("us-west-2"));

        producer.create_stream("front").await.unwrap();
        producer.create_stream("front").await.unwrap();
        assert_eq!(producer.stream_names(), vec!["front".to_string()]);

        producer.put_frame("front", Frame::new(vec![0u8; 10], true)).await.unwrap();
        producer.put_frame("front", Frame::new(vec![0u8; 5], false)).await.unwrap();

        let stats = producer.stream_stats("front").unwrap();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.key_frames, 1);
        assert_eq!(stats.bytes, 15);
        // Credentials are still fresh, no refetch
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);

        producer.free_stream("front").await.unwrap();
        assert!(matches!(
            producer.free_stream("front").await,
            Err(StreamError::StreamNotFound(_))
        ));
        assert!(matches!(
            producer.put_frame("front", Frame::new(vec![1u8], false)).await,
            Err(StreamError::StreamNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_refreshes_expired_credentials() {
        let provider = Arc::new(CountingProvider::default());
        let producer = producer(provider.clone());
        producer.initialize("us-west-2").await.unwrap();
        producer.create_stream("front").await.unwrap();

        if let Some(session) = producer.session.write().as_mut() {
            session.credentials_expiration = Utc::now() - chrono::Duration::seconds(1);
        }

        producer.put_frame("front", Frame::new(vec![0u8; 3], false)).await.unwrap();
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
    }
}
