// Subscription registry
//
// Maps topic types to callback factories and topics to live subscriptions.
// A subscription routes inbound frames of one topic into its stream.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::entry::{StreamEntry, TopicType};
use super::producer::{Frame, ProducerClient};
use crate::error::{StreamError, StreamResult};

/// Receives the frames of one subscribed topic
#[async_trait]
pub trait FrameHandler: Send + Sync {
    async fn handle(&self, frame: Frame) -> StreamResult<()>;
}

/// Builds the handler for a stream when its topic is installed
pub type CallbackFactory =
    Box<dyn Fn(&StreamEntry, Arc<dyn ProducerClient>) -> Arc<dyn FrameHandler> + Send + Sync>;

/// Default handler: forwards every frame to the producer
pub struct ProducerFrameHandler {
    producer: Arc<dyn ProducerClient>,
    stream_name: String,
    topic_type: TopicType,
}

impl ProducerFrameHandler {
    #[must_use]
    pub fn new(producer: Arc<dyn ProducerClient>, stream_name: &str, topic_type: TopicType) -> Self {
        Self {
            producer,
            stream_name: stream_name.to_string(),
            topic_type,
        }
    }
}

#[async_trait]
impl FrameHandler for ProducerFrameHandler {
    async fn handle(&self, frame: Frame) -> StreamResult<()> {
        trace!(
            stream = %self.stream_name,
            topic_type = %self.topic_type,
            analysis = self.topic_type.with_analysis(),
            bytes = frame.data.len(),
            "Forwarding frame"
        );
        self.producer.put_frame(&self.stream_name, frame).await
    }
}

struct Subscription {
    stream_name: String,
    handler: Arc<dyn FrameHandler>,
}

pub struct SubscriptionInstaller {
    producer: Arc<dyn ProducerClient>,
    callbacks: RwLock<HashMap<TopicType, CallbackFactory>>,
    subscriptions: DashMap<String, Subscription>,
}

impl SubscriptionInstaller {
    #[must_use]
    pub fn new(producer: Arc<dyn ProducerClient>) -> Self {
        Self {
            producer,
            callbacks: RwLock::new(HashMap::new()),
            subscriptions: DashMap::new(),
        }
    }

    /// Bind `factory` to `topic_type`; each type may be bound once
    pub fn set_callback(&self, topic_type: TopicType, factory: CallbackFactory) -> StreamResult<()> {
        let mut callbacks = self.callbacks.write();
        if callbacks.contains_key(&topic_type) {
            return Err(StreamError::CallbackSetup(format!(
                "callback for {topic_type} already registered"
            )));
        }
        callbacks.insert(topic_type, factory);
        debug!(topic_type = %topic_type, "Registered callback");
        Ok(())
    }

    /// Bind the producer-forwarding handler to every topic type
    pub fn set_default_callbacks(&self) -> StreamResult<()> {
        for topic_type in TopicType::ALL {
            self.set_callback(
                topic_type,
                Box::new(|entry, producer| {
                    Arc::new(ProducerFrameHandler::new(
                        producer,
                        &entry.stream_name,
                        entry.topic_type,
                    ))
                }),
            )?;
        }
        Ok(())
    }

    #[must_use]
    pub fn has_callback(&self, topic_type: TopicType) -> bool {
        self.callbacks.read().contains_key(&topic_type)
    }

    /// Subscribe the entry's topic; installing the same entry twice is a no-op
    pub fn install(&self, entry: &StreamEntry) -> StreamResult<()> {
        if let Some(existing) = self.subscriptions.get(&entry.topic_name) {
            if existing.stream_name == entry.stream_name {
                return Ok(());
            }
            return Err(StreamError::Subscription {
                topic: entry.topic_name.clone(),
                reason: format!("already routed to stream {}", existing.stream_name),
            });
        }

        let handler = {
            let callbacks = self.callbacks.read();
            let factory = callbacks
                .get(&entry.topic_type)
                .ok_or(StreamError::NoCallback(entry.topic_type))?;
            factory(entry, self.producer.clone())
        };

        self.subscriptions.insert(
            entry.topic_name.clone(),
            Subscription {
                stream_name: entry.stream_name.clone(),
                handler,
            },
        );
        info!(
            topic = %entry.topic_name,
            stream = %entry.stream_name,
            topic_type = %entry.topic_type,
            "Installed subscription"
        );
        Ok(())
    }

    /// Drop the subscription for `topic`; returns whether one existed
    pub fn uninstall(&self, topic: &str) -> bool {
        let removed = self.subscriptions.remove(topic).is_some();
        if removed {
            info!(topic, "Uninstalled subscription");
        }
        removed
    }

    #[must_use]
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.contains_key(topic)
    }

    #[must_use]
    pub fn subscribed_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.subscriptions.iter().map(|e| e.key().clone()).collect();
        topics.sort();
        topics
    }

    /// Route an inbound frame to the handler subscribed on `topic`
    pub async fn dispatch(&self, topic: &str, frame: Frame) -> StreamResult<()> {
        let handler = self
            .subscriptions
            .get(topic)
            .map(|s| s.handler.clone())
            .ok_or_else(|| StreamError::NotSubscribed(topic.to_string()))?;
        handler.handle(frame).await
    }
}
