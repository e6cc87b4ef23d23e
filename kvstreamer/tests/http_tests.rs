//! HTTP control surface tests
//!
//! Run with: cargo test --test http_tests

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use kvstreamer::{create_router, AppState};
use kvstreamer_core::{
    config::StreamConfig,
    stream::{
        ControllerSettings, Frame, ProducerClient, StreamGroupController, SubscriptionInstaller,
        TopicType,
    },
    StreamError, StreamResult,
};

/// Producer that accepts everything except creating `reject`
struct TestProducer {
    reject: Option<&'static str>,
    frames: parking_lot::Mutex<Vec<(String, usize, bool)>>,
}

#[async_trait]
impl ProducerClient for TestProducer {
    async fn initialize(&self, _region: &str) -> StreamResult<()> {
        Ok(())
    }

    async fn create_stream(&self, stream_name: &str) -> StreamResult<()> {
        if self.reject == Some(stream_name) {
            return Err(StreamError::CreateStream {
                stream: stream_name.to_string(),
                reason: "rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn free_stream(&self, _stream_name: &str) -> StreamResult<()> {
        Ok(())
    }

    async fn put_frame(&self, stream_name: &str, frame: Frame) -> StreamResult<()> {
        self.frames
            .lock()
            .push((stream_name.to_string(), frame.data.len(), frame.key_frame));
        Ok(())
    }
}

struct Harness {
    app: Router,
    shutdown: CancellationToken,
    producer: Arc<TestProducer>,
}

async fn harness(reject: Option<&'static str>) -> Harness {
    let producer = Arc::new(TestProducer {
        reject,
        frames: parking_lot::Mutex::new(Vec::new()),
    });
    let installer = Arc::new(SubscriptionInstaller::new(producer.clone()));
    let settings = ControllerSettings {
        region: "us-west-2".to_string(),
        enabled: false,
        streams: vec![
            StreamConfig {
                stream_name: "front".to_string(),
                topic_name: "/camera/front".to_string(),
                topic_type: TopicType::KinesisVideoFrame,
            },
            StreamConfig {
                stream_name: "rear".to_string(),
                topic_name: "/camera/rear".to_string(),
                topic_type: TopicType::Image,
            },
        ],
    };
    let controller = StreamGroupController::initialize(settings, producer.clone(), installer)
        .await
        .unwrap();

    let shutdown = CancellationToken::new();
    let app = create_router(AppState::new(Arc::new(controller), shutdown.clone()));
    Harness {
        app,
        shutdown,
        producer,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn command(enable: bool) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/command")
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"enable":{enable}}}"#)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness(None).await;
    let response = h.app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_enable_command_updates_status() {
    let h = harness(None).await;

    let (status, body) = send(&h.app, get("/enabled")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);
    assert_eq!(body["publish_count"], 1);

    let (status, body) = send(&h.app, command(true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&h.app, get("/enabled")).await;
    assert_eq!(body["enabled"], true);
    assert_eq!(body["publish_count"], 2);

    let (_, body) = send(&h.app, get("/streams")).await;
    assert_eq!(body[0]["stream_name"], "front");
    assert_eq!(body[0]["status"], "installed");
    assert!(!h.shutdown.is_cancelled());
}

#[tokio::test]
async fn test_failed_command_requests_shutdown() {
    let h = harness(Some("rear")).await;

    let (status, body) = send(&h.app, command(true)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(h.shutdown.is_cancelled());

    let (_, body) = send(&h.app, get("/enabled")).await;
    assert_eq!(body["enabled"], false);
}

#[tokio::test]
async fn test_frame_ingress_routes_to_stream() {
    let h = harness(None).await;
    send(&h.app, command(true)).await;

    let request = Request::builder()
        .method("POST")
        .uri("/frames/camera/rear?key_frame=true")
        .body(Body::from(vec![7u8; 32]))
        .unwrap();
    let (status, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        h.producer.frames.lock().clone(),
        vec![("rear".to_string(), 32, true)]
    );

    let request = Request::builder()
        .method("POST")
        .uri("/frames/camera/unknown")
        .body(Body::from(vec![1u8]))
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}
