//! Integration tests for kvstreamer-core
//!
//! These tests wire the credential chain, the local producer and the stream
//! group controller together the way the binary does.
//!
//! Run with: cargo test --test integration_tests

use std::io::Write;
use std::path::Path;

use kvstreamer_core::{
    bootstrap::init_services,
    config::{Config, IotRoleConfig, StreamConfig},
    credentials::{build_provider_chain, CredentialsProvider, Env, ProviderKind},
    exit_code,
    stream::{Frame, TopicType},
};

fn three_stream_config(enabled: bool) -> Config {
    Config {
        enabled,
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
            StreamConfig {
                stream_name: "cabin".to_string(),
                topic_name: "/camera/cabin".to_string(),
                topic_type: TopicType::ImageWithAnalysis,
            },
        ],
        ..Config::default()
    }
}

/// Environment with static keys and no other credential sources
fn static_env() -> Env {
    Env::from_pairs([
        ("AWS_ACCESS_KEY_ID", "AKIDENV"),
        ("AWS_SECRET_ACCESS_KEY", "env-secret"),
        ("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/credentials"),
        ("AWS_EC2_METADATA_DISABLED", "true"),
    ])
}

fn profile_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[default]\naws_access_key_id = AKIDPROFILE\naws_secret_access_key = profile-secret"
    )
    .unwrap();
    file
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[tokio::test]
async fn test_group_starts_disabled_then_enables() {
    let services = init_services(&three_stream_config(false), &static_env())
        .await
        .unwrap();
    let controller = &services.controller;

    assert!(!controller.is_enabled().await);
    assert!(!controller.status().current());
    assert!(services.producer.stream_names().is_empty());

    controller.command(true).await.unwrap();

    assert!(controller.is_enabled().await);
    assert!(controller.status().current());
    assert_eq!(controller.status().publish_count(), 2);
    assert_eq!(services.producer.stream_names(), vec!["cabin", "front", "rear"]);
    assert!(controller.streams().await.iter().all(|s| s.is_installed()));

    controller
        .installer()
        .dispatch("/camera/rear", Frame::new(vec![0u8; 64], true))
        .await
        .unwrap();
    let stats = services.producer.stream_stats("rear").unwrap();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.bytes, 64);

    controller.command(false).await.unwrap();
    assert!(services.producer.stream_names().is_empty());
    assert!(controller.installer().subscribed_topics().is_empty());
}

#[tokio::test]
async fn test_incomplete_iot_config_falls_through_to_static_sources() {
    let profile = profile_file();
    let config = kvstreamer_core::config::CredentialsConfig {
        iot: IotRoleConfig {
            cafile: "/certs/ca.pem".to_string(),
            certfile: "/certs/cert.pem".to_string(),
            keyfile: "/certs/key.pem".to_string(),
            endpoint: "abc.credentials.iot.us-west-2.amazonaws.com".to_string(),
            role: String::new(),
            thing_name: "robot-1".to_string(),
            connect_timeout_ms: 1000,
            total_timeout_ms: 5000,
        },
    };

    // No container signals: instance metadata is the dynamic provider
    let env = Env::from_pairs([
        ("AWS_SHARED_CREDENTIALS_FILE", path_str(profile.path())),
    ]);
    let chain = build_provider_chain(&config, &env);
    assert_eq!(
        chain.kinds(),
        vec![
            ProviderKind::Environment,
            ProviderKind::Profile,
            ProviderKind::InstanceMetadata
        ]
    );

    // Environment is empty, so the profile file wins
    let creds = chain.credentials().await.unwrap();
    assert_eq!(creds.access_key_id, "AKIDPROFILE");

    // Environment keys take precedence over the profile
    let env = Env::from_pairs([
        ("AWS_ACCESS_KEY_ID", "AKIDENV"),
        ("AWS_SECRET_ACCESS_KEY", "env-secret"),
        ("AWS_SHARED_CREDENTIALS_FILE", path_str(profile.path())),
        ("AWS_EC2_METADATA_DISABLED", "TRUE"),
    ]);
    let chain = build_provider_chain(&config, &env);
    assert_eq!(
        chain.kinds(),
        vec![ProviderKind::Environment, ProviderKind::Profile]
    );
    let creds = chain.credentials().await.unwrap();
    assert_eq!(creds.access_key_id, "AKIDENV");
}

#[tokio::test]
async fn test_relative_uri_wins_over_full_uri() {
    let env = Env::from_pairs([
        ("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI", "/v2/credentials/task"),
        ("AWS_CONTAINER_CREDENTIALS_FULL_URI", "http://localhost:9911/creds"),
        ("AWS_CONTAINER_AUTHORIZATION_TOKEN", "bearer-secret"),
    ]);

    let chain = build_provider_chain(&Default::default(), &env);
    assert_eq!(
        chain.kinds(),
        vec![
            ProviderKind::Environment,
            ProviderKind::Profile,
            ProviderKind::ContainerRelativeUri
        ]
    );
}

#[tokio::test]
async fn test_unresolvable_credentials_exit_code() {
    let env = Env::from_pairs([
        ("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/credentials"),
        ("AWS_EC2_METADATA_DISABLED", "true"),
    ]);

    let err = match init_services(&three_stream_config(true), &env).await {
        Ok(_) => panic!("initialization should fail without credentials"),
        Err(e) => e,
    };

    // Credentials failures carry status 0x1003, masked to one byte
    assert_eq!(exit_code(&err), 0x03);
}
