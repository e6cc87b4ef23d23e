// Credential resolution
//
// Builds the ordered provider chain from configuration and environment
// signals and adapts the winning provider to the producer's refresh model.

pub mod chain;
pub mod container;
pub mod env;
pub mod environment;
pub mod error;
pub mod imds;
pub mod iot;
pub mod producer;
pub mod profile;
pub mod provider;

pub use chain::{build_provider_chain, EnvironmentSignals, ProviderChain};
pub use container::ContainerProvider;
pub use env::Env;
pub use environment::EnvironmentProvider;
pub use error::CredentialsError;
pub use imds::InstanceMetadataProvider;
pub use iot::IotRoleProvider;
pub use producer::{ProducerCredentials, ProducerCredentialsProvider, REFRESH_THRESHOLD};
pub use profile::ProfileFileProvider;
pub use provider::{Credentials, CredentialsProvider, ProviderKind};
