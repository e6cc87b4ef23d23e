//! Credential chain and stream group wiring

use std::sync::Arc;
use tracing::info;

use crate::credentials::{build_provider_chain, Env, ProducerCredentialsProvider, ProviderKind};
use crate::stream::{
    ControllerSettings, LocalProducer, ProducerClient, StreamGroupController, SubscriptionInstaller,
};
use crate::Config;

/// Container for the initialized node services
#[derive(Clone)]
pub struct Services {
    /// Providers in evaluation order
    pub credential_providers: Vec<ProviderKind>,
    pub producer: Arc<LocalProducer>,
    pub controller: Arc<StreamGroupController>,
}

/// Resolve the credential chain, then bring up the producer and controller
///
/// The chain is built once from `config` and `env`; the producer fetches
/// through it on demand.
pub async fn init_services(config: &Config, env: &Env) -> anyhow::Result<Services> {
    info!("Initializing services...");

    let chain = build_provider_chain(&config.credentials, env);
    let credential_providers = chain.kinds();
    info!(
        providers = ?credential_providers.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "Credential provider chain built"
    );

    let credentials = ProducerCredentialsProvider::new(Some(Arc::new(chain)));
    let producer = Arc::new(LocalProducer::new(credentials));
    let client: Arc<dyn ProducerClient> = producer.clone();
    let installer = Arc::new(SubscriptionInstaller::new(client.clone()));

    let controller = StreamGroupController::initialize(
        ControllerSettings::from_config(config),
        client,
        installer,
    )
    .await?;
    info!("Stream group controller initialized");

    Ok(Services {
        credential_providers,
        producer,
        controller: Arc::new(controller),
    })
}
