use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use kvstreamer::{serve, shutdown_signal, AppState};
use kvstreamer_core::{
    bootstrap::{init_services, load_config},
    credentials::Env,
    exit_code,
    logging::init_logging,
    Config,
};

#[derive(Parser, Debug)]
#[command(name = "kvstreamer")]
#[command(about = "Video stream group controller", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Control surface listen address, overrides server.listen
    #[arg(long, env = "KVSTREAMER_LISTEN")]
    listen: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::from(exit_code(&e));
        }
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::from(exit_code(&e));
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to build runtime: {}", e);
            return ExitCode::from(exit_code(&anyhow::Error::from(e)));
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => {
            info!("kvstreamer stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let code = exit_code(&e);
            error!(exit_code = code, "kvstreamer failed: {:#}", e);
            ExitCode::from(code)
        }
    }
}

async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        worker_threads = config.worker_threads(),
        "kvstreamer starting..."
    );

    let services = init_services(&config, &Env::process())
        .await
        .context("stream group initialization failed")?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let listener = TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen))?;

    serve(listener, AppState::new(services.controller, shutdown)).await
}
