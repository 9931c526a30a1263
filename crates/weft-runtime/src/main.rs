//! Process entry point.
//!
//! Configuration file locations come from `WEFT_NETWORK_CONFIG` and
//! `WEFT_APP_CONFIG` (defaulting to `config/network.json` and
//! `config/app.json`). Log verbosity follows `RUST_LOG`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use weft_runtime::bootstrap;
use weft_sdk::sim::SimNetwork;
use weft_topology::{AppConfig, NetworkConfig};

fn config_path(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let network_path = config_path("WEFT_NETWORK_CONFIG", "config/network.json");
    let app_path = config_path("WEFT_APP_CONFIG", "config/app.json");
    let network = NetworkConfig::from_file(&network_path)
        .with_context(|| format!("loading {}", network_path.display()))?;
    let app = AppConfig::from_file(&app_path)
        .with_context(|| format!("loading {}", app_path.display()))?;
    let base_dir = network_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    // The simulated network stands in for the ledger platform. Bootstrap
    // users carry pre-shared secrets, so seed its CA tables from the
    // network configuration.
    let sdk = SimNetwork::new();
    for (org_name, org) in &network.organizations {
        for (user, cfg) in &org.users {
            sdk.register_secret(org_name, user, &cfg.secret);
        }
    }

    let runtime = bootstrap(&network, app, &base_dir, &sdk)
        .await
        .context("bootstrapping network")?;

    let addr = runtime.rest_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "facade listening");

    weft_rest::serve(listener, runtime.router(), async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down");
    })
    .await?;

    Ok(())
}
