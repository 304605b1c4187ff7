//! agrod — agrogate daemon.
//!
//! Serves the prediction pipeline, history, auth, and advisor endpoints
//! over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agrogate::advisor::{AdvisorClient, CacheConfig};
use agrogate::auth::{AuthGate, AuthService, MemoryUserStore};
use agrogate::model::ModelRegistry;
use agrogate::pipeline::PredictionPipeline;
use agrogate::server::{self, AppState, Config, Secrets};
use agrogate::store::{MemoryStore, PredictionStore};

/// Agrogate daemon — authenticated agronomy prediction gateway.
#[derive(Parser)]
#[command(name = "agrod")]
#[command(version)]
#[command(about = "Agrogate prediction gateway daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    let jwt_secret = secrets.secret("jwt").ok_or_else(|| {
        agrogate::AgrogateError::Configuration(
            "No JWT secret configured. Set [jwt] in secrets.toml or AGROGATE_JWT_SECRET."
                .to_string(),
        )
    })?;

    // Artifact load is one-time and all-or-nothing: no partial service.
    let registry = Arc::new(ModelRegistry::load(&config.models.artifacts_dir)?);

    let store: Arc<dyn PredictionStore> = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(
        &jwt_secret,
        chrono::Duration::seconds(config.auth.token_ttl_secs),
    );
    let auth = Arc::new(AuthService::new(Arc::new(MemoryUserStore::new()), gate));
    let pipeline = Arc::new(PredictionPipeline::new(registry, store.clone()));
    let advisor = build_advisor(&config, &secrets);

    let state = AppState {
        pipeline,
        store,
        auth,
        advisor,
    };
    let app = server::app(state, &config.server.limits);

    let addr: SocketAddr = config.server.address.parse().map_err(|e| {
        agrogate::AgrogateError::Configuration(format!("Invalid address: {e}"))
    })?;
    info!(version = env!("CARGO_PKG_VERSION"), %addr, "agrod starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the advisor when its config section is present and a key is
/// available.
fn build_advisor(config: &Config, secrets: &Secrets) -> Option<Arc<AdvisorClient>> {
    let advisor_config = config.advisor.as_ref()?;
    let Some(key) = secrets.secret("google") else {
        warn!("advisor configured but no Google API key available; /ask disabled");
        return None;
    };

    let mut client = AdvisorClient::new(key).model(advisor_config.model.clone());
    if let Some(cache) = &advisor_config.cache {
        client = client.with_cache(
            &CacheConfig::new()
                .max_entries(cache.max_entries)
                .ttl(Duration::from_secs(cache.ttl_secs)),
        );
    }
    Some(Arc::new(client))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
