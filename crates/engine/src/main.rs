//! Adventure Terminal engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adventure_engine::api;
use adventure_engine::app::{App, PresenceServices};
use adventure_engine::infrastructure::{
    clock::SystemClock,
    config::{AppConfig, BrokerBackend},
    kafka::KafkaBroker,
    memory_broker::InMemoryBroker,
    memory_store::InMemoryWorldStore,
    ports::{BrokerPort, ClockPort},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adventure_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Adventure Terminal engine");

    let config = AppConfig::from_env()?;
    let presence_config = &config.presence;

    let client: Arc<dyn BrokerPort> = match presence_config.backend {
        BrokerBackend::Kafka => {
            tracing::info!(
                brokers = ?presence_config.brokers,
                client_id = %presence_config.client_id,
                topic = %presence_config.topic,
                "Using Kafka for presence events"
            );
            Arc::new(KafkaBroker::new(
                presence_config.brokers.clone(),
                presence_config.client_id.clone(),
            )?)
        }
        BrokerBackend::Memory => {
            tracing::warn!(
                "Using in-memory presence broker; events will not reach other engine instances"
            );
            Arc::new(InMemoryBroker::new())
        }
    };

    // Topic and consumer are set up lazily on first publish / first stream.
    let presence = PresenceServices::new(
        client,
        presence_config.topic_spec(),
        presence_config.group_id.clone(),
    );

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let store = Arc::new(InMemoryWorldStore::new(clock.clone()));
    let app = Arc::new(App::new(presence, store.clone(), store, clock));

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(config.cors_allowed_origins.as_deref()) {
        router = router.layer(cors);
    }

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins.map(str::trim).filter(|s| !s.is_empty())?;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
