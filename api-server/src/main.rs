//! Pulse Sniffer API Server
//!
//! REST front end for capture analysis and CICIDS2017 flow classification.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PULSE SNIFFER API                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────┐   ┌───────────────────────────┐ │
//! │  │  Packet service       │   │  Flow service             │ │
//! │  │  /upload /analyze     │   │  /api/v1/flows/*          │ │
//! │  │  /analyze-quick /stats│   │                           │ │
//! │  └───────────┬───────────┘   └─────────────┬─────────────┘ │
//! │              ▼                             ▼               │
//! │      ┌──────────────┐              ┌──────────────┐        │
//! │      │PacketAnalyzer│              │FlowPredictor │        │
//! │      └──────┬───────┘              └──────────────┘        │
//! │             ▼                                              │
//! │      ┌──────────────┐                                      │
//! │      │ uploads/     │                                      │
//! │      └──────────────┘                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod storage;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_core::analysis::{FlowPredictor, PacketAnalyzer};
use pulse_core::features::FlowSchema;
use pulse_core::model::LoadedModel;

pub use error::{AppError, AppResult};
use storage::UploadStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (JSON lines in production)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pulse_server=debug,pulse_core=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Pulse Sniffer API starting ({})", config.environment);
    if !config.is_production() {
        tracing::debug!("Config: {:?}", config);
    }

    let state = AppState::load(config.clone())?;
    tracing::info!("Uploads: {}", state.uploads.dir().display());
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub packets: Option<Arc<PacketAnalyzer>>,
    pub flows: Option<Arc<FlowPredictor>>,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    /// Open the upload store and load both models. A model that fails to
    /// load is logged and left out; its endpoints answer 503.
    pub fn load(config: config::Config) -> anyhow::Result<Self> {
        let uploads = UploadStore::new(&config.upload_dir)?;

        let packets = match load_packet_analyzer(&config) {
            Ok(analyzer) => Some(Arc::new(analyzer)),
            Err(e) => {
                tracing::error!("Packet model unavailable ({}): {}", config.packet_model_path.display(), e);
                None
            }
        };

        let flows = match load_flow_predictor(&config) {
            Ok(predictor) => Some(Arc::new(predictor)),
            Err(e) => {
                tracing::warn!("Flow model unavailable ({}): {}", config.flow_model_path.display(), e);
                None
            }
        };

        Ok(Self {
            config: Arc::new(config),
            packets,
            flows,
            uploads: Arc::new(uploads),
        })
    }

    pub fn packets(&self) -> AppResult<Arc<PacketAnalyzer>> {
        self.packets
            .clone()
            .ok_or_else(|| AppError::ModelUnavailable("Packet model not loaded".to_string()))
    }

    pub fn flows(&self) -> AppResult<Arc<FlowPredictor>> {
        self.flows
            .clone()
            .ok_or_else(|| AppError::ModelUnavailable("Flow model not loaded".to_string()))
    }
}

fn load_packet_analyzer(config: &config::Config) -> pulse_core::CoreResult<PacketAnalyzer> {
    let model = LoadedModel::load(&config.packet_model_path)?;
    PacketAnalyzer::from_model(Arc::new(model))
}

fn load_flow_predictor(config: &config::Config) -> pulse_core::CoreResult<FlowPredictor> {
    let model = LoadedModel::load(&config.flow_model_path)?;
    let schema = FlowSchema::load(&config.flow_features_path)?;
    FlowPredictor::new(Arc::new(model), schema)
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Packet service (capture upload and analysis)
    let packet_routes = Router::new()
        .route("/", get(handlers::info::index))
        .route("/health", get(handlers::health::check))
        .route("/upload", post(handlers::upload::upload))
        .route("/analyze", post(handlers::analyze::analyze))
        .route("/analyze-quick", post(handlers::analyze::analyze_quick))
        .route("/stats", get(handlers::stats::stats));

    // Flow service (CICIDS2017 records)
    let flow_routes = Router::new()
        .route("/", get(handlers::flows::root))
        .route("/health", get(handlers::flows::health))
        .route("/metadata", get(handlers::flows::metadata))
        .route("/predict", post(handlers::flows::predict));

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(packet_routes)
        .nest("/api/v1/flows", flow_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
