mod health;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tracing::{debug, error, info};

use crate::{
    env::ENV_CONFIG,
    health::HealthCheckable,
    log,
    network_profile::{NetworkProfile, ProfileError},
    supply::{publish, Sources, SupplyAggregator, SupplyError, SupplySnapshot},
};

pub use self::health::ServeHealth;

// One slot, a new epoch can't finalize faster than that.
const SUPPLY_CACHE_CONTROL: &str = "public, max-age=12, stale-while-revalidate=60";

const SUPPLY_UNAVAILABLE: &str = "supply temporarily unavailable, try again later";

const HEALTH_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

pub type StateExtension = Extension<Arc<State>>;

pub struct State {
    pub aggregator: SupplyAggregator,
    pub health: ServeHealth,
    /// The configured network, served on `/supply`.
    pub profile: Arc<NetworkProfile>,
    /// `/api/v1/lukso/supply` always serves LUKSO circulating and total supply, flat.
    pub lukso_circulating_profile: Arc<NetworkProfile>,
    /// `/api/v2/totalsupply` always serves LUKSO total supply, wrapped.
    pub lukso_total_profile: Arc<NetworkProfile>,
}

impl State {
    pub fn new(aggregator: SupplyAggregator, profile: NetworkProfile) -> Result<Self, ProfileError> {
        Ok(Self {
            aggregator,
            health: ServeHealth::new(),
            profile: Arc::new(profile),
            lukso_circulating_profile: Arc::new(NetworkProfile::built_in("lukso-circulating")?),
            lukso_total_profile: Arc::new(NetworkProfile::built_in("lukso")?),
        })
    }

    /// Computes supply for the configured network and records the outcome as the service's health.
    async fn compute_configured(&self) -> Result<SupplySnapshot, SupplyError> {
        let result = self.aggregator.compute(&self.profile).await;
        match &result {
            Ok(_) => self.health.record_success(),
            Err(err) => self.health.record_failure(Utc::now(), format!("{err:#}")),
        }
        result
    }
}

fn supply_response(
    profile: &NetworkProfile,
    result: Result<SupplySnapshot, SupplyError>,
) -> Response {
    match result {
        Ok(snapshot) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(SUPPLY_CACHE_CONTROL),
            );

            let body = publish::render(&snapshot, profile.response_envelope);
            (headers, Json(body)).into_response()
        }
        Err(err) => {
            error!(network = %profile.name, "failed to compute supply: {err:#}");
            (StatusCode::SERVICE_UNAVAILABLE, SUPPLY_UNAVAILABLE).into_response()
        }
    }
}

async fn get_supply(Extension(state): StateExtension) -> Response {
    let result = state.compute_configured().await;
    supply_response(&state.profile, result)
}

async fn get_lukso_circulating_supply(Extension(state): StateExtension) -> Response {
    let profile = &state.lukso_circulating_profile;
    supply_response(profile, state.aggregator.compute(profile).await)
}

async fn get_lukso_total_supply(Extension(state): StateExtension) -> Response {
    let profile = &state.lukso_total_profile;
    supply_response(profile, state.aggregator.compute(profile).await)
}

async fn get_health(Extension(state): StateExtension) -> Response {
    state.health.health_status().into_response()
}

pub fn router(state: Arc<State>) -> Router {
    Router::new()
        .route("/supply", get(get_supply))
        .route("/api/v1/lukso/supply", get(get_lukso_circulating_supply))
        .route("/api/v2/totalsupply", get(get_lukso_total_supply))
        .route("/healthz", get(get_health))
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(Extension(state)),
        )
}

/// Keeps health current when nobody is asking for the supply.
async fn refresh_health(state: Arc<State>) {
    let mut interval = tokio::time::interval(HEALTH_REFRESH_INTERVAL);
    loop {
        interval.tick().await;
        if state.compute_configured().await.is_ok() {
            debug!(network = %state.profile.name, "health refresh computed supply");
        }
    }
}

pub async fn start_server() -> Result<()> {
    log::init_with_env();

    let profile = NetworkProfile::from_env(&ENV_CONFIG)?;
    let sources = Sources::from_env(&ENV_CONFIG, "supply-serve").await?;
    let aggregator = SupplyAggregator::new(sources, ENV_CONFIG.source_timeout);

    let state = Arc::new(State::new(aggregator, profile)?);

    tokio::spawn(refresh_health(state.clone()));

    let app = router(state);

    let interface = if ENV_CONFIG.bind_public_interface {
        "0.0.0.0"
    } else {
        "127.0.0.1"
    };
    let socket_addr: SocketAddr = format!("{interface}:{}", ENV_CONFIG.port)
        .parse()
        .context("invalid bind address, check PORT")?;

    info!(%socket_addr, "server listening");

    axum::Server::bind(&socket_addr)
        .serve(app.into_make_service())
        .await
        .context("server failed")
}
