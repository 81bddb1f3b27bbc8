//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks, gateway state reporting, and Prometheus
//! metrics.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON gateway snapshot
//! - `GET /healthz` - Liveness probe (simple OK)
//! - `GET /readyz` - Readiness probe (ready once any account is known)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::{GatewayOrchestrator, GatewaySnapshot};
use crate::domain::discovery::DiscoveryState;
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Gateway version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Gateway state.
    pub gateway: GatewaySnapshot,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Discovery complete or accounts known.
    Healthy,
    /// Logged on, discovery still running.
    Degraded,
    /// No trading session logged on.
    Unhealthy,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    gateway: Arc<GatewayOrchestrator>,
}

impl HealthServerState {
    /// Create new health server state.
    #[must_use]
    pub fn new(version: String, gateway: Arc<GatewayOrchestrator>) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            gateway,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

/// Build the health router.
#[must_use]
pub fn router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    if state.gateway.accounts().is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    } else {
        (StatusCode::OK, "READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let gateway = state.gateway.snapshot();

    HealthResponse {
        status: determine_health_status(&gateway),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        gateway,
    }
}

fn determine_health_status(snapshot: &GatewaySnapshot) -> HealthStatus {
    match snapshot.discovery {
        state if !state.is_logged_on() => HealthStatus::Unhealthy,
        DiscoveryState::Ready => HealthStatus::Healthy,
        _ if !snapshot.accounts.is_empty() => HealthStatus::Healthy,
        _ => HealthStatus::Degraded,
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::application::ports::RecordingEngine;
    use crate::application::services::{GatewaySettings, OutboundDecorator};
    use crate::domain::fix::{FieldMap, FixMessage, MsgType, tags};
    use crate::domain::requests::{MarketOrderParams, OrderSide};
    use crate::domain::session::SessionId;
    use crate::domain::subscription::TokenPolicy;

    fn trading() -> SessionId {
        SessionId::new("FIX.4.4", "D1", "FXCM")
    }

    fn state() -> Arc<HealthServerState> {
        let settings = GatewaySettings {
            trading_session_id: "FXCM".to_string(),
            default_symbols: vec!["EUR/USD".to_string()],
            token_policy: TokenPolicy::Fresh,
            default_order: MarketOrderParams {
                symbol: "EUR/USD".to_string(),
                side: OrderSide::Buy,
                quantity: rust_decimal::Decimal::from(10_000),
            },
        };
        let gateway = GatewayOrchestrator::new(
            settings,
            OutboundDecorator::new("trader", "secret"),
            Arc::new(RecordingEngine::new()),
        );
        gateway.on_session_created(trading(), None);
        Arc::new(HealthServerState::new("0.1.0".to_string(), Arc::new(gateway)))
    }

    fn report_account(state: &HealthServerState, account: &str) {
        let report = FixMessage::new(MsgType::CollateralReport).with(tags::ACCOUNT, account);
        state.gateway.on_app_inbound(&report, &trading());
    }

    async fn get_status(state: Arc<HealthServerState>, uri: &str) -> StatusCode {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn status_follows_discovery() {
        let state = state();
        assert_eq!(
            determine_health_status(&state.gateway.snapshot()),
            HealthStatus::Unhealthy
        );

        state.gateway.on_logon(&trading()).unwrap();
        assert_eq!(
            determine_health_status(&state.gateway.snapshot()),
            HealthStatus::Degraded
        );

        report_account(&state, "U1000");
        assert_eq!(
            determine_health_status(&state.gateway.snapshot()),
            HealthStatus::Healthy
        );

        // Known accounts outlive the session.
        state.gateway.on_logout(&trading());
        assert_eq!(
            determine_health_status(&state.gateway.snapshot()),
            HealthStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn health_unavailable_after_logout() {
        let state = state();
        state.gateway.on_logon(&trading()).unwrap();
        report_account(&state, "U1000");
        assert_eq!(
            get_status(Arc::clone(&state), "/health").await,
            StatusCode::OK
        );

        state.gateway.on_logout(&trading());
        assert_eq!(
            get_status(state, "/health").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn liveness_is_always_ok() {
        assert_eq!(get_status(state(), "/healthz").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_waits_for_accounts() {
        let state = state();
        assert_eq!(
            get_status(Arc::clone(&state), "/readyz").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        report_account(&state, "U1000");
        assert_eq!(get_status(state, "/readyz").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_returns_snapshot_json() {
        let state = state();
        state.gateway.on_logon(&trading()).unwrap();
        let status = FixMessage::new(MsgType::TradingSessionStatus)
            .with(tags::TRAD_SES_STATUS, "2")
            .with_group(tags::NO_RELATED_SYM, FieldMap::new().with(tags::SYMBOL, "EUR/USD"));
        state.gateway.on_app_inbound(&status, &trading());
        report_account(&state, "U1000");

        let response = router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], "0.1.0");
        assert_eq!(json["gateway"]["discovery"], "awaiting_accounts");
        assert_eq!(json["gateway"]["accounts"][0], "U1000");
        assert_eq!(json["gateway"]["sessions"][0]["role"], "trading");
    }

    #[tokio::test]
    async fn health_unavailable_before_logon() {
        assert_eq!(
            get_status(state(), "/health").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
