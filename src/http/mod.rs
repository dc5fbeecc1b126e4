//! HTTP surface: the public booking endpoint plus the operator API.

pub mod admin;
pub mod public;

use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use secrecy::SecretString;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::booking::{BookingFlow, FormRules};
use crate::config::{AgencyConfig, AppConfig};
use crate::mailer::{Mailer, SmtpMailer};
use crate::session::SessionHub;
use crate::store::{AppointmentStore, LibSqlBackend};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AppointmentStore>,
    pub mailer: Arc<dyn Mailer>,
    /// Booking pipeline driven by the public endpoint.
    pub flow: Arc<BookingFlow>,
    pub rules: Arc<FormRules>,
    pub sessions: Arc<SessionHub>,
    pub admin_token: SecretString,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        mailer: Arc<dyn Mailer>,
        agency: AgencyConfig,
        admin_token: SecretString,
        sessions: Arc<SessionHub>,
    ) -> Self {
        let flow = Arc::new(BookingFlow::new(
            Arc::clone(&store),
            Arc::clone(&mailer),
            agency,
        ));
        Self {
            store,
            mailer,
            flow,
            rules: Arc::new(FormRules::new()),
            sessions,
            admin_token,
        }
    }

    /// Wire up state from configuration: open the database file, build the
    /// SMTP mailer, start with no active session.
    pub async fn from_config(config: &AppConfig) -> crate::error::Result<Self> {
        let store = LibSqlBackend::new_local(Path::new(&config.database_path)).await?;
        let mailer = SmtpMailer::new(config.smtp.clone());
        Ok(Self::new(
            Arc::new(store),
            Arc::new(mailer),
            config.agency.clone(),
            config.admin_token.clone(),
            Arc::new(SessionHub::new()),
        ))
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/appointments", post(public::create_appointment))
        .with_state(state.clone())
        .merge(admin::admin_routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "service": "immo-rdv"
            })),
        ),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"status": "degraded"})),
            )
        }
    }
}
