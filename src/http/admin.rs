//! Operator endpoints for managing the appointment book.
//!
//! Signing in with the admin token opens an operator session on the
//! [`SessionHub`](crate::session::SessionHub); the session id doubles as
//! the bearer token for the protected routes.

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::appointments::model::{AppointmentStatus, AppointmentUpdate};
use crate::error::{DatabaseError, SessionError};
use crate::http::AppState;
use crate::session::{Role, Session};

pub const MSG_STATUS_UPDATED: &str = "Statut du rendez-vous mis à jour";
pub const MSG_APPOINTMENT_UPDATED: &str = "Rendez-vous mis à jour avec succès";
pub const MSG_APPOINTMENT_DELETED: &str = "Rendez-vous supprimé avec succès";

/// Build the operator router. Everything except the session endpoints
/// sits behind the operator-session check.
pub fn admin_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/admin/appointments", get(list_appointments))
        .route(
            "/api/admin/appointments/{id}",
            put(update_appointment).delete(delete_appointment),
        )
        .route("/api/admin/appointments/{id}/status", patch(update_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_operator,
        ));

    Router::new()
        .route(
            "/api/admin/session",
            post(open_session).delete(close_session),
        )
        .merge(protected)
        .with_state(state)
}

// ── Session ─────────────────────────────────────────────────────────────

fn check_token(state: &AppState, token: &str) -> Result<(), SessionError> {
    if token == state.admin_token.expose_secret() {
        Ok(())
    } else {
        Err(SessionError::InvalidToken)
    }
}

/// Resolve the operator session referenced by the Authorization header.
fn bearer_session(state: &AppState, headers: &HeaderMap) -> Result<Session, SessionError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(SessionError::NotAuthenticated)?;

    let session = state
        .sessions
        .current()
        .ok_or(SessionError::NotAuthenticated)?;

    if session.is_operator() && session.id.to_string() == token {
        Ok(session)
    } else {
        Err(SessionError::NotAuthenticated)
    }
}

async fn require_operator(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match bearer_session(&state, request.headers()) {
        Ok(_session) => next.run(request).await,
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "Admin request rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "Session opérateur requise"})),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    token: String,
}

async fn open_session(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(e) = check_token(&state, &body.token) {
        warn!(error = %e, "Operator sign-in rejected");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Identifiants invalides"})),
        );
    }

    let session = state.sessions.sign_in("operator", Role::Operator);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({"session_id": session.id})),
    )
}

async fn close_session(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    match bearer_session(&state, &headers) {
        Ok(session) => {
            state.sessions.sign_out();
            info!(id = %session.id, "Operator signed out");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            warn!(error = %e, "Sign-out rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "Session opérateur requise"})),
            )
                .into_response()
        }
    }
}

// ── Appointment book ────────────────────────────────────────────────────

async fn list_appointments(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(appointments) => (StatusCode::OK, Json(serde_json::json!(appointments))),
        Err(e) => {
            error!(error = %e, "Failed to list appointments");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Erreur lors du chargement des rendez-vous"})),
            )
        }
    }
}

#[derive(Deserialize)]
struct StatusRequest {
    status: AppointmentStatus,
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> impl IntoResponse {
    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Identifiant invalide"})),
            );
        }
    };

    match state.store.update_status(id, body.status).await {
        Ok(()) => {
            info!(id = %id, status = %body.status, "Appointment status updated by operator");
            // Refreshed row for the quick-action UI
            match state.store.get(id).await {
                Ok(Some(appointment)) => (
                    StatusCode::OK,
                    Json(serde_json::json!({
                        "message": MSG_STATUS_UPDATED,
                        "appointment": appointment,
                    })),
                ),
                _ => (
                    StatusCode::OK,
                    Json(serde_json::json!({"message": MSG_STATUS_UPDATED})),
                ),
            }
        }
        Err(DatabaseError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Rendez-vous introuvable"})),
        ),
        Err(e) => {
            error!(error = %e, id = %id, "Failed to update appointment status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Erreur lors de la mise à jour du statut"})),
            )
        }
    }
}

async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AppointmentUpdate>,
) -> impl IntoResponse {
    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Identifiant invalide"})),
            );
        }
    };

    match state.store.update(id, &body).await {
        Ok(()) => {
            info!(id = %id, "Appointment updated by operator");
            (
                StatusCode::OK,
                Json(serde_json::json!({"message": MSG_APPOINTMENT_UPDATED})),
            )
        }
        Err(DatabaseError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Rendez-vous introuvable"})),
        ),
        Err(e) => {
            error!(error = %e, id = %id, "Failed to update appointment");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Erreur lors de la mise à jour du rendez-vous"})),
            )
        }
    }
}

async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Identifiant invalide"})),
            );
        }
    };

    match state.store.delete(id).await {
        Ok(()) => {
            info!(id = %id, "Appointment deleted by operator");
            (
                StatusCode::OK,
                Json(serde_json::json!({"message": MSG_APPOINTMENT_DELETED})),
            )
        }
        Err(DatabaseError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Rendez-vous introuvable"})),
        ),
        Err(e) => {
            error!(error = %e, id = %id, "Failed to delete appointment");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Erreur lors de la suppression du rendez-vous"})),
            )
        }
    }
}
