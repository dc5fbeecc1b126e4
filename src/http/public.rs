//! Public booking endpoint.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::warn;

use crate::booking::BookingForm;
use crate::error::BookingError;
use crate::http::AppState;

/// Message shown to the visitor when the booking goes through.
pub const MSG_BOOKING_CONFIRMED: &str = "Rendez-vous confirmé !";

/// POST /api/appointments
///
/// Runs the submitted form through the booking pipeline. A rejected form
/// returns the per-field messages; a failed pipeline step returns the
/// single generic message with the cause kept in the logs.
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(form): Json<BookingForm>,
) -> impl IntoResponse {
    match state
        .flow
        .submit_form(&state.rules, &form, None, Utc::now())
        .await
    {
        Ok(confirmation) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": MSG_BOOKING_CONFIRMED,
                "appointment": confirmation.appointment,
                "whatsapp_url": confirmation.whatsapp_url,
            })),
        ),
        Err(BookingError::Validation(errors)) => {
            warn!(fields = errors.len(), "Booking form rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({"errors": errors})),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"message": e.user_message()})),
        ),
    }
}
