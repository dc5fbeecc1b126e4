//! Booking submission pipeline.
//!
//! Runs the three effects of a booking strictly in order: persist the
//! appointment, email the confirmation, build the WhatsApp handoff link.
//! The first failure stops the chain. Causes are logged here; callers
//! only ever show the lead one generic French message.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::appointments::model::{Appointment, NewAppointment};
use crate::booking::form::{BookingForm, BookingRequest, FormRules, ValidationErrors};
use crate::booking::link;
use crate::booking::state::SubmitState;
use crate::config::AgencyConfig;
use crate::error::BookingError;
use crate::mailer::{Mailer, templates};
use crate::session::Session;
use crate::store::AppointmentStore;

/// Everything the success surface needs to render.
#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    pub appointment: Appointment,
    pub whatsapp_url: String,
}

/// Executes the booking pipeline against the store and mailer seams.
pub struct BookingFlow {
    store: Arc<dyn AppointmentStore>,
    mailer: Arc<dyn Mailer>,
    agency: AgencyConfig,
}

impl BookingFlow {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        mailer: Arc<dyn Mailer>,
        agency: AgencyConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            agency,
        }
    }

    /// Run one validated booking through persist, notify, handoff.
    ///
    /// A failed confirmation email fails the whole submission even though
    /// the appointment row is already in place: the operator sees the row,
    /// the lead sees the generic failure message.
    pub async fn submit(
        &self,
        request: BookingRequest,
        session: Option<&Session>,
    ) -> Result<BookingConfirmation, BookingError> {
        let new = NewAppointment {
            contact_name: request.contact_name,
            email: request.email,
            phone: request.phone,
            date: request.date,
            time: request.time,
            purpose: request.purpose,
            user_id: session.map(|s| s.user_id.clone()),
        };

        let appointment = match self.store.insert(&new).await {
            Ok(appointment) => appointment,
            Err(e) => {
                error!(error = %e, "Failed to persist appointment");
                return Err(BookingError::Persistence(e));
            }
        };
        info!(id = %appointment.id, date = %appointment.date, "Appointment recorded");

        let email = templates::confirmation_email(&self.agency.name, &appointment);
        if let Err(e) = self.mailer.send(&email).await {
            error!(id = %appointment.id, error = %e, "Confirmation email failed after persistence");
            return Err(BookingError::Notification(e));
        }

        let whatsapp_url = link::handoff_link(
            &self.agency.whatsapp_number,
            &appointment.contact_name,
            &appointment.email,
            appointment.date,
            &appointment.time,
        );

        Ok(BookingConfirmation {
            appointment,
            whatsapp_url,
        })
    }

    /// Validate a raw form and submit it in one call.
    ///
    /// Each step of the pipeline surfaces as its own [`BookingError`]
    /// variant, so callers can tell a rejected form from a failed one.
    pub async fn submit_form(
        &self,
        rules: &FormRules,
        form: &BookingForm,
        session: Option<&Session>,
        now: DateTime<Utc>,
    ) -> Result<BookingConfirmation, BookingError> {
        let request = rules.validate(form, now).map_err(BookingError::Validation)?;
        self.submit(request, session).await
    }
}

/// Result of one submission attempt, as presented to the caller.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Validation rejected the form; nothing ran.
    Rejected(ValidationErrors),
    /// The whole pipeline completed; the form was reset.
    Completed(BookingConfirmation),
    /// Persistence or notification failed; entered values are retained.
    Failed { message: &'static str },
    /// A submission is already in flight for this form.
    AlreadySubmitting,
}

/// One user's booking form: entered values plus submission state.
#[derive(Debug)]
pub struct FormSession {
    values: BookingForm,
    state: SubmitState,
}

impl FormSession {
    pub fn new() -> Self {
        Self {
            values: BookingForm::default(),
            state: SubmitState::Idle,
        }
    }

    #[cfg(test)]
    fn with_state(values: BookingForm, state: SubmitState) -> Self {
        Self { values, state }
    }

    pub fn values(&self) -> &BookingForm {
        &self.values
    }

    /// Replace the entered values (the typing path).
    pub fn set_values(&mut self, values: BookingForm) {
        self.values = values;
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    /// Run one submission attempt through the pipeline.
    ///
    /// On success the values reset to empty; on failure they stay so the
    /// user can retry without re-entering anything.
    pub async fn submit(
        &mut self,
        rules: &FormRules,
        flow: &BookingFlow,
        session: Option<&Session>,
        now: DateTime<Utc>,
    ) -> SubmitOutcome {
        if !self.state.can_transition_to(SubmitState::Submitting) {
            return SubmitOutcome::AlreadySubmitting;
        }
        let request = match rules.validate(&self.values, now) {
            Ok(request) => request,
            Err(errors) => return SubmitOutcome::Rejected(errors),
        };

        self.state = SubmitState::Submitting;
        match flow.submit(request, session).await {
            Ok(confirmation) => {
                self.state = SubmitState::Succeeded;
                self.values = BookingForm::default();
                SubmitOutcome::Completed(confirmation)
            }
            Err(e) => {
                self.state = SubmitState::Failed;
                SubmitOutcome::Failed {
                    message: e.user_message(),
                }
            }
        }
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}
