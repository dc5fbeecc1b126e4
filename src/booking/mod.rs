//! Booking workflow: validation, submission pipeline, WhatsApp handoff.

pub mod flow;
pub mod form;
pub mod link;
pub mod state;

pub use flow::{BookingConfirmation, BookingFlow, FormSession, SubmitOutcome};
pub use form::{BookingForm, BookingRequest, FormRules, ValidationErrors};
pub use state::SubmitState;
