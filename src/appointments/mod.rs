//! Appointment domain types.

pub mod model;

pub use model::{Appointment, AppointmentPurpose, AppointmentStatus, AppointmentUpdate, NewAppointment};
