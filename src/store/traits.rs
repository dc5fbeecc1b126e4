//! Storage trait for appointments.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::appointments::model::{
    Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment,
};
use crate::error::DatabaseError;

/// Backend-agnostic persistence for appointments.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Insert a new appointment as `pending`. Returns the stored row with
    /// its server-assigned id and timestamps.
    async fn insert(&self, new: &NewAppointment) -> Result<Appointment, DatabaseError>;

    /// Get an appointment by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError>;

    /// All appointments, soonest first.
    async fn list(&self) -> Result<Vec<Appointment>, DatabaseError>;

    /// Replace the editable fields of an appointment.
    async fn update(&self, id: Uuid, update: &AppointmentUpdate) -> Result<(), DatabaseError>;

    /// Set the lifecycle status (operator action).
    async fn update_status(&self, id: Uuid, status: AppointmentStatus)
        -> Result<(), DatabaseError>;

    /// Delete an appointment.
    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError>;

    /// Confirmed appointments on `date` whose reminder has not gone out.
    async fn due_for_reminder(&self, date: NaiveDate) -> Result<Vec<Appointment>, DatabaseError>;

    /// Record that the reminder email for this appointment went out.
    async fn mark_reminder_sent(&self, id: Uuid) -> Result<(), DatabaseError>;
}
