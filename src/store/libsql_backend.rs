//! libSQL backend for appointment storage.
//!
//! A single connection is shared by every operation; `libsql::Connection`
//! is `Send + Sync` and safe for concurrent async use.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::appointments::model::{
    Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment,
};
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::AppointmentStore;

/// Appointment storage backed by libSQL.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open or create the database file at `path` and migrate it.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Unreachable(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Unreachable(format!("Failed to open database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Appointment database ready");
        Ok(backend)
    }

    /// In-memory database for tests.
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Unreachable(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::from_database(db).await
    }

    /// Connect to an opened database and bring its schema up to date.
    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Unreachable(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Row and value helpers ──────────────────────────────────────────

/// Classify a driver error into the failure signals callers distinguish:
/// unreachable storage, constraint violation, permission denial, or a
/// plain query failure.
fn map_db_err(op: &str, e: libsql::Error) -> DatabaseError {
    let message = format!("{op}: {e}");
    let lower = message.to_lowercase();
    if lower.contains("constraint") || lower.contains("unique") {
        DatabaseError::Constraint(message)
    } else if lower.contains("readonly")
        || lower.contains("read-only")
        || lower.contains("not authorized")
        || lower.contains("permission")
    {
        DatabaseError::Denied(message)
    } else if lower.contains("unable to open") || lower.contains("connection") {
        DatabaseError::Unreachable(message)
    } else {
        DatabaseError::Query(message)
    }
}

/// Parse a stored timestamp. RFC 3339 is the canonical write format, but
/// `datetime('now')` defaults come back as `%Y-%m-%d %H:%M:%S`.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|ndt| ndt.and_utc())
        })
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_deref().map(parse_datetime)
}

/// Parse a stored `YYYY-MM-DD` date.
fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

/// Convert `Option<&str>` to a libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to an Appointment.
fn row_to_appointment(row: &libsql::Row) -> Result<Appointment, libsql::Error> {
    let id_str: String = row.get(0)?;
    let date_str: String = row.get(4)?;
    let purpose_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let created_str: String = row.get(9)?;
    let updated_str: String = row.get(10)?;
    let reminder_str: Option<String> = row.get(11).ok();

    Ok(Appointment {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        contact_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        date: parse_date(&date_str),
        time: row.get(5)?,
        purpose: purpose_str.parse().unwrap_or_default(),
        status: status_str.parse().unwrap_or(AppointmentStatus::Pending),
        user_id: row.get(8).ok(),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
        reminder_sent_at: parse_optional_datetime(&reminder_str),
    })
}

// ── AppointmentStore implementation ────────────────────────────────

const APPOINTMENT_COLUMNS: &str = "id, contact_name, email, phone, appointment_date, \
    appointment_time, purpose, status, user_id, created_at, updated_at, reminder_sent_at";

#[async_trait]
impl AppointmentStore for LibSqlBackend {
    async fn ping(&self) -> Result<(), DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT 1", ())
            .await
            .map_err(|e| map_db_err("ping", e))?;
        rows.next().await.map_err(|e| map_db_err("ping", e))?;
        Ok(())
    }

    async fn insert(&self, new: &NewAppointment) -> Result<Appointment, DatabaseError> {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            contact_name: new.contact_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            date: new.date,
            time: new.time.clone(),
            purpose: new.purpose,
            status: AppointmentStatus::Pending,
            user_id: new.user_id.clone(),
            created_at: now,
            updated_at: now,
            reminder_sent_at: None,
        };

        let conn = self.conn();
        conn.execute(
            "INSERT INTO appointments (id, contact_name, email, phone, appointment_date,
                appointment_time, purpose, status, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                appointment.id.to_string(),
                appointment.contact_name.clone(),
                appointment.email.clone(),
                appointment.phone.clone(),
                appointment.date.to_string(),
                appointment.time.clone(),
                appointment.purpose.as_str(),
                appointment.status.as_str(),
                opt_text(appointment.user_id.as_deref()),
                now.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| map_db_err("insert_appointment", e))?;

        debug!(id = %appointment.id, "Appointment inserted into DB");
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| map_db_err("get_appointment", e))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let appointment = row_to_appointment(&row)
                    .map_err(|e| DatabaseError::Query(format!("Row decode failed: {e}")))?;
                Ok(Some(appointment))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(map_db_err("get_appointment", e)),
        }
    }

    async fn list(&self) -> Result<Vec<Appointment>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
                     ORDER BY appointment_date ASC, appointment_time ASC"
                ),
                (),
            )
            .await
            .map_err(|e| map_db_err("list_appointments", e))?;

        let mut appointments = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_appointment(&row) {
                Ok(appointment) => appointments.push(appointment),
                Err(e) => {
                    tracing::warn!("Skipping appointment row: {e}");
                }
            }
        }
        Ok(appointments)
    }

    async fn update(&self, id: Uuid, update: &AppointmentUpdate) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        let count = conn
            .execute(
                "UPDATE appointments SET contact_name = ?1, email = ?2, phone = ?3, \
                 appointment_date = ?4, appointment_time = ?5, purpose = ?6, status = ?7, \
                 updated_at = ?8 WHERE id = ?9",
                params![
                    update.contact_name.clone(),
                    update.email.clone(),
                    update.phone.clone(),
                    update.date.to_string(),
                    update.time.clone(),
                    update.purpose.as_str(),
                    update.status.as_str(),
                    now,
                    id.to_string(),
                ],
            )
            .await
            .map_err(|e| map_db_err("update_appointment", e))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "appointment".to_string(),
                id: id.to_string(),
            });
        }
        debug!(id = %id, "Appointment updated");
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        let count = conn
            .execute(
                "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, id.to_string()],
            )
            .await
            .map_err(|e| map_db_err("update_status", e))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "appointment".to_string(),
                id: id.to_string(),
            });
        }
        debug!(id = %id, status = %status, "Appointment status updated");
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let count = conn
            .execute(
                "DELETE FROM appointments WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| map_db_err("delete_appointment", e))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "appointment".to_string(),
                id: id.to_string(),
            });
        }
        debug!(id = %id, "Appointment deleted");
        Ok(())
    }

    async fn due_for_reminder(&self, date: NaiveDate) -> Result<Vec<Appointment>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
                     WHERE appointment_date = ?1 AND status = 'confirmed' \
                     AND reminder_sent_at IS NULL \
                     ORDER BY appointment_time ASC"
                ),
                params![date.to_string()],
            )
            .await
            .map_err(|e| map_db_err("due_for_reminder", e))?;

        let mut appointments = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_appointment(&row) {
                Ok(appointment) => appointments.push(appointment),
                Err(e) => {
                    tracing::warn!("Skipping appointment row: {e}");
                }
            }
        }
        Ok(appointments)
    }

    async fn mark_reminder_sent(&self, id: Uuid) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        let count = conn
            .execute(
                "UPDATE appointments SET reminder_sent_at = ?1, updated_at = ?1 WHERE id = ?2",
                params![now, id.to_string()],
            )
            .await
            .map_err(|e| map_db_err("mark_reminder_sent", e))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "appointment".to_string(),
                id: id.to_string(),
            });
        }
        debug!(id = %id, "Reminder marked as sent");
        Ok(())
    }
}
