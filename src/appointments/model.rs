//! Appointment entity and its lifecycle/purpose enums.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Created by the booking flow, awaiting operator review.
    Pending,
    /// Confirmed by an operator.
    Confirmed,
    /// Cancelled by an operator.
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown appointment status: '{other}'")),
        }
    }
}

/// What the lead wants the appointment for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentPurpose {
    #[default]
    Consultation,
    /// Property visit.
    Visite,
    /// Contract signature.
    Signature,
}

impl AppointmentPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consultation => "consultation",
            Self::Visite => "visite",
            Self::Signature => "signature",
        }
    }
}

impl std::fmt::Display for AppointmentPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AppointmentPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consultation" => Ok(Self::Consultation),
            "visite" => Ok(Self::Visite),
            "signature" => Ok(Self::Signature),
            other => Err(format!("unknown appointment purpose: '{other}'")),
        }
    }
}

/// A booked appointment as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    /// Calendar date exactly as submitted; no timezone normalization.
    pub date: NaiveDate,
    /// Time-of-day exactly as submitted, e.g. "14:00".
    pub time: String,
    pub purpose: AppointmentPurpose,
    pub status: AppointmentStatus,
    /// Account id when the booking came from an authenticated session.
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once the day-before reminder email has gone out.
    pub reminder_sent_at: Option<DateTime<Utc>>,
}

/// Fields for creating an appointment. Id, status and timestamps are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: String,
    pub purpose: AppointmentPurpose,
    pub user_id: Option<String>,
}

/// Full replacement of an appointment's editable fields (operator edit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: String,
    pub purpose: AppointmentPurpose,
    pub status: AppointmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&AppointmentStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let back: AppointmentStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(back, AppointmentStatus::Confirmed);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("archived".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn purpose_defaults_to_consultation() {
        assert_eq!(AppointmentPurpose::default(), AppointmentPurpose::Consultation);
    }

    #[test]
    fn purpose_round_trips_through_str() {
        for purpose in [
            AppointmentPurpose::Consultation,
            AppointmentPurpose::Visite,
            AppointmentPurpose::Signature,
        ] {
            assert_eq!(purpose.as_str().parse::<AppointmentPurpose>().unwrap(), purpose);
        }
    }
}
