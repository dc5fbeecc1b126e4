//! Booking form validation.
//!
//! `FormRules::validate` is a pure function of the submitted values and
//! the provided clock instant. Messages are the French strings the
//! public form shows next to each field.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::appointments::model::AppointmentPurpose;

pub const MSG_NAME_TOO_SHORT: &str = "Le nom doit contenir au moins 2 caractères";
pub const MSG_EMAIL_INVALID: &str = "Email invalide";
pub const MSG_PHONE_INVALID: &str = "Numéro de téléphone invalide";
pub const MSG_DATE_MISSING: &str = "Veuillez sélectionner une date";
pub const MSG_DATE_INVALID: &str = "Date invalide";
pub const MSG_DATE_PAST: &str = "La date du rendez-vous est déjà passée";
pub const MSG_TIME_MISSING: &str = "Veuillez sélectionner une heure";

const NAME_MIN_CHARS: usize = 2;

/// Raw form input as submitted by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// ISO calendar date, e.g. "2026-09-14".
    #[serde(default)]
    pub date: String,
    /// Time-of-day, e.g. "14:00".
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub purpose: Option<AppointmentPurpose>,
}

/// Form fields that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    ContactName,
    Email,
    Phone,
    Date,
    Time,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContactName => "contact_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Date => "date",
            Self::Time => "time",
        }
    }
}

/// Field-keyed validation errors, kept in form order.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    errors: Vec<(FormField, String)>,
}

impl ValidationErrors {
    fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn message_for(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

/// Serializes as a `field: message` map for JSON error bodies.
impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, message) in &self.errors {
            map.serialize_entry(field.as_str(), message)?;
        }
        map.end()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {message}", field.as_str())?;
            first = false;
        }
        Ok(())
    }
}

/// A validated booking request, produced only by `FormRules::validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: String,
    pub purpose: AppointmentPurpose,
}

/// Validation rules for the public booking form. Patterns compile once.
pub struct FormRules {
    email: Regex,
    phone: Regex,
    date_floor: NaiveDate,
}

impl FormRules {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap(),
            // Loose pattern: grouped digits with optional +, spaces, dashes, parens.
            phone: Regex::new(r"^([+]?[\s0-9]+)?(\d{3}|[(]?[0-9]+[)])?([-]?[\s]?[0-9])+$")
                .unwrap(),
            date_floor: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
        }
    }

    pub fn validate(
        &self,
        form: &BookingForm,
        now: DateTime<Utc>,
    ) -> Result<BookingRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if form.contact_name.chars().count() < NAME_MIN_CHARS {
            errors.push(FormField::ContactName, MSG_NAME_TOO_SHORT);
        }
        if !self.email_ok(&form.email) {
            errors.push(FormField::Email, MSG_EMAIL_INVALID);
        }
        if !self.phone.is_match(&form.phone) {
            errors.push(FormField::Phone, MSG_PHONE_INVALID);
        }

        let mut date = None;
        if form.date.is_empty() {
            errors.push(FormField::Date, MSG_DATE_MISSING);
        } else {
            match NaiveDate::parse_from_str(&form.date, "%Y-%m-%d") {
                Ok(parsed) if parsed < self.date_floor => {
                    errors.push(FormField::Date, MSG_DATE_INVALID);
                }
                // Midnight of the chosen day against the clock: today is
                // already in the past.
                Ok(parsed) if parsed.and_time(NaiveTime::MIN).and_utc() < now => {
                    errors.push(FormField::Date, MSG_DATE_PAST);
                }
                Ok(parsed) => date = Some(parsed),
                Err(_) => errors.push(FormField::Date, MSG_DATE_INVALID),
            }
        }

        if form.time.is_empty() {
            errors.push(FormField::Time, MSG_TIME_MISSING);
        }

        match date {
            Some(date) if errors.is_empty() => Ok(BookingRequest {
                contact_name: form.contact_name.clone(),
                email: form.email.clone(),
                phone: form.phone.clone(),
                date,
                time: form.time.clone(),
                purpose: form.purpose.unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }

    /// The pattern alone admits dotted edge cases; reject those explicitly.
    fn email_ok(&self, value: &str) -> bool {
        if !self.email.is_match(value) || value.contains("..") {
            return false;
        }
        let Some(at) = value.find('@') else {
            return false;
        };
        let local = &value[..at];
        let domain = &value[at + 1..];
        !local.starts_with('.')
            && !local.ends_with('.')
            && !domain.starts_with('.')
            && !domain.starts_with('-')
    }
}

impl Default for FormRules {
    fn default() -> Self {
        Self::new()
    }
}
