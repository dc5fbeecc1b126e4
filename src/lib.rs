//! Appointment booking service for a French real-estate agency.
//!
//! The core flow validates a lead's form, persists the appointment,
//! emails a confirmation and hands off to WhatsApp, strictly in that
//! order. The first failure short-circuits the chain.

pub mod appointments;
pub mod booking;
pub mod config;
pub mod error;
pub mod http;
pub mod mailer;
pub mod reminder;
pub mod session;
pub mod store;
