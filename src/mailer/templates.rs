//! French email templates.
//!
//! Bodies are rendered here, fully, before anything reaches the mailer.
//! The transport sends what it is given and never composes content.

use crate::appointments::model::Appointment;
use crate::booking::link::format_date_fr;
use crate::mailer::OutboundEmail;

/// Confirmation email sent right after a booking is persisted.
pub fn confirmation_email(agency_name: &str, appointment: &Appointment) -> OutboundEmail {
    let date = format_date_fr(appointment.date);
    OutboundEmail {
        to: vec![appointment.email.clone()],
        subject: format!("Confirmation de rendez-vous - {agency_name}"),
        html: format!(
            "<h1>Confirmation de votre rendez-vous</h1>\
             <p>Cher(e) {name},</p>\
             <p>Votre rendez-vous avec {agency_name} a été confirmé pour le {date} à {time}.</p>\
             <p>Nous avons hâte de vous rencontrer !</p>\
             <p>Cordialement,<br>L'équipe {agency_name}</p>",
            name = appointment.contact_name,
            time = appointment.time,
        ),
    }
}

/// Reminder sent the day before a confirmed appointment.
pub fn reminder_email(agency_name: &str, appointment: &Appointment) -> OutboundEmail {
    let date = format_date_fr(appointment.date);
    OutboundEmail {
        to: vec![appointment.email.clone()],
        subject: format!("Rappel de votre rendez-vous - {agency_name}"),
        html: format!(
            "<h1>Rappel de votre rendez-vous</h1>\
             <p>Cher(e) {name},</p>\
             <p>Nous vous rappelons votre rendez-vous avec {agency_name} demain, le {date} à {time}.</p>\
             <p>À très bientôt !</p>\
             <p>Cordialement,<br>L'équipe {agency_name}</p>",
            name = appointment.contact_name,
            time = appointment.time,
        ),
    }
}
