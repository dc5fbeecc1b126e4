//! WhatsApp handoff link construction.
//!
//! Pure string building; nothing here performs network IO. The booking
//! flow hands the returned URL to the client, which opens it itself.

use chrono::NaiveDate;

pub const WHATSAPP_BASE_URL: &str = "https://wa.me/";

/// French long-form date, e.g. "14 mars 2026".
pub fn format_date_fr(date: NaiveDate) -> String {
    date.format_localized("%-d %B %Y", chrono::Locale::fr_FR)
        .to_string()
}

/// The pre-filled confirmation message the lead sends over WhatsApp.
pub fn handoff_message(contact_name: &str, email: &str, date: NaiveDate, time: &str) -> String {
    format!(
        "Bonjour, je confirme mon rendez-vous pour le {} à {time}. Mon nom est {contact_name}. Email: {email}",
        format_date_fr(date),
    )
}

/// Deep link opening a WhatsApp conversation with the agency, message
/// pre-filled. The message is URL-encoded exactly once.
pub fn handoff_link(
    destination: &str,
    contact_name: &str,
    email: &str,
    date: NaiveDate,
    time: &str,
) -> String {
    let message = handoff_message(contact_name, email, date, time);
    format!(
        "{WHATSAPP_BASE_URL}{destination}?text={}",
        urlencoding::encode(&message)
    )
}
