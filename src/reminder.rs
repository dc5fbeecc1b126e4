//! Background reminder sweeps.
//!
//! A timer task wakes on an interval, finds confirmed appointments
//! scheduled for tomorrow that have not been reminded yet, and sends
//! each one a reminder email. A successful send marks the row so later
//! sweeps skip it; a failed send leaves the row unmarked and the next
//! sweep retries it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::mailer::{Mailer, templates};
use crate::store::AppointmentStore;

/// Spawn the sweep task. Runs until the process exits.
pub fn spawn_reminder_task(
    store: Arc<dyn AppointmentStore>,
    mailer: Arc<dyn Mailer>,
    agency_name: String,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Reminder task started, sweeping every {}s",
            interval.as_secs()
        );

        let mut tick = tokio::time::interval(interval);

        loop {
            tick.tick().await;

            let sent = run_sweep(store.as_ref(), mailer.as_ref(), &agency_name).await;
            if sent > 0 {
                info!(sent, "Reminder sweep complete");
            }
        }
    })
}

/// Run one sweep for appointments happening tomorrow.
pub async fn run_sweep(
    store: &dyn AppointmentStore,
    mailer: &dyn Mailer,
    agency_name: &str,
) -> usize {
    let tomorrow = Utc::now().date_naive() + Days::new(1);
    sweep_for(store, mailer, agency_name, tomorrow).await
}

/// Send reminders for every due appointment on `date`. Returns how many
/// went out.
pub async fn sweep_for(
    store: &dyn AppointmentStore,
    mailer: &dyn Mailer,
    agency_name: &str,
    date: NaiveDate,
) -> usize {
    let due = match store.due_for_reminder(date).await {
        Ok(due) => due,
        Err(e) => {
            error!(error = %e, "Reminder sweep could not load due appointments");
            return 0;
        }
    };

    let mut sent = 0;
    for appointment in &due {
        let email = templates::reminder_email(agency_name, appointment);
        if let Err(e) = mailer.send(&email).await {
            warn!(id = %appointment.id, error = %e, "Reminder email failed, will retry next sweep");
            continue;
        }
        if let Err(e) = store.mark_reminder_sent(appointment.id).await {
            error!(id = %appointment.id, error = %e, "Reminder sent but could not be marked");
            continue;
        }
        sent += 1;
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::appointments::model::{AppointmentPurpose, AppointmentStatus, NewAppointment};
    use crate::error::MailError;
    use crate::mailer::OutboundEmail;
    use crate::store::LibSqlBackend;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Send("forced failure".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn new_appointment(date: NaiveDate) -> NewAppointment {
        NewAppointment {
            contact_name: "Awa Ndiaye".to_string(),
            email: "awa@example.com".to_string(),
            phone: "+221771234567".to_string(),
            date,
            time: "10:30".to_string(),
            purpose: AppointmentPurpose::Visite,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn sweep_sends_and_marks_confirmed_appointments() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let mailer = RecordingMailer::default();
        let date: NaiveDate = "2026-09-14".parse().unwrap();

        let appointment = store.insert(&new_appointment(date)).await.unwrap();
        store
            .update_status(appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();

        let sent = sweep_for(&store, &mailer, "SHS Immobilier", date).await;
        assert_eq!(sent, 1);

        {
            let emails = mailer.sent.lock().unwrap();
            assert_eq!(emails.len(), 1);
            assert_eq!(emails[0].to, vec!["awa@example.com".to_string()]);
            assert!(emails[0].subject.contains("Rappel"));
        }

        // Marked rows are skipped on the next sweep.
        assert_eq!(sweep_for(&store, &mailer, "SHS Immobilier", date).await, 0);
    }

    #[tokio::test]
    async fn pending_appointments_are_not_reminded() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let mailer = RecordingMailer::default();
        let date: NaiveDate = "2026-09-14".parse().unwrap();

        store.insert(&new_appointment(date)).await.unwrap();

        assert_eq!(sweep_for(&store, &mailer, "SHS Immobilier", date).await, 0);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_sends_are_retried_on_the_next_sweep() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let date: NaiveDate = "2026-09-14".parse().unwrap();

        let appointment = store.insert(&new_appointment(date)).await.unwrap();
        store
            .update_status(appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();

        let failing = RecordingMailer {
            fail: true,
            ..Default::default()
        };
        assert_eq!(sweep_for(&store, &failing, "SHS Immobilier", date).await, 0);

        let row = store.get(appointment.id).await.unwrap().unwrap();
        assert!(row.reminder_sent_at.is_none());

        let working = RecordingMailer::default();
        assert_eq!(sweep_for(&store, &working, "SHS Immobilier", date).await, 1);
    }
}
