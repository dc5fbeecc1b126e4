//! Integration tests for the booking HTTP API.
//!
//! Each test spins up an Axum server on a random port backed by an
//! in-memory database and a stub mailer, then exercises the real REST
//! contract with reqwest.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Utc};
use secrecy::SecretString;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;

use immo_rdv::config::AgencyConfig;
use immo_rdv::error::MailError;
use immo_rdv::http::{self, AppState};
use immo_rdv::mailer::{Mailer, OutboundEmail};
use immo_rdv::session::SessionHub;
use immo_rdv::store::{AppointmentStore, LibSqlBackend};

/// Hard cap per test so a wedged server fails the run instead of hanging it.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const ADMIN_TOKEN: &str = "test-operator-token";

/// Stub mailer that records outbound emails (no SMTP).
#[derive(Default)]
struct StubMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: bool,
}

impl StubMailer {
    fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }
}

#[async_trait]
impl Mailer for StubMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Send("stub mailer rejects everything".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Start an Axum server on a random port, return (port, store).
async fn start_server(mailer: Arc<StubMailer>) -> (u16, Arc<dyn AppointmentStore>) {
    let store: Arc<dyn AppointmentStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let state = AppState::new(
        Arc::clone(&store),
        mailer,
        AgencyConfig::default(),
        SecretString::from(ADMIN_TOKEN.to_string()),
        Arc::new(SessionHub::new()),
    );
    let app = http::router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Let the listener start accepting before the first request goes out.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, store)
}

/// Helper: a form that passes validation, dated tomorrow.
fn valid_form() -> Value {
    let tomorrow = (Utc::now().date_naive() + Days::new(1)).to_string();
    serde_json::json!({
        "contact_name": "Jean Dupont",
        "email": "jean@example.com",
        "phone": "+221771234567",
        "date": tomorrow,
        "time": "14:00",
    })
}

/// Helper: open an operator session, return the bearer token.
async fn operator_token(client: &reqwest::Client, port: u16) -> String {
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/admin/session"))
        .json(&serde_json::json!({"token": ADMIN_TOKEN}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["session_id"].as_str().unwrap().to_string()
}

// ── Public booking endpoint ──────────────────────────────────────────

#[tokio::test]
async fn booking_success_persists_notifies_and_links() {
    timeout(TEST_TIMEOUT, async {
        let mailer = StubMailer::ok();
        let (port, store) = start_server(Arc::clone(&mailer)).await;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/appointments"))
            .json(&valid_form())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Rendez-vous confirmé !");
        let url = body["whatsapp_url"].as_str().unwrap();
        assert!(url.starts_with("https://wa.me/+33769316558?text="));
        assert!(url.contains("Jean%20Dupont"));
        assert!(url.contains("14%3A00"));

        // One confirmation email went out, addressed to the visitor.
        {
            let sent = mailer.sent.lock().unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].to, vec!["jean@example.com".to_string()]);
            assert!(sent[0].subject.contains("SHS Immobilier"));
        }

        // The row is in the book with status pending.
        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].contact_name, "Jean Dupont");
        assert_eq!(all[0].status.as_str(), "pending");
        assert_eq!(body["appointment"]["status"], "pending");
        assert_eq!(
            all[0].id.to_string(),
            body["appointment"]["id"].as_str().unwrap()
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn past_date_is_rejected_with_field_errors() {
    timeout(TEST_TIMEOUT, async {
        let mailer = StubMailer::ok();
        let (port, store) = start_server(Arc::clone(&mailer)).await;

        let yesterday = (Utc::now().date_naive() - Days::new(1)).to_string();
        let mut form = valid_form();
        form["date"] = Value::String(yesterday);

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/appointments"))
            .json(&form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body["errors"]["date"],
            "La date du rendez-vous est déjà passée"
        );

        // Nothing persisted, nothing sent.
        assert!(store.list().await.unwrap().is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn mail_failure_fails_the_booking_but_keeps_the_row() {
    timeout(TEST_TIMEOUT, async {
        let (port, store) = start_server(StubMailer::failing()).await;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/appointments"))
            .json(&valid_form())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body["message"],
            "Une erreur est survenue lors de la prise de rendez-vous. Veuillez réessayer."
        );

        // The appointment row stays even though the visitor saw a failure.
        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status.as_str(), "pending");
    })
    .await
    .expect("test timed out");
}

// ── Operator API ─────────────────────────────────────────────────────

#[tokio::test]
async fn operator_session_opens_with_the_right_token() {
    timeout(TEST_TIMEOUT, async {
        let (port, _store) = start_server(StubMailer::ok()).await;
        let client = reqwest::Client::new();

        // Wrong token is rejected.
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/admin/session"))
            .json(&serde_json::json!({"token": "wrong"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        // Right token opens a session.
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/admin/session"))
            .json(&serde_json::json!({"token": ADMIN_TOKEN}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        assert!(body["session_id"].as_str().is_some());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn appointment_book_requires_an_operator_session() {
    timeout(TEST_TIMEOUT, async {
        let (port, _store) = start_server(StubMailer::ok()).await;
        let client = reqwest::Client::new();

        // No session at all.
        let resp = client
            .get(format!("http://127.0.0.1:{port}/api/admin/appointments"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let token = operator_token(&client, port).await;

        let resp = client
            .get(format!("http://127.0.0.1:{port}/api/admin/appointments"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        // Closing the session invalidates the token.
        let resp = client
            .delete(format!("http://127.0.0.1:{port}/api/admin/session"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);

        let resp = client
            .get(format!("http://127.0.0.1:{port}/api/admin/appointments"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn operator_can_confirm_and_delete_appointments() {
    timeout(TEST_TIMEOUT, async {
        let mailer = StubMailer::ok();
        let (port, store) = start_server(Arc::clone(&mailer)).await;
        let client = reqwest::Client::new();

        // Book one appointment through the public endpoint.
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/appointments"))
            .json(&valid_form())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        let id = body["appointment"]["id"].as_str().unwrap().to_string();

        let token = operator_token(&client, port).await;

        // Confirm it.
        let resp = client
            .patch(format!(
                "http://127.0.0.1:{port}/api/admin/appointments/{id}/status"
            ))
            .bearer_auth(&token)
            .json(&serde_json::json!({"status": "confirmed"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Statut du rendez-vous mis à jour");
        assert_eq!(body["appointment"]["status"], "confirmed");

        let all = store.list().await.unwrap();
        assert_eq!(all[0].status.as_str(), "confirmed");

        // Unknown ids are reported as such.
        let resp = client
            .patch(format!(
                "http://127.0.0.1:{port}/api/admin/appointments/{}/status",
                uuid::Uuid::new_v4()
            ))
            .bearer_auth(&token)
            .json(&serde_json::json!({"status": "cancelled"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        // Delete it.
        let resp = client
            .delete(format!(
                "http://127.0.0.1:{port}/api/admin/appointments/{id}"
            ))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(store.list().await.unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn operator_can_edit_an_appointment() {
    timeout(TEST_TIMEOUT, async {
        let mailer = StubMailer::ok();
        let (port, store) = start_server(Arc::clone(&mailer)).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/appointments"))
            .json(&valid_form())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        let id = body["appointment"]["id"].as_str().unwrap().to_string();

        let token = operator_token(&client, port).await;

        let resp = client
            .put(format!(
                "http://127.0.0.1:{port}/api/admin/appointments/{id}"
            ))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "contact_name": "Jean Dupont",
                "email": "jean@example.com",
                "phone": "+221771234567",
                "date": "2027-01-05",
                "time": "09:30",
                "purpose": "signature",
                "status": "confirmed",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Rendez-vous mis à jour avec succès");

        let all = store.list().await.unwrap();
        assert_eq!(all[0].time, "09:30");
        assert_eq!(all[0].purpose.as_str(), "signature");
        assert_eq!(all[0].date.to_string(), "2027-01-05");
    })
    .await
    .expect("test timed out");
}

// ── Health probe ─────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    timeout(TEST_TIMEOUT, async {
        let (port, _store) = start_server(StubMailer::ok()).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "immo-rdv");
    })
    .await
    .expect("test timed out");
}
