//! Operator and client sessions.
//!
//! A [`SessionHub`] holds the current session as a plain value and
//! broadcasts every change over a watch channel. Callers subscribe to a
//! [`SessionStream`] and receive each sign-in (`Some`) and sign-out
//! (`None`) as it happens.

use std::pin::Pin;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::info;
use uuid::Uuid;

/// Who the session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Agency staff. Full access to the appointment book.
    Operator,
    /// Authenticated end user. Bookings get linked to the account.
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Operator => "operator",
            Role::Client => "client",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub role: Role,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            role,
            started_at: Utc::now(),
        }
    }

    pub fn is_operator(&self) -> bool {
        self.role == Role::Operator
    }
}

/// Stream of session changes. `Some` on sign-in, `None` on sign-out.
pub type SessionStream = Pin<Box<dyn Stream<Item = Option<Session>> + Send>>;

/// Holds the current session and notifies subscribers of changes.
pub struct SessionHub {
    tx: watch::Sender<Option<Session>>,
}

impl SessionHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Open a session and broadcast it. Replaces any existing session.
    pub fn sign_in(&self, user_id: impl Into<String>, role: Role) -> Session {
        let session = Session::new(user_id, role);
        self.tx.send_replace(Some(session.clone()));
        session
    }

    /// Close the current session and broadcast the sign-out.
    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes. The stream yields every change made
    /// after this call and ends when the hub is dropped.
    pub fn subscribe(&self) -> SessionStream {
        Box::pin(WatchStream::from_changes(self.tx.subscribe()))
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Log session transitions until the stream ends.
pub fn spawn_session_logger(mut stream: SessionStream) -> tokio::task::JoinHandle<()> {
    use futures::StreamExt;

    tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            match event {
                Some(session) => {
                    info!(id = %session.id, user = %session.user_id, role = %session.role, "Session opened");
                }
                None => info!("Session closed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn sign_in_is_broadcast_to_subscribers() {
        let hub = SessionHub::new();
        let mut stream = hub.subscribe();

        hub.sign_in("op-1", Role::Operator);

        let event = stream.next().await.unwrap();
        let session = event.unwrap();
        assert_eq!(session.user_id, "op-1");
        assert!(session.is_operator());
    }

    #[tokio::test]
    async fn sign_out_is_broadcast_as_none() {
        let hub = SessionHub::new();
        hub.sign_in("op-1", Role::Operator);

        let mut stream = hub.subscribe();
        hub.sign_out();

        let event = stream.next().await.unwrap();
        assert!(event.is_none());
    }

    #[tokio::test]
    async fn stream_ends_when_the_hub_is_dropped() {
        let hub = SessionHub::new();
        let mut stream = hub.subscribe();

        drop(hub);

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn current_returns_the_latest_session() {
        let hub = SessionHub::new();
        assert!(hub.current().is_none());

        hub.sign_in("client-7", Role::Client);
        let session = hub.current().unwrap();
        assert_eq!(session.user_id, "client-7");
        assert!(!session.is_operator());

        hub.sign_out();
        assert!(hub.current().is_none());
    }

    #[tokio::test]
    async fn a_new_sign_in_replaces_the_previous_session() {
        let hub = SessionHub::new();
        let first = hub.sign_in("op-1", Role::Operator);
        let second = hub.sign_in("op-2", Role::Operator);

        assert_ne!(first.id, second.id);
        assert_eq!(hub.current().unwrap().user_id, "op-2");
    }
}
