use std::sync::Arc;
use std::time::Duration;

use immo_rdv::config::AppConfig;
use immo_rdv::http::{self, AppState};
use immo_rdv::reminder::spawn_reminder_task;
use immo_rdv::session::spawn_session_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The SMTP transport needs a process-wide crypto provider in place
    // before the first TLS handshake.
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("🏠 {} v{}", config.agency.name, env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Booking API: http://{}/api/appointments",
        config.http.bind_addr
    );
    eprintln!("   Operator API: http://{}/api/admin", config.http.bind_addr);
    eprintln!("   Database: {}", config.database_path);
    eprintln!("   WhatsApp handoff: {}", config.agency.whatsapp_number);
    if config.reminder.enabled() {
        eprintln!(
            "   Reminders: enabled (sweep every {}s)",
            config.reminder.interval_secs
        );
    } else {
        eprintln!("   Reminders: disabled");
    }
    eprintln!();

    let state = AppState::from_config(&config).await.unwrap_or_else(|e| {
        eprintln!("Error: Failed to start: {e}");
        std::process::exit(1);
    });

    // Log session openings and closings for the life of the process
    let _session_log = spawn_session_logger(state.sessions.subscribe());

    if config.reminder.enabled() {
        let _reminder_handle = spawn_reminder_task(
            Arc::clone(&state.store),
            Arc::clone(&state.mailer),
            config.agency.name.clone(),
            Duration::from_secs(config.reminder.interval_secs),
        );
    }

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(config.http.bind_addr).await?;
    tracing::info!(addr = %config.http.bind_addr, "Booking service started");
    axum::serve(listener, app).await?;

    Ok(())
}
