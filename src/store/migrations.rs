//! Schema migrations for the appointment database.
//!
//! Migrations are numbered and applied in order. Applied versions are
//! recorded in a `_migrations` table so a restart only runs what is new.

use libsql::Connection;

use crate::error::DatabaseError;

/// One numbered schema change.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered schema history. Append only.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "appointments_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id TEXT PRIMARY KEY,
                contact_name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                appointment_date TEXT NOT NULL,
                appointment_time TEXT NOT NULL,
                purpose TEXT NOT NULL DEFAULT 'consultation',
                status TEXT NOT NULL DEFAULT 'pending',
                user_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);
            CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(appointment_date);
        "#,
    },
    Migration {
        version: 2,
        name: "reminder_tracking",
        sql: r#"
            ALTER TABLE appointments ADD COLUMN reminder_sent_at TEXT;
            CREATE INDEX IF NOT EXISTS idx_appointments_due
                ON appointments(appointment_date, status);
        "#,
    },
];

/// Bring the schema up to date, applying every version newer than the
/// highest one recorded in `_migrations`.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Migration table setup failed: {e}")))?;

    let applied = latest_applied_version(conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        tracing::info!(
            "Applying migration V{} ({})",
            migration.version,
            migration.name
        );
        conn.execute_batch(migration.sql).await.map_err(|e| {
            DatabaseError::Migration(format!(
                "V{} ({}) did not apply cleanly: {e}",
                migration.version, migration.name
            ))
        })?;
        conn.execute(
            "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![migration.version, migration.name],
        )
        .await
        .map_err(|e| {
            DatabaseError::Migration(format!("Could not record V{}: {e}", migration.version))
        })?;
    }

    let version = latest_applied_version(conn).await?;
    tracing::info!("Database schema at V{version}");
    Ok(())
}

/// Highest version recorded in `_migrations`, or 0 for a fresh database.
async fn latest_applied_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Version lookup failed: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(format!("Bad version row: {e}"))),
        Ok(None) => Ok(0),
        Err(e) => Err(DatabaseError::Migration(format!("Version lookup failed: {e}"))),
    }
}
