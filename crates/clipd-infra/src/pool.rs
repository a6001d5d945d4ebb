use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

/// Embed all diesel migrations at compile time
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for the sqlite connection pool
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Per-connection pragmas.
///
/// The daemon and CLI commands open the same database file from separate
/// processes, so every connection gets WAL mode for concurrent readers and a
/// busy timeout so a short-lived writer queues behind the daemon's
/// transaction instead of failing with `database is locked`.
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create the connection pool and run pending migrations.
///
/// Called once per process at startup; safe to call concurrently from the
/// daemon and CLI processes since migrations are idempotent.
pub fn init_db_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);

    let pool = Pool::builder()
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(manager)
        .with_context(|| format!("opening history database at {database_url}"))?;

    run_migrations(&pool)?;

    Ok(pool)
}

fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get()?;
    debug!("running pending database migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("migration failed: {e}"))?;
    Ok(())
}
