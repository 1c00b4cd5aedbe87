//! Database schema migrations
//!
//! Versioned, ordered schema migrations. Each entry in [`MIGRATIONS`] is
//! applied at most once, inside its own transaction, and recorded in the
//! `schema_version` table in that same transaction.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - deployed databases have already recorded them
//! 2. **Always append new migrations** - with the next version number
//! 3. **Prefer ALTER TABLE** - over DROP/CREATE, to preserve field data
//!
//! # Legacy databases
//!
//! Databases written by the earlier form application already contain a
//! `back_checks` table (without `schema_version`). The add-column steps let
//! such a file be adopted in place: an `ALTER TABLE ... ADD COLUMN` that fails
//! with "duplicate column name" counts as already applied. Any other failure
//! aborts the migration and startup with it.

use crate::{Error, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

/// One schema change step
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Arbitrary DDL/DML statement
    Sql(&'static str),
    /// `ALTER TABLE <table> ADD COLUMN <column> <definition>`, tolerated if present
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
    /// Statement run only when `table` has `column` (legacy-only data)
    SqlIfColumn {
        table: &'static str,
        column: &'static str,
        sql: &'static str,
    },
}

/// Numbered migration
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub steps: &'static [Step],
}

/// All migrations, in application order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_back_checks",
        steps: &[Step::Sql(
            r#"
            CREATE TABLE IF NOT EXISTS back_checks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                woreda TEXT,
                kebele TEXT,
                checker_fa_name TEXT,
                checker_phone TEXT,
                fenced TEXT,
                guava_beds INTEGER,
                guava_length REAL,
                guava_sockets INTEGER,
                gesho_beds INTEGER,
                gesho_length REAL,
                gesho_sockets INTEGER,
                lemon_beds INTEGER,
                lemon_length REAL,
                lemon_sockets INTEGER,
                grevillea_beds INTEGER,
                grevillea_length REAL,
                grevillea_sockets INTEGER
            )
            "#,
        )],
    },
    Migration {
        version: 2,
        name: "back_check_personnel_and_totals",
        steps: &[
            Step::AddColumn { table: "back_checks", column: "cluster", definition: "TEXT" },
            Step::AddColumn { table: "back_checks", column: "tno_name", definition: "TEXT" },
            Step::AddColumn { table: "back_checks", column: "cbe_acc", definition: "TEXT" },
            Step::AddColumn { table: "back_checks", column: "total_guava_sockets", definition: "INTEGER" },
            Step::AddColumn { table: "back_checks", column: "total_gesho_sockets", definition: "INTEGER" },
            Step::AddColumn { table: "back_checks", column: "total_lemon_sockets", definition: "INTEGER" },
            Step::AddColumn { table: "back_checks", column: "total_grevillea_sockets", definition: "INTEGER" },
            Step::AddColumn { table: "back_checks", column: "created_at", definition: "TEXT" },
            // Legacy rows carry their inspection time in `timestamp`
            Step::SqlIfColumn {
                table: "back_checks",
                column: "timestamp",
                sql: r#"
                UPDATE back_checks
                SET created_at = strftime('%Y-%m-%dT%H:%M:%SZ', timestamp)
                WHERE created_at IS NULL AND timestamp IS NOT NULL
                "#,
            },
            // Remaining rows predate stored totals and creation times
            Step::Sql(
                r#"
                UPDATE back_checks SET
                    total_guava_sockets = COALESCE(total_guava_sockets, COALESCE(guava_beds, 0) * COALESCE(guava_sockets, 0)),
                    total_gesho_sockets = COALESCE(total_gesho_sockets, COALESCE(gesho_beds, 0) * COALESCE(gesho_sockets, 0)),
                    total_lemon_sockets = COALESCE(total_lemon_sockets, COALESCE(lemon_beds, 0) * COALESCE(lemon_sockets, 0)),
                    total_grevillea_sockets = COALESCE(total_grevillea_sockets, COALESCE(grevillea_beds, 0) * COALESCE(grevillea_sockets, 0)),
                    created_at = COALESCE(created_at, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                "#,
            ),
        ],
    },
    Migration {
        version: 3,
        name: "back_check_remarks_and_photo",
        steps: &[
            Step::AddColumn { table: "back_checks", column: "remark", definition: "TEXT" },
            Step::AddColumn { table: "back_checks", column: "auto_remark", definition: "TEXT" },
            Step::AddColumn { table: "back_checks", column: "photo", definition: "TEXT" },
        ],
    },
    Migration {
        version: 4,
        name: "create_farmers",
        steps: &[Step::Sql(
            r#"
            CREATE TABLE IF NOT EXISTS farmers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                phone TEXT,
                woreda TEXT,
                kebele TEXT,
                officer_name TEXT,
                gesho_count INTEGER DEFAULT 0,
                giravila_count INTEGER DEFAULT 0,
                diceres_count INTEGER DEFAULT 0,
                wanza_count INTEGER DEFAULT 0,
                papaya_count INTEGER DEFAULT 0,
                moringa_count INTEGER DEFAULT 0,
                lemon_count INTEGER DEFAULT 0,
                arzelibanos_count INTEGER DEFAULT 0,
                guava_count INTEGER DEFAULT 0,
                audio_url TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )],
    },
    Migration {
        version: 5,
        name: "create_locations",
        steps: &[
            Step::Sql(
                r#"
                CREATE TABLE IF NOT EXISTS woredas (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                )
                "#,
            ),
            Step::Sql(
                r#"
                CREATE TABLE IF NOT EXISTS kebeles (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    woreda_id INTEGER NOT NULL REFERENCES woredas(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE (woreda_id, name)
                )
                "#,
            ),
            Step::Sql("CREATE INDEX IF NOT EXISTS idx_kebeles_woreda ON kebeles(woreda_id)"),
        ],
    },
    Migration {
        version: 6,
        name: "create_users_and_sessions",
        steps: &[
            Step::Sql(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )
                "#,
            ),
            Step::Sql(
                r#"
                CREATE TABLE IF NOT EXISTS sessions (
                    token_hash TEXT PRIMARY KEY,
                    username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    expires_at TEXT NOT NULL
                )
                "#,
            ),
        ],
    },
];

/// Latest schema version known to this build
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Get current schema version from database
///
/// Returns 0 if no migration has been recorded
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
///
/// Returns the versions applied by this call (empty when up to date).
pub async fn run_migrations(pool: &SqlitePool) -> Result<Vec<i64>> {
    create_schema_version_table(pool).await?;

    let current_version = get_schema_version(pool).await?;
    let latest = latest_version();

    if current_version == latest {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(Vec::new());
    }

    if current_version > latest {
        return Err(Error::Config(format!(
            "Database schema version ({}) is newer than this build supports ({})",
            current_version, latest
        )));
    }

    info!("Running database migrations: v{} -> v{}", current_version, latest);

    let mut applied = Vec::new();
    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        apply_migration(pool, migration).await?;
        info!("✓ Migration v{} ({}) completed", migration.version, migration.name);
        applied.push(migration.version);
    }

    info!("All migrations completed successfully");
    Ok(applied)
}

async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let fail = |e: sqlx::Error| Error::Migration {
        version: migration.version,
        message: e.to_string(),
    };

    let mut tx = pool.begin().await.map_err(fail)?;

    for step in migration.steps {
        apply_step(&mut tx, step).await.map_err(fail)?;
    }

    sqlx::query("INSERT INTO schema_version (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await
        .map_err(fail)?;

    tx.commit().await.map_err(fail)?;
    Ok(())
}

async fn apply_step(
    tx: &mut Transaction<'_, Sqlite>,
    step: &Step,
) -> std::result::Result<(), sqlx::Error> {
    match *step {
        Step::Sql(sql) => {
            sqlx::query(sql).execute(&mut **tx).await?;
        }
        Step::AddColumn { table, column, definition } => {
            let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition);
            match sqlx::query(&sql).execute(&mut **tx).await {
                Ok(_) => info!("  ✓ Added {}.{}", table, column),
                Err(e) if is_duplicate_column(&e) => {
                    debug!("  {}.{} already exists - skipping", table, column);
                }
                Err(e) => return Err(e),
            }
        }
        Step::SqlIfColumn { table, column, sql } => {
            let present: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
                    .bind(table)
                    .bind(column)
                    .fetch_one(&mut **tx)
                    .await?;
            if present > 0 {
                let result = sqlx::query(sql).execute(&mut **tx).await?;
                info!(
                    "  ✓ Copied {} row(s) from {}.{}",
                    result.rows_affected(),
                    table,
                    column
                );
            } else {
                debug!("  {}.{} not present - skipping", table, column);
            }
        }
    }
    Ok(())
}

/// True when `err` is SQLite's "duplicate column name" failure
pub fn is_duplicate_column(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("duplicate column name"),
        _ => false,
    }
}
