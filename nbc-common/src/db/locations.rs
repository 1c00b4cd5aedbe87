//! Woreda / Kebele hierarchy
//!
//! Woreda names are unique. Each kebele belongs to exactly one woreda and is
//! removed with it (`ON DELETE CASCADE`, which needs `foreign_keys=ON` on the
//! connection; see `init_database`).

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::{now_timestamp, parse_timestamp};
use crate::models::{Kebele, Woreda};
use crate::{Error, Result};

fn clean_name(name: &str, what: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput(format!("{} name is required", what)));
    }
    Ok(name.to_string())
}

// ========================================
// Woredas
// ========================================

pub async fn create_woreda(pool: &SqlitePool, name: &str) -> Result<Woreda> {
    let name = clean_name(name, "Woreda")?;
    let (created_at, created_at_str) = now_timestamp();

    let result = sqlx::query("INSERT INTO woredas (name, created_at) VALUES (?, ?)")
        .bind(&name)
        .bind(&created_at_str)
        .execute(pool)
        .await
        .map_err(|e| Error::from_insert(e, &format!("Woreda '{}'", name)))?;

    let id = result.last_insert_rowid();
    info!("Created woreda {} ({})", id, name);

    Ok(Woreda { id, name, created_at })
}

/// All woredas ordered by name
pub async fn list_woredas(pool: &SqlitePool) -> Result<Vec<Woreda>> {
    let rows = sqlx::query("SELECT id, name, created_at FROM woredas ORDER BY name ASC")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(woreda_from_row).collect())
}

pub async fn get_woreda(pool: &SqlitePool, id: i64) -> Result<Woreda> {
    sqlx::query("SELECT id, name, created_at FROM woredas WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|row| woreda_from_row(&row))
        .ok_or_else(|| Error::NotFound(format!("Woreda {}", id)))
}

pub async fn find_woreda_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Woreda>> {
    let row = sqlx::query("SELECT id, name, created_at FROM woredas WHERE name = ?")
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| woreda_from_row(&row)))
}

/// Delete a woreda and, by cascade, its kebeles
pub async fn delete_woreda(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM woredas WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Woreda {}", id)));
    }

    info!("Deleted woreda {} and its kebeles", id);
    Ok(())
}

fn woreda_from_row(row: &SqliteRow) -> Woreda {
    let created_at: String = row.get("created_at");
    Woreda {
        id: row.get("id"),
        name: row.get("name"),
        created_at: parse_timestamp(Some(&created_at)),
    }
}

// ========================================
// Kebeles
// ========================================

pub async fn create_kebele(pool: &SqlitePool, woreda_id: i64, name: &str) -> Result<Kebele> {
    let name = clean_name(name, "Kebele")?;
    // Surface a missing parent as NotFound rather than a foreign key failure
    let woreda = get_woreda(pool, woreda_id).await?;
    let (created_at, created_at_str) = now_timestamp();

    let result = sqlx::query("INSERT INTO kebeles (woreda_id, name, created_at) VALUES (?, ?, ?)")
        .bind(woreda_id)
        .bind(&name)
        .bind(&created_at_str)
        .execute(pool)
        .await
        .map_err(|e| Error::from_insert(e, &format!("Kebele '{}' in {}", name, woreda.name)))?;

    let id = result.last_insert_rowid();
    info!("Created kebele {} ({}) under {}", id, name, woreda.name);

    Ok(Kebele {
        id,
        woreda_id,
        name,
        created_at,
    })
}

/// Kebeles of one woreda ordered by name
pub async fn list_kebeles(pool: &SqlitePool, woreda_id: i64) -> Result<Vec<Kebele>> {
    let rows = sqlx::query(
        "SELECT id, woreda_id, name, created_at FROM kebeles WHERE woreda_id = ? ORDER BY name ASC",
    )
    .bind(woreda_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(kebele_from_row).collect())
}

/// Ordered kebele names for the named woreda; empty when the woreda is unknown
pub async fn kebele_names_for_woreda(pool: &SqlitePool, woreda_name: &str) -> Result<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT k.name
        FROM kebeles k
        JOIN woredas w ON w.id = k.woreda_id
        WHERE w.name = ?
        ORDER BY k.name ASC
        "#,
    )
    .bind(woreda_name.trim())
    .fetch_all(pool)
    .await?;
    Ok(names)
}

pub async fn get_kebele(pool: &SqlitePool, id: i64) -> Result<Kebele> {
    sqlx::query("SELECT id, woreda_id, name, created_at FROM kebeles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|row| kebele_from_row(&row))
        .ok_or_else(|| Error::NotFound(format!("Kebele {}", id)))
}

pub async fn delete_kebele(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM kebeles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Kebele {}", id)));
    }
    Ok(())
}

fn kebele_from_row(row: &SqliteRow) -> Kebele {
    let created_at: String = row.get("created_at");
    Kebele {
        id: row.get("id"),
        woreda_id: row.get("woreda_id"),
        name: row.get("name"),
        created_at: parse_timestamp(Some(&created_at)),
    }
}
