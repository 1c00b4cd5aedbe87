//! Farmer seedling-distribution persistence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::table::{project, Table};
use super::{int, now_timestamp, parse_timestamp, text};
use crate::models::{Farmer, NewFarmer, TreeCounts, TreeSpecies};
use crate::{Error, Result};

/// Export/display column order
pub const EXPORT_COLUMNS: &[&str] = &[
    "id",
    "name",
    "phone",
    "woreda",
    "kebele",
    "officer_name",
    "gesho_count",
    "giravila_count",
    "diceres_count",
    "wanza_count",
    "papaya_count",
    "moringa_count",
    "lemon_count",
    "arzelibanos_count",
    "guava_count",
    "audio_url",
    "created_at",
];

/// Insert a farmer distribution record
pub async fn create(pool: &SqlitePool, input: &NewFarmer) -> Result<Farmer> {
    input.counts.validate().map_err(Error::InvalidInput)?;

    let (created_at, created_at_str) = now_timestamp();
    let audio_url = input.audio_url.as_deref().filter(|u| !u.is_empty());
    let c = &input.counts;

    let result = sqlx::query(
        r#"
        INSERT INTO farmers (
            name, phone, woreda, kebele, officer_name,
            gesho_count, giravila_count, diceres_count, wanza_count, papaya_count,
            moringa_count, lemon_count, arzelibanos_count, guava_count,
            audio_url, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.name.trim())
    .bind(input.phone.trim())
    .bind(input.woreda.trim())
    .bind(input.kebele.trim())
    .bind(input.officer_name.trim())
    .bind(c.gesho)
    .bind(c.giravila)
    .bind(c.diceres)
    .bind(c.wanza)
    .bind(c.papaya)
    .bind(c.moringa)
    .bind(c.lemon)
    .bind(c.arzelibanos)
    .bind(c.guava)
    .bind(audio_url)
    .bind(&created_at_str)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    info!(
        "Saved farmer record {} ({} seedlings, audio={})",
        id,
        c.total(),
        audio_url.is_some()
    );

    Ok(Farmer {
        id,
        name: input.name.trim().to_string(),
        phone: input.phone.trim().to_string(),
        woreda: input.woreda.trim().to_string(),
        kebele: input.kebele.trim().to_string(),
        officer_name: input.officer_name.trim().to_string(),
        counts: input.counts,
        audio_url: audio_url.map(str::to_string),
        created_at,
    })
}

/// All farmer records, oldest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<Farmer>> {
    let sql = format!("SELECT {} FROM farmers ORDER BY id ASC", EXPORT_COLUMNS.join(", "));
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().map(from_row).collect())
}

/// Caller-selected columns of every farmer record
pub async fn project_columns(pool: &SqlitePool, columns: &[&str]) -> Result<Table> {
    project(pool, "farmers", EXPORT_COLUMNS, columns).await
}

/// Fetch one farmer record
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Farmer> {
    let sql = format!("SELECT {} FROM farmers WHERE id = ?", EXPORT_COLUMNS.join(", "));
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Farmer {}", id)))?;
    Ok(from_row(&row))
}

/// Delete one farmer record
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM farmers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Farmer {}", id)));
    }

    info!("Deleted farmer record {}", id);
    Ok(())
}

fn from_row(row: &SqliteRow) -> Farmer {
    let mut counts = TreeCounts::default();
    for sp in TreeSpecies::ALL {
        counts.set(sp, int(row, sp.column()));
    }
    let audio_url: Option<String> = row
        .try_get::<Option<String>, _>("audio_url")
        .ok()
        .flatten()
        .filter(|u| !u.is_empty());
    let created_at: Option<String> = row.try_get("created_at").ok().flatten();

    Farmer {
        id: row.get("id"),
        name: text(row, "name"),
        phone: text(row, "phone"),
        woreda: text(row, "woreda"),
        kebele: text(row, "kebele"),
        officer_name: text(row, "officer_name"),
        counts,
        audio_url,
        created_at: parse_timestamp(created_at.as_deref()),
    }
}
