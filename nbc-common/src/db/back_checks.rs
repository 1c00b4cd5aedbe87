//! Back check persistence
//!
//! Records are created once and deleted by id; there is no update path.
//! Derived totals and the generated remark are computed here at insert time
//! and stored, never recomputed on read.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::table::{project, Table};
use super::{int, now_timestamp, parse_timestamp, real, text};
use crate::attachments::strip_data_url;
use crate::calc::Species;
use crate::models::{BackCheck, BedRecord, NewBackCheck};
use crate::{Error, Result};

/// Export/display column order: location and personnel, per-species
/// bed → length → sockets → total, then status and remarks
pub const EXPORT_COLUMNS: &[&str] = &[
    "id",
    "woreda",
    "cluster",
    "kebele",
    "tno_name",
    "checker_fa_name",
    "cbe_acc",
    "checker_phone",
    "guava_beds",
    "guava_length",
    "guava_sockets",
    "total_guava_sockets",
    "gesho_beds",
    "gesho_length",
    "gesho_sockets",
    "total_gesho_sockets",
    "lemon_beds",
    "lemon_length",
    "lemon_sockets",
    "total_lemon_sockets",
    "grevillea_beds",
    "grevillea_length",
    "grevillea_sockets",
    "total_grevillea_sockets",
    "fenced",
    "auto_remark",
    "remark",
    "created_at",
];

/// Column holding the base64 photo; selectable but never exported
pub const PHOTO_COLUMN: &str = "photo";

/// Every selectable column: [`EXPORT_COLUMNS`] followed by [`PHOTO_COLUMN`]
pub fn all_columns() -> Vec<&'static str> {
    EXPORT_COLUMNS
        .iter()
        .copied()
        .chain(std::iter::once(PHOTO_COLUMN))
        .collect()
}

/// Insert a back check, deriving totals and the auto remark
pub async fn create(pool: &SqlitePool, input: &NewBackCheck) -> Result<BackCheck> {
    for species in Species::ALL {
        input
            .measurement(species)
            .validate(species)
            .map_err(Error::InvalidInput)?;
    }

    let (created_at, created_at_str) = now_timestamp();
    let auto_remark = Some(input.auto_remark()).filter(|r| !r.is_empty());
    let [guava, gesho, lemon, grevillea] = Species::ALL.map(|sp| BedRecord::from(input.measurement(sp)));
    let remark = input.remark.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let photo = input
        .photo
        .as_deref()
        .map(strip_data_url)
        .filter(|p| !p.is_empty());

    let result = sqlx::query(
        r#"
        INSERT INTO back_checks (
            woreda, cluster, kebele, tno_name, checker_fa_name, cbe_acc, checker_phone, fenced,
            guava_beds, guava_length, guava_sockets, total_guava_sockets,
            gesho_beds, gesho_length, gesho_sockets, total_gesho_sockets,
            lemon_beds, lemon_length, lemon_sockets, total_lemon_sockets,
            grevillea_beds, grevillea_length, grevillea_sockets, total_grevillea_sockets,
            remark, auto_remark, photo, created_at
        ) VALUES (
            ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?, ?
        )
        "#,
    )
    .bind(input.woreda.trim())
    .bind(input.cluster.trim())
    .bind(input.kebele.trim())
    .bind(input.tno_name.trim())
    .bind(input.checker_fa_name.trim())
    .bind(input.cbe_acc.trim())
    .bind(input.checker_phone.trim())
    .bind(input.fenced.as_str())
    .bind(guava.beds)
    .bind(guava.length)
    .bind(guava.sockets)
    .bind(guava.total_sockets)
    .bind(gesho.beds)
    .bind(gesho.length)
    .bind(gesho.sockets)
    .bind(gesho.total_sockets)
    .bind(lemon.beds)
    .bind(lemon.length)
    .bind(lemon.sockets)
    .bind(lemon.total_sockets)
    .bind(grevillea.beds)
    .bind(grevillea.length)
    .bind(grevillea.sockets)
    .bind(grevillea.total_sockets)
    .bind(remark)
    .bind(&auto_remark)
    .bind(photo)
    .bind(&created_at_str)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    info!("Saved back check {} (woreda={})", id, input.woreda.trim());

    Ok(BackCheck {
        id,
        woreda: input.woreda.trim().to_string(),
        cluster: input.cluster.trim().to_string(),
        kebele: input.kebele.trim().to_string(),
        tno_name: input.tno_name.trim().to_string(),
        checker_fa_name: input.checker_fa_name.trim().to_string(),
        cbe_acc: input.cbe_acc.trim().to_string(),
        checker_phone: input.checker_phone.trim().to_string(),
        fenced: input.fenced.as_str().to_string(),
        guava,
        gesho,
        lemon,
        grevillea,
        remark: remark.map(str::to_string),
        auto_remark,
        photo: photo.map(str::to_string),
        created_at,
    })
}

/// All back checks, oldest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<BackCheck>> {
    let sql = format!("SELECT {} FROM back_checks ORDER BY id ASC", all_columns().join(", "));
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().map(from_row).collect())
}

/// Back checks that carry a photo, oldest first
pub async fn list_with_photos(pool: &SqlitePool) -> Result<Vec<BackCheck>> {
    let sql = format!(
        "SELECT {} FROM back_checks WHERE photo IS NOT NULL AND photo != '' ORDER BY id ASC",
        all_columns().join(", ")
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().map(from_row).collect())
}

/// Caller-selected columns of every back check
pub async fn project_columns(pool: &SqlitePool, columns: &[&str]) -> Result<Table> {
    project(pool, "back_checks", &all_columns(), columns).await
}

/// Fetch one back check
pub async fn get(pool: &SqlitePool, id: i64) -> Result<BackCheck> {
    let sql = format!("SELECT {} FROM back_checks WHERE id = ?", all_columns().join(", "));
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Back check {}", id)))?;
    Ok(from_row(&row))
}

/// Delete one back check
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM back_checks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Back check {}", id)));
    }

    info!("Deleted back check {}", id);
    Ok(())
}

/// Number of stored back checks
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM back_checks")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

fn bed_record(row: &SqliteRow, species: Species) -> BedRecord {
    let key = species.key();
    BedRecord {
        beds: int(row, &format!("{}_beds", key)),
        length: real(row, &format!("{}_length", key)),
        sockets: int(row, &format!("{}_sockets", key)),
        total_sockets: int(row, &format!("total_{}_sockets", key)),
    }
}

/// Map a row to a record; NULL numerics read as zero, NULL text as empty
fn from_row(row: &SqliteRow) -> BackCheck {
    let optional = |column: &str| {
        row.try_get::<Option<String>, _>(column)
            .ok()
            .flatten()
            .filter(|s| !s.is_empty())
    };
    let created_at: Option<String> = row.try_get("created_at").ok().flatten();

    BackCheck {
        id: row.get("id"),
        woreda: text(row, "woreda"),
        cluster: text(row, "cluster"),
        kebele: text(row, "kebele"),
        tno_name: text(row, "tno_name"),
        checker_fa_name: text(row, "checker_fa_name"),
        cbe_acc: text(row, "cbe_acc"),
        checker_phone: text(row, "checker_phone"),
        fenced: text(row, "fenced"),
        guava: bed_record(row, Species::Guava),
        gesho: bed_record(row, Species::Gesho),
        lemon: bed_record(row, Species::Lemon),
        grevillea: bed_record(row, Species::Grevillea),
        remark: optional("remark"),
        auto_remark: optional("auto_remark"),
        photo: optional("photo"),
        created_at: parse_timestamp(created_at.as_deref()),
    }
}
