//! Record intake shared by the HTML forms and the JSON API
//!
//! Both surfaces funnel through here so required-field checks, photo
//! validation and the non-fatal audio upload behave identically.

use nbc_common::attachments;
use nbc_common::db::{back_checks, farmers};
use nbc_common::models::{BackCheck, Farmer, NewBackCheck, NewFarmer};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Saved record plus an optional warning for the user
#[derive(Debug)]
pub struct Saved<T> {
    pub record: T,
    pub warning: Option<String>,
}

fn require(fields: &[(&str, &str)]) -> ApiResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )))
    }
}

/// Validate and persist a back check
pub async fn store_back_check(state: &AppState, input: &NewBackCheck) -> ApiResult<BackCheck> {
    require(&[
        ("woreda", &input.woreda),
        ("kebele", &input.kebele),
        ("checker_fa_name", &input.checker_fa_name),
    ])?;

    if let Some(photo) = input.photo.as_deref() {
        attachments::decode(photo)
            .map_err(|e| ApiError::BadRequest(format!("Photo rejected: {}", e)))?;
    }

    let record = back_checks::create(&state.db, input).await?;
    info!(
        "Stored back check {} ({} / {}) remark={:?}",
        record.id, record.woreda, record.kebele, record.auto_remark
    );
    Ok(record)
}

/// Validate and persist a farmer record, uploading its audio clip first
///
/// Upload failure (or no configured storage) still saves the record, with
/// `audio_url` empty and a warning returned.
pub async fn store_farmer(
    state: &AppState,
    mut input: NewFarmer,
    audio: Option<&str>,
) -> ApiResult<Saved<Farmer>> {
    require(&[
        ("name", &input.name),
        ("woreda", &input.woreda),
        ("kebele", &input.kebele),
    ])?;
    input.counts.validate().map_err(ApiError::BadRequest)?;

    let mut warning = None;
    input.audio_url = None;

    if let Some(audio) = audio.filter(|a| !a.trim().is_empty()) {
        let uploaded = match attachments::decode(audio) {
            Ok(attachment) => state.uploader.upload(&attachment).await,
            Err(e) => Err(e),
        };
        match uploaded {
            Ok(url) => input.audio_url = Some(url),
            Err(e) => {
                warn!("Audio not stored for farmer {}: {}", input.name, e);
                warning = Some(format!("Record saved without audio: {}", e));
            }
        }
    }

    let record = farmers::create(&state.db, &input).await?;
    info!(
        "Stored farmer {} ({}), {} seedlings",
        record.id,
        record.name,
        record.counts.total()
    );
    Ok(Saved { record, warning })
}
