//! Photo archive export
//!
//! Bundles every stored back-check photo into one deflate-compressed ZIP.
//! Entries are named `<id>_<woreda>.<ext>`.

use std::io::{Cursor, Write};
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::attachments;
use crate::models::BackCheck;
use crate::{Error, Result};

/// Built archive plus what went into it
#[derive(Debug, Clone)]
pub struct PhotoArchive {
    pub bytes: Vec<u8>,
    pub entries: Vec<String>,
    /// Records whose photo could not be decoded
    pub skipped: Vec<i64>,
}

/// Replace anything outside `[A-Za-z0-9_-]` so names are safe on every platform
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Archive entry name for a record's photo
pub fn entry_name(record: &BackCheck, extension: &str) -> String {
    format!("{}_{}.{}", record.id, sanitize_name(&record.woreda), extension)
}

/// Build a ZIP containing the photo of every record that has one
pub fn photo_archive(records: &[BackCheck]) -> Result<PhotoArchive> {
    let zip_err = |e: zip::result::ZipError| Error::Internal(format!("Failed to build archive: {}", e));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for record in records.iter().filter(|r| r.has_photo()) {
        let photo = record.photo.as_deref().unwrap_or_default();
        let attachment = match attachments::decode(photo) {
            Ok(a) => a,
            Err(e) => {
                warn!("Skipping photo of back check {}: {}", record.id, e);
                skipped.push(record.id);
                continue;
            }
        };

        let name = entry_name(record, &attachment.extension);
        writer.start_file(name.as_str(), options).map_err(zip_err)?;
        writer.write_all(&attachment.bytes)?;
        entries.push(name);
    }

    let bytes = writer.finish().map_err(zip_err)?.into_inner();

    Ok(PhotoArchive {
        bytes,
        entries,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BedRecord;
    use chrono::Utc;
    use std::io::Read;

    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    fn record(id: i64, woreda: &str, photo: Option<&str>) -> BackCheck {
        BackCheck {
            id,
            woreda: woreda.to_string(),
            cluster: String::new(),
            kebele: String::new(),
            tno_name: String::new(),
            checker_fa_name: String::new(),
            cbe_acc: String::new(),
            checker_phone: String::new(),
            fenced: "No".to_string(),
            guava: BedRecord::default(),
            gesho: BedRecord::default(),
            lemon: BedRecord::default(),
            grevillea: BedRecord::default(),
            remark: None,
            auto_remark: None,
            photo: photo.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Bahir Dar/Zuria"), "Bahir_Dar_Zuria");
        assert_eq!(sanitize_name("ሜራዊ"), "___");
        assert_eq!(sanitize_name("  "), "unknown");
    }

    #[test]
    fn test_archive_contains_only_records_with_photos() {
        let records = vec![
            record(1, "Merawi", Some(PNG_B64)),
            record(2, "Dangila", None),
            record(3, "Bahir Dar", Some("%%% not base64")),
            record(4, "Achefer", Some(PNG_B64)),
        ];

        let archive = photo_archive(&records).unwrap();
        assert_eq!(archive.entries, vec!["1_Merawi.png", "4_Achefer.png"]);
        assert_eq!(archive.skipped, vec![3]);

        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        let mut entry = zip.by_name("1_Merawi.png").unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(&content[1..4], b"PNG");
    }

    #[test]
    fn test_empty_archive_is_valid_zip() {
        let archive = photo_archive(&[]).unwrap();
        assert!(archive.entries.is_empty());
        let zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        assert_eq!(zip.len(), 0);
    }
}
