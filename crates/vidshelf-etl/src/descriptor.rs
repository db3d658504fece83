//! Loading of download-tool JSON descriptors.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use vidshelf_core::VideoRecord;

use crate::error::{OrganizeError, OrganizeResult};

/// The descriptor fields we use. Everything else in the file is ignored.
#[derive(Debug, Deserialize)]
struct Descriptor {
    id: String,
    webpage_url: String,
    channel_url: String,
    upload_date: String,
    title: String,
    #[serde(rename = "_filename")]
    filename: PathBuf,
    #[serde(default)]
    description: Option<String>,
}

/// Parse one descriptor file into an un-numbered [`VideoRecord`].
///
/// Unreadable files, invalid JSON, missing fields and bad upload dates all
/// come back as [`OrganizeError::MalformedDescriptor`].
pub fn load(path: &Path) -> OrganizeResult<VideoRecord> {
    let malformed = |reason: String| OrganizeError::MalformedDescriptor {
        path: path.to_path_buf(),
        reason,
    };

    let contents =
        std::fs::read_to_string(path).map_err(|e| malformed(format!("cannot read: {e}")))?;
    let descriptor: Descriptor =
        serde_json::from_str(&contents).map_err(|e| malformed(e.to_string()))?;

    if descriptor.id.trim().is_empty() {
        return Err(malformed("empty `id`".to_string()));
    }
    let upload_date = parse_upload_date(&descriptor.upload_date).map_err(malformed)?;
    let download_file = resolve_download_file(path, &descriptor.filename);

    log::debug!("Loaded descriptor {}", path.display());

    let mut record = VideoRecord::new(
        descriptor.id,
        descriptor.title,
        descriptor.webpage_url,
        descriptor.channel_url,
        upload_date,
        download_file,
    )
    .with_descriptor_file(path.to_path_buf());
    record.description = descriptor.description;
    Ok(record)
}

/// Parse a strict `YYYYMMDD` date.
fn parse_upload_date(raw: &str) -> Result<NaiveDate, String> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("upload_date {raw:?} is not YYYYMMDD"));
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map_err(|e| format!("upload_date {raw:?} is not a valid date: {e}"))
}

/// Resolve `_filename` against the descriptor's directory.
///
/// Absolute paths are taken as-is. A relative path is tried as written,
/// then by file name alone, next to the descriptor.
fn resolve_download_file(descriptor: &Path, filename: &Path) -> PathBuf {
    if filename.is_absolute() {
        return filename.to_path_buf();
    }
    let dir = descriptor.parent().unwrap_or_else(|| Path::new("."));
    let as_written = dir.join(filename);
    if as_written.exists() {
        return as_written;
    }
    match filename.file_name() {
        Some(name) if dir.join(name).exists() => dir.join(name),
        _ => as_written,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_descriptor(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    fn full_descriptor(filename: &str) -> serde_json::Value {
        json!({
            "id": "dQw4w9WgXcQ",
            "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "channel_url": "https://www.youtube.com/channel/UC38IQsAvIsxxjztdMZQtwHA",
            "upload_date": "20211025",
            "title": "Never: Gonna / Give",
            "_filename": filename,
            "description": "long text",
            "duration": 212,
            "formats": []
        })
    }

    #[test]
    fn test_load_valid_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(dir.path(), "v.info.json", &full_descriptor("/abs/v.mp4"));

        let record = load(&path).unwrap();
        assert_eq!(record.id, "dQw4w9WgXcQ");
        assert_eq!(record.title, "Never: Gonna / Give");
        assert_eq!(record.release_date(), "2021-10-25");
        assert_eq!(record.season, 2021);
        assert_eq!(record.episode, None);
        assert_eq!(record.download_file, PathBuf::from("/abs/v.mp4"));
        assert_eq!(record.descriptor_file, Some(path));
        assert_eq!(record.description.as_deref(), Some("long text"));
    }

    #[test]
    fn test_relative_filename_resolved_next_to_descriptor() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("v.mp4"), b"video").unwrap();
        let path = write_descriptor(
            dir.path(),
            "v.info.json",
            &full_descriptor("Channel/v.mp4"),
        );

        let record = load(&path).unwrap();
        assert_eq!(record.download_file, dir.path().join("v.mp4"));
    }

    #[test]
    fn test_relative_filename_kept_when_not_found() {
        let dir = TempDir::new().unwrap();
        let path = write_descriptor(dir.path(), "v.info.json", &full_descriptor("sub/v.mp4"));

        let record = load(&path).unwrap();
        assert_eq!(record.download_file, dir.path().join("sub/v.mp4"));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let dir = TempDir::new().unwrap();
        let mut value = full_descriptor("/abs/v.mp4");
        value.as_object_mut().unwrap().remove("channel_url");
        let path = write_descriptor(dir.path(), "v.info.json", &value);

        let err = load(&path).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("channel_url"));
    }

    #[test]
    fn test_bad_dates_are_malformed() {
        let dir = TempDir::new().unwrap();
        for bad in ["2021-10-25", "20211325", "2021102", "+2021102", ""] {
            let mut value = full_descriptor("/abs/v.mp4");
            value["upload_date"] = json!(bad);
            let path = write_descriptor(dir.path(), "v.info.json", &value);

            let err = load(&path).unwrap_err();
            assert!(
                matches!(err, OrganizeError::MalformedDescriptor { .. }),
                "date {bad:?}"
            );
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load(&path),
            Err(OrganizeError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn test_unreadable_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("gone.json")).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_empty_id_is_malformed() {
        let dir = TempDir::new().unwrap();
        let mut value = full_descriptor("/abs/v.mp4");
        value["id"] = json!("  ");
        let path = write_descriptor(dir.path(), "v.info.json", &value);

        assert!(load(&path).is_err());
    }
}
