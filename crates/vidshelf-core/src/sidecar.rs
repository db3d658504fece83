//! The `.metadata` sidecar read by the media-server scanner.
//!
//! The description is never written: it is untrusted free text and could
//! corrupt the format.

use std::io;
use std::path::Path;

use crate::model::VideoRecord;

/// Render the sidecar contents for a record.
#[must_use]
pub fn render(record: &VideoRecord) -> String {
    let title: String = record
        .title
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!(
        "[metadata]\ntitle={title}\nrelease={}\n",
        record.release_date()
    )
}

/// Write (or overwrite) the sidecar at `path`.
pub fn write(path: &Path, record: &VideoRecord) -> io::Result<()> {
    std::fs::write(path, render(record))?;
    log::debug!("Wrote sidecar {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn record(title: &str) -> VideoRecord {
        VideoRecord::new(
            "abc",
            title,
            "https://example.com/watch?v=abc",
            "https://example.com/channel/abc",
            NaiveDate::from_ymd_opt(2021, 1, 15).unwrap(),
            PathBuf::from("/in/abc.mp4"),
        )
        .with_description("Subscribe!\n[metadata]\ntitle=spoofed")
    }

    #[test]
    fn test_render_exact_format() {
        assert_eq!(
            render(&record("My:Title/日本&Co")),
            "[metadata]\ntitle=My:Title/日本&Co\nrelease=2021-01-15\n"
        );
    }

    #[test]
    fn test_render_flattens_line_breaks() {
        let text = render(&record("two\r\nlines"));
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("title=two  lines\n"));
    }

    #[test]
    fn test_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.metadata");
        write(&path, &record("Title")).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[metadata]\ntitle=Title\nrelease=2021-01-15\n");
        assert!(!written.contains("Subscribe"));
    }
}
