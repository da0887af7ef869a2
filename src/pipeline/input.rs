//! Input resolution: normalise an invoice path or URL to a local PDF file.
//!
//! pdfium opens documents from the file system, so URL inputs are downloaded
//! into a [`TempDir`] that lives exactly as long as the [`ResolvedInput`].
//! The `%PDF` magic bytes are checked before returning so callers get a
//! meaningful error rather than a pdfium failure.

use crate::error::PlanError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// A resolved invoice: a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the PDF sits in a temp directory removed on drop.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the PDF regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Short name for reports and log lines: the file name, or the URL as given.
pub fn display_name(input: &str) -> String {
    if is_url(input) {
        return input.to_string();
    }
    Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string())
}

/// Resolve the input string to a local PDF path, downloading URLs.
pub fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, PlanError> {
    if input.trim().is_empty() {
        return Err(PlanError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs)
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, PlanError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(PlanError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(PlanError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PlanError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(PlanError::FileNotFound { path });
        }
    }

    debug!("Resolved local invoice: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, PlanError> {
    info!("Downloading invoice from: {}", url);

    let failed = |reason: String| PlanError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().map_err(|e| failed(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|e| PlanError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(file_name_from_url(url));

    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(PlanError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    std::fs::write(&file_path, &bytes)
        .map_err(|e| PlanError::Internal(format!("Failed to write temp file: {e}")))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(last) = parsed.path_segments().and_then(|mut s| s.next_back()) {
            if !last.is_empty() && last.contains('.') {
                return last.to_string();
            }
        }
    }
    "invoice.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/rechnung.pdf"));
        assert!(is_url("http://example.com/rechnung.pdf"));
        assert!(!is_url("/tmp/rechnung.pdf"));
        assert!(!is_url("rechnung.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn file_name_from_url_falls_back() {
        assert_eq!(
            file_name_from_url("https://example.com/docs/miete-2024.pdf"),
            "miete-2024.pdf"
        );
        assert_eq!(file_name_from_url("https://example.com/download/"), "invoice.pdf");
        assert_eq!(file_name_from_url("not a url"), "invoice.pdf");
    }

    #[test]
    fn display_name_uses_file_name() {
        assert_eq!(display_name("/tmp/rechnungen/miete.pdf"), "miete.pdf");
        assert_eq!(display_name("https://x.de/a.pdf"), "https://x.de/a.pdf");
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.pdf", 5).unwrap_err();
        assert!(matches!(err, PlanError::FileNotFound { .. }));
    }

    #[test]
    fn empty_input_is_invalid() {
        assert!(matches!(
            resolve_input("  ", 5),
            Err(PlanError::InvalidInput { .. })
        ));
    }

    #[test]
    fn non_pdf_is_rejected_by_magic_bytes() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"Gesamtbetrag: 10,00").unwrap();
        let err = resolve_input(tmp.path().to_str().unwrap(), 5).unwrap_err();
        match err {
            PlanError::NotAPdf { magic, .. } => assert_eq!(&magic, b"Gesa"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn pdf_magic_resolves_locally() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\n").unwrap();
        let resolved = resolve_input(tmp.path().to_str().unwrap(), 5).unwrap();
        assert_eq!(resolved.path(), tmp.path());
    }
}
