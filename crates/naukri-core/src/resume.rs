use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File extensions accepted when a directory is given
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "rtf"];

/// Resolve the resume to upload.
///
/// A file is used as-is. A directory yields its most recently modified file
/// with a supported extension. Anything else is reported as unavailable.
pub fn resolve_resume_path(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if !path.is_dir() {
        return Err(unavailable(path, "no such file or directory"));
    }

    let entries = fs::read_dir(path).map_err(|e| unavailable(path, &e.to_string()))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| unavailable(path, &e.to_string()))?;
        let candidate = entry.path();

        if !candidate.is_file() || !is_supported(&candidate) {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let is_newer = newest
            .as_ref()
            .is_none_or(|(current, _)| modified > *current);
        if is_newer {
            newest = Some((modified, candidate));
        }
    }

    match newest {
        Some((_, file)) => {
            tracing::debug!("Picked resume {} from {}", file.display(), path.display());
            Ok(file)
        }
        None => Err(unavailable(
            path,
            &format!(
                "no {} files in directory",
                SUPPORTED_EXTENSIONS.join("/")
            ),
        )),
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn unavailable(path: &Path, reason: &str) -> Error {
    Error::ResumeUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
