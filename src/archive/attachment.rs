//! Write extracted attachments to disk.

use std::path::{Path, PathBuf};

use crate::model::attachment::AttachmentFile;

/// Longest filename written, in characters.
const MAX_NAME_LEN: usize = 150;

/// Write `file` as `{dir}/{seq}_{name}`.
///
/// Empty payloads are skipped and return `None`. An existing file is never
/// overwritten; a counter is appended instead.
pub fn write_attachment(
    dir: &Path,
    file: &AttachmentFile,
    seq: usize,
) -> anyhow::Result<Option<PathBuf>> {
    if file.is_empty() {
        tracing::debug!(name = %file.name, "Skipping empty attachment");
        return Ok(None);
    }

    let filename = format!("{seq}_{}", file.name);
    write_as(dir, &filename, &file.data).map(Some)
}

/// Write `data` under a sanitized `name` in `dir`, without overwriting.
pub fn write_as(dir: &Path, name: &str, data: &[u8]) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = unique_path(&dir.join(sanitize_filename_part(name, MAX_NAME_LEN)));
    std::fs::write(&path, data)?;
    Ok(path)
}

/// Sanitize a string for use in filenames.
///
/// Replaces path separators and other unsafe characters with `_`, keeps
/// letters of any script, and truncates to `max_len` characters.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | '@' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    parent.join(format!("{stem}_dup.{ext}"))
}
