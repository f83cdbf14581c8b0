//! Read-only access to the log directory.
//!
//! Listing and paging open their own handles per call and keep no state, so
//! any number of requests can run them concurrently. Live tailing lives in
//! [`tail`].

pub mod tail;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{AppError, AppResult};
use crate::types::{format_file_size, LogFile, Page};

pub use tail::{TailOptions, TailSubscription};

const MAX_FILENAME_LEN: usize = 255;

/// Active files (`app.log`), rotated files (`app.log.2026-10-18`) and archives
/// (`app.log.zip`) all carry `.log` somewhere in the name.
fn is_log_file_name(name: &str) -> bool {
    name.contains(".log") && !name.starts_with('.')
}

/// Lists the non-empty log files in `logs_dir`, newest first.
pub async fn list_files(logs_dir: &Path) -> AppResult<Vec<LogFile>> {
    let mut dir = match tokio::fs::read_dir(logs_dir).await {
        Ok(dir) => dir,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "log directory {} does not exist",
                logs_dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !is_log_file_name(&filename) {
            continue;
        }
        let meta = match entry.metadata().await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "Skipping unreadable log file");
                continue;
            }
        };
        if !meta.is_file() || meta.len() == 0 {
            continue;
        }
        let modified_at = meta.modified().map(DateTime::<Local>::from).unwrap_or_else(|_| Local::now());
        files.push(LogFile {
            filename,
            size: meta.len(),
            size_display: format_file_size(meta.len()),
            modified_at,
        });
    }

    files.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then_with(|| a.filename.cmp(&b.filename)));
    Ok(files)
}

/// Rejects anything that is not a plain file name.
pub fn validate_filename(filename: &str) -> AppResult<()> {
    let invalid = |msg: &str| Err(AppError::InvalidArgument(format!("invalid log file name: {}", msg)));

    if filename.trim().is_empty() {
        return invalid("must not be empty");
    }
    if filename.len() > MAX_FILENAME_LEN {
        return invalid("too long");
    }
    if filename.contains('\0') {
        return invalid("contains null byte");
    }
    if filename.contains('/') || filename.contains('\\') {
        return invalid("must not contain path separators");
    }
    if filename == "." || filename == ".." {
        return invalid("must not reference a directory");
    }
    Ok(())
}

/// Resolves `filename` to a file strictly inside `logs_dir`.
///
/// The name is checked before the filesystem is touched, so traversal attempts
/// fail with `InvalidArgument` whether or not the target exists. Only names
/// [`list_files`] would show are accepted.
pub async fn resolve_log_path(logs_dir: &Path, filename: &str) -> AppResult<PathBuf> {
    validate_filename(filename)?;
    if !is_log_file_name(filename) {
        return Err(AppError::InvalidArgument(format!("{} is not a log file", filename)));
    }

    let root = match tokio::fs::canonicalize(logs_dir).await {
        Ok(p) => p,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "log directory {} does not exist",
                logs_dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let resolved = match tokio::fs::canonicalize(root.join(filename)).await {
        Ok(p) => p,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("log file {} does not exist", filename)));
        }
        Err(e) => return Err(e.into()),
    };

    // Symlinks may point anywhere; only accept targets below the root.
    if resolved == root || !resolved.starts_with(&root) {
        return Err(AppError::InvalidArgument(format!(
            "log file {} resolves outside the log directory",
            filename
        )));
    }
    if !tokio::fs::metadata(&resolved).await?.is_file() {
        return Err(AppError::NotFound(format!("log file {} is not a regular file", filename)));
    }

    Ok(resolved)
}

pub fn validate_page_params(page: usize, page_size: usize, max_page_size: usize) -> AppResult<()> {
    if page == 0 {
        return Err(AppError::InvalidArgument("page must be >= 1".into()));
    }
    if page_size == 0 || page_size > max_page_size {
        return Err(AppError::InvalidArgument(format!("page_size must be in 1..={}", max_page_size)));
    }
    Ok(())
}

/// Strips the line terminator and decodes lossily.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Reads one page of `filename`.
///
/// Only the lines that fall inside the page are kept in memory; the rest of
/// the file is streamed through to count lines.
pub async fn read_page(
    logs_dir: &Path,
    filename: &str,
    page: usize,
    page_size: usize,
    max_page_size: usize,
) -> AppResult<Page> {
    validate_page_params(page, page_size, max_page_size)?;
    let path = resolve_log_path(logs_dir, filename).await?;

    let start = (page - 1).saturating_mul(page_size);
    let end = start.saturating_add(page_size);

    let mut reader = BufReader::new(tokio::fs::File::open(&path).await?);
    let mut buf = Vec::new();
    let mut lines = Vec::new();
    let mut total_lines = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if total_lines >= start && total_lines < end {
            lines.push(decode_line(&buf));
        }
        total_lines += 1;
    }

    Ok(Page { lines, total_lines, total_pages: total_lines.div_ceil(page_size), page, page_size })
}
