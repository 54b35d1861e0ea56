//! JSON artifact writer
//!
//! The artifact is serialized in full before anything touches the
//! destination, written to a temporary file beside it and renamed into place.
//! A failed run therefore leaves either the previous file or nothing.

use crate::output::CrawlResult;
use crate::TrawlError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes `result` as pretty-printed UTF-8 JSON to `path`, atomically
///
/// # Returns
///
/// * `Ok(())` - The file at `path` holds the complete artifact
/// * `Err(TrawlError)` - Serialization or the write failed; `path` is untouched
pub fn write_crawl_result(result: &CrawlResult, path: &Path) -> Result<(), TrawlError> {
    let mut body = serde_json::to_vec_pretty(result)?;
    body.push(b'\n');

    let tmp_path = temp_path_for(path);
    let output_err = |source| TrawlError::Output {
        path: path.to_path_buf(),
        source,
    };

    let written = fs::File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(&body)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp_path, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(output_err(e));
    }

    tracing::debug!("Wrote {} bytes to {}", body.len(), path.display());
    Ok(())
}

/// Reads an artifact previously written by [`write_crawl_result`]
pub fn read_crawl_result(path: &Path) -> Result<CrawlResult, TrawlError> {
    let content = fs::read_to_string(path).map_err(|source| TrawlError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "crawl".to_string());
    path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()))
}
