//! Writing extracted text to `.txt` files.

use crate::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default export file name for an input document: `<stem>.txt`.
pub fn default_export_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    PathBuf::from(format!("{}.txt", stem))
}

/// Write `text` to `path` as UTF-8. Not retried on failure.
pub fn export_text(path: &Path, text: &str) -> Result<()> {
    let write = || -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(text.as_bytes())?;
        file.flush()
    };

    write().map_err(|e| Error::ExportWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    log::info!("Exported {}", path.display());
    Ok(())
}
