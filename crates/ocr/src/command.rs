//! Running an external engine on a scratch copy of an image.

use image::{DynamicImage, ImageFormat};
use pptocr_core::{Error, Result};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// Write `image` to a temporary PNG that lives as long as the handle.
pub fn scratch_png(backend: &str, image: &DynamicImage) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("pptocr-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| Error::recognizer(backend, format!("cannot create scratch file: {}", e)))?;

    image
        .save_with_format(file.path(), ImageFormat::Png)
        .map_err(|e| Error::recognizer(backend, format!("cannot write scratch image: {}", e)))?;

    Ok(file)
}

/// Run `command` and return its stdout, failing on a non-zero exit.
pub fn run(backend: &str, command: &mut Command) -> Result<String> {
    let output = command
        .output()
        .map_err(|e| Error::recognizer(backend, format!("cannot run: {}", e)))?;
    check_status(backend, &output)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn check_status(backend: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.lines().last().unwrap_or("").trim();
    Err(Error::recognizer(
        backend,
        if detail.is_empty() {
            format!("exited with {}", output.status)
        } else {
            format!("exited with {}: {}", output.status, detail)
        },
    ))
}

/// Remove an echoed `<image path>:` prefix from engine output.
pub fn strip_path_echo<'a>(output: &'a str, image: &Path) -> &'a str {
    let path = image.to_string_lossy();
    output
        .trim_start()
        .strip_prefix(&*path)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(output)
}
