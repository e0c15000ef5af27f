//! General multi-language OCR through the `tesseract` command.

use crate::command::{run, scratch_png};
use image::DynamicImage;
use pptocr_core::{Error, OcrLanguage, Recognizer, Result};
use std::process::Command;

const BACKEND: &str = "tesseract";

/// Tesseract OCR over a fixed list of languages recognized together.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: String,
    languages: Vec<OcrLanguage>,
}

impl TesseractRecognizer {
    /// Create a recognizer running `program` with `languages`.
    pub fn new(program: impl Into<String>, languages: Vec<OcrLanguage>) -> Self {
        Self {
            program: program.into(),
            languages,
        }
    }

    /// The configured languages.
    pub fn languages(&self) -> &[OcrLanguage] {
        &self.languages
    }

    /// Check that the engine runs and every configured language is installed.
    pub fn probe(&self) -> Result<()> {
        let listing = run(BACKEND, Command::new(&self.program).arg("--list-langs"))?;
        let installed = parse_language_list(&listing);
        log::debug!("tesseract languages installed: {}", installed.join(", "));

        let missing = self.missing_languages(&installed);

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::recognizer(
                BACKEND,
                format!("language data not installed: {}", missing.join(", ")),
            ))
        }
    }

    /// Configured language codes absent from `installed`.
    fn missing_languages(&self, installed: &[String]) -> Vec<&str> {
        self.languages
            .iter()
            .map(|l| l.code())
            .filter(|code| !installed.iter().any(|i| i == code))
            .collect()
    }

    fn command(&self, image_path: &std::path::Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(OcrLanguage::join(&self.languages));
        command
    }
}

impl Recognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        BACKEND
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let scratch = scratch_png(BACKEND, image)?;
        run(BACKEND, &mut self.command(scratch.path()))
    }
}

/// Parse `tesseract --list-langs` output into language codes.
fn parse_language_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}
