//! Recognizer and job configuration.
//!
//! Loaded from an optional JSON file; every field has a default so a
//! partial file (or none at all) works.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A language the general OCR back-end should recognize.
///
/// Codes follow Tesseract's traineddata names. Unknown codes are kept
/// verbatim so any installed language can be used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OcrLanguage {
    English,
    SimplifiedChinese,
    TraditionalChinese,
    Japanese,
    Korean,
    German,
    French,
    Spanish,
    Russian,
    Other(String),
}

impl OcrLanguage {
    /// The engine language code.
    pub fn code(&self) -> &str {
        match self {
            Self::English => "eng",
            Self::SimplifiedChinese => "chi_sim",
            Self::TraditionalChinese => "chi_tra",
            Self::Japanese => "jpn",
            Self::Korean => "kor",
            Self::German => "deu",
            Self::French => "fra",
            Self::Spanish => "spa",
            Self::Russian => "rus",
            Self::Other(code) => code,
        }
    }

    /// English plus Simplified Chinese.
    pub fn defaults() -> Vec<Self> {
        vec![Self::English, Self::SimplifiedChinese]
    }

    /// Join codes the way the engine expects (`eng+chi_sim`).
    pub fn join(languages: &[Self]) -> String {
        languages
            .iter()
            .map(|l| l.code())
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl FromStr for OcrLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim();
        if code.is_empty() || code.contains(char::is_whitespace) || code.contains('+') {
            return Err(Error::Config(format!("invalid language code '{}'", s)));
        }
        Ok(match code.to_lowercase().as_str() {
            "eng" | "en" => Self::English,
            "chi_sim" | "zh" | "zh-cn" => Self::SimplifiedChinese,
            "chi_tra" | "zh-tw" => Self::TraditionalChinese,
            "jpn" | "ja" => Self::Japanese,
            "kor" | "ko" => Self::Korean,
            "deu" | "de" => Self::German,
            "fra" | "fr" => Self::French,
            "spa" | "es" => Self::Spanish,
            "rus" | "ru" => Self::Russian,
            _ => Self::Other(code.to_string()),
        })
    }
}

impl TryFrom<String> for OcrLanguage {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<OcrLanguage> for String {
    fn from(value: OcrLanguage) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for OcrLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Runtime configuration for the recognizers and the job runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Languages for the general OCR back-end, recognized simultaneously.
    pub languages: Vec<OcrLanguage>,

    /// Tesseract executable.
    pub tesseract_program: String,

    /// Formula recognizer executable; receives an image path as last argument.
    pub formula_program: String,

    /// Extra arguments for the formula worker (e.g. device selection).
    pub formula_args: Vec<String>,

    /// Maximum number of documents extracted at the same time.
    pub max_concurrent_jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: OcrLanguage::defaults(),
            tesseract_program: "tesseract".to_string(),
            formula_program: "pix2tex".to_string(),
            formula_args: Vec::new(),
            max_concurrent_jobs: default_concurrent_jobs(),
        }
    }
}

fn default_concurrent_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Config {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(Error::Config("at least one OCR language is required".into()));
        }
        if self.tesseract_program.trim().is_empty() {
            return Err(Error::Config("tesseract program must not be empty".into()));
        }
        if self.formula_program.trim().is_empty() {
            return Err(Error::Config("formula program must not be empty".into()));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(Error::Config("max_concurrent_jobs must be at least 1".into()));
        }
        Ok(())
    }
}
