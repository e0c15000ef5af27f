//! Recognition back-ends for slide pictures.
//!
//! Both back-ends hand a temporary PNG copy of the image to an external
//! engine: Tesseract for multi-language text, run per image, and a
//! long-lived formula worker that keeps its model loaded for the whole run.

pub mod command;
pub mod formula;
pub mod tesseract;

pub use formula::FormulaCommandRecognizer;
pub use tesseract::TesseractRecognizer;

use pptocr_core::{Config, ImageRecognizer, Result};
use std::sync::Arc;

/// Build both back-ends from `config`, probing Tesseract and starting the
/// formula worker.
///
/// A failing probe means the engine is missing or misconfigured, which is
/// fatal at startup.
pub fn recognizer_from_config(config: &Config) -> Result<ImageRecognizer> {
    let text = TesseractRecognizer::new(&config.tesseract_program, config.languages.clone());
    text.probe()?;

    let formula =
        FormulaCommandRecognizer::start(&config.formula_program, config.formula_args.clone())?;

    Ok(ImageRecognizer::new(Arc::new(text), Arc::new(formula)))
}
