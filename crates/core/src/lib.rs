//! Core domain types, shape walking, image recognition and job running
//! for slide deck text and formula OCR.

pub mod config;
pub mod error;
pub mod export;
pub mod jobs;
pub mod pipeline;
pub mod recognize;
pub mod types;
pub mod walker;

pub use config::{Config, OcrLanguage};
pub use error::{Error, Result};
pub use export::{default_export_name, export_text};
pub use jobs::{run_pending, JobBoard, JobEvent, JobRecord, JobRunner, JobStatus};
pub use pipeline::{DocumentLoader, ExtractionPipeline};
pub use recognize::{ImageRecognizer, Recognizer, LATEX_OCR_LABEL, OCR_TEXT_LABEL};
pub use types::{render_slides, Document, ExtractedSlide, Shape, Slide};
pub use walker::ShapeWalker;
