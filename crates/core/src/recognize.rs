//! Image recognition: fan a decoded picture out to every back-end and merge
//! the labeled results.

use crate::Result;
use image::DynamicImage;
use std::sync::Arc;

/// Label for the general OCR block.
pub const OCR_TEXT_LABEL: &str = "[OCR Text]";

/// Label for the formula OCR block.
pub const LATEX_OCR_LABEL: &str = "[LaTeX OCR]";

/// A recognition back-end.
///
/// Implementations must be callable repeatedly and from several jobs at
/// once; they are built once at startup and shared.
pub trait Recognizer: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Recognize the content of `image`.
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

/// One back-end and the label its output is published under.
#[derive(Clone)]
struct Slot {
    label: String,
    backend: Arc<dyn Recognizer>,
}

/// Runs every configured back-end on a picture and merges their output.
#[derive(Clone)]
pub struct ImageRecognizer {
    slots: Vec<Slot>,
}

impl ImageRecognizer {
    /// General OCR first, then formula OCR.
    pub fn new(text: Arc<dyn Recognizer>, formula: Arc<dyn Recognizer>) -> Self {
        Self::with_backends([(OCR_TEXT_LABEL, text), (LATEX_OCR_LABEL, formula)])
    }

    /// Build from an ordered list of (label, back-end) pairs.
    pub fn with_backends<I, L>(backends: I) -> Self
    where
        I: IntoIterator<Item = (L, Arc<dyn Recognizer>)>,
        L: Into<String>,
    {
        Self {
            slots: backends
                .into_iter()
                .map(|(label, backend)| Slot {
                    label: label.into(),
                    backend,
                })
                .collect(),
        }
    }

    /// Labels in merge order.
    pub fn labels(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.label.as_str()).collect()
    }

    /// Run every back-end on `image` and merge the results.
    ///
    /// Back-end failures count as empty output. Returns an empty string when
    /// no back-end produced anything.
    pub fn recognize(&self, image: &DynamicImage) -> String {
        let outputs: Vec<(&str, String)> = self
            .slots
            .iter()
            .map(|slot| {
                let output = match slot.backend.recognize(image) {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("{} failed, treating as empty: {}", slot.backend.name(), e);
                        String::new()
                    }
                };
                (slot.label.as_str(), output)
            })
            .collect();

        merge_outputs(outputs.iter().map(|(label, text)| (*label, text.as_str())))
    }
}

impl std::fmt::Debug for ImageRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRecognizer")
            .field("labels", &self.labels())
            .finish()
    }
}

/// Merge labeled back-end outputs.
///
/// Each non-blank output becomes `label\ntrimmed`; blocks are joined by a
/// newline in the given order and the result is trimmed.
pub fn merge_outputs<'a, I>(outputs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let blocks: Vec<String> = outputs
        .into_iter()
        .filter_map(|(label, text)| {
            let text = text.trim();
            (!text.is_empty()).then(|| format!("{}\n{}", label, text))
        })
        .collect();

    blocks.join("\n").trim().to_string()
}
