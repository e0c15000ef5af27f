//! Domain types for representing a loaded presentation and extracted content.

use serde::{Deserialize, Serialize};

/// Header line written before each contributing slide.
pub fn slide_header(number: usize) -> String {
    format!("--- Slide {} ---", number)
}

/// A loaded presentation: slides in presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Original filename (without path).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Document {
    /// Create an empty document with the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Append a slide, numbering it after the existing ones.
    pub fn push_slide(&mut self, shapes: Vec<Shape>) {
        let number = self.slides.len() + 1;
        self.slides.push(Slide { number, shapes });
    }
}

/// A single slide and its shape tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// 1-based slide number, used only for labeling output.
    pub number: usize,

    /// Shapes in the order they appear in the slide's shape tree.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create a new slide with the given number and shapes.
    pub fn new(number: usize, shapes: Vec<Shape>) -> Self {
        Self { number, shapes }
    }
}

/// A placed element on a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Text-bearing shape; one entry per paragraph, possibly empty.
    Text { name: String, paragraphs: Vec<String> },

    /// Picture carrying raw encoded image bytes (PNG, JPEG, ...).
    Picture { name: String, image: Vec<u8> },

    /// Group of shapes, in document order.
    Group { name: String, shapes: Vec<Shape> },

    /// Anything else (tables, connectors, charts). Contributes nothing.
    Other,
}

impl Shape {
    /// Text shape from paragraph strings.
    pub fn text<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Text {
            name: String::new(),
            paragraphs: paragraphs.into_iter().map(Into::into).collect(),
        }
    }

    /// Picture shape from encoded image bytes.
    pub fn picture(image: impl Into<Vec<u8>>) -> Self {
        Self::Picture {
            name: String::new(),
            image: image.into(),
        }
    }

    /// Shape name as authored in the document, if any.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::Picture { name, .. } | Self::Group { name, .. } => name.as_str(),
            Self::Other => "",
        }
    }
}

/// Fragments extracted from one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Fragments in shape order: paragraph texts and recognition results.
    pub fragments: Vec<String>,
}

impl ExtractedSlide {
    /// Create a new slide with the given number and fragments.
    pub fn new(number: usize, fragments: Vec<String>) -> Self {
        Self { number, fragments }
    }

    /// Whether the slide contributed anything.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Render extracted slides as the document-level text result.
///
/// Slides without fragments produce no header.
pub fn render_slides(slides: &[ExtractedSlide]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for slide in slides.iter().filter(|s| !s.is_empty()) {
        lines.push(slide_header(slide.number));
        lines.extend(slide.fragments.iter().cloned());
    }
    lines.join("\n")
}
