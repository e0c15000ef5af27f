//! Shape walking: turn one slide's shape tree into ordered text fragments.

use crate::recognize::ImageRecognizer;
use crate::types::{ExtractedSlide, Shape, Slide};
use crate::Error;
use std::sync::Arc;

/// Walks slides and produces fragments in shape order.
#[derive(Debug, Clone)]
pub struct ShapeWalker {
    recognizer: Arc<ImageRecognizer>,
}

impl ShapeWalker {
    /// Create a walker that sends pictures to `recognizer`.
    pub fn new(recognizer: Arc<ImageRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Fragments for one slide, in the order shapes appear.
    pub fn walk(&self, slide: &Slide) -> Vec<String> {
        let mut fragments = Vec::new();
        for shape in &slide.shapes {
            self.walk_shape(shape, &mut fragments);
        }
        log::debug!(
            "Slide {}: {} shapes, {} fragments",
            slide.number,
            slide.shapes.len(),
            fragments.len()
        );
        fragments
    }

    /// Walk a slide and keep its number alongside the fragments.
    pub fn extract(&self, slide: &Slide) -> ExtractedSlide {
        ExtractedSlide::new(slide.number, self.walk(slide))
    }

    fn walk_shape(&self, shape: &Shape, fragments: &mut Vec<String>) {
        match shape {
            Shape::Picture { name, image } => {
                if let Some(fragment) = self.picture_fragment(name, image) {
                    fragments.push(fragment);
                }
            }
            Shape::Text { paragraphs, .. } => {
                fragments.extend(
                    paragraphs
                        .iter()
                        .filter(|p| !p.trim().is_empty())
                        .cloned(),
                );
            }
            Shape::Group { shapes, .. } => {
                for child in shapes {
                    self.walk_shape(child, fragments);
                }
            }
            Shape::Other => {}
        }
    }

    fn picture_fragment(&self, name: &str, bytes: &[u8]) -> Option<String> {
        let image = match decode_image(bytes) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Could not decode picture '{}': {}", name, e);
                return Some(format!("[Error OCR Image: {}]", e));
            }
        };

        let result = self.recognizer.recognize(&image);
        if result.is_empty() {
            log::debug!("Picture '{}' produced no text", name);
            None
        } else {
            Some(result)
        }
    }
}

/// Decode embedded picture bytes; the format comes from the header.
pub fn decode_image(bytes: &[u8]) -> crate::Result<image::DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::ImageDecode(e.to_string()))
}
