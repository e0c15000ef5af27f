//! Document-level extraction: load, walk every slide, assemble the text.

use crate::types::{render_slides, Document, ExtractedSlide};
use crate::walker::ShapeWalker;
use crate::Result;
use std::path::Path;

/// Loads a presentation container into the slide/shape tree.
pub trait DocumentLoader: Send + Sync {
    /// Load the document at `path`.
    fn load(&self, path: &Path) -> Result<Document>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&Path) -> Result<Document> + Send + Sync,
{
    fn load(&self, path: &Path) -> Result<Document> {
        self(path)
    }
}

/// Extraction pipeline for one document at a time.
///
/// Holds no per-document state, so one instance can serve concurrent jobs.
#[derive(Debug)]
pub struct ExtractionPipeline<L> {
    loader: L,
    walker: ShapeWalker,
}

impl<L: DocumentLoader> ExtractionPipeline<L> {
    /// Create a pipeline from a loader and a shape walker.
    pub fn new(loader: L, walker: ShapeWalker) -> Self {
        Self { loader, walker }
    }

    /// Extract the slides of `path` that contributed at least one fragment.
    pub fn extract_slides(&self, path: &Path) -> Result<Vec<ExtractedSlide>> {
        let document = self
            .loader
            .load(path)
            .map_err(|e| e.into_document_load(path))?;

        log::info!(
            "Loaded {} ({} slides)",
            document.filename,
            document.slides.len()
        );

        Ok(self.walk_document(&document))
    }

    /// Extract `path` and render the document text.
    pub fn extract(&self, path: &Path) -> Result<String> {
        let slides = self.extract_slides(path)?;
        Ok(render_slides(&slides))
    }

    /// Walk an already loaded document.
    pub fn walk_document(&self, document: &Document) -> Vec<ExtractedSlide> {
        document
            .slides
            .iter()
            .map(|slide| self.walker.extract(slide))
            .filter(|slide| !slide.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::tests::FixedRecognizer;
    use crate::recognize::ImageRecognizer;
    use crate::types::Shape;
    use crate::walker::tests::png_bytes;
    use crate::Error;
    use std::sync::Arc;

    fn pipeline<L: DocumentLoader>(loader: L, ocr: &str, latex: &str) -> ExtractionPipeline<L> {
        let recognizer = ImageRecognizer::new(
            FixedRecognizer::ok("ocr", ocr),
            FixedRecognizer::ok("formula", latex),
        );
        ExtractionPipeline::new(loader, ShapeWalker::new(Arc::new(recognizer)))
    }

    fn hello_world(_: &Path) -> Result<Document> {
        let mut doc = Document::new("deck.pptx");
        doc.push_slide(vec![Shape::text(["Hello"])]);
        doc.push_slide(vec![Shape::picture(png_bytes())]);
        Ok(doc)
    }

    #[test]
    fn test_end_to_end_two_slides() {
        let text = pipeline(hello_world, "World", "")
            .extract(Path::new("deck.pptx"))
            .unwrap();
        assert_eq!(
            text,
            "--- Slide 1 ---\nHello\n--- Slide 2 ---\n[OCR Text]\nWorld"
        );
    }

    #[test]
    fn test_headers_only_for_contributing_slides() {
        let loader = |_: &Path| -> Result<Document> {
            let mut doc = Document::new("deck.pptx");
            doc.push_slide(vec![Shape::text(["", " "])]);
            doc.push_slide(vec![Shape::Other]);
            doc.push_slide(vec![Shape::text(["third"])]);
            doc.push_slide(vec![]);
            Ok(doc)
        };
        let p = pipeline(loader, "", "");
        let text = p.extract(Path::new("deck.pptx")).unwrap();
        assert_eq!(text, "--- Slide 3 ---\nthird");
        assert_eq!(text.matches("--- Slide").count(), 1);

        let slides = p.extract_slides(Path::new("deck.pptx")).unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].number, 3);
    }

    #[test]
    fn test_load_failure_is_document_load_error() {
        let loader = |_: &Path| -> Result<Document> { Err(Error::ZipError("not a zip".into())) };
        let err = pipeline(loader, "", "")
            .extract(Path::new("broken.pptx"))
            .unwrap_err();
        assert!(err.is_document_load());
        assert!(err.to_string().contains("broken.pptx"));
    }

    #[test]
    fn test_empty_document_gives_empty_text() {
        let loader = |_: &Path| -> Result<Document> { Ok(Document::new("empty.pptx")) };
        assert_eq!(pipeline(loader, "", "").extract(Path::new("empty.pptx")).unwrap(), "");
    }
}
