//! PPTX (Office Open XML) loader for slide text and picture extraction.
//!
//! Parses .pptx files, which are ZIP archives containing XML documents, into
//! the slide/shape tree used by the extraction pipeline.

pub mod parser;
pub mod rels;

pub use parser::PptxParser;
