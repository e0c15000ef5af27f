//! PPTX file parser implementation.

use crate::rels::{part_dir, rels_path_for, resolve_target, Relationships};
use pptocr_core::{Document, DocumentLoader, Error, Result, Shape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use zip::ZipArchive;

/// ZIP local file header magic.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Parser for PPTX (Office Open XML) files.
#[derive(Debug, Clone, Copy)]
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open and parse the PPTX file at `path`.
    pub fn open(&self, path: &Path) -> Result<Document> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        if reader.read_exact(&mut magic).is_err() || magic != ZIP_MAGIC {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not a PPTX (ZIP) container",
                path.display()
            )));
        }
        reader.seek(SeekFrom::Start(0))?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        self.parse(reader, filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Document> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut document = Document::new(filename);

        // Get the slide order from presentation.xml and its relationships
        let slide_order = self.get_slide_order(&mut archive)?;

        for slide_path in &slide_order {
            let shapes = self.parse_slide(&mut archive, slide_path)?;
            document.push_slide(shapes);
        }

        log::debug!("{}: {} slides", filename, document.slides.len());
        Ok(document)
    }

    /// Get the ordered list of slide part paths.
    ///
    /// Follows `p:sldIdLst` in presentation.xml; falls back to the slide
    /// relationships sorted by number when the list is absent.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, &rels_path_for(PRESENTATION_PART))?;
        let rels = Relationships::parse(&rels_content)?;
        let base = part_dir(PRESENTATION_PART);

        let presentation = self.read_file_from_archive(archive, PRESENTATION_PART)?;
        let listed = slide_id_list(&presentation)?;

        if !listed.is_empty() {
            let mut slides = Vec::with_capacity(listed.len());
            for rel_id in listed {
                match rels.get(&rel_id) {
                    Some(rel) if rel.is_slide() => slides.push(resolve_target(base, &rel.target)),
                    _ => log::warn!("Slide list references unknown relationship {}", rel_id),
                }
            }
            return Ok(slides);
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|rel| rel.is_slide())
            .map(|rel| {
                // Extract slide number from rId or target for ordering
                let order_num = extract_slide_number(&rel.target).or_else(|| extract_slide_number(&rel.id));
                (resolve_target(base, &rel.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide's shape tree from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Vec<Shape>> {
        let content = self.read_file_from_archive(archive, slide_path)?;

        let rels = match self.read_file_from_archive(archive, &rels_path_for(slide_path)) {
            Ok(xml) => Relationships::parse(&xml)?,
            Err(_) => Relationships::default(),
        };
        let base = part_dir(slide_path);

        extract_shapes_from_xml(&content, |embed| {
            let rel = rels.get(embed).filter(|r| !r.external)?;
            let media_path = resolve_target(base, &rel.target);
            match self.read_bytes_from_archive(archive, &media_path) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("{}: {}", slide_path, e);
                    None
                }
            }
        })
    }

    /// Read a text part from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let bytes = self.read_bytes_from_archive(archive, path)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::CorruptedFile(format!("'{}' is not UTF-8: {}", path, e)))
    }

    /// Read a binary part from the ZIP archive.
    fn read_bytes_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for PptxParser {
    fn load(&self, path: &Path) -> Result<Document> {
        self.open(path)
    }
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                if let Some(id) = prefixed_attr(e, b"id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing presentation.xml: {}", e)));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Kind of shape element currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeKind {
    /// `p:sp`: text-bearing when it has a `p:txBody`.
    Sp,
    /// `p:pic`.
    Pic,
}

/// A shape element being read.
#[derive(Debug)]
struct ShapeInfo {
    kind: ShapeKind,
    name: Option<String>,
    paragraphs: Option<Vec<String>>,
    embed: Option<String>,
    in_text: bool,
}

impl ShapeInfo {
    fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            name: None,
            paragraphs: None,
            embed: None,
            in_text: false,
        }
    }

    fn current_paragraph(&mut self) -> Option<&mut String> {
        self.paragraphs.as_mut().and_then(|p| p.last_mut())
    }
}

/// An open `p:spTree` or `p:grpSp`.
#[derive(Debug, Default)]
struct GroupFrame {
    name: String,
    shapes: Vec<Shape>,
}

/// Extract the shape tree of a slide, in document order.
///
/// `resolve_image` maps a picture's `r:embed` id to the image bytes.
fn extract_shapes_from_xml<F>(xml_content: &str, mut resolve_image: F) -> Result<Vec<Shape>>
where
    F: FnMut(&str) -> Option<Vec<u8>>,
{
    let mut reader = Reader::from_str(xml_content);
    // Whitespace inside a:t runs is content.
    reader.trim_text(false);

    let mut groups: Vec<GroupFrame> = Vec::new();
    let mut current: Option<ShapeInfo> = None;
    let mut done: Option<Vec<Shape>> = None;
    // Depth inside an element whose content is ignored.
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }
                let name = e.name();
                let local = local_name(name.as_ref());

                if groups.is_empty() {
                    if local == b"spTree" && done.is_none() {
                        groups.push(GroupFrame::default());
                    }
                    continue;
                }

                if let Some(shape) = current.as_mut() {
                    read_shape_element(shape, e, local);
                    continue;
                }

                match local {
                    b"sp" => current = Some(ShapeInfo::new(ShapeKind::Sp)),
                    b"pic" => current = Some(ShapeInfo::new(ShapeKind::Pic)),
                    b"grpSp" => groups.push(GroupFrame::default()),
                    b"cNvPr" => name_group(&mut groups, e),
                    b"graphicFrame" | b"cxnSp" | b"contentPart" | b"AlternateContent" => {
                        skip_depth = 1;
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                if skip_depth > 0 || groups.is_empty() {
                    continue;
                }
                let name = e.name();
                let local = local_name(name.as_ref());

                if let Some(shape) = current.as_mut() {
                    match local {
                        b"p" => {
                            if let Some(paragraphs) = shape.paragraphs.as_mut() {
                                paragraphs.push(String::new());
                            }
                        }
                        // An empty run has no text and no closing tag.
                        b"t" => {}
                        _ => read_shape_element(shape, e, local),
                    }
                    continue;
                }

                match local {
                    b"cNvPr" => name_group(&mut groups, e),
                    b"sp" | b"pic" | b"graphicFrame" | b"cxnSp" | b"contentPart" | b"grpSp" => {
                        push_shape(&mut groups, Shape::Other);
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(shape) = current.as_mut().filter(|s| s.in_text) {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::XmlError(format!("Bad text in slide: {}", err)))?;
                    if let Some(paragraph) = shape.current_paragraph() {
                        paragraph.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(shape) = current.as_mut().filter(|s| s.in_text) {
                    let text = String::from_utf8_lossy(e).to_string();
                    if let Some(paragraph) = shape.current_paragraph() {
                        paragraph.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    if skip_depth == 0 {
                        push_shape(&mut groups, Shape::Other);
                    }
                    continue;
                }
                if groups.is_empty() {
                    continue;
                }
                let name = e.name();
                let local = local_name(name.as_ref());

                match (local, current.as_ref().map(|s| s.kind)) {
                    (b"sp", Some(ShapeKind::Sp)) | (b"pic", Some(ShapeKind::Pic)) => {
                        if let Some(info) = current.take() {
                            let shape = finish_shape(info, &mut resolve_image);
                            push_shape(&mut groups, shape);
                        }
                    }
                    (b"t", Some(_)) => {
                        if let Some(shape) = current.as_mut() {
                            shape.in_text = false;
                        }
                    }
                    (b"grpSp", None) if groups.len() > 1 => {
                        if let Some(frame) = groups.pop() {
                            push_shape(
                                &mut groups,
                                Shape::Group {
                                    name: frame.name,
                                    shapes: frame.shapes,
                                },
                            );
                        }
                    }
                    (b"spTree", None) if groups.len() == 1 => {
                        done = groups.pop().map(|frame| frame.shapes);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(done.unwrap_or_default())
}

/// Handle an element opened inside a `p:sp` or `p:pic`.
fn read_shape_element(shape: &mut ShapeInfo, e: &BytesStart, local: &[u8]) {
    match local {
        b"cNvPr" if shape.name.is_none() => {
            shape.name = plain_attr(e, b"name");
        }
        b"txBody" if shape.kind == ShapeKind::Sp => {
            shape.paragraphs.get_or_insert_with(Vec::new);
        }
        b"p" => {
            if let Some(paragraphs) = shape.paragraphs.as_mut() {
                paragraphs.push(String::new());
            }
        }
        b"t" => shape.in_text = true,
        // A soft break stays inside the paragraph's line.
        b"br" => {
            if let Some(paragraph) = shape.current_paragraph() {
                paragraph.push('\u{b}');
            }
        }
        b"blip" if shape.embed.is_none() => {
            shape.embed = prefixed_attr(e, b"embed");
        }
        _ => {}
    }
}

/// Turn a completed shape element into a `Shape`.
fn finish_shape<F>(info: ShapeInfo, resolve_image: &mut F) -> Shape
where
    F: FnMut(&str) -> Option<Vec<u8>>,
{
    let name = info.name.unwrap_or_default();
    match info.kind {
        ShapeKind::Pic => match info.embed.as_deref().and_then(|id| resolve_image(id)) {
            Some(image) => Shape::Picture { name, image },
            None => {
                log::warn!("Picture '{}' has no embedded image", name);
                Shape::Other
            }
        },
        ShapeKind::Sp => match info.paragraphs {
            Some(paragraphs) => Shape::Text { name, paragraphs },
            None => Shape::Other,
        },
    }
}

fn push_shape(groups: &mut [GroupFrame], shape: Shape) {
    if let Some(frame) = groups.last_mut() {
        frame.shapes.push(shape);
    }
}

/// `p:cNvPr` of a group's own properties names the group.
fn name_group(groups: &mut [GroupFrame], e: &BytesStart) {
    if groups.len() > 1 {
        if let Some(frame) = groups.last_mut().filter(|f| f.name.is_empty()) {
            frame.name = plain_attr(e, b"name").unwrap_or_default();
        }
    }
}

/// Value of an unprefixed attribute.
fn plain_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| attr_to_string(&attr.value))
}

/// Value of a namespace-prefixed attribute (`r:embed`, `r:id`), matched by
/// local name.
fn prefixed_attr(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| {
            let key = attr.key.as_ref();
            key.contains(&b':') && local_name(key) == local
        })
        .map(|attr| attr_to_string(&attr.value))
}

fn attr_to_string(value: &[u8]) -> String {
    String::from_utf8_lossy(value).to_string()
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    const SLIDE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

    fn slide_xml(tree: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            NS, tree
        )
    }

    fn text_shape(name: &str, paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| {
                if p.is_empty() {
                    "<a:p><a:endParaRPr lang=\"en-US\"/></a:p>".to_string()
                } else {
                    format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", p)
                }
            })
            .collect();
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="10" cy="10"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
            name, body
        )
    }

    fn picture(name: &str, embed: &str) -> String {
        format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic>"#,
            name, embed
        )
    }

    fn rels_xml(entries: &[(&str, &str, &str)]) -> String {
        let body: String = entries
            .iter()
            .map(|(id, ty, target)| {
                format!(r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#, id, ty, target)
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            body
        )
    }

    fn build_pptx(parts: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in parts {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn presentation(ids: &[&str]) -> Vec<u8> {
        let list: String = ids
            .iter()
            .enumerate()
            .map(|(i, id)| format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, id))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            NS, list
        )
        .into_bytes()
    }

    fn sample_deck() -> Vec<u8> {
        build_pptx(&[
            ("ppt/presentation.xml", presentation(&["rId3", "rId2"])),
            (
                "ppt/_rels/presentation.xml.rels",
                rels_xml(&[
                    ("rId1", "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster", "slideMasters/slideMaster1.xml"),
                    ("rId2", SLIDE_REL, "slides/slide1.xml"),
                    ("rId3", SLIDE_REL, "slides/slide2.xml"),
                ])
                .into_bytes(),
            ),
            (
                "ppt/slides/slide1.xml",
                slide_xml(&text_shape("Title 1", &["Hello", "", "World"])).into_bytes(),
            ),
            (
                "ppt/slides/slide2.xml",
                slide_xml(&format!("{}{}", picture("Picture 3", "rId2"), text_shape("Caption", &["Figure"])))
                    .into_bytes(),
            ),
            (
                "ppt/slides/_rels/slide2.xml.rels",
                rels_xml(&[("rId2", IMAGE_REL, "../media/image1.png")]).into_bytes(),
            ),
            ("ppt/media/image1.png", b"\x89PNG fake".to_vec()),
        ])
    }

    fn shapes_of(tree: &str) -> Vec<Shape> {
        let media: HashMap<&str, Vec<u8>> = [("rId7", vec![1u8, 2, 3])].into_iter().collect();
        extract_shapes_from_xml(&slide_xml(tree), |id| media.get(id).cloned()).unwrap()
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_parse_follows_slide_id_list() {
        let doc = PptxParser::new()
            .parse(Cursor::new(sample_deck()), "deck.pptx")
            .unwrap();

        assert_eq!(doc.filename, "deck.pptx");
        assert_eq!(doc.slides.len(), 2);
        assert_eq!(doc.slides[0].number, 1);
        assert_eq!(
            doc.slides[0].shapes,
            vec![
                Shape::Picture {
                    name: "Picture 3".into(),
                    image: b"\x89PNG fake".to_vec()
                },
                Shape::Text {
                    name: "Caption".into(),
                    paragraphs: vec!["Figure".into()]
                },
            ]
        );
        assert_eq!(
            doc.slides[1].shapes,
            vec![Shape::Text {
                name: "Title 1".into(),
                paragraphs: vec!["Hello".into(), "".into(), "World".into()]
            }]
        );
    }

    #[test]
    fn test_fallback_order_without_slide_list() {
        let deck = build_pptx(&[
            (
                "ppt/presentation.xml",
                format!(r#"<p:presentation {}/>"#, NS).into_bytes(),
            ),
            (
                "ppt/_rels/presentation.xml.rels",
                rels_xml(&[
                    ("rId9", SLIDE_REL, "slides/slide10.xml"),
                    ("rId8", SLIDE_REL, "slides/slide2.xml"),
                ])
                .into_bytes(),
            ),
            ("ppt/slides/slide2.xml", slide_xml(&text_shape("a", &["two"])).into_bytes()),
            ("ppt/slides/slide10.xml", slide_xml(&text_shape("b", &["ten"])).into_bytes()),
        ]);
        let doc = PptxParser::new().parse(Cursor::new(deck), "x.pptx").unwrap();
        let texts: Vec<_> = doc
            .slides
            .iter()
            .map(|s| match &s.shapes[0] {
                Shape::Text { paragraphs, .. } => paragraphs[0].clone(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(texts, vec!["two", "ten"]);
    }

    #[test]
    fn test_runs_breaks_and_entities() {
        let tree = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Body"/></p:nvSpPr><p:txBody><a:p><a:r><a:t>Tom </a:t></a:r><a:r><a:t>&amp; Jerry</a:t></a:r><a:br/><a:r><a:t>line two</a:t></a:r></a:p><a:p><a:fld id="x" type="slidenum"><a:t>3</a:t></a:fld></a:p><a:p/></p:txBody></p:sp>"#;
        assert_eq!(
            shapes_of(tree),
            vec![Shape::Text {
                name: "Body".into(),
                paragraphs: vec!["Tom & Jerry\u{b}line two".into(), "3".into(), "".into()]
            }]
        );
    }

    #[test]
    fn test_empty_run_does_not_capture_whitespace() {
        let tree = "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Body\"/></p:nvSpPr><p:txBody>\n  <a:p>\n    <a:r><a:t/></a:r>\n    <a:r><a:t>Hello</a:t></a:r>\n  </a:p>\n</p:txBody></p:sp>";
        assert_eq!(
            shapes_of(tree),
            vec![Shape::Text {
                name: "Body".into(),
                paragraphs: vec!["Hello".into()]
            }]
        );
    }

    #[test]
    fn test_shape_without_text_body_is_other() {
        let tree = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Rect"/></p:nvSpPr><p:spPr/></p:sp>"#;
        assert_eq!(shapes_of(tree), vec![Shape::Other]);
    }

    #[test]
    fn test_graphic_frames_are_skipped() {
        let tree = format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="5" name="Table"/></p:nvGraphicFramePr><a:graphic><a:graphicData><a:tbl><a:tr><a:tc><a:txBody><a:p><a:r><a:t>cell</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>{}"#,
            text_shape("After", &["after"])
        );
        let shapes = shapes_of(&tree);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0], Shape::Other);
        assert_eq!(shapes[1].name(), "After");
    }

    #[test]
    fn test_groups_keep_document_order() {
        let tree = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="9" name="Group 9"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}{}</p:grpSp>{}"#,
            text_shape("Inner", &["inner"]),
            picture("Pic", "rId7"),
            text_shape("Outer", &["outer"])
        );
        assert_eq!(
            shapes_of(&tree),
            vec![
                Shape::Group {
                    name: "Group 9".into(),
                    shapes: vec![
                        Shape::Text {
                            name: "Inner".into(),
                            paragraphs: vec!["inner".into()]
                        },
                        Shape::Picture {
                            name: "Pic".into(),
                            image: vec![1, 2, 3]
                        },
                    ]
                },
                Shape::Text {
                    name: "Outer".into(),
                    paragraphs: vec!["outer".into()]
                },
            ]
        );
    }

    #[test]
    fn test_missing_image_is_other() {
        assert_eq!(shapes_of(&picture("Gone", "rId99")), vec![Shape::Other]);
    }

    #[test]
    fn test_malformed_slide_is_error() {
        let result = extract_shapes_from_xml("<p:sld><p:cSld><p:spTree><p:sp></p:pic>", |_| None);
        assert!(matches!(result, Err(Error::XmlError(_))));
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pptx");
        std::fs::write(&path, "plain text, not a deck").unwrap();
        let err = PptxParser::new().load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_open_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        std::fs::write(&path, sample_deck()).unwrap();
        let doc = PptxParser::new().open(&path).unwrap();
        assert_eq!(doc.filename, "deck.pptx");
        assert_eq!(doc.slides.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PptxParser::new()
            .open(Path::new("/nonexistent/deck.pptx"))
            .unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }
}
