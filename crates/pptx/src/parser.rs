//! PPTX package reader.
//!
//! Opening the archive and resolving the slide list happens eagerly; a
//! failure there is a whole-document failure. Each slide's XML is decoded
//! lazily through [`SlideSource`], so a damaged slide part only degrades
//! that slide.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::sync::Arc;

use deckmark_core::options::DEFAULT_MAX_GROUP_DEPTH;
use deckmark_core::{Error, Result, Shape, SlideSource};
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::shapes::{
    self, attribute, local_name, xml_error, PlaceholderAnchors, ShapeDecoder,
};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_REL_SUFFIX: &str = "/slide";
const NOTES_REL_SUFFIX: &str = "/notesSlide";
const LAYOUT_REL_SUFFIX: &str = "/slideLayout";
const MASTER_REL_SUFFIX: &str = "/slideMaster";

/// Placeholder anchors inherited by a slide: layout first, then master.
type Inherited = Arc<Vec<PlaceholderAnchors>>;

/// Parser for PPTX (Office Open XML) files.
#[derive(Debug, Clone)]
pub struct PptxParser {
    max_group_depth: usize,
}

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self {
            max_group_depth: DEFAULT_MAX_GROUP_DEPTH,
        }
    }

    /// Deepest `p:grpSp` nesting decoded before a slide is reported as unreadable.
    pub fn with_max_group_depth(mut self, depth: usize) -> Self {
        self.max_group_depth = depth.max(1);
        self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<PptxDocument> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("Found {} slide parts", slide_order.len());

        let mut layouts = HashMap::new();
        let slides = slide_order
            .into_iter()
            .map(|path| self.load_slide(&mut archive, &mut layouts, path))
            .collect();

        Ok(PptxDocument { slides })
    }

    /// Get the ordered list of slide part paths.
    ///
    /// The authoritative order is `p:sldIdLst` in `presentation.xml`. When
    /// that part is unreadable the slide relationships are sorted by the
    /// number in their id or target name instead.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = read_file_from_archive(archive, PRESENTATION_RELS)?;
        let slide_rels: Vec<Relationship> = read_relationships(&rels_content)?
            .into_iter()
            .filter(|rel| rel.rel_type.ends_with(SLIDE_REL_SUFFIX))
            .collect();

        let listed = read_file_from_archive(archive, PRESENTATION_PART)
            .and_then(|xml| read_slide_id_list(&xml));

        match listed {
            Ok(ids) if !ids.is_empty() => {
                let targets: HashMap<&str, &str> = slide_rels
                    .iter()
                    .map(|rel| (rel.id.as_str(), rel.target.as_str()))
                    .collect();

                Ok(ids
                    .iter()
                    .filter_map(|id| match targets.get(id.as_str()) {
                        Some(target) => Some(resolve_target("ppt", target)),
                        None => {
                            log::warn!("Slide id {} has no relationship; skipping", id);
                            None
                        }
                    })
                    .collect())
            }
            listed => {
                if let Err(e) = listed {
                    log::debug!("Falling back to relationship order: {}", e);
                }
                Ok(fallback_slide_order(slide_rels))
            }
        }
    }

    /// Load one slide's XML and, best-effort, its notes slide and the
    /// placeholder anchors of its layout and master.
    fn load_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        layouts: &mut HashMap<String, Inherited>,
        path: String,
    ) -> PptxSlide {
        let content = match read_file_from_archive(archive, &path) {
            Ok(xml) => SlidePart::Loaded(xml),
            Err(e) => {
                log::warn!("Unable to read slide part {}: {}", path, e);
                SlidePart::Missing(e.to_string())
            }
        };

        let rels = match part_relationships(archive, &path) {
            Ok(rels) => rels,
            Err(e) => {
                log::debug!("Unable to read relationships of {}: {}", path, e);
                Vec::new()
            }
        };

        let notes_xml = find_related(&rels, &path, NOTES_REL_SUFFIX).and_then(|notes_path| {
            read_file_from_archive(archive, &notes_path)
                .map_err(|e| log::debug!("Unable to read notes for {}: {}", path, e))
                .ok()
        });

        let inherited = match find_related(&rels, &path, LAYOUT_REL_SUFFIX) {
            Some(layout_path) => layouts
                .entry(layout_path)
                .or_insert_with_key(|layout_path| Arc::new(load_inherited(archive, layout_path)))
                .clone(),
            None => Inherited::default(),
        };

        PptxSlide {
            path,
            content,
            notes_xml,
            inherited,
            max_group_depth: self.max_group_depth,
        }
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded PPTX package: slides in presentation order.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    pub slides: Vec<PptxSlide>,
}

/// One slide of a PPTX package, decoded on demand.
#[derive(Debug, Clone)]
pub struct PptxSlide {
    path: String,
    content: SlidePart,
    notes_xml: Option<String>,
    inherited: Inherited,
    max_group_depth: usize,
}

#[derive(Debug, Clone)]
enum SlidePart {
    Loaded(String),
    Missing(String),
}

impl PptxSlide {
    /// Path of the slide part inside the archive.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SlideSource for PptxSlide {
    fn shapes(&self) -> Result<Cow<'_, [Shape]>> {
        match &self.content {
            SlidePart::Loaded(xml) => ShapeDecoder::new(self.max_group_depth)
                .with_inherited(&self.inherited)
                .parse_slide_shapes(xml)
                .map(Cow::Owned)
                .map_err(|e| Error::SlideDecodeError(format!("{}: {}", self.path, e))),
            SlidePart::Missing(reason) => Err(Error::SlideDecodeError(reason.clone())),
        }
    }

    fn title(&self) -> Option<String> {
        match &self.content {
            SlidePart::Loaded(xml) => shapes::slide_name(xml),
            SlidePart::Missing(_) => None,
        }
    }

    fn notes(&self) -> Result<Option<String>> {
        match &self.notes_xml {
            Some(xml) => shapes::notes_text(xml).map(|text| Some(text).filter(|t| !t.is_empty())),
            None => Ok(None),
        }
    }
}

/// Anchors of a layout part and of the master it follows.
///
/// Unreadable parts contribute nothing; the slide's own offsets still apply.
fn load_inherited<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    layout_path: &str,
) -> Vec<PlaceholderAnchors> {
    let mut parts = vec![layout_path.to_string()];
    match part_relationships(archive, layout_path) {
        Ok(rels) => parts.extend(find_related(&rels, layout_path, MASTER_REL_SUFFIX)),
        Err(e) => log::debug!("Unable to read relationships of {}: {}", layout_path, e),
    }

    parts
        .iter()
        .filter_map(|part| {
            read_file_from_archive(archive, part)
                .and_then(|xml| PlaceholderAnchors::from_part(&xml))
                .map_err(|e| log::debug!("Ignoring placeholder anchors of {}: {}", part, e))
                .ok()
        })
        .filter(|anchors| !anchors.is_empty())
        .collect()
}

/// The relationships of a part; a part without a `.rels` has none.
fn part_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> Result<Vec<Relationship>> {
    let rels_path = rels_path_for(part);
    if archive.by_name(&rels_path).is_err() {
        return Ok(Vec::new());
    }
    read_relationships(&read_file_from_archive(archive, &rels_path)?)
}

/// Resolved target of the first relationship whose type ends with `suffix`.
fn find_related(rels: &[Relationship], source_part: &str, suffix: &str) -> Option<String> {
    let base_dir = source_part.rsplit_once('/').map_or("", |(dir, _)| dir);
    rels.iter()
        .find(|rel| rel.rel_type.ends_with(suffix))
        .map(|rel| resolve_target(base_dir, &rel.target))
}

/// An entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

fn read_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                relationships.push(Relationship {
                    id: attribute(e, b"Id").unwrap_or_default(),
                    rel_type: attribute(e, b"Type").unwrap_or_default(),
                    target: attribute(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn read_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Empty(ref e) | Event::Start(ref e)
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // `id` is the numeric slide id; the relationship id is the
                // namespaced `r:id`.
                let rel_id = e
                    .attributes()
                    .flatten()
                    .find(|attr| {
                        attr.key.as_ref().contains(&b':') && local_name(attr.key.as_ref()) == b"id"
                    })
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

fn fallback_slide_order(slide_rels: Vec<Relationship>) -> Vec<String> {
    let mut slides: Vec<(String, Option<usize>)> = slide_rels
        .into_iter()
        .map(|rel| {
            let order_num = extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.target));
            (resolve_target("ppt", &rel.target), order_num)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    slides.into_iter().map(|(path, _)| path).collect()
}

/// Read a file from the ZIP archive.
fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`.
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
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
