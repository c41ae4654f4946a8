//! Decoding of slide XML (`p:spTree`) into the shape model.
//!
//! The decoder is a recursive descent over quick-xml events: each container
//! element (`spTree`, `grpSp`, `sp`, `tbl`, ...) is consumed by its own
//! function up to its matching end tag. Group nesting is tracked on an
//! explicit stack of open containers and bounded by the decoder's maximum
//! depth; a deeper slide is a decode error for that slide.

use std::collections::HashMap;

use deckmark_core::options::DEFAULT_MAX_GROUP_DEPTH;
use deckmark_core::{
    Cell, Error, Group, Paragraph, Picture, PlaceholderRole, Position, Result, Row, Run, Shape,
    Table, TextBox,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// DrawingML offsets are in EMU; the shape model uses points.
const EMU_PER_POINT: f64 = 12_700.0;

/// `a:rPr@sz` is in hundredths of a point.
const FONT_SIZE_SCALE: f64 = 100.0;

/// `p:ph@type` when the attribute is absent.
const DEFAULT_PLACEHOLDER_TYPE: &str = "obj";

type XmlReader<'a> = Reader<&'a [u8]>;

/// Parse the top-level shapes of a slide (or notes slide) part with the
/// default depth limit and no inherited anchors.
pub fn parse_slide_shapes(xml: &str) -> Result<Vec<Shape>> {
    ShapeDecoder::default().parse_slide_shapes(xml)
}

/// The slide name (`p:cSld@name`), if the part carries one.
pub fn slide_name(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if local_name(e.name().as_ref()) == b"cSld" =>
            {
                return attribute(e, b"name")
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Speaker notes: the text of every body placeholder on the notes slide.
pub fn notes_text(xml: &str) -> Result<String> {
    let shapes = parse_slide_shapes(xml)?;
    let mut parts = Vec::new();
    collect_body_text(&shapes, &mut parts);
    Ok(parts.join("\n").trim().to_string())
}

fn collect_body_text(shapes: &[Shape], out: &mut Vec<String>) {
    let mut pending: Vec<&Shape> = shapes.iter().rev().collect();
    while let Some(shape) = pending.pop() {
        match shape {
            Shape::TextBox(text_box) if text_box.placeholder_role == Some(PlaceholderRole::Body) => {
                out.push(text_box.text());
            }
            Shape::Group(group) => pending.extend(group.children.iter().rev()),
            _ => {}
        }
    }
}

/// How a placeholder names its layout counterpart (`p:ph@type`, `p:ph@idx`).
#[derive(Debug, Clone, Default, PartialEq)]
struct PlaceholderKey {
    kind: Option<String>,
    idx: Option<String>,
}

impl PlaceholderKey {
    fn from_element(e: &BytesStart) -> Self {
        Self {
            kind: attribute(e, b"type"),
            idx: attribute(e, b"idx"),
        }
    }

    fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_PLACEHOLDER_TYPE)
    }

    fn role(&self) -> PlaceholderRole {
        match self.kind() {
            "title" => PlaceholderRole::Title,
            "ctrTitle" => PlaceholderRole::CenteredTitle,
            "body" => PlaceholderRole::Body,
            _ => PlaceholderRole::Other,
        }
    }
}

/// Offsets of the placeholders declared on a slide layout or master.
///
/// Slide placeholders usually omit `a:off` and take their anchor from the
/// layout, which in turn may take it from the master.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderAnchors {
    by_idx: HashMap<String, Position>,
    by_type: HashMap<String, Position>,
}

impl PlaceholderAnchors {
    /// Collect the explicitly positioned placeholders of a layout or master part.
    pub fn from_part(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut anchors = Self::default();
        let mut key = None;
        let mut position = None;
        let mut in_properties = false;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(ref e) => match local_name(e.name().as_ref()) {
                    b"sp" => {
                        key = None;
                        position = None;
                    }
                    b"ph" => key = Some(PlaceholderKey::from_element(e)),
                    b"spPr" => in_properties = true,
                    b"off" if in_properties && position.is_none() => position = offset_y(e),
                    _ => {}
                },
                Event::Empty(ref e) => match local_name(e.name().as_ref()) {
                    b"ph" => key = Some(PlaceholderKey::from_element(e)),
                    b"off" if in_properties && position.is_none() => position = offset_y(e),
                    _ => {}
                },
                Event::End(ref e) => match local_name(e.name().as_ref()) {
                    b"spPr" => in_properties = false,
                    b"sp" => {
                        if let (Some(key), Some(position)) = (key.take(), position.take()) {
                            anchors.insert(key, position);
                        }
                    }
                    _ => {}
                },
                Event::Eof => return Ok(anchors),
                _ => {}
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_idx.is_empty() && self.by_type.is_empty()
    }

    fn insert(&mut self, key: PlaceholderKey, position: Position) {
        self.by_type.entry(key.kind().to_string()).or_insert(position);
        if let Some(idx) = key.idx {
            self.by_idx.entry(idx).or_insert(position);
        }
    }

    /// Match by `idx` first, then by type; a centered title falls back to
    /// the plain title anchor.
    fn lookup(&self, key: &PlaceholderKey) -> Option<Position> {
        key.idx
            .as_ref()
            .and_then(|idx| self.by_idx.get(idx))
            .or_else(|| self.by_type.get(key.kind()))
            .or_else(|| match key.kind() {
                "ctrTitle" => self.by_type.get("title"),
                _ => None,
            })
            .copied()
    }
}

/// A `spTree` or `grpSp` whose closing tag has not been read yet.
#[derive(Debug, Default)]
struct OpenContainer {
    shapes: Vec<Shape>,
    /// Offset from `grpSpPr`.
    position: Option<Position>,
}

impl OpenContainer {
    fn into_shape(self) -> Shape {
        Shape::Group(Group {
            children: self.shapes,
            position: self.position,
        })
    }
}

/// Decodes `p:spTree` parts into shapes.
#[derive(Debug, Clone, Copy)]
pub struct ShapeDecoder<'a> {
    max_group_depth: usize,
    /// Layout anchors first, then master anchors.
    inherited: &'a [PlaceholderAnchors],
}

impl Default for ShapeDecoder<'_> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GROUP_DEPTH)
    }
}

impl<'a> ShapeDecoder<'a> {
    pub fn new(max_group_depth: usize) -> Self {
        Self {
            max_group_depth: max_group_depth.max(1),
            inherited: &[],
        }
    }

    /// Resolve unpositioned placeholders against these parts, nearest first.
    pub fn with_inherited(mut self, inherited: &'a [PlaceholderAnchors]) -> Self {
        self.inherited = inherited;
        self
    }

    /// Parse the top-level shapes of a slide (or notes slide) part.
    pub fn parse_slide_shapes(&self, xml: &str) -> Result<Vec<Shape>> {
        let mut reader = Reader::from_str(xml);

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(ref e) if local_name(e.name().as_ref()) == b"spTree" => {
                    return self.parse_tree(&mut reader);
                }
                Event::Empty(ref e) if local_name(e.name().as_ref()) == b"spTree" => {
                    return Ok(Vec::new());
                }
                Event::Eof => return Err(Error::XmlError("no shape tree in slide".to_string())),
                _ => {}
            }
        }
    }

    /// Parse the children of `spTree` up to its closing tag.
    ///
    /// Nested `grpSp` containers are kept on an explicit stack, innermost
    /// last, so nesting depth costs heap rather than call stack.
    fn parse_tree(&self, reader: &mut XmlReader) -> Result<Vec<Shape>> {
        let mut root = OpenContainer::default();
        let mut groups: Vec<OpenContainer> = Vec::new();

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(ref e) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"sp" => {
                            let shape = self.parse_text_shape(reader)?;
                            groups.last_mut().unwrap_or(&mut root).shapes.push(shape);
                        }
                        b"pic" => {
                            let shape = parse_picture(reader)?;
                            groups.last_mut().unwrap_or(&mut root).shapes.push(shape);
                        }
                        b"grpSp" => {
                            if groups.len() >= self.max_group_depth {
                                return Err(Error::XmlError(format!(
                                    "group nesting exceeds {} levels",
                                    self.max_group_depth
                                )));
                            }
                            groups.push(OpenContainer::default());
                        }
                        b"graphicFrame" => {
                            if let Some(table) = parse_graphic_frame(reader)? {
                                groups.last_mut().unwrap_or(&mut root).shapes.push(table);
                            }
                        }
                        b"grpSpPr" => {
                            let position = parse_offset(reader, b"grpSpPr")?;
                            groups.last_mut().unwrap_or(&mut root).position = position;
                        }
                        // Descend into the fallback branch; the choice may need
                        // extensions we do not understand.
                        b"AlternateContent" | b"Fallback" => {}
                        other => {
                            log::trace!(
                                "Skipping <{}> in shape tree",
                                String::from_utf8_lossy(other)
                            );
                            reader.read_to_end(name).map_err(xml_error)?;
                        }
                    }
                }
                Event::End(ref e) => match local_name(e.name().as_ref()) {
                    b"grpSp" => {
                        let group = groups
                            .pop()
                            .ok_or_else(|| Error::XmlError("unbalanced </grpSp>".to_string()))?;
                        groups
                            .last_mut()
                            .unwrap_or(&mut root)
                            .shapes
                            .push(group.into_shape());
                    }
                    b"spTree" if groups.is_empty() => return Ok(root.shapes),
                    _ => {}
                },
                Event::Eof => return Err(unexpected_eof(b"spTree")),
                _ => {}
            }
        }
    }

    /// `p:sp`: any auto shape or text box. Shapes without a text body still
    /// become (empty) text boxes.
    fn parse_text_shape(&self, reader: &mut XmlReader) -> Result<Shape> {
        let mut text_box = TextBox::default();
        let mut placeholder = None;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(ref e) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"ph" => placeholder = Some(PlaceholderKey::from_element(e)),
                        b"spPr" => text_box.position = parse_offset(reader, b"spPr")?,
                        b"txBody" => text_box.paragraphs = parse_text_body(reader, b"txBody")?,
                        _ => {}
                    }
                }
                Event::Empty(ref e) if local_name(e.name().as_ref()) == b"ph" => {
                    placeholder = Some(PlaceholderKey::from_element(e));
                }
                Event::End(ref e) if local_name(e.name().as_ref()) == b"sp" => break,
                Event::Eof => return Err(unexpected_eof(b"sp")),
                _ => {}
            }
        }

        if let Some(key) = placeholder {
            text_box.placeholder_role = Some(key.role());
            if text_box.position.is_none() {
                text_box.position = self.inherited.iter().find_map(|part| part.lookup(&key));
            }
        }

        Ok(Shape::TextBox(text_box))
    }
}

fn parse_picture(reader: &mut XmlReader) -> Result<Shape> {
    let mut picture = Picture::default();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) if local_name(e.name().as_ref()) == b"spPr" => {
                picture.position = parse_offset(reader, b"spPr")?;
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == b"pic" => {
                return Ok(Shape::Picture(picture));
            }
            Event::Eof => return Err(unexpected_eof(b"pic")),
            _ => {}
        }
    }
}

/// `p:graphicFrame`: only tables are materialized; charts, diagrams and
/// OLE objects carry no text we can use.
fn parse_graphic_frame(reader: &mut XmlReader) -> Result<Option<Shape>> {
    let mut position = None;
    let mut rows = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"xfrm" => position = parse_offset(reader, b"xfrm")?,
                    b"tbl" => rows = Some(parse_table(reader)?),
                    _ => {}
                }
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == b"graphicFrame" => {
                return Ok(rows.map(|rows| Shape::Table(Table { rows, position })));
            }
            Event::Eof => return Err(unexpected_eof(b"graphicFrame")),
            _ => {}
        }
    }
}

fn parse_table(reader: &mut XmlReader) -> Result<Vec<Row>> {
    let mut rows = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) if local_name(e.name().as_ref()) == b"tr" => {
                rows.push(parse_row(reader)?);
            }
            Event::Empty(ref e) if local_name(e.name().as_ref()) == b"tr" => {
                rows.push(Row::default());
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == b"tbl" => return Ok(rows),
            Event::Eof => return Err(unexpected_eof(b"tbl")),
            _ => {}
        }
    }
}

fn parse_row(reader: &mut XmlReader) -> Result<Row> {
    let mut row = Row::default();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) if local_name(e.name().as_ref()) == b"tc" => {
                row.cells.push(parse_cell(reader)?);
            }
            Event::Empty(ref e) if local_name(e.name().as_ref()) == b"tc" => {
                row.cells.push(Cell::default());
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == b"tr" => return Ok(row),
            Event::Eof => return Err(unexpected_eof(b"tr")),
            _ => {}
        }
    }
}

fn parse_cell(reader: &mut XmlReader) -> Result<Cell> {
    let mut cell = Cell::default();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) if local_name(e.name().as_ref()) == b"txBody" => {
                let paragraphs = parse_text_body(reader, b"txBody")?;
                cell.text = paragraphs
                    .iter()
                    .map(Paragraph::text)
                    .collect::<Vec<_>>()
                    .join("\n");
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == b"tc" => return Ok(cell),
            Event::Eof => return Err(unexpected_eof(b"tc")),
            _ => {}
        }
    }
}

fn parse_text_body(reader: &mut XmlReader, end: &[u8]) -> Result<Vec<Paragraph>> {
    let mut paragraphs = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) if local_name(e.name().as_ref()) == b"p" => {
                paragraphs.push(parse_paragraph(reader)?);
            }
            Event::Empty(ref e) if local_name(e.name().as_ref()) == b"p" => {
                paragraphs.push(Paragraph::default());
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == end => return Ok(paragraphs),
            Event::Eof => return Err(unexpected_eof(end)),
            _ => {}
        }
    }
}

fn parse_paragraph(reader: &mut XmlReader) -> Result<Paragraph> {
    let mut paragraph = Paragraph::default();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"r" => paragraph.runs.push(parse_run(reader, b"r")?),
                    b"fld" => paragraph.runs.push(parse_run(reader, b"fld")?),
                    b"br" => {
                        paragraph.runs.push(Run::new("\n"));
                        reader.read_to_end(name).map_err(xml_error)?;
                    }
                    _ => {}
                }
            }
            Event::Empty(ref e) if local_name(e.name().as_ref()) == b"br" => {
                paragraph.runs.push(Run::new("\n"));
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == b"p" => return Ok(paragraph),
            Event::Eof => return Err(unexpected_eof(b"p")),
            _ => {}
        }
    }
}

fn parse_run(reader: &mut XmlReader, end: &[u8]) -> Result<Run> {
    let mut run = Run::default();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) | Event::Empty(ref e) if local_name(e.name().as_ref()) == b"rPr" => {
                run.font_size = attribute(e, b"sz")
                    .and_then(|sz| sz.parse::<f64>().ok())
                    .map(|sz| sz / FONT_SIZE_SCALE);
            }
            Event::Start(ref e) if local_name(e.name().as_ref()) == b"t" => {
                run.text.push_str(&read_text(reader, b"t")?);
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == end => return Ok(run),
            Event::Eof => return Err(unexpected_eof(end)),
            _ => {}
        }
    }
}

fn read_text(reader: &mut XmlReader, end: &[u8]) -> Result<String> {
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Text(e) => text.push_str(&e.unescape().map_err(xml_error)?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(ref e) if local_name(e.name().as_ref()) == end => return Ok(text),
            Event::Eof => return Err(unexpected_eof(end)),
            _ => {}
        }
    }
}

/// Read the first `a:off@y` inside a shape-properties element.
fn parse_offset(reader: &mut XmlReader, end: &[u8]) -> Result<Option<Position>> {
    let mut position = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if position.is_none() && local_name(e.name().as_ref()) == b"off" =>
            {
                position = offset_y(e);
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == end => return Ok(position),
            Event::Eof => return Err(unexpected_eof(end)),
            _ => {}
        }
    }
}

/// `a:off@y`, converted to points.
fn offset_y(e: &BytesStart) -> Option<Position> {
    attribute(e, b"y")
        .and_then(|y| y.parse::<f64>().ok())
        .map(|y| Position { y: y / EMU_PER_POINT })
}

/// Value of the attribute whose local name is `key`.
pub(crate) fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

pub(crate) fn xml_error(e: quick_xml::Error) -> Error {
    Error::XmlError(e.to_string())
}

fn unexpected_eof(element: &[u8]) -> Error {
    Error::XmlError(format!(
        "unexpected end of document inside <{}>",
        String::from_utf8_lossy(element)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    fn slide(tree: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {}><p:cSld name="Intro"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            NS, tree
        )
    }

    fn text_shape(ph: &str, y: u64, body: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Shape"/><p:cNvSpPr/><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="{}"/><a:ext cx="100" cy="100"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
            ph, y, body
        )
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_text_shape_with_placeholder_position_and_runs() {
        let xml = slide(&text_shape(
            r#"<p:ph type="ctrTitle"/>"#,
            127_000,
            r#"<a:p><a:r><a:rPr lang="en-US" sz="4400"/><a:t>Hello </a:t></a:r><a:r><a:t>&amp; welcome</a:t></a:r></a:p><a:p><a:r><a:t>line</a:t></a:r><a:br/><a:r><a:t>break</a:t></a:r></a:p>"#,
        ));
        let shapes = parse_slide_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 1);

        let Shape::TextBox(text_box) = &shapes[0] else {
            panic!("expected a text box, got {:?}", shapes[0]);
        };
        assert_eq!(text_box.placeholder_role, Some(PlaceholderRole::CenteredTitle));
        assert_eq!(text_box.position, Some(Position { y: 10.0 }));
        assert_eq!(text_box.paragraphs[0].runs[0].font_size, Some(44.0));
        assert_eq!(text_box.text(), "Hello & welcome\nline\nbreak");
    }

    #[test]
    fn test_placeholder_types() {
        let xml = slide(&format!(
            "{}{}{}",
            text_shape(r#"<p:ph type="title"/>"#, 0, ""),
            text_shape(r#"<p:ph type="body" idx="1"/>"#, 0, ""),
            text_shape(r#"<p:ph idx="2"/>"#, 0, ""),
        ));
        let roles: Vec<_> = parse_slide_shapes(&xml)
            .unwrap()
            .into_iter()
            .map(|s| match s {
                Shape::TextBox(tb) => tb.placeholder_role,
                _ => None,
            })
            .collect();
        assert_eq!(
            roles,
            vec![
                Some(PlaceholderRole::Title),
                Some(PlaceholderRole::Body),
                Some(PlaceholderRole::Other)
            ]
        );
    }

    #[test]
    fn test_groups_pictures_and_tables() {
        let picture = r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture" descr="logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr><a:xfrm><a:off x="0" y="254000"/><a:ext cx="1" cy="1"/></a:xfrm></p:spPr></p:pic>"#;
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="3" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="635000"/><a:ext cx="1" cy="1"/><a:chOff x="0" y="0"/><a:chExt cx="1" cy="1"/></a:xfrm></p:grpSpPr>{}{}</p:grpSp>"#,
            picture,
            text_shape("", 0, r#"<a:p><a:r><a:t>inside</a:t></a:r></a:p>"#)
        );
        let table = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="5" name="Table"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="1270000"/><a:ext cx="1" cy="1"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1"/><a:tblGrid><a:gridCol w="1"/><a:gridCol w="1"/></a:tblGrid><a:tr h="1"><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>A</a:t></a:r></a:p><a:p><a:r><a:t>A2</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc><a:tc><a:txBody><a:bodyPr/><a:p/></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;
        let chart = r#"<p:graphicFrame><p:xfrm><a:off x="0" y="0"/></p:xfrm><a:graphic><a:graphicData uri="chart"><c:chart xmlns:c="c" r:id="rId9"/></a:graphicData></a:graphic></p:graphicFrame>"#;
        let connector = r#"<p:cxnSp><p:nvCxnSpPr><p:cNvPr id="6" name="Line"/></p:nvCxnSpPr></p:cxnSp>"#;

        let xml = slide(&format!("{}{}{}{}", group, table, chart, connector));
        let shapes = parse_slide_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 2);

        let Shape::Group(group) = &shapes[0] else {
            panic!("expected a group, got {:?}", shapes[0]);
        };
        assert_eq!(group.position, Some(Position { y: 50.0 }));
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[0], Shape::Picture(Picture { position: Some(Position { y: 20.0 }) }));

        let Shape::Table(table) = &shapes[1] else {
            panic!("expected a table, got {:?}", shapes[1]);
        };
        assert_eq!(table.position, Some(Position { y: 100.0 }));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells[0].text, "A\nA2");
        assert_eq!(table.rows[0].cells[1].text, "");
    }

    #[test]
    fn test_alternate_content_uses_fallback() {
        let tree = format!(
            r#"<mc:AlternateContent xmlns:mc="mc"><mc:Choice Requires="p14">{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
            text_shape("", 0, r#"<a:p><a:r><a:t>choice</a:t></a:r></a:p>"#),
            text_shape("", 0, r#"<a:p><a:r><a:t>fallback</a:t></a:r></a:p>"#),
        );
        let shapes = parse_slide_shapes(&slide(&tree)).unwrap();
        assert_eq!(shapes.len(), 1);
        assert!(matches!(&shapes[0], Shape::TextBox(tb) if tb.text() == "fallback"));
    }

    #[test]
    fn test_truncated_slide_is_an_error() {
        let xml = format!(
            r#"<p:sld {}><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>cut"#,
            NS
        );
        assert!(matches!(parse_slide_shapes(&xml), Err(Error::XmlError(_))));
    }

    #[test]
    fn test_missing_shape_tree_is_an_error() {
        assert!(parse_slide_shapes("<p:sld/>").is_err());
    }

    #[test]
    fn test_slide_name() {
        assert_eq!(slide_name(&slide("")), Some("Intro".to_string()));
        assert_eq!(slide_name(r#"<p:sld><p:cSld name="  "/></p:sld>"#), None);
        assert_eq!(slide_name("<p:sld><p:cSld/></p:sld>"), None);
    }

    #[test]
    fn test_notes_text_reads_body_placeholders_only() {
        let xml = slide(&format!(
            "{}{}",
            text_shape(
                r#"<p:ph type="sldImg"/>"#,
                0,
                r#"<a:p><a:r><a:t>image</a:t></a:r></a:p>"#
            ),
            text_shape(
                r#"<p:ph type="body" idx="1"/>"#,
                0,
                r#"<a:p><a:r><a:t>Say hello</a:t></a:r></a:p><a:p><a:r><a:t>then pause</a:t></a:r></a:p>"#
            ),
        ));
        assert_eq!(notes_text(&xml).unwrap(), "Say hello\nthen pause");
    }

    fn nested_groups(levels: usize, inner: &str) -> String {
        format!(
            "{}{}{}",
            "<p:grpSp><p:nvGrpSpPr/><p:grpSpPr/>".repeat(levels),
            inner,
            "</p:grpSp>".repeat(levels)
        )
    }

    #[test]
    fn test_group_nesting_limit() {
        let inner = text_shape("", 0, r#"<a:p><a:r><a:t>deep</a:t></a:r></a:p>"#);
        let xml = slide(&nested_groups(3, &inner));

        let shapes = ShapeDecoder::new(3).parse_slide_shapes(&xml).unwrap();
        let mut shape = &shapes[0];
        for _ in 0..3 {
            let Shape::Group(group) = shape else {
                panic!("expected a group, got {:?}", shape);
            };
            shape = &group.children[0];
        }
        assert!(matches!(shape, Shape::TextBox(tb) if tb.text() == "deep"));

        let err = ShapeDecoder::new(2).parse_slide_shapes(&xml).unwrap_err();
        assert!(err.to_string().contains("group nesting exceeds 2 levels"));
    }

    #[test]
    fn test_runaway_nesting_is_an_error() {
        let xml = slide(&nested_groups(100_000, ""));
        assert!(matches!(parse_slide_shapes(&xml), Err(Error::XmlError(_))));
    }

    #[test]
    fn test_placeholder_anchors_from_layout() {
        let layout = slide(&format!(
            "{}{}{}",
            text_shape(r#"<p:ph type="title"/>"#, 254_000, ""),
            text_shape(r#"<p:ph idx="1"/>"#, 1_270_000, ""),
            r#"<p:sp><p:nvSpPr><p:nvPr><p:ph type="dt" idx="10"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
        ));
        let anchors = PlaceholderAnchors::from_part(&layout).unwrap();

        let title = PlaceholderKey {
            kind: Some("title".into()),
            idx: None,
        };
        let centered = PlaceholderKey {
            kind: Some("ctrTitle".into()),
            idx: None,
        };
        let body = PlaceholderKey {
            kind: Some("body".into()),
            idx: Some("1".into()),
        };
        let date = PlaceholderKey {
            kind: Some("dt".into()),
            idx: Some("10".into()),
        };
        assert_eq!(anchors.lookup(&title), Some(Position { y: 20.0 }));
        assert_eq!(anchors.lookup(&centered), Some(Position { y: 20.0 }));
        assert_eq!(anchors.lookup(&body), Some(Position { y: 100.0 }));
        assert_eq!(anchors.lookup(&date), None);
    }

    #[test]
    fn test_unpositioned_placeholder_inherits_anchor() {
        let unpositioned = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>Agenda</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let xml = slide(&format!(
            "{}{}",
            unpositioned,
            text_shape(r#"<p:ph idx="1"/>"#, 2_540_000, "")
        ));

        let layout = PlaceholderAnchors::from_part(&slide(&text_shape(
            r#"<p:ph type="body" idx="1"/>"#,
            1_270_000,
            "",
        )))
        .unwrap();
        let master = PlaceholderAnchors::from_part(&slide(&text_shape(
            r#"<p:ph type="title"/>"#,
            381_000,
            "",
        )))
        .unwrap();
        let inherited = [layout, master];

        let shapes = ShapeDecoder::default()
            .with_inherited(&inherited)
            .parse_slide_shapes(&xml)
            .unwrap();
        let positions: Vec<_> = shapes.iter().map(Shape::position).collect();
        // The slide's own offset wins over the layout's.
        assert_eq!(
            positions,
            vec![Some(Position { y: 30.0 }), Some(Position { y: 200.0 })]
        );

        let plain = parse_slide_shapes(&xml).unwrap();
        assert_eq!(plain[0].position(), None);
    }
}
