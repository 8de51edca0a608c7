// PPTX 转换：逐张解析幻灯片形状树，单张失败按策略跳过。
use super::{read_file, Converter, PartFailurePolicy};
use crate::archive::{self, Relationships};
use crate::error::{ConvertError, Result};
use crate::xml::{self, XmlNode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const MEDIA_PREFIX: &str = "ppt/media/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PptxOptions {
    /// 图片内联为 base64 data URI；关闭时输出占位文件名。
    pub keep_data_uris: bool,
    pub part_failures: PartFailurePolicy,
}

impl Default for PptxOptions {
    fn default() -> Self {
        Self {
            keep_data_uris: true,
            part_failures: PartFailurePolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PptxConverter {
    options: PptxOptions,
}

impl PptxConverter {
    pub fn new(options: PptxOptions) -> Self {
        Self { options }
    }
}

impl Converter for PptxConverter {
    fn name(&self) -> &'static str {
        "pptx"
    }

    fn accepted_mime_types(&self) -> &[&'static str] {
        &[
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "application/vnd.openxmlformats-officedocument.presentationml",
        ]
    }

    fn accepted_extensions(&self) -> &[&'static str] {
        &[".pptx"]
    }

    fn part_failure_policy(&self) -> PartFailurePolicy {
        self.options.part_failures
    }

    fn load(&self, path: &Path) -> Result<String> {
        let data = read_file(path)?;
        convert_pptx(&data, &self.options)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeTree {
    pub shapes: Vec<Shape>,
    pub pictures: Vec<Picture>,
    pub tables: Vec<Vec<Vec<String>>>,
    pub groups: Vec<ShapeTree>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// 无文本框的形状为 `None`。
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Picture {
    pub name: String,
    pub description: String,
    pub embed: String,
}

#[derive(Debug, Clone, Default)]
pub struct Slide {
    pub number: usize,
    pub tree: ShapeTree,
    pub notes: Option<String>,
    rels: Relationships,
}

pub fn convert_pptx(data: &[u8], options: &PptxOptions) -> Result<String> {
    let mut archive = archive::open_bytes(data)?;
    let presentation = archive::read_part(&mut archive, PRESENTATION_PART)?
        .ok_or_else(|| ConvertError::structure("presentation.xml not found"))?;
    let slide_count = count_slides(&xml::parse_bytes(&presentation, PRESENTATION_PART)?);
    debug!("pptx declares {slide_count} slides");

    let mut slides = Vec::with_capacity(slide_count);
    for number in 1..=slide_count {
        match read_slide(&mut archive, number, options.part_failures)? {
            Some(slide) => slides.push(slide),
            None => continue,
        }
    }

    let mut markdown = String::new();
    for slide in &slides {
        render_slide(&mut archive, slide, options, &mut markdown)?;
    }
    Ok(markdown.trim().to_string())
}

fn count_slides(presentation: &XmlNode) -> usize {
    presentation
        .child("sldIdLst")
        .map(|list| list.children_named("sldId").count())
        .unwrap_or(0)
}

fn read_slide<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    number: usize,
    policy: PartFailurePolicy,
) -> Result<Option<Slide>> {
    let part = format!("ppt/slides/slide{number}.xml");
    let parsed = archive::read_part(archive, &part).and_then(|data| match data {
        Some(data) => xml::parse_bytes(&data, &part).map(Some),
        None => Ok(None),
    });
    let root = match (parsed, policy) {
        (Ok(Some(root)), _) => root,
        (Ok(None), PartFailurePolicy::Skip) => {
            warn!("slide part missing, skipped: {part}");
            return Ok(None);
        }
        (Ok(None), PartFailurePolicy::Abort) => {
            return Err(ConvertError::structure(format!("{part} not found")));
        }
        (Err(err), PartFailurePolicy::Skip) => {
            warn!("slide skipped: {err}");
            return Ok(None);
        }
        (Err(err), PartFailurePolicy::Abort) => return Err(err),
    };

    let rels_part = format!("ppt/slides/_rels/slide{number}.xml.rels");
    let rels = match archive::read_relationships(archive, &rels_part) {
        Ok(rels) => rels.unwrap_or_default(),
        Err(err) => {
            warn!("slide relationships ignored: {err}");
            Relationships::default()
        }
    };

    let tree = root
        .child("cSld")
        .and_then(|data| data.child("spTree"))
        .map(shape_tree)
        .unwrap_or_default();

    Ok(Some(Slide {
        number,
        tree,
        notes: read_notes(archive, number),
        rels,
    }))
}

fn read_notes<R: Read + Seek>(archive: &mut ZipArchive<R>, number: usize) -> Option<String> {
    let part = format!("ppt/notesSlides/notesSlide{number}.xml");
    let data = match archive::read_part(archive, &part) {
        Ok(data) => data?,
        Err(err) => {
            warn!("notes skipped: {err}");
            return None;
        }
    };
    let text = String::from_utf8_lossy(&data);
    let notes = extract_notes_text(&text);
    (!notes.is_empty()).then_some(notes)
}

fn notes_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<a:t>([^<]*)</a:t>").ok())
        .as_ref()
}

/// 备注只抽取 `<a:t>` 文本片段，以空格拼接。
pub fn extract_notes_text(xml: &str) -> String {
    let Some(pattern) = notes_pattern() else {
        return String::new();
    };
    let mut notes = String::new();
    for capture in pattern.captures_iter(xml) {
        let raw = &capture[1];
        let text = quick_xml::escape::unescape(raw)
            .map(|text| text.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        notes.push_str(&text);
        notes.push(' ');
    }
    notes.trim().to_string()
}

fn shape_tree(node: &XmlNode) -> ShapeTree {
    let mut tree = ShapeTree::default();
    for child in &node.children {
        match child.local_name() {
            "sp" => tree.shapes.push(Shape {
                text: child.child("txBody").map(text_body),
            }),
            "pic" => tree.pictures.push(picture(child)),
            "graphicFrame" => tree.tables.push(table_rows(child)),
            "grpSp" => tree.groups.push(shape_tree(child)),
            _ => {}
        }
    }
    tree
}

fn picture(node: &XmlNode) -> Picture {
    let props = node.child("nvPicPr").and_then(|nv| nv.child("cNvPr"));
    let attr = |name: &str| {
        props
            .and_then(|props| props.attr(name))
            .unwrap_or_default()
            .to_string()
    };
    Picture {
        name: attr("name"),
        description: attr("descr"),
        embed: node
            .child("blipFill")
            .and_then(|fill| fill.child("blip"))
            .and_then(|blip| blip.attr("embed"))
            .unwrap_or_default()
            .to_string(),
    }
}

// graphicFrame 也可能承载图表，此时没有 tbl，返回空行集。
fn table_rows(node: &XmlNode) -> Vec<Vec<String>> {
    let table = node
        .child("graphic")
        .and_then(|graphic| graphic.child("graphicData"))
        .and_then(|data| data.child("tbl"));
    let Some(table) = table else {
        return Vec::new();
    };
    table
        .children_named("tr")
        .map(|row| {
            row.children_named("tc")
                .map(|cell| cell.child("txBody").map(text_body).unwrap_or_default())
                .collect()
        })
        .collect()
}

fn text_body(body: &XmlNode) -> String {
    let mut text = String::new();
    for paragraph in body.children_named("p") {
        for run in paragraph.children_named("r") {
            if let Some(t) = run.child("t") {
                text.push_str(&t.content);
            }
        }
        text.push('\n');
    }
    text.trim().to_string()
}

fn render_slide<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    slide: &Slide,
    options: &PptxOptions,
    out: &mut String,
) -> Result<()> {
    out.push_str(&format!("\n\n<!-- Slide number: {} -->\n", slide.number));
    render_tree(archive, slide, &slide.tree, true, options, out)?;
    if let Some(notes) = &slide.notes {
        out.push_str("\n\n### Notes:\n");
        out.push_str(notes);
    }
    Ok(())
}

fn render_tree<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    slide: &Slide,
    tree: &ShapeTree,
    top_level: bool,
    options: &PptxOptions,
    out: &mut String,
) -> Result<()> {
    let mut title_pending = top_level && !tree.shapes.is_empty();
    for text in tree.shapes.iter().filter_map(|shape| shape.text.as_deref()) {
        if text.is_empty() {
            continue;
        }
        if title_pending {
            out.push_str("# ");
            out.push_str(text.trim());
            title_pending = false;
        } else {
            out.push_str(text);
        }
        out.push('\n');
    }
    for picture in &tree.pictures {
        render_picture(archive, slide, picture, options, out)?;
    }
    for rows in &tree.tables {
        out.push_str(&render_table(rows));
    }
    for group in &tree.groups {
        render_tree(archive, slide, group, false, options, out)?;
    }
    Ok(())
}

fn render_picture<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    slide: &Slide,
    picture: &Picture,
    options: &PptxOptions,
    out: &mut String,
) -> Result<()> {
    let source = if picture.description.is_empty() {
        &picture.name
    } else {
        &picture.description
    };
    let alt = clean_alt_text(source);
    let placeholder = format!("{}.jpg", sanitize_filename(&alt));
    if options.keep_data_uris && !picture.embed.is_empty() {
        match (picture_bytes(archive, slide, &picture.embed), options.part_failures) {
            (Ok(Some(bytes)), _) => {
                out.push_str(&format!(
                    "\n![{alt}](data:image/png;base64,{})\n",
                    STANDARD.encode(bytes)
                ));
                return Ok(());
            }
            (Ok(None), _) => {}
            (Err(err), PartFailurePolicy::Skip) => {
                warn!("slide {} picture data skipped: {err}", slide.number);
            }
            (Err(err), PartFailurePolicy::Abort) => return Err(err),
        }
    }
    out.push_str(&format!("\n![{alt}]({placeholder})\n"));
    Ok(())
}

/// 先按幻灯片关系表解析图片，找不到时退回到 `ppt/media/` 下的第一个部件。
fn picture_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    slide: &Slide,
    embed: &str,
) -> Result<Option<Vec<u8>>> {
    if let Some(rel) = slide.rels.get(embed).filter(|rel| !rel.external) {
        let part = archive::resolve_part_path("ppt/slides", &rel.target);
        if let Some(bytes) = archive::read_part(archive, &part)? {
            return Ok(Some(bytes));
        }
        debug!("relationship target missing: {part}");
    }
    match archive::first_part_under(archive, MEDIA_PREFIX) {
        Some(part) => archive::read_part(archive, &part),
        None => Ok(None),
    }
}

fn whitespace_run_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").ok()).as_ref()
}

pub fn clean_alt_text(text: &str) -> String {
    let text = text.replace(['\r', '\n', '[', ']'], " ");
    match whitespace_run_pattern() {
        Some(pattern) => pattern.replace_all(&text, " ").trim().to_string(),
        None => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect()
}

fn render_table(rows: &[Vec<String>]) -> String {
    let Some(header) = rows.first() else {
        return String::new();
    };
    let mut out = String::new();
    push_escaped_row(&mut out, header);
    out.push('|');
    for _ in header {
        out.push_str("---|");
    }
    out.push('\n');
    for row in rows.iter().skip(1) {
        push_escaped_row(&mut out, row);
    }
    out
}

fn push_escaped_row(out: &mut String, row: &[String]) {
    out.push('|');
    for cell in row {
        out.push(' ');
        out.push_str(&html_escape::encode_quoted_attribute(cell));
        out.push_str(" |");
    }
    out.push('\n');
}
