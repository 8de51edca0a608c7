// EPUB 转换：container.xml → OPF 包 → 按 spine 顺序转换章节。
use super::html::html_to_markdown;
use super::{decode_text, Converter, PartFailurePolicy};
use crate::archive;
use crate::error::{ConvertError, Result};
use crate::xml::{self, XmlNode};
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

const CONTAINER_PART: &str = "META-INF/container.xml";

#[derive(Debug, Clone, Copy)]
pub struct EpubConverter {
    part_failures: PartFailurePolicy,
}

impl Default for EpubConverter {
    fn default() -> Self {
        Self {
            part_failures: PartFailurePolicy::Skip,
        }
    }
}

impl EpubConverter {
    pub fn with_policy(part_failures: PartFailurePolicy) -> Self {
        Self { part_failures }
    }
}

impl Converter for EpubConverter {
    fn name(&self) -> &'static str {
        "epub"
    }

    fn accepted_mime_types(&self) -> &[&'static str] {
        &["application/epub", "application/epub+zip", "application/x-epub+zip"]
    }

    fn accepted_extensions(&self) -> &[&'static str] {
        &[".epub"]
    }

    fn part_failure_policy(&self) -> PartFailurePolicy {
        self.part_failures
    }

    fn load(&self, path: &Path) -> Result<String> {
        let mut archive = archive::open_path(path)?;
        convert_book(&mut archive, self.part_failures)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub creators: Vec<String>,
    pub language: String,
    pub publisher: String,
    pub date: String,
    pub description: String,
    pub identifier: String,
}

impl Metadata {
    fn from_node(node: &XmlNode) -> Self {
        let first = |name: &str| {
            node.children_named(name)
                .map(|child| child.text().trim().to_string())
                .find(|value| !value.is_empty())
                .unwrap_or_default()
        };
        Self {
            title: first("title"),
            creators: node
                .children_named("creator")
                .map(|child| child.text().trim().to_string())
                .filter(|value| !value.is_empty())
                .collect(),
            language: first("language"),
            publisher: first("publisher"),
            date: first("date"),
            description: first("description"),
            identifier: first("identifier"),
        }
    }

    /// 每个非空字段一行，全部为空时返回空串。
    pub fn to_markdown(&self) -> String {
        let mut lines = Vec::new();
        let mut push = |label: &str, value: &str| {
            if !value.is_empty() {
                lines.push(format!("**{label}:** {value}"));
            }
        };
        push("Title", &self.title);
        push("Authors", &self.creators.join(", "));
        push("Language", &self.language);
        push("Publisher", &self.publisher);
        push("Date", &self.date);
        push("Description", &self.description);
        push("Identifier", &self.identifier);
        lines.join("\n")
    }
}

fn convert_book<R: Read + Seek>(archive: &mut ZipArchive<R>, policy: PartFailurePolicy) -> Result<String> {
    let container = archive::read_part(archive, CONTAINER_PART)?
        .ok_or_else(|| ConvertError::structure("container.xml not found"))?;
    let container = xml::parse_bytes(&container, CONTAINER_PART)?;
    let opf_path = container
        .child("rootfiles")
        .and_then(|rootfiles| rootfiles.child("rootfile"))
        .and_then(|rootfile| rootfile.attr("full-path"))
        .map(str::to_string)
        .ok_or_else(|| ConvertError::structure("no rootfiles found in container.xml"))?;

    let package = archive::read_part(archive, &opf_path)?
        .ok_or_else(|| ConvertError::structure(format!("OPF file {opf_path} not found")))?;
    let package = xml::parse_bytes(&package, &opf_path)?;
    let base_dir = opf_path
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default();

    let manifest: HashMap<&str, &str> = package
        .child("manifest")
        .map(|manifest| {
            manifest
                .children_named("item")
                .filter_map(|item| Some((item.attr("id")?, item.attr("href")?)))
                .collect()
        })
        .unwrap_or_default();

    let mut parts = Vec::new();
    let metadata = package
        .child("metadata")
        .map(Metadata::from_node)
        .unwrap_or_default()
        .to_markdown();
    if !metadata.is_empty() {
        parts.push(metadata);
    }

    let spine: Vec<&str> = package
        .child("spine")
        .map(|spine| {
            spine
                .children_named("itemref")
                .filter_map(|itemref| itemref.attr("idref"))
                .collect()
        })
        .unwrap_or_default();
    debug!("epub spine has {} items", spine.len());

    for idref in spine {
        match convert_chapter(archive, &manifest, &base_dir, idref) {
            Ok(Some(markdown)) => parts.push(markdown),
            Ok(None) => {}
            Err(err) if policy == PartFailurePolicy::Skip => {
                warn!("epub chapter skipped: {err}");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(parts.join("\n\n"))
}

fn convert_chapter<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    manifest: &HashMap<&str, &str>,
    base_dir: &str,
    idref: &str,
) -> Result<Option<String>> {
    let href = manifest
        .get(idref)
        .ok_or_else(|| ConvertError::structure(format!("spine item {idref} missing from manifest")))?;
    let href = href.split('#').next().unwrap_or_default();
    let part = archive::resolve_part_path(base_dir, href);
    let data = archive::read_part(archive, &part)?
        .ok_or_else(|| ConvertError::structure(format!("content file {part} not found")))?;
    let markdown = html_to_markdown(&decode_text(&data)).trim().to_string();
    if markdown.is_empty() {
        debug!("epub chapter {part} is empty");
        return Ok(None);
    }
    Ok(Some(markdown))
}
