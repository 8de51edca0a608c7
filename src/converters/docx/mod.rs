// DOCX 转换：关系表 + 编号定义 + 主文档树，逐元素渲染为 Markdown。
mod element;
mod numbering;
mod walker;

pub use element::{Element, ParagraphDirective, RunFormat};
pub use numbering::{LevelFormat, ListCounters, NumberFormat, NumberingDefinitions};

use super::{Converter, PartFailurePolicy};
use crate::archive::{self, Relationships};
use crate::config::DocxConfig;
use crate::error::{ConvertError, Result};
use crate::xml;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;
use walker::Walker;
use zip::ZipArchive;

const RELATIONSHIP_PARTS: &[&str] = &["word/_rels/document.xml.rels", "word/_rels/document2.xml.rels"];
const NUMBERING_PART: &str = "word/numbering.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxOptions {
    /// 图片内联为 base64 data URI；关闭时按关系目标写入磁盘。
    pub embed_images: bool,
    pub image_dir: PathBuf,
}

impl Default for DocxOptions {
    fn default() -> Self {
        Self::from_config(&DocxConfig::default())
    }
}

impl DocxOptions {
    pub fn from_config(config: &DocxConfig) -> Self {
        Self {
            embed_images: config.embed_images,
            image_dir: config.image_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocxConverter {
    options: DocxOptions,
}

impl DocxConverter {
    pub fn new(options: DocxOptions) -> Self {
        Self { options }
    }
}

impl Converter for DocxConverter {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn accepted_mime_types(&self) -> &[&'static str] {
        &[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.openxmlformats-officedocument.wordprocessingml",
            "application/msword",
        ]
    }

    fn accepted_extensions(&self) -> &[&'static str] {
        &[".docx", ".doc"]
    }

    fn part_failure_policy(&self) -> PartFailurePolicy {
        PartFailurePolicy::Abort
    }

    fn load(&self, path: &Path) -> Result<String> {
        let mut archive = archive::open_path(path)?;
        convert_archive(&mut archive, &self.options)
    }
}

pub fn convert_docx(path: &Path, options: &DocxOptions) -> Result<String> {
    let mut archive = archive::open_path(path)?;
    convert_archive(&mut archive, options)
}

pub fn convert_docx_bytes(data: &[u8], options: &DocxOptions) -> Result<String> {
    let mut archive = archive::open_bytes(data)?;
    convert_archive(&mut archive, options)
}

fn convert_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, options: &DocxOptions) -> Result<String> {
    let rels = read_relationships(archive)?;
    let numbering = match archive::read_part(archive, NUMBERING_PART)? {
        Some(data) => NumberingDefinitions::from_node(&xml::parse_bytes(&data, NUMBERING_PART)?),
        None => NumberingDefinitions::default(),
    };
    let part = archive::find_document_part(archive)
        .ok_or_else(|| ConvertError::structure("incorrect document"))?;
    let data = archive::read_part(archive, &part)?
        .ok_or_else(|| ConvertError::structure("incorrect document"))?;
    let root = Element::from_node(&xml::parse_bytes(&data, &part)?);
    debug!("docx main part {part}, {} relationships", rels.len());
    Walker::new(archive, &rels, &numbering, options).render(&root)
}

fn read_relationships<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Relationships> {
    for part in RELATIONSHIP_PARTS {
        if let Some(rels) = archive::read_relationships(archive, part)? {
            return Ok(rels);
        }
    }
    Ok(Relationships::default())
}
