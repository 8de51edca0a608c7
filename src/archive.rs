// ZIP 容器读取：打开归档、按名读取部件、通配匹配主文档、解析关系表。
use crate::error::{ConvertError, Result};
use crate::xml::{self, XmlNode};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

pub fn open_path(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|err| ConvertError::io(path, err))?;
    Ok(ZipArchive::new(file)?)
}

pub fn open_bytes(data: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    Ok(ZipArchive::new(Cursor::new(data))?)
}

/// 读取部件全部字节；部件不存在时返回 `None`，条目句柄在返回前释放。
pub fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut buffer = Vec::with_capacity(capacity_hint(entry.size()));
    entry
        .read_to_end(&mut buffer)
        .map_err(|err| ConvertError::parse(name, err))?;
    Ok(Some(buffer))
}

// 条目头里的解压大小不可信，预分配设上限。
const MAX_PREALLOC: u64 = 1 << 24;

fn capacity_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

/// `word/document*.xml` 的首个匹配，要求位于 `word/` 顶层。
pub fn find_document_part<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<String> {
    let mut names: Vec<&str> = archive
        .file_names()
        .filter(|name| is_document_part(name))
        .collect();
    names.sort_unstable();
    names.first().map(|name| name.to_string())
}

fn is_document_part(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("word/document") else {
        return false;
    };
    rest.ends_with(".xml") && !rest.contains('/')
}

/// 第一个位于 `prefix` 目录下的条目名。
pub fn first_part_under<R: Read + Seek>(archive: &ZipArchive<R>, prefix: &str) -> Option<String> {
    let mut names: Vec<&str> = archive
        .file_names()
        .filter(|name| name.starts_with(prefix) && !name.ends_with('/'))
        .collect();
    names.sort_unstable();
    names.first().map(|name| name.to_string())
}

/// 把相对目标解析到部件路径：处理 `..`、`.` 与以 `/` 开头的绝对目标。
pub fn resolve_part_path(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|seg| !seg.is_empty()).collect()
    };
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub target: String,
    pub rel_type: String,
    pub external: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn from_node(root: &XmlNode) -> Self {
        let entries = root
            .children_named("Relationship")
            .filter_map(|rel| {
                let id = rel.attr("Id")?;
                Some((
                    id.to_string(),
                    Relationship {
                        target: rel.attr("Target").unwrap_or_default().to_string(),
                        rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                        external: rel
                            .attr("TargetMode")
                            .is_some_and(|mode| mode.eq_ignore_ascii_case("External")),
                    },
                ))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 读取并解析关系部件，部件不存在时返回 `None`。
pub fn read_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> Result<Option<Relationships>> {
    match read_part(archive, part)? {
        Some(data) => Ok(Some(Relationships::from_node(&xml::parse_bytes(&data, part)?))),
        None => Ok(None),
    }
}
