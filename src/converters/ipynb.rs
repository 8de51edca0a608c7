// Jupyter Notebook 转换：markdown 单元原样输出，代码与 raw 单元包进代码块。
use super::{read_text, Converter};
use crate::error::{ConvertError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct IpynbConverter;

impl Converter for IpynbConverter {
    fn name(&self) -> &'static str {
        "ipynb"
    }

    fn accepted_mime_types(&self) -> &[&'static str] {
        &["application/x-ipynb+json", "application/json"]
    }

    fn accepted_extensions(&self) -> &[&'static str] {
        &[".ipynb"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        let text = read_text(path)?;
        let notebook: Notebook =
            serde_json::from_str(&text).map_err(|err| ConvertError::parse(path.display().to_string(), err))?;
        Ok(notebook.to_markdown())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: NotebookMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cell {
    pub cell_type: String,
    #[serde(default)]
    pub source: Source,
}

/// nbformat 允许 `source` 是字符串或字符串数组。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl Source {
    pub fn joined(&self) -> String {
        match self {
            Source::Text(text) => text.clone(),
            Source::Lines(lines) => lines.concat(),
        }
    }
}

impl Notebook {
    pub fn to_markdown(&self) -> String {
        let mut parts = Vec::new();
        let mut title: Option<String> = None;
        for cell in &self.cells {
            let content = cell.source.joined();
            match cell.cell_type.as_str() {
                "markdown" => {
                    if title.is_none() {
                        title = first_heading(&content);
                    }
                    parts.push(content);
                }
                "code" if !content.trim().is_empty() => {
                    parts.push(format!("```python\n{content}\n```"));
                }
                "raw" if !content.trim().is_empty() => {
                    parts.push(format!("```\n{content}\n```"));
                }
                _ => {}
            }
        }
        let title = title.or_else(|| {
            self.metadata
                .title
                .clone()
                .filter(|title| !title.is_empty())
        });
        let markdown = parts.join("\n\n");
        match title {
            Some(title) if !markdown.trim().starts_with("# ") => format!("# {title}\n\n{markdown}"),
            _ => markdown,
        }
    }
}

fn first_heading(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
}
