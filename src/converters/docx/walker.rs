// 文档树遍历：按元素种类把内容写入 Markdown 缓冲区。
use super::element::{Element, ParagraphDirective, RunFormat};
use super::numbering::{indent_units, ListCounters, NumberFormat, NumberingDefinitions};
use super::DocxOptions;
use crate::archive::{self, Relationships};
use crate::error::{ConvertError, Result};
use crate::markdown::{display_width, escape, sanitize_table_cell};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fs;
use std::io::{Read, Seek};
use std::path::PathBuf;
use tracing::{debug, warn};
use zip::ZipArchive;

pub struct Walker<'a, R: Read + Seek> {
    archive: &'a mut ZipArchive<R>,
    rels: &'a Relationships,
    numbering: &'a NumberingDefinitions,
    options: &'a DocxOptions,
    counters: ListCounters,
}

impl<'a, R: Read + Seek> Walker<'a, R> {
    pub fn new(
        archive: &'a mut ZipArchive<R>,
        rels: &'a Relationships,
        numbering: &'a NumberingDefinitions,
        options: &'a DocxOptions,
    ) -> Self {
        Self {
            archive,
            rels,
            numbering,
            options,
            counters: ListCounters::default(),
        }
    }

    pub fn render(mut self, root: &Element) -> Result<String> {
        let mut out = String::new();
        self.walk(root, &mut out)?;
        Ok(out)
    }

    fn walk(&mut self, element: &Element, out: &mut String) -> Result<()> {
        match element {
            Element::Paragraph(children) => self.paragraph(children, out)?,
            Element::Run { format, children } => self.run(*format, children, out)?,
            Element::Hyperlink { rel_id, children } => {
                self.hyperlink(rel_id.as_deref(), children, out)?
            }
            Element::ParagraphProps {
                directives,
                children,
            } => {
                self.paragraph_props(directives, out);
                self.walk_all(children, out)?;
            }
            Element::Table(rows) => self.table(rows, out)?,
            Element::Image { embed } => {
                if let Some(embed) = embed {
                    self.image(embed, out)?;
                }
            }
            Element::TextBox(children) => {
                let mut inner = String::new();
                self.walk_all(children, &mut inner)?;
                out.push_str("\n```\n");
                out.push_str(&inner);
                out.push_str("```\n");
            }
            Element::Text(text) => out.push_str(text),
            Element::Fallback => {}
            Element::Other(children) => self.walk_all(children, out)?,
        }
        Ok(())
    }

    fn walk_all(&mut self, children: &[Element], out: &mut String) -> Result<()> {
        for child in children {
            self.walk(child, out)?;
        }
        Ok(())
    }

    fn paragraph(&mut self, children: &[Element], out: &mut String) -> Result<()> {
        // Code 样式：属性之后的段落内容整体包进反引号。
        let code = children.iter().any(Element::is_code_paragraph_props);
        let mut opened = false;
        for child in children {
            if code && !opened && !matches!(child, Element::ParagraphProps { .. }) {
                out.push('`');
                opened = true;
            }
            self.walk(child, out)?;
        }
        if code {
            if !opened {
                out.push('`');
            }
            out.push('`');
        }
        out.push('\n');
        Ok(())
    }

    fn paragraph_props(&mut self, directives: &[ParagraphDirective], out: &mut String) {
        for directive in directives {
            match directive {
                ParagraphDirective::Indent(left) => {
                    out.push_str(&"  ".repeat(indent_units(*left)));
                }
                ParagraphDirective::Style(style) => {
                    if let Some(level) = heading_level(style) {
                        out.push_str(&"#".repeat(level));
                        out.push(' ');
                    }
                }
                ParagraphDirective::Numbering { num_id, level } => {
                    self.numbering_marker(num_id, level, out);
                }
            }
        }
    }

    fn numbering_marker(&mut self, num_id: &str, ilvl: &str, out: &mut String) {
        let level = self.numbering.level(num_id, ilvl);
        out.push_str(&"  ".repeat(level.indent));
        match level.format {
            NumberFormat::Decimal => {
                let ordinal = self.counters.next(num_id, ilvl, level.start);
                out.push_str(&format!("{ordinal}. "));
            }
            NumberFormat::Bullet => out.push_str("* "),
            NumberFormat::Other(_) => {}
        }
    }

    fn run(&mut self, format: RunFormat, children: &[Element], out: &mut String) -> Result<()> {
        let mut inner = String::new();
        self.walk_all(children, &mut inner)?;
        let mut markers = String::new();
        if format.strike {
            markers.push_str("~~");
        }
        if format.bold {
            markers.push_str("**");
        }
        if format.italic {
            markers.push('*');
        }
        out.push_str(&markers);
        out.push_str(&escape(&inner, "*~\\"));
        out.extend(markers.chars().rev());
        Ok(())
    }

    fn hyperlink(
        &mut self,
        rel_id: Option<&str>,
        children: &[Element],
        out: &mut String,
    ) -> Result<()> {
        let mut text = String::new();
        self.walk_all(children, &mut text)?;
        let target = rel_id
            .and_then(|id| self.rels.get(id))
            .map(|rel| escape(&rel.target, "()"))
            .unwrap_or_default();
        out.push('[');
        out.push_str(&escape(&text, "[]"));
        out.push_str("](");
        out.push_str(&target);
        out.push(')');
        Ok(())
    }

    fn image(&mut self, embed: &str, out: &mut String) -> Result<()> {
        let Some(rel) = self.rels.get(embed) else {
            debug!("image relationship not found: {embed}");
            return Ok(());
        };
        if rel.external {
            return Ok(());
        }
        let part = archive::resolve_part_path("word", &rel.target);
        let Some(bytes) = archive::read_part(self.archive, &part)? else {
            warn!("image part missing from archive: {part}");
            return Ok(());
        };
        if self.options.embed_images {
            out.push_str("![](data:image/png;base64,");
            out.push_str(&STANDARD.encode(&bytes));
            out.push(')');
            return Ok(());
        }
        let Some(destination) = self.extract_path(&rel.target) else {
            warn!("image target cannot be placed under image_dir: {}", rel.target);
            return Ok(());
        };
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| ConvertError::io(parent, err))?;
            }
        }
        fs::write(&destination, &bytes).map_err(|err| ConvertError::io(&destination, err))?;
        debug!("image extracted: {}", destination.display());
        out.push_str("![](");
        out.push_str(&escape(&destination.to_string_lossy(), "()"));
        out.push(')');
        Ok(())
    }

    /// 目标先归一化（丢弃 `..` 与盘符），结果必须落在 `image_dir` 之内。
    fn extract_path(&self, target: &str) -> Option<PathBuf> {
        let normalized = archive::resolve_part_path("", &target.replace('\\', "/"));
        let relative: PathBuf = normalized
            .split('/')
            .filter(|segment| !segment.contains(':'))
            .collect();
        if relative.as_os_str().is_empty() {
            return None;
        }
        let root = &self.options.image_dir;
        if root.as_os_str().is_empty() || *root == PathBuf::from(".") {
            return Some(relative);
        }
        let destination = root.join(relative);
        destination.starts_with(root).then_some(destination)
    }

    fn table(&mut self, rows: &[Vec<Vec<Element>>], out: &mut String) -> Result<()> {
        let mut matrix: Vec<Vec<String>> = Vec::new();
        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            for cell in row {
                let mut text = String::new();
                self.walk_all(cell, &mut text)?;
                cells.push(sanitize_table_cell(&text.replace('\n', "")));
            }
            if !cells.is_empty() {
                matrix.push(cells);
            }
        }
        if matrix.is_empty() {
            return Ok(());
        }
        let columns = matrix.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &matrix {
            for (index, cell) in row.iter().enumerate() {
                widths[index] = widths[index].max(display_width(cell));
            }
        }
        for (index, row) in matrix.iter().enumerate() {
            write_table_row(row, &widths, out);
            if index == 0 {
                out.push('|');
                for width in &widths {
                    out.push(' ');
                    out.push_str(&"-".repeat((*width).max(3)));
                    out.push_str(" |");
                }
                out.push('\n');
            }
        }
        out.push('\n');
        Ok(())
    }
}

fn write_table_row(row: &[String], widths: &[usize], out: &mut String) {
    out.push('|');
    for (index, width) in widths.iter().enumerate() {
        let cell = row.get(index).map(String::as_str).unwrap_or_default();
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(width.saturating_sub(display_width(cell))));
        out.push_str(" |");
    }
    out.push('\n');
}

/// `Heading2` 与 `2` 都映射为二级标题。
fn heading_level(style: &str) -> Option<usize> {
    let digits = style.strip_prefix("Heading").unwrap_or(style);
    digits.parse::<usize>().ok().filter(|level| *level > 0)
}
