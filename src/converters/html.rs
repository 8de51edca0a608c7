use super::{read_text, Converter};
use crate::error::Result;
use html2md::parse_html;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlConverter;

impl Converter for HtmlConverter {
    fn name(&self) -> &'static str {
        "html"
    }

    fn accepted_mime_types(&self) -> &[&'static str] {
        &["text/html"]
    }

    fn accepted_extensions(&self) -> &[&'static str] {
        &[".html", ".htm"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        let text = read_text(path)?;
        Ok(html_to_markdown(&text))
    }
}

pub fn html_to_markdown(html: &str) -> String {
    parse_html(html)
}
