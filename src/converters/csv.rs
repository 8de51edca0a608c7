use super::{read_text, Converter};
use crate::error::{ConvertError, Result};
use crate::markdown::to_markdown_table;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvConverter;

impl Converter for CsvConverter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn accepted_mime_types(&self) -> &[&'static str] {
        &["text/csv", "application/csv"]
    }

    fn accepted_extensions(&self) -> &[&'static str] {
        &[".csv"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        let text = read_text(path)?;
        let records = parse_records(&text)?;
        Ok(to_markdown_table(&records))
    }
}

/// 解析全部记录；行长度不一致时保留原样，由表格渲染补齐或截断。
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| ConvertError::conversion("csv", err))?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}
