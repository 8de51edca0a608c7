use super::Converter;
use crate::error::{ConvertError, Result};
use crate::markdown::to_markdown_table;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelConverter;

impl Converter for ExcelConverter {
    fn name(&self) -> &'static str {
        "excel"
    }

    fn accepted_mime_types(&self) -> &[&'static str] {
        &[
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/vnd.openxmlformats-officedocument.spreadsheetml",
            "application/vnd.ms-excel",
        ]
    }

    fn accepted_extensions(&self) -> &[&'static str] {
        &[".xlsx", ".xls"]
    }

    // 只转换第一张工作表。
    fn load(&self, path: &Path) -> Result<String> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|err| ConvertError::conversion("spreadsheet", err))?;
        let Some(sheet) = workbook.sheet_names().first().cloned() else {
            return Err(ConvertError::structure(format!(
                "no sheets found in workbook {}",
                path.display()
            )));
        };
        debug!("reading worksheet {sheet}");
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|err| ConvertError::conversion("spreadsheet", err))?;
        Ok(to_markdown_table(&range_rows(&range)))
    }
}

/// 去掉行尾空单元格与空行，再补齐到最宽的行。
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut max_cols = 0;
    for row in range.rows() {
        let mut values = row.iter().map(cell_to_string).collect::<Vec<_>>();
        let Some(last) = values.iter().rposition(|value| !value.trim().is_empty()) else {
            continue;
        };
        values.truncate(last + 1);
        max_cols = max_cols.max(values.len());
        rows.push(values);
    }
    for row in rows.iter_mut() {
        row.resize(max_cols, String::new());
    }
    rows
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.to_string(),
        _ => cell.to_string(),
    }
}
