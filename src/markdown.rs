// Markdown 输出辅助：管道表格、转义与显示宽度。
use unicode_width::UnicodeWidthStr;

/// 把行集渲染为管道表格，第 0 行作为表头并决定列数。
///
/// 缺失的单元格渲染为空，超出表头宽度的单元格被丢弃。
/// 单元格内的换行保持原样。
pub fn to_markdown_table(rows: &[Vec<String>]) -> String {
    let Some(header) = rows.first() else {
        return String::new();
    };
    let columns = header.len();
    if columns == 0 {
        return String::new();
    }
    let mut out = String::new();
    push_row(&mut out, header, columns);
    out.push('|');
    for _ in 0..columns {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in rows.iter().skip(1) {
        push_row(&mut out, row, columns);
    }
    out
}

fn push_row(out: &mut String, row: &[String], columns: usize) {
    out.push('|');
    for index in 0..columns {
        let cell = row.get(index).map(String::as_str).unwrap_or_default();
        out.push(' ');
        out.push_str(&sanitize_table_cell(cell));
        out.push_str(" |");
    }
    out.push('\n');
}

pub fn sanitize_table_cell(cell: &str) -> String {
    cell.trim().replace('|', "\\|")
}

/// 终端显示宽度：CJK 与多数 emoji 记 2，组合符记 0。
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// 在 `chars` 中出现的每个字符前加反斜杠。
pub fn escape(text: &str, chars: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if chars.contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn renders_header_separator_and_rows() {
        let table = to_markdown_table(&rows(&[
            &["Name", "Age"],
            &["John", "30"],
            &["Jane", "25"],
        ]));
        assert_eq!(
            table,
            "| Name | Age |\n| --- | --- |\n| John | 30 |\n| Jane | 25 |\n"
        );
    }

    #[test]
    fn line_count_is_rows_plus_one() {
        let input = rows(&[&["a", "b", "c"], &["1", "2", "3"], &["4", "5", "6"]]);
        let table = to_markdown_table(&input);
        assert_eq!(table.lines().count(), input.len() + 1);
        assert!(table.ends_with('\n'));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(to_markdown_table(&[]), "");
        assert_eq!(to_markdown_table(&[Vec::new(), vec!["x".to_string()]]), "");
    }

    #[test]
    fn ragged_rows_are_padded_and_truncated() {
        let table = to_markdown_table(&rows(&[&["a", "b"], &["1"], &["x", "y", "z"]]));
        assert_eq!(table, "| a | b |\n| --- | --- |\n| 1 |  |\n| x | y |\n");
    }

    #[test]
    fn pipes_are_escaped_and_cells_trimmed() {
        let table = to_markdown_table(&rows(&[&["  a|b  "], &["c || d"]]));
        assert_eq!(table, "| a\\|b |\n| --- |\n| c \\|\\| d |\n");
    }

    #[test]
    fn newlines_inside_cells_are_kept() {
        let table = to_markdown_table(&rows(&[&["head"], &["line1\nline2"]]));
        assert!(table.contains("| line1\nline2 |"));
    }

    #[test]
    fn display_width_counts_wide_characters() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("中文"), 4);
        assert_eq!(display_width("e\u{301}"), 1);
    }

    #[test]
    fn escape_prefixes_listed_characters() {
        assert_eq!(escape("a*b~c\\d", "*~\\"), "a\\*b\\~c\\\\d");
        assert_eq!(escape("[x](y)", "[]"), "\\[x\\](y)");
    }
}
