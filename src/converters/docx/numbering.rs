// 编号定义：numId → abstractNumId → 各层级格式，遍历前一次性构建。
use crate::xml::XmlNode;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberFormat {
    Decimal,
    Bullet,
    Other(String),
}

impl NumberFormat {
    fn parse(value: &str) -> Self {
        match value {
            "decimal" | "decimalFullWidth" | "aiueoFullWidth" => NumberFormat::Decimal,
            "bullet" => NumberFormat::Bullet,
            other => NumberFormat::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFormat {
    pub format: NumberFormat,
    pub start: u32,
    /// 缩进单位数（每 360 个二十分之一磅计一级）。
    pub indent: usize,
}

impl Default for LevelFormat {
    fn default() -> Self {
        Self {
            format: NumberFormat::Other(String::new()),
            start: 1,
            indent: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberingDefinitions {
    instances: HashMap<String, String>,
    abstracts: HashMap<String, HashMap<String, LevelFormat>>,
}

impl NumberingDefinitions {
    pub fn from_node(root: &XmlNode) -> Self {
        let mut definitions = Self::default();
        for abstract_num in root.children_named("abstractNum") {
            let Some(id) = abstract_num.attr("abstractNumId") else {
                continue;
            };
            let levels = abstract_num
                .children_named("lvl")
                .filter_map(|level| {
                    let ilvl = level.attr("ilvl")?;
                    Some((ilvl.to_string(), level_format(level)))
                })
                .collect();
            definitions.abstracts.insert(id.to_string(), levels);
        }
        for num in root.children_named("num") {
            let Some(num_id) = num.attr("numId") else {
                continue;
            };
            if let Some(abstract_id) = num.child("abstractNumId").and_then(|node| node.attr("val")) {
                definitions
                    .instances
                    .insert(num_id.to_string(), abstract_id.to_string());
            }
        }
        definitions
    }

    /// 未定义的编号或层级返回默认格式（不输出任何标记）。
    pub fn level(&self, num_id: &str, ilvl: &str) -> LevelFormat {
        self.instances
            .get(num_id)
            .and_then(|abstract_id| self.abstracts.get(abstract_id))
            .and_then(|levels| levels.get(ilvl))
            .cloned()
            .unwrap_or_default()
    }
}

fn level_format(level: &XmlNode) -> LevelFormat {
    let mut format = LevelFormat::default();
    if let Some(start) = level
        .child("start")
        .and_then(|node| node.attr("val"))
        .and_then(|value| value.parse::<u32>().ok())
    {
        format.start = start;
    }
    if let Some(kind) = level.child("numFmt").and_then(|node| node.attr("val")) {
        format.format = NumberFormat::parse(kind);
    }
    if let Some(left) = level
        .child("pPr")
        .and_then(|props| props.child("ind"))
        .and_then(|ind| ind.attr("left").or_else(|| ind.attr("start")))
        .and_then(|value| value.parse::<i64>().ok())
    {
        format.indent = indent_units(left);
    }
    format
}

pub fn indent_units(twips: i64) -> usize {
    if twips > 0 {
        (twips / 360) as usize
    } else {
        0
    }
}

/// 有序列表计数器：键为 (numId, ilvl)，每次转换新建。
#[derive(Debug, Default)]
pub struct ListCounters {
    counters: HashMap<(String, String), u32>,
}

impl ListCounters {
    pub fn next(&mut self, num_id: &str, ilvl: &str, start: u32) -> u32 {
        let counter = self
            .counters
            .entry((num_id.to_string(), ilvl.to_string()))
            .and_modify(|value| *value += 1)
            .or_insert(start);
        *counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    const NUMBERING: &str = r#"<w:numbering xmlns:w="w">
        <w:abstractNum w:abstractNumId="0">
            <w:lvl w:ilvl="0"><w:start w:val="3"/><w:numFmt w:val="decimal"/><w:pPr><w:ind w:left="720"/></w:pPr></w:lvl>
            <w:lvl w:ilvl="1"><w:numFmt w:val="bullet"/></w:lvl>
        </w:abstractNum>
        <w:num w:numId="7"><w:abstractNumId w:val="0"/></w:num>
    </w:numbering>"#;

    #[test]
    fn resolves_instance_through_abstract_definition() {
        let definitions = NumberingDefinitions::from_node(&parse(NUMBERING, "word/numbering.xml").unwrap());
        let level = definitions.level("7", "0");
        assert_eq!(level.format, NumberFormat::Decimal);
        assert_eq!(level.start, 3);
        assert_eq!(level.indent, 2);
        assert_eq!(definitions.level("7", "1").format, NumberFormat::Bullet);
        assert_eq!(definitions.level("8", "0"), LevelFormat::default());
    }

    #[test]
    fn counters_start_at_level_start_and_are_keyed_by_level() {
        let mut counters = ListCounters::default();
        assert_eq!(counters.next("1", "0", 1), 1);
        assert_eq!(counters.next("1", "0", 1), 2);
        assert_eq!(counters.next("1", "1", 5), 5);
        assert_eq!(counters.next("2", "0", 1), 1);
        assert_eq!(counters.next("1", "0", 1), 3);
    }
}
