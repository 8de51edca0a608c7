// WordprocessingML 元素：把通用节点树收敛为渲染所需的封闭变体集合。
use crate::xml::XmlNode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
}

/// 段落属性里影响输出的指令，保持文档顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphDirective {
    /// 左缩进，单位为二十分之一磅。
    Indent(i64),
    Style(String),
    Numbering { num_id: String, level: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Paragraph(Vec<Element>),
    Run {
        format: RunFormat,
        children: Vec<Element>,
    },
    Hyperlink {
        rel_id: Option<String>,
        children: Vec<Element>,
    },
    ParagraphProps {
        directives: Vec<ParagraphDirective>,
        children: Vec<Element>,
    },
    /// 行 → 单元格 → 单元格内容。
    Table(Vec<Vec<Vec<Element>>>),
    Image {
        embed: Option<String>,
    },
    TextBox(Vec<Element>),
    Text(String),
    Fallback,
    Other(Vec<Element>),
}

impl Element {
    pub fn from_node(node: &XmlNode) -> Self {
        match node.local_name() {
            "p" => Element::Paragraph(children_of(node)),
            "r" => Element::Run {
                format: run_format(node),
                children: children_of(node),
            },
            "hyperlink" => Element::Hyperlink {
                rel_id: node.attr("id").map(str::to_string),
                children: children_of(node),
            },
            "pPr" => Element::ParagraphProps {
                directives: paragraph_directives(node),
                children: children_of(node),
            },
            "tbl" => Element::Table(table_rows(node)),
            "blip" => Element::Image {
                embed: node.attr("embed").map(str::to_string),
            },
            "txbxContent" => Element::TextBox(children_of(node)),
            "t" => Element::Text(node.content.clone()),
            "Fallback" => Element::Fallback,
            _ => Element::Other(children_of(node)),
        }
    }

    pub fn is_code_paragraph_props(&self) -> bool {
        match self {
            Element::ParagraphProps { directives, .. } => directives
                .iter()
                .any(|directive| matches!(directive, ParagraphDirective::Style(style) if style == "Code")),
            _ => false,
        }
    }
}

fn children_of(node: &XmlNode) -> Vec<Element> {
    node.children.iter().map(Element::from_node).collect()
}

fn run_format(node: &XmlNode) -> RunFormat {
    let mut format = RunFormat::default();
    for props in node.children_named("rPr") {
        for flag in &props.children {
            let enabled = toggle_enabled(flag);
            match flag.local_name() {
                "b" => format.bold |= enabled,
                "i" => format.italic |= enabled,
                "strike" => format.strike |= enabled,
                _ => {}
            }
        }
    }
    format
}

// <w:b w:val="0"/> 显式关闭格式。
fn toggle_enabled(flag: &XmlNode) -> bool {
    !matches!(flag.attr("val"), Some("0" | "false" | "off"))
}

fn paragraph_directives(node: &XmlNode) -> Vec<ParagraphDirective> {
    let mut directives = Vec::new();
    for child in &node.children {
        match child.local_name() {
            "ind" => {
                let left = child
                    .attr("left")
                    .or_else(|| child.attr("start"))
                    .and_then(|value| value.trim().parse::<i64>().ok());
                if let Some(left) = left {
                    directives.push(ParagraphDirective::Indent(left));
                }
            }
            "pStyle" => {
                if let Some(style) = child.attr("val") {
                    directives.push(ParagraphDirective::Style(style.to_string()));
                }
            }
            "numPr" => {
                let value_of = |name: &str| {
                    child
                        .child(name)
                        .and_then(|item| item.attr("val"))
                        .unwrap_or_default()
                        .to_string()
                };
                directives.push(ParagraphDirective::Numbering {
                    num_id: value_of("numId"),
                    level: value_of("ilvl"),
                });
            }
            _ => {}
        }
    }
    directives
}

fn table_rows(node: &XmlNode) -> Vec<Vec<Vec<Element>>> {
    node.children_named("tr")
        .map(|row| row.children_named("tc").map(children_of).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    #[test]
    fn run_properties_become_format_flags() {
        let node = parse(
            r#"<w:r xmlns:w="w"><w:rPr><w:b/><w:i w:val="0"/><w:strike/></w:rPr><w:t>x</w:t></w:r>"#,
            "part",
        )
        .unwrap();
        let Element::Run { format, children } = Element::from_node(&node) else {
            panic!("expected run");
        };
        assert!(format.bold);
        assert!(!format.italic);
        assert!(format.strike);
        assert_eq!(children[1], Element::Text("x".to_string()));
    }

    #[test]
    fn paragraph_properties_keep_directive_order() {
        let node = parse(
            r#"<w:pPr xmlns:w="w"><w:pStyle w:val="Code"/><w:numPr><w:ilvl w:val="1"/><w:numId w:val="4"/></w:numPr><w:ind w:left="720"/></w:pPr>"#,
            "part",
        )
        .unwrap();
        let element = Element::from_node(&node);
        assert!(element.is_code_paragraph_props());
        let Element::ParagraphProps { directives, .. } = element else {
            panic!("expected paragraph properties");
        };
        assert_eq!(
            directives,
            vec![
                ParagraphDirective::Style("Code".to_string()),
                ParagraphDirective::Numbering {
                    num_id: "4".to_string(),
                    level: "1".to_string()
                },
                ParagraphDirective::Indent(720),
            ]
        );
    }

    #[test]
    fn table_collects_rows_and_cells() {
        let node = parse(
            r#"<w:tbl xmlns:w="w"><w:tblPr/><w:tr><w:tc><w:p/></w:tc><w:tc/></w:tr><w:tr/></w:tbl>"#,
            "part",
        )
        .unwrap();
        let Element::Table(rows) = Element::from_node(&node) else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert!(rows[1].is_empty());
    }

    #[test]
    fn unknown_elements_pass_through() {
        let node = parse(r#"<w:sdt xmlns:w="w"><w:t>inner</w:t></w:sdt>"#, "part").unwrap();
        assert_eq!(
            Element::from_node(&node),
            Element::Other(vec![Element::Text("inner".to_string())])
        );
    }
}
