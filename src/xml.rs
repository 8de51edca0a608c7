// 通用 XML 节点树：保留元素顺序、属性与叶子文本。
use crate::error::{ConvertError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// 带前缀的限定名，例如 `w:p`。
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub content: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// 按本地名查找属性，忽略命名空间前缀。
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, local: &str) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|child| child.local_name() == local)
    }

    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children
            .iter()
            .filter(move |child| child.local_name() == local)
    }

    /// 子树全部文本，按文档顺序拼接。
    pub fn text(&self) -> String {
        let mut out = self.content.clone();
        for child in &self.children {
            out.push_str(&child.text());
        }
        out
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

pub fn parse_bytes(data: &[u8], part: &str) -> Result<XmlNode> {
    let text = String::from_utf8_lossy(data);
    parse(text.trim_start_matches('\u{feff}'), part)
}

pub fn parse(xml: &str, part: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(start_node(&reader, &e, part)?);
            }
            Ok(Event::Empty(e)) => {
                let node = start_node(&reader, &e, part)?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::End(_)) => {
                let Some(node) = stack.pop() else {
                    return Err(ConvertError::parse(part, "unexpected closing tag"));
                };
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    let text = e.unescape().map_err(|err| ConvertError::parse(part, err))?;
                    current.content.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .content
                        .push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(ConvertError::parse(part, err)),
        }
        buf.clear();
    }
    if !stack.is_empty() {
        return Err(ConvertError::parse(part, "unexpected end of document"));
    }
    root.ok_or_else(|| ConvertError::parse(part, "no root element"))
}

fn start_node(reader: &Reader<&[u8]>, e: &BytesStart, part: &str) -> Result<XmlNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ConvertError::parse(part, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .decode_and_unescape_value(reader)
            .map_err(|err| ConvertError::parse(part, err))?
            .to_string();
        attrs.push((key, value));
    }
    Ok(XmlNode {
        name,
        attrs,
        ..XmlNode::default()
    })
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}
