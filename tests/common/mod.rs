// 测试夹具：在内存中拼装 OOXML/EPUB 压缩包。
#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;
pub const P_NS: &str = r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

pub fn zip_bytes(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        writer
            .start_file(*name, FileOptions::default())
            .expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// 不压缩写入，条目数据在归档中原样可见。
pub fn stored_zip_bytes(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// 翻转存储条目载荷的首字节，使 CRC 校验失败。
pub fn corrupt_payload(archive: &mut [u8], payload: &[u8]) {
    let offset = archive
        .windows(payload.len())
        .position(|window| window == payload)
        .expect("payload present in archive");
    archive[offset] ^= 0xFF;
}

pub fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).expect("write fixture");
    path
}

pub fn docx_document(body: &str) -> String {
    format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {W_NS}><w:body>{body}</w:body></w:document>"#)
}

pub fn docx_paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
}

pub fn relationships(entries: &[(&str, &str, bool)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, target, external) in entries {
        let mode = if *external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="{target}"{mode}/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

pub fn presentation(slide_count: usize) -> String {
    let ids: String = (1..=slide_count)
        .map(|index| format!(r#"<p:sldId id="{}" r:id="rId{index}"/>"#, 255 + index))
        .collect();
    format!(r#"<p:presentation {P_NS}><p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"#)
}

pub fn slide(shapes: &str) -> String {
    format!(r#"<p:sld {P_NS}><p:cSld><p:spTree>{shapes}</p:spTree></p:cSld></p:sld>"#)
}

pub fn text_shape(text: &str) -> String {
    format!("<p:sp><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>")
}

pub fn picture_shape(name: &str, descr: &str, embed: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="{name}" descr="{descr}"/></p:nvPicPr><p:blipFill><a:blip r:embed="{embed}"/></p:blipFill></p:pic>"#
    )
}

pub fn table_shape(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<p:graphicFrame><a:graphic><a:graphicData><a:tbl>");
    for row in rows {
        xml.push_str("<a:tr>");
        for cell in *row {
            xml.push_str(&format!(
                "<a:tc><a:txBody><a:p><a:r><a:t>{cell}</a:t></a:r></a:p></a:txBody></a:tc>"
            ));
        }
        xml.push_str("</a:tr>");
    }
    xml.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
    xml
}
