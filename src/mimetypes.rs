// MIME 嗅探：前 512 字节内容特征 + 扩展名消歧。
use crate::error::{ConvertError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const SNIFF_LEN: usize = 512;

pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_XLS: &str = "application/vnd.ms-excel";
pub const MIME_PPT: &str = "application/vnd.ms-powerpoint";
pub const MIME_CSV: &str = "text/csv";
pub const MIME_HTML: &str = "text/html";
pub const MIME_XML: &str = "application/xml";
pub const MIME_IPYNB: &str = "application/x-ipynb+json";
pub const MIME_EPUB: &str = "application/epub+zip";

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
const PDF_SIGNATURE: &[u8] = b"%PDF";
const OLE_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTypeInfo {
    pub mime_type: String,
    pub extension: String,
}

pub fn detect_mime_type(path: &Path) -> Result<MimeTypeInfo> {
    let mut sample = Vec::with_capacity(SNIFF_LEN);
    File::open(path)
        .and_then(|file| file.take(SNIFF_LEN as u64).read_to_end(&mut sample))
        .map_err(|source| ConvertError::MimeDetection {
            path: path.to_path_buf(),
            source,
        })?;
    let extension = file_extension(path);
    let mime_type = detect_from_sample(&sample, &extension);
    debug!("sniffed {}: {mime_type}", path.display());
    Ok(MimeTypeInfo {
        mime_type,
        extension,
    })
}

/// 小写并带点的扩展名，无扩展名时为空串。
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub fn detect_from_sample(sample: &[u8], extension: &str) -> String {
    let sample = &sample[..sample.len().min(SNIFF_LEN)];
    let baseline = detect_content_type(sample);
    refine_mime_type(sample, extension, baseline).to_string()
}

fn refine_mime_type<'a>(sample: &[u8], extension: &str, baseline: &'a str) -> &'a str {
    if sample.starts_with(ZIP_SIGNATURE) {
        match extension {
            ".docx" => return MIME_DOCX,
            ".xlsx" => return MIME_XLSX,
            ".pptx" => return MIME_PPTX,
            ".epub" => return MIME_EPUB,
            _ => {}
        }
    }
    if sample.starts_with(PDF_SIGNATURE) {
        return mime::APPLICATION_PDF.essence_str();
    }
    if sample.starts_with(OLE_SIGNATURE) {
        match extension {
            ".doc" => return MIME_DOC,
            ".xls" => return MIME_XLS,
            ".ppt" => return MIME_PPT,
            _ => {}
        }
    }
    if is_textual(baseline) {
        match extension {
            ".csv" => return MIME_CSV,
            ".html" | ".htm" => return MIME_HTML,
            ".xml" => return MIME_XML,
            ".ipynb" => return MIME_IPYNB,
            _ => {}
        }
    }
    baseline
}

fn is_textual(mime_type: &str) -> bool {
    mime_type
        .parse::<mime::Mime>()
        .map(|parsed| parsed.type_() == mime::TEXT)
        .unwrap_or(false)
}

// 与浏览器嗅探算法同源的精简规则表。
fn detect_content_type(data: &[u8]) -> &'static str {
    let trimmed = skip_leading_whitespace(data);
    if let Some(kind) = sniff_markup(trimmed) {
        return kind;
    }
    for (signature, kind) in EXACT_SIGNATURES {
        if data.starts_with(signature) {
            return kind;
        }
    }
    if data.len() >= 14 && data.starts_with(b"RIFF") && &data[8..14] == b"WEBPVP" {
        return "image/webp";
    }
    if data.iter().any(|byte| is_binary_byte(*byte)) {
        return OCTET_STREAM;
    }
    TEXT_PLAIN_UTF8
}

const EXACT_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN_UTF8),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00asm", "application/wasm"),
];

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

fn sniff_markup(data: &[u8]) -> Option<&'static str> {
    for tag in HTML_TAGS {
        if data.len() <= tag.len() || !data[..tag.len()].eq_ignore_ascii_case(tag) {
            continue;
        }
        // 标签名之后必须是空白或 '>'，避免 <Body> 与 <Bold> 之类误判。
        if matches!(data[tag.len()], b' ' | b'>') {
            return Some("text/html; charset=utf-8");
        }
    }
    if data.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }
    None
}

fn skip_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|byte| !matches!(byte, b'\t' | b'\n' | 0x0C | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn is_binary_byte(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

pub fn is_mime_type_supported(mime_type: &str, supported: &[&str]) -> bool {
    supported
        .iter()
        .any(|candidate| mime_type.starts_with(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_signature_follows_extension() {
        let sample = b"PK\x03\x04\x14\x00\x00\x00";
        assert_eq!(detect_from_sample(sample, ".docx"), MIME_DOCX);
        assert_eq!(detect_from_sample(sample, ".xlsx"), MIME_XLSX);
        assert_eq!(detect_from_sample(sample, ".pptx"), MIME_PPTX);
        assert_eq!(detect_from_sample(sample, ".epub"), MIME_EPUB);
        assert_eq!(detect_from_sample(sample, ".zip"), "application/zip");
    }

    #[test]
    fn pdf_signature_wins_over_extension() {
        assert_eq!(detect_from_sample(b"%PDF-1.7\n", ".txt"), "application/pdf");
        assert_eq!(detect_from_sample(b"%PDF", ""), "application/pdf");
    }

    #[test]
    fn ole_signature_needs_legacy_extension() {
        let mut sample = OLE_SIGNATURE.to_vec();
        sample.extend_from_slice(&[0u8; 32]);
        assert_eq!(detect_from_sample(&sample, ".doc"), MIME_DOC);
        assert_eq!(detect_from_sample(&sample, ".xls"), MIME_XLS);
        assert_eq!(detect_from_sample(&sample, ".ppt"), MIME_PPT);
        assert_eq!(detect_from_sample(&sample, ".bin"), OCTET_STREAM);
    }

    #[test]
    fn textual_content_trusts_extension() {
        assert_eq!(detect_from_sample(b"Name,Age\nJohn,30\n", ".csv"), MIME_CSV);
        assert_eq!(detect_from_sample(b"{\"cells\": []}", ".ipynb"), MIME_IPYNB);
        assert_eq!(detect_from_sample(b"<note></note>", ".xml"), MIME_XML);
        assert_eq!(detect_from_sample(b"<html><body></body></html>", ".htm"), MIME_HTML);
    }

    #[test]
    fn binary_content_ignores_text_extension() {
        assert_eq!(detect_from_sample(b"\x00\x01\x02\x03", ".csv"), OCTET_STREAM);
    }

    #[test]
    fn html_is_sniffed_without_extension() {
        assert_eq!(
            detect_from_sample(b"  <!doctype html>\n<html>", ""),
            "text/html; charset=utf-8"
        );
        assert_eq!(detect_from_sample(b"<bold>", ""), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn empty_sample_is_plain_text() {
        assert_eq!(detect_from_sample(b"", ""), TEXT_PLAIN_UTF8);
        assert_eq!(detect_from_sample(b"", ".docx"), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn only_first_512_bytes_are_inspected() {
        let mut sample = vec![b'a'; SNIFF_LEN];
        sample.push(0x00);
        assert_eq!(detect_from_sample(&sample, ""), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(file_extension(Path::new("/tmp/Report.DOCX")), ".docx");
        assert_eq!(file_extension(Path::new("/tmp/README")), "");
    }

    #[test]
    fn supported_mime_matches_prefix() {
        let supported = ["application/vnd.openxmlformats-officedocument.spreadsheetml"];
        assert!(is_mime_type_supported(MIME_XLSX, &supported));
        assert!(!is_mime_type_supported(MIME_DOCX, &supported));
    }
}
