// 格式转换器：每种格式一个实现，由调度器按注册顺序匹配。
pub mod csv;
pub mod docx;
pub mod epub;
pub mod excel;
pub mod html;
pub mod ipynb;
pub mod pdf;
pub mod pptx;

use crate::error::{ConvertError, Result};
use encoding_rs::{Encoding, GB18030, WINDOWS_1252};
use std::path::Path;
use tracing::warn;

pub use self::csv::CsvConverter;
pub use docx::DocxConverter;
pub use epub::EpubConverter;
pub use excel::ExcelConverter;
pub use html::HtmlConverter;
pub use ipynb::IpynbConverter;
pub use pdf::PdfConverter;
pub use pptx::PptxConverter;

/// 子部件（幻灯片、章节）失败时的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartFailurePolicy {
    /// 任一部件失败即终止整个转换。
    #[default]
    Abort,
    /// 跳过失败部件并记录告警。
    Skip,
}

pub trait Converter: Send + Sync {
    fn name(&self) -> &'static str;

    /// MIME 前缀列表，按前缀匹配。
    fn accepted_mime_types(&self) -> &[&'static str];

    /// 带点的小写扩展名。
    fn accepted_extensions(&self) -> &[&'static str];

    fn part_failure_policy(&self) -> PartFailurePolicy {
        PartFailurePolicy::Abort
    }

    fn load(&self, path: &Path) -> Result<String>;

    fn accepts(&self, mime_type: &str, extension: &str) -> bool {
        crate::mimetypes::is_mime_type_supported(mime_type, self.accepted_mime_types())
            || self
                .accepted_extensions()
                .iter()
                .any(|candidate| *candidate == extension)
    }
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| ConvertError::io(path, err))
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    let data = read_file(path)?;
    Ok(decode_text(&data))
}

/// BOM 优先，其次 UTF-8，再依次尝试 GB18030 与 Windows-1252。
pub(crate) fn decode_text(data: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(data) {
        let (text, _) = encoding.decode_without_bom_handling(&data[bom_len..]);
        return text.into_owned();
    }
    if let Ok(text) = std::str::from_utf8(data) {
        return text.to_string();
    }
    for encoding in [GB18030, WINDOWS_1252] {
        let (text, had_errors) = encoding.decode_without_bom_handling(data);
        if !had_errors {
            warn!("input is not UTF-8, decoded as {}", encoding.name());
            return text.into_owned();
        }
    }
    String::from_utf8_lossy(data).into_owned()
}

/// 默认注册表，顺序即匹配优先级。
pub fn default_converters(config: &crate::config::Config) -> Vec<Box<dyn Converter>> {
    vec![
        Box::new(CsvConverter),
        Box::new(DocxConverter::new(docx::DocxOptions::from_config(&config.docx))),
        Box::new(EpubConverter::default()),
        Box::new(ExcelConverter),
        Box::new(HtmlConverter),
        Box::new(IpynbConverter),
        Box::new(PdfConverter),
        Box::new(PptxConverter::new(pptx::PptxOptions {
            keep_data_uris: config.pptx.keep_data_uris,
            part_failures: PartFailurePolicy::Skip,
        })),
    ]
}
