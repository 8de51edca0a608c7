// Library entrypoint: document-to-Markdown conversion shared by the CLI and the MCP server.
pub mod archive;
pub mod config;
pub mod converters;
pub mod error;
pub mod logging;
pub mod markdown;
pub mod marky;
pub mod mimetypes;
pub mod xml;

pub use config::{load_config, Config};
pub use converters::{Converter, PartFailurePolicy};
pub use error::{ConvertError, Result};
pub use marky::Marky;
pub use mimetypes::{detect_mime_type, MimeTypeInfo};

use std::path::Path;

/// 使用默认注册表转换单个文件。
pub fn convert(path: &Path) -> Result<String> {
    Marky::default().convert(path)
}
