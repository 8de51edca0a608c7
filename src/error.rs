// 转换错误：按失败阶段分类，保留出错的路径或部件名。
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unable to read file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to detect MIME type: unable to read file {}: {source}", path.display())]
    MimeDetection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("{0}")]
    DocumentStructure(String),

    #[error("failed to parse {part}: {message}")]
    Parse { part: String, message: String },

    #[error("no converter found for MIME type: {0}")]
    UnsupportedFormat(String),

    #[error("failed to convert {format}: {message}")]
    Conversion {
        format: &'static str,
        message: String,
    },
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Self::DocumentStructure(message.into())
    }

    pub fn parse(part: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            part: part.into(),
            message: message.to_string(),
        }
    }

    pub fn conversion(format: &'static str, message: impl ToString) -> Self {
        Self::Conversion {
            format,
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IO_ERROR",
            Self::MimeDetection { .. } => "MIME_DETECTION_ERROR",
            Self::Archive(_) => "ARCHIVE_ERROR",
            Self::DocumentStructure(_) => "DOCUMENT_STRUCTURE_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::Conversion { .. } => "CONVERSION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_path() {
        let err = ConvertError::io(
            "/missing/file.docx",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.code(), "IO_ERROR");
        assert!(err.to_string().contains("/missing/file.docx"));
    }

    #[test]
    fn unsupported_format_keeps_mime() {
        let err = ConvertError::UnsupportedFormat("text/plain; charset=utf-8".to_string());
        assert_eq!(
            err.to_string(),
            "no converter found for MIME type: text/plain; charset=utf-8"
        );
    }

    #[test]
    fn parse_error_names_part() {
        let err = ConvertError::parse("word/document.xml", "unexpected end of document");
        assert_eq!(err.code(), "PARSE_ERROR");
        assert!(err.to_string().contains("word/document.xml"));
    }
}
