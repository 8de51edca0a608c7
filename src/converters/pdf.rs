use super::Converter;
use crate::error::{ConvertError, Result};
use pdf_extract::extract_text;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfConverter;

impl Converter for PdfConverter {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn accepted_mime_types(&self) -> &[&'static str] {
        &["application/pdf"]
    }

    fn accepted_extensions(&self) -> &[&'static str] {
        &[".pdf"]
    }

    fn load(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ConvertError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            ));
        }
        extract_text(path).map_err(|err| ConvertError::conversion("pdf", err))
    }
}
