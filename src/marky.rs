// 调度器：嗅探类型后按注册顺序挑选第一个接受该文件的转换器。
use crate::config::Config;
use crate::converters::{default_converters, Converter};
use crate::error::{ConvertError, Result};
use crate::mimetypes::detect_mime_type;
use std::path::Path;
use tracing::debug;

pub struct Marky {
    converters: Vec<Box<dyn Converter>>,
}

impl Marky {
    /// 注册表在构造时固定，之后只读。
    pub fn new(converters: Vec<Box<dyn Converter>>) -> Self {
        Self { converters }
    }

    pub fn with_defaults(config: &Config) -> Self {
        Self::new(default_converters(config))
    }

    pub fn converters(&self) -> &[Box<dyn Converter>] {
        &self.converters
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn find_converter(&self, mime_type: &str, extension: &str) -> Option<&dyn Converter> {
        self.converters
            .iter()
            .map(|converter| &**converter)
            .find(|converter| converter.accepts(mime_type, extension))
    }

    pub fn convert(&self, path: &Path) -> Result<String> {
        let info = detect_mime_type(path)?;
        let converter = self
            .find_converter(&info.mime_type, &info.extension)
            .ok_or_else(|| ConvertError::UnsupportedFormat(info.mime_type.clone()))?;
        debug!(
            "dispatching {} ({}, {}) to {}",
            path.display(),
            info.mime_type,
            info.extension,
            converter.name()
        );
        converter.load(path)
    }
}

impl Default for Marky {
    fn default() -> Self {
        Self::with_defaults(&Config::default())
    }
}

impl std::fmt::Debug for Marky {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.converters.iter().map(|converter| converter.name()).collect();
        f.debug_struct("Marky").field("converters", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mimetypes::{MIME_DOCX, MIME_PPTX};

    #[test]
    fn default_registry_has_every_format() {
        let marky = Marky::default();
        assert_eq!(marky.len(), 8);
        assert!(!marky.is_empty());
    }

    #[test]
    fn first_match_wins_by_registration_order() {
        let marky = Marky::default();
        assert_eq!(marky.find_converter(MIME_DOCX, ".docx").map(|c| c.name()), Some("docx"));
        assert_eq!(marky.find_converter(MIME_PPTX, "").map(|c| c.name()), Some("pptx"));
        // application/json 由 ipynb 转换器接受
        assert_eq!(
            marky.find_converter("application/json", ".json").map(|c| c.name()),
            Some("ipynb")
        );
        assert!(marky.find_converter("application/zip", ".zip").is_none());
    }
}
