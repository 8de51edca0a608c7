// 配置读取：YAML 文件 + 环境变量占位符，缺省时回退到默认值。
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_PATH_ENV: &str = "MARKY_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/marky.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub docx: DocxConfig,
    #[serde(default)]
    pub pptx: PptxConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocxConfig {
    #[serde(default = "default_true")]
    pub embed_images: bool,
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
}

impl Default for DocxConfig {
    fn default() -> Self {
        Self {
            embed_images: true,
            image_dir: default_image_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PptxConfig {
    #[serde(default = "default_true")]
    pub keep_data_uris: bool,
}

impl Default for PptxConfig {
    fn default() -> Self {
        Self {
            keep_data_uris: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_image_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// 读取配置：显式路径优先，其次 `MARKY_CONFIG_PATH`，最后是默认路径。
pub fn load_config(path: Option<&Path>) -> Config {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
    };
    let mut value = read_yaml(&path);
    if value.is_null() {
        return Config::default();
    }
    expand_yaml_env(&mut value);
    serde_yaml::from_value::<Config>(value).unwrap_or_else(|err| {
        warn!("config parse failed, using defaults: {}, {err}", path.display());
        Config::default()
    })
}

fn read_yaml(path: &Path) -> Value {
    // 配置文件允许不存在，命令行单次转换不需要任何配置。
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            debug!("config not loaded: {}, {err}", path.display());
            return Value::Null;
        }
    };
    serde_yaml::from_str(&content).unwrap_or_else(|err| {
        warn!("invalid YAML: {}, {err}", path.display());
        Value::Null
    })
}

fn expand_yaml_env(value: &mut Value) {
    match value {
        Value::String(text) => {
            *text = expand_env_placeholders(text);
        }
        Value::Sequence(items) => items.iter_mut().for_each(expand_yaml_env),
        Value::Mapping(map) => {
            for (_, value) in map.iter_mut() {
                expand_yaml_env(value);
            }
        }
        _ => {}
    }
}

fn expand_env_placeholders(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        rest = &rest[start + 2..];
        let Some(end) = rest.find('}') else {
            output.push_str("${");
            output.push_str(rest);
            return output;
        };
        let inner = &rest[..end];
        rest = &rest[end + 1..];
        let (name, fallback) = match inner.split_once(":-") {
            Some((name, fallback)) => (name.trim(), Some(fallback)),
            None => (inner.trim(), None),
        };
        if name.is_empty() {
            output.push_str("${");
            output.push_str(inner);
            output.push('}');
            continue;
        }
        match env::var(name).ok().filter(|value| !value.is_empty()) {
            Some(value) => output.push_str(&value),
            None => output.push_str(fallback.unwrap_or_default()),
        }
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_placeholders() {
        std::env::remove_var("MARKY_TEST_PLACEHOLDER");
        assert_eq!(
            expand_env_placeholders("${MARKY_TEST_PLACEHOLDER:-media}"),
            "media"
        );
        assert_eq!(expand_env_placeholders("a/${MARKY_TEST_PLACEHOLDER}/b"), "a//b");

        std::env::set_var("MARKY_TEST_PLACEHOLDER", "out");
        assert_eq!(
            expand_env_placeholders("${MARKY_TEST_PLACEHOLDER:-media}/images"),
            "out/images"
        );
        std::env::remove_var("MARKY_TEST_PLACEHOLDER");
    }

    #[test]
    fn unterminated_placeholder_is_kept() {
        assert_eq!(expand_env_placeholders("${OPEN"), "${OPEN");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/marky.yaml")));
        assert!(config.docx.embed_images);
        assert!(config.pptx.keep_data_uris);
        assert_eq!(config.observability.log_level, "warn");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marky.yaml");
        fs::write(&path, "docx:\n  embed_images: false\n  image_dir: extracted\n").unwrap();
        let config = load_config(Some(&path));
        assert!(!config.docx.embed_images);
        assert_eq!(config.docx.image_dir, PathBuf::from("extracted"));
        assert!(config.pptx.keep_data_uris);
    }
}
