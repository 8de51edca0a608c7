// 日志初始化：RUST_LOG 优先，其次配置中的级别；统一输出到 stderr。
use crate::config::Config;
use tracing_subscriber::EnvFilter;

pub fn init_tracing(config: &Config) {
    let default_level = config.observability.log_level.trim();
    let default_level = if default_level.is_empty() {
        "warn".to_string()
    } else {
        default_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
