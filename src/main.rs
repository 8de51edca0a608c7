// marky 命令行：转换单个文件，输出到终端或写入文件。
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use marky::logging::init_tracing;
use marky::{load_config, Marky};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const CONSOLE_OUTPUT: &str = "console";

/// Marky: convert documents to Markdown / 将文档转换为 Markdown。
#[derive(Debug, Parser)]
#[command(author, version, bin_name = "marky")]
struct Cli {
    /// Input file path / 输入文件路径。
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path, `console` prints to stdout / 输出路径，`console` 表示打印到标准输出。
    #[arg(long, short = 'o', default_value = CONSOLE_OUTPUT)]
    output: String,

    /// Config path / 配置文件路径（默认 config/marky.yaml）。
    #[arg(long = "config")]
    config_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_config(cli.config_path.as_deref());
    init_tracing(&config);
    match run(&cli, &Marky::with_defaults(&config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, marky: &Marky) -> Result<()> {
    if !cli.input.exists() {
        return Err(anyhow!("input file does not exist: {}", cli.input.display()));
    }
    let markdown = marky
        .convert(&cli.input)
        .with_context(|| format!("failed to convert {}", cli.input.display()))?;
    if cli.output == CONSOLE_OUTPUT {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(markdown.as_bytes())?;
        stdout.write_all(b"\n")?;
        return Ok(());
    }
    let output = Path::new(&cli.output);
    write_output(output, &markdown)
        .with_context(|| format!("failed to write {}", output.display()))?;
    eprintln!("Content written to {}", output.display());
    Ok(())
}

fn write_output(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    }
    Ok(())
}
