//! envinit 主程序入口
//!
//! 设计原则：
//! - 模块化：入口代码简洁，逻辑委托给各模块
//! - 安静模式：默认只输出结果，成功静默
//! - 错误处理：详细/安静错误模式，通过 --verbose 切换

use clap::Parser;
use envinit::cli::{self, Cli, Commands, SourceArgs};
use envinit::config::format::dotenv::DotenvParser;
use envinit::error::{EnvInitError, Result};
use envinit::source::{self, Fetcher, SourceRef};
use envinit::types::{Config, OutputFormat, OverwritePolicy};
use envinit::utils::{executor, paths};
use envinit::{EnvDocument, Reconciled, extract_all, reconcile_with_existing};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    debug!("envinit v{} starting", env!("CARGO_PKG_VERSION"));

    let verbose = cli.verbose;
    match run_command(cli.command, verbose) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            e.report(verbose);
            std::process::exit(e.exit_code());
        }
    }
}

/// 初始化日志：--log-level > --verbose > ENVINIT_LOG_LEVEL > warn；设置了 RUST_LOG 时以其为准
fn init_logging(cli: &Cli) {
    let level = if let Some(level_str) = &cli.log_level {
        parse_level(level_str)
    } else if cli.verbose {
        Level::DEBUG
    } else {
        let level_str = std::env::var("ENVINIT_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        parse_level(&level_str)
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!("envinit={},reqwest=warn,hyper=warn", level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "无效的日志级别 '{}'，使用 warn。可选: trace, debug, info, warn, error",
                level_str
            );
            Level::WARN
        }
    }
}

/// 运行具体命令，返回进程退出码
fn run_command(command: Commands, verbose: bool) -> Result<i32> {
    match command {
        Commands::Extract { source, format } => {
            let (_, document) = load_document(&source, None)?;

            match OutputFormat::from(format.as_str()) {
                OutputFormat::Env => print!("{}", document),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&document)?),
            }
        }

        Commands::Generate { source, write } => {
            let config = write.to_config(verbose);
            validate_destinations(&config)?;
            let (_, document) = load_document(&source, Some(&config))?;
            let policy = resolve_policy(&config)?;

            let result = reconcile_with_existing(&config.destination, document, &policy)?;
            report_written(&result, verbose);
        }

        Commands::Up {
            source,
            output,
            update,
            save_as,
        } => {
            let config = Config {
                verbose,
                update,
                destination: output,
                save_as,
                ..Config::default()
            };
            return compose_up(&source, &config);
        }

        Commands::Check { file } => {
            let path = PathBuf::from(&file);
            check_env_file(&path)?;
            if verbose {
                println!("✓ {} 中所有变量均已填写", path.display());
            }
        }
    }

    Ok(0)
}

/// 在获取源文件之前校验所有目标文件名，避免下载后才失败
fn validate_destinations(config: &Config) -> Result<()> {
    paths::validate_destination(&config.destination)?;
    if let Some(alternate) = &config.alternate {
        paths::validate_destination(alternate)?;
    }
    Ok(())
}

/// 获取主源文件和可选附加文件，提取合并后的文档
///
/// `config` 为 None 时只读获取：远程源只下载到内存，不使用也不写入本地副本。
fn load_document(
    args: &SourceArgs,
    config: Option<&Config>,
) -> Result<(Vec<PathBuf>, EnvDocument)> {
    let primary = SourceRef::parse(&args.file)?;
    let primary = match config {
        Some(config) => source::acquire(&primary, config)?,
        None => source::read_source(&primary, &Fetcher::new()?)?,
    };
    let kind = primary.kind();
    let mut files = vec![primary.path];
    let mut texts = vec![primary.content];

    if let Some(secondary) = &args.secondary {
        match SourceRef::parse(&secondary.to_string_lossy())? {
            SourceRef::Local(path) => {
                texts.push(paths::read_file(&path)?);
                files.push(path);
            }
            SourceRef::Remote(url) => {
                return Err(EnvInitError::InvalidInput(format!(
                    "附加文件只支持本地路径: {}",
                    url
                )));
            }
        }
    }

    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let document = extract_all(&kind, &refs);
    info!(
        variables = document.len(),
        mandatory = document.mandatory().count(),
        "提取完成"
    );
    Ok((files, document))
}

/// 决定目标文件已存在时的处理方式：命令行开关优先，其次在终端上询问
fn resolve_policy(config: &Config) -> Result<OverwritePolicy> {
    if let Some(policy) = config.overwrite_policy() {
        return Ok(policy);
    }

    let destination = paths::validate_destination(&config.destination)?;
    if !destination.exists() {
        return Ok(OverwritePolicy::Overwrite);
    }

    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Err(EnvInitError::InvalidInput(format!(
            "{} 已存在，请使用 --force 覆盖或 --alternate <文件名> 另存",
            destination.display()
        )));
    }

    let mut input = stdin.lock();
    let answer = prompt(
        &mut input,
        &format!(
            "{} 已存在。[o]覆盖 / [a]另存为 / [c]取消: ",
            destination.display()
        ),
    )?;
    let choice = cli::parse_choice(&answer)?;

    let alternate = if choice == cli::Choice::Alternate {
        Some(prompt(&mut input, "新文件名: ")?)
    } else {
        None
    };
    cli::choice_to_policy(choice, alternate)
}

fn prompt(input: &mut impl BufRead, message: &str) -> Result<String> {
    eprint!("{}", message);
    std::io::stderr().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn report_written(result: &Reconciled, verbose: bool) {
    let path = result.path.display();
    let document = &result.document;
    let mandatory: Vec<&str> = document.mandatory().map(|e| e.name.as_str()).collect();

    if verbose {
        let action = if result.replaced { "已覆盖" } else { "已新建" };
        println!(
            "✓ {} {} ({} 个变量，{} 个待填写)",
            action,
            path,
            document.len(),
            mandatory.len()
        );
    }
    if !mandatory.is_empty() {
        eprintln!("请编辑 {} 填写以下变量: {}", path, mandatory.join(", "));
    }
}

/// 检查 env 文件，仍有待填写变量时报错
fn check_env_file(path: &Path) -> Result<()> {
    let content = paths::read_file(path)?;
    let file = DotenvParser::parse(&content)?;

    if !file.mandatory.is_empty() {
        for name in &file.mandatory {
            println!("{}", name);
        }
        return Err(EnvInitError::InvalidInput(format!(
            "{} 中有 {} 个变量待填写",
            path.display(),
            file.mandatory.len()
        )));
    }
    Ok(())
}

/// env 文件不存在时先生成；没有待填写变量后启动 docker compose
fn compose_up(args: &SourceArgs, config: &Config) -> Result<i32> {
    let env_file = paths::validate_destination(&config.destination)?;
    let (files, document) = load_document(args, Some(config))?;

    if !env_file.exists() {
        let result =
            reconcile_with_existing(&config.destination, document, &OverwritePolicy::Overwrite)?;
        report_written(&result, config.verbose);
    }

    check_env_file(&env_file)?;
    executor::compose_up(&env_file, &files)
}
