//! CLI 参数定义

use crate::error::{EnvInitError, Result};
use crate::types::{Config, DEFAULT_COMPOSE_FILE, DEFAULT_ENV_FILE, OverwritePolicy};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// envinit - 从 docker compose 文件生成 .env
#[derive(Parser)]
#[command(
    name = "envinit",
    version,
    about = "从 docker compose 文件生成 .env 骨架",
    long_about = "扫描 compose 文件中的 ${VAR} / ${VAR:-default} 占位符，生成确定性的 .env 文件，并可直接启动 docker compose"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 详细输出模式
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 日志级别 (trace/debug/info/warn/error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 提取变量并输出到标准输出
    Extract {
        #[command(flatten)]
        source: SourceArgs,
        /// 输出格式 (env/json)
        #[arg(long, default_value = "env")]
        format: String,
    },

    /// 生成 .env 文件
    Generate {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        write: WriteArgs,
    },

    /// 确保 .env 可用并启动 docker compose (已有 env 文件不会被覆盖)
    Up {
        #[command(flatten)]
        source: SourceArgs,
        /// env 文件路径
        #[arg(short, long, default_value = DEFAULT_ENV_FILE)]
        output: String,
        /// 重新下载远程 compose 文件
        #[arg(short, long)]
        update: bool,
        /// 远程 compose 文件的本地保存路径
        #[arg(long, default_value = DEFAULT_COMPOSE_FILE)]
        save_as: PathBuf,
    },

    /// 检查 env 文件中是否还有待填写的变量
    Check {
        /// env 文件路径
        #[arg(default_value = DEFAULT_ENV_FILE)]
        file: String,
    },
}

/// 源文件参数
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// compose 文件路径或 http(s) URL
    #[arg(short = 'f', long = "file")]
    pub file: String,
    /// 附加的本地 compose 文件 (同时参与提取和启动)
    #[arg(short, long)]
    pub secondary: Option<PathBuf>,
}

/// 写入参数
#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// 目标 env 文件
    #[arg(short, long, default_value = DEFAULT_ENV_FILE)]
    pub output: String,
    /// 目标已存在时直接覆盖
    #[arg(long)]
    pub force: bool,
    /// 目标已存在时改写到该文件
    #[arg(short, long, conflicts_with = "force")]
    pub alternate: Option<String>,
    /// 重新下载远程 compose 文件
    #[arg(short, long)]
    pub update: bool,
    /// 远程 compose 文件的本地保存路径
    #[arg(long, default_value = DEFAULT_COMPOSE_FILE)]
    pub save_as: PathBuf,
}

impl WriteArgs {
    pub fn to_config(&self, verbose: bool) -> Config {
        Config {
            verbose,
            force: self.force,
            update: self.update,
            alternate: self.alternate.clone(),
            destination: self.output.clone(),
            save_as: self.save_as.clone(),
        }
    }
}

/// 交互式冲突处理的选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Overwrite,
    Alternate,
    Cancel,
}

/// 解析用户对"文件已存在"提示的回答
pub fn parse_choice(answer: &str) -> Result<Choice> {
    match answer.trim().to_lowercase().as_str() {
        "o" | "overwrite" | "y" | "yes" => Ok(Choice::Overwrite),
        "a" | "alternate" => Ok(Choice::Alternate),
        "c" | "cancel" | "n" | "no" | "" => Ok(Choice::Cancel),
        other => Err(EnvInitError::InvalidInput(format!("无效的选项: {}", other))),
    }
}

/// 把选项转换为覆盖策略；`Alternate` 需要附带文件名
pub fn choice_to_policy(choice: Choice, alternate: Option<String>) -> Result<OverwritePolicy> {
    match (choice, alternate) {
        (Choice::Overwrite, _) => Ok(OverwritePolicy::Overwrite),
        (Choice::Alternate, Some(name)) if !name.trim().is_empty() => {
            Ok(OverwritePolicy::CreateAlternate(name.trim().to_string()))
        }
        (Choice::Alternate, _) => Err(EnvInitError::InvalidDestination("文件名为空".to_string())),
        (Choice::Cancel, _) => Err(EnvInitError::Cancelled),
    }
}
