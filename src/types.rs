//! 核心数据结构定义 (表达原则：用数据结构表达逻辑)

use std::path::PathBuf;

/// 默认的 env 文件名
pub const DEFAULT_ENV_FILE: &str = ".env";

/// 远程 compose 文件的默认本地副本
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yaml";

/// 运行配置 (显式传递，不读取任何全局状态)
#[derive(Debug, Clone)]
pub struct Config {
    pub verbose: bool,
    /// 目标文件已存在时直接覆盖
    pub force: bool,
    /// 远程源文件即使已有本地副本也重新下载
    pub update: bool,
    /// 目标文件已存在时改写到该文件
    pub alternate: Option<String>,
    /// 生成的 env 文件路径
    pub destination: String,
    /// 远程源文件的本地保存路径
    pub save_as: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            force: false,
            update: false,
            alternate: None,
            destination: DEFAULT_ENV_FILE.to_string(),
            save_as: PathBuf::from(DEFAULT_COMPOSE_FILE),
        }
    }
}

impl Config {
    /// 根据命令行开关推导覆盖策略；都未指定时返回 None，由调用方询问
    pub fn overwrite_policy(&self) -> Option<OverwritePolicy> {
        if let Some(name) = &self.alternate {
            Some(OverwritePolicy::CreateAlternate(name.clone()))
        } else if self.force {
            Some(OverwritePolicy::Overwrite)
        } else {
            None
        }
    }
}

/// 目标文件已存在时的处理策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// 整体替换现有文件
    Overwrite,
    /// 写入另一个文件，原文件保持不变
    CreateAlternate(String),
}

/// 输出格式类型
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Env,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "j" => OutputFormat::Json,
            _ => OutputFormat::Env,
        }
    }
}
