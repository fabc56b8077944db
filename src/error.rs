//! 错误处理模块 (修复原则：明确抛出异常)

use std::error::Error as _;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvInitError {
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("源文件不存在: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("源文件不可用: {location} ({reason})")]
    SourceUnavailable { location: String, reason: String },

    #[error("无效的目标文件名: {0}")]
    InvalidDestination(String),

    #[error("缺少外部依赖: {0}")]
    DependencyMissing(String),

    #[error("操作已取消")]
    Cancelled,

    #[error("命令执行失败: {0}")]
    CommandFailed(String),

    #[error("文件IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnvInitError {
    /// 读取失败的源文件：不存在归为 `SourceNotFound`，其余归为 `SourceUnavailable`
    pub fn unreadable(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            EnvInitError::SourceNotFound(path.to_path_buf())
        } else {
            EnvInitError::SourceUnavailable {
                location: path.display().to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// 每个错误类别对应的进程退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            EnvInitError::InvalidInput(_) | EnvInitError::Cancelled => 2,
            EnvInitError::SourceNotFound(_) => 3,
            EnvInitError::SourceUnavailable { .. } => 4,
            EnvInitError::InvalidDestination(_) => 5,
            EnvInitError::DependencyMissing(_) => 6,
            EnvInitError::CommandFailed(_) | EnvInitError::Io(_) | EnvInitError::Json(_) => 1,
        }
    }

    /// 报告错误，支持详细/安静模式
    /// verbose = true: 详细错误链
    /// verbose = false: 关键信息
    pub fn report(&self, verbose: bool) {
        if verbose {
            eprintln!("❌ 错误: {}", self);

            if let Some(source) = self.source() {
                eprintln!("  └─ 原因: {}", source);
                let mut current = source.source();
                while let Some(next) = current {
                    eprintln!("     └─ {}", next);
                    current = next.source();
                }
            }
        } else {
            match self {
                EnvInitError::SourceNotFound(path) => {
                    eprintln!("文件不存在: {}", path.display())
                }
                EnvInitError::SourceUnavailable { location, .. } => {
                    eprintln!("无法获取源文件: {}", location)
                }
                EnvInitError::InvalidDestination(name) => eprintln!("无效的目标文件名: {}", name),
                EnvInitError::DependencyMissing(tool) => eprintln!("未找到依赖: {}", tool),
                EnvInitError::Io(err) => eprintln!("文件错误: {}", err),
                _ => eprintln!("错误: {}", self),
            }
        }
    }
}

/// 简化 Result 类型别名
pub type Result<T> = std::result::Result<T, EnvInitError>;
