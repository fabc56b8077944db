//! envinit - docker compose 环境变量初始化工具
//!
//! 流程：获取源文件 → 提取占位符 → 去重/分类/排序 → 与已有 .env 协调 → (可选) 启动容器

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod reconcile;
pub mod source;
pub mod types;
pub mod utils;

// 重新导出常用类型
pub use error::{EnvInitError, Result};
pub use extract::{EnvDocument, EntryStatus, Placeholder, VariableEntry, extract, extract_all};
pub use reconcile::{Reconciled, reconcile_with_existing};
pub use types::{Config, OverwritePolicy};
