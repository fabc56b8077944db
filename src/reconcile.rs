//! 生成结果与已有 env 文件的协调
//!
//! 已有文件不做字段级合并：要么整体覆盖，要么写到另一个文件名。

use crate::config::format::dotenv::DotenvParser;
use crate::error::Result;
use crate::extract::EnvDocument;
use crate::types::OverwritePolicy;
use crate::utils::paths;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 协调结果：实际写入的路径和文档
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub path: PathBuf,
    pub document: EnvDocument,
    /// 写入前目标文件是否已存在
    pub replaced: bool,
}

/// 按策略写入生成的文档
///
/// - 目标不存在：直接写入
/// - `Overwrite`：整体替换
/// - `CreateAlternate(name)`：写入 `name`，原文件不动
///
/// 所有写入都经过临时文件 + 原子替换。
pub fn reconcile_with_existing(
    existing_path: &str,
    proposed: EnvDocument,
    policy: &OverwritePolicy,
) -> Result<Reconciled> {
    let existing = paths::validate_destination(existing_path)?;

    if !existing.exists() {
        debug!(path = %existing.display(), "目标文件不存在，直接写入");
        return write(existing, proposed, false);
    }

    match policy {
        OverwritePolicy::Overwrite => {
            log_key_changes(&existing, &proposed);
            write(existing, proposed, true)
        }
        OverwritePolicy::CreateAlternate(name) => {
            let alternate = paths::validate_destination(name)?;
            info!(
                original = %existing.display(),
                alternate = %alternate.display(),
                "保留原文件，写入备用文件"
            );
            let replaced = alternate.exists();
            write(alternate, proposed, replaced)
        }
    }
}

fn write(path: PathBuf, document: EnvDocument, replaced: bool) -> Result<Reconciled> {
    paths::write_file_safe(&path, document.to_string().as_bytes())?;
    info!(path = %path.display(), variables = document.len(), "已写入 env 文件");
    Ok(Reconciled {
        path,
        document,
        replaced,
    })
}

/// 记录覆盖前后变量名的差异；已有文件读不了或解析失败只告警
fn log_key_changes(existing: &Path, proposed: &EnvDocument) {
    let old_keys: BTreeSet<String> = match std::fs::read_to_string(existing)
        .map_err(Into::into)
        .and_then(|content| DotenvParser::parse(&content))
    {
        Ok(file) => file.keys().map(str::to_string).collect(),
        Err(e) => {
            warn!(path = %existing.display(), error = %e, "无法解析已有 env 文件");
            return;
        }
    };
    let new_keys: BTreeSet<String> = proposed.entries.keys().cloned().collect();

    let added: Vec<&String> = new_keys.difference(&old_keys).collect();
    let removed: Vec<&String> = old_keys.difference(&new_keys).collect();

    if !added.is_empty() || !removed.is_empty() {
        info!(?added, ?removed, "覆盖已有 env 文件");
    }
}
