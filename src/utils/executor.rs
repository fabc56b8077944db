//! docker compose 启动器
//!
//! 所有平台都继承父进程的 stdin/stdout/stderr，退出码原样返回

use crate::error::{EnvInitError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// 在 PATH 中查找外部工具
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name)
        .map_err(|e| EnvInitError::DependencyMissing(format!("{} ({}，请先安装)", name, e)))
}

/// 构造 `docker compose --env-file <env> -f <file>... up -d` 的参数
pub fn compose_up_args(env_file: &Path, compose_files: &[PathBuf]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["compose".into(), "--env-file".into(), env_file.into()];
    for file in compose_files {
        args.push("-f".into());
        args.push(file.into());
    }
    args.push("up".into());
    args.push("-d".into());
    args
}

/// 启动容器
///
/// # 返回
/// docker 进程的退出码
pub fn compose_up(env_file: &Path, compose_files: &[PathBuf]) -> Result<i32> {
    let docker = require_tool("docker")?;
    let args = compose_up_args(env_file, compose_files);
    debug!(program = %docker.display(), ?args, "启动 docker compose");

    let status = Command::new(&docker)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| EnvInitError::CommandFailed(format!("{}: {}", docker.display(), e)))?;

    let code = status.code().unwrap_or(1);
    info!(code, "docker compose 已退出");
    Ok(code)
}
