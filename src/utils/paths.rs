//! 路径处理工具 (传统原则：常识性接口设计)

use crate::error::{EnvInitError, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// 下游可能被 shell 插值的字符
const SHELL_METACHARACTERS: &[char] = &[';', '&', '`', '$', '(', ')', '|'];

/// 校验用户提供的目标文件名
///
/// 拒绝 `..` 路径段和 shell 元字符；其余按原样接受（相对或绝对路径均可）。
pub fn validate_destination(name: &str) -> Result<PathBuf> {
    if name.trim().is_empty() {
        return Err(EnvInitError::InvalidDestination("文件名为空".to_string()));
    }

    if name.contains(['\0', '\n', '\r']) {
        return Err(EnvInitError::InvalidDestination(format!(
            "{}: 包含控制字符",
            name.escape_debug()
        )));
    }

    if let Some(c) = name.chars().find(|c| SHELL_METACHARACTERS.contains(c)) {
        return Err(EnvInitError::InvalidDestination(format!(
            "{}: 包含 shell 元字符 '{}'",
            name, c
        )));
    }

    let path = PathBuf::from(name);
    let traverses = path.components().any(|c| matches!(c, Component::ParentDir))
        || name.split(['/', '\\']).any(|segment| segment == "..");
    if traverses {
        return Err(EnvInitError::InvalidDestination(format!(
            "{}: 不允许 '..' 路径段",
            name
        )));
    }

    Ok(path)
}

/// 检查文件是否存在
pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// 读取源文件内容，区分不存在和不可读
pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| EnvInitError::unreadable(path, e))
}

/// 安全写入文件 (同目录临时文件 + 原子替换)
///
/// 失败时临时文件随 `NamedTempFile` 一起删除，目标路径不会出现半写入的内容。
pub fn write_file_safe(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.exists() {
        std::fs::create_dir_all(&parent)?;
    }

    let mut temp = tempfile::Builder::new()
        .prefix(".envinit-")
        .suffix(".tmp")
        .tempfile_in(&parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    debug!(dest = %path.display(), scratch = %temp.path().display(), "原子替换");
    temp.persist(path).map_err(|e| EnvInitError::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_relative_and_absolute_names() {
        assert!(validate_destination(".env").is_ok());
        assert!(validate_destination(".env.dev").is_ok());
        assert!(validate_destination("config/.env").is_ok());
        assert!(validate_destination("/srv/app/.env").is_ok());
        assert!(validate_destination("./.env.local").is_ok());
    }

    #[test]
    fn test_rejects_parent_traversal() {
        for name in ["../.env", "a/../../.env", "..", "a/..", "..\\x"] {
            let err = validate_destination(name).unwrap_err();
            assert!(
                matches!(err, EnvInitError::InvalidDestination(_)),
                "{} 应被拒绝",
                name
            );
        }
    }

    #[test]
    fn test_allows_double_dot_inside_a_name() {
        assert!(validate_destination(".env..bak").is_ok());
    }

    #[test]
    fn test_rejects_shell_metacharacters() {
        for name in [
            ".env;rm", ".env&", ".env`id`", "$HOME/.env", ".env(1)", ".env|tee",
        ] {
            assert!(
                matches!(
                    validate_destination(name),
                    Err(EnvInitError::InvalidDestination(_))
                ),
                "{} 应被拒绝",
                name
            );
        }
    }

    #[test]
    fn test_rejects_empty_and_control_characters() {
        assert!(validate_destination("").is_err());
        assert!(validate_destination("   ").is_err());
        assert!(validate_destination(".env\nX").is_err());
    }

    #[test]
    fn test_write_file_safe_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        write_file_safe(&path, b"A=1\n").unwrap();
        write_file_safe(&path, b"B=2\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "B=2\n");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "不应残留临时文件");
    }

    #[test]
    fn test_write_file_safe_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join(".env");

        write_file_safe(&path, b"X=1\n").unwrap();
        assert!(file_exists(&path));
    }

    #[test]
    fn test_read_file_missing_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, EnvInitError::SourceNotFound(_)));
    }
}
