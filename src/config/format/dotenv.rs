//! .env 格式解析器 (简单原则：透明的文本解析)

use crate::error::{EnvInitError, Result};
use crate::extract::MANDATORY_PREFIX;

/// 解析后的 env 文件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvFile {
    /// 已赋值的 KEY=VALUE，按文件顺序
    pub values: Vec<(String, String)>,
    /// 仍带 `# MANDATORY:` 标记的变量名
    pub mandatory: Vec<String>,
}

impl EnvFile {
    /// 文件中出现的全部变量名（含必填标记行）
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .map(|(k, _)| k.as_str())
            .chain(self.mandatory.iter().map(String::as_str))
    }
}

/// .env 格式解析器
pub struct DotenvParser;

impl DotenvParser {
    /// 解析 .env 文件内容
    ///
    /// 规则：
    /// - 忽略空行和普通 # 注释
    /// - `# MANDATORY: KEY=[VALUE_NEEDED]` 记为待填写变量
    /// - 格式：KEY=VALUE，VALUE 原样保留（仅去除首尾空白）
    /// - 支持多行值（以 \ 结尾）
    ///
    /// # Errors
    ///
    /// 键名为空时返回 `InvalidInput`。
    pub fn parse(content: &str) -> Result<EnvFile> {
        let mut file = EnvFile::default();

        let lines: Vec<&str> = content.lines().collect();
        let mut line_num = 0;

        while line_num < lines.len() {
            let line = lines[line_num].trim();

            if let Some(rest) = line.strip_prefix(MANDATORY_PREFIX.trim_end()) {
                if let Some((key, _)) = rest.split_once('=') {
                    let key = key.trim();
                    if !key.is_empty() {
                        file.mandatory.push(key.to_string());
                    }
                }
                line_num += 1;
                continue;
            }

            if line.is_empty() || line.starts_with('#') {
                line_num += 1;
                continue;
            }

            let mut value_end = line_num;
            let mut complete_line = line.to_string();

            while complete_line.ends_with('\\') && value_end + 1 < lines.len() {
                complete_line.pop();
                value_end += 1;
                complete_line.push_str(lines[value_end].trim());
            }

            line_num = value_end + 1;

            // 不是 KEY=VALUE 格式的行直接跳过
            if let Some((key, value)) = complete_line.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(EnvInitError::InvalidInput(format!(
                        "空的键名在行 '{complete_line}'"
                    )));
                }
                file.values.push((key.to_string(), value.trim().to_string()));
            }
        }

        Ok(file)
    }
}
