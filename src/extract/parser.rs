//! 占位符扫描器
//!
//! 识别语法：${VAR} 或 ${VAR:-default}

use crate::extract::Placeholder;
use regex::Regex;
use std::sync::LazyLock;

// 变量名以字母或下划线开头；默认值不能包含 } 或换行
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}\r\n]*))?\}").expect("占位符正则表达式无效")
});

/// 按出现顺序返回文本中所有不重叠的占位符
///
/// 不符合语法的文本（`$VAR`、`${1X}`、`${X:?msg}`、未闭合的 `${X`、跨行的默认值）不算占位符，也不报错。
pub fn scan(content: &str) -> Vec<Placeholder> {
    PLACEHOLDER_PATTERN
        .captures_iter(content)
        .map(|cap| Placeholder {
            name: cap[1].to_string(),
            default: cap.get(2).map(|m| m.as_str().to_string()),
        })
        .collect()
}
