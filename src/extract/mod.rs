//! 环境变量提取器
//!
//! 从 compose 文件文本中提取占位符，生成确定性的 .env 骨架
//!
//! # 输入
//!
//! ```text
//! services:
//!   db:
//!     environment:
//!       POSTGRES_USER: ${DB_USER}
//!       POSTGRES_PASSWORD: ${DB_PASS:-changeme}
//! ```
//!
//! # 输出
//!
//! ```text
//! DB_PASS=changeme
//! # MANDATORY: DB_USER=[VALUE_NEEDED]
//! ```

pub mod parser;

use crate::types::DEFAULT_COMPOSE_FILE;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 必填变量的占位值
pub const VALUE_NEEDED: &str = "[VALUE_NEEDED]";

/// 必填变量行的前缀
pub const MANDATORY_PREFIX: &str = "# MANDATORY: ";

/// 文本中的一次占位符出现
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    /// `${X}` 为 None，`${X:-}` 为 Some("")
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    DefaultProvided,
    Mandatory,
}

/// 去重后的变量条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableEntry {
    pub name: String,
    pub resolved_value: String,
    pub status: EntryStatus,
}

impl VariableEntry {
    fn from_placeholder(placeholder: Placeholder) -> Self {
        match placeholder.default {
            Some(default) if !default.is_empty() => Self {
                name: placeholder.name,
                resolved_value: default,
                status: EntryStatus::DefaultProvided,
            },
            _ => Self {
                name: placeholder.name,
                resolved_value: VALUE_NEEDED.to_string(),
                status: EntryStatus::Mandatory,
            },
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.status == EntryStatus::Mandatory
    }
}

impl fmt::Display for VariableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            EntryStatus::DefaultProvided => write!(f, "{}={}", self.name, self.resolved_value),
            EntryStatus::Mandatory => write!(f, "{}{}={}", MANDATORY_PREFIX, self.name, VALUE_NEEDED),
        }
    }
}

/// 按变量名字典序排列的 env 文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvDocument {
    /// 源文件类型，用于"未找到变量"提示行
    pub kind: String,
    pub entries: BTreeMap<String, VariableEntry>,
}

impl EnvDocument {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            entries: BTreeMap::new(),
        }
    }

    /// 合并一个占位符
    ///
    /// 同名变量只保留一条：第一个带非空默认值的出现生效，
    /// 没有默认值的出现不会覆盖已有默认值。
    pub fn insert(&mut self, placeholder: Placeholder) {
        let incoming = VariableEntry::from_placeholder(placeholder);
        let keep_existing = match self.entries.get(&incoming.name) {
            Some(existing) => !existing.is_mandatory() || incoming.is_mandatory(),
            None => false,
        };
        if !keep_existing {
            self.entries.insert(incoming.name.clone(), incoming);
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 仍需用户填写的变量
    pub fn mandatory(&self) -> impl Iterator<Item = &VariableEntry> {
        self.entries.values().filter(|e| e.is_mandatory())
    }
}

impl fmt::Display for EnvDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "# No environment variables found in {}", self.kind);
        }
        for entry in self.entries.values() {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// 从 compose 文本提取 env 文档
pub fn extract(source_text: &str) -> EnvDocument {
    extract_all(DEFAULT_COMPOSE_FILE, &[source_text])
}

/// 从多个文档提取并合并，按文档顺序应用去重规则
pub fn extract_all(kind: &str, sources: &[&str]) -> EnvDocument {
    let mut document = EnvDocument::new(kind);
    for text in sources {
        for placeholder in parser::scan(text) {
            document.insert(placeholder);
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_db_user_and_pass() {
        let doc = extract("foo: ${DB_USER}\nbar: ${DB_PASS:-changeme}\nbaz: ${DB_USER}");

        assert_eq!(
            doc.to_string(),
            "DB_PASS=changeme\n# MANDATORY: DB_USER=[VALUE_NEEDED]\n"
        );
    }

    #[test]
    fn test_no_placeholders_yields_sentinel() {
        let doc = extract("services:\n  web:\n    image: nginx\n");

        assert!(doc.is_empty());
        assert_eq!(
            doc.to_string(),
            "# No environment variables found in docker-compose.yaml\n"
        );
    }

    #[test]
    fn test_sentinel_uses_document_kind() {
        let doc = extract_all("compose.prod.yml", &[""]);
        assert_eq!(
            doc.to_string(),
            "# No environment variables found in compose.prod.yml\n"
        );
    }

    #[test]
    fn test_extract_is_idempotent() {
        let source = "a: ${ZETA:-1}\nb: ${ALPHA}\nc: ${MID:-x y z}\n";
        assert_eq!(extract(source).to_string(), extract(source).to_string());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let doc = extract("${c:-3} ${B:-2} ${a:-1} ${_X:-0} ${A1:-9}");
        let names: Vec<&str> = doc.entries.keys().map(String::as_str).collect();

        assert_eq!(names, vec!["A1", "B", "_X", "a", "c"]);
    }

    #[test]
    fn test_dedup_keeps_single_entry() {
        let doc = extract("${X:-a} ${X} ${X:-b} ${X:-}");

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.to_string().lines().count(), 1);
    }

    #[test]
    fn test_first_default_wins() {
        let doc = extract("${X:-a}\n${X:-b}");
        assert_eq!(doc.get("X").unwrap().resolved_value, "a");
    }

    #[test]
    fn test_later_default_fills_mandatory() {
        let doc = extract("${X}\n${X:-later}");

        let entry = doc.get("X").unwrap();
        assert_eq!(entry.status, EntryStatus::DefaultProvided);
        assert_eq!(entry.resolved_value, "later");
    }

    #[test]
    fn test_mandatory_detection() {
        let doc = extract("${BARE} ${EMPTY:-} ${SET:-abc}");

        assert!(doc.get("BARE").unwrap().is_mandatory());
        assert!(doc.get("EMPTY").unwrap().is_mandatory());
        assert_eq!(doc.get("SET").unwrap().to_string(), "SET=abc");
        assert_eq!(doc.mandatory().count(), 2);
    }

    #[test]
    fn test_extract_all_merges_documents_in_order() {
        let primary = "${SHARED:-primary} ${ONLY_PRIMARY}";
        let secondary = "${SHARED:-secondary} ${ONLY_SECONDARY:-2}";
        let doc = extract_all("docker-compose.yaml", &[primary, secondary]);

        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get("SHARED").unwrap().resolved_value, "primary");
        assert_eq!(doc.get("ONLY_SECONDARY").unwrap().resolved_value, "2");
    }

    #[test]
    fn test_multiline_default_keeps_one_entry_per_line() {
        let doc = extract("a: ${X:-line1\nline2}\nb: ${Y:-ok}\n");
        let rendered = doc.to_string();

        assert_eq!(rendered, "Y=ok\n");
        let parsed = crate::config::format::dotenv::DotenvParser::parse(&rendered).unwrap();
        assert_eq!(parsed.values, vec![("Y".to_string(), "ok".to_string())]);
    }

    #[test]
    fn test_json_shape() {
        let doc = extract("${DB_PASS:-changeme}");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["kind"], "docker-compose.yaml");
        assert_eq!(json["entries"]["DB_PASS"]["status"], "default-provided");
        assert_eq!(json["entries"]["DB_PASS"]["resolved_value"], "changeme");
    }
}
