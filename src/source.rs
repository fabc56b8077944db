//! compose 源文件获取
//!
//! 源可以是本地路径或 HTTP(S) URL。URL 在发起请求前先做格式校验；
//! `acquire` 把下载内容先写入临时文件，成功后才原子替换到最终路径；
//! `read_source` 只在内存中使用，不落盘。

use crate::error::{EnvInitError, Result};
use crate::types::{Config, DEFAULT_COMPOSE_FILE};
use crate::utils::paths;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::[0-9]{1,5})?(?:[/?#]\S*)?$",
    )
    .expect("URL 正则表达式无效")
});

const FETCH_ATTEMPTS: u32 = 3;
const FETCH_PAUSE: Duration = Duration::from_secs(2);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// 源文件引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    Local(PathBuf),
    Remote(String),
}

impl SourceRef {
    /// 解析命令行给出的源：`http://`/`https://` 开头按 URL 校验，其余视为本地路径
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(EnvInitError::InvalidInput("未指定源文件".to_string()));
        }

        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            if !URL_PATTERN.is_match(input) {
                return Err(EnvInitError::InvalidInput(format!("无效的 URL: {}", input)));
            }
            return Ok(SourceRef::Remote(input.to_string()));
        }

        if input.contains("://") {
            return Err(EnvInitError::InvalidInput(format!(
                "不支持的协议: {} (仅支持 http/https)",
                input
            )));
        }

        Ok(SourceRef::Local(PathBuf::from(input)))
    }
}

/// 已获取的源文件
#[derive(Debug, Clone)]
pub struct Acquired {
    /// 本地路径（远程源为保存后的副本）
    pub path: PathBuf,
    pub content: String,
}

impl Acquired {
    /// 源文件类型，用于"未找到变量"提示
    pub fn kind(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_COMPOSE_FILE.to_string())
    }
}

/// HTTP 下载器 (固定重试次数)
pub struct Fetcher {
    client: reqwest::blocking::Client,
    attempts: u32,
    pause: Duration,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_policy(FETCH_ATTEMPTS, FETCH_PAUSE)
    }

    pub fn with_policy(attempts: u32, pause: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| EnvInitError::CommandFailed(format!("无法创建 HTTP 客户端: {}", e)))?;
        Ok(Self {
            client,
            attempts: attempts.max(1),
            pause,
        })
    }

    /// 下载 URL 到内存，按固定次数重试
    pub fn fetch(&self, url: &str) -> Result<String> {
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            debug!(url, attempt, "下载源文件");
            match self.fetch_once(url) {
                Ok(body) => return Ok(body),
                Err(reason) => {
                    warn!(url, attempt, %reason, "下载失败");
                    last_error = reason;
                    if attempt < self.attempts {
                        std::thread::sleep(self.pause);
                    }
                }
            }
        }

        Err(EnvInitError::SourceUnavailable {
            location: url.to_string(),
            reason: last_error,
        })
    }

    /// 下载 URL 到 `dest`；任何失败都不会留下目标文件或临时文件
    pub fn fetch_to(&self, url: &str, dest: &Path) -> Result<String> {
        let body = self.fetch(url)?;
        paths::write_file_safe(dest, body.as_bytes())?;
        info!(url, path = %dest.display(), bytes = body.len(), "源文件已下载");
        Ok(body)
    }

    fn fetch_once(&self, url: &str) -> std::result::Result<String, String> {
        let response = self.client.get(url).send().map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let body = response.text().map_err(|e| e.to_string())?;
        if body.trim().is_empty() {
            return Err("响应内容为空".to_string());
        }

        Ok(body)
    }
}

/// 按配置获取源文件内容
///
/// 远程源保存到 `config.save_as`；已有本地副本时，除非 `config.update`，否则不重新下载。
pub fn acquire(source: &SourceRef, config: &Config) -> Result<Acquired> {
    match source {
        SourceRef::Local(path) => {
            let content = paths::read_file(path)?;
            Ok(Acquired {
                path: path.clone(),
                content,
            })
        }
        SourceRef::Remote(url) => {
            let dest = paths::validate_destination(&config.save_as.to_string_lossy())?;

            if paths::file_exists(&dest) && !config.update {
                info!(path = %dest.display(), "使用已有的本地副本 (使用 --update 重新下载)");
                let content = paths::read_file(&dest)?;
                return Ok(Acquired {
                    path: dest,
                    content,
                });
            }

            let content = Fetcher::new()?.fetch_to(url, &dest)?;
            Ok(Acquired {
                path: dest,
                content,
            })
        }
    }
}

/// 只读获取源文件：远程源直接下载到内存，不读取也不写入本地副本
pub fn read_source(source: &SourceRef, fetcher: &Fetcher) -> Result<Acquired> {
    match source {
        SourceRef::Local(path) => Ok(Acquired {
            path: path.clone(),
            content: paths::read_file(path)?,
        }),
        SourceRef::Remote(url) => Ok(Acquired {
            path: PathBuf::from(remote_file_name(url)),
            content: fetcher.fetch(url)?,
        }),
    }
}

/// URL 路径的最后一段，去掉查询串和锚点
fn remote_file_name(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    match path.split_once('/') {
        Some((_, tail)) => tail
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_COMPOSE_FILE)
            .to_string(),
        None => DEFAULT_COMPOSE_FILE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_local_path() {
        assert_eq!(
            SourceRef::parse("docker-compose.yaml").unwrap(),
            SourceRef::Local(PathBuf::from("docker-compose.yaml"))
        );
    }

    #[test]
    fn test_parse_valid_urls() {
        for url in [
            "https://example.com/docker-compose.yaml",
            "http://localhost:8080/compose.yml",
            "https://raw.githubusercontent.com/org/repo/main/docker-compose.yaml?token=abc",
            "https://example.com",
        ] {
            assert_eq!(
                SourceRef::parse(url).unwrap(),
                SourceRef::Remote(url.to_string())
            );
        }
    }

    #[test]
    fn test_parse_rejects_malformed_urls() {
        for url in [
            "https://",
            "https:///path",
            "http://-bad.com/x",
            "https://exa mple.com/x",
            "ftp://example.com/compose.yaml",
        ] {
            assert!(
                matches!(SourceRef::parse(url), Err(EnvInitError::InvalidInput(_))),
                "{} 应被拒绝",
                url
            );
        }
    }

    #[test]
    fn test_parse_empty_is_invalid_input() {
        assert!(matches!(
            SourceRef::parse("  "),
            Err(EnvInitError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_acquire_local_missing() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceRef::Local(dir.path().join("missing.yaml"));

        let err = acquire(&source, &Config::default()).unwrap_err();
        assert!(matches!(err, EnvInitError::SourceNotFound(_)));
    }

    #[test]
    fn test_acquire_local_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compose.prod.yml");
        fs::write(&path, "image: ${IMAGE}").unwrap();

        let acquired = acquire(&SourceRef::Local(path), &Config::default()).unwrap();
        assert_eq!(acquired.content, "image: ${IMAGE}");
        assert_eq!(acquired.kind(), "compose.prod.yml");
    }

    #[test]
    fn test_acquire_remote_reuses_local_copy_without_update() {
        let dir = tempfile::tempdir().unwrap();
        let copy = dir.path().join("docker-compose.yaml");
        fs::write(&copy, "x: ${CACHED}").unwrap();
        let config = Config {
            save_as: copy.clone(),
            ..Config::default()
        };

        // 端口 9 不会有服务，若真的发起请求会失败
        let source = SourceRef::Remote("http://127.0.0.1:9/docker-compose.yaml".to_string());
        let acquired = acquire(&source, &config).unwrap();

        assert_eq!(acquired.path, copy);
        assert_eq!(acquired.content, "x: ${CACHED}");
    }

    #[test]
    fn test_fetch_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("docker-compose.yaml");
        let fetcher = Fetcher::with_policy(2, Duration::ZERO).unwrap();

        let err = fetcher
            .fetch_to("http://127.0.0.1:9/docker-compose.yaml", &dest)
            .unwrap_err();

        assert!(matches!(err, EnvInitError::SourceUnavailable { .. }));
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_remote_file_name() {
        assert_eq!(remote_file_name("https://example.com/a/compose.prod.yml"), "compose.prod.yml");
        assert_eq!(remote_file_name("https://example.com/a/other.yaml?ref=main"), "other.yaml");
        assert_eq!(remote_file_name("https://example.com"), "docker-compose.yaml");
        assert_eq!(remote_file_name("https://example.com/dir/"), "docker-compose.yaml");
    }

    #[test]
    fn test_read_source_remote_ignores_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("docker-compose.yaml"), "x: ${STALE_LOCAL:-1}").unwrap();
        let fetcher = Fetcher::with_policy(1, Duration::ZERO).unwrap();

        let source = SourceRef::Remote("http://127.0.0.1:9/other.yaml".to_string());
        let err = read_source(&source, &fetcher).unwrap_err();

        assert!(matches!(err, EnvInitError::SourceUnavailable { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_read_source_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compose.yml");
        fs::write(&path, "a: ${A}").unwrap();
        let fetcher = Fetcher::with_policy(1, Duration::ZERO).unwrap();

        let acquired = read_source(&SourceRef::Local(path), &fetcher).unwrap();
        assert_eq!(acquired.content, "a: ${A}");
        assert_eq!(acquired.kind(), "compose.yml");
    }
}
