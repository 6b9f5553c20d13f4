//! 外部データ取得モジュール
//!
//! 各取得元はURLまたはローカルパスで指定できる:
//! - sessions: セッション一覧ページ（必須）
//! - talks: ライトニングトーク表（必須）
//! - attendees: 参加者CSV（任意）
//! - notes: 議事メモ（任意）

pub mod attendees;
pub mod notes;
pub mod sessions;
pub mod talks;

use crate::error::{ReportError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// 取得元（URLまたはローカルファイル）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            Source::Url(value.to_string())
        } else {
            Source::File(PathBuf::from(value))
        }
    }

    /// ログ・エラー表示用の名前
    pub fn name(&self) -> String {
        match self {
            Source::Url(url) => url.clone(),
            Source::File(path) => path.display().to_string(),
        }
    }

    /// 拡張子（小文字）。URLはクエリを除いたパスから判定
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            Source::Url(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                PathBuf::from(without_query)
            }
            Source::File(path) => path.clone(),
        };
        path.extension().map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Google Docs / Sheets の共有URLをエクスポートURLに変換
///
/// `https://docs.google.com/{document|spreadsheets}/d/<ID>/edit...` -> `.../d/<ID>/export?format=<format>`
/// Google以外、または既にエクスポートURLの場合は None
pub fn google_export_url(url: &str, kind: &str, format: &str) -> Option<String> {
    let marker = format!("docs.google.com/{}/d/", kind);
    let start = url.find(&marker)? + marker.len();
    let id: String = url[start..]
        .chars()
        .take_while(|c| *c != '/' && *c != '?' && *c != '#')
        .collect();

    if id.is_empty() || url[start + id.len()..].starts_with("/export") {
        return None;
    }

    let prefix = &url[..start];
    Some(format!("{}{}/export?format={}", prefix, id, format))
}

/// HTTP・ファイル読み込みの共通クライアント
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(timeout_seconds: Option<u64>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ReportError::Config(format!("HTTPクライアントを初期化できません: {}", e)))?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// 取得元の内容をバイト列で取得
    pub async fn fetch_bytes(&self, source: &Source) -> Result<Vec<u8>> {
        match source {
            Source::File(path) => {
                if !path.exists() {
                    return Err(ReportError::missing_input(source.name(), "ファイルが存在しません"));
                }
                std::fs::read(path).map_err(|e| ReportError::missing_input(source.name(), e))
            }
            Source::Url(url) => {
                tracing::debug!(url = %url, "fetching");
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ReportError::missing_input(source.name(), e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ReportError::missing_input(
                        source.name(),
                        format!("HTTP {}", status),
                    ));
                }

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ReportError::missing_input(source.name(), e))?;
                Ok(bytes.to_vec())
            }
        }
    }

    /// 取得元の内容をUTF-8文字列で取得（不正なバイト列は置換）
    pub async fn fetch_text(&self, source: &Source) -> Result<String> {
        let bytes = self.fetch_bytes(source).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://example.org/a.csv"),
            Source::Url("https://example.org/a.csv".into())
        );
        assert_eq!(Source::parse(" attendees.csv "), Source::File("attendees.csv".into()));
    }

    #[test]
    fn test_source_extension() {
        assert_eq!(Source::parse("notes/Meeting.DOCX").extension().as_deref(), Some("docx"));
        assert_eq!(
            Source::parse("https://example.org/files/notes.pdf?dl=1").extension().as_deref(),
            Some("pdf")
        );
        assert_eq!(Source::parse("https://example.org/notes").extension(), None);
    }

    #[test]
    fn test_google_export_url() {
        assert_eq!(
            google_export_url(
                "https://docs.google.com/spreadsheets/d/abc123/edit#gid=0",
                "spreadsheets",
                "xlsx"
            )
            .as_deref(),
            Some("https://docs.google.com/spreadsheets/d/abc123/export?format=xlsx")
        );
        assert_eq!(
            google_export_url("https://docs.google.com/document/d/XYZ/edit?usp=sharing", "document", "txt")
                .as_deref(),
            Some("https://docs.google.com/document/d/XYZ/export?format=txt")
        );
        assert_eq!(
            google_export_url("https://docs.google.com/document/d/XYZ/export?format=txt", "document", "txt"),
            None
        );
        assert_eq!(google_export_url("https://example.org/doc", "document", "txt"), None);
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let fetcher = Fetcher::new(None).unwrap();
        let err = fetcher
            .fetch_bytes(&Source::File("/nonexistent/sessions.html".into()))
            .await
            .unwrap_err();
        assert_eq!(err.tag(), "[MISSING_INPUT]");
    }
}
