//! セッション一覧の取得
//!
//! セッション一覧ページからCSSセレクタでセッション名を抜き出す。

use super::{Fetcher, Source};
use crate::error::{ReportError, Result};
use scraper::{Html, Selector};
use tpc_report_common::SessionName;

/// HTMLからセッション名を抽出（出現順・重複除去）
pub fn parse_session_names(html: &str, selector: &str) -> Result<Vec<SessionName>> {
    let selector = Selector::parse(selector)
        .map_err(|e| ReportError::Config(format!("セッションセレクタが不正です \"{}\": {:?}", selector, e)))?;
    let document = Html::parse_document(html);

    let mut names: Vec<SessionName> = Vec::new();
    for element in document.select(&selector) {
        let text = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() && !names.contains(&text) {
            names.push(text);
        }
    }

    Ok(names)
}

/// セッション一覧を取得（0件は必須データ欠落）
pub async fn fetch_sessions(
    fetcher: &Fetcher,
    source: &Source,
    selector: &str,
) -> Result<Vec<SessionName>> {
    let html = fetcher.fetch_text(source).await?;
    let names = parse_session_names(&html, selector)?;

    if names.is_empty() {
        return Err(ReportError::missing_input(
            source.name(),
            format!("セレクタ \"{}\" に一致するセッション名がありません", selector),
        ));
    }

    tracing::debug!(count = names.len(), "session names scraped");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
<h1>TPC25 Breakout Sessions</h1>
<h2>Data, Workflows, Agents, and
    Reasoning Frameworks (DWARF)</h2>
<p>Description</p>
<h3>Evaluation and <em>Benchmarking</em> (EVAL)</h3>
<h2>Data, Workflows, Agents, and Reasoning Frameworks (DWARF)</h2>
<h2>   </h2>
</body></html>"#;

    #[test]
    fn test_parse_session_names() {
        let names = parse_session_names(PAGE, "h2, h3").unwrap();
        assert_eq!(
            names,
            vec![
                "Data, Workflows, Agents, and Reasoning Frameworks (DWARF)".to_string(),
                "Evaluation and Benchmarking (EVAL)".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_session_names_custom_selector() {
        let names = parse_session_names(PAGE, "h1").unwrap();
        assert_eq!(names, vec!["TPC25 Breakout Sessions".to_string()]);
    }

    #[test]
    fn test_invalid_selector() {
        let err = parse_session_names(PAGE, "h2[").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[tokio::test]
    async fn test_fetch_sessions_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.html");
        std::fs::write(&path, "<html><body><p>nothing</p></body></html>").unwrap();

        let fetcher = Fetcher::new(None).unwrap();
        let err = fetch_sessions(&fetcher, &Source::File(path), "h2")
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }
}
