//! 出力ファイルの書き出し
//!
//! - レポート本文（ヘッダー付き）
//! - プロンプトのみ出力（--prompt-only）
//! - 失敗時の診断ファイル

use crate::error::{ReportError, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tpc_report_common::{acronyms, ReportPayload};

/// セッション名からファイル名用の短い名前を作る
///
/// 略称があれば小文字の略称、なければ英数字以外を `_` にした名前
pub fn session_slug(session: &str) -> String {
    let base = acronyms(session)
        .first()
        .map(|a| a.to_string())
        .unwrap_or_else(|| session.to_string());

    let slug: String = base
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    let slug = slug
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if slug.is_empty() {
        "session".to_string()
    } else {
        slug
    }
}

pub fn default_report_path(dir: &Path, session: &str) -> PathBuf {
    dir.join(format!("draft_report_{}.txt", session_slug(session)))
}

pub fn default_prompt_path(dir: &Path, session: &str) -> PathBuf {
    dir.join(format!("prompt_{}.txt", session_slug(session)))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// レポートを書き出し（生成日時・モデル名のヘッダー付き、本文は応答そのまま）
pub fn write_report(
    path: &Path,
    session: &str,
    model: &str,
    content: &str,
    generated_at: DateTime<Local>,
) -> Result<()> {
    ensure_parent(path)?;

    let mut out = String::with_capacity(content.len() + 256);
    out.push_str("# TPC Session Report Draft\n");
    out.push_str(&format!("# Session: {}\n", session));
    out.push_str(&format!("# Generated: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("# Model: {}\n\n", model));
    out.push_str(content);

    std::fs::write(path, out)?;
    Ok(())
}

/// 描画済みプロンプトを書き出し
pub fn write_prompt(path: &Path, payload: &ReportPayload) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, payload.as_str())?;
    Ok(())
}

/// 診断ファイル名（report_error_YYYYmmdd_HHMMSS.txt）
pub fn diagnostic_path(dir: &Path, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("report_error_{}.txt", at.format("%Y%m%d_%H%M%S")))
}

/// 失敗内容を診断ファイルに書き出し、パスを返す
pub fn write_diagnostic(
    dir: &Path,
    error: &ReportError,
    group: Option<&str>,
    at: DateTime<Local>,
) -> Result<PathBuf> {
    let path = diagnostic_path(dir, at);
    ensure_parent(&path)?;

    let mut lines = vec![
        "# TPC Session Report - Failure Diagnostic".to_string(),
        format!("Timestamp: {}", at.format("%Y-%m-%d %H:%M:%S")),
        format!("Error: {}", error.tag()),
        format!("Exit code: {}", error.exit_code()),
        format!("Group: {}", group.unwrap_or("(none)")),
        format!("Message: {}", error),
    ];

    let context = error.diagnostic_context();
    if !context.is_empty() {
        lines.push(String::new());
        lines.extend(context);
    }
    lines.push(String::new());

    std::fs::write(&path, lines.join("\n"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 7, 30, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_session_slug() {
        assert_eq!(
            session_slug("Data, Workflows, Agents, and Reasoning Frameworks (DWARF)"),
            "dwarf"
        );
        assert_eq!(session_slug("Agents for Science"), "agents_for_science");
        assert_eq!(session_slug("  --  "), "session");
    }

    #[test]
    fn test_default_paths() {
        let dir = Path::new("out");
        assert_eq!(
            default_report_path(dir, "Evaluation (EVAL)"),
            PathBuf::from("out/draft_report_eval.txt")
        );
        assert_eq!(
            default_prompt_path(dir, "Evaluation (EVAL)"),
            PathBuf::from("out/prompt_eval.txt")
        );
    }

    #[test]
    fn test_write_report_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("report.txt");
        write_report(&path, "Evaluation (EVAL)", "gpt-4o-mini", "## Abstract\nBody", fixed_time()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# TPC Session Report Draft\n# Session: Evaluation (EVAL)\n"));
        assert!(content.contains("# Generated: 2025-07-30 14:05:09\n"));
        assert!(content.contains("# Model: gpt-4o-mini\n\n## Abstract\nBody"));
    }

    #[test]
    fn test_write_diagnostic_session_not_found() {
        let dir = tempdir().unwrap();
        let error = ReportError::SessionNotFound {
            query: "Quantum Foo".into(),
            known: vec!["Evaluation (EVAL)".into(), "Agents for Science".into()],
        };

        let path = write_diagnostic(dir.path(), &error, Some("Quantum Foo"), fixed_time()).unwrap();
        assert_eq!(path.file_name().unwrap(), "report_error_20250730_140509.txt");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Error: [SESSION_NOT_FOUND]"));
        assert!(content.contains("Exit code: 11"));
        assert!(content.contains("Group: Quantum Foo"));
        assert!(content.contains("  - Evaluation (EVAL)"));
        assert!(content.contains("  - Agents for Science"));
    }

    #[test]
    fn test_write_diagnostic_without_group() {
        let dir = tempdir().unwrap();
        let error = ReportError::Config("bad".into());
        let path = write_diagnostic(dir.path(), &error, None, fixed_time()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Group: (none)"));
        assert!(content.contains("Error: [CONFIG_ERROR]"));
    }
}
