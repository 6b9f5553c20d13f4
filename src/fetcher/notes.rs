//! 議事メモの取得
//!
//! 対応形式:
//! - Google Docs URL（テキストエクスポートに変換）
//! - DOCX（word/document.xml からテキスト抽出）
//! - PDF（外部コマンド pdftotext）
//! - その他はプレーンテキスト
//!
//! 任意データ。未指定時はカレントフォルダのDOCX/PDFを探す。

use super::{google_export_url, Fetcher, Source};
use crate::error::{ReportError, Result};
use regex::Regex;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

const NOTE_EXTENSIONS: &[&str] = &["docx", "pdf"];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const PDF_MAGIC: &[u8] = b"%PDF";

/// 議事メモの取得元を決定
///
/// 明示指定がなければ `dir` 直下のDOCX/PDFをファイル名順で最初の1件
pub fn notes_source(value: Option<&str>, dir: &Path) -> Option<Source> {
    if let Some(value) = value {
        return Some(match google_export_url(value, "document", "txt") {
            Some(export) => Source::Url(export),
            None => Source::parse(value),
        });
    }
    find_local_notes(dir).map(Source::File)
}

/// フォルダ直下のDOCX/PDFを探す
pub fn find_local_notes(dir: &Path) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)  // 直下のみ
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            // Wordのロックファイルは除外
            !name.starts_with("~$")
        })
        .filter(|p| {
            p.extension()
                .map(|e| NOTE_EXTENSIONS.contains(&e.to_string_lossy().to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();

    found.sort();
    found.into_iter().next()
}

/// DOCXからテキストを抽出（段落ごとに改行）
pub fn docx_text(bytes: &[u8]) -> Result<String> {
    lazy_static::lazy_static! {
        static ref PARAGRAPH_END: Regex = Regex::new(r"</w:p>").unwrap();
        static ref LINE_BREAK: Regex = Regex::new(r"<w:(br|cr)\s*/>").unwrap();
        static ref TAB: Regex = Regex::new(r"<w:tab\s*/>").unwrap();
        static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
        static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ReportError::DataValidation(format!("DOCXを開けません: {}", e)))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ReportError::DataValidation(format!("word/document.xml がありません: {}", e)))?
        .read_to_string(&mut xml)?;

    let text = PARAGRAPH_END.replace_all(&xml, "\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = TAB.replace_all(&text, "\t");
    let text = TAG.replace_all(&text, "");
    let text = unescape_xml(&text);
    let text = BLANK_LINES.replace_all(&text, "\n\n");

    Ok(text.trim().to_string())
}

/// XMLの文字参照（名前付き・数値）を復元
fn unescape_xml(s: &str) -> String {
    lazy_static::lazy_static! {
        static ref CHAR_REF: Regex = Regex::new(r"&#(?:[xX]([0-9A-Fa-f]+)|([0-9]+));").unwrap();
    }

    let decoded = CHAR_REF.replace_all(s, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // &amp; は最後（"&amp;lt;" を二重に復元しない）
    decoded
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// PDFからテキストを抽出（pdftotext を実行）
fn pdf_text(path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .args(["-layout", "-enc", "UTF-8"])
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| ReportError::DataValidation(format!("pdftotext を実行できません: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReportError::DataValidation(format!("pdftotext エラー: {}", stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// PDFのバイト列を `dir` 内の一時ファイルに書き出す（drop時に削除）
fn spill_pdf(bytes: &[u8], dir: &Path) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("tpc-report-notes-")
        .suffix(".pdf")
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

/// リモートPDFを一時ファイルに書き出して抽出
fn pdf_text_from_bytes(bytes: &[u8]) -> Result<String> {
    let file = spill_pdf(bytes, &std::env::temp_dir())?;
    pdf_text(file.path())
}

/// 内容の形式に応じてテキスト化
pub fn extract_notes_text(bytes: &[u8], source: &Source) -> Result<String> {
    let extension = source.extension();

    if bytes.starts_with(PDF_MAGIC) || extension.as_deref() == Some("pdf") {
        return match source {
            Source::File(path) => pdf_text(path),
            Source::Url(_) => pdf_text_from_bytes(bytes),
        };
    }

    if bytes.starts_with(ZIP_MAGIC) || extension.as_deref() == Some("docx") {
        return docx_text(bytes);
    }

    Ok(String::from_utf8_lossy(bytes).trim().to_string())
}

/// 議事メモを取得
pub async fn fetch_notes(fetcher: &Fetcher, source: &Source) -> Result<String> {
    let bytes = fetcher.fetch_bytes(source).await?;
    extract_notes_text(&bytes, source)
}

/// 議事メモを取得（失敗・空の場合は None）
pub async fn load_notes(fetcher: &Fetcher, source: Option<&Source>) -> Option<String> {
    let Some(source) = source else {
        tracing::warn!("no discussion notes found");
        return None;
    };

    match fetch_notes(fetcher, source).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            tracing::warn!(source = %source.name(), "discussion notes are empty");
            None
        }
        Err(e) => {
            tracing::warn!(source = %source.name(), error = %e, "discussion notes unavailable");
            None
        }
    }
}
