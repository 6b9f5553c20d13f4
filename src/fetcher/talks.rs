//! ライトニングトーク表の取得
//!
//! Google Sheets のxlsxエクスポート、ローカルxlsx、CSVに対応する。
//! 形式は内容の先頭バイトで判定する（xlsxはZIP）。

use super::{google_export_url, Fetcher, Source};
use crate::error::{ReportError, Result};
use calamine::{Reader, Xlsx};
use std::io::Cursor;
use tpc_report_common::{parse_csv, talks_from_rows, LightningTalk, TalkColumns};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// トーク表の取得元を決定（Google Sheets はxlsxエクスポートへ変換）
pub fn talks_source(value: &str) -> Source {
    match google_export_url(value, "spreadsheets", "xlsx") {
        Some(export) => Source::Url(export),
        None => Source::parse(value),
    }
}

/// xlsxの先頭シートを文字列の表として読み込み
fn xlsx_rows(bytes: &[u8], source_name: &str) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ReportError::missing_input(source_name, format!("xlsxを開けません: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::missing_input(source_name, "シートがありません"))?
        .map_err(|e| ReportError::missing_input(source_name, format!("シートを読めません: {}", e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

/// トーク表の内容を解析
pub fn parse_talks(
    bytes: &[u8],
    columns: &TalkColumns,
    header_rows: usize,
    source_name: &str,
) -> Result<Vec<LightningTalk>> {
    let rows = if bytes.starts_with(ZIP_MAGIC) {
        xlsx_rows(bytes, source_name)?
    } else {
        parse_csv(&String::from_utf8_lossy(bytes))
    };

    if rows.len() <= header_rows {
        return Err(ReportError::missing_input(source_name, "トーク表にデータ行がありません"));
    }

    Ok(talks_from_rows(&rows, columns, header_rows, source_name)?)
}

/// ライトニングトーク一覧を取得
pub async fn fetch_talks(
    fetcher: &Fetcher,
    source: &Source,
    columns: &TalkColumns,
    header_rows: usize,
) -> Result<Vec<LightningTalk>> {
    let bytes = fetcher.fetch_bytes(source).await?;
    let talks = parse_talks(&bytes, columns, header_rows, &source.name())?;
    tracing::debug!(count = talks.len(), "lightning talks loaded");
    Ok(talks)
}
