//! 参加者CSVの取得
//!
//! 任意データ。取得・解析に失敗した場合は警告を出して「なし」として扱う。

use super::{google_export_url, Fetcher, Source};
use crate::error::Result;
use std::path::Path;
use tpc_report_common::{parse_attendees, Attendee};

pub const DEFAULT_ATTENDEES_FILE: &str = "attendees.csv";

/// 参加者CSVの取得元を決定（未指定時は `dir` の attendees.csv）
pub fn attendees_source(value: Option<&str>, dir: &Path) -> Source {
    let Some(value) = value else {
        return Source::File(dir.join(DEFAULT_ATTENDEES_FILE));
    };
    match google_export_url(value, "spreadsheets", "csv") {
        Some(export) => Source::Url(export),
        None => Source::parse(value),
    }
}

/// 参加者一覧を取得
pub async fn fetch_attendees(fetcher: &Fetcher, source: &Source) -> Result<Vec<Attendee>> {
    let content = fetcher.fetch_text(source).await?;
    Ok(parse_attendees(&content, &source.name())?)
}

/// 参加者一覧を取得（失敗時は None）
///
/// 一部だけの参加者リストは作らない。全件取得できなければ None。
pub async fn load_attendees(fetcher: &Fetcher, source: &Source) -> Option<Vec<Attendee>> {
    match fetch_attendees(fetcher, source).await {
        Ok(list) if !list.is_empty() => Some(list),
        Ok(_) => {
            tracing::warn!(source = %source.name(), "attendee list is empty");
            None
        }
        Err(e) => {
            tracing::warn!(source = %source.name(), error = %e, "attendee list unavailable");
            None
        }
    }
}
