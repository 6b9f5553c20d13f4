//! CSV読み込みモジュール
//!
//! 参加者CSVとスプレッドシートCSVエクスポートの読み込み。
//! クォート内のカンマ・改行・`""` エスケープに対応する。

use crate::error::{Error, Result};
use crate::types::{Attendee, LightningTalk};
use serde::{Deserialize, Serialize};

/// 参加者CSVの必須ヘッダー
pub const ATTENDEE_COLUMNS: [&str; 3] = ["First", "Last", "Organization"];

/// CSV文字列を行ごとのフィールド列に分解
pub fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            // フィールド先頭のみクォート開始、途中の " は文字として扱う
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    // 最後の行（末尾改行なし）
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
        .into_iter()
        .filter(|r| r.iter().any(|f| !f.trim().is_empty()))
        .collect()
}

/// 参加者CSVを読み込み（`First`, `Last`, `Organization` 列）
///
/// 列はヘッダー名で特定する（大文字小文字・前後空白は無視）。
pub fn parse_attendees(content: &str, source_name: &str) -> Result<Vec<Attendee>> {
    let records = parse_csv(content);
    let header = records.first().ok_or_else(|| Error::MissingColumn {
        source_name: source_name.to_string(),
        column: ATTENDEE_COLUMNS[0].to_string(),
    })?;

    let mut indices = [0usize; 3];
    for (slot, column) in indices.iter_mut().zip(ATTENDEE_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
            .ok_or_else(|| Error::MissingColumn {
                source_name: source_name.to_string(),
                column: column.to_string(),
            })?;
    }

    Ok(records
        .iter()
        .skip(1)
        .map(|row| Attendee {
            first_name: cell(row, indices[0]),
            last_name: cell(row, indices[1]),
            organization: cell(row, indices[2]),
        })
        .filter(|a| !a.first_name.is_empty() || !a.last_name.is_empty())
        .collect())
}

fn cell(row: &[String], i: usize) -> String {
    row.get(i).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// ライトニングトーク表の列位置（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalkColumns {
    pub author: usize,
    pub institution: usize,
    pub title: usize,
    #[serde(rename = "abstract")]
    pub abstract_text: usize,
    pub session: usize,
}

impl Default for TalkColumns {
    fn default() -> Self {
        Self {
            author: 0,
            institution: 1,
            title: 2,
            abstract_text: 3,
            session: 4,
        }
    }
}

/// ヘッダー見出しとして受け付けるキーワード（小文字・部分一致）
const AUTHOR_HEADERS: &[&str] = &["author", "presenter", "speaker", "name"];
const INSTITUTION_HEADERS: &[&str] = &["institution", "affiliation", "organization", "organisation"];
const TITLE_HEADERS: &[&str] = &["title"];
const ABSTRACT_HEADERS: &[&str] = &["abstract", "description", "summary"];
const SESSION_HEADERS: &[&str] = &["session", "breakout", "track", "group"];

impl TalkColumns {
    fn named(&self) -> [(&'static str, usize, &'static [&'static str]); 5] {
        [
            ("author", self.author, AUTHOR_HEADERS),
            ("institution", self.institution, INSTITUTION_HEADERS),
            ("title", self.title, TITLE_HEADERS),
            ("abstract", self.abstract_text, ABSTRACT_HEADERS),
            ("session", self.session, SESSION_HEADERS),
        ]
    }
}

/// 表データ（xlsx・csv共通）からトーク一覧を構築
///
/// 先頭 `header_rows` 行はヘッダーとして読み飛ばす。
/// 表の列数が必須列に届かない場合、またはヘッダー最終行の見出しが
/// 列位置の意味と合わない場合（列の入れ替え・名称変更）は列欠落エラー。
pub fn talks_from_rows(
    rows: &[Vec<String>],
    columns: &TalkColumns,
    header_rows: usize,
    source_name: &str,
) -> Result<Vec<LightningTalk>> {
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if let Some((name, _, _)) = columns.named().into_iter().find(|(_, i, _)| *i >= width) {
        return Err(Error::MissingColumn {
            source_name: source_name.to_string(),
            column: name.to_string(),
        });
    }

    if let Some(header) = header_rows.checked_sub(1).and_then(|i| rows.get(i)) {
        for (name, index, keywords) in columns.named() {
            let label = cell(header, index);
            let lower = label.to_lowercase();
            if !keywords.iter().any(|k| lower.contains(k)) {
                return Err(Error::MissingColumn {
                    source_name: source_name.to_string(),
                    column: format!("{} (header \"{}\")", name, label),
                });
            }
        }
    }

    Ok(rows
        .iter()
        .skip(header_rows)
        .map(|row| LightningTalk {
            author: cell(row, columns.author),
            institution: cell(row, columns.institution),
            title: cell(row, columns.title),
            abstract_text: cell(row, columns.abstract_text),
            session_tag: cell(row, columns.session),
        })
        .filter(|t| !t.title.is_empty() || !t.author.is_empty())
        .collect())
}
