//! プロンプト生成モジュール
//!
//! セッションレポート用のマスタープロンプトに、絞り込み済みトーク・参加者・
//! 議事メモを差し込んで生成APIへ渡す指示文を作る。
//! - DEFAULT_MASTER_PROMPT: 組み込みテンプレート
//! - render_prompt: 差し込み領域の置換
//! - count_talk_blocks: 指示文に含まれるトークブロック数

use crate::error::{Error, Result};
use crate::types::{Attendee, LightningTalk, ReportPayload};

/// 差し込み領域マーカー
pub const REGION_SESSION_NAME: &str = "{{SESSION_NAME}}";
pub const REGION_TALK_COUNT: &str = "{{TALK_COUNT}}";
pub const REGION_LIGHTNING_TALKS: &str = "{{LIGHTNING_TALKS}}";
pub const REGION_ATTENDEES: &str = "{{ATTENDEES}}";
pub const REGION_NOTES: &str = "{{NOTES}}";

/// テンプレートに必須の領域
pub const REQUIRED_REGIONS: &[&str] = &[
    REGION_LIGHTNING_TALKS,
    REGION_ATTENDEES,
    REGION_NOTES,
];

/// 参加者リストがない場合の固定文言
pub const ATTENDEES_UNAVAILABLE: &str = "Attendees list not available";

/// 議事メモがない場合の固定文言
pub const NOTES_UNAVAILABLE: &str = "No discussion notes were provided. Derive the Discussion Summary and Outcomes from the lightning talk abstracts only.";

/// トークブロックの見出し（件数検証にも使う）
pub const TALK_BLOCK_HEADER: &str = "### Lightning Talk ";

/// レポートの固定セクション
pub const REPORT_SECTIONS: &[&str] = &[
    "Abstract",
    "Introduction",
    "Lightning Talks Overview",
    "Discussion Summary",
    "Outcomes",
    "Appendix A",
    "Appendix B",
];

/// 組み込みマスタープロンプト
pub const DEFAULT_MASTER_PROMPT: &str = r#"You are preparing the official session report for the breakout session "{{SESSION_NAME}}".

Write the report in Markdown using exactly these section headings, in this order:

## Abstract
A single paragraph (150-200 words) summarizing the purpose, the talks and the main outcomes of the session.

## Introduction
Describe the session's scope and why it matters to the community.

## Lightning Talks Overview
Synthesize the themes across all {{TALK_COUNT}} lightning talks listed below. Refer to speakers by name and institution.

## Discussion Summary
Summarize the discussion using the notes provided below.

## Outcomes
List concrete outcomes, open challenges and proposed next steps.

## Appendix A: Attendees
Reproduce the attendee table below exactly as given.

## Appendix B: Lightning Talks
For every one of the {{TALK_COUNT}} lightning talks below, reproduce its title, author, institution and full abstract.
Include every talk. Do not merge, shorten or skip talks, and do not say "omitted for brevity".

---

# Lightning Talks ({{TALK_COUNT}})

{{LIGHTNING_TALKS}}

# Attendees

{{ATTENDEES}}

# Discussion Notes

{{NOTES}}
"#;

/// 1件のトークブロック
fn render_talk(index: usize, total: usize, talk: &LightningTalk) -> String {
    format!(
        "{header}{index} of {total}\n\
         Title: {title}\n\
         Author: {author}\n\
         Institution: {institution}\n\
         Abstract:\n{abstract_text}\n",
        header = TALK_BLOCK_HEADER,
        index = index,
        total = total,
        title = talk.title,
        author = talk.author,
        institution = talk.institution,
        abstract_text = talk.abstract_text,
    )
}

/// 参加者テーブル（Markdown）。リストなし・空の場合は固定文言
fn render_attendees(attendees: Option<&[Attendee]>) -> String {
    match attendees {
        Some(list) if !list.is_empty() => {
            let mut table = String::from("| Name | Organization |\n|------|--------------|\n");
            for a in list {
                table.push_str(&format!("| {} | {} |\n", a.full_name(), a.organization));
            }
            table
        }
        _ => ATTENDEES_UNAVAILABLE.to_string(),
    }
}

/// テンプレートの `{{NAME}}` を1パスで置換する
///
/// 差し込んだ値の中にマーカー文字列があっても再置換しない。未知のマーカーはそのまま残す。
fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];

        let replaced = values
            .iter()
            .find(|(marker, _)| candidate.starts_with(marker));

        match replaced {
            Some((marker, value)) => {
                out.push_str(value);
                rest = &candidate[marker.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &candidate[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// マスタープロンプトを描画
///
/// # Arguments
/// * `template` - 差し込み領域を含むテンプレート
/// * `session` - 確定したセッション名
/// * `talks` - 絞り込み済みトーク（全件を省略せず埋め込む）
/// * `attendees` - 参加者（なしの場合は固定文言）
/// * `notes` - 議事メモ（なしの場合は固定文言）
///
/// # Returns
/// 生成APIへ渡す指示文
pub fn render_prompt(
    template: &str,
    session: &str,
    talks: &[LightningTalk],
    attendees: Option<&[Attendee]>,
    notes: Option<&str>,
) -> Result<ReportPayload> {
    if let Some(missing) = REQUIRED_REGIONS.iter().find(|r| !template.contains(*r)) {
        return Err(Error::MissingTemplateRegion(*missing));
    }

    let total = talks.len();
    let talk_blocks = talks
        .iter()
        .enumerate()
        .map(|(i, t)| render_talk(i + 1, total, t))
        .collect::<Vec<_>>()
        .join("\n");
    let attendee_region = render_attendees(attendees);
    let notes_region = match notes.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => NOTES_UNAVAILABLE.to_string(),
    };
    let count = total.to_string();

    let text = substitute(
        template,
        &[
            (REGION_SESSION_NAME, session),
            (REGION_TALK_COUNT, &count),
            (REGION_LIGHTNING_TALKS, &talk_blocks),
            (REGION_ATTENDEES, &attendee_region),
            (REGION_NOTES, &notes_region),
        ],
    );

    Ok(ReportPayload::new(text, total))
}

/// 指示文に含まれるトークブロック数
pub fn count_talk_blocks(payload: &str) -> usize {
    payload
        .lines()
        .filter(|line| line.starts_with(TALK_BLOCK_HEADER))
        .count()
}

/// 指示文から参加者領域を抜き出す（"# Attendees" 見出しの次から "# Discussion Notes" まで）
pub fn attendee_region(payload: &str) -> Option<&str> {
    let start = payload.find("\n# Attendees\n")? + "\n# Attendees\n".len();
    let end = payload[start..]
        .find("\n# Discussion Notes")
        .map(|i| start + i)
        .unwrap_or(payload.len());
    Some(payload[start..end].trim())
}
