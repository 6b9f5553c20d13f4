//! セッション・トーク・参加者の型定義
//!
//! CLIとテストで共有される型:
//! - LightningTalk: スプレッドシートの1行
//! - Attendee: 参加者CSVの1行
//! - MatchResult: セッション照合の結果
//! - ReportPayload: レンダリング済みのプロンプト

use serde::{Deserialize, Serialize};

/// セッション名（例: "Data, Workflows, Agents, and Reasoning Frameworks (DWARF)"）
pub type SessionName = String;

/// ライトニングトーク（スプレッドシートの1行）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LightningTalk {
    pub author: String,
    pub institution: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// 照合用のセッションタグ（略称・正式名が混在する自由記述）
    pub session_tag: String,
}

/// 参加者（CSVの1行）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attendee {
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
}

impl Attendee {
    /// "First Last" 形式の氏名
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// セッション照合結果
///
/// 照合は最大1件に確定する。複数候補は `Ambiguous` として返す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// 1件に確定
    Found(SessionName),
    /// 該当なし（既知セッション一覧を保持）
    NotFound { known: Vec<SessionName> },
    /// 複数候補（候補一覧を保持）
    Ambiguous { candidates: Vec<SessionName> },
}

impl MatchResult {
    /// 確定したセッション名
    pub fn session(&self) -> Option<&str> {
        match self {
            MatchResult::Found(name) => Some(name),
            _ => None,
        }
    }
}

/// レンダリング済みプロンプト
///
/// 一度構築したら変更しない。生成APIにそのまま渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPayload {
    text: String,
    talk_count: usize,
}

impl ReportPayload {
    pub(crate) fn new(text: String, talk_count: usize) -> Self {
        Self { text, talk_count }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// 埋め込まれたトーク数
    pub fn talk_count(&self) -> usize {
        self.talk_count
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for ReportPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
