//! TPC Session Report Common Library
//!
//! セッション照合・トーク絞り込み・プロンプト描画の共通ロジック（I/Oなし）

pub mod types;
pub mod error;
pub mod matcher;
pub mod filter;
pub mod csv;
pub mod prompts;

pub use types::{Attendee, LightningTalk, MatchResult, ReportPayload, SessionName};
pub use error::{Error, Result};
pub use matcher::{match_session, normalize, acronyms, sessions_for_tag, tag_refers_to};
pub use filter::filter_talks;
pub use csv::{parse_csv, parse_attendees, talks_from_rows, TalkColumns};
pub use prompts::{
    render_prompt, count_talk_blocks, attendee_region,
    DEFAULT_MASTER_PROMPT, ATTENDEES_UNAVAILABLE, NOTES_UNAVAILABLE,
};
