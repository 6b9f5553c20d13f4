//! トーク絞り込みモジュール

use crate::error::{Error, Result};
use crate::matcher::tag_refers_to;
use crate::types::{LightningTalk, SessionName};

/// 確定セッションに属するトークのみを元の順序で返す
///
/// 各トークのタグは既知のセッション一覧 `known` に照合し、`session` を指すものだけを残す。
/// 要約・切り詰め・重複除去は行わない。該当0件はデータ不整合としてエラー。
pub fn filter_talks(
    talks: &[LightningTalk],
    session: &str,
    known: &[SessionName],
) -> Result<Vec<LightningTalk>> {
    let filtered: Vec<LightningTalk> = talks
        .iter()
        .filter(|t| tag_refers_to(&t.session_tag, session, known))
        .cloned()
        .collect();

    if filtered.is_empty() {
        return Err(Error::NoTalksForSession(session.to_string()));
    }

    Ok(filtered)
}
