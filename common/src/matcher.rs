//! セッション名照合モジュール
//!
//! ユーザー入力（グループ名・略称・キーワード）を既知のセッション名に照合する。
//! ルールは優先順に評価し、候補が1件になった最初のルールで確定する:
//! 1. 完全一致（大文字小文字無視）
//! 2. 略称一致（括弧内トークン、例: "(DWARF)"）
//! 3. 部分一致・キーワード一致
//!
//! トークのセッションタグも同じ正規化で既知のセッション一覧に照合する（filter で使用）。

use crate::types::{MatchResult, SessionName};

/// 照合ルール: (正規化済みクエリ, セッション名) -> 一致するか
pub type MatchRule = fn(&str, &str) -> bool;

/// 評価順に並べた照合ルール
pub const MATCH_RULES: &[(&str, MatchRule)] = &[
    ("exact", is_exact_match),
    ("acronym", is_acronym_match),
    ("keyword", is_keyword_match),
];

/// 比較用に正規化（小文字化・前後空白除去・連続空白の圧縮）
pub fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// セッション名に含まれる括弧内トークン（略称）を抽出
///
/// "Data, Workflows, Agents, and Reasoning Frameworks (DWARF)" -> ["DWARF"]
pub fn acronyms(name: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = name;

    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        match after.find(')') {
            Some(close) => {
                let token = after[..close].trim();
                if !token.is_empty() {
                    tokens.push(token);
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }

    tokens
}

/// ルール1: 完全一致
pub fn is_exact_match(query: &str, session: &str) -> bool {
    !query.is_empty() && normalize(session) == query
}

/// ルール2: 括弧内の略称と一致
pub fn is_acronym_match(query: &str, session: &str) -> bool {
    !query.is_empty() && acronyms(session).iter().any(|a| normalize(a) == query)
}

/// ルール3: 部分一致、またはクエリの全トークンがセッション名に含まれる
pub fn is_keyword_match(query: &str, session: &str) -> bool {
    if query.is_empty() {
        return false;
    }

    let name = normalize(session);
    if name.contains(query) {
        return true;
    }

    let tokens: Vec<&str> = query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();

    !tokens.is_empty() && tokens.iter().all(|t| name.contains(t))
}

/// ユーザー入力を既知のセッション名に照合
///
/// 副作用なし。照合できない場合もパニックせず `MatchResult` で返す。
pub fn match_session(input: &str, known: &[SessionName]) -> MatchResult {
    let query = normalize(input);

    for (_, rule) in MATCH_RULES {
        let mut candidates: Vec<SessionName> = Vec::new();
        for session in known.iter().filter(|s| rule(&query, s)) {
            if !candidates.contains(session) {
                candidates.push(session.clone());
            }
        }

        match candidates.len() {
            0 => continue,
            1 => return MatchResult::Found(candidates.remove(0)),
            _ => return MatchResult::Ambiguous { candidates },
        }
    }

    MatchResult::NotFound {
        known: known.to_vec(),
    }
}

/// needle が haystack 内に単語境界で出現するか（どちらも正規化済み前提）
fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// 括弧内（略称）を除いた正規化済みの名称
fn base_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    normalize(&out)
}

/// タグ照合ルール: (正規化済みタグ, セッション名) -> 一致の具体度（大きいほど優先）
type TagRule = fn(&str, &str) -> Option<usize>;

/// 評価順に並べたタグ照合ルール
const TAG_RULES: &[(&str, TagRule)] = &[
    ("exact", tag_is_name),
    ("acronym", tag_is_acronym),
    ("acronym-word", tag_has_acronym),
    ("contains-name", tag_contains_name),
    ("name-fragment", tag_is_fragment),
];

fn tag_is_name(tag: &str, session: &str) -> Option<usize> {
    (normalize(session) == tag || base_name(session) == tag).then_some(0)
}

fn tag_is_acronym(tag: &str, session: &str) -> Option<usize> {
    acronyms(session)
        .iter()
        .any(|a| normalize(a) == tag)
        .then_some(0)
}

fn tag_has_acronym(tag: &str, session: &str) -> Option<usize> {
    acronyms(session)
        .iter()
        .any(|a| contains_words(tag, &normalize(a)))
        .then_some(0)
}

/// タグが正式名を含む: 長い名称ほど具体的
fn tag_contains_name(tag: &str, session: &str) -> Option<usize> {
    let base = base_name(session);
    contains_words(tag, &base).then_some(base.len())
}

/// タグが正式名の一部: 短い名称ほど具体的
fn tag_is_fragment(tag: &str, session: &str) -> Option<usize> {
    let name = normalize(session);
    contains_words(&name, tag).then(|| usize::MAX - name.len())
}

/// トークのセッションタグが指すセッションを既知の一覧から求める
///
/// スプレッドシートのタグは略称・正式名・その一部が混在する。
/// ルールを順に評価し、最初に一致したルールの中で最も具体的なセッションだけを返す。
/// 名称が重なるセッション（"AI for Science" と "Trustworthy AI for Science"）でも
/// 片方のタグがもう片方に流れ込まない。同点の場合は複数を返す。
pub fn sessions_for_tag<'a>(tag: &str, known: &'a [SessionName]) -> Vec<&'a str> {
    let tag = normalize(tag);
    if tag.is_empty() {
        return Vec::new();
    }

    for (_, rule) in TAG_RULES {
        let scored: Vec<(usize, &str)> = known
            .iter()
            .filter_map(|s| rule(&tag, s).map(|score| (score, s.as_str())))
            .collect();

        let Some(best) = scored.iter().map(|(score, _)| *score).max() else {
            continue;
        };

        let mut hits: Vec<&str> = Vec::new();
        for (_, session) in scored.into_iter().filter(|(score, _)| *score == best) {
            if !hits.contains(&session) {
                hits.push(session);
            }
        }
        return hits;
    }

    Vec::new()
}

/// トークのセッションタグが確定セッションを指すか
pub fn tag_refers_to(tag: &str, session: &str, known: &[SessionName]) -> bool {
    sessions_for_tag(tag, known).contains(&session)
}
