//! レポート作成の一括処理
//!
//! セッション一覧 → トーク表 → 参加者 → 議事メモ → 照合 → 絞り込み → 描画 → 生成 → 書き出し

use crate::config::Config;
use crate::error::{ReportError, Result};
use crate::fetcher::{attendees, notes, sessions, talks, Fetcher, Source};
use crate::generator::ReportGenerator;
use crate::report;
use std::path::PathBuf;
use tpc_report_common::{
    filter_talks, match_session, render_prompt, LightningTalk, MatchResult, ReportPayload,
};

const STEPS: usize = 7;

/// 1回の実行で使う入力
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub group: String,
    pub attendees: Option<String>,
    pub notes: Option<String>,
    pub output: Option<PathBuf>,
    pub prompt_only: bool,
    pub verbose: bool,
    /// 出力・議事メモ探索の基準フォルダ
    pub work_dir: PathBuf,
}

/// 描画まで終えた状態
#[derive(Debug, Clone)]
pub struct PreparedReport {
    pub session: String,
    pub talks: Vec<LightningTalk>,
    pub payload: ReportPayload,
    pub attendees_available: bool,
    pub notes_available: bool,
}

/// 実行結果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub session: String,
    pub talk_count: usize,
    pub attendees_available: bool,
    pub notes_available: bool,
    pub output: PathBuf,
}

fn step(n: usize, message: &str) {
    println!("[{}/{}] {}", n, STEPS, message);
}

/// 照合結果を確定セッション名かエラーに変換
pub fn resolve_session(group: &str, known: &[String]) -> Result<String> {
    match match_session(group, known) {
        MatchResult::Found(name) => Ok(name),
        MatchResult::NotFound { known } => Err(ReportError::SessionNotFound {
            query: group.to_string(),
            known,
        }),
        MatchResult::Ambiguous { candidates } => Err(ReportError::AmbiguousSession {
            query: group.to_string(),
            candidates,
        }),
    }
}

/// `--group` の指定を確認（未指定・空白のみは必須入力の欠落）
pub fn require_group(group: Option<&str>) -> Result<String> {
    match group.map(str::trim) {
        Some(g) if !g.is_empty() => Ok(g.to_string()),
        _ => Err(ReportError::missing_input("--group", "グループ名が指定されていません")),
    }
}

fn required_source(value: Option<&str>, name: &str) -> Result<String> {
    value
        .map(str::to_string)
        .ok_or_else(|| ReportError::missing_input(name, format!("sources.{} が設定されていません", name)))
}

/// 取得・照合・描画まで（生成APIは呼ばない）
pub async fn prepare(
    options: &RunOptions,
    config: &Config,
    fetcher: &Fetcher,
) -> Result<PreparedReport> {
    let sources = &config.sources;

    // 1. セッション一覧
    step(1, "セッション一覧を取得中...");
    let sessions_source = Source::parse(&required_source(sources.sessions_url.as_deref(), "sessions_url")?);
    let known = sessions::fetch_sessions(fetcher, &sessions_source, &sources.session_selector).await?;
    println!("✔ {}件のセッションを検出\n", known.len());

    // 2. ライトニングトーク
    step(2, "ライトニングトーク表を取得中...");
    let talks_source = talks::talks_source(&required_source(sources.talks_url.as_deref(), "talks_url")?);
    let all_talks = talks::fetch_talks(
        fetcher,
        &talks_source,
        &sources.talk_columns,
        sources.talks_header_rows,
    )
    .await?;
    println!("✔ {}件のトークを読み込み\n", all_talks.len());

    // 3. 参加者
    step(3, "参加者リストを取得中...");
    let attendee_source = attendees::attendees_source(options.attendees.as_deref(), &options.work_dir);
    let attendee_list = attendees::load_attendees(fetcher, &attendee_source).await;
    match &attendee_list {
        Some(list) => println!("✔ {}名の参加者\n", list.len()),
        None => println!("⚠ 参加者リストなし: {}（\"Attendees list not available\" として続行）\n", attendee_source.name()),
    }

    // 4. 議事メモ
    step(4, "議事メモを取得中...");
    let notes_source = notes::notes_source(options.notes.as_deref(), &options.work_dir);
    let notes_text = notes::load_notes(fetcher, notes_source.as_ref()).await;
    match (&notes_text, &notes_source) {
        (Some(text), Some(src)) => println!("✔ {} ({} chars)\n", src.name(), text.len()),
        _ => println!("⚠ 議事メモなし（トーク概要のみで続行）\n"),
    }

    // 5. 照合・絞り込み
    step(5, "セッションを照合中...");
    let session = resolve_session(&options.group, &known)?;
    let selected = filter_talks(&all_talks, &session, &known)?;
    println!("✔ {} → {}件のトーク\n", session, selected.len());
    if options.verbose {
        for t in &selected {
            println!("  - {} ({}, {})", t.title, t.author, t.institution);
        }
    }

    // 6. プロンプト描画
    step(6, "プロンプトを生成中...");
    let template = config.load_master_prompt()?;
    let payload = render_prompt(
        &template,
        &session,
        &selected,
        attendee_list.as_deref(),
        notes_text.as_deref(),
    )?;
    println!("✔ プロンプト長: {} chars\n", payload.len());

    Ok(PreparedReport {
        session,
        talks: selected,
        payload,
        attendees_available: attendee_list.is_some(),
        notes_available: notes_text.is_some(),
    })
}

/// 一括実行
pub async fn run(options: &RunOptions, config: &Config) -> Result<RunOutcome> {
    let fetcher = Fetcher::new(config.generation.timeout_seconds)?;
    let prepared = prepare(options, config, &fetcher).await?;
    let session = &prepared.session;

    // 7. 生成・書き出し
    let output = if options.prompt_only {
        step(7, "プロンプトを保存中...");
        let path = options
            .output
            .clone()
            .unwrap_or_else(|| report::default_prompt_path(&options.work_dir, session));
        report::write_prompt(&path, &prepared.payload)?;
        path
    } else {
        step(7, "レポートを生成中...");
        let api_key = config.get_api_key()?;
        let generator =
            ReportGenerator::new(fetcher.client().clone(), config.generation.clone(), api_key);

        let spinner = indicatif::ProgressBar::new_spinner();
        spinner.set_message(format!("{} に問い合わせ中", generator.settings().model));
        spinner.enable_steady_tick(std::time::Duration::from_millis(120));
        let result = generator.generate(&prepared.payload).await;
        spinner.finish_and_clear();
        let content = result?;

        let path = options
            .output
            .clone()
            .unwrap_or_else(|| report::default_report_path(&options.work_dir, session));
        report::write_report(
            &path,
            session,
            &generator.settings().model,
            &content,
            chrono::Local::now(),
        )?;
        path
    };
    println!("✔ 保存: {}", output.display());

    Ok(RunOutcome {
        session: prepared.session.clone(),
        talk_count: prepared.talks.len(),
        attendees_available: prepared.attendees_available,
        notes_available: prepared.notes_available,
        output,
    })
}
