//! 一括処理テスト
//!
//! ローカルファイルの取得元で照合・絞り込み・描画・書き出しまでを検証（生成APIは呼ばない）

use std::path::Path;
use tempfile::{tempdir, TempDir};
use tpc_report::config::Config;
use tpc_report::error::ReportError;
use tpc_report::fetcher::Fetcher;
use tpc_report::pipeline::{self, RunOptions};
use tpc_report::report;
use tpc_report_common::{attendee_region, count_talk_blocks, ATTENDEES_UNAVAILABLE, NOTES_UNAVAILABLE};

const DWARF: &str = "Data, Workflows, Agents, and Reasoning Frameworks (DWARF)";

const SESSIONS_HTML: &str = r#"<html><body>
<h2>Data, Workflows, Agents, and Reasoning Frameworks (DWARF)</h2>
<h2>Evaluation and Benchmarking (EVAL)</h2>
<h2>Applications in Biology and Life Sciences (BIO)</h2>
</body></html>"#;

const ATTENDEES_CSV: &str = "First,Last,Organization
Ada,Lovelace,Argonne National Laboratory
Grace,Hopper,Oak Ridge National Laboratory
";

fn talks_csv(dwarf_count: usize) -> String {
    let mut csv = String::from("Author,Institution,Title,Abstract,Session\n");
    for i in 0..dwarf_count {
        csv.push_str(&format!(
            "Author {i},Lab {i},Workflow talk {i},\"Abstract {i}: agents, workflows and provenance.\",DWARF\n"
        ));
        csv.push_str(&format!("Other {i},Lab,Benchmark talk {i},Evaluating things.,EVAL\n"));
    }
    csv
}

/// 取得元ファイルを用意して設定を返す
fn fixture(dwarf_count: usize) -> (TempDir, Config) {
    let dir = tempdir().expect("Failed to create temp dir");
    let sessions = dir.path().join("sessions.html");
    let talks = dir.path().join("talks.csv");
    std::fs::write(&sessions, SESSIONS_HTML).unwrap();
    std::fs::write(&talks, talks_csv(dwarf_count)).unwrap();

    let mut config = Config::default();
    config.sources.sessions_url = Some(sessions.display().to_string());
    config.sources.talks_url = Some(talks.display().to_string());
    config.sources.session_selector = "h2".into();
    (dir, config)
}

fn options(dir: &Path, group: &str) -> RunOptions {
    RunOptions {
        group: group.to_string(),
        prompt_only: true,
        work_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_prompt_only_run_with_all_sources() {
    let (dir, config) = fixture(3);
    std::fs::write(dir.path().join("attendees.csv"), ATTENDEES_CSV).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "Consensus on shared agent benchmarks.").unwrap();

    let mut opts = options(dir.path(), "dwarf");
    opts.notes = Some(dir.path().join("notes.txt").display().to_string());

    let outcome = pipeline::run(&opts, &config).await.expect("run failed");
    assert_eq!(outcome.session, DWARF);
    assert_eq!(outcome.talk_count, 3);
    assert!(outcome.attendees_available);
    assert!(outcome.notes_available);
    assert_eq!(outcome.output, dir.path().join("prompt_dwarf.txt"));

    let prompt = std::fs::read_to_string(&outcome.output).unwrap();
    assert_eq!(count_talk_blocks(&prompt), 3);
    assert!(prompt.contains("Workflow talk 2"));
    assert!(!prompt.contains("Benchmark talk"));
    assert!(prompt.contains("| Ada Lovelace | Argonne National Laboratory |"));
    assert!(prompt.contains("Consensus on shared agent benchmarks."));
}

#[tokio::test]
async fn test_missing_optional_sources_degrade() {
    let (dir, config) = fixture(1);
    let opts = options(dir.path(), "DWARF");

    let outcome = pipeline::run(&opts, &config).await.expect("run failed");
    assert!(!outcome.attendees_available);
    assert!(!outcome.notes_available);

    let prompt = std::fs::read_to_string(&outcome.output).unwrap();
    assert_eq!(attendee_region(&prompt), Some(ATTENDEES_UNAVAILABLE));
    assert!(prompt.contains(NOTES_UNAVAILABLE));
}

#[tokio::test]
async fn test_no_truncation_for_large_sessions() {
    for n in [1, 16, 50] {
        let (dir, config) = fixture(n);
        let fetcher = Fetcher::new(None).unwrap();
        let prepared = pipeline::prepare(&options(dir.path(), "DWARF"), &config, &fetcher)
            .await
            .expect("prepare failed");
        assert_eq!(prepared.talks.len(), n);
        assert_eq!(count_talk_blocks(prepared.payload.as_str()), n);
    }
}

#[tokio::test]
async fn test_custom_output_path() {
    let (dir, config) = fixture(2);
    let mut opts = options(dir.path(), "Reasoning Frameworks");
    opts.output = Some(dir.path().join("out").join("custom.txt"));

    let outcome = pipeline::run(&opts, &config).await.unwrap();
    assert_eq!(outcome.output, dir.path().join("out").join("custom.txt"));
    assert!(outcome.output.exists());
}

#[tokio::test]
async fn test_session_not_found() {
    let (dir, config) = fixture(1);
    let err = pipeline::run(&options(dir.path(), "Quantum Foo"), &config)
        .await
        .unwrap_err();

    match &err {
        ReportError::SessionNotFound { known, .. } => {
            assert_eq!(known.len(), 3);
            assert!(known.contains(&DWARF.to_string()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.exit_code(), 11);
}

#[tokio::test]
async fn test_session_without_talks_is_validation_failure() {
    let (dir, config) = fixture(2);
    let err = pipeline::run(&options(dir.path(), "BIO"), &config)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), "[DATA_VALIDATION_FAILED]");
}

#[tokio::test]
async fn test_missing_talk_sheet_is_missing_input() {
    let (dir, mut config) = fixture(1);
    config.sources.talks_url = Some(dir.path().join("nope.xlsx").display().to_string());

    let err = pipeline::run(&options(dir.path(), "DWARF"), &config)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), "[MISSING_INPUT]");
}

#[tokio::test]
async fn test_unconfigured_sessions_url() {
    let (dir, mut config) = fixture(1);
    config.sources.sessions_url = None;

    let err = pipeline::run(&options(dir.path(), "DWARF"), &config)
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 10);
}

#[tokio::test]
async fn test_generation_requires_api_key() {
    let (dir, mut config) = fixture(1);
    config.api_key = None;
    // 環境変数にキーがある場合はスキップ
    if std::env::var(config.generation.provider.api_key_env()).is_ok() {
        eprintln!("API key present in environment; skipping");
        return;
    }

    let mut opts = options(dir.path(), "DWARF");
    opts.prompt_only = false;
    let err = pipeline::run(&opts, &config).await.unwrap_err();
    assert!(matches!(err, ReportError::MissingApiKey(_)));
}

#[tokio::test]
async fn test_overlapping_session_names_keep_talks_apart() {
    let dir = tempdir().unwrap();
    let sessions = dir.path().join("sessions.html");
    let talks = dir.path().join("talks.csv");
    std::fs::write(
        &sessions,
        "<h2>AI for Science</h2><h2>Trustworthy AI for Science (TAIS)</h2>",
    )
    .unwrap();
    std::fs::write(
        &talks,
        "Author,Institution,Title,Abstract,Session\n\
         A,Lab,Belongs to TAIS,Trust.,Trustworthy AI for Science (TAIS)\n\
         B,Lab,Belongs to AI for Science,Science.,AI for Science\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.sources.sessions_url = Some(sessions.display().to_string());
    config.sources.talks_url = Some(talks.display().to_string());
    config.sources.session_selector = "h2".into();

    let fetcher = Fetcher::new(None).unwrap();
    let prepared = pipeline::prepare(&options(dir.path(), "AI for Science"), &config, &fetcher)
        .await
        .expect("prepare failed");
    assert_eq!(prepared.session, "AI for Science");
    let titles: Vec<&str> = prepared.talks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Belongs to AI for Science"]);
}

#[test]
fn test_missing_group_writes_tagged_diagnostic() {
    let dir = tempdir().unwrap();
    let err = pipeline::require_group(None).unwrap_err();
    assert_eq!(err.exit_code(), 10);

    let path = report::write_diagnostic(dir.path(), &err, None, chrono::Local::now()).unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("Error: [MISSING_INPUT]"));
    assert!(content.contains("Exit code: 10"));
    assert!(content.contains("Source: --group"));
}
