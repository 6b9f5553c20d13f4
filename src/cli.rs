use crate::ai_provider::AiProvider;
use clap::Parser;
use std::path::PathBuf;

const EXAMPLES: &str = "\
Examples:
  tpc-report --group DWARF
  tpc-report -g \"Evaluation and Benchmarking\" --attendees https://example.org/attendees.csv
  tpc-report -g DWARF --notes https://docs.google.com/document/d/<ID>/edit
  tpc-report -g DWARF --notes minutes.pdf --output reports/dwarf.txt
  tpc-report -g DWARF --prompt-only";

#[derive(Parser, Debug)]
#[command(name = "tpc-report")]
#[command(about = "TPCブレイクアウトセッションのレポート草稿を生成", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// グループ名・セッション名・略称（例: DWARF、--show-config 以外では必須）
    #[arg(short, long)]
    pub group: Option<String>,

    /// 参加者CSV（URLまたはパス、デフォルト: attendees.csv）
    #[arg(short, long)]
    pub attendees: Option<String>,

    /// 議事メモ（URL・DOCX・PDF・Google Docs、省略時はカレントのDOCX/PDFを探索）
    #[arg(short, long)]
    pub notes: Option<String>,

    /// 出力ファイル（デフォルト: draft_report_<略称>.txt）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 設定ファイル（YAML）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// セッション一覧ページ（設定ファイルの sources.sessions_url を上書き）
    #[arg(long)]
    pub sessions_url: Option<String>,

    /// ライトニングトーク表（設定ファイルの sources.talks_url を上書き）
    #[arg(long)]
    pub talks_url: Option<String>,

    /// AIプロバイダ（設定ファイルの generation.provider を上書き）
    #[arg(long)]
    pub ai_provider: Option<AiProvider>,

    /// モデル名（設定ファイルの generation.model を上書き）
    #[arg(long)]
    pub model: Option<String>,

    /// プロンプトを書き出すだけで生成APIを呼ばない
    #[arg(long)]
    pub prompt_only: bool,

    /// 設定を表示して終了
    #[arg(long)]
    pub show_config: bool,

    /// 詳細ログを出力
    #[arg(short, long)]
    pub verbose: bool,
}
