use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("必須データを取得できません ({source_name}): {reason}")]
    MissingInput { source_name: String, reason: String },

    #[error("セッションが見つかりません: \"{query}\"（既知のセッション {}件）", .known.len())]
    SessionNotFound { query: String, known: Vec<String> },

    #[error("セッションを1件に特定できません: \"{query}\"（候補 {}件）", .candidates.len())]
    AmbiguousSession { query: String, candidates: Vec<String> },

    #[error("データ検証エラー: {0}")]
    DataValidation(String),

    #[error("レポート生成エラー: {0}")]
    Generation(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。環境変数 {0} か設定ファイルの api_key で指定してください")]
    MissingApiKey(&'static str),

    #[error("YAML解析エラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// スクリプトから分岐できる固定タグ
    pub fn tag(&self) -> &'static str {
        match self {
            ReportError::MissingInput { .. } => "[MISSING_INPUT]",
            ReportError::SessionNotFound { .. } | ReportError::AmbiguousSession { .. } => {
                "[SESSION_NOT_FOUND]"
            }
            ReportError::DataValidation(_) => "[DATA_VALIDATION_FAILED]",
            ReportError::Generation(_) => "[GENERATION_FAILED]",
            ReportError::Config(_) | ReportError::MissingApiKey(_) | ReportError::Yaml(_) => {
                "[CONFIG_ERROR]"
            }
            ReportError::Io(_) => "[IO_ERROR]",
        }
    }

    /// プロセス終了コード
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::MissingInput { .. } => 10,
            ReportError::SessionNotFound { .. } | ReportError::AmbiguousSession { .. } => 11,
            ReportError::DataValidation(_) => 12,
            ReportError::Generation(_) => 13,
            _ => 1,
        }
    }

    /// 診断ファイルに追記する補足情報
    pub fn diagnostic_context(&self) -> Vec<String> {
        match self {
            ReportError::SessionNotFound { known, .. } => {
                let mut lines = vec!["Known sessions:".to_string()];
                lines.extend(known.iter().map(|s| format!("  - {}", s)));
                lines
            }
            ReportError::AmbiguousSession { candidates, .. } => {
                let mut lines = vec!["Candidate sessions:".to_string()];
                lines.extend(candidates.iter().map(|s| format!("  - {}", s)));
                lines
            }
            ReportError::MissingInput { source_name, .. } => {
                vec![format!("Source: {}", source_name)]
            }
            _ => Vec::new(),
        }
    }

    pub fn missing_input(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ReportError::MissingInput {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// 共通ライブラリのエラーはすべて入力データの不整合
impl From<tpc_report_common::Error> for ReportError {
    fn from(err: tpc_report_common::Error) -> Self {
        ReportError::DataValidation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
