//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// 必須カラムが見つからない（ヘッダー名の変更など）
    #[error("{source_name}: required column `{column}` is missing")]
    MissingColumn { source_name: String, column: String },

    /// セッションは特定できたが該当トークが0件
    #[error("session `{0}` matched but has no lightning talks")]
    NoTalksForSession(String),

    /// テンプレートに必須の差し込み領域がない
    #[error("prompt template is missing region marker {0}")]
    MissingTemplateRegion(&'static str),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
