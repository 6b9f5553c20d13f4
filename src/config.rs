use crate::ai_provider::AiProvider;
use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tpc_report_common::{TalkColumns, DEFAULT_MASTER_PROMPT};

const CONFIG_FILE_NAME: &str = "tpc_report.yaml";
const SECRETS_FILE_NAME: &str = "secrets.yml";

/// 生成API設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: AiProvider,
    pub model: String,
    /// 省略時はプロバイダ既定のURL
    pub endpoint: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// 省略時はHTTPクライアント既定
    pub timeout_seconds: Option<u64>,
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        let provider = AiProvider::default();
        Self {
            provider,
            model: provider.default_model().into(),
            endpoint: None,
            max_tokens: 4000,
            temperature: 0.7,
            timeout_seconds: None,
            system_prompt: "You are a helpful assistant that generates detailed session reports for technical conferences.".into(),
        }
    }
}

impl GenerationSettings {
    /// モデル名を埋め込んだエンドポイントURL
    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .replace("{model}", &self.model)
    }
}

/// 入力データの取得元
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// セッション一覧ページ（URLまたはローカルHTML）
    pub sessions_url: Option<String>,
    /// セッション名を抜き出すCSSセレクタ
    pub session_selector: String,
    /// ライトニングトーク表（Google Sheets URL・xlsx・csv）
    pub talks_url: Option<String>,
    pub talk_columns: TalkColumns,
    pub talks_header_rows: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            sessions_url: None,
            session_selector: "h2, h3".into(),
            talks_url: None,
            talk_columns: TalkColumns::default(),
            talks_header_rows: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    /// `master_prompt` キーを持つYAML。省略時は組み込みテンプレート
    pub master_prompt: Option<PathBuf>,
    pub generation: GenerationSettings,
    pub sources: SourceSettings,
}

/// secrets.yml の形式
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Secrets {
    api_key: Option<String>,
    openai_api_key: Option<String>,
}

/// マスタープロンプトYAMLの形式
#[derive(Debug, Deserialize)]
struct MasterPromptFile {
    master_prompt: Option<String>,
}

impl Config {
    /// 設定を読み込み
    ///
    /// 探索順: 明示パス → ./tpc_report.yaml → ~/.config/tpc-report/config.yaml → 既定値
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) if !p.exists() => {
                return Err(ReportError::Config(format!(
                    "設定ファイルが見つかりません: {}",
                    p.display()
                )))
            }
            Some(p) => Some(p.to_path_buf()),
            None => Self::locate(),
        };

        let mut config = match &path {
            Some(p) => Self::from_yaml(&std::fs::read_to_string(p)?)?,
            None => Self::default(),
        };

        let base_dir = path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if config.api_key.is_none() {
            config.api_key = Self::read_secrets(&base_dir.join(SECRETS_FILE_NAME))
                .or_else(|| Self::read_secrets(Path::new(SECRETS_FILE_NAME)));
        }

        // 相対パスは設定ファイル基準で解決
        if let Some(prompt) = &config.master_prompt {
            if prompt.is_relative() && path.is_some() {
                config.master_prompt = Some(base_dir.join(prompt));
            }
        }

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Config = serde_yaml::from_str(content)?;
        if config.generation.model.trim().is_empty() {
            config.generation.model = config.generation.provider.default_model().into();
        }
        Ok(config)
    }

    fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        Self::user_config_path().filter(|p| p.exists())
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("tpc-report").join("config.yaml"))
    }

    fn read_secrets(path: &Path) -> Option<String> {
        let content = std::fs::read_to_string(path).ok()?;
        let secrets: Secrets = match serde_yaml::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "secrets file is not valid YAML");
                return None;
            }
        };
        secrets.api_key.or(secrets.openai_api_key)
    }

    /// APIキーを取得（環境変数を優先）
    pub fn get_api_key(&self) -> Result<String> {
        let env_name = self.generation.provider.api_key_env();
        resolve_api_key(std::env::var(env_name).ok(), self.api_key.as_deref())
            .ok_or(ReportError::MissingApiKey(env_name))
    }

    /// マスタープロンプトを取得
    pub fn load_master_prompt(&self) -> Result<String> {
        let Some(path) = &self.master_prompt else {
            return Ok(DEFAULT_MASTER_PROMPT.to_string());
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("マスタープロンプトを読めません {}: {}", path.display(), e))
        })?;
        let file: MasterPromptFile = serde_yaml::from_str(&content)?;

        file.master_prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                ReportError::Config(format!(
                    "master_prompt キーがありません: {}",
                    path.display()
                ))
            })
    }
}

fn resolve_api_key(env_value: Option<String>, configured: Option<&str>) -> Option<String> {
    env_value
        .filter(|k| !k.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.generation.provider, AiProvider::OpenAi);
        assert_eq!(config.generation.max_tokens, 4000);
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.sources.session_selector, "h2, h3");
        assert_eq!(config.sources.talks_header_rows, 1);
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
generation:
  provider: anthropic
  model: ""
  temperature: 0.2
sources:
  talks_url: talks.csv
  talk_columns:
    session: 7
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.generation.provider, AiProvider::Anthropic);
        assert_eq!(config.generation.model, "claude-sonnet-4-20250514");
        assert_eq!(config.generation.max_tokens, 4000);
        assert_eq!(config.sources.talks_url.as_deref(), Some("talks.csv"));
        assert_eq!(config.sources.talk_columns.session, 7);
        assert_eq!(config.sources.talk_columns.author, 0);
    }

    #[test]
    fn test_from_yaml_empty() {
        let config = Config::from_yaml("  \n").unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_from_yaml_invalid() {
        let err = Config::from_yaml("generation: [1, 2").unwrap_err();
        assert_eq!(err.tag(), "[CONFIG_ERROR]");
    }

    #[test]
    fn test_endpoint_url() {
        let mut settings = GenerationSettings {
            provider: AiProvider::Gemini,
            model: "gemini-2.0-flash".into(),
            ..Default::default()
        };
        assert_eq!(
            settings.endpoint_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );

        settings.endpoint = Some("http://localhost:8080/v1/chat/completions".into());
        assert_eq!(settings.endpoint_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(resolve_api_key(Some("env".into()), Some("cfg")), Some("env".into()));
        assert_eq!(resolve_api_key(Some("  ".into()), Some("cfg")), Some("cfg".into()));
        assert_eq!(resolve_api_key(None, Some("cfg")), Some("cfg".into()));
        assert_eq!(resolve_api_key(None, Some("")), None);
        assert_eq!(resolve_api_key(None, None), None);
    }

    #[test]
    fn test_load_explicit_with_secrets() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("report.yaml");
        std::fs::write(&config_path, "master_prompt: prompt.yaml\n").unwrap();
        std::fs::write(dir.path().join("secrets.yml"), "openai_api_key: sk-test\n").unwrap();

        let config = Config::load(Some(&config_path)).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.master_prompt, Some(dir.path().join("prompt.yaml")));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/tpc_report.yaml"))).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_load_master_prompt() {
        let dir = tempdir().unwrap();
        let prompt_path = dir.path().join("prompt.yaml");
        std::fs::write(
            &prompt_path,
            "master_prompt: |\n  Report on {{SESSION_NAME}}\n  {{LIGHTNING_TALKS}}\n",
        )
        .unwrap();

        let config = Config {
            master_prompt: Some(prompt_path),
            ..Default::default()
        };
        let prompt = config.load_master_prompt().unwrap();
        assert!(prompt.starts_with("Report on {{SESSION_NAME}}"));

        let builtin = Config::default().load_master_prompt().unwrap();
        assert_eq!(builtin, DEFAULT_MASTER_PROMPT);
    }

    #[test]
    fn test_load_master_prompt_missing_key() {
        let dir = tempdir().unwrap();
        let prompt_path = dir.path().join("prompt.yaml");
        std::fs::write(&prompt_path, "other: value\n").unwrap();

        let config = Config {
            master_prompt: Some(prompt_path),
            ..Default::default()
        };
        assert!(matches!(config.load_master_prompt(), Err(ReportError::Config(_))));
    }
}
