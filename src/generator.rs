//! レポート生成モジュール
//!
//! 描画済みプロンプトを生成APIに1回だけ送信し、応答テキストを返す。
//! プロバイダごとのリクエスト・レスポンス形式:
//! - OpenAI: chat/completions
//! - Anthropic: messages
//! - Gemini: generateContent

use crate::ai_provider::AiProvider;
use crate::config::GenerationSettings;
use crate::error::{ReportError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tpc_report_common::ReportPayload;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// OpenAI レスポンス
#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

/// Anthropic レスポンス
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Gemini レスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

/// プロバイダ別のリクエストボディ
pub fn build_request_body(settings: &GenerationSettings, prompt: &str) -> Value {
    match settings.provider {
        AiProvider::OpenAi => json!({
            "model": settings.model,
            "messages": [
                { "role": "system", "content": settings.system_prompt },
                { "role": "user", "content": prompt }
            ],
            "max_tokens": settings.max_tokens,
            "temperature": settings.temperature
        }),
        AiProvider::Anthropic => json!({
            "model": settings.model,
            "system": settings.system_prompt,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "max_tokens": settings.max_tokens,
            "temperature": settings.temperature
        }),
        AiProvider::Gemini => json!({
            "systemInstruction": { "parts": [ { "text": settings.system_prompt } ] },
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "maxOutputTokens": settings.max_tokens,
                "temperature": settings.temperature
            }
        }),
    }
}

/// プロバイダ別のレスポンスから本文を取り出す
pub fn extract_text(provider: AiProvider, body: &str) -> Result<String> {
    let parse_err = |e: serde_json::Error| {
        ReportError::Generation(format!("APIレスポンスのパースに失敗: {}", e))
    };

    let text = match provider {
        AiProvider::OpenAi => {
            let response: OpenAiResponse = serde_json::from_str(body).map_err(parse_err)?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default()
        }
        AiProvider::Anthropic => {
            let response: AnthropicResponse = serde_json::from_str(body).map_err(parse_err)?;
            response
                .content
                .into_iter()
                .filter(|b| b.kind == "text")
                .map(|b| b.text)
                .collect::<Vec<_>>()
                .join("")
        }
        AiProvider::Gemini => {
            let response: GeminiResponse = serde_json::from_str(body).map_err(parse_err)?;
            response
                .candidates
                .into_iter()
                .next()
                .map(|c| {
                    c.content
                        .parts
                        .into_iter()
                        .map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default()
        }
    };

    if text.trim().is_empty() {
        return Err(ReportError::Generation("APIレスポンスに本文がありません".into()));
    }

    Ok(text)
}

/// 生成APIクライアント
///
/// 設定とAPIキーは呼び出し側で構築して渡す。HTTPクライアントは取得処理と共有する。
pub struct ReportGenerator {
    client: reqwest::Client,
    settings: GenerationSettings,
    api_key: String,
}

impl ReportGenerator {
    pub fn new(client: reqwest::Client, settings: GenerationSettings, api_key: String) -> Self {
        Self {
            client,
            settings,
            api_key,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    fn request(&self, body: &Value) -> reqwest::RequestBuilder {
        let request = self.client.post(self.settings.endpoint_url()).json(body);
        match self.settings.provider {
            AiProvider::OpenAi => request.bearer_auth(&self.api_key),
            AiProvider::Anthropic => request
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            AiProvider::Gemini => request.header("x-goog-api-key", &self.api_key),
        }
    }

    /// プロンプトを送信して応答本文を返す（リトライなし）
    pub async fn generate(&self, payload: &ReportPayload) -> Result<String> {
        let body = build_request_body(&self.settings, payload.as_str());

        tracing::debug!(endpoint = %self.settings.endpoint_url(), "calling text generation API");

        let response = self
            .request(&body)
            .send()
            .await
            .map_err(|e| ReportError::Generation(format!("API呼び出しエラー: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ReportError::Generation(format!("APIレスポンスを読めません: {}", e)))?;

        if !status.is_success() {
            let snippet: String = text.chars().take(500).collect();
            return Err(ReportError::Generation(format!("HTTP {}: {}", status, snippet)));
        }

        extract_text(self.settings.provider, &text)
    }
}
