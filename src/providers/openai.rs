//! OpenAI-style chat completion backend.
//!
//! The chunk is sent as a JSON object (key → text) and the model is asked to
//! answer with a JSON object only. Anything that does not parse as an object
//! fails the whole chunk.

use super::{check_status, ChunkRequest};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

#[derive(Debug)]
pub(crate) struct OpenAiBackend {
    api_url: String,
}

impl OpenAiBackend {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    pub async fn call_api(&self, request: &ChunkRequest<'_>) -> Result<Vec<String>, ProviderError> {
        let config = request.config;
        let target = request
            .locale_override(request.target_locale)
            .unwrap_or(request.target_locale);
        let source = request
            .locale_override(request.source_locale)
            .unwrap_or(request.source_locale);

        let body = TranslationRequest {
            model: config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_system_prompt(target, config.domain_context.as_deref()),
                },
                Message {
                    role: "user".to_string(),
                    content: build_user_prompt(request.entries, target, source),
                },
            ],
            // Reasoning models don't support temperature
            temperature: if is_reasoning_model(&config.model) {
                None
            } else {
                Some(config.temperature)
            },
        };

        let api_key = config.api_key.as_deref().unwrap_or_default();
        let response = request
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .timeout(config.timeout)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let chat_response: ChatResponse = response.json().await?;
        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("OpenAI response contained no choices".into())
            })?;

        parse_content(content, request.entries)
    }
}

/// Build the system prompt with optional domain context
fn build_system_prompt(target_locale: &str, domain_context: Option<&str>) -> String {
    let mut prompt = String::from("You are a professional translator.");

    if let Some(domain) = domain_context.filter(|d| !d.trim().is_empty()) {
        prompt.push_str(&format!(
            " You specialize in translating content for a {} application.",
            domain
        ));
    }

    prompt.push_str(&format!(
        " Translate the provided strings to {}, maintaining the same tone, style, and technical accuracy. \
Return ONLY a valid JSON object with the original strings as keys and translations as values. \
Do not add any explanation or markdown formatting.",
        target_locale
    ));

    prompt
}

/// Build the user prompt carrying the chunk as pretty JSON
fn build_user_prompt(entries: &[(&str, &str)], target_locale: &str, source_locale: &str) -> String {
    let object: Map<String, Value> = entries
        .iter()
        .map(|(key, text)| (key.to_string(), Value::String(text.to_string())))
        .collect();
    let json = serde_json::to_string_pretty(&object).unwrap_or_else(|_| "{}".to_string());

    format!(
        "Translate the following JSON object from {} to {}. Maintain the keys exactly as they are, only translate the values:\n\n{}",
        source_locale, target_locale, json
    )
}

/// Remove a surrounding ```json ... ``` fence if the model added one
fn strip_code_fence(content: &str) -> &str {
    let mut text = content.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches("json"),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Map the model's JSON object back onto the request keys.
///
/// The model is told to key by source text; fall back to the catalog key.
fn parse_content(content: &str, entries: &[(&str, &str)]) -> Result<Vec<String>, ProviderError> {
    let cleaned = strip_code_fence(content);
    let translated: Map<String, Value> = match serde_json::from_str(cleaned) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(ProviderError::MalformedResponse(
                "OpenAI reply is not a JSON object".into(),
            ))
        }
        Err(e) => {
            return Err(ProviderError::MalformedResponse(format!(
                "Failed to parse OpenAI reply as JSON: {}",
                e
            )))
        }
    };

    Ok(entries
        .iter()
        .map(|(key, text)| {
            translated
                .get(*text)
                .or_else(|| translated.get(*key))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect())
}
