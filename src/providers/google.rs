use super::{align_positional, check_status, ChunkRequest};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

const DEFAULT_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Serialize)]
struct GoogleRequest<'a> {
    q: Vec<&'a str>,
    target: &'a str,
    source: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

#[derive(Debug)]
pub(crate) struct GoogleBackend {
    api_url: String,
}

impl GoogleBackend {
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
        let body = GoogleRequest {
            q: request.texts(),
            target: request
                .locale_override(request.target_locale)
                .unwrap_or(request.target_locale),
            source: request
                .locale_override(request.source_locale)
                .unwrap_or(request.source_locale),
            format: "text",
        };

        let api_key = config.api_key.as_deref().unwrap_or_default();
        let response = request
            .client
            .post(&self.api_url)
            .query(&[("key", api_key)])
            .timeout(config.timeout)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let parsed: GoogleResponse = response.json().await?;
        align_positional(
            "google",
            request.entries.len(),
            parsed
                .data
                .translations
                .into_iter()
                .map(|t| t.translated_text)
                .collect(),
        )
    }
}
