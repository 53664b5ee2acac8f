//! DeepL backend.
//!
//! DeepL only accepts its own language codes, so locales go through a fixed
//! table (plus any configured overrides) and anything else is unsupported.

use super::{align_positional, check_status, ChunkRequest};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

const DEFAULT_API_URL: &str = "https://api-free.deepl.com/v2/translate";

/// Application locale → DeepL language code
const LOCALE_CODES: &[(&str, &str)] = &[
    ("en", "EN"),
    ("id", "ID"),
    ("de", "DE"),
    ("fr", "FR"),
    ("es", "ES"),
    ("it", "IT"),
    ("ja", "JA"),
    ("ko", "KO"),
    ("nl", "NL"),
    ("pl", "PL"),
    ("pt", "PT"),
    ("ru", "RU"),
    ("zh", "ZH"),
    ("ar", "AR"),
    ("cs", "CS"),
    ("da", "DA"),
    ("el", "EL"),
    ("et", "ET"),
    ("fi", "FI"),
    ("hu", "HU"),
    ("lt", "LT"),
    ("lv", "LV"),
    ("no", "NB"),
    ("ro", "RO"),
    ("sk", "SK"),
    ("sl", "SL"),
    ("sv", "SV"),
    ("tr", "TR"),
    ("uk", "UK"),
];

#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    text: Vec<&'a str>,
    source_lang: String,
    target_lang: String,
    formality: &'static str,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

#[derive(Debug)]
pub(crate) struct DeepLBackend {
    api_url: String,
    overrides: Vec<(String, String)>,
}

impl DeepLBackend {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            overrides: config.locale_overrides.clone(),
        }
    }

    fn override_for(&self, locale: &str) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(from, _)| from.eq_ignore_ascii_case(locale))
            .map(|(_, to)| to.as_str())
    }

    fn table_code(locale: &str) -> Option<&'static str> {
        LOCALE_CODES
            .iter()
            .find(|(from, _)| from.eq_ignore_ascii_case(locale))
            .map(|(_, code)| *code)
    }

    pub fn supports(&self, locale: &str) -> bool {
        self.override_for(locale).is_some() || Self::table_code(locale).is_some()
    }

    /// DeepL code for `locale`; unmapped locales are uppercased as-is.
    fn code_for(&self, locale: &str) -> String {
        self.override_for(locale)
            .map(str::to_string)
            .or_else(|| Self::table_code(locale).map(str::to_string))
            .unwrap_or_else(|| locale.to_ascii_uppercase())
    }

    pub async fn call_api(&self, request: &ChunkRequest<'_>) -> Result<Vec<String>, ProviderError> {
        let config = request.config;
        let body = DeepLRequest {
            text: request.texts(),
            source_lang: self.code_for(request.source_locale),
            target_lang: self.code_for(request.target_locale),
            formality: "default",
        };

        let api_key = config.api_key.as_deref().unwrap_or_default();
        let response = request
            .client
            .post(&self.api_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", api_key))
            .timeout(config.timeout)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let parsed: DeepLResponse = response.json().await?;
        align_positional(
            "deepl",
            request.entries.len(),
            parsed.translations.into_iter().map(|t| t.text).collect(),
        )
    }
}
