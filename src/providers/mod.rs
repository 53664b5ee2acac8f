//! Translation providers.
//!
//! Every provider shares the same outer contract ([`TranslationProvider`]):
//! configuration and locale checks, chunking, per-chunk retry, and degrading
//! failed chunks to empty values. Only the wire format differs per backend.
//!
//! # Adding a provider
//!
//! Add a [`ProviderKind`] variant, a backend module, and one arm in
//! [`Backend`]'s dispatch methods.

mod deepl;
mod google;
mod metrics;
mod openai;

pub use metrics::{MetricsReport, TranslationMetrics};

use crate::catalog::Catalog;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{bail, Result};
use deepl::DeepLBackend;
use google::GoogleBackend;
use openai::OpenAiBackend;
use std::fmt;
use tracing::{debug, error, warn};

/// Provider identifier, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    DeepL,
    Google,
}

impl ProviderKind {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "deepl" => Ok(ProviderKind::DeepL),
            "google" => Ok(ProviderKind::Google),
            other => bail!(
                "Unknown translation provider: '{}' (expected openai, deepl or google)",
                other
            ),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepL => "deepl",
            ProviderKind::Google => "google",
        }
    }

    /// Texts per request when no batch size is configured
    pub fn default_batch_size(&self) -> usize {
        match self {
            ProviderKind::OpenAi => 20,
            ProviderKind::DeepL => 50,
            ProviderKind::Google => 100,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wire-level implementation for one API.
#[derive(Debug)]
enum Backend {
    OpenAi(OpenAiBackend),
    DeepL(DeepLBackend),
    Google(GoogleBackend),
}

impl Backend {
    fn new(config: &ProviderConfig) -> Self {
        match config.kind {
            ProviderKind::OpenAi => Backend::OpenAi(OpenAiBackend::new(config)),
            ProviderKind::DeepL => Backend::DeepL(DeepLBackend::new(config)),
            ProviderKind::Google => Backend::Google(GoogleBackend::new(config)),
        }
    }

    fn supports(&self, locale: &str) -> bool {
        match self {
            Backend::OpenAi(_) => true,
            Backend::DeepL(b) => b.supports(locale),
            Backend::Google(_) => true,
        }
    }

    async fn call_api(
        &self,
        request: &ChunkRequest<'_>,
    ) -> Result<Vec<String>, ProviderError> {
        match self {
            Backend::OpenAi(b) => b.call_api(request).await,
            Backend::DeepL(b) => b.call_api(request).await,
            Backend::Google(b) => b.call_api(request).await,
        }
    }
}

/// Everything a backend needs to translate one chunk.
pub(crate) struct ChunkRequest<'a> {
    pub client: &'a reqwest::Client,
    pub config: &'a ProviderConfig,
    /// `(key, source text)` pairs in input order
    pub entries: &'a [(&'a str, &'a str)],
    pub target_locale: &'a str,
    pub source_locale: &'a str,
}

impl ChunkRequest<'_> {
    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, text)| *text).collect()
    }

    /// Look up a configured locale override.
    pub fn locale_override(&self, locale: &str) -> Option<&str> {
        self.config
            .locale_overrides
            .iter()
            .find(|(from, _)| from.eq_ignore_ascii_case(locale))
            .map(|(_, to)| to.as_str())
    }
}

/// Read the body of a failed response into an `Http` error.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
    Err(ProviderError::Http { status, body })
}

/// Reassemble a positional response into values aligned with the request.
///
/// A count mismatch means positions cannot be trusted, so the chunk fails.
pub(crate) fn align_positional(
    provider: &str,
    expected: usize,
    translations: Vec<String>,
) -> Result<Vec<String>, ProviderError> {
    if translations.len() != expected {
        return Err(ProviderError::MalformedResponse(format!(
            "{} returned {} translations for {} texts",
            provider,
            translations.len(),
            expected
        )));
    }
    Ok(translations)
}

/// A configured translation API.
#[derive(Debug)]
pub struct TranslationProvider {
    config: ProviderConfig,
    backend: Backend,
    client: reqwest::Client,
    metrics: TranslationMetrics,
}

impl TranslationProvider {
    /// Build the provider named by `config.kind`.
    pub fn from_config(config: ProviderConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self {
            backend: Backend::new(&config),
            config,
            client,
            metrics: TranslationMetrics::new(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.config.kind
    }

    pub fn name(&self) -> &'static str {
        self.config.kind.name()
    }

    /// True when the credential is present and non-empty.
    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn supports(&self, locale: &str) -> bool {
        self.backend.supports(locale)
    }

    pub fn batch_size(&self) -> usize {
        self.config
            .batch_size
            .unwrap_or_else(|| self.config.kind.default_batch_size())
            .max(1)
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Translate `texts` (key → source text) into `target_locale`.
    ///
    /// The result has exactly the input keys in input order. Keys whose chunk
    /// failed, or which the API left out, map to an empty string. Nothing is
    /// ever returned as an error.
    pub async fn translate_batch(
        &self,
        texts: &Catalog,
        target_locale: &str,
        source_locale: &str,
    ) -> Catalog {
        if texts.is_empty() {
            return Catalog::new();
        }

        if !self.is_configured() {
            warn!("{}", ProviderError::NotConfigured(self.name()));
            self.metrics.record_keys_failed(texts.len());
            return empty_values(texts);
        }

        if !self.supports(target_locale) {
            warn!(
                "{}",
                ProviderError::UnsupportedLocale {
                    provider: self.name(),
                    locale: target_locale.to_string(),
                }
            );
            self.metrics.record_keys_failed(texts.len());
            return empty_values(texts);
        }

        let entries: Vec<(&str, &str)> = texts.iter().collect();
        let mut results = Catalog::new();

        for chunk in entries.chunks(self.batch_size()) {
            let translated = match self.translate_chunk(chunk, target_locale, source_locale).await {
                Ok(values) => values,
                Err(e) => {
                    error!(
                        provider = self.name(),
                        locale = target_locale,
                        keys_count = chunk.len(),
                        error = %e,
                        "Translation failed for provider {}",
                        self.name()
                    );
                    vec![String::new(); chunk.len()]
                }
            };

            for ((key, _), value) in chunk.iter().zip(translated) {
                if value.is_empty() {
                    self.metrics.record_keys_failed(1);
                } else {
                    self.metrics.record_keys_translated(1);
                }
                results.insert(*key, value);
            }
        }

        results
    }

    /// Translate a single string; empty on failure.
    pub async fn translate(&self, text: &str, target_locale: &str, source_locale: &str) -> String {
        let texts = Catalog::from_iter([(text, text)]);
        let result = self
            .translate_batch(&texts, target_locale, source_locale)
            .await;
        result.get(text).unwrap_or_default().to_string()
    }

    async fn translate_chunk(
        &self,
        chunk: &[(&str, &str)],
        target_locale: &str,
        source_locale: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let request = ChunkRequest {
            client: &self.client,
            config: &self.config,
            entries: chunk,
            target_locale,
            source_locale,
        };
        let retry = RetryConfig::fixed(self.config.max_retries, self.config.retry_delay);
        let operation_name = format!("{} translation to {}", self.name(), target_locale);

        debug!(
            provider = self.name(),
            locale = target_locale,
            keys_count = chunk.len(),
            "Sending translation chunk"
        );

        self.metrics.record_api_call();
        let result = with_retry_if(
            &retry,
            &operation_name,
            || self.backend.call_api(&request),
            ProviderError::is_transient,
        )
        .await;

        if result.is_err() {
            self.metrics.record_api_failure();
        }
        result
    }
}

fn empty_values(texts: &Catalog) -> Catalog {
    texts.keys().map(|key| (key, "")).collect()
}
