use crate::categories::Category;
use crate::providers::ProviderKind;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Which files to scan and which calls count as translation calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRule {
    /// Root directories to walk
    pub paths: Vec<PathBuf>,
    /// Function names recognised as translation calls (`__`, `trans`, `@lang`)
    pub functions: Vec<String>,
    /// Allowed file name suffixes without the leading dot (`php`, `blade.php`)
    pub extensions: Vec<String>,
    /// Directory names (or `a/b` segment runs) skipped during the walk
    pub exclude: Vec<String>,
}

impl Default for ScanRule {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("resources/views")],
            functions: to_strings(&["__", "trans", "@lang"]),
            extensions: to_strings(&["php", "blade.php"]),
            exclude: to_strings(&["vendor", "node_modules", "storage"]),
        }
    }
}

/// On-disk encoding of a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// `<lang_path>/<locale>.json`
    Json,
    /// `<lang_path>/<locale>/<file_name>` containing `return [...];`
    PhpArray,
}

impl CatalogFormat {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(CatalogFormat::Json),
            "php" => Ok(CatalogFormat::PhpArray),
            other => anyhow::bail!("Unknown catalog format: '{}' (expected json or php)", other),
        }
    }
}

/// Settings for one translation provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    /// Endpoint override; each provider has its own default
    pub api_url: Option<String>,
    /// Chat model (OpenAI only)
    pub model: String,
    /// Sampling temperature (OpenAI only)
    pub temperature: f32,
    /// Max texts per request; `None` uses the provider default
    pub batch_size: Option<usize>,
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
    /// Optional hint such as "e-commerce platform"
    pub domain_context: Option<String>,
    /// Extra locale code mappings layered over the provider's own table
    pub locale_overrides: Vec<(String, String)>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: None,
            api_url: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            batch_size: None,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_millis(100),
            domain_context: None,
            locale_overrides: Vec::new(),
        }
    }
}

/// Automated translation settings.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub enabled: bool,
    pub source_locale: String,
    /// Partition keys by category before sending them to the provider
    pub group_related_keys: bool,
    /// Domain-specific categories checked after `auth` and `validation`
    pub extra_categories: Vec<Category>,
    pub provider: ProviderConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_locale: "en".to_string(),
            group_related_keys: true,
            extra_categories: Vec::new(),
            provider: ProviderConfig::new(ProviderKind::OpenAi),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Catalog
    pub locale: String,
    pub lang_path: PathBuf,
    pub format: CatalogFormat,
    pub file_name: String,
    pub preserve_existing: bool,
    pub sort_keys: bool,

    // Scanning
    pub scan: ScanRule,

    // Automated translation
    pub ai: AiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "id".to_string(),
            lang_path: PathBuf::from("lang"),
            format: CatalogFormat::Json,
            file_name: "messages.php".to_string(),
            preserve_existing: true,
            sort_keys: true,
            scan: ScanRule::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let kind = match env_opt("TRANSLATION_AI_PROVIDER") {
            Some(name) => ProviderKind::from_name(&name)?,
            None => ProviderKind::OpenAi,
        };

        let api_key = match kind {
            ProviderKind::OpenAi => env_opt("OPENAI_API_KEY"),
            ProviderKind::DeepL => env_opt("DEEPL_API_KEY"),
            ProviderKind::Google => env_opt("GOOGLE_TRANSLATE_API_KEY"),
        };
        let api_url = match kind {
            ProviderKind::OpenAi => env_opt("OPENAI_API_URL"),
            ProviderKind::DeepL => env_opt("DEEPL_API_URL"),
            ProviderKind::Google => env_opt("GOOGLE_TRANSLATE_API_URL"),
        };

        let provider = ProviderConfig {
            kind,
            api_key,
            api_url,
            model: env_opt("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            temperature: env_parse("OPENAI_TEMPERATURE", 0.3),
            batch_size: env_opt("TRANSLATION_AI_BATCH_SIZE").and_then(|v| v.parse().ok()),
            timeout: Duration::from_secs(env_parse("TRANSLATION_AI_TIMEOUT", 30)),
            max_retries: env_parse("TRANSLATION_AI_MAX_RETRIES", 2),
            retry_delay: Duration::from_millis(env_parse("TRANSLATION_AI_RETRY_DELAY_MS", 100)),
            domain_context: env_opt("TRANSLATION_AI_DOMAIN"),
            locale_overrides: match env_opt("TRANSLATION_AI_LOCALE_MAP") {
                Some(raw) => parse_locale_map(&raw)?,
                None => Vec::new(),
            },
        };

        let extra_categories = match env_opt("TRANSLATION_AI_CATEGORIES") {
            Some(raw) => Category::parse_list(&raw).context("Invalid TRANSLATION_AI_CATEGORIES")?,
            None => Vec::new(),
        };

        Ok(Self {
            // Catalog
            locale: env_opt("TRANSLATION_LOCALE").unwrap_or(defaults.locale),
            lang_path: env_opt("TRANSLATION_LANG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.lang_path),
            format: match env_opt("TRANSLATION_FORMAT") {
                Some(name) => CatalogFormat::from_name(&name)?,
                None => defaults.format,
            },
            file_name: env_opt("TRANSLATION_FILE_NAME").unwrap_or(defaults.file_name),
            preserve_existing: env_bool("TRANSLATION_PRESERVE_EXISTING", defaults.preserve_existing),
            sort_keys: env_bool("TRANSLATION_SORT_KEYS", defaults.sort_keys),

            // Scanning
            scan: ScanRule {
                paths: env_list("TRANSLATION_PATHS")
                    .map(|paths| paths.into_iter().map(PathBuf::from).collect())
                    .unwrap_or(defaults.scan.paths),
                functions: env_list("TRANSLATION_FUNCTIONS").unwrap_or(defaults.scan.functions),
                extensions: env_list("TRANSLATION_EXTENSIONS")
                    .unwrap_or(defaults.scan.extensions),
                exclude: env_list("TRANSLATION_EXCLUDE").unwrap_or(defaults.scan.exclude),
            },

            // Automated translation
            ai: AiConfig {
                enabled: env_bool("TRANSLATION_AI_ENABLED", false),
                source_locale: env_opt("TRANSLATION_AI_SOURCE").unwrap_or_else(|| "en".to_string()),
                group_related_keys: env_bool("TRANSLATION_AI_GROUP_KEYS", true),
                extra_categories,
                provider,
            },
        })
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Read a variable, treating blank values as unset
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env_opt(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    match env_opt(name).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

/// Comma-separated list; `None` when unset or empty
fn env_list(name: &str) -> Option<Vec<String>> {
    let items: Vec<String> = env_opt(name)?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Parse `no:NB,pt-br:PT-BR`
fn parse_locale_map(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (from, to) = pair
                .split_once(':')
                .with_context(|| format!("Invalid locale mapping '{}', expected from:TO", pair))?;
            Ok((from.trim().to_string(), to.trim().to_string()))
        })
        .collect()
}
