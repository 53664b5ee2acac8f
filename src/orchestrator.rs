use crate::catalog::{self, Catalog, CatalogStats};
use crate::categories::CategoryPolicy;
use crate::config::Config;
use crate::extractor::KeyExtractor;
use crate::fs::Filesystem;
use crate::providers::{MetricsReport, ProviderKind, TranslationProvider};
use crate::store::CatalogStore;
use crate::walker::FileWalker;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const SAMPLE_KEYS: usize = 5;

/// Per-run overrides, mirroring the command-line flags.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Target locale instead of the configured one
    pub locale: Option<String>,
    /// Ignore the stored catalog and start from the extracted keys
    pub force: bool,
    /// Fill untranslated keys with the configured provider
    pub translate: bool,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub locale: String,
    /// Unique keys extracted from the scanned files
    pub keys_found: usize,
    /// First few extracted keys, in extraction order
    pub sample_keys: Vec<String>,
    /// File written, `None` when no keys were found
    pub catalog_path: Option<PathBuf>,
    pub stats: CatalogStats,
    /// Provider used for automated translation, if any
    pub provider: Option<ProviderKind>,
    pub metrics: Option<MetricsReport>,
}

/// Counts from the automated fill phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillOutcome {
    pub translated: usize,
    pub failed: usize,
}

pub struct Orchestrator<'a, F: Filesystem + ?Sized> {
    config: &'a Config,
    fs: &'a F,
}

impl<'a, F: Filesystem + ?Sized> Orchestrator<'a, F> {
    pub fn new(config: &'a Config, fs: &'a F) -> Self {
        Self { config, fs }
    }

    /// Every unique key in the configured paths, in first-seen order.
    ///
    /// Roots that are not directories are skipped. Files that cannot be read
    /// are logged and skipped.
    pub fn extract_keys(&self) -> Result<Vec<String>> {
        let extractor = KeyExtractor::new(self.config.scan.functions.as_slice())
            .context("Invalid translation function list")?;
        let walker = FileWalker::new(self.fs, &self.config.scan);

        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        for root in &self.config.scan.paths {
            if !self.fs.is_directory(root) {
                debug!("Skipping {}: not a directory", root.display());
                continue;
            }

            let files = walker
                .walk(root)
                .with_context(|| format!("Failed to list files under {}", root.display()))?;

            for path in files {
                let content = match self.fs.read_file(&path) {
                    Ok(content) => content,
                    Err(e) => {
                        warn!("Skipping unreadable file {}: {}", path.display(), e);
                        continue;
                    }
                };

                for key in extractor.extract(&content) {
                    if seen.insert(key.clone()) {
                        keys.push(key);
                    }
                }
            }
        }

        Ok(keys)
    }

    /// Execute a full run.
    ///
    /// Only storage and listing failures are returned as errors; provider
    /// problems end up in the report counters.
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport> {
        let locale = options
            .locale
            .clone()
            .unwrap_or_else(|| self.config.locale.clone());
        let preserve_existing = self.config.preserve_existing && !options.force;
        let translate = self.config.ai.enabled || options.translate;

        let keys = self.extract_keys()?;
        info!("Found {} unique translation keys", keys.len());

        if keys.is_empty() {
            return Ok(RunReport {
                locale,
                keys_found: 0,
                sample_keys: Vec::new(),
                catalog_path: None,
                stats: catalog::stats(&Catalog::new()),
                provider: None,
                metrics: None,
            });
        }

        let store = CatalogStore::from_config(self.fs, self.config);
        let existing = if preserve_existing {
            store.load(&locale)?
        } else {
            None
        };

        let extracted = Catalog::from_keys(&keys);
        let mut merged = catalog::merge(
            &extracted,
            existing.as_ref(),
            preserve_existing,
            self.config.sort_keys,
        );

        let mut outcome = FillOutcome::default();
        let mut provider_used = None;
        let mut metrics = None;

        if translate {
            let provider = TranslationProvider::from_config(self.config.ai.provider.clone());
            info!("AI translation enabled ({})", provider.name());

            outcome = self.fill_missing(&mut merged, &provider, &locale).await?;
            provider_used = Some(provider.kind());
            metrics = Some(provider.metrics().report());
        }

        let path = store.persist(&merged, &locale)?;
        info!("Translations saved to {}", path.display());

        Ok(RunReport {
            locale,
            keys_found: keys.len(),
            sample_keys: keys.iter().take(SAMPLE_KEYS).cloned().collect(),
            catalog_path: Some(path),
            stats: catalog::stats(&merged).with_automation(outcome.translated, outcome.failed),
            provider: provider_used,
            metrics,
        })
    }

    /// Ask `provider` for every key whose value is still empty.
    ///
    /// The key text doubles as the source text. With grouping enabled the
    /// keys go out one category at a time.
    pub async fn fill_missing(
        &self,
        catalog: &mut Catalog,
        provider: &TranslationProvider,
        locale: &str,
    ) -> Result<FillOutcome> {
        let missing = catalog.untranslated_keys();
        if missing.is_empty() {
            debug!("No untranslated keys for {}", locale);
            return Ok(FillOutcome::default());
        }

        let groups = if self.config.ai.group_related_keys {
            CategoryPolicy::with_extras(&self.config.ai.extra_categories)?.partition(missing)
        } else {
            vec![("all".to_string(), missing)]
        };

        let mut outcome = FillOutcome::default();
        for (category, keys) in groups {
            info!(
                provider = provider.name(),
                locale = locale,
                category = category.as_str(),
                keys_count = keys.len(),
                "Translating group"
            );

            let texts: Catalog = keys.iter().map(|k| (k.as_str(), k.as_str())).collect();
            let translated = provider
                .translate_batch(&texts, locale, &self.config.ai.source_locale)
                .await;

            for (key, value) in translated.iter() {
                if value.is_empty() {
                    outcome.failed += 1;
                } else {
                    catalog.insert(key, value);
                    outcome.translated += 1;
                }
            }
        }

        if outcome.failed > 0 {
            warn!(
                locale = locale,
                failed = outcome.failed,
                "{} keys could not be translated",
                outcome.failed
            );
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CatalogFormat, ProviderConfig, ScanRule};
    use crate::fs::LocalFs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn test_config(root: &Path) -> Config {
        Config {
            lang_path: root.join("lang"),
            scan: ScanRule {
                paths: vec![root.join("views")],
                ..ScanRule::default()
            },
            ..Config::default()
        }
    }

    fn google_config(uri: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: Some("test-api-key".to_string()),
            api_url: Some(uri.to_string()),
            retry_delay: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
            ..ProviderConfig::new(ProviderKind::Google)
        }
    }

    fn google_response(values: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "data": {
                "translations": values
                    .iter()
                    .map(|v| serde_json::json!({ "translatedText": v }))
                    .collect::<Vec<_>>()
            }
        })
    }

    // ==================== Extraction ====================

    #[test]
    fn test_extract_keys_across_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/home.blade.php", "{{ __('Welcome') }} @lang('Hello')");
        write(temp.path(), "views/partials/nav.blade.php", "{{ trans(\"Welcome\") }} {{ __('Menu') }}");
        write(temp.path(), "views/vendor/pkg.blade.php", "{{ __('Vendored') }}");
        write(temp.path(), "views/notes.txt", "{{ __('Ignored') }}");

        let config = test_config(temp.path());
        let keys = Orchestrator::new(&config, &LocalFs).extract_keys().unwrap();

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["Hello", "Menu", "Welcome"]);
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(temp.path());
        config.scan.paths.push(temp.path().join("does-not-exist"));

        let keys = Orchestrator::new(&config, &LocalFs).extract_keys().unwrap();
        assert!(keys.is_empty());
    }

    // ==================== Run ====================

    #[tokio::test]
    async fn test_zero_keys_persists_nothing() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/empty.blade.php", "<p>No calls here</p>");
        let config = test_config(temp.path());

        let report = Orchestrator::new(&config, &LocalFs)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.keys_found, 0);
        assert!(report.catalog_path.is_none());
        assert_eq!(report.stats.total, 0);
        assert!(!temp.path().join("lang").exists());
    }

    #[tokio::test]
    async fn test_run_preserves_existing_values() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Save') }} {{ __('Cancel') }}");
        write(temp.path(), "lang/id.json", "{\"Save\": \"Simpan\", \"Legacy\": \"Lama\"}");
        let config = test_config(temp.path());

        let report = Orchestrator::new(&config, &LocalFs)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.keys_found, 2);
        assert_eq!(report.sample_keys, vec!["Save", "Cancel"]);
        assert_eq!(report.stats.total, 3);
        assert_eq!(report.stats.translated, 2);

        let written = std::fs::read_to_string(temp.path().join("lang/id.json")).unwrap();
        assert_eq!(
            written,
            "{\n    \"Cancel\": \"\",\n    \"Legacy\": \"Lama\",\n    \"Save\": \"Simpan\"\n}\n"
        );
    }

    #[tokio::test]
    async fn test_unsorted_run_keeps_first_seen_order() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Zeta') }} {{ __('Alpha') }}");
        write(temp.path(), "views/b/c.blade.php", "{{ trans('Mid') }} {{ __('Alpha') }}");
        write(temp.path(), "views/vendor.php", "<?php echo __('Last'); ?>");
        write(temp.path(), "lang/id.json", "{\"Legacy\": \"Lama\", \"Alpha\": \"Alfa\"}");
        let mut config = test_config(temp.path());
        config.sort_keys = false;

        let report = Orchestrator::new(&config, &LocalFs)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.sample_keys, vec!["Zeta", "Alpha", "Mid", "Last"]);
        let written = std::fs::read_to_string(temp.path().join("lang/id.json")).unwrap();
        assert_eq!(
            written,
            "{\n    \"Zeta\": \"\",\n    \"Alpha\": \"Alfa\",\n    \"Mid\": \"\",\n    \"Last\": \"\",\n    \"Legacy\": \"Lama\"\n}\n"
        );
    }

    #[tokio::test]
    async fn test_force_discards_existing_values() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Save') }}");
        write(temp.path(), "lang/id.json", "{\"Save\": \"Simpan\", \"Legacy\": \"Lama\"}");
        let config = test_config(temp.path());

        let options = RunOptions {
            force: true,
            ..RunOptions::default()
        };
        let report = Orchestrator::new(&config, &LocalFs).run(&options).await.unwrap();

        assert_eq!(report.stats.total, 1);
        assert_eq!(report.stats.untranslated, 1);
    }

    #[tokio::test]
    async fn test_force_ignores_corrupt_catalog() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Save') }}");
        write(temp.path(), "lang/id.json", "{corrupt");
        let config = test_config(temp.path());

        let orchestrator = Orchestrator::new(&config, &LocalFs);
        assert!(orchestrator.run(&RunOptions::default()).await.is_err());

        let options = RunOptions {
            force: true,
            ..RunOptions::default()
        };
        assert!(orchestrator.run(&options).await.is_ok());
    }

    #[tokio::test]
    async fn test_locale_override_and_php_format() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Hello') }}");
        let mut config = test_config(temp.path());
        config.format = CatalogFormat::PhpArray;

        let options = RunOptions {
            locale: Some("es".to_string()),
            ..RunOptions::default()
        };
        let report = Orchestrator::new(&config, &LocalFs).run(&options).await.unwrap();

        assert_eq!(report.locale, "es");
        let path = report.catalog_path.unwrap();
        assert_eq!(path, temp.path().join("lang/es/messages.php"));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "<?php\n\nreturn [\n    'Hello' => '',\n];\n"
        );
    }

    #[tokio::test]
    async fn test_php_catalog_keeps_nested_groups() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Hello') }} {{ __('Zebra') }}");
        write(
            temp.path(),
            "lang/id/messages.php",
            "<?php\n\ndeclare(strict_types=1);\n\nreturn [\n    'auth' => [\n        'failed' => 'Gagal',\n        'throttle' => 'Terlalu banyak',\n    ],\n    'Hello' => 'Halo',\n];\n",
        );
        let mut config = test_config(temp.path());
        config.format = CatalogFormat::PhpArray;

        let report = Orchestrator::new(&config, &LocalFs)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.stats.total, 4);
        assert_eq!(report.stats.translated, 3);
        assert_eq!(
            std::fs::read_to_string(report.catalog_path.unwrap()).unwrap(),
            "<?php\n\nreturn [\n    'Hello' => 'Halo',\n    'Zebra' => '',\n    'auth' => [\n        'failed' => 'Gagal',\n        'throttle' => 'Terlalu banyak',\n    ],\n];\n"
        );
    }

    #[tokio::test]
    async fn test_unwritable_catalog_is_fatal() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Hello') }}");
        // A file where the language directory should be
        std::fs::write(temp.path().join("lang"), "blocker").unwrap();
        let mut config = test_config(temp.path());
        config.format = CatalogFormat::PhpArray;

        let result = Orchestrator::new(&config, &LocalFs)
            .run(&RunOptions::default())
            .await;

        assert!(result.is_err());
    }

    // ==================== Automated Translation ====================

    #[tokio::test]
    async fn test_translate_fills_only_missing_keys() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(google_response(&["Batal"])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Save') }} {{ __('Cancel') }}");
        write(temp.path(), "lang/id.json", "{\"Save\": \"Simpan\"}");
        let mut config = test_config(temp.path());
        config.ai.provider = google_config(&mock_server.uri());

        let options = RunOptions {
            translate: true,
            ..RunOptions::default()
        };
        let report = Orchestrator::new(&config, &LocalFs).run(&options).await.unwrap();

        assert_eq!(report.stats.translated, 2);
        assert_eq!(report.stats.ai_translated, 1);
        assert_eq!(report.stats.ai_failed, 0);
        assert_eq!(report.provider, Some(ProviderKind::Google));
        assert_eq!(report.metrics.unwrap().api_calls, 1);

        let written = std::fs::read_to_string(temp.path().join("lang/id.json")).unwrap();
        assert!(written.contains("\"Cancel\": \"Batal\""));
        assert!(written.contains("\"Save\": \"Simpan\""));
    }

    #[tokio::test]
    async fn test_grouping_sends_one_request_per_category() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(google_response(&["x"])))
            .expect(2)
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Login') }} {{ __('Our story') }}");
        let mut config = test_config(temp.path());
        config.ai.enabled = true;
        config.ai.provider = google_config(&mock_server.uri());

        let report = Orchestrator::new(&config, &LocalFs)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.stats.ai_translated, 2);
    }

    #[tokio::test]
    async fn test_provider_failure_is_counted_not_fatal() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Hello') }} {{ __('World') }}");
        let mut config = test_config(temp.path());
        config.ai.group_related_keys = false;
        config.ai.provider = google_config(&mock_server.uri());

        let options = RunOptions {
            translate: true,
            ..RunOptions::default()
        };
        let report = Orchestrator::new(&config, &LocalFs).run(&options).await.unwrap();

        assert_eq!(report.stats.ai_translated, 0);
        assert_eq!(report.stats.ai_failed, 2);
        assert_eq!(report.stats.untranslated, 2);
        assert!(report.catalog_path.unwrap().exists());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_counts_failures() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "views/a.blade.php", "{{ __('Hello') }}");
        let mut config = test_config(temp.path());
        config.ai.enabled = true;

        let report = Orchestrator::new(&config, &LocalFs)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(report.stats.ai_failed, 1);
        assert_eq!(report.metrics.unwrap().api_calls, 0);
    }
}
