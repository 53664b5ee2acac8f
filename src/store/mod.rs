//! Catalog persistence per locale.
//!
//! A catalog lives either at `<lang_path>/<locale>.json` or, in PHP array
//! format, at `<lang_path>/<locale>/<file_name>`. Saving always rewrites the
//! whole file; merging with what is on disk is the caller's job.

mod php;

use crate::catalog::Catalog;
use crate::config::{CatalogFormat, Config};
use crate::error::StoreError;
use crate::fs::Filesystem;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CatalogStore<'a, F: Filesystem + ?Sized> {
    fs: &'a F,
    lang_path: PathBuf,
    format: CatalogFormat,
    file_name: String,
}

impl<'a, F: Filesystem + ?Sized> CatalogStore<'a, F> {
    pub fn new(
        fs: &'a F,
        lang_path: impl Into<PathBuf>,
        format: CatalogFormat,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            lang_path: lang_path.into(),
            format,
            file_name: file_name.into(),
        }
    }

    pub fn from_config(fs: &'a F, config: &Config) -> Self {
        Self::new(fs, &config.lang_path, config.format, &config.file_name)
    }

    /// Where the catalog for `locale` is stored.
    pub fn path_for(&self, locale: &str) -> PathBuf {
        match self.format {
            CatalogFormat::Json => self.lang_path.join(format!("{}.json", locale)),
            CatalogFormat::PhpArray => self.lang_path.join(locale).join(&self.file_name),
        }
    }

    /// Load the stored catalog, or `None` if there is none yet.
    ///
    /// A file that exists but cannot be parsed is an error rather than an empty
    /// catalog, so a later save cannot silently discard its contents.
    pub fn load(&self, locale: &str) -> Result<Option<Catalog>, StoreError> {
        let path = self.path_for(locale);
        if !self.fs.exists(&path) {
            return Ok(None);
        }

        let content = self
            .fs
            .read_file(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        let catalog = decode(self.format, &content).map_err(|reason| StoreError::Parse {
            path: path.clone(),
            reason,
        })?;

        debug!("Loaded {} entries from {}", catalog.len(), path.display());
        Ok(Some(catalog))
    }

    /// Overwrite the stored catalog for `locale`, creating parent directories.
    pub fn persist(&self, catalog: &Catalog, locale: &str) -> Result<PathBuf, StoreError> {
        let path = self.path_for(locale);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !self.fs.is_directory(parent) {
                self.fs
                    .make_directory(parent)
                    .map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let content = encode(self.format, catalog).map_err(|reason| StoreError::Parse {
            path: path.clone(),
            reason,
        })?;
        self.fs
            .write_file(&path, &content)
            .map_err(|e| StoreError::io(&path, e))?;

        debug!("Wrote {} entries to {}", catalog.len(), path.display());
        Ok(path)
    }

    pub fn lang_path(&self) -> &Path {
        &self.lang_path
    }
}

fn encode(format: CatalogFormat, catalog: &Catalog) -> Result<String, String> {
    match format {
        CatalogFormat::Json => encode_json(catalog),
        CatalogFormat::PhpArray => Ok(php::encode(catalog)),
    }
}

fn decode(format: CatalogFormat, content: &str) -> Result<Catalog, String> {
    match format {
        CatalogFormat::Json => decode_json(content),
        CatalogFormat::PhpArray => php::decode(content),
    }
}

/// Pretty JSON, four-space indent, literal Unicode, trailing newline
fn encode_json(catalog: &Catalog) -> Result<String, String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    catalog
        .as_map()
        .serialize(&mut serializer)
        .map_err(|e| e.to_string())?;
    let mut out = String::from_utf8(buf).map_err(|e| e.to_string())?;
    out.push('\n');
    Ok(out)
}

fn decode_json(content: &str) -> Result<Catalog, String> {
    if content.trim().is_empty() {
        return Ok(Catalog::new());
    }
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    match value {
        serde_json::Value::Object(map) => Catalog::from_map(map),
        _ => Err("expected a JSON object".to_string()),
    }
}
