use serde::Serialize;
use serde_json::{Map, Value};

/// Ordered, unique key → value mapping. An empty value means untranslated.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    // preserve_order makes this an insertion-ordered map
    entries: Map<String, Value>,
}

// Order matters: two catalogs are equal only if they iterate identically.
impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for Catalog {}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every key untranslated, in the given order.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        for key in keys {
            catalog.insert_if_absent(key.into(), String::new());
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Set a value; an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Value::String(value.into()));
    }

    /// Insert only if the key is new. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, Value::String(value.into()));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keys whose value is empty, in catalog order.
    pub fn untranslated_keys(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| key.to_string())
            .collect()
    }

    /// Reorder entries lexicographically by key.
    pub fn sort_keys(&mut self) {
        let mut entries: Vec<(String, Value)> =
            std::mem::take(&mut self.entries).into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.entries = entries.into_iter().collect();
    }

    pub(crate) fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Build from a JSON object; every value must be a string.
    pub(crate) fn from_map(map: Map<String, Value>) -> Result<Self, String> {
        if let Some((key, _)) = map.iter().find(|(_, v)| !v.is_string()) {
            return Err(format!("value for key '{}' is not a string", key));
        }
        Ok(Self { entries: map })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Catalog {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut catalog = Catalog::new();
        for (key, value) in iter {
            catalog.insert(key, value);
        }
        catalog
    }
}

/// Combine freshly extracted keys with a previously stored catalog.
///
/// With `preserve_existing`, stored values win for shared keys and keys that
/// only exist in `existing` are kept. Without it, `existing` is ignored.
pub fn merge(
    extracted: &Catalog,
    existing: Option<&Catalog>,
    preserve_existing: bool,
    sort_keys: bool,
) -> Catalog {
    let mut merged = extracted.clone();

    if preserve_existing {
        if let Some(existing) = existing {
            for (key, value) in existing.iter() {
                merged.insert(key, value);
            }
        }
    }

    if sort_keys {
        merged.sort_keys();
    }

    merged
}

/// Completion figures for a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub translated: usize,
    pub untranslated: usize,
    /// Translated share in percent, two decimals
    pub percentage: f64,
    /// Values filled by a provider during this run
    pub ai_translated: usize,
    /// Keys a provider was asked for but returned nothing
    pub ai_failed: usize,
}

impl CatalogStats {
    pub fn with_automation(mut self, ai_translated: usize, ai_failed: usize) -> Self {
        self.ai_translated = ai_translated;
        self.ai_failed = ai_failed;
        self
    }
}

pub fn stats(catalog: &Catalog) -> CatalogStats {
    let total = catalog.len();
    let translated = catalog.iter().filter(|(_, v)| !v.is_empty()).count();
    let percentage = if total > 0 {
        let raw = translated as f64 / total as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    } else {
        0.0
    };

    CatalogStats {
        total,
        translated,
        untranslated: total - translated,
        percentage,
        ai_translated: 0,
        ai_failed: 0,
    }
}
