//! Topical grouping of untranslated keys.
//!
//! Keys are sent to the provider one group at a time so that related strings
//! share terminology. Categories are checked in order and the first one whose
//! keyword appears in the key (case-insensitive, whole word) wins. Keys that
//! match nothing land in the catch-all `other` group.

use anyhow::{bail, Context, Result};
use regex::Regex;

/// Name of the catch-all group.
pub const CATCH_ALL: &str = "other";

const AUTH_KEYWORDS: &[&str] = &[
    "login",
    "log in",
    "logout",
    "log out",
    "sign in",
    "sign out",
    "sign up",
    "register",
    "password",
    "username",
    "email",
    "account",
    "forgot",
    "remember me",
    "verify",
    "authentication",
];

const VALIDATION_KEYWORDS: &[&str] = &[
    "required",
    "invalid",
    "valid",
    "must",
    "field",
    "error",
    "minimum",
    "maximum",
    "characters",
    "format",
    "match",
    "at least",
];

const UI_KEYWORDS: &[&str] = &[
    "save",
    "cancel",
    "delete",
    "edit",
    "submit",
    "close",
    "back",
    "next",
    "previous",
    "search",
    "create",
    "update",
    "confirm",
    "menu",
    "home",
    "dashboard",
    "settings",
    "welcome",
];

/// A named keyword group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new<S: Into<String>>(name: impl Into<String>, keywords: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse `name:kw1|kw2;name2:kw3`. Empty segments are ignored.
    pub fn parse_list(raw: &str) -> Result<Vec<Category>> {
        raw.split(';')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (name, keywords) = segment.split_once(':').with_context(|| {
                    format!("Invalid category '{}', expected name:keyword|keyword", segment)
                })?;

                let name = name.trim();
                if name.is_empty() {
                    bail!("Category '{}' has no name", segment);
                }

                let keywords: Vec<String> = keywords
                    .split('|')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect();
                if keywords.is_empty() {
                    bail!("Category '{}' has no keywords", name);
                }

                Ok(Category::new(name, keywords))
            })
            .collect()
    }
}

#[derive(Debug)]
struct Matcher {
    name: String,
    pattern: Regex,
}

/// Ordered category list used to partition keys.
#[derive(Debug)]
pub struct CategoryPolicy {
    matchers: Vec<Matcher>,
}

impl CategoryPolicy {
    /// Categories checked in exactly the given order.
    pub fn new(categories: &[Category]) -> Result<Self> {
        let mut matchers = Vec::with_capacity(categories.len());

        for category in categories {
            if category.keywords.is_empty() {
                continue;
            }
            let alternatives: Vec<String> =
                category.keywords.iter().map(|k| regex::escape(k)).collect();
            let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
                .with_context(|| format!("Invalid keywords for category '{}'", category.name))?;

            matchers.push(Matcher {
                name: category.name.clone(),
                pattern,
            });
        }

        Ok(Self { matchers })
    }

    /// `auth`, `validation`, then `extras`, then `ui`.
    pub fn with_extras(extras: &[Category]) -> Result<Self> {
        let mut categories = vec![
            Category::new("auth", AUTH_KEYWORDS.iter().copied()),
            Category::new("validation", VALIDATION_KEYWORDS.iter().copied()),
        ];
        categories.extend(extras.iter().cloned());
        categories.push(Category::new("ui", UI_KEYWORDS.iter().copied()));

        Self::new(&categories)
    }

    /// Name of the first category matching `key`.
    pub fn categorize(&self, key: &str) -> &str {
        self.matchers
            .iter()
            .find(|m| m.pattern.is_match(key))
            .map(|m| m.name.as_str())
            .unwrap_or(CATCH_ALL)
    }

    /// Split `keys` into groups in policy order, `other` last.
    ///
    /// Every key lands in exactly one group, groups keep input order, and
    /// empty groups are left out.
    pub fn partition<I, S>(&self, keys: I) -> Vec<(String, Vec<String>)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buckets: Vec<(String, Vec<String>)> = self
            .matchers
            .iter()
            .map(|m| (m.name.clone(), Vec::new()))
            .collect();
        buckets.push((CATCH_ALL.to_string(), Vec::new()));

        for key in keys {
            let key = key.into();
            let index = self
                .matchers
                .iter()
                .position(|m| m.pattern.is_match(&key))
                .unwrap_or(self.matchers.len());
            buckets[index].1.push(key);
        }

        buckets.retain(|(_, keys)| !keys.is_empty());
        buckets
    }
}
