use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;

/// Marks a PHP/JS variable inside a string
const INTERPOLATION_MARKER: char = '$';

/// Dotted keys such as `messages.welcome` are file-based lookups
const PATH_SEPARATOR: char = '.';

#[derive(Debug, Clone)]
pub struct KeyExtractor {
    patterns: Vec<Regex>,
}

impl KeyExtractor {
    /// Build matchers for the given function names.
    ///
    /// A leading `@` on a configured name is ignored: every name matches both
    /// the call form `name(...)` and the directive form `@name(...)`.
    pub fn new<S: AsRef<str>>(functions: &[S]) -> Result<Self> {
        let mut names: Vec<&str> = functions
            .iter()
            .map(|f| f.as_ref().trim().trim_start_matches('@'))
            .filter(|f| !f.is_empty())
            .collect();
        names.sort_unstable();
        names.dedup();

        let patterns = names
            .into_iter()
            .map(|name| {
                Regex::new(&call_pattern(name))
                    .with_context(|| format!("Invalid translation function name: {}", name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Keys in order of first appearance, duplicates removed.
    pub fn extract(&self, content: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.captures_iter(content) {
                let (literal, quote) = match (caps.name("single"), caps.name("double")) {
                    (Some(m), _) => (m, '\''),
                    (None, Some(m)) => (m, '"'),
                    (None, None) => continue,
                };
                let key = unescape(literal.as_str(), quote);
                if is_valid_key(&key) {
                    found.push((literal.start(), key));
                }
            }
        }

        found.sort_by_key(|(pos, _)| *pos);

        let mut seen = HashSet::new();
        found
            .into_iter()
            .filter_map(|(_, key)| seen.insert(key.clone()).then_some(key))
            .collect()
    }
}

/// `name ( 'literal' )` or `@name("literal", ...)`.
///
/// The literal must be followed by `,` or `)` so that concatenations such as
/// `__('Hello ' . $name)` are not half-extracted.
fn call_pattern(name: &str) -> String {
    let starts_with_word = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');
    let prefix = if starts_with_word { r"(?:@|\b)" } else { "@?" };

    format!(
        r#"{prefix}{name}\s*\(\s*(?:'(?P<single>(?:[^'\\]|\\.)*)'|"(?P<double>(?:[^"\\]|\\.)*)")\s*[,)]"#,
        prefix = prefix,
        name = regex::escape(name),
    )
}

/// Undo backslash escapes of the enclosing quote and of backslash itself.
fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == quote || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Non-empty, no interpolation marker, no dotted path.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(INTERPOLATION_MARKER) && !key.contains(PATH_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> KeyExtractor {
        KeyExtractor::new(&["__", "trans", "@lang"]).unwrap()
    }

    // ==================== Call Shapes ====================

    #[test]
    fn test_extracts_function_and_echo_forms() {
        let keys = extractor().extract("{{ __('Hello World') }}\n{{ trans(\"Welcome\") }}");
        assert_eq!(keys, vec!["Hello World", "Welcome"]);
    }

    #[test]
    fn test_extracts_directive_form() {
        let keys = extractor().extract("<h2>@lang('Customer Testimonials')</h2>");
        assert_eq!(keys, vec!["Customer Testimonials"]);
    }

    #[test]
    fn test_directive_form_for_plain_function_name() {
        let keys = extractor().extract("@trans('Directive trans')");
        assert_eq!(keys, vec!["Directive trans"]);
    }

    #[test]
    fn test_tolerates_whitespace() {
        let keys = extractor().extract("__   (   'Spaced out'   )\n__(\n    \"Multi line\"\n)");
        assert_eq!(keys, vec!["Spaced out", "Multi line"]);
    }

    #[test]
    fn test_first_argument_with_replacements() {
        let keys = extractor().extract("__('Welcome, :name', ['name' => $user->name])");
        assert_eq!(keys, vec!["Welcome, :name"]);
    }

    #[test]
    fn test_method_call_form() {
        let keys = extractor().extract("$translator->trans('From method')");
        assert_eq!(keys, vec!["From method"]);
    }

    #[test]
    fn test_name_must_not_be_suffix_of_identifier() {
        let keys = extractor().extract("mytrans('Nope') translate('Nope either') trans('Yes')");
        assert_eq!(keys, vec!["Yes"]);
    }

    #[test]
    fn test_adjacent_calls() {
        let keys = extractor().extract("__('One')__('Two')");
        assert_eq!(keys, vec!["One", "Two"]);
    }

    // ==================== Filtering ====================

    #[test]
    fn test_rejects_variable_marker() {
        let keys = extractor().extract("__('Hello $name') __(\"Hi {$user}\")");
        assert!(keys.is_empty());
    }

    #[test]
    fn test_rejects_dotted_keys() {
        let keys = extractor().extract("__('messages.welcome') __('Check out our latest offerings.')");
        assert!(keys.is_empty());
    }

    #[test]
    fn test_rejects_empty_literal() {
        assert!(extractor().extract("__('')").is_empty());
    }

    #[test]
    fn test_rejects_concatenation_and_variables() {
        let keys = extractor().extract("__('Hello ' . $name) __($key) trans(`Template`)");
        assert!(keys.is_empty());
    }

    #[test]
    fn test_rejects_mismatched_quotes() {
        assert!(extractor().extract("__('broken\")").is_empty());
    }

    // ==================== Ordering & Escapes ====================

    #[test]
    fn test_duplicates_collapse_in_first_seen_order() {
        let keys = extractor().extract("trans('B') __('A') @lang('B') __('C') __('A')");
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_escaped_quotes_are_unescaped() {
        let keys = extractor().extract(r#"__('It\'s here') __("Say \"hi\"")"#);
        assert_eq!(keys, vec!["It's here", "Say \"hi\""]);
    }

    #[test]
    fn test_keys_are_case_and_whitespace_sensitive() {
        let keys = extractor().extract("__('Save') __('save') __(' Save')");
        assert_eq!(keys, vec!["Save", "save", " Save"]);
    }

    #[test]
    fn test_unicode_keys() {
        let keys = extractor().extract("__('Selamat datang 👋') __('日本語')");
        assert_eq!(keys, vec!["Selamat datang 👋", "日本語"]);
    }

    #[test]
    fn test_custom_function_names() {
        let extractor = KeyExtractor::new(&["t", "$t"]).unwrap();
        let keys = extractor.extract("{{ $t('Vue key') }} t(\"Plain\")");
        assert_eq!(keys, vec!["Vue key", "Plain"]);
    }

    #[test]
    fn test_no_functions_extracts_nothing() {
        let extractor = KeyExtractor::new::<&str>(&[]).unwrap();
        assert!(extractor.extract("__('Hello')").is_empty());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("Hello World"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("Hello $name"));
        assert!(!is_valid_key("auth.failed"));
    }
}
