//! Eligibility rules deciding which scalars hold localizable text.
//!
//! Both output modes (keyset extraction and record rewriting) go through
//! [`Classifier::is_externalizable`]; there is deliberately no second
//! code path for either mode to diverge on.

use crate::config::Config;
use crate::walk::Token;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Collection-index prefix stripped when a path becomes a translation key,
/// e.g. `items.3.title` -> `title`
static COLLECTION_INDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^items\.\d+\.").expect("collection index pattern")
});

/// Path suffixes that are never localizable, checked before anything else
const SKIP_SUFFIXES: [&str; 3] = ["type", "coloroption", "color"];

/// A path must contain one of these to be considered localizable
const TEXT_MARKERS: [&str; 4] = ["text", "title", "description", "caption"];

/// Path- and value-based predicates for text externalization
#[derive(Debug, Clone)]
pub struct Classifier {
    color_prefix: String,
    url_marker: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier {
            color_prefix: "#".to_string(),
            url_marker: "://".to_string(),
        }
    }
}

impl Classifier {
    pub fn new(color_prefix: impl Into<String>, url_marker: impl Into<String>) -> Self {
        Classifier {
            color_prefix: color_prefix.into(),
            url_marker: url_marker.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Classifier::new(&config.color_prefix, &config.url_marker)
    }

    /// Strip the leading collection-index segment from a rendered path
    pub fn normalize_path(path: &str) -> Cow<'_, str> {
        COLLECTION_INDEX.replace(path, "")
    }

    /// Path predicate. Suffix exclusion wins over marker matches: a path
    /// containing `text` is still ineligible when it ends in `type`,
    /// `coloroption` or `color`.
    pub fn path_eligible(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        if SKIP_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
            return false;
        }
        TEXT_MARKERS.iter().any(|marker| lower.contains(marker))
    }

    /// Value predicate: color literals, URLs and blank strings stay put
    pub fn value_eligible(&self, value: &str) -> bool {
        if !self.color_prefix.is_empty() && value.starts_with(&self.color_prefix) {
            return false;
        }
        if !self.url_marker.is_empty() && value.contains(&self.url_marker) {
            return false;
        }
        !value.trim().is_empty()
    }

    /// A scalar is externalizable iff it is a string, sits under a
    /// non-empty object key, and both its (normalized) path and its value
    /// are eligible. `path` is the raw rendered path.
    pub fn is_externalizable(&self, path: &str, key: Option<&str>, token: &Token) -> bool {
        let Some(value) = token.as_str() else {
            return false;
        };
        if !key.is_some_and(|k| !k.is_empty()) {
            return false;
        }
        let normalized = Self::normalize_path(path);
        self.path_eligible(&normalized) && self.value_eligible(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_leading_collection_index() {
        assert_eq!(Classifier::normalize_path("items.3.title"), "title");
        assert_eq!(Classifier::normalize_path("items.12.blocks.0.text"), "blocks.0.text");
        // only the leading collection prefix is stripped
        assert_eq!(Classifier::normalize_path("blocks.2.text"), "blocks.2.text");
        assert_eq!(Classifier::normalize_path("title"), "title");
    }

    #[test]
    fn test_suffix_exclusion_beats_markers() {
        let c = Classifier::default();
        for path in ["texttype", "title.color", "description.colorOption", "cardType"] {
            assert!(!c.path_eligible(path), "{path} should be ineligible");
        }
    }

    #[test]
    fn test_marker_required() {
        let c = Classifier::default();
        assert!(c.path_eligible("title"));
        assert!(c.path_eligible("blocks.0.text"));
        assert!(c.path_eligible("header.Description"));
        assert!(c.path_eligible("imageCaption"));
        assert!(!c.path_eligible("id"));
        assert!(!c.path_eligible("blocks.0.weight"));
    }

    #[test]
    fn test_value_rules() {
        let c = Classifier::default();
        assert!(c.value_eligible("Hello"));
        assert!(!c.value_eligible("#ff0000"));
        assert!(!c.value_eligible("https://example.com/a"));
        assert!(!c.value_eligible(""));
        assert!(!c.value_eligible("   \t\n"));
    }

    #[test]
    fn test_externalizable_needs_string_token_and_key() {
        let c = Classifier::default();
        let text = Token::String("Hello".to_string());
        assert!(c.is_externalizable("title", Some("title"), &text));
        // numbers are never text
        assert!(!c.is_externalizable("title", Some("title"), &Token::Number("1".into())));
        // array element without a key
        assert!(!c.is_externalizable("titles.0", None, &text));
        assert!(!c.is_externalizable("title", Some(""), &text));
    }

    #[test]
    fn test_normalized_path_drives_classification() {
        let c = Classifier::default();
        let text = Token::String("Hello".to_string());
        assert!(c.is_externalizable("items.4.title", Some("title"), &text));
        assert!(!c.is_externalizable("items.4.color", Some("color"), &text));
    }
}
