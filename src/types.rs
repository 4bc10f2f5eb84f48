use serde::{Deserialize, Serialize};

/// One logical table served by the source application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Table name, used for keyset names and ledger/keyset file names
    pub name: String,

    /// Name of the downstream cache that must be frozen during migration
    pub cache: String,

    /// URL the full record collection is fetched from
    pub get_url: String,

    /// URL rewritten records are posted to (and deleted from, by id suffix)
    pub save_url: String,
}

impl Table {
    pub fn new(
        name: impl Into<String>,
        cache: impl Into<String>,
        get_url: impl Into<String>,
        save_url: impl Into<String>,
    ) -> Self {
        Table {
            name: name.into(),
            cache: cache.into(),
            get_url: get_url.into(),
            save_url: save_url.into(),
        }
    }
}

/// A named collection of translation key/text pairs for one table
///
/// Keys are `"<record-id>.<normalized-path>"`, unique by construction because
/// (id, path) pairs are unique within one table's record set. Pair order is
/// kept as emitted so generated files stay reviewable.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyset {
    pub name: String,
    pub pairs: Vec<(String, String)>,
}

impl Keyset {
    pub fn new(name: impl Into<String>) -> Self {
        Keyset {
            name: name.into(),
            pairs: Vec::new(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.pairs.push((key.into(), text.into()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// On-disk shape of a persisted keyset file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysetFile {
    #[serde(rename = "Keyset")]
    pub keyset: String,

    #[serde(rename = "Pairs")]
    pub pairs: serde_json::Map<String, serde_json::Value>,
}

/// A record rewritten in place: externalized text replaced by lookup keys
#[derive(Debug, Clone)]
pub struct RewrittenRecord {
    /// Source record id discovered at path `id`
    pub id: i64,

    /// The rewritten JSON document
    pub json: String,
}

/// Response body returned by the source application on record save
#[derive(Debug, Deserialize)]
pub struct SavedId {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyset_accumulation() {
        let mut keyset = Keyset::new("table1");
        keyset.push("7.title", "Hello");
        keyset.push("7.blocks.text", "World");

        assert_eq!(keyset.len(), 2);
        assert_eq!(keyset.pairs[0], ("7.title".to_string(), "Hello".to_string()));
    }

    #[test]
    fn test_keyset_file_field_names() {
        let raw = r#"{"Keyset": "table1", "Pairs": {"7.title": "Hello"}}"#;
        let parsed: KeysetFile = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.keyset, "table1");
        assert_eq!(parsed.pairs.get("7.title").unwrap(), "Hello");
    }
}
