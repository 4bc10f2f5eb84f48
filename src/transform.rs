//! Record transformation: two output modes over one traversal.
//!
//! Keyset extraction walks a whole per-table collection and pulls every
//! externalizable string into a [`Keyset`]. Record rewriting mirrors one
//! record token for token, substituting a synthetic lookup key wherever
//! the classifier fires. Both modes share the classifier, so a scalar is
//! rewritten iff it would also land in the keyset.

use crate::build::JsonBuilder;
use crate::classify::Classifier;
use crate::config::Config;
use crate::error::{Result, SiphonError};
use crate::types::{Keyset, RewrittenRecord};
use crate::walk::{Event, PathSegment, Walker};
use tracing::warn;

/// Outcome of handling one traversal event. A skip names its reason and
/// is logged by the traversal loop; it never aborts the walk.
enum EventOutcome {
    Handled,
    Skipped(String),
}

pub struct Transformer {
    classifier: Classifier,
    keyset_prefix: String,
}

impl Transformer {
    pub fn new(classifier: Classifier, keyset_prefix: impl Into<String>) -> Self {
        Transformer {
            classifier,
            keyset_prefix: keyset_prefix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Transformer::new(Classifier::from_config(config), &config.keyset_prefix)
    }

    /// Walk a per-table collection body (`{"items": [...]}`), accumulating
    /// one keyset pair `"<id>.<normalized-path>" -> text` for every
    /// externalizable scalar.
    ///
    /// The current record id is the most recent integer seen at the
    /// normalized path `id`, and resets at each collection-index boundary.
    /// An eligible field encountered before its record's id is skipped
    /// with a warning instead of being keyed against a stale id.
    pub fn extract_keyset(&self, table: &str, body: &str) -> Result<Keyset> {
        let mut keyset = Keyset::new(table);
        let mut id: Option<i64> = None;
        let mut record_index: Option<usize> = None;

        for event in Walker::new(body) {
            let event = event?;
            if let Some(index) = collection_index(&event.segments) {
                if record_index != Some(index) {
                    record_index = Some(index);
                    id = None;
                }
            }
            match self.keyset_event(&event, &mut id, &mut keyset) {
                EventOutcome::Handled => {}
                EventOutcome::Skipped(reason) => {
                    warn!(table, path = %event.path, reason, "event skipped");
                }
            }
        }
        Ok(keyset)
    }

    fn keyset_event(
        &self,
        event: &Event,
        id: &mut Option<i64>,
        keyset: &mut Keyset,
    ) -> EventOutcome {
        let normalized = Classifier::normalize_path(&event.path);
        if normalized == "id" {
            return match event.token.as_i64() {
                Some(value) => {
                    *id = Some(value);
                    EventOutcome::Handled
                }
                None => {
                    *id = None;
                    EventOutcome::Skipped("id field is not an integer".to_string())
                }
            };
        }
        if !self
            .classifier
            .is_externalizable(&event.path, event.key.as_deref(), &event.token)
        {
            return EventOutcome::Handled;
        }
        let Some(record_id) = *id else {
            return EventOutcome::Skipped(
                "externalizable field before the record id".to_string(),
            );
        };
        // is_externalizable only fires for string tokens
        let Some(value) = event.token.as_str() else {
            return EventOutcome::Skipped("non-string token classified as text".to_string());
        };
        keyset.push(format!("{record_id}.{normalized}"), value);
        EventOutcome::Handled
    }

    /// Rewrite one record: every token is mirrored verbatim except that
    /// externalizable scalars become `"<prefix><table>.<id>.<path>"`.
    ///
    /// The record id is collected in a first pass over the document, so
    /// the result does not depend on where `id` appears in key order.
    pub fn rewrite_record(&self, table: &str, record: &str) -> Result<RewrittenRecord> {
        let id = self
            .find_record_id(record)?
            .ok_or_else(|| SiphonError::MissingRecordId {
                table: table.to_string(),
            })?;

        let mut builder = JsonBuilder::new();
        for event in Walker::new(record) {
            let event = event?;
            let key = event.key.as_deref().unwrap_or("");
            if self
                .classifier
                .is_externalizable(&event.path, event.key.as_deref(), &event.token)
            {
                let normalized = Classifier::normalize_path(&event.path);
                let synthetic =
                    format!("{}{table}.{id}.{normalized}", self.keyset_prefix);
                builder.string(key, &synthetic)?;
            } else {
                builder.token(key, &event.token)?;
            }
        }
        Ok(RewrittenRecord {
            id,
            json: builder.finish()?,
        })
    }

    /// First pass of the rewrite: find the integer value at path `id`
    fn find_record_id(&self, record: &str) -> Result<Option<i64>> {
        for event in Walker::new(record) {
            let event = event?;
            if event.path == "id" {
                return Ok(event.token.as_i64());
            }
        }
        Ok(None)
    }
}

/// Record ordinal when the path sits under a `items.<N>` collection entry
fn collection_index(segments: &[PathSegment]) -> Option<usize> {
    match (segments.first(), segments.get(1)) {
        (Some(PathSegment::Key(head)), Some(PathSegment::Index(index))) if head == "items" => {
            Some(*index)
        }
        _ => None,
    }
}

/// Serialize a keyset to its on-disk document shape, preserving pair order
pub fn keyset_to_json(keyset: &Keyset) -> Result<String> {
    let mut builder = JsonBuilder::new();
    builder.open_object("")?;
    builder.string("Keyset", &keyset.name)?;
    builder.open_object("Pairs")?;
    for (key, text) in &keyset.pairs {
        builder.string(key, text)?;
    }
    builder.close()?;
    builder.close()?;
    builder.finish()
}
