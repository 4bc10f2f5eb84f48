//! Text externalization for JSON record stores.
//!
//! Siphon migrates user-facing strings out of an application's JSON
//! records and into a third-party translation system. It walks each
//! record as a token stream, classifies scalars by path and value,
//! and produces two artifacts from the same traversal rules: keyset
//! files mapping translation keys to source text, and rewritten
//! records whose text fields carry synthetic lookup keys instead.
//!
//! Four flows share this library: extract (build keyset files),
//! migrate (re-upload rewritten records while caches are frozen),
//! rollback (delete the records a migration created), and push
//! (submit keyset files to the translation system in chunks).

pub mod build;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod transform;
pub mod types;
pub mod walk;

pub use build::JsonBuilder;
pub use classify::Classifier;
pub use client::{CacheSwitch, HttpClient, RecordStore, TranslationSink};
pub use config::Config;
pub use error::{Result, SiphonError};
pub use transform::Transformer;
pub use types::{Keyset, KeysetFile, RewrittenRecord, Table};
pub use walk::{Event, Token, Walker};
