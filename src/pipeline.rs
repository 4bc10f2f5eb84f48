//! Per-table orchestration for the four migration flows.
//!
//! Every flow fans out one scoped thread per table; tables own disjoint
//! state, so the only synchronization point is the scope join before the
//! cache-refresh flag is restored. Failures stay table- or record-scoped:
//! they are logged and the remaining work continues. Nothing is retried.

use crate::client::{CacheSwitch, RecordStore, TranslationSink};
use crate::config::Config;
use crate::error::{Result, SiphonError};
use crate::ledger;
use crate::transform::{keyset_to_json, Transformer};
use crate::types::{KeysetFile, Table};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fs;
use std::path::Path;
use std::thread;
use tracing::{error, info, warn};

/// Scoped hold on the cache-refresh toggle.
///
/// Construction registers the caches, [`disable_all`](Self::disable_all)
/// freezes them, and `Drop` re-enables every cache on every exit path,
/// success or failure. Re-enable failures are logged, never propagated.
pub struct CacheGuard<'a, C: CacheSwitch> {
    switch: &'a C,
    caches: Vec<String>,
}

impl<'a, C: CacheSwitch> CacheGuard<'a, C> {
    pub fn new(switch: &'a C, tables: &[Table]) -> Self {
        CacheGuard {
            switch,
            caches: tables.iter().map(|t| t.cache.clone()).collect(),
        }
    }

    pub fn disable_all(&self) -> Result<()> {
        for cache in &self.caches {
            self.switch.set_update_enabled(cache, false)?;
            info!(cache, "cache updating disabled");
        }
        Ok(())
    }
}

impl<C: CacheSwitch> Drop for CacheGuard<'_, C> {
    fn drop(&mut self) {
        for cache in &self.caches {
            match self.switch.set_update_enabled(cache, true) {
                Ok(()) => info!(cache, "cache updating re-enabled"),
                Err(err) => error!(cache, %err, "failed to re-enable cache updating"),
            }
        }
    }
}

/// Top-level collection body returned by a table fetch
#[derive(Deserialize)]
struct CollectionBody<'a> {
    #[serde(borrow)]
    items: Vec<&'a RawValue>,
}

fn collection_records(body: &str) -> Result<Vec<&RawValue>> {
    let parsed: CollectionBody = serde_json::from_str(body)?;
    Ok(parsed.items)
}

/// Extract flow: fetch every table and write one keyset file per table
pub fn run_extract<S>(config: &Config, store: &S) -> Result<()>
where
    S: RecordStore + Sync,
{
    info!("extract started");
    config.ensure_work_dir()?;
    let transformer = Transformer::from_config(config);
    thread::scope(|scope| {
        for table in &config.tables {
            let transformer = &transformer;
            scope.spawn(move || {
                if let Err(err) = extract_table(config, store, transformer, table) {
                    error!(table = %table.name, %err, "extract failed");
                }
            });
        }
    });
    info!("extract finished");
    Ok(())
}

fn extract_table<S: RecordStore>(
    config: &Config,
    store: &S,
    transformer: &Transformer,
    table: &Table,
) -> Result<()> {
    let body = store.fetch_table(table)?;
    let keyset = transformer.extract_keyset(&table.name, &body)?;
    let json = keyset_to_json(&keyset)?;
    let path = config.keyset_path(&table.name);
    fs::write(&path, json).map_err(|err| SiphonError::file(&path, err))?;
    info!(table = %table.name, pairs = keyset.len(), file = %path.display(), "keyset written");
    Ok(())
}

/// Create flow: rewrite and re-upload every record, collecting the ids the
/// application assigns into a per-table compensation ledger. The cache
/// toggle wraps the whole fan-out.
pub fn run_migrate<S, C>(config: &Config, store: &S, switch: &C) -> Result<()>
where
    S: RecordStore + Sync,
    C: CacheSwitch,
{
    info!("migration started");
    config.ensure_work_dir()?;
    let transformer = Transformer::from_config(config);
    let guard = CacheGuard::new(switch, &config.tables);
    guard.disable_all()?;
    thread::scope(|scope| {
        for table in &config.tables {
            let transformer = &transformer;
            scope.spawn(move || {
                if let Err(err) = migrate_table(config, store, transformer, table) {
                    error!(table = %table.name, %err, "migration failed");
                }
            });
        }
    });
    // re-enable the caches before announcing completion
    drop(guard);
    info!("migration finished");
    Ok(())
}

fn migrate_table<S: RecordStore>(
    config: &Config,
    store: &S,
    transformer: &Transformer,
    table: &Table,
) -> Result<()> {
    let body = store.fetch_table(table)?;
    let records = collection_records(&body)?;

    // ids land here in upload-completion order and are drained into the
    // ledger only after the whole upload loop is done
    let mut new_ids = Vec::new();
    for record in records {
        let rewritten = match transformer.rewrite_record(&table.name, record.get()) {
            Ok(rewritten) => rewritten,
            Err(err) => {
                error!(table = %table.name, %err, "record rewrite failed, skipping");
                continue;
            }
        };
        match store.save_record(table, &rewritten.json) {
            Ok(new_id) => new_ids.push(new_id),
            Err(err) => {
                error!(table = %table.name, id = rewritten.id, %err, "record upload failed");
            }
        }
    }

    let path = config.ledger_path(&table.name);
    ledger::write_ledger(&path, &new_ids)?;
    info!(table = %table.name, created = new_ids.len(), ledger = %path.display(), "table migrated");
    Ok(())
}

/// Rollback flow: delete exactly the ids each table's ledger names. One
/// id's failure does not stop the rest; the cache toggle wraps the run.
pub fn run_rollback<S, C>(config: &Config, store: &S, switch: &C) -> Result<()>
where
    S: RecordStore + Sync,
    C: CacheSwitch,
{
    info!("rollback started");
    let guard = CacheGuard::new(switch, &config.tables);
    guard.disable_all()?;
    thread::scope(|scope| {
        for table in &config.tables {
            scope.spawn(move || {
                if let Err(err) = rollback_table(config, store, table) {
                    error!(table = %table.name, %err, "rollback failed");
                }
            });
        }
    });
    // re-enable the caches before announcing completion
    drop(guard);
    info!("rollback finished");
    Ok(())
}

fn rollback_table<S: RecordStore>(config: &Config, store: &S, table: &Table) -> Result<()> {
    let path = config.ledger_path(&table.name);
    let ids = ledger::read_ledger(&path)?;
    for id in ids {
        match store.delete_record(table, id) {
            Ok(()) => info!(table = %table.name, id, "record deleted"),
            Err(err) => error!(table = %table.name, id, %err, "delete failed"),
        }
    }
    info!(table = %table.name, "rollback done");
    Ok(())
}

/// Push flow: read every keyset file in the working directory and submit
/// its pairs to the third-party system in bounded chunks
pub fn run_push<T>(config: &Config, sink: &T) -> Result<()>
where
    T: TranslationSink,
{
    info!("push started");
    let chunk_size = if config.chunk_size == 0 {
        warn!("chunk_size 0 is invalid, sending one pair per request");
        1
    } else {
        config.chunk_size
    };
    let entries =
        fs::read_dir(&config.work_dir).map_err(|err| SiphonError::file(&config.work_dir, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| SiphonError::file(&config.work_dir, err))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Err(err) = push_file(config, sink, &path, chunk_size) {
            error!(file = %path.display(), %err, "push failed for keyset file");
        }
    }
    info!("push finished");
    Ok(())
}

fn push_file<T: TranslationSink>(
    config: &Config,
    sink: &T,
    path: &Path,
    chunk_size: usize,
) -> Result<()> {
    let raw = fs::read_to_string(path).map_err(|err| SiphonError::file(path, err))?;
    let file: KeysetFile = serde_json::from_str(&raw)?;
    let keyset = format!("{}{}", config.keyset_prefix, file.keyset);

    let pairs: Vec<(String, String)> = file
        .pairs
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(text) => (key, text),
            other => {
                warn!(%key, "keyset pair value is not a string");
                (key, other.to_string())
            }
        })
        .collect();

    for chunk in pairs.chunks(chunk_size) {
        sink.send_chunk(&keyset, chunk)?;
    }
    info!(keyset, pairs = pairs.len(), file = %path.display(), "keyset pushed");
    Ok(())
}
