use crate::error::{Result, SiphonError};
use crate::types::Table;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process configuration, constructed once at startup and passed by
/// reference into every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the source application (also hosts the cache toggle)
    pub url_prefix: String,

    /// Tables to migrate; each runs on its own task
    pub tables: Vec<Table>,

    /// Prefix prepended to keyset names and synthetic keys
    pub keyset_prefix: String,

    /// Endpoint of the third-party translation system
    pub third_system_url: String,

    /// Value of the Authorization header sent to the third-party system
    pub auth_token: String,

    /// Maximum number of key/value pairs per third-party request
    pub chunk_size: usize,

    /// Directory holding keyset and ledger files
    pub work_dir: PathBuf,

    /// Per-call HTTP timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,

    /// Auth header name attached to every source-application request
    /// (empty disables the header)
    pub source_auth_header: String,

    /// Value sent with `source_auth_header`
    pub source_auth_value: String,

    /// Values starting with this prefix are never externalized
    pub color_prefix: String,

    /// Values containing this substring are never externalized
    pub url_marker: String,
}

impl Default for Config {
    fn default() -> Self {
        let url_prefix = "http://localhost:8082".to_string();
        Config {
            tables: vec![
                Table::new(
                    "table1",
                    "table1-cache",
                    format!("{url_prefix}/table1"),
                    format!("{url_prefix}/table1"),
                ),
                Table::new(
                    "table2",
                    "table2-cache",
                    format!("{url_prefix}/table2"),
                    format!("{url_prefix}/table2"),
                ),
            ],
            url_prefix,
            keyset_prefix: "testing-".to_string(),
            third_system_url: "https://third-system.invalid/keysets".to_string(),
            auth_token: String::new(),
            chunk_size: 100,
            work_dir: PathBuf::from("files"),
            timeout_secs: 30,
            source_auth_header: String::new(),
            source_auth_value: String::new(),
            color_prefix: "#".to_string(),
            url_marker: "://".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file; missing fields fall back to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|err| SiphonError::file(path.as_ref(), err))?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Per-call HTTP timeout, None when disabled
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }

    /// Path of the keyset file for a table
    pub fn keyset_path(&self, table_name: &str) -> PathBuf {
        self.work_dir.join(format!("{table_name}.json"))
    }

    /// Path of the compensation ledger file for a table
    pub fn ledger_path(&self, table_name: &str) -> PathBuf {
        self.work_dir.join(format!("{table_name}-new-ids.txt"))
    }

    /// Ensure the working directory exists
    pub fn ensure_work_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.work_dir)
            .map_err(|err| SiphonError::file(&self.work_dir, err))
    }
}
