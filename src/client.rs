//! HTTP collaborators: the source application, its cache toggle, and the
//! third-party translation system.
//!
//! Each collaborator sits behind a trait so the orchestration layer can be
//! exercised without a network. The single implementation shares one
//! [`ureq::Agent`] carrying a global per-call timeout; the agent is safe
//! for concurrent use from the per-table tasks.

use crate::build::JsonBuilder;
use crate::config::Config;
use crate::error::{Result, SiphonError};
use crate::types::{SavedId, Table};
use tracing::info;

/// Record fetch/save/delete API of the source application
pub trait RecordStore {
    /// Fetch the full collection body for a table (`{"items": [...]}`)
    fn fetch_table(&self, table: &Table) -> Result<String>;

    /// Save one rewritten record, returning the id the application assigned
    fn save_record(&self, table: &Table, body: &str) -> Result<i64>;

    /// Delete one record by id
    fn delete_record(&self, table: &Table, id: i64) -> Result<()>;
}

/// Cache-refresh toggle of the source application
pub trait CacheSwitch {
    fn set_update_enabled(&self, cache: &str, enable: bool) -> Result<()>;
}

/// Chunk-level ingestion API of the third-party translation system
pub trait TranslationSink {
    fn send_chunk(&self, keyset: &str, pairs: &[(String, String)]) -> Result<()>;
}

/// ureq-backed implementation of all three collaborator traits
pub struct HttpClient {
    agent: ureq::Agent,
    url_prefix: String,
    third_system_url: String,
    auth_token: String,
    source_auth: Option<(String, String)>,
}

impl HttpClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(config.timeout())
            .build()
            .new_agent();
        HttpClient {
            agent,
            url_prefix: config.url_prefix.clone(),
            third_system_url: config.third_system_url.clone(),
            auth_token: config.auth_token.clone(),
            source_auth: auth_pair(&config.source_auth_header, &config.source_auth_value),
        }
    }

    /// Attach the configured source-application auth header, if any
    fn with_source_auth<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.source_auth {
            Some((header, value)) => request.header(header, value),
            None => request,
        }
    }
}

/// Header/value pair for source-application requests; None when no header
/// name is configured
fn auth_pair(header: &str, value: &str) -> Option<(String, String)> {
    if header.is_empty() {
        None
    } else {
        Some((header.to_string(), value.to_string()))
    }
}

impl RecordStore for HttpClient {
    fn fetch_table(&self, table: &Table) -> Result<String> {
        let context = format!("{}: fetch", table.name);
        let request = self
            .agent
            .get(&table.get_url)
            .header("accept", "application/json");
        let response = self
            .with_source_auth(request)
            .call()
            .map_err(|err| SiphonError::transport(&context, err))?;
        info!(table = %table.name, status = %response.status(), "fetched collection");
        response
            .into_body()
            .read_to_string()
            .map_err(|err| SiphonError::transport(&context, err))
    }

    fn save_record(&self, table: &Table, body: &str) -> Result<i64> {
        let context = format!("{}: save", table.name);
        let request = self
            .agent
            .post(&table.save_url)
            .header("Content-Type", "application/json")
            .header("accept", "application/json");
        let response = self
            .with_source_auth(request)
            .send(body)
            .map_err(|err| SiphonError::transport(&context, err))?;
        let raw = response
            .into_body()
            .read_to_string()
            .map_err(|err| SiphonError::transport(&context, err))?;
        let saved: SavedId = serde_json::from_str(&raw)
            .map_err(|err| SiphonError::bad_response(&context, err))?;
        Ok(saved.id)
    }

    fn delete_record(&self, table: &Table, id: i64) -> Result<()> {
        let context = format!("{}: delete id={id}", table.name);
        let request = self
            .agent
            .delete(format!("{}/{id}", table.save_url))
            .header("Content-Type", "application/json")
            .header("accept", "application/json");
        let response = self
            .with_source_auth(request)
            .call()
            .map_err(|err| SiphonError::transport(&context, err))?;
        info!(table = %table.name, id, status = %response.status(), "record deleted");
        Ok(())
    }
}

impl CacheSwitch for HttpClient {
    fn set_update_enabled(&self, cache: &str, enable: bool) -> Result<()> {
        let context = format!("{cache}: cache toggle enable={enable}");
        let url = format!("{}/enable-cache-updating", self.url_prefix);
        let request = self
            .agent
            .put(&url)
            .query("cache", cache)
            .query("enable", if enable { "true" } else { "false" })
            .header("Content-Type", "application/json")
            .header("accept", "application/json");
        self.with_source_auth(request)
            .send_empty()
            .map_err(|err| SiphonError::transport(&context, err))?;
        Ok(())
    }
}

impl TranslationSink for HttpClient {
    fn send_chunk(&self, keyset: &str, pairs: &[(String, String)]) -> Result<()> {
        let context = format!("{keyset}: send chunk of {}", pairs.len());
        let body = chunk_body(keyset, pairs)?;
        let response = self
            .agent
            .post(&self.third_system_url)
            .header("Content-Type", "application/json")
            .header("accept", "application/json")
            .header("Authorization", &self.auth_token)
            .send(&body)
            .map_err(|err| SiphonError::transport(&context, err))?;
        info!(keyset, pairs = pairs.len(), status = %response.status(), "chunk sent");
        Ok(())
    }
}

/// Request body for one chunk: `{ "<keyset>": { "<k>": "<v>", ... } }`
fn chunk_body(keyset: &str, pairs: &[(String, String)]) -> Result<String> {
    let mut builder = JsonBuilder::new();
    builder.open_object("")?;
    builder.open_object(keyset)?;
    for (key, value) in pairs {
        builder.string(key, value)?;
    }
    builder.close()?;
    builder.close()?;
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_body_wraps_pairs_in_keyset_name() {
        let pairs = vec![
            ("7.title".to_string(), "Hello".to_string()),
            ("7.caption".to_string(), "World".to_string()),
        ];
        let body = chunk_body("testing-t", &pairs).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["testing-t"]["7.title"], "Hello");
        assert_eq!(value["testing-t"]["7.caption"], "World");
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_chunk_body_empty_pairs() {
        let body = chunk_body("testing-t", &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["testing-t"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_source_auth_disabled_without_header_name() {
        assert_eq!(auth_pair("", ""), None);
        assert_eq!(auth_pair("", "orphan value"), None);
        assert_eq!(
            auth_pair("X-Service-Ticket", "secret"),
            Some(("X-Service-Ticket".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_client_picks_up_source_auth_from_config() {
        let config = Config {
            source_auth_header: "X-Service-Ticket".to_string(),
            source_auth_value: "secret".to_string(),
            ..Config::default()
        };
        let client = HttpClient::new(&config);
        assert_eq!(
            client.source_auth,
            Some(("X-Service-Ticket".to_string(), "secret".to_string()))
        );

        let client = HttpClient::new(&Config::default());
        assert_eq!(client.source_auth, None);
    }
}
