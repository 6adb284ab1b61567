//! The cache controller.
//!
//! Owns one versioned bucket: populates it at install time with the fixed
//! URL manifest, answers intercepted requests cache-first with the network
//! as fallback, and deletes superseded buckets at activation. The bucket is
//! written only by install and activate; fetch handling never stores.

use crate::lifecycle::{EventHandler, FetchRequest, ServeSource, ServedResponse};
use bytes::Bytes;
use futures_util::future::{join_all, try_join_all};
use std::collections::BTreeMap;
use std::sync::Arc;
use tgb_client::fetch::{FetchResponse, Fetcher, resolve};
use tgb_core::cache::key::compute_entry_key;
use tgb_core::{AppConfig, CacheDb, Error, StoredResponse};
use url::Url;

/// Cache controller over one versioned bucket.
pub struct CacheController {
    db: CacheDb,
    network: Arc<dyn Fetcher>,
    cache_name: String,
    manifest: Vec<String>,
    base_url: Url,
}

impl CacheController {
    /// Build a controller from configuration.
    pub fn new(db: CacheDb, network: Arc<dyn Fetcher>, config: &AppConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            db,
            network,
            cache_name: config.cache_name.clone(),
            manifest: config.precache_urls.clone(),
            base_url,
        })
    }

    /// Name of the bucket this controller manages.
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    fn header_map(headers: &http::HeaderMap) -> BTreeMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect()
    }

    fn snapshot(response: &FetchResponse) -> StoredResponse {
        let headers = Self::header_map(&response.headers);
        StoredResponse {
            key: compute_entry_key("GET", response.url.as_str()),
            url: response.url.to_string(),
            method: "GET".to_string(),
            status: response.status.as_u16(),
            content_type: response.content_type.clone(),
            headers_json: serde_json::to_string(&headers).ok(),
            body: response.bytes.to_vec(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn served_from_entry(entry: StoredResponse) -> ServedResponse {
        let headers = entry.headers();
        ServedResponse {
            source: ServeSource::Cache,
            status: entry.status,
            content_type: entry.content_type,
            headers,
            body: Bytes::from(entry.body),
        }
    }

    fn served_from_network(response: FetchResponse) -> ServedResponse {
        let headers = Self::header_map(&response.headers);
        ServedResponse {
            source: ServeSource::Network,
            status: response.status.as_u16(),
            content_type: response.content_type,
            headers,
            body: response.bytes,
        }
    }
}

#[async_trait::async_trait]
impl EventHandler for CacheController {
    /// Precache the manifest into the current bucket.
    ///
    /// All manifest fetches are joined; one unreachable URL or non-2xx
    /// response fails the whole batch before anything is stored. On full
    /// success the snapshots land in one transaction.
    async fn on_install(&self) -> Result<(), Error> {
        self.db.open_bucket(&self.cache_name).await?;

        let urls = self
            .manifest
            .iter()
            .map(|raw| resolve(&self.base_url, raw).map_err(|e| Error::InvalidUrl(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(urls.iter().map(|url| self.network.fetch(url))).await?;

        for response in &responses {
            if !response.status.is_success() {
                return Err(Error::PrecacheFailed(format!(
                    "{} returned status {}",
                    response.url,
                    response.status.as_u16()
                )));
            }
        }

        let entries: Vec<StoredResponse> = responses.iter().map(Self::snapshot).collect();
        self.db.put_entries(&self.cache_name, &entries).await?;

        tracing::info!(bucket = %self.cache_name, entries = entries.len(), "precache complete");
        Ok(())
    }

    /// Answer a request cache-first.
    ///
    /// A stored entry answers immediately, with no freshness check. On miss
    /// the request is forwarded to the network and its response returned
    /// unmodified, whatever the status; a network failure propagates to the
    /// requester. The bucket is never written here.
    async fn on_fetch(&self, request: &FetchRequest) -> Result<ServedResponse, Error> {
        let url = resolve(&self.base_url, &request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        if let Some(entry) = self
            .db
            .match_request(&self.cache_name, &request.method, url.as_str())
            .await?
        {
            tracing::debug!(url = %url, "cache hit");
            return Ok(Self::served_from_entry(entry));
        }

        let response = self.network.fetch(&url).await?;
        Ok(Self::served_from_network(response))
    }

    /// Delete every bucket that is not the current version.
    ///
    /// Deletions are independent and best-effort per bucket; a failed
    /// delete is logged and does not fail the phase.
    async fn on_activate(&self) -> Result<(), Error> {
        let names = self.db.bucket_names().await?;
        let stale: Vec<String> = names.into_iter().filter(|name| name != &self.cache_name).collect();

        let results = join_all(stale.iter().map(|name| self.db.delete_bucket(name))).await;
        for (name, result) in stale.iter().zip(results) {
            match result {
                Ok(_) => tracing::info!(bucket = %name, "stale bucket deleted"),
                Err(e) => tracing::warn!(bucket = %name, error = %e, "failed to delete stale bucket"),
            }
        }
        Ok(())
    }
}
