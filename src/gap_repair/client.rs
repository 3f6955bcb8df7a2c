//! Overpass QL HTTP client (spec.md §6.2) — grounded on the teacher's
//! `wikidata::WikidataFetcher`: a `reqwest::Client` issuing batched
//! requests with a bounded, fixed-backoff retry loop.

use std::time::Duration;

use hashbrown::HashMap;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::config::OverpassConfig;
use crate::error::{BoundaryError, Result};

/// Fixed backoff between retries (spec.md §4.3: "a small fixed backoff").
const BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub members: Vec<OverpassMember>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassMember {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "ref")]
    pub reference: i64,
    #[serde(default)]
    pub role: String,
}

/// A single-instance Overpass client, reused across every C3 batch
/// (spec.md §5's "remote query client is single-instance" rule).
pub struct OverpassClient {
    client: Client,
    endpoint: String,
    max_retries: u32,
    iteration_cap: u32,
}

impl OverpassClient {
    pub fn new(config: &OverpassConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("boundary-forge/0.1")
            .build()
            .expect("failed to build Overpass HTTP client");

        Self {
            client,
            endpoint: config.endpoint.clone(),
            max_retries: config.max_retries,
            iteration_cap: config.iteration_cap,
        }
    }

    pub fn iteration_cap(&self) -> u32 {
        self.iteration_cap
    }

    /// Batch relation fetch: `relation(id:<csv>);` with body verbosity
    /// (spec.md §6.2). Retries up to `max_retries` times with a fixed
    /// backoff; on exhaustion returns `Err`, leaving the caller to drop
    /// the batch and continue (spec.md §7 kind 3).
    pub async fn fetch_relations(&self, ids: &[i64]) -> Result<Vec<OverpassElement>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let csv = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        let query = format!("[out:json][timeout:{}];relation(id:{csv});out body;", 180);

        let mut last_err: Option<String> = None;

        for attempt in 1..=self.max_retries.max(1) {
            match self.send(&query).await {
                Ok(response) => return Ok(response.elements),
                Err(e) => {
                    warn!(
                        "Overpass relation batch failed (attempt {attempt}/{}): {e}",
                        self.max_retries
                    );
                    last_err = Some(e.to_string());
                    if attempt < self.max_retries {
                        tokio::time::sleep(BACKOFF).await;
                    }
                }
            }
        }

        Err(BoundaryError::RemoteTransport {
            attempts: self.max_retries,
            message: last_err.unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    async fn send(&self, query: &str) -> anyhow::Result<OverpassResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<OverpassResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_response() {
        let raw = r#"{"elements":[{"type":"relation","id":270056,"tags":{"name":"China","admin_level":"2"},"members":[{"type":"relation","ref":1,"role":"subarea"},{"type":"way","ref":2,"role":"outer"}]}]}"#;
        let parsed: OverpassResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.elements.len(), 1);
        assert_eq!(parsed.elements[0].members.len(), 2);
        assert_eq!(parsed.elements[0].tags.get("admin_level").map(String::as_str), Some("2"));
    }

    #[test]
    fn tolerates_missing_tags_and_members() {
        let raw = r#"{"elements":[{"type":"relation","id":1}]}"#;
        let parsed: OverpassResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.elements[0].tags.is_empty());
        assert!(parsed.elements[0].members.is_empty());
    }
}
