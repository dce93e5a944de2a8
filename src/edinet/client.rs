// src/edinet/client.rs
use crate::edinet::models::DocumentListResponse;
use crate::utils::error::EdinetError;
use std::time::Duration;

const EDINET_BASE_URL: &str = "https://api.edinet-fsa.go.jp/api/v2";
// EDINET tolerates polite clients; keep a small fixed delay between requests.
const EDINET_REQUEST_DELAY_MS: u64 = 150;

/// Client for the EDINET v2 document API.
///
/// The subscription key is read from the `EDINET_API_KEY` environment
/// variable unless supplied explicitly via [`EdinetClient::with_config`].
pub struct EdinetClient {
    http: reqwest::Client,
    base_url: String,
    subscription_key: String,
}

impl EdinetClient {
    pub fn new() -> Result<Self, EdinetError> {
        let key = std::env::var("EDINET_API_KEY").unwrap_or_default();
        Self::with_config(EDINET_BASE_URL, &key)
    }

    pub fn with_config(base_url: &str, subscription_key: &str) -> Result<Self, EdinetError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            subscription_key: subscription_key.to_string(),
        })
    }

    /// Fetches the document list for one calendar date (YYYY-MM-DD).
    /// `type=2` asks EDINET to include the per-document result entries.
    pub async fn fetch_documents_list(&self, date: &str) -> Result<DocumentListResponse, EdinetError> {
        let url = format!("{}/documents.json", self.base_url);

        tokio::time::sleep(Duration::from_millis(EDINET_REQUEST_DELAY_MS)).await;

        let response = self
            .http
            .get(&url)
            .query(&[
                ("date", date),
                ("type", "2"),
                ("Subscription-Key", self.subscription_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for document list {}", status, date);
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check EDINET_API_KEY and rate limits.");
                return Err(EdinetError::RateLimited);
            }
            return Err(EdinetError::Http(status));
        }

        let list: DocumentListResponse = response.json().await?;
        tracing::debug!(
            "Fetched document list for {}: {} entries",
            date,
            list.results.len()
        );
        Ok(list)
    }

    /// Downloads the raw archive bytes of one document.
    /// `doc_type` selects the archive variant; "5" is the CSV archive.
    pub async fn fetch_document(&self, doc_id: &str, doc_type: &str) -> Result<Vec<u8>, EdinetError> {
        let url = format!("{}/documents/{}", self.base_url, doc_id);

        tokio::time::sleep(Duration::from_millis(EDINET_REQUEST_DELAY_MS)).await;

        let response = self
            .http
            .get(&url)
            .query(&[
                ("type", doc_type),
                ("Subscription-Key", self.subscription_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for document {}", status, doc_id);
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(EdinetError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EdinetError::DocumentNotFound(doc_id.to_string()));
            }
            return Err(EdinetError::Http(status));
        }

        let body = response.bytes().await?;
        tracing::debug!("Downloaded {} bytes for document {}", body.len(), doc_id);
        Ok(body.to_vec())
    }
}
