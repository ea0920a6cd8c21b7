//! HTTP client for the catalog and scanning service.

use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::protocol::{
    ErrorBody, ScanOutcome, ScanRequest, ScanResponse, SearchResponse, SCAN_PATH, SEARCH_PATH,
};
use crate::sequence::NormalizedSequence;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    page_size: Option<u32>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("tfscan/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Catalog lookup.  The query goes out exactly as typed.
    pub async fn search(&self, query: &str) -> Result<SearchResponse, ApiError> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        info!("search: query={:?}", query);

        let mut request = self.http.get(&url).query(&[("query", query)]);
        if let Some(page_size) = self.page_size {
            request = request.query(&[("page_size", page_size)]);
        }
        let response = request.send().await?;
        let parsed: SearchResponse = decode(response).await?;
        debug!(
            "search: {} results (count={:?})",
            parsed.results.len(),
            parsed.count
        );
        Ok(parsed)
    }

    /// Submit residues for scanning against `candidate_id`.
    ///
    /// No validation happens here; the caller decides when a scan is allowed
    /// and the service rejects what it cannot score.
    pub async fn scan(
        &self,
        candidate_id: &str,
        sequence: &NormalizedSequence,
    ) -> Result<ScanOutcome, ApiError> {
        let url = format!("{}{}", self.base_url, SCAN_PATH);
        let body = ScanRequest {
            sequence: sequence.raw_residues.clone(),
            tf_id: candidate_id.to_string(),
        };
        info!(
            "scan: tf_id={} residues={}",
            candidate_id,
            sequence.raw_residues.len()
        );

        let response = self.http.post(&url).json(&body).send().await?;
        let parsed: ScanResponse = decode(response).await?;
        let outcome = parsed.into_outcome(candidate_id, sequence.display_name.clone());
        debug!(
            "scan: {} points, {} hits",
            outcome.series.len(),
            outcome.hits.len()
        );
        Ok(outcome)
    }
}

/// Read the body, then either decode it as `T` or turn it into a status
/// error carrying whatever message the service put in it.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|b| b.message().map(str::to_string));
        return Err(ApiError::Status { status, message });
    }

    Ok(serde_json::from_slice(&bytes)?)
}
