//! HTTP client for the mbs identify endpoint

use async_trait::async_trait;
use cfm_common::catalog::{IdentifyQuery, IdentifyResponse, ScoredMatch};
use cfm_common::config::MbsConfig;
use cfm_common::time::millis_to_duration;
use reqwest::StatusCode;

use super::{CatalogLookup, LookupError};

const USER_AGENT: &str = concat!("cfm-recorder/", env!("CARGO_PKG_VERSION"));
const IDENTIFY_PATH: &str = "/api/v1/identify";

/// mbs API client
pub struct MbsClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MbsClient {
    pub fn new(config: &MbsConfig) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(millis_to_duration(config.timeout_ms))
            .build()
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query_params(query: &IdentifyQuery) -> Vec<(&'static str, &str)> {
        let mut params = vec![
            ("recording", query.recording_title.as_str()),
            ("release", query.release_title.as_str()),
        ];
        params.extend(query.artists.iter().map(|a| ("artist", a.as_str())));
        params
    }
}

#[async_trait]
impl CatalogLookup for MbsClient {
    async fn identify(&self, query: &IdentifyQuery) -> Result<Vec<ScoredMatch>, LookupError> {
        let url = format!("{}{}", self.base_url, IDENTIFY_PATH);

        tracing::debug!(
            url = %url,
            recording = %query.recording_title,
            release = %query.release_title,
            artists = ?query.artists,
            "Querying mbs"
        );

        let response = self
            .http_client
            .get(&url)
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("mbs returned no candidates");
            return Ok(Vec::new());
        }

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LookupError::InvalidResponse(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;
        let parsed: IdentifyResponse = serde_json::from_slice(&body)
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))?;

        let mut candidates = Vec::with_capacity(parsed.candidates.len());
        for candidate in parsed.candidates {
            if let Some(credit) = &candidate.artist_credit {
                credit
                    .validate()
                    .map_err(|e| LookupError::InvalidResponse(e.to_string()))?;
            }
            candidates.push(candidate.normalized());
        }

        tracing::debug!(count = candidates.len(), "mbs candidates received");

        Ok(candidates)
    }
}
