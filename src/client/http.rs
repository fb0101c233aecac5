//! Reqwest wrapper for page and API fetches
//!
//! One client is built per run and cloned into every extractor. Requests are
//! simple GETs; the only custom header is the user-agent. Response encoding
//! for HTML bodies is taken from the response headers by reqwest.

use reqwest::Client;
use serde_json::Value;

use crate::error::HarvestError;

/// Identifying client-agent string sent with every request.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; profile-harvester/0.2)";

/// Shared HTTP fetch client.
///
/// Cheap to clone; all strategies perform their fetches through it so the
/// user-agent and connection pool are consistent across a run.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build the client with the harvester's default headers.
    pub fn try_new() -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| {
                HarvestError::Configuration(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self { client })
    }

    /// GET a page and return its decoded text body.
    ///
    /// # Errors
    /// Returns [`HarvestError::Fetch`] on connection failure or a non-success
    /// HTTP status.
    pub async fn get_text(&self, url: &str) -> Result<String, HarvestError> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| HarvestError::Fetch {
                url: url.to_string(),
                source,
            })?;
        response.text().await.map_err(|source| HarvestError::Fetch {
            url: url.to_string(),
            source,
        })
    }

    /// GET a JSON document and parse the body.
    ///
    /// # Errors
    /// Returns [`HarvestError::Fetch`] for network/status failures and
    /// [`HarvestError::Parse`] for a malformed body.
    pub async fn get_json(&self, url: &str) -> Result<Value, HarvestError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|error| HarvestError::Parse {
            url: url.to_string(),
            message: error.to_string(),
        })
    }
}
