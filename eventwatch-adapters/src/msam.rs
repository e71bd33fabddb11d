//! Media services status API adapter.
//!
//! Reads the three feeds the poller needs from the status REST API:
//!
//! - `GET {endpoint}/cloudwatch/events/state/set/groups`: alarm events in the
//!   `set` state, grouped by aggregate channel state
//! - `GET {endpoint}/channels/state/idle`: idle status records
//! - `GET {endpoint}/channels/state/running`: running status records
//!
//! Every request carries the API key in the `x-api-key` header.
//!
//! ## Example
//!
//! ```rust,no_run
//! use eventwatch_adapters::msam::MsamClient;
//! use eventwatch_cache::StatusSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MsamClient::builder()
//!         .endpoint("https://abc123.execute-api.us-west-2.amazonaws.com/msam")
//!         .api_key("secret")
//!         .build()?;
//!
//!     let groups = client.fetch_grouped_events().await?;
//!     println!("{} alarm events", groups.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use eventwatch_cache::{Feed, FetchError, StatusSource};
use eventwatch_types::{GroupedEventsResponse, StatusKind, StatusRecord};

use crate::AdapterError;

const API_KEY_HEADER: &str = "x-api-key";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the status API.
#[derive(Debug, Clone)]
pub struct MsamClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl MsamClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> MsamClientBuilder {
        MsamClientBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn grouped_events_url(&self) -> String {
        format!("{}/cloudwatch/events/state/set/groups", self.endpoint)
    }

    fn statuses_url(&self, kind: StatusKind) -> String {
        format!("{}/channels/state/{}", self.endpoint, kind)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, AdapterError> {
        debug!(url, "requesting");

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(AdapterError::Auth("API key rejected".to_string()));
        }

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))
    }
}

#[async_trait]
impl StatusSource for MsamClient {
    async fn fetch_grouped_events(&self) -> Result<GroupedEventsResponse, FetchError> {
        self.get(&self.grouped_events_url())
            .await
            .map_err(|e| FetchError::new(Feed::GroupedEvents, e))
    }

    async fn fetch_statuses(&self, kind: StatusKind) -> Result<Vec<StatusRecord>, FetchError> {
        self.get(&self.statuses_url(kind))
            .await
            .map_err(|e| FetchError::new(Feed::Status(kind), e))
    }

    fn description(&self) -> &str {
        &self.endpoint
    }
}

/// Builder for MsamClient.
#[derive(Debug, Default)]
pub struct MsamClientBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl MsamClientBuilder {
    /// Set the API base URL, including any stage path. A trailing slash is ignored.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key sent with every request.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client. Fails if no endpoint was given.
    pub fn build(self) -> Result<MsamClient, AdapterError> {
        let endpoint = self
            .endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AdapterError::Config("endpoint is required".to_string()))?;

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| AdapterError::Config(e.to_string()))?;

        Ok(MsamClient {
            client,
            endpoint,
            api_key: self.api_key.unwrap_or_default(),
        })
    }
}
