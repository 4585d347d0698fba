//! "On this day" event feed
//!
//! Fetches the list of historical events that happened on a given month/day
//! from the Wikimedia feed API. The feed is optional content: any failure is
//! reported as a [`FetchError`] and the caller drops the section.

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, USER_AGENT},
    Client,
};
use serde::{Deserialize, Serialize};

use crate::config::FeedConfig;
use crate::utils::error::FetchError;

/// One event from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    /// Year of the event (negative for BC, 0 when missing)
    #[serde(default)]
    pub year: i32,

    /// Event description
    #[serde(default)]
    pub text: String,

    /// Related reference pages
    #[serde(default)]
    pub pages: Vec<serde_json::Value>,
}

impl FeedEvent {
    /// Create an event with `page_count` placeholder reference pages
    pub fn new(year: i32, text: impl Into<String>, page_count: usize) -> Self {
        Self {
            year,
            text: text.into(),
            pages: (0..page_count)
                .map(|i| serde_json::json!({ "pageid": i }))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    events: Vec<FeedEvent>,
}

/// Source of "on this day" events
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Feed name for logging
    fn name(&self) -> &str;

    /// Events for a month (1-12) and day (1-31)
    async fn fetch_events(&self, month: u32, day: u32) -> Result<Vec<FeedEvent>, FetchError>;
}

/// Wikimedia "onthisday" feed client
pub struct WikimediaFeed {
    client: Client,
    base_url: String,
    language: String,
    user_agent: String,
}

impl WikimediaFeed {
    /// Create a feed client from configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    fn events_url(&self, month: u32, day: u32) -> String {
        format!(
            "{}/feed/v1/wikipedia/{}/onthisday/events/{month:02}/{day:02}",
            self.base_url, self.language
        )
    }
}

#[async_trait]
impl EventFeed for WikimediaFeed {
    fn name(&self) -> &str {
        "wikimedia"
    }

    async fn fetch_events(&self, month: u32, day: u32) -> Result<Vec<FeedEvent>, FetchError> {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(FetchError::InvalidDate { month, day });
        }

        let url = self.events_url(month, day);
        tracing::debug!(url = %url, "Fetching on-this-day events");

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: FeedResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(parsed.events)
    }
}
