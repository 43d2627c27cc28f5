//! Messages API Client
//!
//! Async wrapper over the REST read path: the conversation list, full
//! history, and history deltas used to fill gaps after a reconnect.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::client::cache::{CatchUpCursor, ConversationCache};
use crate::client::error::ClientError;
use crate::shared::config::{AppConfig, ConfigError};
use crate::shared::messaging::{Conversation, DirectMessage};

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// REST client for one user
#[derive(Debug, Clone)]
pub struct MessagesApi {
    client: Client,
    base: Url,
    user_id: String,
}

impl MessagesApi {
    pub fn new(config: &AppConfig, user_id: impl Into<String>) -> Result<Self, ClientError> {
        config.validate()?;
        let base = Url::parse(&config.server_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            base,
            user_id: user_id.into(),
        })
    }

    /// The caller's conversations, most recent first
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ClientError> {
        self.get_json(&["api", "messages"], None).await
    }

    /// Full history with `counterpart`, oldest first; marks it read server-side
    pub async fn history(&self, counterpart: &str) -> Result<Vec<DirectMessage>, ClientError> {
        self.get_json(&["api", "messages", counterpart], None).await
    }

    /// History with `counterpart` at or after `since`
    pub async fn history_since(
        &self,
        counterpart: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DirectMessage>, ClientError> {
        self.get_json(&["api", "messages", counterpart], Some(since)).await
    }

    /// Fetch and merge what was missed while disconnected.
    ///
    /// Returns how many messages were new to the cache. A failing
    /// conversation is logged and skipped so the rest still catch up.
    pub async fn catch_up(&self, cache: &mut ConversationCache, cursors: &[CatchUpCursor]) -> usize {
        let mut added = 0;
        for cursor in cursors {
            match self.history_since(&cursor.counterpart, cursor.since).await {
                Ok(messages) => added += cache.merge_history(&cursor.counterpart, messages),
                Err(e) => tracing::warn!("[Api] Catch-up with {} failed: {}", cursor.counterpart, e),
            }
        }
        added
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ConfigError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        since: Option<DateTime<Utc>>,
    ) -> Result<T, ClientError> {
        let mut request = self
            .client
            .get(self.url(segments)?)
            .header(USER_ID_HEADER, &self.user_id);
        if let Some(since) = since {
            request = request.query(&[("since", since.to_rfc3339_opts(SecondsFormat::Micros, true))]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| if text.is_empty() { status.to_string() } else { text });
            tracing::warn!("[Api] GET {:?} returned {}: {}", segments, status, message);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_segments() {
        let config = AppConfig::builder().server_url("http://localhost:3000/").build().unwrap();
        let api = MessagesApi::new(&config, "u1").unwrap();
        let url = api.url(&["api", "messages", "u 2"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/messages/u%202");
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = AppConfig {
            server_url: "ftp://nope".into(),
            ..AppConfig::default()
        };
        assert!(matches!(MessagesApi::new(&config, "u1"), Err(ClientError::Config(_))));
    }
}
