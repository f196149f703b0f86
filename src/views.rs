//! View-count notifications to the video-sharing server.
//!
//! Fired when playback of a published video reaches its end. The request is
//! fire-and-forget: the caller never waits for it and failures are only logged.

use anyhow::anyhow;
use std::time::Duration;
use tokio::task::JoinHandle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for `POST /api/videos/{id}/view`.
#[derive(Debug, Clone)]
pub struct ViewCounter {
    client: reqwest::Client,
    base_url: String,
}

impl ViewCounter {
    /// Creates a counter for the server at `base_url`.
    ///
    /// # Errors
    /// If the URL is empty or not http(s), or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(anyhow!(
                "No server configured. Set server.base_url in ~/.config/vidrec/vidrec.toml"
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(anyhow!("Server URL must start with http:// or https://: {base_url}"));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Endpoint that registers one view of `video_id`.
    pub fn endpoint(&self, video_id: &str) -> String {
        format!("{}/api/videos/{}/view", self.base_url, video_id.trim())
    }

    /// Sends the notification in the background.
    ///
    /// The returned handle may be awaited to let the request finish before the
    /// runtime shuts down; the response is never inspected beyond logging.
    pub fn notify_ended(&self, video_id: &str) -> JoinHandle<()> {
        let request = self.client.post(self.endpoint(video_id));
        let video_id = video_id.to_string();

        tokio::spawn(async move {
            match request.send().await {
                Ok(response) => {
                    tracing::debug!("View registered for {}: {}", video_id, response.status());
                }
                Err(e) => {
                    tracing::warn!("Failed to register view for {}: {}", video_id, e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let counter = ViewCounter::new("http://localhost:4000/").unwrap();
        assert_eq!(
            counter.endpoint("6350f1c2a1"),
            "http://localhost:4000/api/videos/6350f1c2a1/view"
        );
    }

    #[test]
    fn test_rejects_missing_or_bad_url() {
        assert!(ViewCounter::new("").is_err());
        assert!(ViewCounter::new("localhost:4000").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_an_error() {
        let counter = ViewCounter::new("http://127.0.0.1:9").unwrap();
        // Completes without panicking even though nothing listens on port 9
        counter.notify_ended("abc").await.unwrap();
    }
}
