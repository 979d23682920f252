use std::time::Duration;

const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Liveness ping sent after every completed run.
///
/// The response is never inspected.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    client: reqwest::Client,
    url: String,
}

impl Heartbeat {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Sends a `GET` to the heartbeat url, ignoring any outcome.
    pub async fn send(&self) {
        log::info!(target: "heartbeat", "Sending heartbeat");

        match self
            .client
            .get(&self.url)
            .timeout(HEARTBEAT_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => {
                log::debug!(target: "heartbeat", "Heartbeat answered with {}", response.status())
            }
            Err(e) => log::debug!(target: "heartbeat", "Heartbeat failed: {e}"),
        }
    }
}
