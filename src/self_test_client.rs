use reqwest::Client;
use std::time;

use crate::domain::interest::Interest;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Talks to the running service's own subscribe endpoint, used by the self-test route to exercise
/// the whole request path.
pub struct SelfTestClient {
    http_client: Client,
    base_url: String,
}

#[derive(serde::Serialize)]
pub struct SubscribeBody {
    email: String,
    interests: Vec<Interest>,
}

impl SelfTestClient {
    pub fn new(base_url: String, timeout: Option<time::Duration>) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(SelfTestClient {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submits a subscription and hands back whatever JSON the endpoint answered with, error
    /// statuses included.
    pub async fn subscribe(
        &self,
        email: &str,
        interests: &[Interest],
    ) -> Result<serde_json::Value, reqwest::Error> {
        let url = format!("{}/api/coming-soon/subscribe", self.base_url);
        let body = SubscribeBody {
            email: String::from(email),
            interests: interests.to_vec(),
        };

        self.http_client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .json::<serde_json::Value>()
            .await
    }
}
