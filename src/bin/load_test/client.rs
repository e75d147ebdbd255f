//! Backend HTTP client recording request metrics and checks.

use std::{sync::Arc, time::Instant};

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{error::Result, metrics::Metrics};

/// Query parameters of a request.
pub type Query<'a> = &'a [(&'a str, String)];

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    metrics: Arc<Metrics>,
}

impl ApiClient {
    pub fn new(http: Client, base_url: Url, metrics: Arc<Metrics>) -> Self {
        Self {
            http,
            base_url,
            metrics,
        }
    }

    pub fn url(&self, path: &str, query: Query<'_>) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Sends a GET request and checks that it succeeded with HTTP 200.
    ///
    /// Returns the JSON body of successful responses, `Value::Null` when the
    /// body is not JSON.
    pub async fn get(&self, check: &'static str, path: &str, query: Query<'_>) -> Option<Value> {
        let url = match self.url(path, query) {
            Ok(url) => url,
            Err(err) => {
                warn!(check, path, %err, "invalid request url");
                self.metrics.record_check(false);
                return None;
            }
        };

        let started = Instant::now();
        let response = self.http.get(url.clone()).send().await;
        let elapsed = started.elapsed();
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(check, %url, %err, "request failed");
                self.metrics.record_request(true, None);
                self.metrics.record_check(false);
                return None;
            }
        };

        let status = response.status();
        self.metrics
            .record_request(status.is_client_error() || status.is_server_error(), Some(elapsed));
        let passed = status == StatusCode::OK;
        self.metrics.record_check(passed);
        debug!(check, %url, %status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
        if !passed {
            warn!(check, %url, %status, "check failed");
            return None;
        }
        Some(response.json().await.unwrap_or(Value::Null))
    }
}

/// Strings found at `pointer` in every item of the `items` array.
pub fn pluck(items: Option<&Value>, pointer: &str) -> Vec<String> {
    items
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.pointer(pointer)?.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_url() {
        let client = ApiClient::new(
            Client::new(),
            Url::parse("https://api.example.com").unwrap(),
            Arc::default(),
        );
        let url = client
            .url(
                "/market/info/order",
                &[("chainId", "1".to_string()), ("orderAddress", "0xab".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/market/info/order?chainId=1&orderAddress=0xab"
        );
        assert_eq!(client.url("/", &[]).unwrap().as_str(), "https://api.example.com/");
    }

    #[test]
    fn test_pluck() {
        let body = json!({
            "data": [
                {"contracts": {"marketAddr": "0x01"}},
                {"contracts": {}},
                {"contracts": {"marketAddr": "0x02"}},
            ]
        });
        assert_eq!(pluck(body.get("data"), "/contracts/marketAddr"), vec!["0x01", "0x02"]);
        assert!(pluck(None, "/contractAddress").is_empty());
    }
}
