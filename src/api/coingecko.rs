use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};

use crate::api::types::{parse_market_chart, parse_search, parse_simple_price};
use crate::api::{PriceSource, RateLimiter};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::metrics::{API_ERRORS, API_LATENCY, API_REQUESTS};
use crate::models::{CoinPrice, CoinSearchHit, PriceHistory, USD};

const RATE_LIMIT_KEY: &str = "coingecko";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko REST client implementing [`PriceSource`].
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    min_interval: Duration,
    max_retries: u32,
    rate_limiter: Arc<RateLimiter>,
}

impl CoinGeckoClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            min_interval: config.min_request_interval(),
            max_retries: config.max_retries,
            rate_limiter: Arc::new(RateLimiter::new()),
        })
    }

    /// Shares one limiter between several clients hitting the same host.
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    async fn make_request(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut retry_count = 0;

        loop {
            self.rate_limiter
                .wait_until_ready(RATE_LIMIT_KEY, self.min_interval)
                .await;

            let mut request = self
                .client
                .get(&url)
                .query(params)
                .header("accept", "application/json");
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }

            API_REQUESTS.inc();
            let timer = API_LATENCY.start_timer();
            let response = request.send().await;
            timer.observe_duration();

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    API_ERRORS.inc();
                    error!("Request to {} failed: {}", endpoint, e);
                    return Err(Error::from(e));
                }
            };

            let status = response.status();
            if status.is_success() {
                debug!("{} -> {}", endpoint, status);
                return response.text().await.map_err(Error::from);
            }

            API_ERRORS.inc();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if retry_count < self.max_retries {
                    retry_count += 1;
                    let backoff = Duration::from_secs(2u64.pow(retry_count));
                    warn!(
                        "Rate limit exceeded on {}, backing off for {} seconds...",
                        endpoint,
                        backoff.as_secs()
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                return Err(Error::RateLimited(format!(
                    "CoinGecko rate limit exceeded after {} retries",
                    retry_count
                )));
            }

            let error_msg = format!("CoinGecko request to {} failed with status: {}", endpoint, status);
            error!("{}", error_msg);
            return Err(Error::SourceUnavailable(error_msg));
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn get_spot_prices(
        &self,
        coin_ids: &[String],
        currencies: &[String],
    ) -> Result<HashMap<String, CoinPrice>> {
        if coin_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let currencies = if currencies.is_empty() {
            vec![USD.to_string()]
        } else {
            currencies.iter().map(|c| c.to_lowercase()).collect()
        };

        info!("Fetching spot prices for {}", coin_ids.join(","));
        let body = self
            .make_request(
                "simple/price",
                &[
                    ("ids", coin_ids.join(",")),
                    ("vs_currencies", currencies.join(",")),
                    ("include_24hr_change", "true".to_string()),
                ],
            )
            .await?;

        parse_simple_price(&body, coin_ids, &currencies)
    }

    async fn get_historical_series(&self, coin_id: &str, days: u32) -> Result<PriceHistory> {
        info!("Fetching {}-day price history for {}", days, coin_id);
        let body = self
            .make_request(
                &format!("coins/{}/market_chart", coin_id),
                &[("vs_currency", USD.to_string()), ("days", days.to_string())],
            )
            .await?;

        parse_market_chart(coin_id, &body)
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<CoinSearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        info!("Searching coins matching {:?}", query);
        let body = self
            .make_request("search", &[("query", query.to_string())])
            .await?;

        parse_search(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PRICE_BODY: &str = r#"{"bitcoin": {"usd": 50000.0, "usd_24h_change": 1.25}}"#;

    fn local_config(server: &MockServer, max_retries: u32) -> ApiConfig {
        ApiConfig {
            base_url: server.uri(),
            api_key: Some("demo-key".to_string()),
            timeout_secs: 5,
            max_retries,
            min_request_interval_ms: 0,
        }
    }

    async fn fetch_bitcoin(client: &CoinGeckoClient) -> Result<HashMap<String, CoinPrice>> {
        client
            .get_spot_prices(&["bitcoin".to_string()], &["usd".to_string()])
            .await
    }

    fn unreachable_config() -> ApiConfig {
        ApiConfig {
            base_url: "http://127.0.0.1:9/api/v3/".to_string(),
            api_key: None,
            timeout_secs: 1,
            max_retries: 0,
            min_request_interval_ms: 0,
        }
    }

    #[test]
    fn test_base_url_is_normalised() {
        let client = CoinGeckoClient::new(&unreachable_config()).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:9/api/v3");
    }

    #[tokio::test]
    async fn test_empty_inputs_skip_network() {
        let client = CoinGeckoClient::new(&unreachable_config()).unwrap();
        assert!(client.get_spot_prices(&[], &[]).await.unwrap().is_empty());
        assert!(client.search_by_name("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_is_source_unavailable() {
        let client = CoinGeckoClient::new(&unreachable_config()).unwrap();
        let err = client
            .get_spot_prices(&["bitcoin".to_string()], &["usd".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_without_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let client = CoinGeckoClient::new(&local_config(&server, 0)).unwrap();
        let err = fetch_bitcoin(&client).await.unwrap_err();
        assert!(matches!(err, Error::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PRICE_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let client = CoinGeckoClient::new(&local_config(&server, 1)).unwrap();
        let prices = fetch_bitcoin(&client).await.unwrap();
        let bitcoin = &prices["bitcoin"];
        assert_eq!(bitcoin.usd_price(), Some(50000.0));
        assert_eq!(bitcoin.change_24h, Some(1.25));
    }

    #[tokio::test]
    async fn test_server_error_is_source_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = CoinGeckoClient::new(&local_config(&server, 3)).unwrap();
        let err = fetch_bitcoin(&client).await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
