//! CoinGecko historical price client
//!
//! Uses the public `coins/{id}/market_chart` endpoint with daily interval.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::market_data::{FetchError, PriceFetcher, RateLimiter};
use crate::types::{PriceSample, PriceSeries};

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Connection settings for [`CoinGeckoClient`]
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub vs_currency: String,
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
            vs_currency: "usd".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// `market_chart` response. Only `prices` is used; `market_caps` and
/// `total_volumes` are ignored.
#[derive(Debug, Clone, Deserialize)]
struct MarketChartResponse {
    prices: Vec<Vec<f64>>,
}

/// Parse a `market_chart` body into samples.
///
/// Each entry must be a `[timestamp_ms, price]` pair.
pub fn parse_market_chart(body: &str) -> Result<PriceSeries, FetchError> {
    let chart: MarketChartResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    chart
        .prices
        .iter()
        .enumerate()
        .map(|(i, pair)| match pair.as_slice() {
            [ts, price] => Ok(PriceSample::new(*ts as i64, *price)),
            _ => Err(FetchError::Decode(format!(
                "price entry {} has {} fields, expected 2",
                i,
                pair.len()
            ))),
        })
        .collect()
}

/// Client for CoinGecko's public API
pub struct CoinGeckoClient {
    client: reqwest::Client,
    config: CoinGeckoConfig,
    limiter: Arc<dyn RateLimiter>,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig, limiter: Arc<dyn RateLimiter>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            "CoinGecko client initialized"
        );

        Ok(Self {
            client,
            config,
            limiter,
        })
    }
}

#[async_trait]
impl PriceFetcher for CoinGeckoClient {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn fetch(&self, asset_id: &str, days: u32) -> Result<PriceSeries, FetchError> {
        let url = format!("{}/coins/{}/market_chart", self.config.base_url, asset_id);
        let days = days.to_string();
        let params = [
            ("vs_currency", self.config.vs_currency.as_str()),
            ("days", days.as_str()),
            ("interval", "daily"),
        ];

        debug!(asset = %asset_id, "Waiting for rate limiter");
        self.limiter.acquire().await;

        debug!(asset = %asset_id, %url, "Sending request");
        let response = self.client.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(asset = %asset_id, status = %status, "Price history request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let series = parse_market_chart(&body)?;

        info!(
            asset = %asset_id,
            points = series.len(),
            "Fetched price history"
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::NoDelay;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[derive(Default)]
    struct CountingLimiter {
        acquired: AtomicUsize,
    }

    #[async_trait]
    impl RateLimiter for CountingLimiter {
        async fn acquire(&self) {
            self.acquired.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn local_config(base_url: String) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url,
            timeout: Duration::from_secs(5),
            ..CoinGeckoConfig::default()
        }
    }

    /// Answer a single HTTP request with `status_line` and `body`, handing
    /// back the raw request head
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api/v3", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn fetch_acquires_limiter_before_connecting() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let limiter = Arc::new(CountingLimiter::default());
        let client =
            CoinGeckoClient::new(local_config(format!("http://{}", addr)), limiter.clone()).unwrap();

        let err = client.fetch("bitcoin", 30).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)), "got {:?}", err);
        assert_eq!(limiter.acquired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_maps_rejection_to_status_error() {
        let (base_url, server) =
            serve_once("429 Too Many Requests", r#"{"status":{"error_code":429}}"#).await;
        let client = CoinGeckoClient::new(local_config(base_url), Arc::new(NoDelay)).unwrap();

        let err = client.fetch("nillion", 90).await.unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("error_code"));
            }
            other => panic!("expected status error, got {:?}", other),
        }

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap_or_default();
        assert!(
            request_line.starts_with(
                "GET /api/v3/coins/nillion/market_chart?vs_currency=usd&days=90&interval=daily "
            ),
            "unexpected request line: {}",
            request_line
        );
    }

    #[tokio::test]
    async fn fetch_parses_successful_response() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"prices": [[1699920000000, 1.5], [1700006400000, 1.75]]}"#,
        )
        .await;
        let limiter = Arc::new(CountingLimiter::default());
        let client = CoinGeckoClient::new(local_config(base_url), limiter.clone()).unwrap();

        let series = client.fetch("mind-network", 30).await.unwrap();

        assert_eq!(
            series,
            vec![
                PriceSample::new(1_699_920_000_000, 1.5),
                PriceSample::new(1_700_006_400_000, 1.75),
            ]
        );
        assert_eq!(limiter.acquired.load(Ordering::SeqCst), 1);
        server.await.unwrap();
    }

    #[test]
    fn parse_market_chart_reads_price_pairs() {
        let body = r#"{
            "prices": [[1699920000000, 35000.5], [1700006400000.0, 36000.25]],
            "market_caps": [[1699920000000, 1.0]],
            "total_volumes": [[1699920000000, 2.0]]
        }"#;

        let series = parse_market_chart(body).expect("body should parse");
        assert_eq!(
            series,
            vec![
                PriceSample::new(1_699_920_000_000, 35000.5),
                PriceSample::new(1_700_006_400_000, 36000.25),
            ]
        );
    }

    #[test]
    fn parse_market_chart_accepts_empty_prices() {
        let series = parse_market_chart(r#"{"prices": []}"#).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn parse_market_chart_rejects_short_pair() {
        let err = parse_market_chart(r#"{"prices": [[1699920000000]]}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn parse_market_chart_rejects_error_payload() {
        let err = parse_market_chart(r#"{"status": {"error_code": 429}}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn default_config_targets_public_api() {
        let config = CoinGeckoConfig::default();
        assert_eq!(config.base_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.vs_currency, "usd");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
