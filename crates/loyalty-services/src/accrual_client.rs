//! HTTP client for the Accrual status lookup

use crate::constants::{ACCRUAL_ORDERS_PATH, DEFAULT_RETRY_AFTER_SECS};
use async_trait::async_trait;
use loyalty_core::{
    models::AccrualOrderView,
    traits::{AccrualClient, AccrualLookup},
    AppError, AppResult,
};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// `AccrualClient` speaking HTTP to the Accrual service
#[derive(Debug, Clone)]
pub struct HttpAccrualClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAccrualClient {
    /// Client for the service at `address`, each request bounded by `timeout`
    ///
    /// An address without scheme is taken as plain HTTP.
    pub fn new(address: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(address),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn order_url(&self, number: &str) -> String {
        format!("{}{}/{}", self.base_url, ACCRUAL_ORDERS_PATH, number)
    }
}

#[async_trait]
impl AccrualClient for HttpAccrualClient {
    #[instrument(skip(self))]
    async fn lookup(&self, number: &str) -> AppResult<AccrualLookup> {
        let url = self.order_url(number);
        debug!(%url, "Fetching order status from accrual service");

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!("Accrual request failed: {}", e);
            AppError::AccrualService(format!("Request to {} failed: {}", url, e))
        })?;

        match response.status() {
            StatusCode::OK => {
                let view = response.json::<AccrualOrderView>().await.map_err(|e| {
                    error!("Malformed accrual response: {}", e);
                    AppError::AccrualService(format!("Malformed response: {}", e))
                })?;
                Ok(AccrualLookup::Found(view))
            }
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(AccrualLookup::NotRegistered),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = parse_retry_after(response.headers())
                    .unwrap_or(Duration::from_secs(DEFAULT_RETRY_AFTER_SECS));
                warn!(retry_after_secs = retry_after.as_secs(), "Accrual service rate limit hit");
                Ok(AccrualLookup::RateLimited { retry_after })
            }
            status => {
                error!(%status, "Unexpected accrual response");
                Err(AppError::AccrualService(format!(
                    "Unexpected status {} for order {}",
                    status, number
                )))
            }
        }
    }
}

fn normalize_base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// Delay from a `Retry-After` header given in seconds
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("localhost:8081"), "http://localhost:8081");
        assert_eq!(
            normalize_base_url("http://accrual:8081/"),
            "http://accrual:8081"
        );
        assert_eq!(
            normalize_base_url("https://accrual.example.com"),
            "https://accrual.example.com"
        );
    }

    #[test]
    fn test_order_url() {
        let client = HttpAccrualClient::new("localhost:8081", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.order_url("79927398713"),
            "http://localhost:8081/api/orders/79927398713"
        );
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("60"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(60)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }
}
