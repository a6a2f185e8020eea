//! Explorer API client
//!
//! Typed access to the two upstream endpoints:
//! - `GET {api_base}/proof?page={n}&limit={m}`: block-production records
//! - `GET {api_base}/address/{addr}`: current balance of one address
//!
//! Both are fetched through the retrying fetcher with the browser-like
//! headers and the Referer of the corresponding explorer page.

use crate::config::ScanConfig;
use crate::fetcher::{FetchExhausted, HttpTransport, RetryingFetcher};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;

/// One page of block-production records
///
/// A payload without a `rows` key is a valid empty page, not an error.
#[derive(Debug, Clone, Deserialize)]
pub struct ProofPage {
    #[serde(default)]
    pub rows: Vec<ProofRow>,
}

/// One block-production record; either address field may be absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProofRow {
    pub miner: Option<String>,
    pub validator: Option<String>,
}

/// Balance payload for one address
///
/// The chain returns the raw balance as an integer string; a balance that
/// fails to parse makes the whole payload a parse failure, which the
/// fetcher's attempt loop retries like any other malformed body.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressPayload {
    pub row: AddressRow,
    pub decimals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressRow {
    #[serde(deserialize_with = "integer_string")]
    pub balance: u128,
}

impl AddressPayload {
    /// Balance scaled by the chain's decimals
    pub fn value(&self) -> f64 {
        self.row.balance as f64 / 10f64.powi(self.decimals as i32)
    }
}

fn integer_string<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse::<u128>().map_err(serde::de::Error::custom)
}

/// Client for the explorer's HTTP API
pub struct ExplorerClient {
    fetcher: RetryingFetcher,
    api_base: String,
    referer_base: String,
    page_limit: u32,
    page_timeout: Duration,
    balance_timeout: Duration,
}

impl ExplorerClient {
    pub fn new(config: &ScanConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            fetcher: RetryingFetcher::new(transport, config.max_attempts),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            referer_base: config.referer_base.trim_end_matches('/').to_string(),
            page_limit: config.page_limit,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            balance_timeout: Duration::from_secs(config.balance_timeout_secs),
        }
    }

    /// Fetch one page of block-production records
    pub async fn fetch_proof_page(&self, page: u32) -> Result<ProofPage, FetchExhausted> {
        let url = self.proof_url(page);
        let referer = self.proof_referer(page);
        self.fetcher
            .fetch(&url, &referer, self.page_timeout)
            .await
    }

    /// Fetch the current balance of one address, scaled by decimals
    pub async fn fetch_balance(&self, address: &str) -> Result<f64, FetchExhausted> {
        let url = format!("{}/address/{}", self.api_base, address);
        let referer = format!("{}/address/{}", self.referer_base, address);
        let payload: AddressPayload = self
            .fetcher
            .fetch(&url, &referer, self.balance_timeout)
            .await?;
        Ok(payload.value())
    }

    fn proof_url(&self, page: u32) -> String {
        format!(
            "{}/proof?page={}&limit={}",
            self.api_base, page, self.page_limit
        )
    }

    fn proof_referer(&self, page: u32) -> String {
        format!(
            "{}/blocks/proof?page={}&count={}",
            self.referer_base, page, self.page_limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::TransportError;
    use async_trait::async_trait;
    use serde_json::json;

    #[test]
    fn test_proof_page_tolerates_missing_rows() {
        // Test: A payload without "rows" is an empty page
        let page: ProofPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_proof_row_optional_fields() {
        // Test: Absent address fields deserialize to None, extras are ignored
        let page: ProofPage = serde_json::from_value(json!({
            "rows": [
                {"miner": "0xAB", "height": 12},
                {"validator": "0xCD"},
                {}
            ]
        }))
        .unwrap();

        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.rows[0].miner.as_deref(), Some("0xAB"));
        assert!(page.rows[0].validator.is_none());
        assert_eq!(page.rows[1].validator.as_deref(), Some("0xCD"));
        assert!(page.rows[2].miner.is_none());
    }

    #[test]
    fn test_balance_payload_scaling() {
        // Test: balance=500, decimals=2 resolves to 5.0
        let payload: AddressPayload =
            serde_json::from_value(json!({"row": {"balance": "500"}, "decimals": 2})).unwrap();
        assert_eq!(payload.value(), 5.0);

        let payload: AddressPayload =
            serde_json::from_value(json!({"row": {"balance": "123456"}, "decimals": 3})).unwrap();
        assert_eq!(payload.value(), 123.456);
    }

    #[test]
    fn test_balance_payload_rejects_non_integer() {
        // Test: A non-integer balance string is a parse failure, as is a
        // payload missing expected keys
        assert!(serde_json::from_value::<AddressPayload>(
            json!({"row": {"balance": "12.5"}, "decimals": 2})
        )
        .is_err());
        assert!(serde_json::from_value::<AddressPayload>(json!({"decimals": 2})).is_err());
        assert!(serde_json::from_value::<AddressPayload>(json!({"row": {}})).is_err());
    }

    fn test_client(transport: Arc<dyn HttpTransport>) -> ExplorerClient {
        let config = ScanConfig {
            api_base: "http://test/api/v1/".to_string(),
            referer_base: "http://test/main".to_string(),
            total_pages: 2,
            page_limit: 1_000,
            workers: 4,
            max_attempts: 2,
            page_timeout_secs: 1,
            balance_timeout_secs: 1,
            reward_per_block: 800,
            test_address: "0xtest".to_string(),
            output_dir: ".".to_string(),
        };
        ExplorerClient::new(&config, transport)
    }

    struct NoopTransport;

    #[async_trait]
    impl HttpTransport for NoopTransport {
        async fn get_json(
            &self,
            _url: &str,
            _referer: &str,
            _timeout: Duration,
        ) -> Result<serde_json::Value, TransportError> {
            Err(TransportError::Network("noop".to_string()))
        }
    }

    #[test]
    fn test_url_construction() {
        // Test: Endpoint and Referer URLs match the explorer's layout,
        // trailing slashes on the bases are tolerated
        let client = test_client(Arc::new(NoopTransport));

        assert_eq!(client.proof_url(3), "http://test/api/v1/proof?page=3&limit=1000");
        assert_eq!(
            client.proof_referer(3),
            "http://test/main/blocks/proof?page=3&count=1000"
        );
    }
}
