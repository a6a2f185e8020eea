//! Balance fan-out phase
//!
//! Looks up the balance of every counted address through the same bounded
//! worker pool as the page phase. Unlike page failures, a balance that
//! cannot be fetched is not fatal; the address keeps a `None` balance and
//! sorts to the bottom of the report.

use crate::config::ScanConfig;
use crate::explorer::ExplorerClient;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One address with its resolved balance, `None` when the lookup failed
#[derive(Debug, Clone, PartialEq)]
pub struct AddressBalance {
    pub address: String,
    pub balance: Option<f64>,
}

/// Resolve balances for `addresses`, preserving input order
pub async fn resolve_balances(
    config: &ScanConfig,
    client: Arc<ExplorerClient>,
    addresses: Vec<String>,
) -> Vec<AddressBalance> {
    let semaphore = Arc::new(Semaphore::new(config.workers));
    let mut tasks = JoinSet::new();

    for (index, address) in addresses.iter().enumerate() {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let address = address.clone();

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (index, None),
            };

            match client.fetch_balance(&address).await {
                Ok(balance) => {
                    info!("💰 {}: {:.2}", address, balance);
                    (index, Some(balance))
                }
                Err(err) => {
                    warn!("⚠️ Balance for {} unavailable: {}", address, err);
                    (index, None)
                }
            }
        });
    }

    let mut resolved = vec![None; addresses.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, balance)) => resolved[index] = balance,
            Err(err) => warn!("⚠️ Balance task failed to join: {}", err),
        }
    }

    addresses
        .into_iter()
        .zip(resolved)
        .map(|(address, balance)| AddressBalance { address, balance })
        .collect()
}
