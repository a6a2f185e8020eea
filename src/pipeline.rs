//! Scan orchestration
//!
//! Page phase, then balance phase, then ranking. A failed page anywhere
//! aborts the whole run before any balance is fetched: partial counts would
//! produce a report that silently under-credits addresses.

use crate::balances::resolve_balances;
use crate::config::ScanConfig;
use crate::explorer::ExplorerClient;
use crate::fetcher::HttpTransport;
use crate::pages::scan_pages;
use crate::report::ReportRecord;
use log::{error, info, warn};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Returned when one or more pages exhausted their retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanAborted {
    pub failed_pages: usize,
}

impl fmt::Display for ScanAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan aborted: {} page(s) failed", self.failed_pages)
    }
}

impl std::error::Error for ScanAborted {}

/// Run the full scan and return records ranked by balance
///
/// The caller owns the report sink; this only produces the rows.
pub async fn run_scan(
    config: &ScanConfig,
    transport: Arc<dyn HttpTransport>,
) -> Result<Vec<ReportRecord>, ScanAborted> {
    let client = Arc::new(ExplorerClient::new(config, transport));

    info!(
        "📊 Scanning {} pages ({} rows per page, {} workers)",
        config.total_pages, config.page_limit, config.workers
    );
    let state = scan_pages(config, Arc::clone(&client)).await;

    if state.has_failures() {
        error!(
            "❌ Aborting: {} page(s) still failing after {} attempts, no report will be written",
            state.failed_page_count(),
            config.max_attempts
        );
        return Err(ScanAborted {
            failed_pages: state.failed_page_count(),
        });
    }

    info!(
        "📊 Page phase complete: {} addresses across {} block entries",
        state.address_count(),
        state.total_blocks()
    );

    let entries: Vec<(String, u64)> = state.into_counts().into_iter().collect();
    let addresses: Vec<String> = entries.iter().map(|(address, _)| address.clone()).collect();

    info!("💰 Resolving balances for {} addresses", addresses.len());
    let resolved = resolve_balances(config, Arc::clone(&client), addresses).await;

    let mut records: Vec<ReportRecord> = entries
        .into_iter()
        .zip(resolved)
        .map(|((address, blocks), entry)| ReportRecord {
            address,
            blocks,
            reward: blocks * config.reward_per_block,
            balance: entry.balance,
        })
        .collect();

    append_test_address(config, &client, &mut records).await;
    rank_by_balance(&mut records);

    Ok(records)
}

/// Make sure the configured test address appears in the output
///
/// When the scan never saw it, it gets a zero-block row so its balance is
/// still visible in the report. The row is only added if the balance
/// lookup succeeds; a zero-count row with no balance carries no
/// information.
async fn append_test_address(
    config: &ScanConfig,
    client: &ExplorerClient,
    records: &mut Vec<ReportRecord>,
) {
    let test_address = config.test_address.to_lowercase();

    if records.iter().any(|record| record.address == test_address) {
        info!("Test address {} found in results", test_address);
        return;
    }

    match client.fetch_balance(&test_address).await {
        Ok(balance) => {
            info!(
                "Test address {} not seen in any block, appended with zero blocks",
                test_address
            );
            records.push(ReportRecord {
                address: test_address,
                blocks: 0,
                reward: 0,
                balance: Some(balance),
            });
        }
        Err(err) => {
            warn!("⚠️ Test address {} balance unavailable: {}", test_address, err);
        }
    }
}

/// Sort records by balance, highest first, unresolved balances last
pub fn rank_by_balance(records: &mut [ReportRecord]) {
    records.sort_by(|a, b| match (a.balance, b.balance) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
