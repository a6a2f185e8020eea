//! Concurrent proof-page scan phase
//!
//! Spawns one task per page into a `JoinSet`, bounded by a semaphore sized
//! to the worker count. The first page to exhaust its retries flips the
//! abort flag and the remaining tasks are cancelled; the partial state is
//! still returned so the caller can report which pages failed.

use crate::aggregator::{extract_addresses, ScanState};
use crate::config::ScanConfig;
use crate::explorer::ExplorerClient;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Scan pages 1..=total_pages and aggregate address counts
///
/// Extraction and logging happen outside the state lock; only the merge
/// holds it.
pub async fn scan_pages(config: &ScanConfig, client: Arc<ExplorerClient>) -> ScanState {
    let state = Arc::new(Mutex::new(ScanState::new()));
    let semaphore = Arc::new(Semaphore::new(config.workers));
    let aborted = Arc::new(AtomicBool::new(false));

    let mut tasks = JoinSet::new();
    for page in 1..=config.total_pages {
        let client = Arc::clone(&client);
        let state = Arc::clone(&state);
        let semaphore = Arc::clone(&semaphore);
        let aborted = Arc::clone(&aborted);

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            if aborted.load(Ordering::SeqCst) {
                return;
            }

            match client.fetch_proof_page(page).await {
                Ok(proof_page) => {
                    let block_rows = proof_page.rows.len();
                    let extracted = extract_addresses(&proof_page);
                    let (new_addresses, total_addresses) = {
                        let mut guard = state.lock().unwrap();
                        let new_addresses = guard.merge_page(&extracted);
                        (new_addresses, guard.address_count())
                    };
                    info!(
                        "📄 Page {}: {} blocks, {} new addresses ({} total)",
                        page, block_rows, new_addresses, total_addresses
                    );
                }
                Err(err) => {
                    warn!("⚠️ Page {}: {}", page, err);
                    aborted.store(true, Ordering::SeqCst);
                    state.lock().unwrap().record_failed_page(page);
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            if !err.is_cancelled() {
                warn!("⚠️ Page task failed to join: {}", err);
            }
        }
        if aborted.load(Ordering::SeqCst) {
            tasks.abort_all();
        }
    }

    let mut guard = state.lock().unwrap();
    std::mem::take(&mut *guard)
}
