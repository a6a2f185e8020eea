//! Per-address block-count aggregation state
//!
//! One `ScanState` lives behind a single mutex for the duration of the page
//! phase. Workers extract addresses from their page outside the lock, then
//! call `merge_page` inside it; the merge is commutative per address, so any
//! completion order yields the same counts.

use crate::explorer::ProofPage;
use std::collections::{HashMap, HashSet};

/// Shared aggregation state for one scan run
///
/// `seen` only feeds the per-page "new addresses" log line; the counts map
/// is the authoritative output. `failed_pages` non-empty means the run must
/// abort.
#[derive(Debug, Default)]
pub struct ScanState {
    counts: HashMap<String, u64>,
    seen: HashSet<String>,
    failed_pages: HashSet<u32>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page's extracted addresses into the counts
    ///
    /// Every occurrence increments, including repeats within the page.
    /// Returns how many of the page's distinct addresses had never been
    /// counted before, for progress logging.
    pub fn merge_page(&mut self, extracted: &[String]) -> usize {
        let unique: HashSet<&str> = extracted.iter().map(String::as_str).collect();
        let mut new_addresses = 0;
        for address in unique {
            if self.seen.insert(address.to_string()) {
                new_addresses += 1;
            }
        }

        for address in extracted {
            *self.counts.entry(address.clone()).or_insert(0) += 1;
        }

        new_addresses
    }

    pub fn record_failed_page(&mut self, page: u32) {
        self.failed_pages.insert(page);
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_pages.is_empty()
    }

    pub fn failed_page_count(&self) -> usize {
        self.failed_pages.len()
    }

    pub fn failed_pages(&self) -> &HashSet<u32> {
        &self.failed_pages
    }

    pub fn counts(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    /// Number of distinct addresses counted so far
    pub fn address_count(&self) -> usize {
        self.counts.len()
    }

    /// Total block occurrences across all addresses
    pub fn total_blocks(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn into_counts(self) -> HashMap<String, u64> {
        self.counts
    }
}

/// Pull every address occurrence out of one page
///
/// Miner then validator per row, normalized to lowercase. Absent and empty
/// fields are skipped; duplicates are preserved so a block naming the same
/// address twice counts twice.
pub fn extract_addresses(page: &ProofPage) -> Vec<String> {
    let mut extracted = Vec::new();
    for row in &page.rows {
        for field in [row.miner.as_deref(), row.validator.as_deref()] {
            if let Some(address) = field {
                if !address.is_empty() {
                    extracted.push(address.to_lowercase());
                }
            }
        }
    }
    extracted
}
