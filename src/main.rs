pub mod aggregator;
pub mod balances;
pub mod config;
pub mod explorer;
pub mod fetcher;
pub mod pages;
pub mod pipeline;
pub mod report;

use {
    config::ScanConfig,
    fetcher::ReqwestTransport,
    pipeline::run_scan,
    report::{report_path, write_report, ReportRecord},
    std::sync::Arc,
};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Write logs to stderr so stdout stays clean for shell pipelines
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ScanConfig::from_env()?;

    log::info!("🚀 Starting Xphere block scan...");
    log::info!("📊 Configuration:");
    log::info!("   ├─ API: {}", config.api_base);
    log::info!(
        "   ├─ Pages: {} x {} rows",
        config.total_pages,
        config.page_limit
    );
    log::info!("   ├─ Workers: {}", config.workers);
    log::info!("   └─ Attempts per request: {}", config.max_attempts);

    let transport = Arc::new(ReqwestTransport::new()?);
    let records = run_scan(&config, transport).await?;

    let path = report_path(&config.output_dir);
    write_report(&records, &path)?;

    verify_test_address(&config, &records);
    log::info!(
        "✅ Scan complete: {} records -> {}",
        records.len(),
        path.display()
    );

    Ok(())
}

/// Echo the configured test address's row so a run can be eyeballed
/// against the explorer UI
fn verify_test_address(config: &ScanConfig, records: &[ReportRecord]) {
    let test_address = config.test_address.to_lowercase();
    match records.iter().find(|record| record.address == test_address) {
        Some(record) => {
            log::info!("Calculated reward for {}: {}", record.address, record.reward);
            match record.balance {
                Some(balance) => {
                    log::info!("Resolved balance for {}: {:.2}", record.address, balance)
                }
                None => log::warn!("⚠️ Balance for {} was not resolved", record.address),
            }
        }
        None => log::warn!("⚠️ Test address {} missing from report", test_address),
    }
}
