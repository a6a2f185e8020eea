//! Scan configuration from environment variables

use std::env;

const DEFAULT_API_BASE: &str = "https://xp.tamsa.io/xphere/api/v1";
const DEFAULT_REFERER_BASE: &str = "https://xp.tamsa.io/main";
const DEFAULT_TEST_ADDRESS: &str = "0x05d4a19b4304b2de51ac2578aa0eec5de2301e62";

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for a scan run
///
/// Loaded from environment variables with sensible defaults; a plain
/// `xpscan` invocation scans the public Xphere explorer API.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Explorer API base URL (proof and address endpoints live under it)
    pub api_base: String,

    /// Base URL used to build browser-like Referer headers
    pub referer_base: String,

    /// Number of proof pages to scan, starting at page 1
    pub total_pages: u32,

    /// Rows requested per page
    pub page_limit: u32,

    /// Worker pool width shared by both phases
    pub workers: usize,

    /// Attempts per request before a fetch is considered exhausted
    pub max_attempts: u32,

    /// Per-request timeout for proof pages, in seconds
    pub page_timeout_secs: u64,

    /// Per-request timeout for balance lookups, in seconds
    pub balance_timeout_secs: u64,

    /// Tokens earned per produced block
    pub reward_per_block: u64,

    /// Reference address appended with a zero count when it never mined
    pub test_address: String,

    /// Directory the ranked report file is written to
    pub output_dir: String,
}

impl ScanConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `XPSCAN_API_BASE` (default: https://xp.tamsa.io/xphere/api/v1)
    /// - `XPSCAN_REFERER_BASE` (default: https://xp.tamsa.io/main)
    /// - `XPSCAN_TOTAL_PAGES` (default: 64)
    /// - `XPSCAN_PAGE_LIMIT` (default: 1000)
    /// - `XPSCAN_WORKERS` (default: 16)
    /// - `XPSCAN_MAX_ATTEMPTS` (default: 5)
    /// - `XPSCAN_PAGE_TIMEOUT_SECS` (default: 30)
    /// - `XPSCAN_BALANCE_TIMEOUT_SECS` (default: 15)
    /// - `XPSCAN_REWARD_PER_BLOCK` (default: 800)
    /// - `XPSCAN_TEST_ADDRESS` (default: known reference address)
    /// - `XPSCAN_OUTPUT_DIR` (default: current directory)
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            api_base: env::var("XPSCAN_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),

            referer_base: env::var("XPSCAN_REFERER_BASE")
                .unwrap_or_else(|_| DEFAULT_REFERER_BASE.to_string()),

            total_pages: env::var("XPSCAN_TOTAL_PAGES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64),

            page_limit: env::var("XPSCAN_PAGE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000),

            workers: env::var("XPSCAN_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),

            max_attempts: env::var("XPSCAN_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),

            page_timeout_secs: env::var("XPSCAN_PAGE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),

            balance_timeout_secs: env::var("XPSCAN_BALANCE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),

            reward_per_block: env::var("XPSCAN_REWARD_PER_BLOCK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(800),

            test_address: env::var("XPSCAN_TEST_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_TEST_ADDRESS.to_string()),

            output_dir: env::var("XPSCAN_OUTPUT_DIR")
                .unwrap_or_else(|_| ".".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "XPSCAN_API_BASE must start with http:// or https://".to_string(),
            ));
        }

        if !self.referer_base.starts_with("http://") && !self.referer_base.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "XPSCAN_REFERER_BASE must start with http:// or https://".to_string(),
            ));
        }

        if self.total_pages == 0 {
            return Err(ConfigError::InvalidValue(
                "XPSCAN_TOTAL_PAGES must be at least 1".to_string(),
            ));
        }

        if self.page_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "XPSCAN_PAGE_LIMIT must be at least 1".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(ConfigError::InvalidValue(
                "XPSCAN_WORKERS must be at least 1".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "XPSCAN_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if self.test_address.is_empty() {
            return Err(ConfigError::InvalidValue(
                "XPSCAN_TEST_ADDRESS cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_roundtrip() {
        // Test: Defaults apply with no env vars set, overrides take effect after.
        // Both halves share one test so parallel test threads never race on env.
        env::remove_var("XPSCAN_API_BASE");
        env::remove_var("XPSCAN_TOTAL_PAGES");
        env::remove_var("XPSCAN_WORKERS");
        env::remove_var("XPSCAN_MAX_ATTEMPTS");
        env::remove_var("XPSCAN_REWARD_PER_BLOCK");
        env::remove_var("XPSCAN_OUTPUT_DIR");

        let config = ScanConfig::from_env().unwrap();

        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.referer_base, DEFAULT_REFERER_BASE);
        assert_eq!(config.total_pages, 64);
        assert_eq!(config.page_limit, 1_000);
        assert_eq!(config.workers, 16);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.page_timeout_secs, 30);
        assert_eq!(config.balance_timeout_secs, 15);
        assert_eq!(config.reward_per_block, 800);
        assert_eq!(config.test_address, DEFAULT_TEST_ADDRESS);
        assert_eq!(config.output_dir, ".");

        env::set_var("XPSCAN_TOTAL_PAGES", "8");
        env::set_var("XPSCAN_WORKERS", "4");
        env::set_var("XPSCAN_REWARD_PER_BLOCK", "100");
        env::set_var("XPSCAN_OUTPUT_DIR", "/tmp/xpscan");

        let config = ScanConfig::from_env().unwrap();

        assert_eq!(config.total_pages, 8);
        assert_eq!(config.workers, 4);
        assert_eq!(config.reward_per_block, 100);
        assert_eq!(config.output_dir, "/tmp/xpscan");

        // Cleanup
        env::remove_var("XPSCAN_TOTAL_PAGES");
        env::remove_var("XPSCAN_WORKERS");
        env::remove_var("XPSCAN_REWARD_PER_BLOCK");
        env::remove_var("XPSCAN_OUTPUT_DIR");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        // Test: Zero pool width and non-HTTP base URLs are rejected
        let base = ScanConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            referer_base: DEFAULT_REFERER_BASE.to_string(),
            total_pages: 64,
            page_limit: 1_000,
            workers: 16,
            max_attempts: 5,
            page_timeout_secs: 30,
            balance_timeout_secs: 15,
            reward_per_block: 800,
            test_address: DEFAULT_TEST_ADDRESS.to_string(),
            output_dir: ".".to_string(),
        };
        assert!(base.validate().is_ok());

        let mut bad = base.clone();
        bad.workers = 0;
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.total_pages = 0;
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.max_attempts = 0;
        assert!(bad.validate().is_err());

        let mut bad = base;
        bad.api_base = "ftp://example.com".to_string();
        assert!(bad.validate().is_err());
    }
}
