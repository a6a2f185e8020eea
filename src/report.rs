//! Report records and the CSV sink
//!
//! One row per address: block count, the reward derived from it, and the
//! balance when the lookup succeeded. Files are timestamped so repeated
//! runs never clobber each other.

use chrono::Local;
use log::info;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One ranked output row
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub address: String,
    pub blocks: u64,
    pub reward: u64,
    pub balance: Option<f64>,
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "report io error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

/// Timestamped output path inside `output_dir`
pub fn report_path(output_dir: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    Path::new(output_dir).join(format!("xphere_holders_{}.csv", stamp))
}

/// Write the records as CSV, header first
///
/// A missing balance becomes an empty trailing field rather than a
/// placeholder value.
pub fn write_report(records: &[ReportRecord], path: &Path) -> Result<(), ReportError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "address,blocks,reward,balance")?;
    for record in records {
        match record.balance {
            Some(balance) => writeln!(
                writer,
                "{},{},{},{:.2}",
                record.address, record.blocks, record.reward, balance
            )?,
            None => writeln!(
                writer,
                "{},{},{},",
                record.address, record.blocks, record.reward
            )?,
        }
    }
    writer.flush()?;

    info!(
        "📝 Report written: {} ({} records)",
        path.display(),
        records.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_report_contents() {
        // Test: Rows render count, reward, and balance; None leaves the
        // trailing field empty
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let records = vec![
            ReportRecord {
                address: "0xaa".to_string(),
                blocks: 2,
                reward: 1600,
                balance: Some(31.416),
            },
            ReportRecord {
                address: "0xbb".to_string(),
                blocks: 1,
                reward: 800,
                balance: None,
            },
        ];
        write_report(&records, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines,
            vec!["address,blocks,reward,balance", "0xaa,2,1600,31.42", "0xbb,1,800,"]
        );
    }

    #[test]
    fn test_empty_records_write_header_only() {
        // Test: Zero records still produce a parseable file
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_report(&[], &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "address,blocks,reward,balance\n");
    }

    #[test]
    fn test_report_path_embeds_valid_timestamp() {
        // Test: Filename carries a parseable local timestamp
        let path = report_path("/tmp/reports");
        let name = path.file_name().unwrap().to_str().unwrap();

        assert!(name.starts_with("xphere_holders_"));
        assert!(name.ends_with(".csv"));

        let stamp = name
            .trim_start_matches("xphere_holders_")
            .trim_end_matches(".csv");
        assert!(NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S").is_ok());
        assert_eq!(path.parent().unwrap(), Path::new("/tmp/reports"));
    }

    #[test]
    fn test_write_to_missing_directory_errors() {
        // Test: IO failures surface as ReportError::Io
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("report.csv");

        let result = write_report(&[], &path);
        assert!(matches!(result, Err(ReportError::Io(_))));
    }
}
