/// Structured logging for the Great Lakes viewer
///
/// Provides context-rich logging tagged with the data source and, where one
/// applies, the reach or lake a message is about. Supports console output and
/// file-based logging for long-running deployments.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// NOAA National Water Prediction Service
    Nwps,
    /// Files in the app workspace (CSV, GeoJSON)
    Workspace,
    /// Map composition
    Map,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Nwps => write!(f, "NWPS"),
            DataSource::Workspace => write!(f, "WORKSPACE"),
            DataSource::Map => write!(f, "MAP"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the reach simply has no data for the requested series
    Expected,
    /// Unexpected failure - service degradation or a change in the API
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, source: &DataSource, subject: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, source, subject_part, message)
    }

    fn log(&self, level: LogLevel, source: &DataSource, subject: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, source, subject, message);
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output goes to stderr; stdout is reserved for CLI JSON output
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, subject_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, subject_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}{}: {}", source, subject_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, source: DataSource, subject: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &source, subject, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: DataSource, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, source, subject, message);
}

/// Log a warning message
pub fn warn(source: DataSource, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, source, subject, message);
}

/// Log an error message
pub fn error(source: DataSource, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, source, subject, message);
}

/// Log a debug message
pub fn debug(source: DataSource, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, source, subject, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a non-success NWPS HTTP status.
///
/// NWPS answers 404 for reaches without the requested series (many points
/// on the map are not forecast points), so that case is expected.
pub fn classify_nwps_status(status: u16) -> FailureType {
    match status {
        404 => FailureType::Expected,
        500..=599 => FailureType::Unexpected,
        _ => FailureType::Unknown,
    }
}

/// Classify an NWPS failure that happened before or after the HTTP exchange.
pub fn classify_nwps_error(error_message: &str) -> FailureType {
    if error_message.contains("Request failed") || error_message.contains("timed out") {
        FailureType::Unexpected
    } else if error_message.contains("Parse error") {
        // Parse errors suggest API changes
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a non-success NWPS response with its body, classified by status.
pub fn log_nwps_status(reach_id: &str, status: u16, body: &str) {
    let failure_type = classify_nwps_status(status);
    let message = format!(
        "Request failed [{}] with status code {}: {}",
        failure_type,
        status,
        body.trim()
    );

    match failure_type {
        FailureType::Expected | FailureType::Unknown => warn(DataSource::Nwps, Some(reach_id), &message),
        FailureType::Unexpected => error(DataSource::Nwps, Some(reach_id), &message),
    }
}

/// Log an NWPS failure with automatic classification
pub fn log_nwps_failure(reach_id: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_nwps_error(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(DataSource::Nwps, Some(reach_id), &message),
        FailureType::Unexpected => error(DataSource::Nwps, Some(reach_id), &message),
        FailureType::Unknown => warn(DataSource::Nwps, Some(reach_id), &message),
    }
}

// ---------------------------------------------------------------------------
// Verification Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a verification pass over one data source
pub fn log_verification_summary(source: DataSource, total: usize, working: usize, failed: usize) {
    let message = format!(
        "Verification complete: {}/{} working, {} failed",
        working, total, failed
    );

    if failed == 0 {
        info(source, None, &message);
    } else if working == 0 {
        error(source, None, &message);
    } else {
        warn(source, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_nwps_status(404), FailureType::Expected);
        assert_eq!(classify_nwps_status(503), FailureType::Unexpected);
        assert_eq!(classify_nwps_status(400), FailureType::Unknown);
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            classify_nwps_error("Request failed: error sending request"),
            FailureType::Unexpected
        );
        assert_eq!(
            classify_nwps_error("Parse error: missing field `shortRange`"),
            FailureType::Unexpected
        );
        assert_eq!(classify_nwps_error("something else"), FailureType::Unknown);
    }

    #[test]
    fn test_entry_format_includes_source_and_subject() {
        let entry = Logger::format_entry(LogLevel::Warning, &DataSource::Nwps, Some("12345"), "boom");
        assert!(entry.ends_with("WARN NWPS [12345]: boom"), "got {}", entry);

        let entry = Logger::format_entry(LogLevel::Info, &DataSource::Map, None, "ok");
        assert!(entry.ends_with("INFO MAP: ok"), "got {}", entry);
    }

    #[test]
    fn test_file_output_appends_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("viewer.log");
        let path_str = path.to_str().unwrap();

        Logger::append_to_file(path_str, "first").unwrap();
        Logger::append_to_file(path_str, "second").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
