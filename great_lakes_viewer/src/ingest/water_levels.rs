//! Monthly mean water level CSVs.
//!
//! One file per lake under the workspace `data/` directory, named after the
//! lake's canonical name (`Lake Michigan-Huron.csv`). Each row is one month:
//!
//! ```text
//! Month,Water Level (ft)
//! Jan,579.53
//! Feb,579.46
//! ```
//!
//! The value column is whatever comes second; its header is not checked.
//! A blank value is a gap in the record and reads as NaN, which serializes
//! to `null` so the plot breaks the line there.

use csv::ReaderBuilder;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::model::{TimeSeriesPoint, ViewerError};
use crate::workspace::AppWorkspace;

/// Header of the month column.
pub const MONTH_COLUMN: &str = "Month";

/// Index of the value column.
pub const VALUE_COLUMN_INDEX: usize = 1;

/// Path of the CSV for a canonical lake name.
pub fn lake_csv_path(workspace: &AppWorkspace, lake_name: &str) -> PathBuf {
    workspace.data_dir().join(format!("{}.csv", lake_name))
}

/// Reads a lake's monthly means, in file order.
///
/// # Errors
/// - `ViewerError::DataFileNotFound` if the file does not exist.
/// - `ViewerError::Io` for other read failures.
/// - `ViewerError::Csv` if the header lacks `Month`, a row is short, or a
///   non-blank value is not a number.
pub fn read_monthly_means(path: &Path) -> Result<Vec<TimeSeriesPoint>, ViewerError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ViewerError::DataFileNotFound(path.to_path_buf()),
        _ => ViewerError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    parse_monthly_means(file)
        .map_err(|e| match e {
            ViewerError::Csv(msg) => ViewerError::Csv(format!("{}: {}", path.display(), msg)),
            other => other,
        })
}

/// Parses monthly means from any CSV source.
pub fn parse_monthly_means<R: Read>(source: R) -> Result<Vec<TimeSeriesPoint>, ViewerError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = rdr.headers()?.clone();
    let month_index = headers
        .iter()
        .position(|h| h == MONTH_COLUMN)
        .ok_or_else(|| ViewerError::Csv(format!("no '{}' column in header", MONTH_COLUMN)))?;
    if headers.len() <= VALUE_COLUMN_INDEX {
        return Err(ViewerError::Csv(format!(
            "expected at least {} columns, header has {}",
            VALUE_COLUMN_INDEX + 1,
            headers.len()
        )));
    }

    let mut points = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Data rows start on line 2
        let line = i + 2;

        let month = record
            .get(month_index)
            .ok_or_else(|| ViewerError::Csv(format!("line {}: missing month", line)))?;
        let raw = record
            .get(VALUE_COLUMN_INDEX)
            .ok_or_else(|| ViewerError::Csv(format!("line {}: missing value", line)))?;
        let value: f64 = if raw.is_empty() {
            f64::NAN
        } else {
            raw.parse()
                .map_err(|_| ViewerError::Csv(format!("line {}: '{}' is not a number", line, raw)))?
        };

        points.push(TimeSeriesPoint {
            timestamp: month.to_string(),
            value,
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reads_rows_in_file_order() {
        let csv = "Month,Water Level (ft)\nJan,571.20\nFeb,571.15\nMar, 571.31 \n";
        let points = parse_monthly_means(csv.as_bytes()).expect("valid CSV");

        let months: Vec<_> = points.iter().map(|p| p.timestamp.as_str()).collect();
        assert_eq!(months, ["Jan", "Feb", "Mar"]);
        assert!((points[2].value - 571.31).abs() < 1e-9);
    }

    #[test]
    fn test_value_is_second_column_even_when_month_is_not_first() {
        let csv = "Year,Level,Month\n2023,183.4,January\n";
        let points = parse_monthly_means(csv.as_bytes()).unwrap();
        assert_eq!(points[0].timestamp, "January");
        assert_eq!(points[0].value, 183.4);
    }

    #[test]
    fn test_missing_month_column_is_rejected() {
        let err = parse_monthly_means("Date,Level\nJan,1.0\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Month"), "got {}", err);
    }

    #[test]
    fn test_non_numeric_value_names_the_line() {
        let err = parse_monthly_means("Month,Level\nJan,1.0\nFeb,n/a\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "got {}", err);
    }

    #[test]
    fn test_blank_value_is_a_gap() {
        let csv = "Month,Level\nJan,571.2\nFeb,\nMar,571.4\n";
        let points = parse_monthly_means(csv.as_bytes()).expect("blank cell is allowed");

        assert_eq!(points.len(), 3);
        assert_eq!(points[1].timestamp, "Feb");
        assert!(points[1].value.is_nan());

        let y: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(serde_json::to_string(&y).unwrap(), "[571.2,null,571.4]");
    }

    #[test]
    fn test_header_only_file_is_empty_series() {
        let points = parse_monthly_means("Month,Level\n".as_bytes()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_missing_file_is_data_file_not_found() {
        let dir = TempDir::new().unwrap();
        let ws = AppWorkspace::new(dir.path());
        let path = lake_csv_path(&ws, "Lake Erie");

        match read_monthly_means(&path) {
            Err(ViewerError::DataFileNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected DataFileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_reads_file_from_workspace() {
        let dir = TempDir::new().unwrap();
        let ws = AppWorkspace::new(dir.path());
        fs::create_dir_all(ws.data_dir()).unwrap();
        let path = lake_csv_path(&ws, "Lake St.Clair");
        fs::write(&path, "Month,Level\nJan,574.9\n").unwrap();

        assert!(path.ends_with("data/Lake St.Clair.csv"));
        assert_eq!(read_monthly_means(&path).unwrap().len(), 1);
    }
}
