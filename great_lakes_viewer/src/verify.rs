//! Data Source Verification Module
//!
//! Checks the workspace files behind every layer, and optionally queries
//! NWPS for every reach on the points layer, to find out which features
//! will actually produce a plot when clicked.
//!
//! Run this after updating the workspace or changing the NWPS endpoint.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{NwpsConfig, ViewerConfig};
use crate::ingest::nwps::{self, HttpFetch};
use crate::ingest::water_levels::{lake_csv_path, read_monthly_means};
use crate::lakes::{Lake, LAKE_REGISTRY};
use crate::logging::{self, DataSource};
use crate::map_layout::{feature_count, load_geojson, reach_ids, POINTS_GEOJSON_FILE};
use crate::model::ViewerError;
use crate::workspace::AppWorkspace;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub lake_results: Vec<LakeVerification>,
    pub points: PointsVerification,
    pub reach_results: Vec<ReachVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub lakes_total: usize,
    pub lakes_working: usize,
    pub lakes_failed: usize,
    pub reaches_total: usize,
    pub reaches_working: usize,
    pub reaches_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LakeVerification {
    pub layer_name: String,
    pub data_name: String,
    pub status: VerificationStatus,
    pub geojson_found: bool,
    pub feature_count: usize,
    pub csv_found: bool,
    pub month_count: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsVerification {
    pub status: VerificationStatus,
    pub feature_count: usize,
    pub reach_ids: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachVerification {
    pub reach_id: String,
    pub status: VerificationStatus,
    pub api_responsive: bool,
    pub http_status: Option<u16>,
    pub sample_data_count: usize,
    pub latest_valid_time: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Lake Verification
// ============================================================================

pub fn verify_lake(workspace: &AppWorkspace, lake: &Lake) -> LakeVerification {
    let mut result = LakeVerification {
        layer_name: lake.layer_name.to_string(),
        data_name: lake.data_name.to_string(),
        status: VerificationStatus::Failed,
        geojson_found: false,
        feature_count: 0,
        csv_found: false,
        month_count: 0,
        error_message: None,
    };

    // Test 1: polygon layer loads
    match load_geojson(&workspace.geojson_dir().join(lake.geojson_file)) {
        Ok(geojson) => {
            result.geojson_found = true;
            result.feature_count = feature_count(&geojson);
        }
        Err(e) => result.error_message = Some(e.to_string()),
    }

    // Test 2: clicks resolve to a readable CSV
    match read_monthly_means(&lake_csv_path(workspace, lake.data_name)) {
        Ok(points) => {
            result.csv_found = true;
            result.month_count = points.len();
        }
        Err(e) => {
            if let ViewerError::Csv(_) = e {
                result.csv_found = true;
            }
            let msg = e.to_string();
            result.error_message = Some(match result.error_message.take() {
                Some(prev) => format!("{}; {}", prev, msg),
                None => msg,
            });
        }
    }

    if result.geojson_found && result.month_count > 0 {
        result.status = VerificationStatus::Success;
    } else if result.geojson_found || result.month_count > 0 {
        result.status = VerificationStatus::PartialSuccess;
    }

    result
}

// ============================================================================
// Points Verification
// ============================================================================

pub fn verify_points(workspace: &AppWorkspace) -> PointsVerification {
    match load_geojson(&workspace.geojson_dir().join(POINTS_GEOJSON_FILE)) {
        Ok(geojson) => {
            let ids = reach_ids(&geojson);
            let count = feature_count(&geojson);
            let status = if count > 0 && ids.len() == count {
                VerificationStatus::Success
            } else if !ids.is_empty() {
                VerificationStatus::PartialSuccess
            } else {
                VerificationStatus::Failed
            };
            let error_message = (ids.len() < count)
                .then(|| format!("{} of {} points have no ReachID", count - ids.len(), count));
            PointsVerification {
                status,
                feature_count: count,
                reach_ids: ids,
                error_message,
            }
        }
        Err(e) => PointsVerification {
            status: VerificationStatus::Failed,
            feature_count: 0,
            reach_ids: Vec::new(),
            error_message: Some(e.to_string()),
        },
    }
}

// ============================================================================
// Reach Verification
// ============================================================================

pub fn verify_reach(client: &dyn HttpFetch, config: &NwpsConfig, reach_id: &str) -> ReachVerification {
    let mut result = ReachVerification {
        reach_id: reach_id.to_string(),
        status: VerificationStatus::Failed,
        api_responsive: false,
        http_status: None,
        sample_data_count: 0,
        latest_valid_time: None,
        error_message: None,
    };

    let url = nwps::endpoint_url(config, reach_id);

    let response = match client.fetch(&url) {
        Ok(response) => response,
        Err(e) => {
            result.error_message = Some(e.to_string());
            return result;
        }
    };
    result.api_responsive = true;
    result.http_status = Some(response.status);

    if response.status != 200 {
        result.error_message = Some(format!("HTTP {}", response.status));
        return result;
    }

    let points = match config.endpoint {
        nwps::NwpsEndpoint::ShortRange => nwps::parse_short_range(&response.body).map(|f| f.points),
        nwps::NwpsEndpoint::StageFlow => nwps::parse_stageflow(&response.body).map(|h| {
            let mut points = h.observed;
            points.extend(h.forecast.unwrap_or_default());
            points
        }),
    };

    match points {
        Ok(points) => {
            result.sample_data_count = points.len();
            result.latest_valid_time = nwps::latest_valid_time(&points).map(|t| t.to_rfc3339());
            result.status = if points.is_empty() {
                VerificationStatus::PartialSuccess
            } else {
                VerificationStatus::Success
            };
        }
        Err(e) => result.error_message = Some(e.to_string()),
    }

    result
}

// ============================================================================
// Full Verification
// ============================================================================

/// Verifies every lake, the points layer, and (with `check_reaches`) every
/// reach on it against the live API.
pub fn run_verification(config: &ViewerConfig, check_reaches: bool) -> Result<VerificationReport, ViewerError> {
    let workspace = config.app_workspace();
    let mut summary = VerificationSummary::default();

    let mut lake_results = Vec::with_capacity(LAKE_REGISTRY.len());
    for lake in LAKE_REGISTRY {
        let result = verify_lake(&workspace, lake);
        match result.status {
            VerificationStatus::Success => summary.lakes_working += 1,
            _ => {
                logging::warn(
                    DataSource::Workspace,
                    Some(lake.layer_name),
                    result.error_message.as_deref().unwrap_or("incomplete"),
                );
                summary.lakes_failed += 1;
            }
        }
        lake_results.push(result);
    }
    summary.lakes_total = lake_results.len();
    logging::log_verification_summary(
        DataSource::Workspace,
        summary.lakes_total,
        summary.lakes_working,
        summary.lakes_failed,
    );

    let points = verify_points(&workspace);

    let mut reach_results = Vec::new();
    if check_reaches {
        let client = config.http_client()?;
        for reach_id in &points.reach_ids {
            let result = verify_reach(&client, &config.nwps, reach_id);
            match result.status {
                VerificationStatus::Success | VerificationStatus::PartialSuccess => {
                    summary.reaches_working += 1
                }
                VerificationStatus::Failed => summary.reaches_failed += 1,
            }
            reach_results.push(result);
        }
        summary.reaches_total = reach_results.len();
        logging::log_verification_summary(
            DataSource::Nwps,
            summary.reaches_total,
            summary.reaches_working,
            summary.reaches_failed,
        );
    }

    Ok(VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        lake_results,
        points,
        reach_results,
        summary,
    })
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("VERIFICATION SUMMARY  ({})", report.timestamp);
    println!("═══════════════════════════════════════════════════════════");
    println!();
    for lake in &report.lake_results {
        let mark = match lake.status {
            VerificationStatus::Success => "✓",
            VerificationStatus::PartialSuccess => "⚠",
            VerificationStatus::Failed => "✗",
        };
        println!(
            "  {} {:<14} {:>3} features, {:>3} months",
            mark, lake.layer_name, lake.feature_count, lake.month_count
        );
    }
    println!();
    println!(
        "Lakes:    {}/{} working  ({} failed)",
        report.summary.lakes_working, report.summary.lakes_total, report.summary.lakes_failed
    );
    println!(
        "Points:   {} features, {} with ReachID",
        report.points.feature_count,
        report.points.reach_ids.len()
    );
    if report.summary.reaches_total > 0 {
        println!(
            "Reaches:  {}/{} working  ({} failed)",
            report.summary.reaches_working, report.summary.reaches_total, report.summary.reaches_failed
        );
    }
    println!("═══════════════════════════════════════════════════════════");
}
