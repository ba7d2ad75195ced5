/// NOAA National Water Prediction Service (NWPS) API client
///
/// Retrieves streamflow forecasts and stage/flow hydrographs for the reaches
/// and gauges on the points layer, and reshapes them into plot series.
///
/// API Documentation: https://api.water.noaa.gov/nwps/v1/docs/
/// Reach streamflow:  /reaches/{reachId}/streamflow?series=short_range
/// Gauge stageflow:   /gauges/{gaugeId}/stageflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::NwpsConfig;
use crate::logging::{self, DataSource};
use crate::model::{PlotLayout, PlotResponse, PlotSeries, TimeSeriesPoint, ViewerError};

/// NWPS marks missing hydrograph values with this number.
pub const NWPS_MISSING_VALUE: f64 = -999.0;

// ============================================================================
// Endpoint selection
// ============================================================================

/// Which NWPS product a point click plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NwpsEndpoint {
    /// National Water Model short range streamflow forecast for a reach.
    #[serde(rename = "short_range")]
    ShortRange,
    /// Observed and forecast stage hydrograph for a gauge.
    #[serde(rename = "stageflow")]
    StageFlow,
}

/// Builds the short range streamflow URL for a reach.
pub fn build_streamflow_url(base_url: &str, reach_id: &str) -> String {
    format!(
        "{}/reaches/{}/streamflow?series=short_range",
        base_url.trim_end_matches('/'),
        reach_id
    )
}

/// Builds the stage/flow hydrograph URL for a gauge.
pub fn build_stageflow_url(base_url: &str, gauge_id: &str) -> String {
    format!("{}/gauges/{}/stageflow", base_url.trim_end_matches('/'), gauge_id)
}

/// URL of the configured endpoint for a reach or gauge.
pub fn endpoint_url(config: &NwpsConfig, id: &str) -> String {
    match config.endpoint {
        NwpsEndpoint::ShortRange => build_streamflow_url(&config.base_url, id),
        NwpsEndpoint::StageFlow => build_stageflow_url(&config.base_url, id),
    }
}

// ============================================================================
// HTTP transport
// ============================================================================

/// Status and body of an HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Blocking GET, abstracted so the resolver can be driven without a network.
pub trait HttpFetch {
    fn fetch(&self, url: &str) -> Result<HttpResponse, ViewerError>;
}

impl HttpFetch for reqwest::blocking::Client {
    fn fetch(&self, url: &str) -> Result<HttpResponse, ViewerError> {
        let response = self
            .get(url)
            .header("Accept", "application/json")
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// NWPS API Response Structures
// ============================================================================

/// `/reaches/{id}/streamflow` response. Only the short range block is read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamflowResponse {
    pub short_range: ShortRangeForecast,
}

#[derive(Debug, Deserialize)]
pub struct ShortRangeForecast {
    pub series: FlowSeries,
}

#[derive(Debug, Deserialize)]
pub struct FlowSeries {
    pub units: String,
    pub data: Vec<FlowPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPoint {
    pub valid_time: String,
    pub flow: f64,
}

/// `/gauges/{id}/stageflow` response.
#[derive(Debug, Deserialize)]
pub struct StageFlowResponse {
    pub observed: Hydrograph,
    /// Absent for gauges that are not forecast points.
    #[serde(default)]
    pub forecast: Option<Hydrograph>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hydrograph {
    pub primary_name: String,
    pub primary_units: String,
    #[serde(default)]
    pub secondary_name: Option<String>,
    #[serde(default)]
    pub secondary_units: Option<String>,
    pub data: Vec<HydrographPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrographPoint {
    pub valid_time: String,
    pub primary: f64,
    #[serde(default)]
    pub secondary: Option<f64>,
}

// ============================================================================
// Parsed series
// ============================================================================

/// Short range streamflow forecast, points as NWPS sent them.
#[derive(Debug, Clone)]
pub struct ForecastSeries {
    pub units: String,
    pub points: Vec<TimeSeriesPoint>,
}

impl ForecastSeries {
    pub fn without_missing(mut self) -> Self {
        self.points = drop_missing(self.points);
        self
    }
}

/// Observed and (optionally) forecast primary values of a gauge hydrograph.
#[derive(Debug, Clone)]
pub struct StageFlowSeries {
    pub primary_name: String,
    pub primary_units: String,
    pub observed: Vec<TimeSeriesPoint>,
    pub forecast: Option<Vec<TimeSeriesPoint>>,
}

impl StageFlowSeries {
    pub fn without_missing(mut self) -> Self {
        self.observed = drop_missing(self.observed);
        self.forecast = self.forecast.map(drop_missing);
        self
    }
}

fn is_missing(value: f64) -> bool {
    value == NWPS_MISSING_VALUE || !value.is_finite()
}

/// Removes points carrying the NWPS missing-value marker.
pub fn drop_missing(points: Vec<TimeSeriesPoint>) -> Vec<TimeSeriesPoint> {
    points.into_iter().filter(|p| !is_missing(p.value)).collect()
}

/// Parses a `/reaches/{id}/streamflow` body.
///
/// # Errors
/// `ViewerError::Parse` if the body is not JSON or lacks
/// `shortRange.series.{units,data}`.
pub fn parse_short_range(body: &str) -> Result<ForecastSeries, ViewerError> {
    let response: StreamflowResponse = serde_json::from_str(body)?;
    let series = response.short_range.series;

    let points = series
        .data
        .into_iter()
        .map(|p| TimeSeriesPoint {
            timestamp: p.valid_time,
            value: p.flow,
        })
        .collect();

    Ok(ForecastSeries {
        units: series.units,
        points,
    })
}

fn hydrograph_points(hydrograph: Hydrograph) -> Vec<TimeSeriesPoint> {
    hydrograph
        .data
        .into_iter()
        .map(|p| TimeSeriesPoint {
            timestamp: p.valid_time,
            value: p.primary,
        })
        .collect()
}

/// Parses a `/gauges/{id}/stageflow` body.
///
/// An absent forecast block yields `forecast: None`; an empty one is kept.
pub fn parse_stageflow(body: &str) -> Result<StageFlowSeries, ViewerError> {
    let response: StageFlowResponse = serde_json::from_str(body)?;

    let primary_name = response.observed.primary_name.clone();
    let primary_units = response.observed.primary_units.clone();
    let observed = hydrograph_points(response.observed);
    let forecast = response.forecast.map(hydrograph_points);

    Ok(StageFlowSeries {
        primary_name,
        primary_units,
        observed,
        forecast,
    })
}

/// Latest parseable `validTime` among the points, if any.
pub fn latest_valid_time(points: &[TimeSeriesPoint]) -> Option<DateTime<Utc>> {
    points
        .iter()
        .filter_map(|p| DateTime::parse_from_rfc3339(&p.timestamp).ok())
        .map(|t| t.with_timezone(&Utc))
        .max()
}

// ============================================================================
// Plot construction
// ============================================================================

pub fn plot_title(reach_id: &str) -> String {
    format!("Data - {}", reach_id)
}

/// Builds the plot for a short range forecast.
pub fn short_range_plot(reach_id: &str, forecast: &ForecastSeries) -> PlotResponse {
    PlotResponse {
        title: plot_title(reach_id),
        series: vec![PlotSeries::lines("Forecast", &forecast.points)],
        layout: PlotLayout::new("Time", &format!("flow ({})", forecast.units)),
    }
}

/// Builds the plot for a stage/flow hydrograph.
pub fn stageflow_plot(gauge_id: &str, hydrograph: &StageFlowSeries) -> PlotResponse {
    let mut series = vec![PlotSeries::lines("Observed", &hydrograph.observed)];
    if let Some(forecast) = &hydrograph.forecast {
        series.push(PlotSeries::lines("Forecast", forecast));
    }

    PlotResponse {
        title: plot_title(gauge_id),
        series,
        layout: PlotLayout::new(
            "Time",
            &format!("{} ({})", hydrograph.primary_name, hydrograph.primary_units),
        ),
    }
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetches and plots NWPS data for a reach or gauge.
///
/// Returns `Ok(None)` when NWPS answers with anything but 200; the status
/// and body are logged. Transport and parse failures propagate. Points are
/// plotted as sent unless `drop_missing_values` is configured.
pub fn fetch_reach_plot(
    client: &dyn HttpFetch,
    config: &NwpsConfig,
    reach_id: &str,
) -> Result<Option<PlotResponse>, ViewerError> {
    let url = endpoint_url(config, reach_id);
    logging::debug(DataSource::Nwps, Some(reach_id), &format!("GET {}", url));

    let response = client.fetch(&url)?;
    if response.status != 200 {
        logging::log_nwps_status(reach_id, response.status, &response.body);
        return Ok(None);
    }

    let plot = match config.endpoint {
        NwpsEndpoint::ShortRange => {
            let mut forecast = parse_short_range(&response.body)?;
            if config.drop_missing_values {
                forecast = forecast.without_missing();
            }
            short_range_plot(reach_id, &forecast)
        }
        NwpsEndpoint::StageFlow => {
            let mut hydrograph = parse_stageflow(&response.body)?;
            if config.drop_missing_values {
                hydrograph = hydrograph.without_missing();
            }
            stageflow_plot(reach_id, &hydrograph)
        }
    };
    Ok(Some(plot))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SHORT_RANGE_BODY: &str = r#"{
        "reach": { "id": "12345", "name": "Maumee River" },
        "shortRange": {
            "series": {
                "referenceTime": "2024-05-01T12:00:00Z",
                "units": "ft³/s",
                "data": [
                    { "validTime": "2024-05-01T13:00:00Z", "flow": 1520.5 },
                    { "validTime": "2024-05-01T14:00:00Z", "flow": -999 },
                    { "validTime": "2024-05-01T15:00:00Z", "flow": 1498.0 }
                ]
            }
        }
    }"#;

    const STAGEFLOW_BODY: &str = r#"{
        "observed": {
            "primaryName": "Stage", "primaryUnits": "ft",
            "secondaryName": "Flow", "secondaryUnits": "kcfs",
            "data": [
                { "validTime": "2024-05-01T10:00:00Z", "generatedTime": "2024-05-01T10:05:00Z", "primary": 6.1, "secondary": 2.3 },
                { "validTime": "2024-05-01T11:00:00Z", "generatedTime": "2024-05-01T11:05:00Z", "primary": 6.3, "secondary": 2.4 }
            ]
        },
        "forecast": {
            "primaryName": "Stage", "primaryUnits": "ft",
            "data": [
                { "validTime": "2024-05-01T18:00:00Z", "primary": 6.8, "secondary": -999 }
            ]
        }
    }"#;

    // --- URL construction ---------------------------------------------------

    #[test]
    fn test_streamflow_url_matches_nwps_layout() {
        assert_eq!(
            build_streamflow_url("https://api.water.noaa.gov/nwps/v1", "12345"),
            "https://api.water.noaa.gov/nwps/v1/reaches/12345/streamflow?series=short_range"
        );
    }

    #[test]
    fn test_stageflow_url_tolerates_trailing_slash() {
        assert_eq!(
            build_stageflow_url("https://api.water.noaa.gov/nwps/v1/", "PEOI2"),
            "https://api.water.noaa.gov/nwps/v1/gauges/PEOI2/stageflow"
        );
    }

    #[test]
    fn test_endpoint_url_follows_configured_endpoint() {
        let mut config = NwpsConfig {
            base_url: "http://nwps.test/v1".to_string(),
            ..NwpsConfig::default()
        };
        assert_eq!(
            endpoint_url(&config, "12345"),
            "http://nwps.test/v1/reaches/12345/streamflow?series=short_range"
        );

        config.endpoint = NwpsEndpoint::StageFlow;
        assert_eq!(endpoint_url(&config, "PEOI2"), "http://nwps.test/v1/gauges/PEOI2/stageflow");
    }

    // --- Parsing ------------------------------------------------------------

    #[test]
    fn test_short_range_keeps_points_as_sent() {
        let forecast = parse_short_range(SHORT_RANGE_BODY).expect("fixture should parse");
        assert_eq!(forecast.units, "ft³/s");
        let values: Vec<f64> = forecast.points.iter().map(|p| p.value).collect();
        assert_eq!(values, [1520.5, NWPS_MISSING_VALUE, 1498.0]);
        assert_eq!(forecast.points[1].timestamp, "2024-05-01T14:00:00Z");
    }

    #[test]
    fn test_short_range_without_missing_drops_sentinel() {
        let forecast = parse_short_range(SHORT_RANGE_BODY).unwrap().without_missing();
        let times: Vec<_> = forecast.points.iter().map(|p| p.timestamp.as_str()).collect();
        assert_eq!(times, ["2024-05-01T13:00:00Z", "2024-05-01T15:00:00Z"]);
    }

    #[test]
    fn test_all_missing_series_still_plots_every_point() {
        let body = r#"{ "shortRange": { "series": { "units": "ft³/s", "data": [
            { "validTime": "2024-05-01T13:00:00Z", "flow": -999 },
            { "validTime": "2024-05-01T14:00:00Z", "flow": -999 }
        ] } } }"#;
        let plot = short_range_plot("12345", &parse_short_range(body).unwrap());
        assert_eq!(plot.series[0].len(), 2);
        assert_eq!(plot.series[0].y, [NWPS_MISSING_VALUE, NWPS_MISSING_VALUE]);
    }

    #[test]
    fn test_short_range_missing_block_is_parse_error() {
        let err = parse_short_range(r#"{ "reach": { "id": "12345" } }"#).unwrap_err();
        assert!(matches!(err, ViewerError::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_short_range_malformed_json_is_parse_error() {
        assert!(matches!(parse_short_range("<html>"), Err(ViewerError::Parse(_))));
    }

    #[test]
    fn test_stageflow_reads_observed_and_forecast() {
        let hydrograph = parse_stageflow(STAGEFLOW_BODY).expect("fixture should parse");
        assert_eq!(hydrograph.primary_name, "Stage");
        assert_eq!(hydrograph.primary_units, "ft");
        assert_eq!(hydrograph.observed.len(), 2);
        assert_eq!(hydrograph.forecast.as_ref().map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_stageflow_empty_forecast_block_is_kept() {
        let body = r#"{
            "observed": { "primaryName": "Stage", "primaryUnits": "ft",
                "data": [ { "validTime": "2024-05-01T10:00:00Z", "primary": -999 } ] },
            "forecast": { "primaryName": "Stage", "primaryUnits": "ft", "data": [] }
        }"#;
        let hydrograph = parse_stageflow(body).unwrap();
        assert_eq!(hydrograph.observed[0].value, NWPS_MISSING_VALUE);
        assert_eq!(hydrograph.forecast.as_ref().map(|f| f.len()), Some(0));

        let plot = stageflow_plot("PEOI2", &hydrograph);
        let names: Vec<_> = plot.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Observed", "Forecast"]);
    }

    #[test]
    fn test_stageflow_without_forecast_block() {
        let body = r#"{ "observed": { "primaryName": "Stage", "primaryUnits": "ft", "data": [] } }"#;
        let hydrograph = parse_stageflow(body).expect("forecast block is optional");
        assert!(hydrograph.forecast.is_none());

        let plot = stageflow_plot("PEOI2", &hydrograph);
        assert_eq!(plot.series.len(), 1);
        assert_eq!(plot.series[0].name, "Observed");
    }

    // --- Plots --------------------------------------------------------------

    #[test]
    fn test_short_range_plot_shape() {
        let forecast = parse_short_range(SHORT_RANGE_BODY).unwrap();
        let plot = short_range_plot("12345", &forecast);

        assert_eq!(plot.title, "Data - 12345");
        assert_eq!(plot.series.len(), 1);
        assert_eq!(plot.series[0].name, "Forecast");
        assert_eq!(plot.series[0].mode, "lines");
        assert_eq!(plot.series[0].x.len(), plot.series[0].y.len());
        assert_eq!(plot.layout.yaxis.title, "flow (ft³/s)");
        assert_eq!(plot.layout.xaxis.title, "Time");
    }

    #[test]
    fn test_stageflow_plot_axis_from_primary() {
        let plot = stageflow_plot("PEOI2", &parse_stageflow(STAGEFLOW_BODY).unwrap());
        let names: Vec<_> = plot.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Observed", "Forecast"]);
        assert_eq!(plot.layout.yaxis.title, "Stage (ft)");
    }

    #[test]
    fn test_latest_valid_time() {
        let forecast = parse_short_range(SHORT_RANGE_BODY).unwrap();
        assert_eq!(
            latest_valid_time(&forecast.points),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap())
        );
        assert_eq!(latest_valid_time(&[]), None);
    }
}
