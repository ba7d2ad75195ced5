//! Feature click → plot resolution.
//!
//! Called once per click on a plottable feature. Point features (those
//! carrying a `ReachID`) are plotted from NWPS; everything else is treated as
//! a lake polygon and plotted from its monthly mean water level CSV.

use serde_json::{Map, Value};

use crate::config::NwpsConfig;
use crate::ingest::nwps::{self, HttpFetch};
use crate::ingest::water_levels::{lake_csv_path, read_monthly_means};
use crate::lakes::canonical_lake_name;
use crate::logging::{self, DataSource};
use crate::model::{
    property_text, FeatureProps, PlotLayout, PlotResponse, PlotSeries, ViewerError,
    PROP_LAKE_NAME, PROP_REACH_ID,
};
use crate::workspace::AppWorkspace;

/// The kind of feature that was clicked, decided from its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureKind {
    /// A reach / gauge point, keyed by its NWPS identifier.
    Reach(String),
    /// A lake polygon, keyed by its canonical water level record name.
    Lake(String),
}

/// Classifies a feature. A `ReachID` key, whatever its value, marks a point.
pub fn classify_feature(props: &FeatureProps) -> Result<FeatureKind, ViewerError> {
    if props.contains_key(PROP_REACH_ID) {
        let reach_id = property_text(props, PROP_REACH_ID)
            .ok_or_else(|| ViewerError::MissingProperty(PROP_REACH_ID.to_string()))?;
        return Ok(FeatureKind::Reach(reach_id));
    }

    let name = property_text(props, PROP_LAKE_NAME)
        .ok_or_else(|| ViewerError::MissingProperty(PROP_LAKE_NAME.to_string()))?;
    Ok(FeatureKind::Lake(canonical_lake_name(&name)))
}

/// Builds the monthly mean water level plot for a canonical lake name.
pub fn lake_plot(workspace: &AppWorkspace, lake_name: &str) -> Result<PlotResponse, ViewerError> {
    let path = lake_csv_path(workspace, lake_name);
    let points = read_monthly_means(&path)?;

    Ok(PlotResponse {
        title: format!("Monthly Mean Water Levels - {}", lake_name),
        series: vec![PlotSeries::lines("Water Levels", &points).with_line(2, "blue")],
        layout: PlotLayout::new("Month", "Water Level (feet)"),
    })
}

/// Resolves clicks into plots.
pub struct FeaturePlotResolver<'a> {
    client: &'a dyn HttpFetch,
    nwps: NwpsConfig,
}

impl<'a> FeaturePlotResolver<'a> {
    pub fn new(client: &'a dyn HttpFetch, nwps: NwpsConfig) -> Self {
        FeaturePlotResolver { client, nwps }
    }

    /// Plot data for a clicked feature.
    ///
    /// `layer_name`, `feature_id` and `layer_data` identify the click for
    /// logging; the plot is decided by `feature_props` alone.
    ///
    /// Returns `Ok(None)` when NWPS has nothing for the reach (any non-200
    /// answer). A lake without a CSV is an error, as are transport failures
    /// and malformed responses.
    pub fn get_plot_for_layer_feature(
        &self,
        layer_name: &str,
        feature_id: &str,
        layer_data: &Map<String, Value>,
        feature_props: &FeatureProps,
        workspace: &AppWorkspace,
    ) -> Result<Option<PlotResponse>, ViewerError> {
        logging::debug(
            DataSource::Map,
            Some(layer_name),
            &format!("plot requested for feature {} ({} layer data keys)", feature_id, layer_data.len()),
        );

        match classify_feature(feature_props)? {
            FeatureKind::Reach(reach_id) => {
                nwps::fetch_reach_plot(self.client, &self.nwps, &reach_id).inspect_err(|e| {
                    logging::log_nwps_failure(&reach_id, "Plot fetch", e);
                })
            }
            FeatureKind::Lake(lake_name) => {
                let plot = lake_plot(workspace, &lake_name).inspect_err(|e| {
                    logging::error(DataSource::Workspace, Some(&lake_name), &e.to_string());
                })?;
                Ok(Some(plot))
            }
        }
    }
}
