/// Data sources behind a feature click.
///
/// Submodules:
/// - `nwps` — NOAA National Water Prediction Service client for the points layer.
/// - `water_levels` — monthly mean water level CSVs for the lake layers.

pub mod nwps;
pub mod water_levels;
