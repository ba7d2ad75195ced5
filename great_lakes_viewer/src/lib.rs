//! Great Lakes viewer backend.
//!
//! Composes the lake and reach layers for the map and answers feature
//! clicks with plot data: monthly mean water levels for lake polygons,
//! NOAA NWPS streamflow or stage hydrographs for reach points.

pub mod config;
pub mod ingest;
pub mod lakes;
pub mod logging;
pub mod map_layout;
pub mod model;
pub mod resolver;
pub mod verify;
pub mod workspace;
