//! Map view settings and layer composition.
//!
//! Loads the lake polygons and the reach points from the workspace GeoJSON
//! files and arranges them into the layer groups shown in the map's layer
//! control. Rendering and styling are done client-side; this module only
//! produces the declarative description.

use geojson::GeoJson;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::config::ViewerConfig;
use crate::lakes::{LAKE_EXCLUDED_PROPERTIES, LAKE_REGISTRY};
use crate::logging::{self, DataSource};
use crate::model::{property_text, FeatureProps, ViewerError, PROP_REACH_ID};
use crate::workspace::AppWorkspace;

/// GeoJSON file holding the reach points.
pub const POINTS_GEOJSON_FILE: &str = "NewPoints.geojson";
pub const POINTS_LAYER_NAME: &str = "Points";

pub const LAKES_GROUP_ID: &str = "lakes";
pub const POINTS_GROUP_ID: &str = "points";

/// Map-wide settings handed to the client.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub title: String,
    pub basemaps: Vec<String>,
    pub default_extent: [f64; 4],
    pub show_properties_popup: bool,
    pub plot_slide_sheet: bool,
}

impl MapView {
    pub fn from_config(config: &ViewerConfig) -> Self {
        MapView {
            title: config.app.map_title.clone(),
            basemaps: config.map.basemaps.clone(),
            default_extent: config.map.default_extent,
            show_properties_popup: config.map.show_properties_popup,
            plot_slide_sheet: config.map.plot_slide_sheet,
        }
    }
}

/// A GeoJSON-backed layer.
#[derive(Debug, Clone, Serialize)]
pub struct MapLayer {
    pub name: String,
    pub title: String,
    pub variable: String,
    pub visible: bool,
    pub selectable: bool,
    pub plottable: bool,
    pub excluded_properties: Vec<String>,
    pub geojson: GeoJson,
}

impl MapLayer {
    /// A visible, selectable, plottable layer.
    pub fn new(name: &str, variable: &str, geojson: GeoJson) -> Self {
        MapLayer {
            name: name.to_string(),
            title: name.to_string(),
            variable: variable.to_string(),
            visible: true,
            selectable: true,
            plottable: true,
            excluded_properties: Vec::new(),
            geojson,
        }
    }

    pub fn excluding(mut self, properties: &[&str]) -> Self {
        self.excluded_properties = properties.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Feature properties as shown in the popup: everything except the
    /// layer's excluded properties.
    pub fn popup_properties(&self, props: &FeatureProps) -> FeatureProps {
        props
            .iter()
            .filter(|(key, _)| !self.excluded_properties.iter().any(|e| e == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn feature_count(&self) -> usize {
        feature_count(&self.geojson)
    }
}

/// A named set of layers in the layer control.
#[derive(Debug, Clone, Serialize)]
pub struct LayerGroup {
    pub id: String,
    pub display_name: String,
    pub layer_control: String,
    pub layers: Vec<MapLayer>,
}

impl LayerGroup {
    /// A group whose layers toggle independently.
    pub fn checkbox(id: &str, display_name: &str, layers: Vec<MapLayer>) -> Self {
        LayerGroup {
            id: id.to_string(),
            display_name: display_name.to_string(),
            layer_control: "checkbox".to_string(),
            layers,
        }
    }
}

// ---------------------------------------------------------------------------
// GeoJSON helpers
// ---------------------------------------------------------------------------

/// Reads and parses a GeoJSON file.
pub fn load_geojson(path: &Path) -> Result<GeoJson, ViewerError> {
    let contents = fs::read_to_string(path).map_err(|e| ViewerError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    contents
        .parse::<GeoJson>()
        .map_err(|e| ViewerError::Parse(format!("{}: {}", path.display(), e)))
}

pub fn feature_count(geojson: &GeoJson) -> usize {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.len(),
        GeoJson::Feature(_) => 1,
        GeoJson::Geometry(_) => 0,
    }
}

/// `ReachID` of every feature that has one, in file order.
pub fn reach_ids(geojson: &GeoJson) -> Vec<String> {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter().collect::<Vec<_>>(),
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => Vec::new(),
    };

    features
        .into_iter()
        .filter_map(|f| f.properties.as_ref())
        .filter_map(|props| property_text(props, PROP_REACH_ID))
        .collect()
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Builds the lake and point layer groups from the workspace.
///
/// # Errors
/// Any missing or unparseable GeoJSON file fails the whole composition.
pub fn compose_layers(workspace: &AppWorkspace) -> Result<Vec<LayerGroup>, ViewerError> {
    let geojson_dir = workspace.geojson_dir();

    let mut lake_layers = Vec::with_capacity(LAKE_REGISTRY.len());
    for lake in LAKE_REGISTRY {
        let geojson = load_geojson(&geojson_dir.join(lake.geojson_file))?;
        let layer = MapLayer::new(lake.layer_name, lake.key, geojson).excluding(LAKE_EXCLUDED_PROPERTIES);
        logging::debug(
            DataSource::Map,
            Some(lake.layer_name),
            &format!("loaded {} features", layer.feature_count()),
        );
        lake_layers.push(layer);
    }

    let points = load_geojson(&geojson_dir.join(POINTS_GEOJSON_FILE))?;
    let points_layer = MapLayer::new(POINTS_LAYER_NAME, "point", points);
    logging::debug(
        DataSource::Map,
        Some(POINTS_LAYER_NAME),
        &format!("loaded {} features", points_layer.feature_count()),
    );

    Ok(vec![
        LayerGroup::checkbox(LAKES_GROUP_ID, "Great Lakes", lake_layers),
        LayerGroup::checkbox(POINTS_GROUP_ID, "20 Points", vec![points_layer]),
    ])
}

/// Finds a layer by name across groups.
pub fn find_layer<'a>(groups: &'a [LayerGroup], name: &str) -> Option<&'a MapLayer> {
    groups
        .iter()
        .flat_map(|g| g.layers.iter())
        .find(|l| l.name == name)
}

/// OpenLayers style overrides by geometry type. Points are drawn as white
/// circles with a red outline; polygons keep the client default.
pub fn vector_style_map() -> Value {
    json!({
        "Point": {"ol.style.Style": {
            "image": {"ol.style.Circle": {
                "radius": 5,
                "fill": {"ol.style.Fill": {
                    "color": "white"
                }},
                "stroke": {"ol.style.Stroke": {
                    "color": "red",
                    "width": 3
                }}
            }}
        }}
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LAKE_GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": { "type": "Polygon", "coordinates": [[[-83.0, 42.0], [-82.0, 42.0], [-82.0, 43.0], [-83.0, 42.0]]] },
            "properties": { "NAMEEN": "Lake Erie", "NAMEFR": "Lac Érié", "UIDENT": 7, "AREA": 25700 }
        }]
    }"#;

    const POINTS_GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-83.5, 41.6] }, "properties": { "ReachID": 12345 } },
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-82.9, 42.3] }, "properties": { "ReachID": "67890" } },
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-82.1, 42.9] }, "properties": {} }
        ]
    }"#;

    fn workspace_with_layers() -> (AppWorkspace, TempDir) {
        let dir = TempDir::new().unwrap();
        let ws = AppWorkspace::new(dir.path());
        fs::create_dir_all(ws.geojson_dir()).unwrap();
        for lake in LAKE_REGISTRY {
            fs::write(ws.geojson_dir().join(lake.geojson_file), LAKE_GEOJSON).unwrap();
        }
        fs::write(ws.geojson_dir().join(POINTS_GEOJSON_FILE), POINTS_GEOJSON).unwrap();
        (ws, dir)
    }

    #[test]
    fn test_compose_layers_builds_two_groups() {
        let (ws, _dir) = workspace_with_layers();
        let groups = compose_layers(&ws).expect("all files present");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, "lakes");
        assert_eq!(groups[0].display_name, "Great Lakes");
        assert_eq!(groups[0].layers.len(), 6);
        assert_eq!(groups[1].id, "points");
        assert_eq!(groups[1].display_name, "20 Points");
        assert_eq!(groups[1].layers.len(), 1);
        assert!(groups.iter().all(|g| g.layer_control == "checkbox"));
    }

    #[test]
    fn test_lake_layers_exclude_identifier_properties() {
        let (ws, _dir) = workspace_with_layers();
        let groups = compose_layers(&ws).unwrap();
        let erie = find_layer(&groups, "Lake Erie").expect("Lake Erie layer");

        assert_eq!(erie.variable, "Erie");
        assert!(erie.visible && erie.selectable && erie.plottable);
        assert!(erie.excluded_properties.iter().any(|p| p == "NAMEEN"));

        let props = match &erie.geojson {
            GeoJson::FeatureCollection(fc) => fc.features[0].properties.clone().unwrap(),
            _ => panic!("expected a feature collection"),
        };
        let popup = erie.popup_properties(&props);
        let keys: Vec<_> = popup.keys().map(String::as_str).collect();
        assert_eq!(keys, ["AREA"]);
    }

    #[test]
    fn test_points_layer_keeps_all_properties() {
        let (ws, _dir) = workspace_with_layers();
        let groups = compose_layers(&ws).unwrap();
        let points = find_layer(&groups, POINTS_LAYER_NAME).unwrap();

        assert_eq!(points.variable, "point");
        assert!(points.excluded_properties.is_empty());
        assert_eq!(points.feature_count(), 3);
        assert_eq!(reach_ids(&points.geojson), ["12345", "67890"]);
    }

    #[test]
    fn test_missing_geojson_fails_composition() {
        let (ws, _dir) = workspace_with_layers();
        fs::remove_file(ws.geojson_dir().join("LakeHuron.geojson")).unwrap();

        match compose_layers(&ws) {
            Err(ViewerError::Io { path, .. }) => assert!(path.ends_with("LakeHuron.geojson")),
            other => panic!("expected Io error, got {:?}", other.map(|g| g.len())),
        }
    }

    #[test]
    fn test_invalid_geojson_is_parse_error() {
        let (ws, _dir) = workspace_with_layers();
        fs::write(ws.geojson_dir().join(POINTS_GEOJSON_FILE), "{ \"type\": \"Nope\" }").unwrap();
        assert!(matches!(compose_layers(&ws), Err(ViewerError::Parse(_))));
    }

    #[test]
    fn test_vector_style_draws_points_as_red_circles() {
        let style = vector_style_map();
        let circle = &style["Point"]["ol.style.Style"]["image"]["ol.style.Circle"];
        assert_eq!(circle["radius"], 5);
        assert_eq!(circle["fill"]["ol.style.Fill"]["color"], "white");
        assert_eq!(circle["stroke"]["ol.style.Stroke"]["color"], "red");
        assert_eq!(circle["stroke"]["ol.style.Stroke"]["width"], 3);
    }

    #[test]
    fn test_map_view_from_default_config() {
        let view = MapView::from_config(&ViewerConfig::default());
        assert_eq!(view.title, "Great Lakes Viewer");
        assert_eq!(view.basemaps, vec!["OpenStreetMap", "ESRI"]);
        assert_eq!(view.default_extent[0], -95.48678973290308);
    }
}
