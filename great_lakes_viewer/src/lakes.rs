/// Lake registry for the Great Lakes viewer.
///
/// Defines the polygon layers composed onto the map and the rule that maps
/// a clicked lake's English name onto the name of its water level data file.
/// All other modules should reference lakes from here rather than hardcoding
/// layer names or file names.

// ---------------------------------------------------------------------------
// Lake metadata
// ---------------------------------------------------------------------------

/// Metadata for one lake polygon layer.
pub struct Lake {
    /// Short key used in file and layer names, e.g. `"StClair"`.
    pub key: &'static str,
    /// Layer name and title on the map, e.g. `"Lake StClair"`.
    pub layer_name: &'static str,
    /// GeoJSON file under the workspace `geojson/` directory.
    pub geojson_file: &'static str,
    /// Name of the water level CSV (without extension) the lake's features
    /// resolve to. Michigan and Huron share one hydrological record.
    pub data_name: &'static str,
}

/// The lake polygon layers, west to east.
pub static LAKE_REGISTRY: &[Lake] = &[
    Lake {
        key: "Superior",
        layer_name: "Lake Superior",
        geojson_file: "LakeSuperior.geojson",
        data_name: "Lake Superior",
    },
    Lake {
        key: "Michigan",
        layer_name: "Lake Michigan",
        geojson_file: "LakeMichigan.geojson",
        data_name: "Lake Michigan-Huron",
    },
    Lake {
        key: "Huron",
        layer_name: "Lake Huron",
        geojson_file: "LakeHuron.geojson",
        data_name: "Lake Michigan-Huron",
    },
    Lake {
        key: "StClair",
        layer_name: "Lake StClair",
        geojson_file: "LakeStClair.geojson",
        data_name: "Lake St.Clair",
    },
    Lake {
        key: "Erie",
        layer_name: "Lake Erie",
        geojson_file: "LakeErie.geojson",
        data_name: "Lake Erie",
    },
    Lake {
        key: "Ontario",
        layer_name: "Lake Ontario",
        geojson_file: "LakeOntario.geojson",
        data_name: "Lake Ontario",
    },
];

/// Properties hidden from the feature popup on lake layers. These are
/// identifiers and translations carried by the source shapefiles.
pub const LAKE_EXCLUDED_PROPERTIES: &[&str] =
    &["HYDRO_P_", "UIDENT", "NAMESP", "NAMEFR", "TYPE", "NAMEEN"];

/// Combined water level record name for Lakes Michigan and Huron.
pub const MICHIGAN_HURON: &str = "Lake Michigan-Huron";

/// Water level record name for Lake St. Clair.
pub const ST_CLAIR: &str = "Lake St.Clair";

// ---------------------------------------------------------------------------
// Name canonicalization
// ---------------------------------------------------------------------------

/// Maps a feature's `NAMEEN` value onto the name of its water level record.
///
/// Any name mentioning Michigan or Huron resolves to the combined
/// Michigan-Huron record; otherwise any name mentioning Clair resolves to
/// Lake St.Clair. Everything else is returned unchanged.
pub fn canonical_lake_name(name: &str) -> String {
    if name.contains("Michigan") || name.contains("Huron") {
        MICHIGAN_HURON.to_string()
    } else if name.contains("Clair") {
        ST_CLAIR.to_string()
    } else {
        name.to_string()
    }
}

/// Looks up a lake by key (`"Erie"`) or layer name (`"Lake Erie"`).
pub fn find_lake(name: &str) -> Option<&'static Lake> {
    LAKE_REGISTRY
        .iter()
        .find(|l| l.key == name || l.layer_name == name)
}

/// Layer names of all lake layers, in registry order.
pub fn all_layer_names() -> Vec<&'static str> {
    LAKE_REGISTRY.iter().map(|l| l.layer_name).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
