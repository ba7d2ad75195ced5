//! Application workspace layout.
//!
//! The workspace is a read-only directory holding the map's input files:
//!
//! ```text
//! <root>/geojson/LakeErie.geojson, ..., NewPoints.geojson
//! <root>/data/Lake Erie.csv, ..., Lake Michigan-Huron.csv
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppWorkspace {
    root: PathBuf,
}

impl AppWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AppWorkspace { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory of the GeoJSON layer files.
    pub fn geojson_dir(&self) -> PathBuf {
        self.root.join("geojson")
    }

    /// Directory of the per-lake water level CSVs.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdirectories_hang_off_root() {
        let ws = AppWorkspace::new("/srv/great_lakes");
        assert_eq!(ws.path(), Path::new("/srv/great_lakes"));
        assert_eq!(ws.geojson_dir(), PathBuf::from("/srv/great_lakes/geojson"));
        assert_eq!(ws.data_dir(), PathBuf::from("/srv/great_lakes/data"));
    }
}
