/// Viewer configuration loader - parses viewer.toml
///
/// Keeps map settings, the workspace location, and the NWPS endpoint choice
/// out of the code so they can be changed without recompiling. Every field
/// has a default, so a partial (or empty) file is valid.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::nwps::NwpsEndpoint;
use crate::logging::LogLevel;
use crate::model::ViewerError;
use crate::workspace::AppWorkspace;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "GREAT_LAKES_VIEWER_CONFIG";

/// Config file used when the environment does not name one.
pub const DEFAULT_CONFIG_PATH: &str = "viewer.toml";

pub const DEFAULT_NWPS_BASE_URL: &str = "https://api.water.noaa.gov/nwps/v1";

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub app: AppConfig,
    pub map: MapConfig,
    pub workspace: WorkspaceConfig,
    pub nwps: NwpsConfig,
    pub logging: LoggingConfig,
}

/// App identity, as shown in the portal.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub root_url: String,
    pub color: String,
    pub map_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            name: "Great Lakes Viewer".to_string(),
            root_url: "great-lakes-viewer".to_string(),
            color: "#2980b9".to_string(),
            map_title: "Great Lakes Viewer".to_string(),
        }
    }
}

/// Map view settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub basemaps: Vec<String>,
    /// [min lon, min lat, max lon, max lat] in WGS84.
    pub default_extent: [f64; 4],
    pub show_properties_popup: bool,
    pub plot_slide_sheet: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            basemaps: vec!["OpenStreetMap".to_string(), "ESRI".to_string()],
            default_extent: [
                -95.48678973290308,
                39.469776324236335,
                -71.79882218561728,
                51.10826350669163,
            ],
            show_properties_popup: true,
            plot_slide_sheet: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub path: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            path: PathBuf::from("workspace"),
        }
    }
}

/// NOAA National Water Prediction Service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NwpsConfig {
    pub base_url: String,
    pub endpoint: NwpsEndpoint,
    /// Request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
    /// Drop points NWPS marks as missing (`-999`) before plotting.
    pub drop_missing_values: bool,
}

impl Default for NwpsConfig {
    fn default() -> Self {
        NwpsConfig {
            base_url: DEFAULT_NWPS_BASE_URL.to_string(),
            endpoint: NwpsEndpoint::ShortRange,
            timeout_secs: None,
            drop_missing_values: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            file: None,
            console_timestamps: false,
        }
    }
}

impl ViewerConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ViewerError> {
        let config: ViewerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ViewerError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ViewerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn app_workspace(&self) -> AppWorkspace {
        AppWorkspace::new(self.workspace.path.clone())
    }

    /// Request timeout for NWPS calls; `None` waits indefinitely.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.nwps.timeout_secs.map(Duration::from_secs)
    }

    /// Builds the blocking HTTP client used for NWPS requests.
    ///
    /// The timeout is always set explicitly: the blocking client otherwise
    /// falls back to its own 30 second default.
    pub fn http_client(&self) -> Result<reqwest::blocking::Client, ViewerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.request_timeout())
            .build()?;
        Ok(client)
    }

    fn validate(&self) -> Result<(), ViewerError> {
        let [min_lon, min_lat, max_lon, max_lat] = self.map.default_extent;
        if !(min_lon < max_lon && min_lat < max_lat) {
            return Err(ViewerError::Config(format!(
                "map.default_extent must be [min lon, min lat, max lon, max lat], got {:?}",
                self.map.default_extent
            )));
        }
        if self.map.basemaps.is_empty() {
            return Err(ViewerError::Config("map.basemaps must not be empty".to_string()));
        }
        if self.nwps.base_url.trim().is_empty() {
            return Err(ViewerError::Config("nwps.base_url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Resolves the config file path: `GREAT_LAKES_VIEWER_CONFIG` (after loading
/// any `.env` file) or `viewer.toml` in the working directory.
pub fn config_path() -> PathBuf {
    dotenv::dotenv().ok();
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the viewer configuration from [`config_path`].
pub fn load_config() -> Result<ViewerConfig, ViewerError> {
    ViewerConfig::from_file(&config_path())
}
