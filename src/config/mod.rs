//! Configuration types for plot generation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::request::MeasurementKind;

/// Output canvas size in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    2000
}

fn default_height() -> u32 {
    800
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Color scale limits for the backscatter color map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackscatterConfig {
    /// Lower end of the logarithmic color scale
    #[serde(default = "default_vmin")]
    pub vmin: f64,

    /// Upper end of the logarithmic color scale
    #[serde(default = "default_vmax")]
    pub vmax: f64,
}

fn default_vmin() -> f64 {
    1e-7
}

fn default_vmax() -> f64 {
    1e-3
}

impl Default for BackscatterConfig {
    fn default() -> Self {
        Self {
            vmin: default_vmin(),
            vmax: default_vmax(),
        }
    }
}

/// File name conventions used to group and date input files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Instrument identifier; the date token is read from the segments after it
    #[serde(default = "default_instrument")]
    pub instrument: String,

    /// Substring marking aerosol-backscatter files
    #[serde(default = "default_aerosol_marker")]
    pub aerosol_marker: String,

    /// Substring marking cloud-base files
    #[serde(default = "default_cloud_base_marker")]
    pub cloud_base_marker: String,
}

fn default_instrument() -> String {
    "ncas-ceilometer-3".to_string()
}

fn default_aerosol_marker() -> String {
    "aerosol-backscatter".to_string()
}

fn default_cloud_base_marker() -> String {
    "cloud-base".to_string()
}

impl FileConfig {
    /// Marker substring for the given measurement kind.
    pub fn marker(&self, kind: MeasurementKind) -> &str {
        match kind {
            MeasurementKind::AerosolBackscatter => &self.aerosol_marker,
            MeasurementKind::CloudBaseHeight => &self.cloud_base_marker,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            instrument: default_instrument(),
            aerosol_marker: default_aerosol_marker(),
            cloud_base_marker: default_cloud_base_marker(),
        }
    }
}

/// Logo overlay settings.
///
/// Boxes are `[left, bottom, width, height]` as fractions of the canvas,
/// measured from the bottom-left corner. The logo keeps its aspect ratio
/// and is anchored to the top-right corner of its box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoConfig {
    #[serde(default = "default_logo_path")]
    pub path: PathBuf,

    #[serde(default = "default_backscatter_box")]
    pub backscatter_box: [f64; 4],

    #[serde(default = "default_cloud_base_box")]
    pub cloud_base_box: [f64; 4],
}

fn default_logo_path() -> PathBuf {
    PathBuf::from("NCAS_national_centre_logo_transparent-768x184.png")
}

fn default_backscatter_box() -> [f64; 4] {
    [0.62, 0.75, 0.12, 0.12]
}

fn default_cloud_base_box() -> [f64; 4] {
    [0.78, 0.75, 0.12, 0.12]
}

impl LogoConfig {
    /// Placement box for the given measurement kind.
    pub fn box_for(&self, kind: MeasurementKind) -> [f64; 4] {
        match kind {
            MeasurementKind::AerosolBackscatter => self.backscatter_box,
            MeasurementKind::CloudBaseHeight => self.cloud_base_box,
        }
    }
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            path: default_logo_path(),
            backscatter_box: default_backscatter_box(),
            cloud_base_box: default_cloud_base_box(),
        }
    }
}

/// Main configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub backscatter: BackscatterConfig,

    #[serde(default)]
    pub files: FileConfig,

    #[serde(default)]
    pub logo: LogoConfig,

    /// RFC 3339 instant used instead of the current time when cutting windows
    #[serde(default)]
    pub reference_time: Option<String>,
}

impl PlotConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PlotConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parsed `reference_time`, if one is configured.
    pub fn reference_time(&self) -> Result<Option<DateTime<Utc>>, chrono::ParseError> {
        self.reference_time
            .as_deref()
            .map(parse_reference_time)
            .transpose()
    }
}

/// Parse an RFC 3339 timestamp such as `2022-02-18T17:54:48+00:00` into UTC.
pub fn parse_reference_time(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text.trim()).map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_plot_config() {
        let config = PlotConfig::default();
        assert_eq!(config.canvas.width, 2000);
        assert_eq!(config.canvas.height, 800);
        assert_eq!(config.backscatter.vmin, 1e-7);
        assert_eq!(config.files.instrument, "ncas-ceilometer-3");
        assert!(config.reference_time.is_none());
    }

    #[test]
    fn test_marker_and_logo_box_by_kind() {
        let config = PlotConfig::default();
        assert_eq!(
            config.files.marker(MeasurementKind::AerosolBackscatter),
            "aerosol-backscatter"
        );
        assert_eq!(config.files.marker(MeasurementKind::CloudBaseHeight), "cloud-base");
        assert_eq!(config.logo.box_for(MeasurementKind::AerosolBackscatter)[0], 0.62);
        assert_eq!(config.logo.box_for(MeasurementKind::CloudBaseHeight)[0], 0.78);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plots.yaml");
        std::fs::write(
            &path,
            "canvas:\n  width: 1000\nreference_time: \"2022-02-18T17:54:48+00:00\"\n",
        )
        .unwrap();

        let config = PlotConfig::from_yaml(&path).unwrap();
        assert_eq!(config.canvas.width, 1000);
        assert_eq!(config.canvas.height, 800);
        assert_eq!(config.files.cloud_base_marker, "cloud-base");

        let reference = config.reference_time().unwrap().unwrap();
        assert_eq!(reference.timestamp(), 1_645_206_888);
    }

    #[test]
    fn test_yaml_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("saved.yaml");

        let mut config = PlotConfig::default();
        config.logo.path = PathBuf::from("/srv/logos/ncas.png");
        config.to_yaml(&path).unwrap();

        let loaded = PlotConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.logo.path, PathBuf::from("/srv/logos/ncas.png"));
    }

    #[test]
    fn test_bad_reference_time_is_an_error() {
        let config = PlotConfig {
            reference_time: Some("yesterday".to_string()),
            ..PlotConfig::default()
        };
        assert!(config.reference_time().is_err());
    }
}
