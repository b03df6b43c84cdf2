//! Plot requests: which measurement, over which trailing window.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Duration;

/// Instrument name baked into every output file name.
pub const INSTRUMENT: &str = "ncas-ceilometer-3";

/// The two measurement products a ceilometer file can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    /// Attenuated aerosol backscatter coefficient per altitude bin
    AerosolBackscatter,
    /// Up to four cloud-base altitude channels
    CloudBaseHeight,
}

impl MeasurementKind {
    pub const ALL: [MeasurementKind; 2] = [
        MeasurementKind::AerosolBackscatter,
        MeasurementKind::CloudBaseHeight,
    ];

    /// Hyphenated name used in output file names.
    pub fn slug(self) -> &'static str {
        match self {
            MeasurementKind::AerosolBackscatter => "aerosol-backscatter",
            MeasurementKind::CloudBaseHeight => "cloud-base-height",
        }
    }

    /// netCDF variable holding the 2-D data for this kind.
    pub fn variable_name(self) -> &'static str {
        match self {
            MeasurementKind::AerosolBackscatter => "attenuated_aerosol_backscatter_coefficient",
            MeasurementKind::CloudBaseHeight => "cloud_base_altitude",
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Trailing time span covered by a plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    Today,
    Last24,
    Last48,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 3] = [TimeWindow::Today, TimeWindow::Last24, TimeWindow::Last48];

    pub fn slug(self) -> &'static str {
        match self {
            TimeWindow::Today => "today",
            TimeWindow::Last24 => "last24",
            TimeWindow::Last48 => "last48",
        }
    }

    /// Number of daily files the window is stitched from.
    pub fn files_required(self) -> usize {
        match self {
            TimeWindow::Today => 1,
            TimeWindow::Last24 => 2,
            TimeWindow::Last48 => 3,
        }
    }

    /// Length of the trailing window, or `None` for a plain single-day plot.
    pub fn span(self) -> Option<Duration> {
        match self {
            TimeWindow::Today => None,
            TimeWindow::Last24 => Some(Duration::hours(24)),
            TimeWindow::Last48 => Some(Duration::hours(48)),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// One (kind, window) combination to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlotRequest {
    pub kind: MeasurementKind,
    pub window: TimeWindow,
}

impl PlotRequest {
    pub fn new(kind: MeasurementKind, window: TimeWindow) -> Self {
        Self { kind, window }
    }

    /// Every combination, backscatter first, shortest window first.
    pub fn all() -> Vec<PlotRequest> {
        MeasurementKind::ALL
            .iter()
            .flat_map(|&kind| TimeWindow::ALL.iter().map(move |&window| Self::new(kind, window)))
            .collect()
    }

    /// Fixed output file name, e.g. `plot_ncas-ceilometer-3_aerosol-backscatter_today.png`.
    pub fn file_name(&self) -> String {
        format!(
            "plot_{}_{}_{}.png",
            INSTRUMENT,
            self.kind.slug(),
            self.window.slug()
        )
    }

    pub fn output_path(&self, output_location: &Path) -> PathBuf {
        output_location.join(self.file_name())
    }

    /// Underscored label used in progress messages, e.g. `cloud_base_height_last24`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.kind.slug().replace('-', "_"), self.window.slug())
    }
}

impl fmt::Display for PlotRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_names() {
        let request = PlotRequest::new(MeasurementKind::AerosolBackscatter, TimeWindow::Last24);
        assert_eq!(
            request.file_name(),
            "plot_ncas-ceilometer-3_aerosol-backscatter_last24.png"
        );

        let request = PlotRequest::new(MeasurementKind::CloudBaseHeight, TimeWindow::Today);
        assert_eq!(
            request.output_path(Path::new("/tmp/plots")),
            PathBuf::from("/tmp/plots/plot_ncas-ceilometer-3_cloud-base-height_today.png")
        );
    }

    #[test]
    fn test_labels() {
        let request = PlotRequest::new(MeasurementKind::CloudBaseHeight, TimeWindow::Last48);
        assert_eq!(request.label(), "cloud_base_height_last48");
        assert_eq!(request.to_string(), "cloud_base_height_last48");
    }

    #[test]
    fn test_window_requirements() {
        assert_eq!(TimeWindow::Today.files_required(), 1);
        assert_eq!(TimeWindow::Last24.files_required(), 2);
        assert_eq!(TimeWindow::Last48.files_required(), 3);
        assert!(TimeWindow::Today.span().is_none());
        assert_eq!(TimeWindow::Last48.span(), Some(Duration::hours(48)));
    }

    #[test]
    fn test_all_requests_are_distinct() {
        let all = PlotRequest::all();
        assert_eq!(all.len(), 6);
        let names: std::collections::HashSet<String> = all.iter().map(|r| r.file_name()).collect();
        assert_eq!(names.len(), 6);
    }
}
