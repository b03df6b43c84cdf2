//! PNG rendering of stitched ceilometer series.
//!
//! One routine covers every (measurement kind, time window) pair: the input
//! files are loaded and stitched, then drawn onto a canvas that is owned by
//! the call and released when it returns, whether or not drawing succeeded.

pub mod backscatter;
pub mod cloud_base;
pub mod logo;
pub mod time_axis;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::core::loaders::{load_measurement, LoaderError, Measurement};
use crate::core::request::{MeasurementKind, PlotRequest};
use crate::core::stitching::{stitch, StitchError, StitchedSeries};

pub use logo::Logo;

/// Axis titles shared by both plot kinds.
pub const TIME_LABEL: &str = "Time (UTC)";
pub const ALTITUDE_LABEL: &str = "Altitude (m)";

/// Errors that can occur during rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Load(#[from] LoaderError),

    #[error(transparent)]
    Stitch(#[from] StitchError),

    #[error("failed to load logo image '{path}': {source}")]
    Logo {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("no data rows to plot for {0}")]
    EmptySeries(PlotRequest),

    #[error("altitude grid has {altitude} levels but backscatter rows have {columns} values")]
    AltitudeMismatch { altitude: usize, columns: usize },
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

pub(crate) fn plotting_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::PlottingError(e.to_string())
}

/// Load `files` (oldest first), stitch them for `request.window` relative to
/// `reference`, and write the plot into `output_location`.
///
/// Returns the path of the written PNG. An existing file at that path is
/// overwritten.
pub fn render_plot(
    request: PlotRequest,
    files: &[PathBuf],
    reference: DateTime<Utc>,
    config: &PlotConfig,
    output_location: &Path,
) -> Result<PathBuf> {
    let measurements = files
        .iter()
        .map(|path| load_measurement(path, request.kind))
        .collect::<std::result::Result<Vec<Measurement>, LoaderError>>()?;

    let series = stitch(&measurements, request.window, reference)?;
    debug!("{}: {} stitched rows", request, series.len());

    let logo = Logo::load(&config.logo.path)?;
    let output_path = request.output_path(output_location);
    render_series(request, &series, &logo, config, &output_path)?;

    Ok(output_path)
}

/// Draw an already stitched series to `output_path`.
pub fn render_series(
    request: PlotRequest,
    series: &StitchedSeries,
    logo: &Logo,
    config: &PlotConfig,
    output_path: &Path,
) -> Result<()> {
    if series.is_empty() {
        return Err(RenderError::EmptySeries(request));
    }

    let root = BitMapBackend::new(output_path, (config.canvas.width, config.canvas.height))
        .into_drawing_area();

    root.fill(&WHITE).map_err(plotting_error)?;

    match request.kind {
        MeasurementKind::AerosolBackscatter => {
            backscatter::draw(&root, series, &config.backscatter)?
        }
        MeasurementKind::CloudBaseHeight => cloud_base::draw(&root, series)?,
    }

    logo.draw(&root, config.logo.box_for(request.kind))?;

    root.present().map_err(plotting_error)?;

    info!("Wrote {}", output_path.display());
    Ok(())
}
