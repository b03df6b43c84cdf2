//! Quicklook plots for ncas-ceilometer-3 netCDF files.
//!
//! This crate provides tools for:
//! - Grouping aerosol-backscatter and cloud-base files and ordering them by date
//! - Stitching one to three daily files into a single trailing time window
//! - Rendering backscatter color maps and cloud-base-height traces to PNG
//!
//! # Example
//!
//! ```no_run
//! use ceilometer_plots::{processors::selection::select_files, PlotConfig};
//!
//! let config = PlotConfig::default();
//! let files = vec![
//!     "ncas-ceilometer-3_cao_20220218_aerosol-backscatter_v1.0.nc".to_string(),
//!     "ncas-ceilometer-3_cao_20220217_aerosol-backscatter_v1.0.nc".to_string(),
//! ];
//! let ordered = select_files(&files, &config.files).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{BackscatterConfig, CanvasConfig, FileConfig, LogoConfig, PlotConfig};
pub use core::loaders::{Grid, Measurement};
pub use core::request::{MeasurementKind, PlotRequest, TimeWindow};
pub use core::stitching::StitchedSeries;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
