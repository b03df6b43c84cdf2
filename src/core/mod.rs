//! Core data types and netCDF loading.

pub mod loaders;
pub mod request;
pub mod stitching;

pub use loaders::{load_measurement, Grid, LoaderError, Measurement};
pub use request::{MeasurementKind, PlotRequest, TimeWindow, INSTRUMENT};
pub use stitching::{stitch, window_cutoff, StitchError, StitchedSeries};
