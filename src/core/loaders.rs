//! Data loaders for ceilometer netCDF files.
//!
//! Each daily file carries a `time` coordinate (seconds since 1970-01-01 UTC),
//! an `altitude` coordinate, and one 2-D data variable indexed by time:
//! - `attenuated_aerosol_backscatter_coefficient` over `[time, altitude]`
//! - `cloud_base_altitude` over `[time, layer]`
//!
//! Fill values and non-finite samples are loaded as `NaN`.

use std::path::{Path, PathBuf};

use log::debug;
use netcdf::AttributeValue;
use thiserror::Error;

use super::request::MeasurementKind;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to read netCDF file '{path}': {source}")]
    NetCdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    #[error("variable '{name}' not found in '{path}'")]
    MissingVariable { path: PathBuf, name: String },

    #[error("variable '{name}' in '{path}' has {found} dimensions, expected {expected}")]
    BadRank {
        path: PathBuf,
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("'{path}': {name} has {found} values along its first axis but time has {expected}")]
    LengthMismatch {
        path: PathBuf,
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Row-major 2-D array with one row per timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Grid {
    /// Wraps a flat row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), rows * cols, "grid buffer does not match its shape");
        Self { rows, cols, data }
    }

    /// An empty grid with a fixed row width, ready for [`Grid::push_row`].
    pub fn with_width(cols: usize, row_capacity: usize) -> Self {
        Self {
            rows: 0,
            cols,
            data: Vec::with_capacity(cols * row_capacity),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f32> + '_ {
        (0..self.rows).map(move |row| self.get(row, col))
    }

    /// Appends a row.
    ///
    /// # Panics
    ///
    /// Panics if the row width differs from the grid width.
    pub fn push_row(&mut self, row: &[f32]) {
        assert_eq!(row.len(), self.cols, "row width does not match grid width");
        self.data.extend_from_slice(row);
        self.rows += 1;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// One daily file's worth of data for a single measurement kind.
#[derive(Debug, Clone)]
pub struct Measurement {
    /// Source file path.
    pub source: PathBuf,
    /// Timestamps in seconds since the Unix epoch (UTC).
    pub time: Vec<f64>,
    /// Altitude grid in metres (empty if the file has none).
    pub altitude: Vec<f64>,
    /// Data rows, one per timestamp.
    pub values: Grid,
    /// `units` attribute of the data variable.
    pub units: Option<String>,
}

impl Measurement {
    /// Returns the number of timestamps.
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Load the coordinates and data variable for `kind` from a netCDF file.
///
/// # Errors
///
/// Fails if the file cannot be opened, if `time` or the data variable is
/// missing, if the data variable is not 2-D, or if its first axis does not
/// match `time`. A missing `altitude` is only an error for backscatter.
pub fn load_measurement(path: &Path, kind: MeasurementKind) -> Result<Measurement> {
    let file = netcdf::open(path).map_err(|e| netcdf_error(path, e))?;

    let time = read_f64(&file, path, "time")?;
    let altitude = match kind {
        MeasurementKind::AerosolBackscatter => read_f64(&file, path, "altitude")?,
        MeasurementKind::CloudBaseHeight => {
            if file.variable("altitude").is_some() {
                read_f64(&file, path, "altitude")?
            } else {
                Vec::new()
            }
        }
    };

    let name = kind.variable_name();
    let var = file
        .variable(name)
        .ok_or_else(|| LoaderError::MissingVariable {
            path: path.to_path_buf(),
            name: name.to_string(),
        })?;

    let dims = var.dimensions();
    if dims.len() != 2 {
        return Err(LoaderError::BadRank {
            path: path.to_path_buf(),
            name: name.to_string(),
            expected: 2,
            found: dims.len(),
        });
    }
    let (rows, cols) = (dims[0].len(), dims[1].len());
    if rows != time.len() {
        return Err(LoaderError::LengthMismatch {
            path: path.to_path_buf(),
            name: name.to_string(),
            expected: time.len(),
            found: rows,
        });
    }

    let mut data: Vec<f32> = var
        .get_values::<f32, _>(..)
        .map_err(|e| netcdf_error(path, e))?;
    mask_missing(&mut data, &missing_markers(&var));

    let units = string_attribute(&var, "units");

    debug!(
        "Loaded {} from {}: {} rows x {} columns",
        name,
        path.display(),
        rows,
        cols
    );

    Ok(Measurement {
        source: path.to_path_buf(),
        time,
        altitude,
        values: Grid::new(rows, cols, data),
        units,
    })
}

fn netcdf_error(path: &Path, source: netcdf::Error) -> LoaderError {
    LoaderError::NetCdf {
        path: path.to_path_buf(),
        source,
    }
}

fn read_f64(file: &netcdf::File, path: &Path, name: &str) -> Result<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| LoaderError::MissingVariable {
            path: path.to_path_buf(),
            name: name.to_string(),
        })?;
    var.get_values::<f64, _>(..)
        .map_err(|e| netcdf_error(path, e))
}

/// netCDF default fill for `float` variables.
const DEFAULT_FILL_F32: f32 = 9.969_209_968_386_869e36;

/// Values that mark missing samples: `_FillValue` (or the type default when
/// absent) and `missing_value`.
fn missing_markers(var: &netcdf::Variable) -> Vec<f32> {
    let mut markers = Vec::with_capacity(2);
    markers.push(numeric_attribute(var, "_FillValue").unwrap_or(DEFAULT_FILL_F32));
    markers.extend(numeric_attribute(var, "missing_value"));
    markers
}

/// A numeric attribute converted to the `f32` the data is read as.
fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<f32> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Float(v) => Some(v),
        AttributeValue::Double(v) => Some(v as f32),
        AttributeValue::Short(v) => Some(f32::from(v)),
        AttributeValue::Int(v) => Some(v as f32),
        AttributeValue::Floats(v) => v.first().copied(),
        AttributeValue::Doubles(v) => v.first().map(|&x| x as f32),
        _ => None,
    }
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Replace marker values and non-finite samples with `NaN`.
pub fn mask_missing(data: &mut [f32], markers: &[f32]) {
    for v in data.iter_mut() {
        if !v.is_finite() || markers.contains(v) {
            *v = f32::NAN;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FILL: f32 = -1.0e20;
    const MISSING: f32 = -999.0;

    fn create_backscatter_nc(dir: &Path, name: &str, times: &[f64], altitude: &[f64]) -> PathBuf {
        let path = dir.join(name);
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("time", times.len()).unwrap();
        file.add_dimension("altitude", altitude.len()).unwrap();

        file.add_variable::<f64>("time", &["time"])
            .unwrap()
            .put_values(times, ..)
            .unwrap();
        file.add_variable::<f64>("altitude", &["altitude"])
            .unwrap()
            .put_values(altitude, ..)
            .unwrap();

        let mut data: Vec<f32> = (0..times.len() * altitude.len())
            .map(|i| 1.0e-6 * (i + 1) as f32)
            .collect();
        data[0] = FILL;

        let mut var = file
            .add_variable::<f32>(
                "attenuated_aerosol_backscatter_coefficient",
                &["time", "altitude"],
            )
            .unwrap();
        var.set_fill_value(FILL).unwrap();
        var.put_attribute("units", "m-1 sr-1").unwrap();
        var.put_values(&data, ..).unwrap();

        path
    }

    fn create_cloud_base_nc(dir: &Path, name: &str, times: &[f64]) -> PathBuf {
        let path = dir.join(name);
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("time", times.len()).unwrap();
        file.add_dimension("layer_index", 4).unwrap();

        file.add_variable::<f64>("time", &["time"])
            .unwrap()
            .put_values(times, ..)
            .unwrap();

        let mut data: Vec<f32> = (0..times.len() * 4).map(|i| 500.0 + i as f32).collect();
        data[0] = MISSING;
        if data.len() > 1 {
            data[1] = DEFAULT_FILL_F32;
        }
        let mut var = file
            .add_variable::<f32>("cloud_base_altitude", &["time", "layer_index"])
            .unwrap();
        var.put_attribute("missing_value", MISSING).unwrap();
        var.put_values(&data, ..).unwrap();

        path
    }

    #[test]
    fn test_grid_rows_and_columns() {
        let mut grid = Grid::with_width(3, 2);
        grid.push_row(&[1.0, 2.0, 3.0]);
        grid.push_row(&[4.0, 5.0, 6.0]);

        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(grid.column(2).collect::<Vec<_>>(), vec![3.0, 6.0]);
        assert_eq!(grid.get(0, 1), 2.0);
    }

    #[test]
    #[should_panic]
    fn test_grid_rejects_wrong_width() {
        let mut grid = Grid::with_width(3, 1);
        grid.push_row(&[1.0, 2.0]);
    }

    #[test]
    fn test_mask_missing() {
        let mut data = vec![1.0, FILL, f32::INFINITY, 2.0];
        mask_missing(&mut data, &[FILL]);

        assert_eq!(data[0], 1.0);
        assert!(data[1].is_nan());
        assert!(data[2].is_nan());
        assert_eq!(data[3], 2.0);
    }

    #[test]
    fn test_load_backscatter() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_backscatter_nc(
            temp_dir.path(),
            "ncas-ceilometer-3_cao_20220218_aerosol-backscatter_v1.0.nc",
            &[1_645_142_400.0, 1_645_142_415.0, 1_645_142_430.0],
            &[10.0, 20.0],
        );

        let m = load_measurement(&path, MeasurementKind::AerosolBackscatter).unwrap();

        assert_eq!(m.len(), 3);
        assert_eq!(m.altitude, vec![10.0, 20.0]);
        assert_eq!(m.values.rows(), 3);
        assert_eq!(m.values.cols(), 2);
        assert!(m.values.get(0, 0).is_nan());
        assert!((m.values.get(2, 1) - 6.0e-6).abs() < 1e-12);
        assert_eq!(m.units.as_deref(), Some("m-1 sr-1"));
        assert_eq!(m.source, path);
    }

    #[test]
    fn test_load_cloud_base_without_altitude() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_cloud_base_nc(
            temp_dir.path(),
            "ncas-ceilometer-3_cao_20220218_cloud-base_v1.0.nc",
            &[1_645_142_400.0, 1_645_142_415.0],
        );

        let m = load_measurement(&path, MeasurementKind::CloudBaseHeight).unwrap();

        assert_eq!(m.values.cols(), 4);
        assert!(m.altitude.is_empty());
        assert_eq!(m.values.row(1), &[504.0, 505.0, 506.0, 507.0]);
        assert!(m.values.get(0, 0).is_nan());
        assert!(m.values.get(0, 1).is_nan());
        assert_eq!(m.values.get(0, 2), 502.0);
        assert!(m.units.is_none());
    }

    #[test]
    fn test_missing_variable() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_cloud_base_nc(temp_dir.path(), "cbh.nc", &[0.0]);

        let result = load_measurement(&path, MeasurementKind::AerosolBackscatter);

        match result.unwrap_err() {
            LoaderError::MissingVariable { name, .. } => assert_eq!(name, "altitude"),
            other => panic!("Expected MissingVariable error, got {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_measurement(
            &temp_dir.path().join("absent.nc"),
            MeasurementKind::CloudBaseHeight,
        );
        assert!(matches!(result, Err(LoaderError::NetCdf { .. })));
    }
}
