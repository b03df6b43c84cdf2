//! Multi-day stitching of daily measurements into one trailing window.
//!
//! Files are given oldest first. Every file except the newest is cut down
//! to the rows strictly after `reference - window`; the newest is kept whole.
//! Rows are concatenated in file order and never re-sorted.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use thiserror::Error;

use super::loaders::{Grid, Measurement};
use super::request::TimeWindow;

/// Errors that can occur while stitching measurements.
#[derive(Error, Debug)]
pub enum StitchError {
    #[error("window {window} needs {expected} file(s), got {found}")]
    WrongFileCount {
        window: TimeWindow,
        expected: usize,
        found: usize,
    },

    #[error("'{path}' has {found} columns but the newest file has {expected}")]
    ColumnMismatch {
        path: String,
        expected: usize,
        found: usize,
    },
}

/// Result type for stitching operations.
pub type Result<T> = std::result::Result<T, StitchError>;

/// Concatenated timestamps and data rows for one plot.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchedSeries {
    /// Seconds since the Unix epoch, non-decreasing when inputs are sorted.
    pub time: Vec<f64>,
    /// Altitude grid of the newest file.
    pub altitude: Vec<f64>,
    pub values: Grid,
    /// Unit label of the newest file's data variable.
    pub units: Option<String>,
}

impl StitchedSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// First and last timestamp, if any rows were kept.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        Some((*self.time.first()?, *self.time.last()?))
    }
}

/// Earliest excluded instant for a window, in epoch seconds.
///
/// Returns `None` for [`TimeWindow::Today`], which is never truncated.
pub fn window_cutoff(reference: DateTime<Utc>, window: TimeWindow) -> Option<f64> {
    let start = reference - window.span()?;
    Some(start.timestamp() as f64 + f64::from(start.timestamp_subsec_micros()) / 1e6)
}

/// Indices of rows whose timestamp is strictly greater than `cutoff`.
pub fn rows_after(time: &[f64], cutoff: f64) -> Vec<usize> {
    time.iter()
        .enumerate()
        .filter(|&(_, &t)| t > cutoff)
        .map(|(i, _)| i)
        .collect()
}

/// Stitch `files` (oldest first) into a single series for `window`.
///
/// # Errors
///
/// Fails if the number of files does not match the window, or if a file's
/// row width differs from the newest file's.
pub fn stitch(
    files: &[Measurement],
    window: TimeWindow,
    reference: DateTime<Utc>,
) -> Result<StitchedSeries> {
    let expected = window.files_required();
    let Some((newest, older)) = files.split_last().filter(|_| files.len() == expected) else {
        return Err(StitchError::WrongFileCount {
            window,
            expected,
            found: files.len(),
        });
    };

    let cols = newest.values.cols();
    let cutoff = window_cutoff(reference, window);

    let capacity: usize = files.iter().map(Measurement::len).sum();
    let mut time = Vec::with_capacity(capacity);
    let mut values = Grid::with_width(cols, capacity);

    for older_file in older {
        if older_file.values.cols() != cols {
            return Err(StitchError::ColumnMismatch {
                path: older_file.source.display().to_string(),
                expected: cols,
                found: older_file.values.cols(),
            });
        }

        let kept = match cutoff {
            Some(cutoff) => rows_after(&older_file.time, cutoff),
            None => (0..older_file.len()).collect(),
        };
        debug!(
            "Keeping {}/{} rows of {}",
            kept.len(),
            older_file.len(),
            older_file.source.display()
        );

        for i in kept {
            time.push(older_file.time[i]);
            values.push_row(older_file.values.row(i));
        }
    }

    time.extend_from_slice(&newest.time);
    for i in 0..newest.len() {
        values.push_row(newest.values.row(i));
    }

    if let Some(i) = first_decrease(&time) {
        warn!(
            "Stitched timestamps for {} are not in order at row {} ({} after {})",
            window,
            i,
            time[i],
            time[i - 1]
        );
    }

    Ok(StitchedSeries {
        time,
        altitude: newest.altitude.clone(),
        values,
        units: newest.units.clone(),
    })
}

/// Index of the first timestamp smaller than its predecessor.
fn first_decrease(time: &[f64]) -> Option<usize> {
    time.windows(2).position(|w| w[1] < w[0]).map(|i| i + 1)
}
