//! Input file grouping and date ordering.
//!
//! Daily files are named like
//! `ncas-ceilometer-3_cao_20220218_aerosol-backscatter_v1.0.nc`: the date
//! token is the third `_`-separated segment after the instrument name, and a
//! marker substring tells aerosol-backscatter files from cloud-base files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::config::FileConfig;
use crate::core::request::{MeasurementKind, TimeWindow};

/// Only today, yesterday and the day before yesterday are supported.
pub const MAX_FILES_PER_KIND: usize = 3;

/// Errors that can occur while validating and ordering input files.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("the following files have been given more than once: {}", .0.join(", "))]
    DuplicateInput(Vec<String>),

    #[error("too many netCDF files for {marker}: {count} given, at most 3 supported")]
    TooManyFiles { marker: String, count: usize },

    #[error("the following dates have been given more than once for {marker}: {}", .dates.join(", "))]
    DuplicateDate { marker: String, dates: Vec<String> },

    #[error("no date token after '{instrument}' in file name: {path}")]
    MissingDateToken { path: String, instrument: String },

    #[error("{kind} {window} plot needs {needed} file(s) but only {available} given")]
    NotEnoughFiles {
        kind: MeasurementKind,
        window: TimeWindow,
        needed: usize,
        available: usize,
    },
}

/// Result type for selection operations.
pub type Result<T> = std::result::Result<T, SelectionError>;

/// Validated input files, each group ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedFiles {
    pub aerosol: Vec<String>,
    pub cloud_base: Vec<String>,
}

impl OrderedFiles {
    /// Files of one kind, index 0 = today, 1 = yesterday, 2 = day before.
    pub fn newest_first(&self, kind: MeasurementKind) -> &[String] {
        match kind {
            MeasurementKind::AerosolBackscatter => &self.aerosol,
            MeasurementKind::CloudBaseHeight => &self.cloud_base,
        }
    }

    /// The files a window is stitched from, oldest first.
    pub fn files_for(&self, kind: MeasurementKind, window: TimeWindow) -> Result<Vec<PathBuf>> {
        let available = self.newest_first(kind);
        let needed = window.files_required();
        if available.len() < needed {
            return Err(SelectionError::NotEnoughFiles {
                kind,
                window,
                needed,
                available: available.len(),
            });
        }

        Ok(available[..needed].iter().rev().map(PathBuf::from).collect())
    }
}

/// Fail if any path appears more than once.
///
/// Repeated paths are reported once each, in order of first appearance.
pub fn check_unique(paths: &[String]) -> Result<()> {
    let repeated = repeated_values(paths.iter().map(String::as_str));
    if repeated.is_empty() {
        Ok(())
    } else {
        Err(SelectionError::DuplicateInput(repeated))
    }
}

/// Values occurring more than once, in order of first appearance.
fn repeated_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for value in values {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|value| counts[value] > 1)
        .map(str::to_string)
        .collect()
}

/// File name component of a path, or the whole string if it has none.
fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

/// Split paths into (aerosol-backscatter, cloud-base) groups by file name marker.
///
/// A file matching neither marker is dropped. A file matching both goes to
/// the aerosol-backscatter group only.
pub fn partition(paths: &[String], files: &FileConfig) -> (Vec<String>, Vec<String>) {
    let mut aerosol = Vec::new();
    let mut cloud_base = Vec::new();

    for path in paths {
        let name = file_name(path);
        if name.contains(&files.aerosol_marker) {
            aerosol.push(path.clone());
        } else if name.contains(&files.cloud_base_marker) {
            cloud_base.push(path.clone());
        } else {
            debug!("Ignoring {}: matches no measurement marker", path);
        }
    }

    (aerosol, cloud_base)
}

/// Extract the date token from a file name.
///
/// The token is the third `_`-separated segment of the text following the
/// first occurrence of `instrument`, so
/// `ncas-ceilometer-3_cao_20220218_cloud-base_v1.0.nc` yields `20220218`.
pub fn date_token(path: &str, instrument: &str) -> Result<String> {
    let missing = || SelectionError::MissingDateToken {
        path: path.to_string(),
        instrument: instrument.to_string(),
    };

    let after = file_name(path).split(instrument).nth(1).ok_or_else(missing)?;
    let token = after.split('_').nth(2).ok_or_else(missing)?;
    if token.is_empty() {
        return Err(missing());
    }
    Ok(token.to_string())
}

/// Validate one group and sort it by date token, newest first.
pub fn order_newest_first(files: Vec<String>, marker: &str, instrument: &str) -> Result<Vec<String>> {
    if files.len() > MAX_FILES_PER_KIND {
        return Err(SelectionError::TooManyFiles {
            marker: marker.to_string(),
            count: files.len(),
        });
    }

    let mut dated: Vec<(String, String)> = files
        .into_iter()
        .map(|path| date_token(&path, instrument).map(|date| (date, path)))
        .collect::<Result<_>>()?;

    let repeated = repeated_values(dated.iter().map(|(date, _)| date.as_str()));
    if !repeated.is_empty() {
        return Err(SelectionError::DuplicateDate {
            marker: marker.to_string(),
            dates: repeated,
        });
    }

    dated.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(dated.into_iter().map(|(_, path)| path).collect())
}

/// Validate all input paths and return both groups ordered newest first.
///
/// Runs every check before any file is opened: duplicate paths, group size,
/// then duplicate dates, first for aerosol-backscatter then for cloud-base.
pub fn select_files(paths: &[String], files: &FileConfig) -> Result<OrderedFiles> {
    check_unique(paths)?;

    let (aerosol, cloud_base) = partition(paths, files);
    let aerosol = order_newest_first(aerosol, &files.aerosol_marker, &files.instrument)?;
    let cloud_base = order_newest_first(cloud_base, &files.cloud_base_marker, &files.instrument)?;

    debug!(
        "Ordered {} aerosol-backscatter and {} cloud-base file(s)",
        aerosol.len(),
        cloud_base.len()
    );

    Ok(OrderedFiles { aerosol, cloud_base })
}
