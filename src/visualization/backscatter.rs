//! Backscatter color map: altitude against time, log-scaled viridis color.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::colors::colormaps::ViridisRGB;

use super::time_axis::TimeAxis;
use super::{plotting_error, RenderError, Result, ALTITUDE_LABEL, TIME_LABEL};
use crate::config::BackscatterConfig;
use crate::core::stitching::StitchedSeries;

/// Width reserved on the right of the canvas for the color bar.
const COLORBAR_WIDTH: u32 = 230;

/// Number of bands the color bar is drawn with.
const COLORBAR_STEPS: usize = 256;

/// Logarithmic normalization onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNorm {
    log_min: f64,
    log_max: f64,
}

impl LogNorm {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self {
            log_min: vmin.log10(),
            log_max: vmax.log10(),
        }
    }

    /// Position of `value` on the scale, clipped to `[0, 1]`.
    ///
    /// Returns `None` for missing, zero or negative values, which have no
    /// place on a log scale and are left blank.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        let span = self.log_max - self.log_min;
        if span <= 0.0 {
            return Some(0.0);
        }
        Some(((value.log10() - self.log_min) / span).clamp(0.0, 1.0))
    }

    pub fn color(&self, value: f64) -> Option<RGBColor> {
        self.normalize(value).map(|h| ViridisRGB.get_color(h))
    }

    /// Scale value at fraction `h` of the way up the color bar.
    pub fn value_at(&self, h: f64) -> f64 {
        10f64.powf(self.log_min + (self.log_max - self.log_min) * h)
    }
}

/// Cell boundaries for samples at `centres`: midpoints between neighbours,
/// with the outer cells mirrored.
pub fn cell_edges(centres: &[f64]) -> Vec<f64> {
    match centres {
        [] => Vec::new(),
        [only] => vec![only - 0.5, only + 0.5],
        _ => {
            let n = centres.len();
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centres[0] - (centres[1] - centres[0]) / 2.0);
            edges.extend(centres.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(centres[n - 1] + (centres[n - 1] - centres[n - 2]) / 2.0);
            edges
        }
    }
}

/// Index of the cell containing `value`, for ascending or descending edges.
pub fn locate(edges: &[f64], value: f64) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    let cells = edges.len() - 1;
    if cells == 0 || !value.is_finite() {
        return None;
    }

    let ascending = last >= first;
    let (lo, hi) = if ascending { (first, last) } else { (last, first) };
    if value < lo || value > hi {
        return None;
    }

    let after = if ascending {
        edges.partition_point(|&e| e <= value)
    } else {
        edges.partition_point(|&e| e >= value)
    };
    Some(after.saturating_sub(1).min(cells - 1))
}

/// Data value at the centre of pixel `px` out of `n` spanning `lo..hi`.
pub fn pixel_to_value(px: u32, n: u32, lo: f64, hi: f64) -> f64 {
    lo + (f64::from(px) + 0.5) / f64::from(n) * (hi - lo)
}

/// Draw the color map and color bar onto `root`.
pub fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &StitchedSeries,
    scale: &BackscatterConfig,
) -> Result<()> {
    let columns = series.values.cols();
    if columns == 0 || series.altitude.len() != columns {
        return Err(RenderError::AltitudeMismatch {
            altitude: series.altitude.len(),
            columns,
        });
    }

    let norm = LogNorm::new(scale.vmin, scale.vmax);
    let time_edges = cell_edges(&series.time);
    let altitude_edges = cell_edges(&series.altitude);

    let (t0, t1) = (time_edges[0], time_edges[time_edges.len() - 1]);
    let (a0, a1) = {
        let (first, last) = (altitude_edges[0], altitude_edges[altitude_edges.len() - 1]);
        (first.min(last), first.max(last))
    };

    let (width, _) = root.dim_in_pixel();
    let (plot_area, bar_area) = root.split_horizontally(width.saturating_sub(COLORBAR_WIDTH));

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(TimeAxis::new(t0..t1), a0..a1)
        .map_err(plotting_error)?;

    let canvas = chart.plotting_area().strip_coord_spec();
    let (pw, ph) = canvas.dim_in_pixel();
    if pw > 0 && ph > 0 {
        let cell_columns: Vec<Option<usize>> = (0..pw)
            .map(|px| locate(&time_edges, pixel_to_value(px, pw, t0, t1)))
            .collect();
        let cell_rows: Vec<Option<usize>> = (0..ph)
            .map(|py| locate(&altitude_edges, pixel_to_value(ph - 1 - py, ph, a0, a1)))
            .collect();

        for (py, level) in cell_rows.iter().enumerate() {
            let Some(level) = *level else { continue };
            for (px, row) in cell_columns.iter().enumerate() {
                let Some(row) = *row else { continue };
                if let Some(color) = norm.color(f64::from(series.values.get(row, level))) {
                    canvas
                        .draw_pixel((px as i32, py as i32), &color)
                        .map_err(plotting_error)?;
                }
            }
        }
    }

    // Grid goes on top of the color map.
    chart
        .configure_mesh()
        .x_desc(TIME_LABEL)
        .y_desc(ALTITUDE_LABEL)
        .y_label_formatter(&|a| format!("{:.0}", a))
        .bold_line_style(&BLACK.mix(0.25))
        .light_line_style(&TRANSPARENT)
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(plotting_error)?;

    draw_colorbar(&bar_area, &norm, scale, series.units.as_deref())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    norm: &LogNorm,
    scale: &BackscatterConfig,
    units: Option<&str>,
) -> Result<()> {
    let label = format!(
        "Attenuated aerosol backscatter coefficient ({})",
        units.unwrap_or("unknown units")
    );

    let mut bar = ChartBuilder::on(area)
        .margin_top(20)
        .margin_bottom(80)
        .margin_left(10)
        .set_label_area_size(LabelAreaPosition::Right, 130)
        .build_cartesian_2d(0f64..1f64, (scale.vmin..scale.vmax).log_scale())
        .map_err(plotting_error)?;

    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_desc(label)
        .y_label_formatter(&|v| format!("{:.0e}", v))
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(plotting_error)?;

    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let lo = norm.value_at(i as f64 / COLORBAR_STEPS as f64);
        let hi = norm.value_at((i + 1) as f64 / COLORBAR_STEPS as f64);
        let color = ViridisRGB.get_color((i as f64 + 0.5) / COLORBAR_STEPS as f64);
        Rectangle::new([(0.0, lo), (1.0, hi)], color.filled())
    }))
    .map_err(plotting_error)?;

    Ok(())
}
