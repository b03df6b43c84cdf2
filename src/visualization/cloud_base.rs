//! Cloud base line plot: one trace per reported cloud layer.

use log::warn;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::time_axis::{padded_span, TimeAxis};
use super::{plotting_error, Result, ALTITUDE_LABEL, TIME_LABEL};
use crate::core::stitching::StitchedSeries;

/// Most layers drawn on one plot.
pub const MAX_CHANNELS: usize = 4;

/// Trace colors, one per layer.
pub const TRACE_COLORS: [RGBColor; MAX_CHANNELS] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
];

/// Legend text for the first `channels` layers.
pub fn legend_labels(channels: usize) -> Vec<String> {
    (1..=channels.min(MAX_CHANNELS))
        .map(|n| format!("Cloud base height {}", n))
        .collect()
}

/// Split one channel into runs of finite points, broken at missing values.
pub fn segments(time: &[f64], values: impl Iterator<Item = f64>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for (&t, v) in time.iter().zip(values) {
        if v.is_finite() {
            current.push((t, v));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Vertical axis range over the drawn channels, with a 5% margin.
///
/// Falls back to `0..1` when every value is missing.
pub fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return (0.0, 1.0);
    }
    let margin = if hi > lo { (hi - lo) * 0.05 } else { hi.abs().max(1.0) * 0.05 };
    (lo - margin, hi + margin)
}

/// Draw the cloud base traces onto `root`.
pub fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, series: &StitchedSeries) -> Result<()> {
    let channels = series.values.cols().min(MAX_CHANNELS);
    if series.values.cols() > MAX_CHANNELS {
        warn!(
            "Cloud base data has {} layers, drawing the first {}",
            series.values.cols(),
            MAX_CHANNELS
        );
    }

    let Some((first, last)) = series.time_span() else {
        return Ok(());
    };
    let (t0, t1) = padded_span(first, last);
    let (y0, y1) = value_range(
        (0..channels).flat_map(|c| series.values.column(c).map(f64::from)),
    );

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(TimeAxis::new(t0..t1), y0..y1)
        .map_err(plotting_error)?;

    chart
        .configure_mesh()
        .x_desc(TIME_LABEL)
        .y_desc(ALTITUDE_LABEL)
        .y_label_formatter(&|h| format!("{:.0}", h))
        .bold_line_style(&BLACK.mix(0.2))
        .light_line_style(&TRANSPARENT)
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(plotting_error)?;

    for ((channel, color), label) in TRACE_COLORS.iter().enumerate().zip(legend_labels(channels)) {
        let runs = segments(&series.time, series.values.column(channel).map(f64::from));
        let style = color.stroke_width(2);

        // An all-missing layer still gets its legend entry.
        let mut runs = runs.into_iter();
        let first = runs.next().unwrap_or_default();
        chart
            .draw_series(std::iter::once(PathElement::new(first, style)))
            .map_err(plotting_error)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));

        for run in runs {
            chart
                .draw_series(std::iter::once(PathElement::new(run, style)))
                .map_err(plotting_error)?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 18))
        .draw()
        .map_err(plotting_error)?;

    Ok(())
}
