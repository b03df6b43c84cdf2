//! UTC date axis: a labelled tick every two hours, with the date added at midnight.

use std::ops::Range;

use chrono::DateTime;
use plotters::coord::ranged1d::{KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;

/// Spacing between time ticks.
pub const TICK_STEP_SECS: i64 = 2 * 3600;

pub const SECS_PER_DAY: i64 = 86_400;

/// Padding applied when a series covers a single instant.
const SINGLE_INSTANT_PAD_SECS: f64 = 1800.0;

/// Tick positions within `[start, end]`, aligned to multiples of two hours UTC.
pub fn tick_positions(start: f64, end: f64) -> Vec<f64> {
    if !start.is_finite() || !end.is_finite() || end < start {
        return Vec::new();
    }

    let mut tick = (start.ceil() as i64).div_euclid(TICK_STEP_SECS) * TICK_STEP_SECS;
    if (tick as f64) < start {
        tick += TICK_STEP_SECS;
    }

    let mut ticks = Vec::new();
    while tick as f64 <= end {
        ticks.push(tick as f64);
        tick += TICK_STEP_SECS;
    }
    ticks
}

/// True at 00:00 UTC.
pub fn is_day_boundary(timestamp: f64) -> bool {
    (timestamp.round() as i64).rem_euclid(SECS_PER_DAY) == 0
}

/// `HH:MM` for intermediate ticks, `HH:MM YYYY/MM/DD` at midnight.
pub fn format_tick(timestamp: f64) -> String {
    let Some(time) = DateTime::from_timestamp(timestamp.round() as i64, 0) else {
        return String::new();
    };

    if is_day_boundary(timestamp) {
        time.format("%H:%M %Y/%m/%d").to_string()
    } else {
        time.format("%H:%M").to_string()
    }
}

/// Axis limits for a time span, widened when it collapses to one instant.
pub fn padded_span(start: f64, end: f64) -> (f64, f64) {
    if end > start {
        (start, end)
    } else {
        (start - SINGLE_INSTANT_PAD_SECS, start + SINGLE_INSTANT_PAD_SECS)
    }
}

/// Time axis in epoch seconds with ticks from [`tick_positions`].
#[derive(Debug, Clone)]
pub struct TimeAxis {
    start: f64,
    end: f64,
}

impl TimeAxis {
    pub fn new(range: Range<f64>) -> Self {
        let (mut start, mut end) = (range.start, range.end);
        if end < start {
            std::mem::swap(&mut start, &mut end);
        }
        TimeAxis { start, end }
    }
}

impl Ranged for TimeAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let coord: RangedCoordf64 = (self.start..self.end).into();
        coord.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        let max_points = hint.max_num_points();
        if max_points == 0 {
            return Vec::new();
        }
        let ticks = tick_positions(self.start, self.end);
        let stride = ticks.len().div_ceil(max_points).max(1);
        ticks.into_iter().step_by(stride).collect()
    }

    fn range(&self) -> Range<f64> {
        self.start..self.end
    }
}

impl ValueFormatter<f64> for TimeAxis {
    fn format(value: &f64) -> String {
        format_tick(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEB18: f64 = 1_645_142_400.0;

    #[test]
    fn test_tick_positions_two_hourly() {
        let ticks = tick_positions(FEB18 + 100.0, FEB18 + 7.0 * 3600.0);
        assert_eq!(
            ticks,
            vec![FEB18 + 7200.0, FEB18 + 14_400.0, FEB18 + 21_600.0]
        );
    }

    #[test]
    fn test_tick_positions_include_exact_bounds() {
        let ticks = tick_positions(FEB18, FEB18 + 86_400.0);
        assert_eq!(ticks.len(), 13);
        assert_eq!(ticks[0], FEB18);
        assert_eq!(*ticks.last().unwrap(), FEB18 + 86_400.0);
    }

    #[test]
    fn test_tick_positions_empty_range() {
        assert!(tick_positions(10.0, 5.0).is_empty());
        assert!(tick_positions(f64::NAN, 5.0).is_empty());
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(FEB18), "00:00 2022/02/18");
        assert_eq!(format_tick(FEB18 + 14.0 * 3600.0), "14:00");
    }

    #[test]
    fn test_time_axis_key_points() {
        let axis = TimeAxis::new(FEB18..FEB18 + 86_400.0);

        assert_eq!(axis.key_points(100usize).len(), 13);
        assert_eq!(axis.key_points(5usize), vec![FEB18, FEB18 + 21_600.0, FEB18 + 43_200.0, FEB18 + 64_800.0, FEB18 + 86_400.0]);
        assert!(axis.key_points(0usize).is_empty());
        assert_eq!(axis.map(&FEB18, (0, 100)), 0);
        assert_eq!(axis.map(&(FEB18 + 86_400.0), (0, 100)), 100);
        assert_eq!(<TimeAxis as ValueFormatter<f64>>::format(&FEB18), "00:00 2022/02/18");
    }

    #[test]
    fn test_padded_span() {
        assert_eq!(padded_span(10.0, 20.0), (10.0, 20.0));
        assert_eq!(padded_span(FEB18, FEB18), (FEB18 - 1800.0, FEB18 + 1800.0));
    }
}
