// pidstat_report - pidstat Memory Log Analyzer
// Copyright (C) 2025 The pidstat_report contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

/*!
    # chart.rs

    Two-panel PNG report:
    - Top: system used memory (GB) with total capacity in the legend
    - Bottom: process RSS (MB)

    Both panels get a peak annotation, a dashed average line and a padded
    y-axis so small fluctuations stay readable. Time ticks are chosen from
    the overall monitoring span.
*/

use std::ops::Range;
use std::path::Path;

use anyhow::{anyhow, bail};
use chrono::{Duration, NaiveDateTime, Timelike};
use plotters::coord::Shift;
use plotters::coord::combinators::{BindKeyPoints, WithKeyPoints};
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::FontTransform;

use crate::pidstat::Sample;
use crate::stats::{Describe, SystemSummary};
use crate::style::{ChartStyle, Rgb};
use crate::sysmem::SystemMemorySample;

// ==================== Axis scaling ====================

/// Y-axis padding rule: pad by `margin * margin_steps` on both sides,
/// clamp at zero, then widen around the center up to `min_span`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPadding {
    pub margin: f64,
    pub margin_steps: f64,
    pub min_span: f64,
}

/// System memory, in GB: 50MB steps, at least 200MB visible.
pub const SYSTEM_AXIS: AxisPadding = AxisPadding {
    margin: 0.05,
    margin_steps: 2.0,
    min_span: 0.2,
};

/// Process RSS, in MB.
pub const PROCESS_AXIS: AxisPadding = AxisPadding {
    margin: 50.0,
    margin_steps: 1.0,
    min_span: 100.0,
};

impl AxisPadding {
    pub fn range(&self, min: f64, max: f64) -> Range<f64> {
        let pad = self.margin * self.margin_steps;
        let mut lo = (min - pad).max(0.0);
        let mut hi = max + pad;
        if hi - lo < self.min_span {
            let center = (hi + lo) / 2.0;
            lo = (center - self.min_span / 2.0).max(0.0);
            hi = center + self.min_span / 2.0;
        }
        lo..hi
    }
}

// ==================== Time axis ====================

/// Tick spacing and label format for the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub tick_secs: u32,
    pub label_format: &'static str,
}

impl TimeAxis {
    pub fn for_span(span_secs: f64) -> Self {
        let (tick_secs, label_format) = if span_secs <= 60.0 {
            (10, "%H:%M:%S")
        } else if span_secs <= 300.0 {
            (30, "%H:%M:%S")
        } else if span_secs <= 1800.0 {
            (5 * 60, "%H:%M")
        } else if span_secs <= 3600.0 {
            (10 * 60, "%H:%M")
        } else if span_secs <= 7200.0 {
            (20 * 60, "%H:%M")
        } else {
            (30 * 60, "%H:%M")
        };
        Self {
            tick_secs,
            label_format,
        }
    }

    /// Tick positions, in seconds from `origin`, on wall-clock multiples of
    /// `tick_secs` within `0..=end_secs`. More than `cap` ticks are thinned by
    /// keeping every k-th one.
    pub fn key_points(&self, origin: NaiveDateTime, end_secs: f64, cap: usize) -> Vec<f64> {
        let tick = self.tick_secs as f64;
        let time = origin.time();
        let since_midnight =
            time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1e9;
        let first = (since_midnight / tick).ceil() * tick - since_midnight;
        if end_secs < first {
            return vec![0.0];
        }
        let total = ((end_secs - first) / tick).floor() as usize + 1;
        let stride = total.div_ceil(cap.max(1));
        (0..total)
            .step_by(stride.max(1))
            .map(|i| first + i as f64 * tick)
            .collect()
    }
}

// ==================== Legend ====================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Swatch {
    Line(Rgb),
    Dashed(Rgb),
    /// Text only, no marker
    Hidden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub swatch: Swatch,
    /// The synthetic total capacity entry
    pub capacity: bool,
}

impl LegendEntry {
    pub fn line(label: impl Into<String>, color: Rgb) -> Self {
        Self {
            label: label.into(),
            swatch: Swatch::Line(color),
            capacity: false,
        }
    }

    pub fn dashed(label: impl Into<String>, color: Rgb) -> Self {
        Self {
            label: label.into(),
            swatch: Swatch::Dashed(color),
            capacity: false,
        }
    }

    pub fn capacity(total_gb: f64) -> Self {
        Self {
            label: format!("<Total Memory:{:.2}GB>", total_gb),
            swatch: Swatch::Hidden,
            capacity: true,
        }
    }
}

/// Capacity entry first, then the rest in order; repeated labels keep
/// their first occurrence only.
pub fn arrange_legend(entries: Vec<LegendEntry>) -> Vec<LegendEntry> {
    let (capacity, rest): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.capacity);
    let mut seen = std::collections::HashSet::new();
    capacity
        .into_iter()
        .take(1)
        .chain(rest)
        .filter(|e| seen.insert(e.label.clone()))
        .collect()
}

pub fn chart_title(title: &str, execution_time_secs: Option<f64>) -> String {
    match execution_time_secs {
        Some(secs) => format!("{} (Execution: {:.1}s)", title, secs),
        None => title.to_string(),
    }
}

// ==================== Panels ====================

struct Panel<'a> {
    title: &'a str,
    y_desc: String,
    points: Vec<(NaiveDateTime, f64)>,
    color: Rgb,
    peak_fill: Rgb,
    unit: &'static str,
    axis: AxisPadding,
    y_precision: usize,
    mean: f64,
    legend: Vec<LegendEntry>,
}

fn system_panel<'a>(system: &[SystemMemorySample], style: &'a ChartStyle) -> Option<Panel<'a>> {
    let summary = SystemSummary::compute(system)?;
    let color = style.system_color;
    Some(Panel {
        title: &style.system_panel_title,
        y_desc: "Memory Usage (GB)".to_string(),
        points: system
            .iter()
            .map(|s| (s.timestamp, s.used_memory_gb))
            .collect(),
        color,
        peak_fill: style.system_peak_fill,
        unit: "GB",
        axis: SYSTEM_AXIS,
        y_precision: 2,
        mean: summary.used_gb.mean,
        legend: vec![
            LegendEntry::line("Used Memory", color),
            LegendEntry::capacity(summary.total_gb),
            LegendEntry::dashed(format!("System Avg: {:.2} GB", summary.used_gb.mean), color),
        ],
    })
}

fn process_panel<'a>(samples: &[Sample], style: &'a ChartStyle) -> Option<Panel<'a>> {
    let rss: Vec<f64> = samples.iter().map(Sample::rss_mb).collect();
    let mean = Describe::of(&rss)?.mean;
    let color = style.process_color;
    let label = &style.process_label;
    Some(Panel {
        title: &style.process_panel_title,
        y_desc: format!("{} Memory Usage (MB)", label),
        points: samples.iter().map(|s| (s.timestamp, s.rss_mb())).collect(),
        color,
        peak_fill: style.process_peak_fill,
        unit: "MB",
        axis: PROCESS_AXIS,
        y_precision: 0,
        mean,
        legend: vec![
            LegendEntry::line(format!("{} RSS", label), color),
            LegendEntry::dashed(format!("{} Avg: {:.1} MB", label, mean), color),
        ],
    })
}

fn span_secs(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Short segments along a horizontal line, dash then gap.
fn dashes(start: f64, end: f64, count: usize) -> impl Iterator<Item = (f64, f64)> {
    let step = (end - start) / count as f64;
    (0..count).map(move |i| {
        let a = start + i as f64 * step;
        (a, a + step * 0.6)
    })
}

/// Forwards to `WithKeyPoints` unchanged; only opts into `DefaultFormatting`
/// so the chart satisfies plotters' `ValueFormatter` bound for `configure_mesh`.
struct KeyPointAxis(WithKeyPoints<RangedCoordf64>);

impl Ranged for KeyPointAxis {
    type ValueType = f64;
    type FormatOption = DefaultFormatting;

    fn range(&self) -> Range<f64> {
        self.0.range()
    }

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    time_axis: &TimeAxis,
    style: &ChartStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let Some(origin) = panel.points.iter().map(|p| p.0).min() else {
        return Ok(());
    };
    let xy: Vec<(f64, f64)> = panel
        .points
        .iter()
        .map(|(ts, v)| (span_secs(origin, *ts), *v))
        .collect();

    let x_max = xy.iter().map(|p| p.0).fold(0.0, f64::max);
    let x_range = 0.0..x_max.max(1.0);
    let y_min = xy.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = xy.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let y_range = panel.axis.range(y_min, y_max);

    let color = RGBColor::from(panel.color);
    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, style.bold_font(style.panel_title_size))
        .margin(12)
        .x_label_area_size(110)
        .y_label_area_size(90)
        .build_cartesian_2d(
            KeyPointAxis(
                x_range
                    .clone()
                    .with_key_points(time_axis.key_points(origin, x_range.end, style.max_time_ticks)),
            ),
            y_range,
        )?;

    let fmt = time_axis.label_format;
    let time_label =
        |x: &f64| (origin + Duration::milliseconds((x * 1000.0).round() as i64)).format(fmt).to_string();
    let precision = panel.y_precision;
    chart
        .configure_mesh()
        .x_label_formatter(&time_label)
        .x_label_style(style.font(style.label_size).transform(FontTransform::Rotate90))
        .y_label_formatter(&|v| format!("{:.*}", precision, v))
        .y_label_style(style.font(style.label_size).color(&color))
        .x_desc("Time")
        .y_desc(panel.y_desc.as_str())
        .axis_desc_style(style.font(style.label_size))
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(WHITE)
        .draw()?;

    chart.draw_series(LineSeries::new(xy.iter().copied(), color.stroke_width(2)))?;
    chart.draw_series(xy.iter().map(|&p| Circle::new(p, 3, color.filled())))?;

    chart.draw_series(
        dashes(x_range.start, x_range.end, 80)
            .map(|(a, b)| PathElement::new(vec![(a, panel.mean), (b, panel.mean)], color.mix(0.7).stroke_width(2))),
    )?;

    // Peak: first occurrence of the maximum
    let (peak_x, peak_y) = xy
        .iter()
        .copied()
        .fold(xy[0], |best, p| if p.1 > best.1 { p } else { best });
    let peak_time = (origin + Duration::milliseconds((peak_x * 1000.0).round() as i64)).format("%H:%M:%S");
    let text = format!("Peak: {:.1}{} @ {}", peak_y, panel.unit, peak_time);
    let box_w = (text.len() as u32 * style.label_size * 6 / 10 + 12) as i32;
    let box_h = (style.label_size + 10) as i32;
    chart.draw_series(std::iter::once(
        EmptyElement::<(f64, f64), DB>::at((peak_x, peak_y))
            + Circle::new((0, 0), 5, color.filled())
            + PathElement::new(vec![(0, 0), (10, -10)], BLACK.stroke_width(1))
            + Rectangle::new(
                [(10, -10 - box_h), (10 + box_w, -10)],
                RGBColor::from(panel.peak_fill).mix(0.7).filled(),
            )
            + Text::new(text, (16, -5 - box_h), style.font(style.label_size)),
    ))?;

    // Legend-only series, so ordering is under our control
    for entry in arrange_legend(panel.legend.clone()) {
        let anno = chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
            .label(entry.label);
        match entry.swatch {
            Swatch::Line(c) => {
                let c = RGBColor::from(c);
                anno.legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
            }
            Swatch::Dashed(c) => {
                let c = RGBColor::from(c).mix(0.7);
                anno.legend(move |(x, y)| {
                    EmptyElement::<(i32, i32), DB>::at((x, y))
                        + PathElement::new(vec![(0, 0), (7, 0)], c.stroke_width(2))
                        + PathElement::new(vec![(12, 0), (19, 0)], c.stroke_width(2))
                });
            }
            Swatch::Hidden => {
                anno.legend(|(x, y)| EmptyElement::<(i32, i32), DB>::at((x, y)));
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(style.font(style.label_size))
        .draw()?;
    Ok(())
}

fn draw_notice<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    message: &str,
    style: &ChartStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(title.to_string(), (20, 12), style.bold_font(style.panel_title_size)))?;
    area.draw(&Text::new(
        message.to_string(),
        ((w / 3) as i32, (h / 2) as i32),
        style.font(style.label_size),
    ))?;
    Ok(())
}

fn draw_report<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    samples: &[Sample],
    system: &[SystemMemorySample],
    execution_time_secs: Option<f64>,
    title: &str,
    style: &ChartStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let body = root.titled(
        &chart_title(title, execution_time_secs),
        style.bold_font(style.title_size),
    )?;
    let panels = body.split_evenly((2, 1));

    let start = samples.iter().map(|s| s.timestamp).min();
    let end = samples.iter().map(|s| s.timestamp).max();
    let span = match (start, end) {
        (Some(a), Some(b)) => span_secs(a, b),
        _ => 0.0,
    };
    let time_axis = TimeAxis::for_span(span);

    match system_panel(system, style) {
        Some(panel) => draw_panel(&panels[0], &panel, &time_axis, style)?,
        None => draw_notice(
            &panels[0],
            &style.system_panel_title,
            "System memory log unavailable",
            style,
        )?,
    }
    if let Some(panel) = process_panel(samples, style) {
        draw_panel(&panels[1], &panel, &time_axis, style)?;
    }
    root.present()?;
    Ok(())
}

/// Render the memory report PNG to `path`.
pub fn render_report(
    samples: &[Sample],
    system: &[SystemMemorySample],
    path: &Path,
    execution_time_secs: Option<f64>,
    title: &str,
    style: &ChartStyle,
) -> anyhow::Result<()> {
    if samples.is_empty() {
        bail!("no process samples to chart");
    }
    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    draw_report(&root, samples, system, execution_time_secs, title, style)
        .map_err(|e| anyhow!("drawing {}: {}", path.display(), e))?;
    println!("Graph saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_axis_brackets_data_by_margin() {
        let r = PROCESS_AXIS.range(100.0, 120.0);
        assert!(r.start <= 50.0);
        assert!(r.end >= 170.0);
        assert!(r.end - r.start >= 100.0);
    }

    #[test]
    fn process_axis_widens_flat_series() {
        let r = PROCESS_AXIS.range(200.0, 200.0);
        assert_eq!(r, 150.0..250.0);
    }

    #[test]
    fn axis_never_goes_below_zero() {
        let r = PROCESS_AXIS.range(10.0, 20.0);
        assert_eq!(r.start, 0.0);
        assert!(r.end >= 70.0);
    }

    #[test]
    fn system_axis_uses_two_margin_steps() {
        let r = SYSTEM_AXIS.range(3.0, 4.0);
        assert!((r.start - 2.9).abs() < 1e-9);
        assert!((r.end - 4.1).abs() < 1e-9);
    }

    #[test]
    fn system_axis_minimum_span() {
        let r = SYSTEM_AXIS.range(3.0, 3.0);
        assert!((r.end - r.start - 0.2).abs() < 1e-9);
        assert!((r.start - 2.9).abs() < 1e-9);
    }

    #[test]
    fn time_axis_breakpoints() {
        assert_eq!(TimeAxis::for_span(45.0), TimeAxis { tick_secs: 10, label_format: "%H:%M:%S" });
        assert_eq!(TimeAxis::for_span(120.0).tick_secs, 30);
        assert_eq!(TimeAxis::for_span(600.0), TimeAxis { tick_secs: 300, label_format: "%H:%M" });
        assert_eq!(TimeAxis::for_span(1800.0).tick_secs, 300);
        assert_eq!(TimeAxis::for_span(3600.0).tick_secs, 600);
        assert_eq!(TimeAxis::for_span(7200.0).tick_secs, 1200);
        assert_eq!(TimeAxis::for_span(90000.0).tick_secs, 1800);
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn key_points_sit_on_wall_clock_interval() {
        let origin = at(12, 0, 7);
        let axis = TimeAxis::for_span(120.0);
        let points = axis.key_points(origin, 120.0, 15);
        assert_eq!(points, vec![23.0, 53.0, 83.0, 113.0]);
        for p in points {
            let tick = origin + Duration::seconds(p as i64);
            assert_eq!(tick.time().num_seconds_from_midnight() % 30, 0);
        }
    }

    #[test]
    fn key_points_start_at_origin_on_boundary() {
        let points = TimeAxis::for_span(600.0).key_points(at(9, 55, 0), 600.0, 15);
        assert_eq!(points, vec![0.0, 300.0, 600.0]);
    }

    #[test]
    fn key_points_are_capped() {
        let axis = TimeAxis::for_span(90000.0);
        let points = axis.key_points(at(0, 0, 0), 90000.0, 15);
        assert!(points.len() <= 15);
        assert!(points.len() >= 2);
        // Thinned ticks stay on multiples of the interval
        assert!(points.iter().all(|p| p % 1800.0 == 0.0));
        assert!(points.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn key_points_short_span_keeps_origin_label() {
        let points = TimeAxis::for_span(300.0).key_points(at(12, 0, 1), 1.0, 15);
        assert_eq!(points, vec![0.0]);
    }

    #[test]
    fn capacity_entry_moves_to_front() {
        let c = Rgb(1, 2, 3);
        let legend = arrange_legend(vec![
            LegendEntry::line("Used Memory", c),
            LegendEntry::dashed("System Avg: 3.00 GB", c),
            LegendEntry::capacity(15.6),
        ]);
        let labels: Vec<&str> = legend.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["<Total Memory:15.60GB>", "Used Memory", "System Avg: 3.00 GB"]);
    }

    #[test]
    fn duplicate_labels_keep_first() {
        let legend = arrange_legend(vec![
            LegendEntry::line("Used Memory", Rgb(1, 1, 1)),
            LegendEntry::capacity(8.0),
            LegendEntry::line("Used Memory", Rgb(2, 2, 2)),
            LegendEntry::capacity(8.0),
        ]);
        assert_eq!(legend.len(), 2);
        assert!(legend[0].capacity);
        assert_eq!(legend[1].swatch, Swatch::Line(Rgb(1, 1, 1)));
    }

    #[test]
    fn title_includes_execution_time() {
        assert_eq!(chart_title("Run", Some(12.345)), "Run (Execution: 12.3s)");
        assert_eq!(chart_title("Run", None), "Run");
    }
}
