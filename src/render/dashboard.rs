//! Eight-panel raster dashboard: time series, histograms with density
//! overlays, a state-colored scatter, the state timeline and per-state box
//! plots.

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::Analysis;
use crate::analyzers::utility::{GaussianKde, linspace};
use crate::config::{RenderConfig, Rgb};
use crate::error::Result;
use crate::reading::Dataset;
use crate::render::{
    ALERT_THRESHOLD_CM, BoxStats, IDEAL_BOUNDARY_CM, axis_range, group_by_state, histogram,
};

const TITLE: &str = "Environmental Monitoring Station - Comprehensive Dashboard";
const MAX_TIMELINE_LABELS: usize = 50;

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

struct Style {
    fg: RGBColor,
    bg: RGBColor,
    grid: RGBColor,
    distance: RGBColor,
    reflectance: RGBColor,
    density: RGBColor,
    bins: usize,
    states: HashMap<String, RGBColor>,
}

impl Style {
    fn new(config: &RenderConfig, dataset: &Dataset) -> Self {
        let labels = dataset.state_labels();
        let states = labels
            .iter()
            .zip(config.state_palette(&labels))
            .map(|(s, c)| (s.to_string(), rgb(c)))
            .collect();

        Style {
            fg: rgb(config.theme.foreground()),
            bg: rgb(config.theme.background()),
            grid: rgb(config.theme.grid()),
            distance: rgb(config.distance_rgb()),
            reflectance: rgb(config.reflectance_rgb()),
            density: rgb(config.density_rgb()),
            bins: config.histogram_bins,
            states,
        }
    }

    fn state(&self, label: &str) -> RGBColor {
        self.states.get(label).copied().unwrap_or(RGBColor(128, 128, 128))
    }

    fn title(&self) -> TextStyle<'static> {
        ("sans-serif", 32).into_font().color(&self.fg)
    }

    fn caption(&self) -> TextStyle<'static> {
        ("sans-serif", 20).into_font().color(&self.fg)
    }

    fn text(&self) -> TextStyle<'static> {
        ("sans-serif", 14).into_font().color(&self.fg)
    }
}

/// Renders the dashboard for `dataset` into a PNG at `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn render_dashboard(
    dataset: &Dataset,
    analysis: &Analysis,
    config: &RenderConfig,
    path: &Path,
) -> Result<()> {
    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    draw_dashboard(&root, dataset, analysis, config)?;
    root.present()?;
    info!(path = %path.display(), "Dashboard saved");
    Ok(())
}

/// Draws every panel onto `root`, whatever backend it is bound to.
pub fn draw_dashboard<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    dataset: &Dataset,
    analysis: &Analysis,
    config: &RenderConfig,
) -> Result<()> {
    let style = Style::new(config, dataset);
    root.fill(&style.bg)?;
    let root = root.titled(TITLE, style.title())?;
    let panels = root.split_evenly((4, 2));

    distance_over_time(&panels[0], dataset, analysis, &style)?;
    reflectance_over_time(&panels[1], dataset, analysis, &style)?;

    let distances: Vec<f64> = dataset.valid_distance().map(|r| r.distance_cm).collect();
    let reflectances: Vec<f64> = dataset
        .readings()
        .iter()
        .map(|r| f64::from(r.reflectance))
        .collect();
    histogram_panel(
        &panels[2],
        &distances,
        "Distance Distribution",
        "Distance (cm)",
        style.distance,
        &[(ALERT_THRESHOLD_CM, RED), (IDEAL_BOUNDARY_CM, GREEN)],
        &style,
    )?;
    histogram_panel(
        &panels[3],
        &reflectances,
        "Reflectance Distribution",
        "Reflectance",
        style.reflectance,
        &[],
        &style,
    )?;

    correlation_scatter(&panels[4], dataset, config, analysis, &style)?;
    state_timeline(&panels[5], dataset, analysis, &style)?;

    let groups = group_by_state(dataset, config);
    let distance_by_state: Vec<(&str, Vec<f64>)> = groups
        .iter()
        .map(|g| {
            let values = g
                .readings
                .iter()
                .filter(|r| r.has_valid_distance())
                .map(|r| r.distance_cm)
                .collect();
            (g.state, values)
        })
        .collect();
    let reflectance_by_state: Vec<(&str, Vec<f64>)> = groups
        .iter()
        .map(|g| {
            let values = g.readings.iter().map(|r| f64::from(r.reflectance)).collect();
            (g.state, values)
        })
        .collect();
    box_panel(
        &panels[6],
        &distance_by_state,
        "Distance Distribution by State",
        "Distance (cm)",
        &style,
    )?;
    box_panel(
        &panels[7],
        &reflectance_by_state,
        "Reflectance Distribution by State",
        "Reflectance",
        &style,
    )?;

    debug!(panels = panels.len(), "Dashboard panels drawn");
    Ok(())
}

fn time_axis(dataset: &Dataset) -> Range<f64> {
    match dataset.time_range_ms() {
        Some((first, last)) => axis_range(first as f64 / 1000.0, last as f64 / 1000.0),
        None => 0.0..1.0,
    }
}

fn no_data<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, title: &str, style: &Style) -> Result<()> {
    area.draw_text(title, &style.caption(), (20, 10))?;
    area.draw_text("No data", &style.text(), (20, 50))?;
    Ok(())
}

fn draw_mesh<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    style: &Style,
    x_desc: &str,
    y_desc: &str,
) -> Result<()> {
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style(style.text())
        .axis_desc_style(style.text())
        .axis_style(style.fg.stroke_width(1))
        .bold_line_style(style.grid.stroke_width(1))
        .light_line_style(style.grid.mix(0.3).stroke_width(1))
        .draw()?;
    Ok(())
}

fn draw_legend<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>, style: &Style) -> Result<()> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(style.text())
        .background_style(style.bg.mix(0.8).filled())
        .border_style(style.fg.stroke_width(1))
        .draw()?;
    Ok(())
}

fn distance_over_time<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    dataset: &Dataset,
    analysis: &Analysis,
    style: &Style,
) -> Result<()> {
    let title = "Distance Measurements Over Time";
    if dataset.is_empty() {
        return no_data(area, title, style);
    }

    let points: Vec<(f64, f64)> = dataset
        .readings()
        .iter()
        .map(|r| (r.seconds(), r.distance_cm))
        .collect();
    let x_range = time_axis(dataset);
    let y_max = points.iter().map(|p| p.1).fold(IDEAL_BOUNDARY_CM, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption(title, style.caption())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), 0.0..y_max * 1.05)?;
    draw_mesh(&mut chart, style, "Time (seconds)", "Distance (cm)")?;

    chart.draw_series(LineSeries::new(points, style.distance.mix(0.7).stroke_width(1)))?;

    for (y, color, label) in [
        (ALERT_THRESHOLD_CM, RED, "Alert Threshold (10cm)"),
        (IDEAL_BOUNDARY_CM, GREEN, "Ideal Boundary (30cm)"),
    ] {
        chart
            .draw_series(LineSeries::new(
                vec![(x_range.start, y), (x_range.end, y)],
                color.mix(0.6).stroke_width(2),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    draw_legend(&mut chart, style)?;

    if let Some(d) = &analysis.distance {
        let note = format!("Mean: {:.1} cm  Std: {:.1} cm", d.stats.mean, d.stats.std_dev);
        area.draw_text(&note, &style.text(), (80, 45))?;
    }
    Ok(())
}

fn reflectance_over_time<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    dataset: &Dataset,
    analysis: &Analysis,
    style: &Style,
) -> Result<()> {
    let title = "IR Reflectance Over Time";
    if dataset.is_empty() {
        return no_data(area, title, style);
    }

    let points: Vec<(f64, f64)> = dataset
        .readings()
        .iter()
        .map(|r| (r.seconds(), f64::from(r.reflectance)))
        .collect();

    let mut chart = ChartBuilder::on(area)
        .caption(title, style.caption())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(time_axis(dataset), 0.0..1100.0)?;
    draw_mesh(&mut chart, style, "Time (seconds)", "Reflectance (0-1023)")?;

    chart.draw_series(LineSeries::new(points, style.reflectance.mix(0.7).stroke_width(1)))?;

    if let Some(r) = &analysis.reflectance {
        let note = format!("Mean: {:.0}  Std: {:.0}", r.stats.mean, r.stats.std_dev);
        area.draw_text(&note, &style.text(), (80, 45))?;
    }
    Ok(())
}

fn histogram_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    values: &[f64],
    title: &str,
    x_desc: &str,
    bar: RGBColor,
    markers: &[(f64, RGBColor)],
    style: &Style,
) -> Result<()> {
    let bars = histogram(values, style.bins);
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return no_data(area, title, style);
    };

    let n = values.len() as f64;
    let bin_width = first.width();
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let density: Vec<(f64, f64)> = GaussianKde::new(values)
        .map(|kde| {
            linspace(lo, hi, 100)
                .into_iter()
                .map(|x| (x, kde.density(x) * n * bin_width))
                .collect()
        })
        .unwrap_or_default();

    let x_range = axis_range(first.lo, last.hi);
    let y_top = bars
        .iter()
        .map(|b| b.count as f64)
        .chain(density.iter().map(|p| p.1))
        .fold(1.0, f64::max)
        * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(title, style.caption())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), 0.0..y_top)?;
    draw_mesh(&mut chart, style, x_desc, "Frequency")?;

    chart.draw_series(
        bars.iter()
            .map(|b| Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], bar.mix(0.7).filled())),
    )?;
    chart.draw_series(
        bars.iter()
            .map(|b| Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], style.fg.stroke_width(1))),
    )?;

    for (x, color) in markers.iter().filter(|(x, _)| x_range.contains(x)) {
        chart.draw_series(LineSeries::new(
            vec![(*x, 0.0), (*x, y_top)],
            color.mix(0.7).stroke_width(2),
        ))?;
    }

    if !density.is_empty() {
        let color = style.density;
        chart
            .draw_series(LineSeries::new(density, color.stroke_width(2)))?
            .label("Density")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        draw_legend(&mut chart, style)?;
    }
    Ok(())
}

fn correlation_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    dataset: &Dataset,
    config: &RenderConfig,
    analysis: &Analysis,
    style: &Style,
) -> Result<()> {
    let title = "Distance vs Reflectance Correlation";
    let valid: Vec<(f64, f64)> = dataset
        .valid_distance()
        .map(|r| (r.distance_cm, f64::from(r.reflectance)))
        .collect();
    if valid.is_empty() {
        return no_data(area, title, style);
    }

    let x_lo = valid.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_hi = valid.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let y_lo = valid.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_hi = valid.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption(title, style.caption())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(axis_range(x_lo, x_hi), axis_range(y_lo, y_hi))?;
    draw_mesh(&mut chart, style, "Distance (cm)", "Reflectance")?;

    for group in group_by_state(dataset, config) {
        let color = rgb(group.color);
        let points: Vec<(f64, f64)> = group
            .readings
            .iter()
            .filter(|r| r.has_valid_distance())
            .map(|r| (r.distance_cm, f64::from(r.reflectance)))
            .collect();
        if points.is_empty() {
            continue;
        }
        chart
            .draw_series(
                points
                    .into_iter()
                    .map(move |p| Circle::new(p, 3, color.mix(0.6).filled())),
            )?
            .label(group.state)
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }
    draw_legend(&mut chart, style)?;

    if let Some(c) = analysis.reflectance.as_ref().and_then(|r| r.correlation.as_ref()) {
        let note = format!("Correlation: {:.3}", c.coefficient);
        area.draw_text(&note, &style.text(), (80, 45))?;
    }
    Ok(())
}

fn state_timeline<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    dataset: &Dataset,
    analysis: &Analysis,
    style: &Style,
) -> Result<()> {
    let title = "System State Timeline";
    let runs = &analysis.transitions.runs;
    if runs.is_empty() {
        return no_data(area, title, style);
    }

    let mut chart = ChartBuilder::on(area)
        .caption(title, style.caption())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(time_axis(dataset), 0.0..1.0)?;
    chart
        .configure_mesh()
        .x_desc("Time (seconds)")
        .label_style(style.text())
        .axis_desc_style(style.text())
        .axis_style(style.fg.stroke_width(1))
        .disable_y_mesh()
        .y_label_formatter(&|_| String::new())
        .bold_line_style(style.grid.stroke_width(1))
        .light_line_style(style.grid.mix(0.3).stroke_width(1))
        .draw()?;

    chart.draw_series(runs.iter().map(|run| {
        Rectangle::new(
            [
                (run.start_ms as f64 / 1000.0, 0.0),
                (run.end_ms as f64 / 1000.0, 1.0),
            ],
            style.state(&run.state).mix(0.35).filled(),
        )
    }))?;

    if runs.len() <= MAX_TIMELINE_LABELS {
        chart.draw_series(runs.iter().map(|run| {
            Text::new(
                run.state.clone(),
                (run.start_ms as f64 / 1000.0, 0.55),
                style.text(),
            )
        }))?;
    }

    for label in dataset.state_labels() {
        let color = style.state(label);
        chart
            .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.mix(0.5).filled()));
    }
    draw_legend(&mut chart, style)
}

fn box_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    groups: &[(&str, Vec<f64>)],
    title: &str,
    y_desc: &str,
    style: &Style,
) -> Result<()> {
    let boxes: Vec<(&str, BoxStats)> = groups
        .iter()
        .filter_map(|(state, values)| BoxStats::from_values(values).map(|b| (*state, b)))
        .collect();
    if boxes.is_empty() {
        return no_data(area, title, style);
    }

    let y_lo = boxes
        .iter()
        .flat_map(|(_, b)| std::iter::once(b.lower_whisker).chain(b.outliers.iter().copied()))
        .fold(f64::INFINITY, f64::min);
    let y_hi = boxes
        .iter()
        .flat_map(|(_, b)| std::iter::once(b.upper_whisker).chain(b.outliers.iter().copied()))
        .fold(f64::NEG_INFINITY, f64::max);
    let y_range = axis_range(y_lo, y_hi);
    let label_y = y_range.start + (y_range.end - y_range.start) * 0.08;

    let mut chart = ChartBuilder::on(area)
        .caption(title, style.caption())
        .margin(10)
        .x_label_area_size(20)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(boxes.len() as f64 - 0.5), y_range)?;
    chart
        .configure_mesh()
        .y_desc(y_desc)
        .label_style(style.text())
        .axis_desc_style(style.text())
        .axis_style(style.fg.stroke_width(1))
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .bold_line_style(style.grid.stroke_width(1))
        .light_line_style(style.grid.mix(0.3).stroke_width(1))
        .draw()?;

    for (k, (state, b)) in boxes.iter().enumerate() {
        let x = k as f64;
        let color = style.state(state);
        let outline = style.fg.stroke_width(1);

        chart.draw_series([Rectangle::new(
            [(x - 0.3, b.q1), (x + 0.3, b.q3)],
            color.mix(0.6).filled(),
        )])?;
        chart.draw_series([Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], outline)])?;
        chart.draw_series([
            PathElement::new(vec![(x - 0.3, b.median), (x + 0.3, b.median)], style.fg.stroke_width(2)),
            PathElement::new(vec![(x, b.q3), (x, b.upper_whisker)], outline),
            PathElement::new(vec![(x, b.q1), (x, b.lower_whisker)], outline),
            PathElement::new(vec![(x - 0.15, b.upper_whisker), (x + 0.15, b.upper_whisker)], outline),
            PathElement::new(vec![(x - 0.15, b.lower_whisker), (x + 0.15, b.lower_whisker)], outline),
        ])?;
        chart.draw_series(b.outliers.iter().map(|v| Circle::new((x, *v), 3, outline)))?;
        chart.draw_series([Text::new(state.to_string(), (x - 0.25, label_y), style.text())])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::analyze;
    use crate::reading::Reading;
    use chrono::Utc;

    fn sample() -> Dataset {
        let states = ["NORMAL", "OBJECT_DETECTED", "ALERT_CLOSE", "CALIBRATING"];
        let readings = (0..60u64)
            .map(|i| {
                let state = states[(i / 15) as usize];
                let distance = if i % 17 == 0 { 999.0 } else { 5.0 + (i as f64 * 1.7) % 90.0 };
                Reading::new(i * 250, distance, ((i * 37) % 1024) as u16, state)
            })
            .collect();
        Dataset::new("sample.csv", Utc::now(), readings)
    }

    fn render_into_buffer(dataset: &Dataset) -> Result<()> {
        let config = RenderConfig {
            width: 1200,
            height: 1000,
            ..RenderConfig::default()
        };
        let analysis = analyze(dataset);
        let mut buf = vec![0u8; 1200 * 1000 * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (1200, 1000)).into_drawing_area();
            draw_dashboard(&root, dataset, &analysis, &config)?;
            root.present()?;
        }
        assert!(buf.iter().any(|b| *b != 0));
        Ok(())
    }

    #[test]
    fn test_draws_full_dataset() {
        render_into_buffer(&sample()).unwrap();
    }

    #[test]
    fn test_draws_empty_dataset() {
        render_into_buffer(&Dataset::new("empty.csv", Utc::now(), vec![])).unwrap();
    }

    #[test]
    fn test_draws_single_reading() {
        let ds = Dataset::new(
            "one.csv",
            Utc::now(),
            vec![Reading::new(0, 999.0, 512, "NORMAL")],
        );
        render_into_buffer(&ds).unwrap();
    }

    #[test]
    fn test_text_is_drawn() {
        // an empty dataset only draws the title and "No data" notes, so any
        // dark pixel on the white background comes from a glyph
        let ds = Dataset::new("empty.csv", Utc::now(), vec![]);
        let analysis = analyze(&ds);
        let mut buf = vec![0u8; 800 * 600 * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (800, 600)).into_drawing_area();
            draw_dashboard(&root, &ds, &analysis, &RenderConfig::default()).unwrap();
            root.present().unwrap();
        }
        assert!(buf.chunks(3).any(|px| px.iter().all(|c| *c < 100)));
    }

    #[test]
    fn test_writes_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.png");
        let ds = sample();
        let config = RenderConfig {
            width: 1200,
            height: 1000,
            ..RenderConfig::default()
        };
        render_dashboard(&ds, &analyze(&ds), &config, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
