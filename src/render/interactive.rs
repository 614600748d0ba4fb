//! Interactive Plotly dashboard written as a standalone HTML document.

use serde_json::{Value, json};
use std::path::Path;
use tracing::info;

use crate::analyzers::utility::{GaussianKde, linspace};
use crate::config::RenderConfig;
use crate::error::{AnalysisError, Result};
use crate::reading::Dataset;
use crate::render::{ALERT_THRESHOLD_CM, IDEAL_BOUNDARY_CM, StateGroup, group_by_state, histogram};

const TITLE: &str = "Environmental Monitoring Station - Interactive Dashboard";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";
const KDE_POINTS: usize = 100;

/// Plotly traces for the 4x2 grid. Axis pairs are numbered row-major:
/// `x`/`y` is the top-left panel, `x8`/`y8` the bottom-right one.
pub fn traces(dataset: &Dataset, config: &RenderConfig) -> Vec<Value> {
    let seconds: Vec<f64> = dataset.readings().iter().map(|r| r.seconds()).collect();
    let distance: Vec<f64> = dataset.readings().iter().map(|r| r.distance_cm).collect();
    let reflectance: Vec<f64> = dataset
        .readings()
        .iter()
        .map(|r| f64::from(r.reflectance))
        .collect();
    let valid_distance: Vec<f64> = dataset.valid_distance().map(|r| r.distance_cm).collect();
    let distance_color = config.distance_rgb().to_string();
    let reflectance_color = config.reflectance_rgb().to_string();

    let mut out = vec![
        json!({
            "type": "scatter",
            "mode": "lines",
            "name": "Distance",
            "x": seconds,
            "y": distance,
            "line": { "color": distance_color, "width": 1 },
            "hovertemplate": "Time: %{x:.1f}s<br>Distance: %{y:.1f}cm",
            "xaxis": "x",
            "yaxis": "y",
        }),
        json!({
            "type": "scatter",
            "mode": "lines",
            "name": "Reflectance",
            "x": seconds,
            "y": reflectance,
            "line": { "color": reflectance_color, "width": 1 },
            "hovertemplate": "Time: %{x:.1f}s<br>Reflectance: %{y:.0f}",
            "xaxis": "x2",
            "yaxis": "y2",
        }),
    ];

    out.extend(histogram_traces(
        &valid_distance,
        "Distance",
        &distance_color,
        ("x3", "y3"),
        config,
    ));
    out.extend(histogram_traces(
        &reflectance,
        "Reflectance",
        &reflectance_color,
        ("x4", "y4"),
        config,
    ));

    let groups = group_by_state(dataset, config);

    let mut scatter_x = Vec::new();
    let mut scatter_y = Vec::new();
    let mut scatter_color = Vec::new();
    let mut scatter_text = Vec::new();
    for r in dataset.valid_distance() {
        let color = groups
            .iter()
            .find(|g| g.state == r.state)
            .map(|g| g.color.to_string())
            .unwrap_or_else(|| "#808080".to_string());
        scatter_x.push(r.distance_cm);
        scatter_y.push(r.reflectance);
        scatter_color.push(color);
        scatter_text.push(r.state.clone());
    }
    out.push(json!({
        "type": "scatter",
        "mode": "markers",
        "name": "Correlation",
        "x": scatter_x,
        "y": scatter_y,
        "text": scatter_text,
        "marker": { "color": scatter_color, "size": 8, "opacity": 0.6 },
        "hovertemplate": "Distance: %{x:.1f}cm<br>Reflectance: %{y:.0f}<br>State: %{text}",
        "xaxis": "x5",
        "yaxis": "y5",
    }));

    for g in &groups {
        let xs: Vec<f64> = g.readings.iter().map(|r| r.seconds()).collect();
        let ys: Vec<&str> = vec![g.state; xs.len()];
        out.push(json!({
            "type": "scatter",
            "mode": "markers",
            "name": g.state,
            "legendgroup": g.state,
            "x": xs,
            "y": ys,
            "marker": { "color": g.color.to_string(), "size": 10 },
            "xaxis": "x6",
            "yaxis": "y6",
        }));
    }

    out.extend(box_traces(&groups, "Distance", ("x7", "y7"), |g| {
        g.readings
            .iter()
            .filter(|r| r.has_valid_distance())
            .map(|r| r.distance_cm)
            .collect()
    }));
    out.extend(box_traces(&groups, "Reflectance", ("x8", "y8"), |g| {
        g.readings.iter().map(|r| f64::from(r.reflectance)).collect()
    }));

    out
}

/// Histogram bars plus a Gaussian KDE line scaled to counts. Bars use the
/// same bin edges as the static dashboard so the KDE scale matches them.
fn histogram_traces(
    values: &[f64],
    name: &str,
    color: &str,
    (xaxis, yaxis): (&str, &str),
    config: &RenderConfig,
) -> Vec<Value> {
    let bins = histogram(values, config.histogram_bins);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Vec::new();
    };
    let bin_width = first.width();

    let mut out = vec![json!({
        "type": "histogram",
        "name": format!("{name} Distribution"),
        "x": values,
        "xbins": { "start": first.lo, "end": last.hi, "size": bin_width },
        "marker": { "color": color },
        "opacity": 0.7,
        "xaxis": xaxis,
        "yaxis": yaxis,
    })];

    if let Some(kde) = GaussianKde::new(values) {
        let n = values.len() as f64;
        let xs = linspace(first.lo, last.hi, KDE_POINTS);
        let ys: Vec<f64> = xs.iter().map(|x| kde.density(*x) * n * bin_width).collect();
        out.push(json!({
            "type": "scatter",
            "mode": "lines",
            "name": format!("{name} Density"),
            "x": xs,
            "y": ys,
            "line": { "color": config.density_rgb().to_string(), "width": 2 },
            "xaxis": xaxis,
            "yaxis": yaxis,
        }));
    }
    out
}

/// One box per state with at least one value. Quartiles use linear
/// interpolation and whiskers reach 1.5 x IQR.
fn box_traces(
    groups: &[StateGroup<'_>],
    name: &str,
    (xaxis, yaxis): (&str, &str),
    values: impl Fn(&StateGroup<'_>) -> Vec<f64>,
) -> Vec<Value> {
    groups
        .iter()
        .filter_map(|g| {
            let ys = values(g);
            (!ys.is_empty()).then(|| {
                json!({
                    "type": "box",
                    "name": g.state,
                    "legendgroup": g.state,
                    "showlegend": false,
                    "y": ys,
                    "boxpoints": "outliers",
                    "quartilemethod": "linear",
                    "marker": { "color": g.color.to_string() },
                    "hovertemplate": format!("{name}: %{{y}}"),
                    "xaxis": xaxis,
                    "yaxis": yaxis,
                })
            })
        })
        .collect()
}

/// Layout with the fixed threshold lines on the distance panel.
pub fn layout(config: &RenderConfig) -> Value {
    let theme = config.theme;
    let grid = theme.grid().to_string();

    let threshold = |y: f64, color: &str| {
        json!({
            "type": "line",
            "xref": "x domain",
            "x0": 0,
            "x1": 1,
            "yref": "y",
            "y0": y,
            "y1": y,
            "line": { "color": color, "dash": "dash", "width": 1 },
        })
    };
    let annotation = |y: f64, text: &str| {
        json!({
            "xref": "x domain",
            "x": 1,
            "xanchor": "right",
            "yref": "y",
            "y": y,
            "yanchor": "bottom",
            "text": text,
            "showarrow": false,
        })
    };
    let axis = |title: &str| {
        json!({
            "title": { "text": title },
            "gridcolor": grid,
            "zerolinecolor": grid,
        })
    };

    json!({
        "title": { "text": TITLE },
        "paper_bgcolor": theme.background().to_string(),
        "plot_bgcolor": theme.background().to_string(),
        "font": { "color": theme.foreground().to_string() },
        "height": 1200,
        "showlegend": true,
        "barmode": "overlay",
        "grid": { "rows": 4, "columns": 2, "pattern": "independent" },
        "shapes": [
            threshold(ALERT_THRESHOLD_CM, "red"),
            threshold(IDEAL_BOUNDARY_CM, "green"),
        ],
        "annotations": [
            annotation(ALERT_THRESHOLD_CM, "Alert"),
            annotation(IDEAL_BOUNDARY_CM, "Ideal"),
        ],
        "xaxis": axis("Time (seconds)"),
        "yaxis": axis("Distance (cm)"),
        "xaxis2": axis("Time (seconds)"),
        "yaxis2": axis("Reflectance"),
        "xaxis3": axis("Distance (cm)"),
        "yaxis3": axis("Frequency"),
        "xaxis4": axis("Reflectance"),
        "yaxis4": axis("Frequency"),
        "xaxis5": axis("Distance (cm)"),
        "yaxis5": axis("Reflectance"),
        "xaxis6": axis("Time (seconds)"),
        "yaxis6": axis("State"),
        "xaxis7": axis("State"),
        "yaxis7": axis("Distance (cm)"),
        "xaxis8": axis("State"),
        "yaxis8": axis("Reflectance"),
    })
}

/// Serializes `value` for embedding in an inline `<script>`. A `</` in a
/// string (a state label, say) would otherwise close the script element.
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Full HTML document for `dataset`.
pub fn to_html(dataset: &Dataset, config: &RenderConfig) -> Result<String> {
    let traces = script_json(&Value::Array(traces(dataset, config)))?;
    let layout = script_json(&layout(config))?;
    let background = config.theme.background();

    Ok(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{TITLE}</title>
    <script src="{PLOTLY_CDN}"></script>
    <style>
        body {{ margin: 0; padding: 16px; background: {background}; font-family: -apple-system, 'Segoe UI', system-ui, sans-serif; }}
        #dashboard {{ width: 100%; }}
    </style>
</head>
<body>
<div id="dashboard"></div>
<script>
const traces = {traces};
const layout = {layout};
Plotly.newPlot('dashboard', traces, layout, {{ responsive: true }});
</script>
</body>
</html>
"##
    ))
}

/// Writes the interactive dashboard to `path`, replacing any previous file.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn render_interactive(dataset: &Dataset, config: &RenderConfig, path: &Path) -> Result<()> {
    let html = to_html(dataset, config)?;
    std::fs::write(path, html).map_err(|e| AnalysisError::write(path, e))?;
    info!(path = %path.display(), "Interactive dashboard saved");
    Ok(())
}
