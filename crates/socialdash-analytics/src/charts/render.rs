//! SVG rendering of the three dashboard charts.

use std::fmt::Display;
use std::ops::Range;

use plotters::prelude::*;

use super::data::{GroupedBars, OlsFit, ScatterData};
use crate::error::AnalyticsError;

/// Width and height, in pixels, of every chart.
pub const CHART_SIZE: (u32, u32) = (600, 300);

/// Horizontal units reserved per platform on the bar chart axis.
const PLATFORM_SPAN: i32 = 100;
/// Share of [`PLATFORM_SPAN`] covered by bars.
const BAR_GROUP_WIDTH: i32 = 80;

const REGRESSION_SAMPLES: u32 = 50;

fn failed<E: Display>(chart: &'static str) -> impl Fn(E) -> AnalyticsError {
    move |e| AnalyticsError::Chart {
        chart,
        reason: e.to_string(),
    }
}

/// Grouped bars: one group per platform, one bar per post type.
///
/// # Errors
///
/// Returns [`AnalyticsError::Chart`] if plotters fails to draw.
pub fn platform_comparison_svg(bars: &GroupedBars) -> Result<String, AnalyticsError> {
    const CHART: &str = "platform comparison";

    let platforms = i32::try_from(bars.platforms.len().max(1))
        .map_err(|_| AnalyticsError::InvalidParameter("too many platforms".to_string()))?;
    let post_types = i32::try_from(bars.post_types.len().max(1))
        .map_err(|_| AnalyticsError::InvalidParameter("too many post types".to_string()))?;
    let bar_width = (BAR_GROUP_WIDTH / post_types).max(1);
    let y_max = bars.max_mean().unwrap_or(0.0).max(1.0) * 1.1;

    let platform_label = |x: &i32| -> String {
        if x.rem_euclid(PLATFORM_SPAN) != 0 {
            return String::new();
        }
        usize::try_from(x / PLATFORM_SPAN)
            .ok()
            .and_then(|i| bars.platforms.get(i))
            .cloned()
            .unwrap_or_default()
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(failed(CHART))?;

        let half = PLATFORM_SPAN / 2;
        let mut chart = ChartBuilder::on(&root)
            .caption("Engagement by Platform & Post Type", ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(55)
            .build_cartesian_2d(-half..(platforms * PLATFORM_SPAN - half), 0.0..y_max)
            .map_err(failed(CHART))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.platforms.len().max(1))
            .x_label_formatter(&platform_label)
            .x_desc("platform")
            .y_desc("mean total_engagement")
            .draw()
            .map_err(failed(CHART))?;

        for (t, post_type) in bars.post_types.iter().enumerate() {
            let color = Palette99::pick(t);
            let offset = i32::try_from(t).unwrap_or(0) * bar_width - BAR_GROUP_WIDTH / 2;
            let rects = bars.means.iter().enumerate().filter_map(|(p, means)| {
                let mean = means.get(t).copied().flatten()?;
                let left = i32::try_from(p).ok()? * PLATFORM_SPAN + offset;
                Some(Rectangle::new(
                    [(left, 0.0), (left + bar_width, mean)],
                    color.filled(),
                ))
            });
            chart
                .draw_series(rects)
                .map_err(failed(CHART))?
                .label(post_type.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], Palette99::pick(t).filled())
                });
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.4))
            .draw()
            .map_err(failed(CHART))?;
        root.present().map_err(failed(CHART))?;
    }
    Ok(svg)
}

/// Likes against comments, marker size by views, color by platform.
///
/// # Errors
///
/// Returns [`AnalyticsError::Chart`] if plotters fails to draw.
pub fn engagement_trends_svg(data: &ScatterData) -> Result<String, AnalyticsError> {
    const CHART: &str = "engagement trends";

    let x_range = padded_range(data.markers.iter().map(|m| m.x));
    let y_range = padded_range(data.markers.iter().map(|m| m.y));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(failed(CHART))?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Likes vs Comments", ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(55)
            .build_cartesian_2d(x_range, y_range)
            .map_err(failed(CHART))?;

        chart
            .configure_mesh()
            .x_desc("likes")
            .y_desc("comments")
            .draw()
            .map_err(failed(CHART))?;

        for (g, platform) in data.groups.iter().enumerate() {
            let color = Palette99::pick(g).mix(0.7);
            chart
                .draw_series(
                    data.markers
                        .iter()
                        .filter(|m| m.group == g)
                        .map(move |m| Circle::new((m.x, m.y), m.radius, color.filled())),
                )
                .map_err(failed(CHART))?
                .label(platform.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.4))
            .draw()
            .map_err(failed(CHART))?;
        root.present().map_err(failed(CHART))?;
    }
    Ok(svg)
}

/// Post length against engagement rate with the fitted line and its 95%
/// band. Without a fit only the points are drawn.
///
/// # Errors
///
/// Returns [`AnalyticsError::Chart`] if plotters fails to draw.
pub fn content_length_svg(
    points: &[(f64, f64)],
    fit: Option<&OlsFit>,
) -> Result<String, AnalyticsError> {
    const CHART: &str = "content length";

    let x_range = padded_range(points.iter().map(|p| p.0));
    let xs = sample_points(&x_range);
    let band: Vec<(f64, f64, f64)> = fit
        .map(|fit| {
            xs.iter()
                .filter_map(|&x| fit.confidence_band(x).map(|(lo, hi)| (x, lo, hi)))
                .collect()
        })
        .unwrap_or_default();
    let line: Vec<(f64, f64)> = fit
        .map(|fit| xs.iter().map(|&x| (x, fit.predict(x))).collect())
        .unwrap_or_default();

    let y_range = padded_range(
        points
            .iter()
            .map(|p| p.1)
            .chain(line.iter().map(|p| p.1))
            .chain(band.iter().flat_map(|b| [b.1, b.2])),
    );

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(failed(CHART))?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Post Length vs Engagement Rate", ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(55)
            .build_cartesian_2d(x_range, y_range)
            .map_err(failed(CHART))?;

        chart
            .configure_mesh()
            .x_desc("post_length")
            .y_desc("engagement_rate")
            .draw()
            .map_err(failed(CHART))?;

        if !band.is_empty() {
            let mut outline: Vec<(f64, f64)> = band.iter().map(|b| (b.0, b.2)).collect();
            outline.extend(band.iter().rev().map(|b| (b.0, b.1)));
            chart
                .draw_series(std::iter::once(Polygon::new(outline, RED.mix(0.15).filled())))
                .map_err(failed(CHART))?;
        }

        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.5).filled())),
            )
            .map_err(failed(CHART))?;

        if !line.is_empty() {
            chart
                .draw_series(LineSeries::new(line, RED.stroke_width(2)))
                .map_err(failed(CHART))?
                .label("least-squares fit")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK.mix(0.4))
                .draw()
                .map_err(failed(CHART))?;
        }
        root.present().map_err(failed(CHART))?;
    }
    Ok(svg)
}

/// Data extent padded by 5% on each side; a unit range when there is no data.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return 0.0..1.0;
    }
    let pad = if max > min {
        (max - min) * 0.05
    } else {
        max.abs().max(1.0) * 0.5
    };
    (min - pad)..(max + pad)
}

fn sample_points(range: &Range<f64>) -> Vec<f64> {
    let step = (range.end - range.start) / f64::from(REGRESSION_SAMPLES);
    (0..=REGRESSION_SAMPLES)
        .map(|i| range.start + step * f64::from(i))
        .collect()
}
