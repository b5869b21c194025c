use std::path::{Path, PathBuf};

use chrono::Datelike;
use moodtrack_core::{Metric, Record};
use plotters::prelude::*;

use crate::{GraphError, Month};

/// Chart rendering, one file per month. Behind a trait so the graphing
/// flow can be exercised without a drawing backend.
pub trait Renderer: Send + Sync {
    /// Render `records` for `month` into `out_dir` and return the file.
    fn render(
        &self,
        metrics: &[Metric],
        records: &[Record],
        month: Month,
        out_dir: &Path,
    ) -> Result<PathBuf, GraphError>;
}

/// Per-day averages of one metric over a month: `(day of month, average)`.
///
/// Multiple records on the same day collapse into their mean, matching how
/// the chart treats a day as one data point.
pub fn daily_averages(records: &[Record], metric_name: &str) -> Vec<(u32, f64)> {
    let mut by_day: Vec<(u32, i64, u32)> = Vec::new();
    for record in records {
        let Some(value) = record.value(metric_name) else { continue };
        let day = record.timestamp.day();
        match by_day.iter_mut().find(|(d, _, _)| *d == day) {
            Some((_, sum, count)) => {
                *sum += value;
                *count += 1;
            },
            None => by_day.push((day, value, 1)),
        }
    }
    by_day.sort_by_key(|&(day, _, _)| day);
    by_day
        .into_iter()
        .map(|(day, sum, count)| (day, sum as f64 / f64::from(count)))
        .collect()
}

/// SVG line chart: one line per metric, day of month on the x axis.
#[derive(Debug, Default)]
pub struct SvgRenderer;

impl Renderer for SvgRenderer {
    fn render(
        &self,
        metrics: &[Metric],
        records: &[Record],
        month: Month,
        out_dir: &Path,
    ) -> Result<PathBuf, GraphError> {
        std::fs::create_dir_all(out_dir)
            .map_err(|source| GraphError::Io { path: out_dir.to_path_buf(), source })?;

        let user_id = records.first().map_or(0, |r| r.user_id);
        let path = out_dir.join(format!("{user_id}_{month}.svg"));

        let series: Vec<(&Metric, Vec<(u32, f64)>)> = metrics
            .iter()
            .map(|m| (m, daily_averages(records, &m.name)))
            .filter(|(_, points)| !points.is_empty())
            .collect();

        let (mut lo, mut hi) = (f64::MAX, f64::MIN);
        for (_, points) in &series {
            for &(_, value) in points {
                lo = lo.min(value);
                hi = hi.max(value);
            }
        }
        if series.is_empty() {
            lo = 0.0;
            hi = 1.0;
        }

        {
            let root = SVGBackend::new(&path, (1000, 600)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| GraphError::Render(e.to_string()))?;

            let mut chart = ChartBuilder::on(&root)
                .caption(month.to_string(), ("sans-serif", 32))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(40)
                .build_cartesian_2d(1.0..f64::from(month.days()), (lo - 1.0)..(hi + 1.0))
                .map_err(|e| GraphError::Render(e.to_string()))?;

            chart
                .configure_mesh()
                .x_desc("day")
                .draw()
                .map_err(|e| GraphError::Render(e.to_string()))?;

            for (index, (metric, points)) in series.iter().enumerate() {
                let color = Palette99::pick(index).to_rgba();
                chart
                    .draw_series(LineSeries::new(
                        points.iter().map(|&(day, value)| (f64::from(day), value)),
                        color.stroke_width(2),
                    ))
                    .map_err(|e| GraphError::Render(e.to_string()))?
                    .label(metric.name.clone())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                    });
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| GraphError::Render(e.to_string()))?;

            root.present().map_err(|e| GraphError::Render(e.to_string()))?;
        }

        tracing::info!(path = %path.display(), "rendered monthly graph");
        Ok(path)
    }
}
