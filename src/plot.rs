use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{LcError, LcResult};
use crate::min_and_max;
use crate::peaks::Peak;
use crate::Chromatogram;

const PLOT_SIZE: (u32, u32) = (1200, 600);
const ORANGE: RGBColor = RGBColor(255, 140, 0);

/// image format of the saved plots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotFormat {
    Svg,
    Png,
}

impl PlotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PlotFormat::Svg => "svg",
            PlotFormat::Png => "png",
        }
    }
}

impl FromStr for PlotFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(PlotFormat::Svg),
            "png" => Ok(PlotFormat::Png),
            other => Err(format!("unsupported plot format {}", other)),
        }
    }
}

/// `<output_dir>/<name>.<ext>`
pub fn plot_path(output_dir: &Path, name: &str, format: PlotFormat) -> PathBuf {
    output_dir.join(format!("{}.{}", name, format.extension()))
}

/// plots the chromatogram, its smoothed version and the peaks to fout
pub fn draw_file(c: &Chromatogram, peaks: &[Peak], fout: &Path, format: PlotFormat) -> LcResult<()> {
    let res = match format {
        PlotFormat::Svg => draw_on(SVGBackend::new(fout, PLOT_SIZE).into_drawing_area(), c, peaks),
        PlotFormat::Png => draw_on(BitMapBackend::new(fout, PLOT_SIZE).into_drawing_area(), c, peaks),
    };
    res.map_err(|e| LcError::Plot {
        path: fout.to_path_buf(),
        message: e.to_string(),
    })
}

fn draw_on<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    c: &Chromatogram,
    peaks: &[Peak],
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let (ylow, yhigh) = y_axis(c).ok_or_else(|| {
        format!("y range of {} does not fit in a finite axis", c.name)
    })?;
    let xmax = (c.len().max(2) - 1) as f64;
    let y_desc = match c.metadata.signal_unit() {
        Some(u) => format!("value [{}]", u),
        None => String::from("value"),
    };

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&c.name, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..xmax, ylow..yhigh)?;
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
        .label_style(("sans-serif", 16))
        .x_desc("index")
        .y_desc(y_desc)
        .draw()?;

    chart
        .draw_series(
            segments(&c.value)
                .into_iter()
                .map(|s| PathElement::new(s, BLUE.stroke_width(1))),
        )?
        .label("original signal")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    if let Some(smoothed) = &c.smoothed {
        chart
            .draw_series(
                segments(smoothed)
                    .into_iter()
                    .map(|s| PathElement::new(s, ORANGE.stroke_width(2))),
            )?
            .label("smoothed signal")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE.stroke_width(2)));
    }

    if !peaks.is_empty() {
        let signal = c.signal();
        chart
            .draw_series(
                peaks
                    .iter()
                    .map(|p| Circle::new((p.index as f64, signal[p.index]), 5, RED.stroke_width(2))),
            )?
            .label("peaks")
            .legend(|(x, y)| Circle::new((x + 10, y), 5, RED.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// y range with a 10% margin on each side, None when the axis
/// bounds or their span are not finite
fn y_axis(c: &Chromatogram) -> Option<(f64, f64)> {
    let (ymin, ymax) = y_range(c);
    let margin = ymax / 10. - ymin / 10.;
    let (low, high) = (ymin - margin, ymax + margin);
    if low.is_finite() && high.is_finite() && (high - low).is_finite() {
        Some((low, high))
    } else {
        None
    }
}

/// y range over raw and smoothed values, never empty
fn y_range(c: &Chromatogram) -> (f64, f64) {
    let raw = min_and_max(&c.value);
    let smooth = c.smoothed.as_ref().and_then(|s| min_and_max(s));
    let (ymin, ymax) = match (raw, smooth) {
        (Some(r), Some(s)) => (r.0.min(s.0), r.1.max(s.1)),
        (Some(r), None) => r,
        (None, Some(s)) => s,
        (None, None) => (0., 1.),
    };
    if ymin == ymax {
        (ymin - 1., ymax + 1.)
    } else {
        (ymin, ymax)
    }
}

/// (index, value) runs split at the NAN gaps
fn segments(v: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut segs = Vec::new();
    let mut current = Vec::new();
    for (i, &y) in v.iter().enumerate() {
        if y.is_nan() {
            if !current.is_empty() {
                segs.push(std::mem::take(&mut current));
            }
        } else {
            current.push((i as f64, y));
        }
    }
    if !current.is_empty() {
        segs.push(current);
    }
    segs
}

/// Character plot of the signal for the terminal, `*` marks the peak apexes.
pub fn render_text(c: &Chromatogram, peaks: &[Peak], width: usize, height: usize) -> String {
    let signal = c.signal();
    let title = match c.smoothed {
        Some(_) => format!("{} (smoothed)\n", c.name),
        None => format!("{}\n", c.name),
    };
    let (min, max) = match min_and_max(signal) {
        Some(mm) => mm,
        None => return format!("{}no valid samples\n", title),
    };
    let width = width.max(2);
    let height = height.max(2);
    let n = signal.len();
    let col = |i: usize| if n == 1 { 0 } else { i * (width - 1) / (n - 1) };
    let row = |v: f64| {
        if max == min {
            height / 2
        } else {
            ((max - v) / (max - min) * (height - 1) as f64).round() as usize
        }
    };

    let mut grid = vec![vec![' '; width]; height];
    for (i, &v) in signal.iter().enumerate() {
        if !v.is_nan() {
            grid[row(v)][col(i)] = '.';
        }
    }
    for p in peaks.iter() {
        grid[row(signal[p.index])][col(p.index)] = '*';
    }

    let mut out = title;
    for (r, line) in grid.iter().enumerate() {
        let label = if r == 0 {
            format!("{:>10.3}", max)
        } else if r == height - 1 {
            format!("{:>10.3}", min)
        } else {
            " ".repeat(10)
        };
        out.push_str(&format!("{} |{}\n", label, line.iter().collect::<String>()));
    }
    out.push_str(&format!("{} +{}\n", " ".repeat(10), "-".repeat(width)));
    out.push_str(&format!(
        "{:>12}{:>w$}\n",
        0,
        n - 1,
        w = width - 1
    ));
    out
}
