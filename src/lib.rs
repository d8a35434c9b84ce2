use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
pub mod error;
pub mod input;
pub mod metadata;
pub mod peaks;
pub mod plot;
pub mod process;

pub use error::{LcError, LcResult};
use metadata::{Metadata, Section};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// string used by the instrument export for a missing sample
pub const NA_STR: &str = "n.a.";
/// header line that starts the data rows of an instrument export
pub const DATA_HEADER: &str = "Chromatogram Data:";

pub const DEFAULT_WINDOW: usize = 11;
pub const DEFAULT_HEIGHT: f64 = 0.;

/// The main struct for one chromatogram (data series).
/// `time`, `step` and `value` always have the same length,
/// missing samples are NAN.
#[derive(Debug, Clone)]
pub struct Chromatogram {
    pub name: String,
    pub metadata: Metadata,
    pub time: Vec<f64>,
    pub step: Vec<f64>,
    pub value: Vec<f64>,
    pub smoothed: Option<Vec<f64>>,
}

impl Chromatogram {
    pub fn new(name: &str, capacity: usize) -> Chromatogram {
        Chromatogram {
            name: name.to_string(),
            metadata: Metadata::new(),
            time: Vec::with_capacity(capacity),
            step: Vec::with_capacity(capacity),
            value: Vec::with_capacity(capacity),
            smoothed: None,
        }
    }

    /// Init a Chromatogram from a bare list of values, time is the sample index
    #[cfg(test)]
    pub(crate) fn from_values(name: &str, values: &[f64]) -> Chromatogram {
        let mut c = Chromatogram::new(name, values.len());
        for (i, &v) in values.iter().enumerate() {
            c.push(i as f64, f64::NAN, v);
        }
        c
    }

    fn push(&mut self, t: f64, s: f64, v: f64) {
        self.time.push(t);
        self.step.push(s);
        self.value.push(v);
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Init a Chromatogram from a txt file, either an instrument export
    /// (metadata sections followed by `Chromatogram Data:`) or a plain series.
    /// The name is the file stem.
    pub fn from_txt(fin: &Path) -> LcResult<Chromatogram> {
        let file = File::open(fin).map_err(|e| LcError::io(fin, e))?;
        let buf = BufReader::new(file);
        let lines = buf
            .lines()
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| LcError::io(fin, e))?;
        let name = fin
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        Chromatogram::from_lines(&name, &lines).map_err(|e| e.at(fin))
    }

    /// same as `from_txt` for text already in memory
    pub fn from_text(name: &str, text: &str) -> LcResult<Chromatogram> {
        let lines: Vec<&str> = text.lines().collect();
        Chromatogram::from_lines(name, &lines).map_err(|e| e.at(&PathBuf::from(name)))
    }

    fn from_lines<S: AsRef<str>>(name: &str, lines: &[S]) -> Result<Chromatogram, RowError> {
        let data_start = lines.iter().position(|l| l.as_ref().trim() == DATA_HEADER);
        let c = match data_start {
            Some(i) => Chromatogram::from_export(name, lines, i)?,
            None => Chromatogram::from_plain(name, lines)?,
        };
        if c.is_empty() {
            return Err(RowError::new(None, "no samples found"));
        }
        Ok(c)
    }

    /// metadata sections up to `data_start`, then one header line, then rows of time, step, value
    fn from_export<S: AsRef<str>>(
        name: &str,
        lines: &[S],
        data_start: usize,
    ) -> Result<Chromatogram, RowError> {
        let mut c = Chromatogram::new(name, lines.len() - data_start);
        let mut section: Option<Section> = None;
        for l in lines[..data_start].iter() {
            let l = l.as_ref();
            if let Some(s) = Section::from_header(l) {
                section = Some(s);
            } else if let Some(s) = section {
                c.metadata.push_line(s, l);
            }
        }
        for (n, l) in lines.iter().enumerate().skip(data_start + 2) {
            let l = l.as_ref();
            if l.trim().is_empty() {
                continue;
            }
            let cols: Vec<&str> = l.split('\t').collect();
            if cols.len() < 3 {
                return Err(RowError::new(
                    Some(n + 1),
                    format!("expected time, step and value columns, found {}", cols.len()),
                ));
            }
            let t = parse_sample(cols[0], n + 1)?;
            let s = parse_sample(cols[1], n + 1)?;
            let v = parse_sample(cols[2], n + 1)?;
            c.push(t, s, v);
        }
        match c.metadata.data_points() {
            Some(dp) if dp != c.len() => warn!(
                "{}: export declares {} data points but {} rows were read",
                name,
                dp,
                c.len()
            ),
            _ => {}
        }
        debug!("{}: read {} rows from instrument export", name, c.len());
        Ok(c)
    }

    /// one sample per line: value, time value, or time step value
    fn from_plain<S: AsRef<str>>(name: &str, lines: &[S]) -> Result<Chromatogram, RowError> {
        let mut c = Chromatogram::new(name, lines.len());
        for (n, l) in lines.iter().enumerate() {
            let l = l.as_ref().trim();
            if l.is_empty() || l.starts_with('#') {
                continue;
            }
            let cols: Vec<&str> = l.split_whitespace().collect();
            let idx = c.len() as f64;
            match cols[..] {
                [v] => c.push(idx, f64::NAN, parse_sample(v, n + 1)?),
                [t, v] => c.push(parse_sample(t, n + 1)?, f64::NAN, parse_sample(v, n + 1)?),
                [t, s, v] => c.push(
                    parse_sample(t, n + 1)?,
                    parse_sample(s, n + 1)?,
                    parse_sample(v, n + 1)?,
                ),
                _ => {
                    return Err(RowError::new(
                        Some(n + 1),
                        format!("expected 1 to 3 columns, found {}", cols.len()),
                    ))
                }
            }
        }
        debug!("{}: read {} samples from plain series", name, c.len());
        Ok(c)
    }

    /// replaces the smoothed series with the moving average of the values
    pub fn smooth(&mut self, window: usize) -> LcResult<()> {
        let w = make_window(window)?;
        self.smoothed = Some(mavg(&self.value[..], &w));
        Ok(())
    }

    /// the series used downstream: smoothed when available, raw otherwise
    pub fn signal(&self) -> &[f64] {
        match &self.smoothed {
            Some(s) => &s[..],
            None => &self.value[..],
        }
    }
}

/// parse failure before the path is known
#[derive(Debug)]
struct RowError {
    line: Option<usize>,
    message: String,
}

impl RowError {
    fn new<S: Into<String>>(line: Option<usize>, message: S) -> RowError {
        RowError {
            line,
            message: message.into(),
        }
    }

    fn at(self, path: &Path) -> LcError {
        LcError::parse(path, self.line, self.message)
    }
}

fn parse_sample(s: &str, line: usize) -> Result<f64, RowError> {
    let s = s.trim();
    if s == NA_STR {
        return Ok(f64::NAN);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RowError::new(
            Some(line),
            format!("'{}' is not a finite number", s),
        )),
    }
}

/// min and max of a slice, ignoring NAN; None if there is no valid value
pub fn min_and_max(s: &[f64]) -> Option<(f64, f64)> {
    let mut self_iter = s.iter().filter(|v| !v.is_nan());
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// flat moving average window with `size` equal weights summing to 1
pub fn make_window(size: usize) -> LcResult<Vec<f64>> {
    if size < 3 || size % 2 == 0 {
        return Err(LcError::InvalidWindow(size));
    }
    Ok(vec![1. / size as f64; size])
}

/// rolls the weighted moving window w over the data v.
/// Samples outside the series and NAN samples are skipped and the
/// average is normalized by the weight actually used, so the window
/// shrinks at the edges and the output has the length of v.
/// All missing under the window gives NAN.
pub fn mavg(v: &[f64], w: &[f64]) -> Vec<f64> {
    let len_v = v.len() as i64;
    let side = (w.len() as i64 - 1) / 2;
    let mut vout: Vec<f64> = Vec::with_capacity(v.len());
    for i in 0..len_v {
        let mut sum_ve_we = 0.;
        let mut sum_we = 0.;
        for (j, we) in (i - side..=i + side).zip(w.iter()) {
            if j < 0 || j >= len_v {
                continue;
            }
            let ve = v[j as usize];
            if ve.is_nan() {
                continue;
            }
            sum_ve_we += ve * we;
            sum_we += we;
        }
        if sum_we > 0. {
            vout.push(sum_ve_we / sum_we);
        } else {
            vout.push(f64::NAN);
        }
    }
    vout
}
