//! Metadata sections of the instrument text export.
//!
//! Before the `Chromatogram Data:` block the export lists three sections of
//! `key<TAB>value` lines. Only the keys known for each section are kept.
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, trace};
use std::collections::BTreeMap;

pub const INJECTION_HEADER: &str = "Injection Information:";
pub const CHROMATOGRAM_DATA_HEADER: &str = "Chromatogram Data Information:";
pub const SIGNAL_PARAMETER_HEADER: &str = "Signal Parameter Information:";

pub const INJECTION_KEYS: &[&str] = &[
    "Data Vault",
    "Injection",
    "Injection Number",
    "Position",
    "Comment",
    "Processing Method",
    "Instrument Method",
    "Type",
    "Status",
    "Injection Date",
    "Injection Time",
    "Injection Volume (µL)",
    "Dilution Factor",
    "Weight",
];

pub const CHROMATOGRAM_DATA_KEYS: &[&str] = &[
    "Time Min. (min)",
    "Time Max. (min)",
    "Data Points",
    "Detector",
    "Generating Data System",
    "Exporting Data System",
    "Operator",
    "Signal Quantity",
    "Signal Unit",
    "Signal Min.",
    "Signal Max.",
    "Channel",
    "Driver Name",
    "Channel Type",
    "Min. Step (s)",
    "Max. Step (s)",
    "Average Step (s)",
];

pub const SIGNAL_PARAMETER_KEYS: &[&str] = &["Signal Info"];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%I:%M:%S %p", "%H:%M"];

/// The sections of the export header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Injection,
    ChromatogramData,
    SignalParameter,
}

impl Section {
    /// Recognise a section header line
    pub fn from_header(line: &str) -> Option<Section> {
        match line.trim() {
            INJECTION_HEADER => Some(Section::Injection),
            CHROMATOGRAM_DATA_HEADER => Some(Section::ChromatogramData),
            SIGNAL_PARAMETER_HEADER => Some(Section::SignalParameter),
            _ => None,
        }
    }

    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Section::Injection => INJECTION_KEYS,
            Section::ChromatogramData => CHROMATOGRAM_DATA_KEYS,
            Section::SignalParameter => SIGNAL_PARAMETER_KEYS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub injection: BTreeMap<String, String>,
    pub chromatogram_data: BTreeMap<String, String>,
    pub signal_parameter: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Metadata {
        Metadata::default()
    }

    pub fn is_empty(&self) -> bool {
        self.injection.is_empty()
            && self.chromatogram_data.is_empty()
            && self.signal_parameter.is_empty()
    }

    pub fn section_mut(&mut self, section: Section) -> &mut BTreeMap<String, String> {
        match section {
            Section::Injection => &mut self.injection,
            Section::ChromatogramData => &mut self.chromatogram_data,
            Section::SignalParameter => &mut self.signal_parameter,
        }
    }

    /// Add one `key<TAB>value` line to the given section,
    /// ignoring blank lines, lines without a tab and unknown keys.
    pub fn push_line(&mut self, section: Section, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let (key, value) = match line.split_once('\t') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => {
                debug!("skipping metadata line without a tab: {:?}", line);
                return;
            }
        };
        if section.keys().contains(&key) {
            self.section_mut(section)
                .insert(key.to_string(), value.to_string());
        } else {
            trace!("ignoring unknown {:?} key {:?}", section, key);
        }
    }

    pub fn injection_name(&self) -> Option<&str> {
        self.injection.get("Injection").map(|s| s.as_str())
    }

    /// injection volume in µL
    pub fn injection_volume(&self) -> Option<f64> {
        parse_number(self.injection.get("Injection Volume (µL)")?)
    }

    pub fn injection_datetime(&self) -> Option<NaiveDateTime> {
        let date = parse_date(self.injection.get("Injection Date")?)?;
        let time = parse_time(self.injection.get("Injection Time")?)?;
        Some(date.and_time(time))
    }

    /// number of samples declared by the export
    pub fn data_points(&self) -> Option<usize> {
        let raw = self.chromatogram_data.get("Data Points")?;
        raw.replace(',', "").trim().parse().ok()
    }

    pub fn signal_unit(&self) -> Option<&str> {
        self.chromatogram_data
            .get("Signal Unit")
            .map(|s| s.as_str())
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s.trim(), f).ok())
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(s.trim(), f).ok())
}
