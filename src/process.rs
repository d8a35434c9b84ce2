use chrono::NaiveDateTime;
use clap::{App, Arg, ArgMatches};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use super::VERSION;
use crate::error::{LcError, LcResult};
use crate::input::resolve_input;
use crate::peaks::{elution_volume, find_peaks, Peak};
use crate::plot::{draw_file, plot_path, render_text, PlotFormat};
use crate::{make_window, Chromatogram, DEFAULT_HEIGHT, DEFAULT_WINDOW};

pub const DEFAULT_OUTPUT_DIR: &str = "plots";
pub const TEXT_PLOT_WIDTH: usize = 72;
pub const TEXT_PLOT_HEIGHT: usize = 16;

/// Settings of one run, fixed once the CLI is parsed
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub smooth: bool,
    pub save_plots: bool,
    pub window: usize,
    pub height: f64,
    pub output_dir: PathBuf,
    pub format: PlotFormat,
    pub summary: Option<PathBuf>,
}

impl RunConfig {
    pub fn new<P: Into<PathBuf>>(input: P) -> RunConfig {
        RunConfig {
            input: input.into(),
            smooth: false,
            save_plots: false,
            window: DEFAULT_WINDOW,
            height: DEFAULT_HEIGHT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            format: PlotFormat::Svg,
            summary: None,
        }
    }
}

fn is_usize(v: String) -> Result<(), String> {
    v.parse::<usize>().map(|_| ()).map_err(|e| e.to_string())
}

fn is_f64(v: String) -> Result<(), String> {
    v.parse::<f64>().map(|_| ()).map_err(|e| e.to_string())
}

pub fn build_cli<'a, 'b>() -> App<'a, 'b> {
    let arg_data = Arg::with_name("data")
        .help("txt file, or flat folder of txt files, to process")
        .short("d")
        .long("data")
        .alias("data-path")
        .takes_value(true)
        .required(true);
    let arg_smooth = Arg::with_name("smooth")
        .help("smooth the signal with a moving average before peak detection")
        .long("smooth")
        .alias("smoothing")
        .takes_value(false);
    let arg_save = Arg::with_name("save_plots")
        .help("save the plots to the output folder instead of printing them")
        .long("save-plots")
        .alias("save-plot")
        .takes_value(false);
    let arg_window = Arg::with_name("window")
        .help("number of samples in the moving average window, odd")
        .short("w")
        .long("window")
        .takes_value(true)
        .validator(is_usize)
        .default_value("11");
    let arg_height = Arg::with_name("height")
        .help("minimum value for a sample to be considered a peak")
        .long("height")
        .takes_value(true)
        .allow_hyphen_values(true)
        .validator(is_f64)
        .default_value("0");
    let arg_outdir = Arg::with_name("output_dir")
        .help("folder for the saved plots, created if missing")
        .short("o")
        .long("output-dir")
        .takes_value(true)
        .default_value(DEFAULT_OUTPUT_DIR);
    let arg_format = Arg::with_name("format")
        .help("image format of the saved plots")
        .long("format")
        .takes_value(true)
        .possible_values(&["svg", "png"])
        .default_value("svg");
    let arg_summary = Arg::with_name("summary")
        .help("csv file for the per-file peak summary")
        .long("summary")
        .takes_value(true);
    App::new("lc_run")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to smooth, find peaks in, and plot LC chromatograms")
        .arg(arg_data)
        .arg(arg_smooth)
        .arg(arg_save)
        .arg(arg_window)
        .arg(arg_height)
        .arg(arg_outdir)
        .arg(arg_format)
        .arg(arg_summary)
}

/// Takes the CLI arguments to set the run parameters.
pub fn parse_cli() -> LcResult<RunConfig> {
    let cli_args = build_cli().get_matches();
    config_from_matches(&cli_args)
}

pub fn config_from_matches(cli_args: &ArgMatches) -> LcResult<RunConfig> {
    let input = PathBuf::from(cli_args.value_of("data").unwrap_or_default());
    let window = cli_args
        .value_of("window")
        .unwrap_or_default()
        .parse::<usize>()
        .map_err(|_| LcError::InvalidWindow(0))?;
    make_window(window)?;
    let height = cli_args
        .value_of("height")
        .unwrap_or_default()
        .parse::<f64>()
        .unwrap_or(DEFAULT_HEIGHT);
    let format = cli_args
        .value_of("format")
        .unwrap_or_default()
        .parse::<PlotFormat>()
        .unwrap_or(PlotFormat::Svg);
    Ok(RunConfig {
        input,
        smooth: cli_args.is_present("smooth"),
        save_plots: cli_args.is_present("save_plots"),
        window,
        height,
        output_dir: PathBuf::from(cli_args.value_of("output_dir").unwrap_or(DEFAULT_OUTPUT_DIR)),
        format,
        summary: cli_args.value_of("summary").map(PathBuf::from),
    })
}

/// A loaded chromatogram with its peaks
#[derive(Debug, Clone)]
pub struct Processed {
    pub chromatogram: Chromatogram,
    pub peaks: Vec<Peak>,
    pub elution_volume: f64,
}

/// Outcome of one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub name: String,
    pub samples: usize,
    pub peaks: usize,
    pub elution_volume: f64,
    pub injected: Option<NaiveDateTime>,
    pub plot: Option<PathBuf>,
}

impl std::fmt::Display for FileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} samples, {} peaks, elution volume {:.6}",
            self.name, self.samples, self.peaks, self.elution_volume
        )?;
        if let Some(p) = &self.plot {
            write!(f, ", plot {}", p.display())?;
        }
        Ok(())
    }
}

/// load, smooth if requested, find the peaks and integrate them on the raw values
pub fn prepare(fin: &Path, config: &RunConfig) -> LcResult<Processed> {
    let mut chromatogram = Chromatogram::from_txt(fin)?;
    if config.smooth {
        chromatogram.smooth(config.window)?;
    }
    let peaks = find_peaks(chromatogram.signal(), config.height);
    let elution_volume = elution_volume(&chromatogram.time, &chromatogram.value, &peaks);
    Ok(Processed {
        chromatogram,
        peaks,
        elution_volume,
    })
}

/// prepare one file, then save its plot or print it to the terminal
pub fn process_file(fin: &Path, config: &RunConfig) -> LcResult<FileReport> {
    let p = prepare(fin, config)?;
    let c = &p.chromatogram;
    let plot = if config.save_plots {
        let fout = plot_path(&config.output_dir, &c.name, config.format);
        draw_file(c, &p.peaks, &fout, config.format)?;
        info!("saved plot {}", fout.display());
        Some(fout)
    } else {
        print!(
            "{}",
            render_text(c, &p.peaks, TEXT_PLOT_WIDTH, TEXT_PLOT_HEIGHT)
        );
        None
    };
    Ok(FileReport {
        name: c.name.clone(),
        samples: c.len(),
        peaks: p.peaks.len(),
        elution_volume: p.elution_volume,
        injected: c.metadata.injection_datetime(),
        plot,
    })
}

/// Process every file of the input, stopping at the first error.
pub fn run(config: &RunConfig) -> LcResult<Vec<FileReport>> {
    make_window(config.window)?;
    let files = resolve_input(&config.input)?;
    info!(
        "processing {} file(s) from {}",
        files.len(),
        config.input.display()
    );
    if config.save_plots {
        fs::create_dir_all(&config.output_dir).map_err(|e| LcError::io(&config.output_dir, e))?;
    }
    let mut reports = Vec::with_capacity(files.len());
    for f in files.iter() {
        info!("processing file: {}", f.display());
        let report = process_file(f, config)?;
        println!("{}", report);
        reports.push(report);
    }
    if let Some(fout) = &config.summary {
        write_summary(&reports, fout)?;
        info!("wrote summary to {}", fout.display());
    }
    Ok(reports)
}

pub const SUMMARY_HEADER: [&str; 5] = [
    "file",
    "samples",
    "peaks",
    "elution_volume",
    "injection_datetime",
];

/// writes one csv row per report at the given path, creating its folder if needed
pub fn write_summary(reports: &[FileReport], fout: &Path) -> LcResult<()> {
    if let Some(parent) = fout.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LcError::io(parent, e))?;
    }
    let to_io = |e: csv::Error| LcError::io(fout, e.into());
    let mut writer = csv::Writer::from_path(fout).map_err(to_io)?;
    writer.write_record(&SUMMARY_HEADER).map_err(to_io)?;
    for r in reports.iter() {
        let injected = r
            .injected
            .map(|dt| dt.format(crate::DT_FORMAT).to_string())
            .unwrap_or_default();
        writer
            .write_record(&[
                r.name.clone(),
                r.samples.to_string(),
                r.peaks.to_string(),
                r.elution_volume.to_string(),
                injected,
            ])
            .map_err(to_io)?;
    }
    writer.flush().map_err(|e| LcError::io(fout, e))
}
