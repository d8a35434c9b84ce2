use lc_lpp::plot::PlotFormat;
use lc_lpp::process::{prepare, run, RunConfig};
use lc_lpp::{min_and_max, LcError};
use std::fs;
use std::path::PathBuf;
use std::process::Command;

const EXPORT: &str = "Injection Information:
Injection\tlysozyme
Injection Date\t2024-02-01
Injection Time\t09:30:00
Injection Volume (µL)\t10.0

Chromatogram Data Information:
Data Points\t9
Signal Unit\tmAU

Chromatogram Data:
Time (min)\tStep (s)\tValue (mAU)
0.0\tn.a.\t0.0
0.5\t30.0\t0.0
1.0\t30.0\t2.0
1.5\t30.0\t6.0
2.0\t30.0\t2.0
2.5\t30.0\t0.0
3.0\t30.0\t0.0
3.5\t30.0\t0.0
4.0\t30.0\t0.0
";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lc_lpp_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn noisy(n: usize) -> String {
    (0..n)
        .map(|i| {
            let x = i as f64;
            let bump = 50. * (-(x - 40.).powi(2) / 30.).exp();
            let noise = ((i * 7919 % 13) as f64 - 6.) * 0.3;
            format!("{}\n", bump + noise)
        })
        .collect()
}

#[test]
fn single_file_gives_one_series_of_n_samples() {
    let dir = scratch_dir("single");
    let f = dir.join("run1.txt");
    fs::write(&f, "1.0\n2.0\n3.0\n2.0\n1.0\n").unwrap();
    let reports = run(&RunConfig::new(&f)).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].name, "run1");
    assert_eq!(reports[0].samples, 5);
    assert_eq!(reports[0].peaks, 1);
    assert!(reports[0].plot.is_none());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn directory_processes_only_txt_files_in_order() {
    let dir = scratch_dir("dir");
    fs::write(dir.join("b.txt"), "1\n2\n1\n").unwrap();
    fs::write(dir.join("a.txt"), "1\n2\n").unwrap();
    fs::write(dir.join("notes.md"), "not data").unwrap();
    fs::write(dir.join("table.csv"), "x,y\n").unwrap();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("nested").join("c.txt"), "1\n").unwrap();
    let reports = run(&RunConfig::new(&dir)).unwrap();
    let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(reports[0].samples, 2);
    assert_eq!(reports[1].samples, 3);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn without_smoothing_values_are_the_parsed_ones() {
    let dir = scratch_dir("identity");
    let f = dir.join("raw.txt");
    fs::write(&f, "0.25\n-1.5\n3e2\n7\n").unwrap();
    let p = prepare(&f, &RunConfig::new(&f)).unwrap();
    assert!(p.chromatogram.smoothed.is_none());
    assert_eq!(p.chromatogram.value, vec![0.25, -1.5, 300., 7.]);
    assert_eq!(p.chromatogram.signal(), &p.chromatogram.value[..]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn smoothing_keeps_length_and_stays_within_window() {
    let dir = scratch_dir("smooth");
    let f = dir.join("noisy.txt");
    fs::write(&f, noisy(80)).unwrap();
    let mut config = RunConfig::new(&f);
    config.smooth = true;
    let p = prepare(&f, &config).unwrap();
    let raw = &p.chromatogram.value;
    let smoothed = p.chromatogram.smoothed.as_ref().unwrap();
    assert_eq!(smoothed.len(), raw.len());
    let side = config.window / 2;
    for (i, s) in smoothed.iter().enumerate() {
        let lo = i.saturating_sub(side);
        let hi = (i + side + 1).min(raw.len());
        let (min, max) = min_and_max(&raw[lo..hi]).unwrap();
        assert!(*s >= min - 1e-9 && *s <= max + 1e-9);
    }
    // the smoothed bump is found once
    assert_eq!(p.peaks.iter().filter(|pk| pk.height > 10.).count(), 1);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn export_file_peaks_and_elution_volume() {
    let dir = scratch_dir("export");
    let f = dir.join("lysozyme.txt");
    fs::write(&f, EXPORT).unwrap();
    let reports = run(&RunConfig::new(&f)).unwrap();
    let r = &reports[0];
    assert_eq!(r.samples, 9);
    assert_eq!(r.peaks, 1);
    // valleys at index 1 and 5: (2 + 6 + 2) * 0.5
    assert!((r.elution_volume - 5.).abs() < 1e-9);
    assert_eq!(
        r.injected.map(|dt| dt.to_string()),
        Some(String::from("2024-02-01 09:30:00"))
    );
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn save_plots_writes_one_image_per_file_and_summary() {
    let dir = scratch_dir("save");
    let data = dir.join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("first.txt"), noisy(60)).unwrap();
    fs::write(data.join("second.txt"), EXPORT).unwrap();
    let out = dir.join("plots");
    let summary = dir.join("summary.csv");
    let mut config = RunConfig::new(&data);
    config.smooth = true;
    config.save_plots = true;
    config.output_dir = out.clone();
    config.summary = Some(summary.clone());
    let reports = run(&config).unwrap();
    assert_eq!(reports.len(), 2);
    for name in ["first", "second"].iter() {
        let img = out.join(format!("{}.svg", name));
        assert!(img.is_file(), "missing {}", img.display());
    }
    assert_eq!(reports[0].plot, Some(out.join("first.svg")));
    let csv = fs::read_to_string(&summary).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "file,samples,peaks,elution_volume,injection_datetime"
    );
    assert!(lines[1].starts_with("first,60,"));
    assert!(lines[2].starts_with("second,9,"));
    assert!(lines[2].ends_with(",2024-02-01 09:30:00"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn png_plots_are_written() {
    let dir = scratch_dir("png");
    let f = dir.join("bump.txt");
    fs::write(&f, "0\n1\n3\n1\n0\n").unwrap();
    let out = dir.join("plots");
    let mut config = RunConfig::new(&f);
    config.save_plots = true;
    config.format = PlotFormat::Png;
    config.output_dir = out.clone();
    let reports = run(&config).unwrap();
    let img = out.join("bump.png");
    assert_eq!(reports[0].plot, Some(img.clone()));
    let bytes = fs::read(&img).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn same_stem_with_upper_case_extension_is_not_processed() {
    let dir = scratch_dir("case");
    fs::write(dir.join("a.txt"), "0\n2\n0\n").unwrap();
    fs::write(dir.join("a.TXT"), "0\n5\n0\n").unwrap();
    let out = dir.join("plots");
    let mut config = RunConfig::new(&dir);
    config.save_plots = true;
    config.output_dir = out.clone();
    let reports = run(&config).unwrap();
    assert_eq!(reports.len(), 1);
    let images = fs::read_dir(&out).unwrap().count();
    assert_eq!(images, reports.len());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn non_finite_samples_fail_instead_of_plotting() {
    let dir = scratch_dir("finite");
    let f = dir.join("inf.txt");
    fs::write(&f, "0\ninf\n0\n").unwrap();
    let mut config = RunConfig::new(&f);
    config.save_plots = true;
    config.output_dir = dir.join("plots");
    match run(&config) {
        Err(LcError::Parse { line, .. }) => assert_eq!(line, Some(2)),
        other => panic!("expected Parse error, got {:?}", other),
    }

    let f = dir.join("huge.txt");
    fs::write(&f, "1e308\n-1e308\n1e308\n").unwrap();
    config.input = f;
    assert!(matches!(run(&config), Err(LcError::Plot { .. })));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_input_is_reported() {
    let dir = scratch_dir("missing");
    match run(&RunConfig::new(dir.join("absent"))) {
        Err(LcError::InputNotFound { path }) => assert_eq!(path, dir.join("absent")),
        other => panic!("expected InputNotFound, got {:?}", other),
    }
    fs::write(dir.join("only.csv"), "1\n").unwrap();
    assert!(matches!(
        run(&RunConfig::new(&dir)),
        Err(LcError::NoDataFiles { .. })
    ));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn parse_error_aborts_run_and_names_file() {
    let dir = scratch_dir("parse");
    fs::write(dir.join("a_bad.txt"), "1.0\nnot-a-number\n").unwrap();
    fs::write(dir.join("b_good.txt"), "1.0\n2.0\n").unwrap();
    let summary = dir.join("summary.csv");
    let mut config = RunConfig::new(&dir);
    config.summary = Some(summary.clone());
    match run(&config) {
        Err(e @ LcError::Parse { .. }) => {
            let msg = e.to_string();
            assert!(msg.contains("a_bad.txt"), "{}", msg);
            assert!(msg.contains("line 2"), "{}", msg);
        }
        other => panic!("expected Parse error, got {:?}", other),
    }
    assert!(!summary.exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn binary_exit_codes() {
    let dir = scratch_dir("bin");
    let status = Command::new(env!("CARGO_BIN_EXE_lc_run"))
        .arg("-d")
        .arg(dir.join("absent"))
        .status()
        .unwrap();
    assert!(!status.success());

    let f = dir.join("ok.txt");
    fs::write(&f, "0\n1\n0\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_lc_run"))
        .arg("--data")
        .arg(&f)
        .arg("--smooth")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok: 3 samples"), "{}", stdout);
    fs::remove_dir_all(&dir).unwrap();
}
