use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, fs};
use tempfile::tempdir;

#[derive(Deserialize)]
struct ClassifyOutput {
    classification: String,
}

#[derive(Deserialize)]
struct HeartRateOutput {
    heart_rate: f64,
    num_beats: usize,
}

#[derive(Deserialize)]
struct BeatsOutput {
    indices: Vec<usize>,
}

fn classify(bpm: &str) -> Result<String, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("beatsense");
    cmd.args(["classify", "--bpm", bpm]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: ClassifyOutput = serde_json::from_slice(&out)?;
    Ok(value.classification)
}

#[test]
fn classify_boundaries() -> Result<(), Box<dyn Error>> {
    assert_eq!(classify("0")?, "Undetermined");
    assert_eq!(classify("59.99")?, "Bradycardia");
    assert_eq!(classify("60")?, "Normal Sinus Rhythm");
    assert_eq!(classify("60.01")?, "Normal Sinus Rhythm");
    assert_eq!(classify("100")?, "Normal Sinus Rhythm");
    assert_eq!(classify("100.01")?, "Tachycardia");
    Ok(())
}

#[test]
fn heart_rate_from_indices() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let beats = dir.path().join("beats.txt");
    fs::write(&beats, "0\n125\n500\n")?;

    let mut cmd = cargo_bin_cmd!("beatsense");
    cmd.args([
        "heart-rate",
        "--fs",
        "250",
        "--input",
        beats.to_str().expect("utf8 path"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HeartRateOutput = serde_json::from_slice(&out)?;
    // Mean of 0.5 s and 1.5 s is 1.0 s.
    assert!((value.heart_rate - 60.0).abs() < 1e-9);
    assert_eq!(value.num_beats, 3);
    Ok(())
}

#[test]
fn heart_rate_single_beat_is_zero() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("beatsense");
    cmd.args(["heart-rate"]).write_stdin("42\n");
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HeartRateOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.heart_rate, 0.0);
    assert_eq!(value.num_beats, 1);
    Ok(())
}

#[test]
fn filter_preserves_length() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let recording = dir.path().join("ramp.txt");
    let text: String = (0..300).map(|i| format!("{}\n", (i % 50) as f64 * 0.01)).collect();
    fs::write(&recording, text)?;

    let mut cmd = cargo_bin_cmd!("beatsense");
    cmd.args(["filter", "--input", recording.to_str().expect("utf8 path")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let lines: Vec<f64> = String::from_utf8(out)?
        .lines()
        .map(str::parse)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 300);
    Ok(())
}

#[test]
fn find_rpeaks_from_csv_column() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let recording = dir.path().join("ecg.csv");
    let mut text = String::from("time,MLII\n");
    for i in 0..1000 {
        let v = if i % 200 == 100 { 1.0 } else { 0.0 };
        text.push_str(&format!("{:.3},{}\n", i as f64 / 250.0, v));
    }
    fs::write(&recording, text)?;

    let mut cmd = cargo_bin_cmd!("beatsense");
    cmd.args([
        "find-rpeaks",
        "--detector",
        "local-maxima",
        "--input",
        recording.to_str().expect("utf8 path"),
        "--csv-column",
        "MLII",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: BeatsOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.indices, vec![100, 300, 500, 700, 900]);
    Ok(())
}

#[test]
fn short_input_fails() {
    let mut cmd = cargo_bin_cmd!("beatsense");
    cmd.args(["analyze"]).write_stdin("1\n2\n3\n");
    cmd.assert().failure();
}
