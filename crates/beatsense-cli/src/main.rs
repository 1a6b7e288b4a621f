use anyhow::{anyhow, bail, Context, Result};
use beatsense_lib::{
    classify::classify_with,
    config::{AnalysisConfig, DetectorConfig, LocalMaximaConfig, ThresholdConfig},
    detectors::ecg::detect_beats,
    filters::bandpass,
    io::{
        csv::{self as csv_io, CsvColumn},
        text as text_io, wfdb as wfdb_io,
    },
    metrics::rate::heart_rate,
    pipeline::{analyze_waveform_detailed, AnalysisResult},
    signal::{BeatIndexSet, Waveform},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{info, warn};
use serde::Serialize;
use std::{
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "beatsense",
    version,
    about = "BeatSense: ECG filtering, R-peak detection and rhythm classification"
)]
struct Cli {
    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter, detect beats, estimate heart rate and classify one recording
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        config: ConfigArgs,
        /// Print beat positions and RR intervals alongside the result
        #[arg(long)]
        details: bool,
    },
    /// Analyze several recordings (sample files or WFDB headers), one JSON line each
    AnalyzeBatch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long, default_value_t = 0)]
        wfdb_lead: usize,
        #[arg(long)]
        sampto: Option<usize>,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the zero-phase band-passed samples, one per line
    Filter {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Detect R-peaks on the band-passed signal
    FindRpeaks {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Mean heart rate from newline-delimited beat indices
    HeartRate {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
    },
    /// Classify a heart rate (BPM)
    Classify {
        #[arg(long)]
        bpm: f64,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Sampling rate (Hz); WFDB records carry their own
    #[arg(long, default_value_t = 250.0)]
    fs: f64,
    /// Sample file; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// Read this column (header name or zero-based index) from a delimited --input
    #[arg(long, requires = "input")]
    csv_column: Option<String>,
    #[arg(long, default_value_t = ',')]
    csv_delimiter: char,
    /// WFDB header (.hea) of a local record
    #[arg(long, conflicts_with = "input")]
    wfdb_header: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    wfdb_lead: usize,
    /// Keep at most this many samples of a WFDB record
    #[arg(long)]
    sampto: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DetectorKind {
    #[value(name = "threshold")]
    Threshold,
    #[value(name = "local-maxima")]
    LocalMaxima,
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// TOML analysis configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    detector: Option<DetectorKind>,
    #[arg(long)]
    low_hz: Option<f64>,
    #[arg(long)]
    high_hz: Option<f64>,
    /// Threshold detector: fraction of the global maximum
    #[arg(long)]
    threshold_fraction: Option<f64>,
    /// Threshold detector: refractory window (seconds)
    #[arg(long)]
    refractory_s: Option<f64>,
    /// Local-maxima detector: fraction of the mean absolute amplitude
    #[arg(long)]
    mean_fraction: Option<f64>,
    /// Local-maxima detector: minimum separation (seconds)
    #[arg(long)]
    min_separation_s: Option<f64>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(low) = self.low_hz {
            cfg.filter.low_hz = low;
        }
        if let Some(high) = self.high_hz {
            cfg.filter.high_hz = high;
        }
        match (self.detector, cfg.detector) {
            (Some(DetectorKind::Threshold), DetectorConfig::LocalMaxima(_)) => {
                cfg.detector = DetectorConfig::Threshold(ThresholdConfig::default());
            }
            (Some(DetectorKind::LocalMaxima), DetectorConfig::Threshold(_)) => {
                cfg.detector = DetectorConfig::LocalMaxima(LocalMaximaConfig::default());
            }
            _ => {}
        }
        match &mut cfg.detector {
            DetectorConfig::Threshold(t) => {
                if let Some(v) = self.threshold_fraction {
                    t.fraction = v;
                }
                if let Some(v) = self.refractory_s {
                    t.refractory_s = v;
                }
                if self.mean_fraction.is_some() || self.min_separation_s.is_some() {
                    warn!("local-maxima options ignored by the threshold detector");
                }
            }
            DetectorConfig::LocalMaxima(m) => {
                if let Some(v) = self.mean_fraction {
                    m.mean_fraction = v;
                }
                if let Some(v) = self.min_separation_s {
                    m.min_separation_s = v;
                }
                if self.threshold_fraction.is_some() || self.refractory_s.is_some() {
                    warn!("threshold options ignored by the local-maxima detector");
                }
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            details,
        } => cmd_analyze(&input, &config, details)?,
        Commands::AnalyzeBatch {
            inputs,
            fs,
            wfdb_lead,
            sampto,
            config,
        } => cmd_analyze_batch(&inputs, fs, wfdb_lead, sampto, &config)?,
        Commands::Filter { input, config } => cmd_filter(&input, &config)?,
        Commands::FindRpeaks { input, config } => cmd_find_rpeaks(&input, &config)?,
        Commands::HeartRate { input, fs } => cmd_heart_rate(input.as_deref(), fs)?,
        Commands::Classify { bpm, config } => cmd_classify(bpm, &config)?,
    }
    Ok(())
}

fn load_waveform(input: &InputArgs) -> Result<Waveform> {
    if let Some(header) = &input.wfdb_header {
        return wfdb_io::load_wfdb_lead(header, input.wfdb_lead, input.sampto);
    }
    let data = match (&input.input, &input.csv_column) {
        (Some(path), Some(column)) => {
            let column: CsvColumn = column.parse()?;
            let delimiter = u8::try_from(input.csv_delimiter)
                .map_err(|_| anyhow!("delimiter must be a single-byte character"))?;
            csv_io::read_column(path, &column, delimiter)?
        }
        (Some(path), None) => text_io::read_f64_series(path)?,
        (None, _) => text_io::read_f64_series_from(io::stdin().lock())?,
    };
    Ok(Waveform::new(data, input.fs))
}

fn load_record(path: &Path, fs: f64, lead: usize, sampto: Option<usize>) -> Result<Waveform> {
    let is_header = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("hea"));
    if is_header {
        wfdb_io::load_wfdb_lead(path, lead, sampto)
    } else {
        Ok(Waveform::new(text_io::read_f64_series(path)?, fs))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn cmd_analyze(input: &InputArgs, config: &ConfigArgs, details: bool) -> Result<()> {
    let cfg = config.resolve()?;
    let ts = load_waveform(input)?;
    let report = analyze_waveform_detailed(&ts, &cfg)?;
    info!("{}", report.result);
    if details {
        print_json(&report)
    } else {
        print_json(&report.result)
    }
}

#[derive(Serialize)]
struct BatchLine<'a> {
    record: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_analyze_batch(
    inputs: &[PathBuf],
    fs: f64,
    lead: usize,
    sampto: Option<usize>,
    config: &ConfigArgs,
) -> Result<()> {
    let cfg = config.resolve()?;
    let mut failed = 0usize;
    for path in inputs {
        let record = path.to_string_lossy();
        let outcome = load_record(path, fs, lead, sampto)
            .and_then(|ts| Ok(analyze_waveform_detailed(&ts, &cfg)?.result));
        let line = match outcome {
            Ok(result) => {
                info!("{record}: {result}");
                BatchLine {
                    record: &record,
                    result: Some(result),
                    error: None,
                }
            }
            Err(err) => {
                failed += 1;
                warn!("{record}: analysis unavailable: {err:#}");
                BatchLine {
                    record: &record,
                    result: None,
                    error: Some(format!("{err:#}")),
                }
            }
        };
        print_json(&line)?;
    }
    if failed > 0 {
        bail!("{} of {} records could not be analyzed", failed, inputs.len());
    }
    Ok(())
}

fn cmd_filter(input: &InputArgs, config: &ConfigArgs) -> Result<()> {
    let cfg = config.resolve()?;
    let ts = load_waveform(input)?;
    let filtered = bandpass(&ts, &cfg.filter)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for sample in &filtered.data {
        writeln!(out, "{sample}")?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_find_rpeaks(input: &InputArgs, config: &ConfigArgs) -> Result<()> {
    let cfg = config.resolve()?;
    let ts = load_waveform(input)?;
    let filtered = bandpass(&ts, &cfg.filter)?;
    let beats = detect_beats(&filtered, &cfg.detector);
    print_json(&beats)
}

#[derive(Serialize)]
struct HeartRateOutput {
    heart_rate: f64,
    num_beats: usize,
}

fn cmd_heart_rate(input: Option<&Path>, fs: f64) -> Result<()> {
    let indices = match input {
        Some(path) => text_io::read_beat_indices(path)?,
        None => {
            let mut buf = String::new();
            io::Read::read_to_string(&mut io::stdin().lock(), &mut buf)?;
            text_io::parse_beat_indices(&buf)?
        }
    };
    if indices.windows(2).any(|w| w[1] <= w[0]) {
        bail!("beat indices must be strictly increasing");
    }
    let beats = BeatIndexSet::from_indices(indices);
    let bpm = heart_rate(&beats, fs)?;
    print_json(&HeartRateOutput {
        heart_rate: bpm,
        num_beats: beats.len(),
    })
}

#[derive(Serialize)]
struct ClassifyOutput {
    heart_rate: f64,
    classification: String,
}

fn cmd_classify(bpm: f64, config: &ConfigArgs) -> Result<()> {
    let cfg = config.resolve()?;
    let class = classify_with(bpm, &cfg.classifier);
    print_json(&ClassifyOutput {
        heart_rate: bpm,
        classification: class.to_string(),
    })
}
