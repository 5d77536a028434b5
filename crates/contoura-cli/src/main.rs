//! contoura: run face shape and skin tone analysis from the command line.
//!
//! Reads a decoded-image file and the landmark detector's JSON output,
//! runs the engine, and prints the result JSON. Single-stage subcommands
//! expose the shape classifier and the recommendation tables directly.
//!
//! # Usage
//!
//! ```text
//! contoura analyze [OPTIONS] <IMAGE> <DETECTION_JSON>
//! contoura classify --forehead F --cheekbone C --jaw J --length L --jaw-angle A
//! contoura recommend --shape S --undertone U
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use contoura_engine::diagnostics::{
    AnalysisDiagnostics, Clock, analyze_with_diagnostics, duration_ms,
};
use contoura_engine::{Detection, EngineConfig, FaceDimensions};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Face shape, skin tone, and makeup overlay analysis.
#[derive(Parser)]
#[command(name = "contoura", version)]
struct Cli {
    /// Log engine decisions (fallback anchors, matched rule, sample rectangle).
    ///
    /// Overrides the default `warn` level; `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze an image with its detector output and print the result JSON.
    Analyze(AnalyzeArgs),
    /// Classify a face shape from five measurements.
    Classify(ClassifyArgs),
    /// Print the recommendation records for a shape and undertone.
    Recommend(RecommendArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Path to the detector JSON (`bounding_box` and `landmarks`).
    detection_path: PathBuf,

    /// Upward forehead shift as a fraction of face height.
    #[arg(long, default_value_t = EngineConfig::DEFAULT_FOREHEAD_LIFT)]
    forehead_lift: f64,

    /// Omit insights from the result.
    #[arg(long)]
    no_insights: bool,

    /// Full engine config as a JSON string.
    ///
    /// When provided, all other config flags are ignored.
    /// The JSON must be a valid `EngineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Print per-stage diagnostics as JSON instead of the result.
    #[arg(long, conflicts_with = "report")]
    json_diagnostics: bool,

    /// Print a human-readable diagnostics report instead of the result.
    #[arg(long)]
    report: bool,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Forehead width in pixels.
    #[arg(long)]
    forehead: f64,

    /// Cheekbone width in pixels.
    #[arg(long)]
    cheekbone: f64,

    /// Jaw width in pixels.
    #[arg(long)]
    jaw: f64,

    /// Face length in pixels.
    #[arg(long)]
    length: f64,

    /// Jaw angle in radians.
    #[arg(long)]
    jaw_angle: f64,
}

#[derive(Args)]
struct RecommendArgs {
    /// Face shape name; unknown names use oval guidance.
    #[arg(long)]
    shape: String,

    /// Undertone name; unknown names use the neutral palette.
    #[arg(long)]
    undertone: String,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

/// Classifier output for the `classify` subcommand.
#[derive(Serialize)]
struct ClassifyOutput {
    face_shape: contoura_engine::ShapeLabel,
    rule: &'static str,
    ratios: contoura_engine::classify::ShapeRatios,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Command::Analyze(args) => run_analyze(&args),
        Command::Classify(args) => run_classify(&args),
        Command::Recommend(args) => run_recommend(&args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

/// Install a stderr subscriber filtered by `RUST_LOG`, defaulting to
/// `warn` (or `debug` with `--verbose`).
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build an [`EngineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual config flags are ignored.
fn config_from_cli(args: &AnalyzeArgs) -> Result<EngineConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(EngineConfig {
        forehead_lift: args.forehead_lift,
        include_insights: !args.no_insights,
        ..EngineConfig::default()
    })
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|e| format!("Error serializing output: {e}"))
}

fn read_detection(path: &Path) -> Result<Detection, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn run_analyze(args: &AnalyzeArgs) -> Result<(), String> {
    let config = config_from_cli(args)?;
    let detection = read_detection(&args.detection_path)?;
    let image = image::open(&args.image_path)
        .map_err(|e| format!("Error decoding {}: {e}", args.image_path.display()))?;

    info!(
        image = %args.image_path.display(),
        width = image.width(),
        height = image.height(),
        runs = args.runs,
        "loaded inputs"
    );
    debug!(?config, "engine config");

    let mut all_diagnostics = Vec::with_capacity(args.runs);
    let mut last_result = None;

    for run in 0..args.runs {
        if args.runs > 1 {
            debug!(run = run + 1, of = args.runs, "starting run");
        }
        let (result, diagnostics) = analyze_with_diagnostics(
            &detection.landmarks,
            &detection.bounding_box,
            &image,
            &config,
            &StdClock,
        )
        .map_err(|e| format!("Analysis error: {e}"))?;

        if args.json_diagnostics {
            println!("{}", to_json(&diagnostics, args.pretty)?);
        } else if args.report {
            println!("{}", diagnostics.report());
        }

        all_diagnostics.push(diagnostics);
        last_result = Some(result);
    }

    if args.json_diagnostics || args.report {
        if args.runs > 1
            && let Some(summary) = summarize_runs(&all_diagnostics)
        {
            print_run_summary(&summary);
        }
    } else if let Some(result) = last_result {
        println!("{}", to_json(&result, args.pretty)?);
    }

    Ok(())
}

fn run_classify(args: &ClassifyArgs) -> Result<(), String> {
    let dimensions = FaceDimensions {
        forehead_width: args.forehead,
        cheekbone_width: args.cheekbone,
        jaw_width: args.jaw,
        face_length: args.length,
        jaw_angle: args.jaw_angle,
    };
    let classification = contoura_engine::classify::classify_with_rule(&dimensions);
    let output = ClassifyOutput {
        face_shape: classification.label,
        rule: classification.rule,
        ratios: classification.ratios,
    };
    println!("{}", to_json(&output, false)?);
    Ok(())
}

fn run_recommend(args: &RecommendArgs) -> Result<(), String> {
    let records =
        contoura_engine::recommend::build_recommendations_by_name(&args.shape, &args.undertone);
    println!("{}", to_json(&records, args.pretty)?);
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Millisecond spread of one timing across runs.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spread {
    min: f64,
    mean: f64,
    max: f64,
}

impl Spread {
    #[allow(clippy::cast_precision_loss)]
    fn of(values: &[f64]) -> Option<Self> {
        let min = values.iter().copied().reduce(f64::min)?;
        let max = values.iter().copied().reduce(f64::max)?;
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self { min, mean, max })
    }
}

/// Timings aggregated over repeated analyses of the same inputs.
#[derive(Debug, PartialEq)]
struct RunSummary {
    runs: usize,
    total: Spread,
    /// Per-stage spread, in execution order.
    stages: Vec<(&'static str, Spread)>,
}

/// Aggregate the diagnostics of every run; `None` when there were no runs.
fn summarize_runs(all_diagnostics: &[AnalysisDiagnostics]) -> Option<RunSummary> {
    let totals: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| duration_ms(d.total_duration))
        .collect();

    let mut per_stage: Vec<(&'static str, Vec<f64>)> = Vec::new();
    for diagnostics in all_diagnostics {
        for (name, stage) in diagnostics.stages() {
            let ms = duration_ms(stage.duration);
            match per_stage.iter_mut().find(|(seen, _)| *seen == name) {
                Some((_, samples)) => samples.push(ms),
                None => per_stage.push((name, vec![ms])),
            }
        }
    }

    Some(RunSummary {
        runs: all_diagnostics.len(),
        total: Spread::of(&totals)?,
        stages: per_stage
            .into_iter()
            .filter_map(|(name, samples)| Spread::of(&samples).map(|spread| (name, spread)))
            .collect(),
    })
}

fn print_run_summary(summary: &RunSummary) {
    println!();
    println!("Summary ({} runs)\n{}", summary.runs, "=".repeat(60));
    let Spread { min, mean, max } = summary.total;
    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");
    println!();
    println!("{:<24} {:>10} {:>10} {:>10}", "Stage", "Min (ms)", "Mean (ms)", "Max (ms)");
    println!("{}", "-".repeat(57));
    for (name, spread) in &summary.stages {
        println!(
            "{name:<24} {:>10.3} {:>10.3} {:>10.3}",
            spread.min, spread.mean, spread.max,
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_flags_build_config() {
        let cli = Cli::parse_from([
            "contoura",
            "analyze",
            "face.png",
            "face.json",
            "--forehead-lift",
            "0.2",
            "--no-insights",
        ]);
        let Command::Analyze(args) = cli.command else {
            unreachable!("parsed analyze subcommand");
        };
        let config = config_from_cli(&args).unwrap();
        assert!((config.forehead_lift - 0.2).abs() < f64::EPSILON);
        assert!(!config.include_insights);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = Cli::parse_from([
            "contoura",
            "analyze",
            "face.png",
            "face.json",
            "--no-insights",
            "--config-json",
            r#"{"forehead_lift": 0.1}"#,
        ]);
        let Command::Analyze(args) = cli.command else {
            unreachable!("parsed analyze subcommand");
        };
        let config = config_from_cli(&args).unwrap();
        assert!((config.forehead_lift - 0.1).abs() < f64::EPSILON);
        assert!(config.include_insights);
    }

    #[test]
    fn bad_config_json_is_an_error() {
        let cli = Cli::parse_from([
            "contoura",
            "analyze",
            "face.png",
            "face.json",
            "--config-json",
            "{not json",
        ]);
        let Command::Analyze(args) = cli.command else {
            unreachable!("parsed analyze subcommand");
        };
        assert!(config_from_cli(&args).unwrap_err().contains("--config-json"));
    }

    #[test]
    fn diagnostics_modes_conflict() {
        let parsed = Cli::try_parse_from([
            "contoura",
            "analyze",
            "face.png",
            "face.json",
            "--report",
            "--json-diagnostics",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn zero_runs_rejected() {
        let parsed = Cli::try_parse_from([
            "contoura", "analyze", "face.png", "face.json", "--runs", "0",
        ]);
        assert!(parsed.is_err());
    }

    /// Ticks a fixed number of milliseconds per reading.
    struct TickClock {
        now: std::cell::Cell<u64>,
        step: u64,
    }

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.now.get() + self.step;
            self.now.set(t);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn diagnostics_with_step(step: u64, include_insights: bool) -> AnalysisDiagnostics {
        let image = image::RgbaImage::from_pixel(200, 200, image::Rgba([200, 150, 120, 255]));
        let face = contoura_engine::FaceBoundingBox::new(20.0, 20.0, 180.0, 180.0);
        let config = EngineConfig {
            include_insights,
            ..EngineConfig::default()
        };
        let clock = TickClock {
            now: std::cell::Cell::new(0),
            step,
        };
        let (_, diagnostics) = analyze_with_diagnostics(
            &contoura_engine::LandmarkSet::new(),
            &face,
            &image,
            &config,
            &clock,
        )
        .unwrap();
        diagnostics
    }

    #[test]
    fn run_summary_spans_every_run() {
        let runs = [
            diagnostics_with_step(1, true),
            diagnostics_with_step(3, true),
        ];
        let summary = summarize_runs(&runs).unwrap();
        assert_eq!(summary.runs, 2);
        assert!(summary.total.min < summary.total.max);
        assert!((summary.total.mean - (summary.total.min + summary.total.max) / 2.0).abs() < 1e-9);

        let names: Vec<&str> = summary.stages.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["Extract", "Measure", "Classify", "Sample", "Overlay", "Recommend", "Insights"],
        );
        let (_, extract) = summary.stages[0];
        assert!((extract.min - 1.0).abs() < 1e-9);
        assert!((extract.max - 3.0).abs() < 1e-9);
        assert!((extract.mean - 2.0).abs() < 1e-9);
    }

    #[test]
    fn run_summary_omits_skipped_stages() {
        let summary = summarize_runs(&[diagnostics_with_step(1, false)]).unwrap();
        assert_eq!(summary.stages.len(), 6);
        assert!(summary.stages.iter().all(|(name, _)| *name != "Insights"));
    }

    #[test]
    fn run_summary_of_nothing_is_none() {
        assert_eq!(summarize_runs(&[]), None);
    }
}
