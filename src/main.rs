use clap::Parser;
use gauge_reader::config::{AppConfig, SegmenterKind};
use gauge_reader::error::ReaderError;
use gauge_reader::prelude::*;
use gauge_reader::telemetry::TelemetryClient;
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;

/// One water-meter detection cycle: acquire a frame, read the gauge,
/// validate against the last known good value, push the accepted reading.
#[derive(Parser, Debug)]
#[command(name = "gauge-reader", version, about)]
struct Cli {
    /// Deployment configuration file.
    #[arg(short, long, default_value = "gauge-reader.json")]
    config: PathBuf,

    /// Log errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every pipeline stage.
    #[arg(short, long)]
    verbose: bool,

    /// Accept the reading regardless of validation and overwrite the
    /// last-known-good value. For use after a meter swap or recalibration.
    #[arg(short, long)]
    force: bool,

    /// Skip remote capture and the telemetry push; read the configured
    /// local frame instead. For offline tuning.
    #[arg(long)]
    measure_only: bool,

    /// Write numbered stage snapshots into this directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(err) = run(&cli) {
        error!("cycle aborted: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> gauge_reader::Result<()> {
    let config = AppConfig::load(&cli.config)?;
    let calibration = CalibrationRecord::load(&config.calibration_path)?;

    let mut params = config.reader_params();
    // the calibrated digit count is authoritative once a record exists
    params.digit_count = calibration.digit_count;

    let segmenter = match config.segmenter {
        SegmenterKind::Static => Segmenter::Static {
            boxes: calibration.digit_boxes.clone(),
        },
        SegmenterKind::Dynamic => Segmenter::Dynamic(params.segment.clone()),
    };
    let classifier = config.build_classifier(params.knn_k)?;

    let mut reader = MeterReader::new(
        params,
        Geometry::from_record(&calibration),
        segmenter,
        classifier,
    );
    if let Some(dir) = &cli.debug_dir {
        reader = reader.with_debug_sink(DebugSink::new(dir));
    }

    let http = reqwest::blocking::Client::new();
    let frame = acquire(cli, &config, &http)?;

    let store = LastKnownGoodStore::new(&config.last_known_good_path);
    let last_known_good = store.load()?;

    let outcome = reader.process(&frame, last_known_good, cli.force)?;
    match outcome.verdict {
        Verdict::Accepted { value } => {
            store.save(value)?;
            info!("meter reading: {value:.2}");
            if cli.measure_only {
                info!("measure-only run, skipping telemetry push");
            } else if let Some(telemetry) = config.telemetry.clone() {
                // push failures are logged, never retried here
                if let Err(err) = TelemetryClient::new(telemetry).push(value) {
                    error!("telemetry push failed: {err}");
                }
            }
        }
        Verdict::Rejected { reason } => {
            warn!("reading rejected: {reason}; last known good value retained");
        }
    }
    Ok(())
}

fn acquire(
    cli: &Cli,
    config: &AppConfig,
    http: &reqwest::blocking::Client,
) -> gauge_reader::Result<Frame> {
    if !cli.measure_only {
        if let Some(url) = &config.image.url {
            return gauge_reader::io::fetch_grayscale(http, url);
        }
    }
    if let Some(path) = &config.image.path {
        return gauge_reader::io::load_grayscale(path)
            .map_err(|e| ReaderError::ImageUnavailable(format!("{}: {e}", path.display())));
    }
    Err(ReaderError::ImageUnavailable(
        "no usable image source configured".into(),
    ))
}
