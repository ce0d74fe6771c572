use clap::Parser;
use gauge_reader::error::Result;
use gauge_reader::filter::median_blur;
use gauge_reader::gauge::{crop_to_circle, locate_gauge};
use gauge_reader::hough::CircleOptions;
use gauge_reader::io::load_grayscale;
use gauge_reader::orient::{find_angle, leveling_degrees, rotate, AngleOptions};
use gauge_reader::prelude::*;
use gauge_reader::segment::detect_digit_row;
use log::{error, info, LevelFilter};
use std::path::PathBuf;

/// Derive the gauge geometry from a sample photograph and freeze it into a
/// calibration record: circle, rotation angle and one box per digit.
#[derive(Parser, Debug)]
#[command(name = "gauge-calibrate", version, about)]
struct Cli {
    /// Sample image of the meter, ideally a clean well-lit capture.
    image: PathBuf,

    /// Where to write the calibration record.
    #[arg(short, long, default_value = "calibration.json")]
    output: PathBuf,

    /// Number of digit positions on the meter face.
    #[arg(short, long, default_value_t = 7)]
    digits: usize,

    /// Radius band of the gauge face, in pixels.
    #[arg(long, default_value_t = 200.0)]
    min_radius: f32,
    #[arg(long, default_value_t = 300.0)]
    max_radius: f32,

    /// Write numbered stage overlays into this directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(err) = run(&cli) {
        error!("calibration failed: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let sink = cli
        .debug_dir
        .as_ref()
        .map(DebugSink::new)
        .unwrap_or_else(DebugSink::disabled);

    let frame = load_grayscale(&cli.image)?;
    sink.save("gray", &frame);

    let circle_opts = CircleOptions {
        min_radius: cli.min_radius,
        max_radius: cli.max_radius,
        ..Default::default()
    };
    let blurred = median_blur(&frame, 5);
    let circle = locate_gauge(&blurred, &circle_opts)?;
    sink.save_with_circle("circles", &frame, &circle);

    let crop = crop_to_circle(&frame, &circle)?;
    sink.save("crop", &crop);

    let estimate = find_angle(&crop, &AngleOptions::default())?;
    sink.save("edges", &estimate.edge_map);

    let leveled = rotate(&crop, leveling_degrees(estimate.angle_rad));
    sink.save("rotated", &leveled);

    let row = detect_digit_row(&leveled, &SegmentOptions::default())?;
    let digit_boxes = row.split_columns(cli.digits);
    sink.save_with_boxes("figures", &leveled, &digit_boxes);

    let record = CalibrationRecord::new(circle, estimate.angle_rad, digit_boxes);
    record.save(&cli.output)?;
    info!(
        "calibration written to {}: circle ({:.1}, {:.1}) r={:.1}, angle {:.3} rad, \
         digit row [{}, {}, {}, {}] split into {} boxes",
        cli.output.display(),
        circle.cx,
        circle.cy,
        circle.r,
        estimate.angle_rad,
        row.x,
        row.y,
        row.w,
        row.h,
        cli.digits
    );
    Ok(())
}
