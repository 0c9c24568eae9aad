use clap::Parser;
use rover_cli::replay::{load_frame, load_manifest, FrameRecord};
use rover_cli::{Calibration, CalibrationBuilder, RoverPerception};
use rover_core::{default_thread_count, init_thread_pool, Pose};
use std::path::PathBuf;
use std::time::Instant;

type CliError = Box<dyn std::error::Error>;

/// Turn rover camera frames into a navigable-terrain world map
#[derive(Parser, Debug)]
#[command(name = "rover", version, about)]
struct Cli {
    /// Single camera image to process
    #[arg(long, conflicts_with = "manifest", required_unless_present = "manifest")]
    image: Option<PathBuf>,

    /// JSON manifest listing frames and poses in playback order
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Vehicle world x (used with --image)
    #[arg(long, default_value_t = 0.0)]
    x: f32,

    /// Vehicle world y (used with --image)
    #[arg(long, default_value_t = 0.0)]
    y: f32,

    /// Heading in degrees (used with --image)
    #[arg(long, default_value_t = 0.0)]
    yaw: f32,

    /// Roll in degrees (used with --image)
    #[arg(long, default_value_t = 0.0)]
    roll: f32,

    /// Pitch in degrees (used with --image)
    #[arg(long, default_value_t = 0.0)]
    pitch: f32,

    /// Calibration file (.toml or .json); defaults to the simulator calibration
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Write the effective calibration as TOML and continue
    #[arg(long)]
    save_calibration: Option<PathBuf>,

    /// Output path for the last frame's packed class masks
    #[arg(long, default_value = "vision.png")]
    vision_out: PathBuf,

    /// Output path for the accumulated world map
    #[arg(long, default_value = "worldmap.png")]
    map_out: PathBuf,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long)]
    threads: Option<usize>,
}

impl Cli {
    fn frames(&self) -> Result<Vec<FrameRecord>, CliError> {
        if let Some(manifest) = &self.manifest {
            return Ok(load_manifest(manifest)?);
        }
        let image = self.image.clone().ok_or("either --image or --manifest is required")?;
        Ok(vec![FrameRecord {
            image,
            pose: Pose::new(self.x, self.y, self.yaw, self.roll, self.pitch),
        }])
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    init_thread_pool(cli.threads.unwrap_or_else(default_thread_count))?;

    let records = cli.frames()?;
    let first = records.first().ok_or("manifest contains no frames")?;
    let first_frame = load_frame(&first.image)?;

    let calibration = match &cli.calibration {
        Some(path) => Calibration::load(path)?,
        None => {
            let (w, h) = first_frame.dimensions();
            CalibrationBuilder::new(w, h)
                .metadata("Default", "Simulator calibration scaled to the input frames")
                .build()?
        }
    };
    if let Some(path) = &cli.save_calibration {
        calibration.save_toml(path)?;
        tracing::info!("Saved calibration to {}", path.display());
    }

    let pipeline = RoverPerception::new(calibration)?;
    let mut state = pipeline.new_state(first_frame, first.pose)?;

    let t0 = Instant::now();
    let mut failed = 0usize;
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            let frame = match load_frame(&record.image) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", record.image.display(), e);
                    failed += 1;
                    continue;
                }
            };
            state.set_input(frame, record.pose);
        }

        match pipeline.perception_step(&mut state) {
            Ok(report) => tracing::info!(
                "{}: terrain={} obstacle={} sample={} committed={} steer={:.1}°",
                record.image.display(),
                report.terrain_pixels,
                report.obstacle_pixels,
                report.sample_pixels,
                report.decision.is_committed(),
                report.mean_bearing.map(f32::to_degrees).unwrap_or(0.0)
            ),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", record.image.display(), e);
                failed += 1;
            }
        }
    }

    tracing::info!(
        "Processed {} frames ({} committed, {} failed) in {:.2?}",
        state.output.frames_seen,
        state.output.frames_committed,
        failed,
        t0.elapsed()
    );

    state.output.vision_image.save(&cli.vision_out)?;
    state.output.world_map.to_image().save(&cli.map_out)?;
    tracing::info!("Saved {} and {}", cli.vision_out.display(), cli.map_out.display());

    Ok(())
}
