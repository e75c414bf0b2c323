mod replay;

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use poselab_core::{
    profile, AppConfig, CommandSurface, DisplayGeometry, FrameSize, Pipeline, Pose,
    RecordedTrack, SportId,
};
use tracing_subscriber::EnvFilter;

use crate::replay::ReplayScript;

fn main() -> poselab_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Play {
            track,
            sport,
            pause_at,
            seek_at,
            seek_to,
            latency_ticks,
            summary,
        } => run_play(
            config,
            &track,
            &sport,
            ReplayScript {
                pause_at,
                seek_at,
                seek_to,
                latency_ticks,
            },
            summary.as_ref(),
        ),
        Commands::Still {
            pose,
            sport,
            width,
            height,
        } => run_still(config, &pose, &sport, FrameSize::new(width, height)),
        Commands::Profiles => run_profiles(),
    }
}

fn run_play(
    config: AppConfig,
    track_path: &PathBuf,
    sport: &str,
    script: ReplayScript,
    summary_path: Option<&PathBuf>,
) -> poselab_core::Result<()> {
    let sport: SportId = sport.parse()?;
    let mut track = RecordedTrack::load(track_path)?;
    tracing::info!(?track_path, %sport, frames = track.frames().len(), "replaying track");

    let display = DisplayGeometry::native(track.metadata.resolution());
    let mut pipeline = Pipeline::new(config, sport, CommandSurface::default(), display);
    let summary = replay::run(&mut pipeline, &mut track, script)?;

    let json = serde_json::to_string_pretty(&summary)?;
    match summary_path {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_still(
    config: AppConfig,
    pose_path: &PathBuf,
    sport: &str,
    resolution: FrameSize,
) -> poselab_core::Result<()> {
    let sport: SportId = sport.parse()?;
    let raw = std::fs::read_to_string(pose_path)?;
    let pose: Pose = serde_json::from_str(&raw)?;
    tracing::info!(?pose_path, %sport, keypoints = pose.len(), "analysing still image");

    let mut pipeline = Pipeline::new(
        config,
        sport,
        CommandSurface::default(),
        DisplayGeometry::native(resolution),
    );
    let report = pipeline.analyze_still(&pose, resolution, Duration::ZERO)?;
    tracing::info!(edges = report.stats.edges, markers = report.stats.markers, "overlay drawn");

    let tags = report.kpi_tags();
    if tags.is_empty() {
        println!("knee angles unavailable");
    } else {
        println!("{}", tags.join("  "));
    }
    for reading in pipeline.board().entries() {
        println!("{:<16} {}", reading.label, reading.value);
    }
    Ok(())
}

fn run_profiles() -> poselab_core::Result<()> {
    let profiles: Vec<_> = profile::profiles().collect();
    println!("{}", serde_json::to_string_pretty(&profiles)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pose overlay and biomechanics analysis", long_about = None)]
struct Cli {
    /// JSON configuration file; missing fields use defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded keypoint track through the playback pipeline.
    Play {
        /// Path to the recorded track (metadata plus timestamped poses).
        #[arg(short, long)]
        track: PathBuf,
        /// One of golf, sprint, cricket, baseball, tennis, squat.
        #[arg(short, long, default_value = "squat")]
        sport: String,
        /// Pause playback once the media reaches this time (seconds).
        #[arg(long)]
        pause_at: Option<f64>,
        /// Seek while playing once the media reaches this time (seconds).
        #[arg(long)]
        seek_at: Option<f64>,
        /// Seek target. Without --seek-at the seek follows the pause, or the
        /// end of the clip.
        #[arg(long)]
        seek_to: Option<f64>,
        /// Display ticks each estimate takes to resolve.
        #[arg(long, default_value_t = 2)]
        latency_ticks: u32,
        /// Write the session summary here instead of stdout.
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Analyse a single pose detected on a still image.
    Still {
        /// Path to the pose JSON (`{"keypoints": [...]}`).
        #[arg(short, long)]
        pose: PathBuf,
        #[arg(short, long, default_value = "squat")]
        sport: String,
        /// Natural width of the image.
        #[arg(long)]
        width: u32,
        /// Natural height of the image.
        #[arg(long)]
        height: u32,
    },
    /// Print the sport profile table.
    Profiles,
}
