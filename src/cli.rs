use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Records synthetic frames into a video file through ffmpeg-session"
)]
pub struct Cli {
    /// Output file; the extension selects the container
    #[arg(short, long, default_value = "capture.mp4", value_name = "PATH")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 320)]
    pub width: u32,

    #[arg(long, default_value_t = 240)]
    pub height: u32,

    /// Frames per second
    #[arg(long, default_value_t = 25)]
    pub fps: u32,

    /// Number of frames to record
    #[arg(short = 'n', long, default_value_t = 30)]
    pub frames: u32,

    /// JSON job file listing several sessions; overrides the options above
    #[arg(short, long, value_name = "JOB_FILE")]
    pub job: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}
