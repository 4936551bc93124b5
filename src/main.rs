use anyhow::Context as _;
use clap::Parser;
use ffmpeg_session::{SessionRegistry, SourceBuffer};

mod cli;
mod config;
mod pattern;

use cli::Cli;
use config::RecordJob;

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .filter_module("ffmpeg_session", level)
        .parse_default_env()
        .init();
}

struct Recording {
    id: String,
    width: u32,
    height: u32,
    source: SourceBuffer,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    ffmpeg_session::init()?;

    let job = match cli.job {
        Some(ref path) => RecordJob::load(path)?,
        None => RecordJob::single(cli.output.clone(), cli.fps, cli.width, cli.height, cli.frames),
    };

    let mut registry = SessionRegistry::with_settings(job.settings());
    let mut recordings = Vec::with_capacity(job.sessions.len());
    for session in &job.sessions {
        let id = session.path.to_string_lossy().into_owned();
        let source = SourceBuffer::rgb24(session.width, session.height);
        registry
            .create_session(&id, session.frame_rate, session.width, session.height, &source)
            .with_context(|| format!("creating session {}", id))?;
        recordings.push(Recording {
            id,
            width: session.width,
            height: session.height,
            source,
        });
    }

    for index in 0..job.frames {
        for recording in &recordings {
            pattern::paint(&recording.source, recording.width, recording.height, index);
            if let Err(e) = registry.encode_frame(&recording.id) {
                log::warn!(
                    "frame {} of {} failed: {} (status {})",
                    index,
                    recording.id,
                    e,
                    registry.status(&recording.id).unwrap_or_else(|e| e.code())
                );
            }
        }
    }

    let mut failed = 0;
    for recording in &recordings {
        let packets = registry
            .get(&recording.id)
            .map(|s| (s.frames_submitted(), s.packets_written()));
        match registry.shutdown_session(&recording.id) {
            Ok(()) => {
                if let Some((frames, packets)) = packets {
                    log::info!("{}: {} frames submitted, {} packets before flush", recording.id, frames, packets);
                }
            }
            Err(e) => {
                failed += 1;
                log::error!("{}: {} (status {})", recording.id, e, e.code());
            }
        }
    }
    registry.shutdown_all();

    if failed > 0 {
        anyhow::bail!("{} of {} recordings did not finish cleanly", failed, recordings.len());
    }
    Ok(())
}
