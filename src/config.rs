use std::path::{Path, PathBuf};

use anyhow::Context as _;
use ffmpeg_session::{EncoderSettings, SessionConfig};
use serde::{Deserialize, Serialize};

/// A recording job: one or more files fed with the same number of frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordJob {
    #[serde(default = "default_frames")]
    pub frames: u32,
    pub sessions: Vec<SessionConfig>,
    #[serde(default)]
    pub encoder: EncoderOverrides,
}

/// Optional replacements for the encoder constants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderOverrides {
    pub bit_rate: Option<usize>,
    pub gop_size: Option<u32>,
    pub fallback_container: Option<String>,
    pub flush_on_shutdown: Option<bool>,
}

fn default_frames() -> u32 {
    30
}

impl RecordJob {
    pub fn single(path: PathBuf, frame_rate: u32, width: u32, height: u32, frames: u32) -> Self {
        Self {
            frames,
            sessions: vec![SessionConfig {
                path,
                frame_rate,
                width,
                height,
            }],
            encoder: EncoderOverrides::default(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading job file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing job file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let job: RecordJob = serde_json::from_str(text)?;
        if job.sessions.is_empty() {
            anyhow::bail!("job lists no sessions");
        }
        Ok(job)
    }

    pub fn settings(&self) -> EncoderSettings {
        let mut settings = EncoderSettings::default();
        if let Some(bit_rate) = self.encoder.bit_rate {
            settings.bit_rate = bit_rate;
        }
        if let Some(gop_size) = self.encoder.gop_size {
            settings.gop_size = gop_size;
        }
        if let Some(ref container) = self.encoder.fallback_container {
            settings.fallback_container = container.clone();
        }
        if let Some(flush) = self.encoder.flush_on_shutdown {
            settings.flush_on_shutdown = flush;
        }
        settings
    }
}
