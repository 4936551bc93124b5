/// Registers FFmpeg components and lowers FFmpeg's own console logging to
/// warnings. Call once at startup before creating any session.
pub fn init() -> anyhow::Result<()> {
    ffmpeg_next::init().map_err(|e| anyhow::anyhow!("ffmpeg_next init: {}", e))?;
    ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Warning);
    Ok(())
}

pub mod codec;
pub mod container;
pub mod error;
pub mod frame;
pub mod orientation;
pub mod output;
pub mod packet;
pub mod registry;
pub mod scaler;
pub mod session;
pub mod source;

pub use codec::{CodecParameters, EncoderSettings};
pub use container::ContainerDescriptor;
pub use error::{EncodeError, Result, STATUS_OK, status_code};
pub use registry::SessionRegistry;
pub use session::{EncodingSession, SessionConfig, SessionState};
pub use source::SourceBuffer;
