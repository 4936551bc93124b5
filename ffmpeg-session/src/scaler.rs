use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context, Flags};

use crate::error::{EncodeError, Result};

/// Converts full frames between pixel formats at a fixed size.
pub struct Scaler {
    context: Context,
}

impl Scaler {
    pub fn new(source: Pixel, target: Pixel, width: u32, height: u32) -> Result<Self> {
        let context = Context::get(source, width, height, target, width, height, Flags::BILINEAR)
            .map_err(|e| {
                log::error!(
                    "error allocating {:?} -> {:?} converter for {}x{}: {}",
                    source,
                    target,
                    width,
                    height,
                    e
                );
                EncodeError::FrameAllocationFailed
            })?;
        Ok(Self { context })
    }

    pub fn run(
        &mut self,
        frame: &ffmpeg_next::frame::Video,
        dst: &mut ffmpeg_next::frame::Video,
    ) -> Result<()> {
        self.context.run(frame, dst).map_err(|e| {
            log::error!("pixel format conversion failed: {}", e);
            EncodeError::ConversionFailed
        })
    }
}
