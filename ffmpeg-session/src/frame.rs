use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::Video;

use crate::{
    codec::CodecParameters,
    error::{EncodeError, Result},
    orientation,
    scaler::Scaler,
    source::{RGB24_PIXEL_SIZE, SourceBuffer},
};

/// Pixel format of the caller's buffer.
pub const SOURCE_PIXEL_FORMAT: Pixel = Pixel::RGB24;

/// Buffers one video session encodes through: a staging frame in the
/// source format, the frame handed to the codec, and the packet slot the
/// codec writes compressed output into.
pub struct FrameBuffers {
    width: u32,
    height: u32,
    source: Video,
    converted: Video,
    packet: ffmpeg_next::Packet,
}

impl FrameBuffers {
    pub fn allocate(parameters: &CodecParameters) -> Result<Self> {
        let source = alloc_frame(SOURCE_PIXEL_FORMAT, parameters.width, parameters.height)?;
        let converted = alloc_frame(parameters.pixel_format, parameters.width, parameters.height)?;
        log::debug!(
            "allocated {}x{} frames, source strides: {}, codec strides: {:?}",
            parameters.width,
            parameters.height,
            source.stride(0),
            (0..converted.planes())
                .map(|p| converted.stride(p))
                .collect::<Vec<_>>()
        );
        Ok(Self {
            width: parameters.width,
            height: parameters.height,
            source,
            converted,
            packet: ffmpeg_next::Packet::empty(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Copies the caller's tightly packed rows into the staging frame.
    pub fn load_source(&mut self, source: &SourceBuffer) {
        let row = self.width as usize * RGB24_PIXEL_SIZE;
        let stride = self.source.stride(0);
        let staging = &mut self.source;
        source.read(|pixels| {
            let lines = staging.data_mut(0).chunks_mut(stride);
            for (src, dst) in pixels.chunks_exact(row).zip(lines) {
                dst[..row].copy_from_slice(src);
            }
        });
    }

    /// Converts the staging frame into the codec frame and corrects its
    /// scanline order.
    pub fn convert(&mut self, scaler: &mut Scaler) -> Result<()> {
        scaler.run(&self.source, &mut self.converted)?;
        orientation::flip_frame(&mut self.converted);
        Ok(())
    }

    pub fn source(&self) -> &Video {
        &self.source
    }

    pub fn converted(&self) -> &Video {
        &self.converted
    }

    pub fn packet_mut(&mut self) -> &mut ffmpeg_next::Packet {
        &mut self.packet
    }

    /// The codec frame and the packet slot, borrowed together.
    pub fn split_mut(&mut self) -> (&mut Video, &mut ffmpeg_next::Packet) {
        (&mut self.converted, &mut self.packet)
    }
}

fn alloc_frame(format: Pixel, width: u32, height: u32) -> Result<Video> {
    let frame = Video::new(format, width, height);
    if unsafe { frame.is_empty() } {
        log::error!("error allocating {:?} video frame {}x{}", format, width, height);
        return Err(EncodeError::FrameAllocationFailed);
    }
    Ok(frame)
}
