use ffmpeg_next::{Rational, codec, encoder, format::Pixel};

use crate::{
    container::{ContainerDescriptor, DEFAULT_CONTAINER},
    error::{EncodeError, Result},
    output::AvOutput,
};

/// Constants every session is configured with.
#[derive(Debug, Clone)]
pub struct EncoderSettings {
    pub bit_rate: usize,
    pub gop_size: u32,
    pub pixel_format: Pixel,
    /// Container used when the file name does not identify one.
    pub fallback_container: String,
    /// Dimensions not divisible by this are reported, not rejected. The
    /// classic recommendation was a multiple of 160; 16 is one macroblock.
    /// Odd sizes are still refused by [`CodecParameters::validate`] since
    /// 4:2:0 chroma needs even dimensions.
    pub alignment: u32,
    /// Drain frames buffered inside the codec before writing the trailer.
    pub flush_on_shutdown: bool,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            bit_rate: 7_500_000,
            gop_size: 12,
            pixel_format: Pixel::YUV420P,
            fallback_container: DEFAULT_CONTAINER.to_string(),
            alignment: 16,
            flush_on_shutdown: true,
        }
    }
}

/// Parameters the codec is opened with. Fixed once the session is configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecParameters {
    pub codec_id: codec::Id,
    pub bit_rate: usize,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    pub time_base: Rational,
    pub gop_size: u32,
    pub pixel_format: Pixel,
    /// Rate-distortion macroblock decision, set for MPEG-1 video.
    pub rd_macroblock_decision: bool,
    pub global_header: bool,
}

impl CodecParameters {
    pub fn new(
        codec_id: codec::Id,
        container: &ContainerDescriptor,
        settings: &EncoderSettings,
        width: u32,
        height: u32,
        frame_rate: u32,
    ) -> Self {
        let frame_rate = frame_rate.min(i32::MAX as u32) as i32;
        Self {
            codec_id,
            bit_rate: settings.bit_rate,
            width,
            height,
            frame_rate: Rational::new(frame_rate, 1),
            time_base: Rational::new(1, frame_rate),
            gop_size: settings.gop_size,
            pixel_format: settings.pixel_format,
            rd_macroblock_decision: codec_id == codec::Id::MPEG1VIDEO,
            global_header: container.requires_global_header(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            log::error!("invalid frame size {}x{}", self.width, self.height);
            return Err(EncodeError::InvalidParameters);
        }
        if self.frame_rate.numerator() <= 0 {
            log::error!("invalid frame rate {}", self.frame_rate);
            return Err(EncodeError::InvalidParameters);
        }
        // 4:2:0 chroma planes are half size in both directions.
        if self.pixel_format == Pixel::YUV420P && (self.width % 2 != 0 || self.height % 2 != 0) {
            log::error!(
                "frame size {}x{} is not even, {:?} needs even dimensions",
                self.width,
                self.height,
                self.pixel_format
            );
            return Err(EncodeError::InvalidParameters);
        }
        Ok(())
    }

    pub fn is_aligned(&self, alignment: u32) -> bool {
        alignment == 0 || (self.width % alignment == 0 && self.height % alignment == 0)
    }
}

/// An opened video encoder bound to one output stream.
pub struct VideoEncoder {
    inner: encoder::Video,
    stream_index: usize,
    parameters: CodecParameters,
}

impl VideoEncoder {
    /// Adds a video stream to `output` and opens an encoder for it.
    pub fn open(output: &mut AvOutput, parameters: CodecParameters) -> Result<Self> {
        let found = encoder::find(parameters.codec_id);

        let mut stream = output.context_mut().add_stream(found).map_err(|e| {
            log::error!("error allocating video stream: {}", e);
            EncodeError::StreamAllocationFailed
        })?;
        let stream_index = stream.index();
        stream.set_time_base(parameters.time_base);

        parameters.validate()?;

        let video_codec = found.ok_or_else(|| {
            log::error!("codec not found: {:?}", parameters.codec_id);
            EncodeError::CodecNotFound
        })?;
        if let Some(mut formats) = video_codec.video().ok().and_then(|v| v.formats()) {
            if !formats.any(|f| f == parameters.pixel_format) {
                log::error!(
                    "encoder {} does not accept {:?}",
                    video_codec.name(),
                    parameters.pixel_format
                );
                return Err(EncodeError::InvalidParameters);
            }
        }

        let mut video = codec::context::Context::new_with_codec(video_codec)
            .encoder()
            .video()
            .map_err(|e| {
                log::error!("could not create encoder context: {}", e);
                EncodeError::CodecOpenFailed
            })?;
        video.set_width(parameters.width);
        video.set_height(parameters.height);
        video.set_format(parameters.pixel_format);
        video.set_bit_rate(parameters.bit_rate);
        video.set_gop(parameters.gop_size);
        video.set_time_base(parameters.time_base);
        video.set_frame_rate(Some(parameters.frame_rate));
        if parameters.rd_macroblock_decision {
            video.set_mb_decision(encoder::Decision::RateDistortion);
        }
        if parameters.global_header {
            video.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let opened = video.open_as(video_codec).map_err(|e| {
            log::error!("could not open codec {}: {}", video_codec.name(), e);
            EncodeError::CodecOpenFailed
        })?;
        stream.set_parameters(&opened);
        log::info!("encoder opened: {}", video_codec.name());

        Ok(Self {
            inner: opened,
            stream_index,
            parameters,
        })
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn time_base(&self) -> Rational {
        self.parameters.time_base
    }

    pub fn parameters(&self) -> &CodecParameters {
        &self.parameters
    }

    pub fn send_frame(&mut self, frame: &ffmpeg_next::frame::Video) -> Result<()> {
        self.inner.send_frame(frame).map_err(|e| {
            log::error!("send frame error: {}", e);
            EncodeError::EncodeFailed
        })
    }

    pub fn send_eof(&mut self) -> Result<()> {
        self.inner.send_eof().map_err(|e| {
            log::error!("send eof error: {}", e);
            EncodeError::EncodeFailed
        })
    }

    /// Fills `packet` with the next compressed frame. `Ok(false)` means the
    /// codec is holding frames back and produced nothing this time.
    pub fn receive_packet(&mut self, packet: &mut ffmpeg_next::Packet) -> Result<bool> {
        match self.inner.receive_packet(packet) {
            Ok(()) => Ok(true),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                Ok(false)
            }
            Err(ffmpeg_next::Error::Eof) => Ok(false),
            Err(e) => {
                log::error!("receive packet error: {}", e);
                Err(EncodeError::EncodeFailed)
            }
        }
    }
}
