use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    codec::{CodecParameters, EncoderSettings, VideoEncoder},
    container::{self, ContainerDescriptor},
    error::{EncodeError, Result, STATUS_OK},
    frame::{FrameBuffers, SOURCE_PIXEL_FORMAT},
    output::AvOutput,
    packet::PacketStats,
    scaler::Scaler,
    source::SourceBuffer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Configured,
    Failed,
    Closed,
}

/// Where and what a session records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub path: PathBuf,
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
}

/// One outgoing video file.
///
/// `configure` resolves the container, opens the codec and writes the
/// header; every `encode_frame` converts the caller's [`SourceBuffer`],
/// flips it and muxes whatever the codec emits; `shutdown` (or drop)
/// drains the codec and writes the trailer.
pub struct EncodingSession {
    config: SessionConfig,
    settings: EncoderSettings,
    source: SourceBuffer,
    state: SessionState,
    last_error: Option<EncodeError>,
    shutdown_requested: bool,
    descriptor: Option<ContainerDescriptor>,
    parameters: Option<CodecParameters>,
    // Released in field order during shutdown.
    encoder: Option<VideoEncoder>,
    output: Option<AvOutput>,
    scaler: Option<Scaler>,
    buffers: Option<FrameBuffers>,
    frame_index: i64,
    stats: PacketStats,
}

impl EncodingSession {
    pub fn new(config: SessionConfig, settings: EncoderSettings, source: SourceBuffer) -> Self {
        Self {
            config,
            settings,
            source,
            state: SessionState::Uninitialized,
            last_error: None,
            shutdown_requested: false,
            descriptor: None,
            parameters: None,
            encoder: None,
            output: None,
            scaler: None,
            buffers: None,
            frame_index: 0,
            stats: PacketStats::default(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Numeric status of the last operation, 0 when it succeeded.
    pub fn status(&self) -> i32 {
        self.last_error.map_or(STATUS_OK, EncodeError::code)
    }

    pub fn last_error(&self) -> Option<EncodeError> {
        self.last_error
    }

    pub fn descriptor(&self) -> Option<&ContainerDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn parameters(&self) -> Option<&CodecParameters> {
        self.parameters.as_ref()
    }

    /// Whether the session records a video stream.
    pub fn has_video(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frame_index as u64
    }

    pub fn packets_written(&self) -> u64 {
        self.stats.packets
    }

    pub fn stats(&self) -> &PacketStats {
        &self.stats
    }

    pub fn source(&self) -> &SourceBuffer {
        &self.source
    }

    /// Sets the session up for recording. Only legal once, on a fresh
    /// session; any failure leaves it `Failed` for good.
    pub fn configure(&mut self) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            log::warn!(
                "configure called on {} in state {:?}",
                self.config.path.display(),
                self.state
            );
            return Err(EncodeError::InvalidParameter);
        }

        let result = self.try_configure();
        match result {
            Ok(()) => {
                self.state = SessionState::Configured;
                self.last_error = None;
            }
            Err(e) => {
                log::error!("configure {} failed: {}", self.config.path.display(), e);
                self.state = SessionState::Failed;
                self.last_error = Some(e);
                self.release();
            }
        }
        result
    }

    fn try_configure(&mut self) -> Result<()> {
        let SessionConfig {
            path,
            frame_rate,
            width,
            height,
        } = self.config.clone();

        if path.as_os_str().as_encoded_bytes().contains(&0) {
            log::error!("output path {:?} contains a NUL byte", path);
            return Err(EncodeError::InvalidParameter);
        }
        if !self.source.fits(width, height) {
            log::error!(
                "source buffer holds {} bytes, {}x{} rgb24 needs {}",
                self.source.len(),
                width,
                height,
                SourceBuffer::expected_len(width, height)
            );
            return Err(EncodeError::InvalidParameter);
        }

        let descriptor = container::negotiate(&path, &self.settings.fallback_container)?;
        let mut output = AvOutput::alloc(&path, &descriptor)?;

        match descriptor.video_codec() {
            Some(codec_id) => {
                let parameters = CodecParameters::new(
                    codec_id,
                    &descriptor,
                    &self.settings,
                    width,
                    height,
                    frame_rate,
                );
                if !parameters.is_aligned(self.settings.alignment) {
                    log::warn!(
                        "frame size {}x{} is not divisible by {}, some codecs may not like this",
                        width,
                        height,
                        self.settings.alignment
                    );
                }
                let encoder = VideoEncoder::open(&mut output, parameters)?;
                let buffers = FrameBuffers::allocate(&parameters)?;
                let scaler = Scaler::new(SOURCE_PIXEL_FORMAT, parameters.pixel_format, width, height)?;
                output.open_file()?;
                output.write_header()?;

                log::info!(
                    "recording {} -> {}: {:?} {}x{} @ {} fps, {} bps, gop {}, global header: {}",
                    path.display(),
                    descriptor,
                    parameters.codec_id,
                    parameters.width,
                    parameters.height,
                    parameters.frame_rate,
                    parameters.bit_rate,
                    parameters.gop_size,
                    parameters.global_header
                );

                self.parameters = Some(parameters);
                self.encoder = Some(encoder);
                self.buffers = Some(buffers);
                self.scaler = Some(scaler);
            }
            None => {
                log::warn!(
                    "container {} has no video codec, {} will not record video",
                    descriptor.name(),
                    path.display()
                );
            }
        }

        self.descriptor = Some(descriptor);
        self.output = Some(output);
        Ok(())
    }

    /// Encodes the current contents of the source buffer as the next frame.
    pub fn encode_frame(&mut self) -> Result<()> {
        if self.shutdown_requested {
            return Ok(());
        }

        if self.state != SessionState::Configured {
            log::error!(
                "encode_frame on {}: you need to create a stream first",
                self.config.path.display()
            );
            if self.state == SessionState::Uninitialized {
                self.last_error = Some(EncodeError::NoActiveStream);
            }
            return Err(EncodeError::NoActiveStream);
        }

        let result = self.encode_current();
        self.last_error = result.err();
        result
    }

    fn encode_current(&mut self) -> Result<()> {
        let (Some(encoder), Some(buffers), Some(scaler), Some(output)) = (
            self.encoder.as_mut(),
            self.buffers.as_mut(),
            self.scaler.as_mut(),
            self.output.as_mut(),
        ) else {
            // Configured without a video stream.
            return Ok(());
        };

        buffers.load_source(&self.source);
        buffers.convert(scaler)?;
        let (frame, packet) = buffers.split_mut();
        frame.set_pts(Some(self.frame_index));
        encoder.send_frame(frame)?;
        self.frame_index += 1;

        drain_packets(encoder, packet, output, &mut self.stats)
    }

    /// Finishes the file and releases every resource. Safe to call more
    /// than once; later calls do nothing.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.shutdown_requested = true;

        let mut result = Ok(());
        if let Some(mut encoder) = self.encoder.take() {
            if self.settings.flush_on_shutdown && self.state == SessionState::Configured {
                if let (Some(buffers), Some(output)) = (self.buffers.as_mut(), self.output.as_mut()) {
                    result = encoder.send_eof().and_then(|()| {
                        drain_packets(&mut encoder, buffers.packet_mut(), output, &mut self.stats)
                    });
                }
            }
        }
        if let Some(mut output) = self.output.take() {
            let finished = output.finish();
            if result.is_ok() {
                result = finished;
            }
        }
        self.release();
        self.state = SessionState::Closed;

        log::info!(
            "closed {}: {} frames, {} packets ({} key), {} bytes",
            self.config.path.display(),
            self.frame_index,
            self.stats.packets,
            self.stats.key_frames,
            self.stats.bytes
        );
        if let Err(e) = result {
            log::error!("shutdown of {} incomplete: {}", self.config.path.display(), e);
        }
        result
    }

    fn release(&mut self) {
        self.encoder = None;
        self.output = None;
        self.scaler = None;
        self.buffers = None;
    }
}

impl Drop for EncodingSession {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Writes every packet the encoder has ready.
fn drain_packets(
    encoder: &mut VideoEncoder,
    packet: &mut ffmpeg_next::Packet,
    output: &mut AvOutput,
    stats: &mut PacketStats,
) -> Result<()> {
    while encoder.receive_packet(packet)? {
        let info = output.write_packet(packet, encoder.stream_index(), encoder.time_base())?;
        stats.record(info);
    }
    Ok(())
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
