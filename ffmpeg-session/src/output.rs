use std::ffi::{CString, c_int};
use std::path::Path;
use std::ptr;

use ffmpeg_next::{Rational, ffi};

use crate::{
    container::ContainerDescriptor,
    error::{EncodeError, Result},
    packet::PacketInfo,
};

/// The container side of a session: header, packets, trailer.
pub struct AvOutput {
    inner: ffmpeg_next::format::context::Output,
    path: CString,
    needs_file: bool,
    have_opened_file: bool,
    have_written_header: bool,
    have_written_trailer: bool,
}

impl AvOutput {
    /// Allocates the output context for `descriptor`. Nothing touches the
    /// disk until [`AvOutput::open_file`].
    pub fn alloc(path: &Path, descriptor: &ContainerDescriptor) -> Result<Self> {
        let c_path = CString::new(path.to_string_lossy().as_bytes()).map_err(|_| {
            log::error!("output path {:?} contains a NUL byte", path);
            EncodeError::InvalidParameter
        })?;
        let c_name = CString::new(descriptor.name()).map_err(|_| EncodeError::UnsupportedFormat)?;

        let mut ctx: *mut ffi::AVFormatContext = ptr::null_mut();
        let ret = unsafe {
            ffi::avformat_alloc_output_context2(
                &mut ctx,
                ptr::null_mut(),
                c_name.as_ptr(),
                c_path.as_ptr(),
            )
        };
        if ret < 0 || ctx.is_null() {
            log::error!(
                "error allocating output context for {}: {}",
                descriptor.name(),
                ffmpeg_next::Error::from(ret)
            );
            return Err(EncodeError::ContextAllocationFailed);
        }

        Ok(Self {
            inner: unsafe { ffmpeg_next::format::context::Output::wrap(ctx) },
            path: c_path,
            needs_file: descriptor.needs_file(),
            have_opened_file: false,
            have_written_header: false,
            have_written_trailer: false,
        })
    }

    pub(crate) fn context_mut(&mut self) -> &mut ffmpeg_next::format::context::Output {
        &mut self.inner
    }

    /// Opens the destination for writing, unless the muxer does its own I/O.
    pub fn open_file(&mut self) -> Result<()> {
        if !self.needs_file || self.have_opened_file {
            return Ok(());
        }
        let ret = unsafe {
            let ctx = self.inner.as_mut_ptr();
            ffi::avio_open(
                &mut (*ctx).pb,
                self.path.as_ptr(),
                ffi::AVIO_FLAG_WRITE as c_int,
            )
        };
        if ret < 0 {
            log::error!(
                "unable to open output file <{}>: {}",
                self.path.to_string_lossy(),
                ffmpeg_next::Error::from(ret)
            );
            return Err(EncodeError::FileOpenFailed);
        }
        self.have_opened_file = true;
        Ok(())
    }

    /// Writes the container header. A muxer refusing the stream parameters
    /// surfaces here.
    pub fn write_header(&mut self) -> Result<()> {
        if self.have_written_header {
            return Ok(());
        }
        self.open_file()?;
        self.inner.write_header().map_err(|e| {
            log::error!("invalid output parameters, header rejected: {}", e);
            EncodeError::InvalidParameters
        })?;
        self.have_written_header = true;
        Ok(())
    }

    /// Stamps `packet` for `stream_index`, rescales its timestamps from the
    /// encoder time base and hands it to the interleaver.
    pub fn write_packet(
        &mut self,
        packet: &mut ffmpeg_next::Packet,
        stream_index: usize,
        time_base: Rational,
    ) -> Result<PacketInfo> {
        if !self.have_written_header {
            self.write_header()?;
        }

        let out_time_base = match self.inner.stream(stream_index) {
            Some(stream) => stream.time_base(),
            None => return Err(EncodeError::NoActiveStream),
        };
        packet.set_stream(stream_index);
        packet.set_position(-1);
        packet.rescale_ts(time_base, out_time_base);
        let info = PacketInfo::from(&*packet);

        packet.write_interleaved(&mut self.inner).map_err(|e| {
            log::error!("failed to write {}: {}", info, e);
            EncodeError::MuxWriteFailed
        })?;
        log::trace!("wrote {}", info);
        Ok(info)
    }

    /// Writes the trailer once, if a header was written.
    pub fn finish(&mut self) -> Result<()> {
        if self.have_written_header && !self.have_written_trailer {
            self.have_written_trailer = true;
            self.inner.write_trailer().map_err(|e| {
                log::error!("failed to write trailer: {}", e);
                EncodeError::MuxWriteFailed
            })?;
        }
        Ok(())
    }
}
