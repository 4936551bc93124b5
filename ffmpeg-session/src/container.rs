//! Container negotiation.
//!
//! Resolves the output container from the destination file name, falling
//! back to a named default when the extension is not recognised.

use std::ffi::{CStr, CString, c_char, c_int};
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::ptr;

use ffmpeg_next::{codec, ffi, format};

use crate::error::{EncodeError, Result};

/// MPEG program stream, used when the file name says nothing useful.
pub const DEFAULT_CONTAINER: &str = "mpeg";

/// Containers that want codec headers stored once, outside the bitstream.
const SEPARATE_HEADER_CONTAINERS: &[&str] = &["mp4", "mov", "3gp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDescriptor {
    name: String,
    long_name: String,
    flags: c_int,
    video_codec: codec::Id,
}

impl ContainerDescriptor {
    /// Guesses the container from the extension of `path`.
    pub fn guess(path: &Path) -> Option<Self> {
        let path = CString::new(path.to_string_lossy().as_bytes()).ok()?;
        unsafe {
            let format: *const ffi::AVOutputFormat =
                ffi::av_guess_format(ptr::null(), path.as_ptr(), ptr::null());
            Self::from_raw(format)
        }
    }

    /// Looks a container up by its short name (e.g. `"mpeg"`, `"mp4"`).
    pub fn find(name: &str) -> Option<Self> {
        let name = CString::new(name).ok()?;
        unsafe {
            let format: *const ffi::AVOutputFormat =
                ffi::av_guess_format(name.as_ptr(), ptr::null(), ptr::null());
            Self::from_raw(format)
        }
    }

    unsafe fn from_raw(format: *const ffi::AVOutputFormat) -> Option<Self> {
        if format.is_null() {
            return None;
        }
        let format = unsafe { &*format };
        let name = unsafe { c_string(format.name) };
        let long_name = unsafe { c_string(format.long_name) };
        Some(Self {
            name,
            long_name,
            flags: format.flags,
            video_codec: codec::Id::from(format.video_codec),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn flags(&self) -> format::Flags {
        format::Flags::from_bits_truncate(self.flags)
    }

    /// Default video codec of the container, `None` for containers that
    /// carry no video.
    pub fn video_codec(&self) -> Option<codec::Id> {
        match self.video_codec {
            codec::Id::None => None,
            id => Some(id),
        }
    }

    /// Whether the codec must be opened with a global header.
    pub fn requires_global_header(&self) -> bool {
        SEPARATE_HEADER_CONTAINERS.contains(&self.name.as_str())
    }

    /// Whether the muxer writes through a file handle.
    pub fn needs_file(&self) -> bool {
        !self.flags().contains(format::Flags::NO_FILE)
    }
}

impl Display for ContainerDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}), video codec: {:?}, global header: {}",
            self.name,
            self.long_name,
            self.video_codec,
            self.requires_global_header()
        )
    }
}

unsafe fn c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Resolves the container for `path`, falling back to `fallback` when the
/// extension is not recognised.
pub fn negotiate(path: &Path, fallback: &str) -> Result<ContainerDescriptor> {
    if let Some(descriptor) = ContainerDescriptor::guess(path) {
        log::debug!("deduced container {} from {}", descriptor.name(), path.display());
        return Ok(descriptor);
    }

    log::warn!(
        "could not deduce output format from file extension of {}, defaulting to {}",
        path.display(),
        fallback
    );
    ContainerDescriptor::find(fallback).ok_or_else(|| {
        log::error!("unable to locate a suitable encoding format for {}", path.display());
        EncodeError::UnsupportedFormat
    })
}
