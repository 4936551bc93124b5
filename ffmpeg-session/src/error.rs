use thiserror::Error;

/// Status code reported for a session whose last operation succeeded.
pub const STATUS_OK: i32 = 0;

/// One variant per failure point of a recording session. Every variant has a
/// stable integer code, see [`EncodeError::code`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodeError {
    #[error("unable to locate a suitable container format")]
    UnsupportedFormat,

    #[error("error allocating output context")]
    ContextAllocationFailed,

    #[error("error allocating video stream")]
    StreamAllocationFailed,

    #[error("invalid output parameters")]
    InvalidParameters,

    #[error("codec not found")]
    CodecNotFound,

    #[error("could not open codec")]
    CodecOpenFailed,

    #[error("error allocating video frame")]
    FrameAllocationFailed,

    #[error("unable to open output file")]
    FileOpenFailed,

    #[error("no active stream, the session has to be configured first")]
    NoActiveStream,

    #[error("invalid parameter provided")]
    InvalidParameter,

    #[error("session not found")]
    NotFound,

    #[error("failed to write packet to container")]
    MuxWriteFailed,

    #[error("pixel format conversion failed")]
    ConversionFailed,

    #[error("frame compression failed")]
    EncodeFailed,
}

impl EncodeError {
    pub fn code(self) -> i32 {
        match self {
            EncodeError::UnsupportedFormat => 1,
            EncodeError::ContextAllocationFailed => 2,
            EncodeError::StreamAllocationFailed => 3,
            EncodeError::InvalidParameters => 4,
            EncodeError::CodecNotFound => 5,
            EncodeError::CodecOpenFailed => 6,
            EncodeError::FrameAllocationFailed => 7,
            EncodeError::FileOpenFailed => 10,
            EncodeError::NoActiveStream => 11,
            EncodeError::InvalidParameter => 12,
            EncodeError::NotFound => 13,
            EncodeError::MuxWriteFailed => 14,
            EncodeError::ConversionFailed => 15,
            EncodeError::EncodeFailed => 16,
        }
    }
}

pub type Result<T> = std::result::Result<T, EncodeError>;

/// Maps an operation result onto the numeric status contract.
pub fn status_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => e.code(),
    }
}
