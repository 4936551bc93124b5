// ============================================================================
// Session Tests
// ============================================================================

use std::path::{Path, PathBuf};

use ffmpeg_next::codec;

use super::{EncodingSession, SessionConfig, SessionState};
use crate::{codec::EncoderSettings, error::EncodeError, source::SourceBuffer};

fn session(path: PathBuf, width: u32, height: u32, fps: u32) -> EncodingSession {
    let config = SessionConfig {
        path,
        frame_rate: fps,
        width,
        height,
    };
    EncodingSession::new(config, EncoderSettings::default(), SourceBuffer::rgb24(width, height))
}

/// Paints a bar whose position depends on `frame` so consecutive frames differ.
fn paint(source: &SourceBuffer, width: u32, frame: usize) {
    let row = width as usize * 3;
    source.write(|pixels| {
        for (y, line) in pixels.chunks_mut(row).enumerate() {
            for (x, px) in line.chunks_mut(3).enumerate() {
                let on_bar = (x + frame * 4) % width as usize < 16;
                px[0] = if on_bar { 255 } else { (x % 256) as u8 };
                px[1] = (y % 256) as u8;
                px[2] = if on_bar { 255 } else { 64 };
            }
        }
    });
}

/// Opens the produced file and counts its video packets.
fn count_packets(path: &Path) -> anyhow::Result<(usize, u32, u32)> {
    let mut input = ffmpeg_next::format::input(path)
        .map_err(|e| anyhow::anyhow!("{} should open without error: {}", path.display(), e))?;
    let stream = input
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or(anyhow::anyhow!("no video stream in {}", path.display()))?;
    let index = stream.index();
    let decoder = codec::context::Context::from_parameters(stream.parameters())?
        .decoder()
        .video()?;
    let (width, height) = (decoder.width(), decoder.height());
    let count = input
        .packets()
        .filter(|(stream, _)| stream.index() == index)
        .count();
    Ok((count, width, height))
}

// ------------------------------------------------------------------------
// End to end
// ------------------------------------------------------------------------

#[test]
fn test_mp4_end_to_end() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("capture.mp4");
    let mut session = session(path.clone(), 320, 240, 25);

    session.configure()?;
    assert_eq!(session.status(), 0);
    assert_eq!(session.state(), SessionState::Configured);
    assert!(session.has_video());
    let descriptor = session.descriptor().unwrap();
    assert_eq!(descriptor.name(), "mp4");
    assert!(descriptor.requires_global_header());
    assert!(session.parameters().unwrap().global_header);

    let source = session.source().clone();
    for frame in 0..30 {
        paint(&source, 320, frame);
        session.encode_frame()?;
        assert_eq!(session.status(), 0);
    }
    assert_eq!(session.frames_submitted(), 30);
    assert!(session.packets_written() <= 30);

    session.shutdown()?;
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.packets_written() >= 1);
    assert!(session.packets_written() <= 30);
    assert!(session.stats().key_frames >= 1);

    let (packets, width, height) = count_packets(&path)?;
    assert_eq!((width, height), (320, 240));
    assert!(packets >= 1 && packets <= 30, "packet count {}", packets);
    assert_eq!(packets as u64, session.packets_written());
    Ok(())
}

#[test]
fn test_fallback_container_records_mpeg() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("capture.unknownext");
    let mut session = session(path.clone(), 320, 240, 25);

    session.configure()?;
    let parameters = *session.parameters().unwrap();
    assert_eq!(session.descriptor().unwrap().name(), "mpeg");
    assert_eq!(parameters.codec_id, codec::Id::MPEG1VIDEO);
    assert!(parameters.rd_macroblock_decision);
    assert!(!parameters.global_header);

    for frame in 0..10 {
        paint(session.source(), 320, frame);
        session.encode_frame()?;
    }
    session.shutdown()?;

    assert!(std::fs::metadata(&path)?.len() > 0);
    assert!(session.packets_written() >= 1 && session.packets_written() <= 10);
    Ok(())
}

#[test]
fn test_unaligned_size_still_configures() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let mut session = session(dir.path().join("odd.mp4"), 328, 200, 25);
    session.configure()?;
    assert_eq!(session.status(), 0);
    session.encode_frame()?;
    session.shutdown()?;
    Ok(())
}

// ------------------------------------------------------------------------
// State machine
// ------------------------------------------------------------------------

#[test]
fn test_encode_before_configure() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("never.mp4");
    let mut session = session(path.clone(), 320, 240, 25);

    assert_eq!(session.encode_frame(), Err(EncodeError::NoActiveStream));
    assert_eq!(session.status(), EncodeError::NoActiveStream.code());
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert_eq!(session.frames_submitted(), 0);
    assert!(!path.exists());
    Ok(())
}

#[test]
fn test_failed_configure_latches_status() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.mp4");
    // Odd width cannot be subsampled to 4:2:0.
    let mut session = session(path.clone(), 321, 240, 25);

    assert_eq!(session.configure(), Err(EncodeError::InvalidParameters));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.status(), EncodeError::InvalidParameters.code());
    assert!(!path.exists());

    assert_eq!(session.encode_frame(), Err(EncodeError::NoActiveStream));
    assert_eq!(session.status(), EncodeError::InvalidParameters.code());
    assert_eq!(session.configure(), Err(EncodeError::InvalidParameter));

    session.shutdown()?;
    assert_eq!(session.state(), SessionState::Closed);
    Ok(())
}

#[test]
fn test_configure_only_once() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let mut session = session(dir.path().join("once.mp4"), 160, 160, 25);
    session.configure()?;
    assert_eq!(session.configure(), Err(EncodeError::InvalidParameter));
    assert_eq!(session.state(), SessionState::Configured);
    Ok(())
}

#[test]
fn test_shutdown_is_idempotent() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let mut session = session(dir.path().join("twice.mp4"), 160, 160, 25);
    session.configure()?;
    session.encode_frame()?;

    session.shutdown()?;
    let packets = session.packets_written();
    session.shutdown()?;
    assert_eq!(session.state(), SessionState::Closed);

    // The shutdown guard turns late encode calls into no-ops.
    assert_eq!(session.encode_frame(), Ok(()));
    assert_eq!(session.frames_submitted(), 1);
    assert_eq!(session.packets_written(), packets);
    Ok(())
}

#[test]
fn test_shutdown_without_configure() {
    let mut session = session(PathBuf::from("unused.mp4"), 160, 160, 25);
    assert_eq!(session.shutdown(), Ok(()));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!Path::new("unused.mp4").exists());
}

#[test]
fn test_video_less_container() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let mut session = session(dir.path().join("voice.wav"), 160, 160, 25);

    session.configure()?;
    assert!(!session.has_video());
    assert_eq!(session.encode_frame(), Ok(()));
    assert_eq!(session.frames_submitted(), 0);
    session.shutdown()?;
    Ok(())
}

#[test]
fn test_unwritable_path() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("missing").join("capture.mp4");
    let mut session = session(path, 160, 160, 25);
    assert_eq!(session.configure(), Err(EncodeError::FileOpenFailed));
    assert_eq!(session.state(), SessionState::Failed);
    Ok(())
}

#[test]
fn test_codec_open_failure_latches_status() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("slow.mpg");
    // 7 fps is not in the MPEG-1 frame rate table.
    let mut session = session(path.clone(), 160, 160, 7);

    assert_eq!(session.configure(), Err(EncodeError::CodecOpenFailed));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.status(), EncodeError::CodecOpenFailed.code());
    assert!(!session.has_video());
    assert!(!path.exists());
    Ok(())
}

#[test]
fn test_short_source_buffer() -> anyhow::Result<()> {
    crate::init()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("short.mp4");
    let config = SessionConfig {
        path: path.clone(),
        frame_rate: 25,
        width: 160,
        height: 160,
    };
    let mut session = EncodingSession::new(
        config,
        EncoderSettings::default(),
        SourceBuffer::rgb24(160, 80),
    );

    assert_eq!(session.configure(), Err(EncodeError::InvalidParameter));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(!path.exists());
    Ok(())
}

#[test]
fn test_nul_in_path() -> anyhow::Result<()> {
    crate::init()?;
    let mut session = session(PathBuf::from("bad\0name.mp4"), 160, 160, 25);
    assert_eq!(session.configure(), Err(EncodeError::InvalidParameter));
    assert_eq!(session.status(), EncodeError::InvalidParameter.code());
    Ok(())
}
