use std::collections::HashMap;
use std::path::PathBuf;

use crate::{
    codec::EncoderSettings,
    error::{EncodeError, Result},
    session::{EncodingSession, SessionConfig},
    source::SourceBuffer,
};

/// Owns every live session, keyed by the identifier the caller created it
/// with. The identifier doubles as the output file path.
///
/// Not synchronised: wrap it in a lock to share it between threads.
#[derive(Default)]
pub struct SessionRegistry {
    settings: EncoderSettings,
    sessions: HashMap<String, EncodingSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions created by this registry are configured with `settings`.
    pub fn with_settings(settings: EncoderSettings) -> Self {
        Self {
            settings,
            sessions: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Creates, configures and registers a session recording `source` to
    /// the file named `id`. A session that fails to configure is closed and
    /// not registered.
    pub fn create_session(
        &mut self,
        id: &str,
        frame_rate: u32,
        width: u32,
        height: u32,
        source: &SourceBuffer,
    ) -> Result<()> {
        if id.is_empty()
            || id.contains('\0')
            || frame_rate == 0
            || width == 0
            || height == 0
            || source.is_empty()
        {
            log::warn!(
                "create_session: invalid parameter provided (id: {:?}, fps: {}, size: {}x{}, buffer: {} bytes)",
                id,
                frame_rate,
                width,
                height,
                source.len()
            );
            return Err(EncodeError::InvalidParameter);
        }
        if !source.fits(width, height) {
            log::warn!(
                "create_session {}: buffer holds {} bytes, {}x{} rgb24 needs {}",
                id,
                source.len(),
                width,
                height,
                SourceBuffer::expected_len(width, height)
            );
            return Err(EncodeError::InvalidParameter);
        }
        if self.sessions.contains_key(id) {
            log::warn!("create_session {}: session already exists", id);
            return Err(EncodeError::InvalidParameter);
        }

        let config = SessionConfig {
            path: PathBuf::from(id),
            frame_rate,
            width,
            height,
        };
        let mut session = EncodingSession::new(config, self.settings.clone(), source.clone());
        session.configure()?;
        self.sessions.insert(id.to_string(), session);
        log::info!("session {} created", id);
        Ok(())
    }

    pub fn encode_frame(&mut self, id: &str) -> Result<()> {
        self.sessions
            .get_mut(id)
            .ok_or(EncodeError::NotFound)?
            .encode_frame()
    }

    /// Last recorded status code of the session.
    pub fn status(&self, id: &str) -> Result<i32> {
        self.sessions
            .get(id)
            .map(EncodingSession::status)
            .ok_or(EncodeError::NotFound)
    }

    /// Finishes the session's file and forgets the identifier.
    pub fn shutdown_session(&mut self, id: &str) -> Result<()> {
        let mut session = self.sessions.remove(id).ok_or(EncodeError::NotFound)?;
        log::info!("session {} shutting down", id);
        session.shutdown()
    }

    /// Finishes and removes every session.
    pub fn shutdown_all(&mut self) {
        for (id, mut session) in self.sessions.drain() {
            if let Err(e) = session.shutdown() {
                log::error!("session {} shutdown error: {}", id, e);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&EncodingSession> {
        self.sessions.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
