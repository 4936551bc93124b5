use std::sync::{Arc, PoisonError, RwLock};

/// Bytes per RGB24 pixel.
pub const RGB24_PIXEL_SIZE: usize = 3;

/// Caller-owned RGB24 pixel buffer a session reads from on every encode.
///
/// Rows are top-down and tightly packed (`width * 3` bytes each). The caller
/// keeps a handle and rewrites the pixels between encode calls; sessions
/// only ever read it.
#[derive(Clone, Default)]
pub struct SourceBuffer {
    pixels: Arc<RwLock<Vec<u8>>>,
}

impl SourceBuffer {
    /// A black frame of the given size.
    pub fn rgb24(width: u32, height: u32) -> Self {
        Self::from_vec(vec![0; Self::expected_len(width, height)])
    }

    pub fn from_vec(pixels: Vec<u8>) -> Self {
        Self {
            pixels: Arc::new(RwLock::new(pixels)),
        }
    }

    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * RGB24_PIXEL_SIZE
    }

    pub fn len(&self) -> usize {
        self.read(|pixels| pixels.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer holds exactly one frame of `width` x `height`.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        width > 0 && height > 0 && self.len() == Self::expected_len(width, height)
    }

    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let pixels = self.pixels.read().unwrap_or_else(PoisonError::into_inner);
        f(&pixels)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut pixels = self.pixels.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut pixels)
    }

    /// Whether both handles point at the same pixels.
    pub fn same_buffer(&self, other: &SourceBuffer) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl std::fmt::Debug for SourceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceBuffer {{ len: {} }}", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb24_size() {
        let buffer = SourceBuffer::rgb24(4, 2);
        assert_eq!(buffer.len(), 24);
        assert!(buffer.fits(4, 2));
        assert!(!buffer.fits(2, 2));
        assert!(!buffer.fits(0, 8));
    }

    #[test]
    fn test_writes_visible_through_clones() {
        let buffer = SourceBuffer::rgb24(2, 2);
        let held = buffer.clone();
        buffer.write(|pixels| pixels[5] = 200);
        assert_eq!(held.read(|pixels| pixels[5]), 200);
        assert!(held.same_buffer(&buffer));
        assert!(!held.same_buffer(&SourceBuffer::rgb24(2, 2)));
    }

    #[test]
    fn test_empty() {
        assert!(SourceBuffer::default().is_empty());
        assert!(SourceBuffer::from_vec(Vec::new()).is_empty());
    }
}
