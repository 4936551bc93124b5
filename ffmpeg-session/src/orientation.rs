//! Vertical flip of planar frames, in place.
//!
//! Every plane is flipped on its own geometry: chroma planes of a 4:2:0
//! frame have half the rows and their own stride.

/// Reverses the order of the first `rows` rows of `stride` bytes in `data`.
///
/// Rows are swapped pairwise from the outside in; the middle row of an odd
/// plane stays where it is. Applying it twice restores the input.
pub fn flip_plane(data: &mut [u8], stride: usize, rows: usize) {
    if stride == 0 {
        return;
    }
    let rows = rows.min(data.len() / stride);
    if rows < 2 {
        return;
    }

    let mut top = 0;
    let mut bottom = rows - 1;
    while top < bottom {
        let (head, tail) = data.split_at_mut(bottom * stride);
        head[top * stride..(top + 1) * stride].swap_with_slice(&mut tail[..stride]);
        top += 1;
        bottom -= 1;
    }
}

/// Flips every plane of `frame` upside down.
pub fn flip_frame(frame: &mut ffmpeg_next::frame::Video) {
    for plane in 0..frame.planes() {
        let stride = frame.stride(plane);
        let rows = frame.plane_height(plane) as usize;
        flip_plane(frame.data_mut(plane), stride, rows);
    }
}
