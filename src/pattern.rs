use ffmpeg_session::SourceBuffer;

/// Draws frame `index` of a moving colour-bar pattern into `source`.
///
/// Rows are painted bottom-up, the way a GL read-back delivers them, so the
/// recorded file shows the gradient dark at the top.
pub fn paint(source: &SourceBuffer, width: u32, height: u32, index: u32) {
    let row = width as usize * 3;
    let height = height.max(1) as usize;
    let offset = index as usize * 4;
    source.write(|pixels| {
        for (y, line) in pixels.chunks_mut(row).enumerate() {
            let shade = (255 * (height - 1 - y.min(height - 1)) / height) as u8;
            for (x, px) in line.chunks_mut(3).enumerate() {
                let bar = ((x + offset) / 32) % 6;
                let [r, g, b] = match bar {
                    0 => [255, 0, 0],
                    1 => [255, 255, 0],
                    2 => [0, 255, 0],
                    3 => [0, 255, 255],
                    4 => [0, 0, 255],
                    _ => [255, 0, 255],
                };
                px[0] = scale(r, shade);
                px[1] = scale(g, shade);
                px[2] = scale(b, shade);
            }
        }
    });
}

fn scale(channel: u8, shade: u8) -> u8 {
    (channel as u16 * shade as u16 / 255) as u8
}
