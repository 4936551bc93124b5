use std::fmt::{Display, Formatter};

/// What was written for one compressed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    stream_index: usize,
    size: usize,
    is_key: bool,
    pts: Option<i64>,
    dts: Option<i64>,
}

impl PacketInfo {
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_key(&self) -> bool {
        self.is_key
    }

    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    pub fn dts(&self) -> Option<i64> {
        self.dts
    }
}

impl From<&ffmpeg_next::Packet> for PacketInfo {
    fn from(packet: &ffmpeg_next::Packet) -> Self {
        Self {
            stream_index: packet.stream(),
            size: packet.size(),
            is_key: packet.is_key(),
            pts: packet.pts(),
            dts: packet.dts(),
        }
    }
}

impl Display for PacketInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "packet stream: {}, size: {}, key: {}, pts: {:?}, dts: {:?}",
            self.stream_index, self.size, self.is_key, self.pts, self.dts
        )
    }
}

/// Running totals of the packets a session has muxed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PacketStats {
    pub packets: u64,
    pub key_frames: u64,
    pub bytes: u64,
    pub last: Option<PacketInfo>,
}

impl PacketStats {
    pub fn record(&mut self, info: PacketInfo) {
        self.packets += 1;
        if info.is_key {
            self.key_frames += 1;
        }
        self.bytes += info.size as u64;
        self.last = Some(info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record() {
        let mut packet = ffmpeg_next::Packet::copy(&[0u8; 42]);
        packet.set_stream(0);
        packet.set_flags(ffmpeg_next::codec::packet::Flags::KEY);
        packet.set_pts(Some(3));

        let mut stats = PacketStats::default();
        stats.record(PacketInfo::from(&packet));
        stats.record(PacketInfo::from(&ffmpeg_next::Packet::copy(&[1u8; 8])));

        assert_eq!(stats.packets, 2);
        assert_eq!(stats.key_frames, 1);
        assert_eq!(stats.bytes, 50);
        assert_eq!(stats.last.map(|p| p.size()), Some(8));
    }

    #[test]
    fn test_info_from_packet() {
        let mut packet = ffmpeg_next::Packet::copy(&[7u8; 16]);
        packet.set_stream(2);
        packet.set_pts(Some(10));
        packet.set_dts(Some(9));
        let info = PacketInfo::from(&packet);
        assert_eq!(info.stream_index(), 2);
        assert_eq!(info.size(), 16);
        assert!(!info.is_key());
        assert_eq!(info.pts(), Some(10));
        assert_eq!(info.dts(), Some(9));
    }
}
