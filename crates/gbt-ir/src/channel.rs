//! Hardware channel identifiers.

/// Number of hardware channels.
pub const CHANNEL_COUNT: usize = 4;

/// One of the four sound chip channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelId {
    /// Pulse channel with frequency sweep
    #[default]
    Ch1,
    /// Pulse channel
    Ch2,
    /// Wave channel (4-bit wave RAM playback)
    Ch3,
    /// Noise channel
    Ch4,
}

impl ChannelId {
    /// All channels in processing order.
    pub const ALL: [ChannelId; CHANNEL_COUNT] =
        [ChannelId::Ch1, ChannelId::Ch2, ChannelId::Ch3, ChannelId::Ch4];

    /// Zero-based index of this channel.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ChannelId::Ch1),
            1 => Some(ChannelId::Ch2),
            2 => Some(ChannelId::Ch3),
            3 => Some(ChannelId::Ch4),
            _ => None,
        }
    }

    /// True for the noise channel, which has no frequency register.
    pub const fn is_noise(self) -> bool {
        matches!(self, ChannelId::Ch4)
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CH{}", self.index() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips() {
        for ch in ChannelId::ALL {
            assert_eq!(ChannelId::from_index(ch.index()), Some(ch));
        }
        assert_eq!(ChannelId::from_index(4), None);
    }

    #[test]
    fn only_ch4_is_noise() {
        assert!(ChannelId::Ch4.is_noise());
        assert!(!ChannelId::Ch3.is_noise());
    }
}
