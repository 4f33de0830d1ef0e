//! The write-only sound device interface the engine drives.
//!
//! Everything the engine produces ends up as calls on a [`SoundDevice`].
//! [`RegisterLog`] records those calls so playback can be inspected and
//! compared without an emulator.

use alloc::vec::Vec;
use gbt_ir::ChannelId;

// Register addresses
pub const REG_NR10: u16 = 0xFF10;
pub const REG_NR30: u16 = 0xFF1A;
pub const REG_NR32: u16 = 0xFF1C;
pub const REG_NR43: u16 = 0xFF22;
pub const REG_NR51: u16 = 0xFF25;
pub const REG_WAVE_RAM: u16 = 0xFF30;

/// Registers per channel, starting at NR10.
pub const REGS_PER_CHANNEL: u16 = 5;

/// NR30 value enabling the wave channel DAC.
pub const WAVE_DAC_ON: u8 = 0x80;

/// Sink for register writes.
pub trait SoundDevice {
    /// Write a byte to a hardware register.
    fn write_register(&mut self, address: u16, value: u8);

    /// Retrigger a channel (restart its envelope, length and phase).
    fn restart(&mut self, channel: ChannelId);

    /// Set the 11-bit frequency of a tone or wave channel.
    fn set_frequency(&mut self, channel: ChannelId, value: u16);

    /// Write the full NR51 output-enable mask.
    fn set_output_enable(&mut self, mask: u8);

    /// Enable or disable one channel's left and right outputs.
    fn set_channel_output(&mut self, channel: ChannelId, left: bool, right: bool);
}

/// One recorded device call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceWrite {
    Register { address: u16, value: u8 },
    Restart(ChannelId),
    Frequency { channel: ChannelId, value: u16 },
    OutputEnable(u8),
    ChannelOutput { channel: ChannelId, left: bool, right: bool },
}

impl core::fmt::Display for DeviceWrite {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            DeviceWrite::Register { address, value } => write!(f, "reg  {:04X} <- {:02X}", address, value),
            DeviceWrite::Restart(ch) => write!(f, "trig {}", ch),
            DeviceWrite::Frequency { channel, value } => write!(f, "freq {} <- {:03X}", channel, value),
            DeviceWrite::OutputEnable(mask) => write!(f, "pan  {:02X}", mask),
            DeviceWrite::ChannelOutput { channel, left, right } => write!(
                f,
                "out  {} {}{}",
                channel,
                if left { 'L' } else { '-' },
                if right { 'R' } else { '-' }
            ),
        }
    }
}

/// A device that records every call in order.
#[derive(Clone, Debug, Default)]
pub struct RegisterLog {
    writes: Vec<DeviceWrite>,
}

impl RegisterLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> &[DeviceWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    /// Take the recorded writes, leaving the log empty.
    pub fn drain(&mut self) -> Vec<DeviceWrite> {
        core::mem::take(&mut self.writes)
    }

    /// Writes that touched `channel`, including its registers.
    pub fn for_channel(&self, channel: ChannelId) -> impl Iterator<Item = &DeviceWrite> {
        self.writes.iter().filter(move |w| match **w {
            DeviceWrite::Restart(ch)
            | DeviceWrite::Frequency { channel: ch, .. }
            | DeviceWrite::ChannelOutput { channel: ch, .. } => ch == channel,
            DeviceWrite::Register { address, .. } => register_channel(address) == Some(channel),
            DeviceWrite::OutputEnable(_) => false,
        })
    }

    /// Frequencies written to `channel`, in order.
    pub fn frequencies(&self, channel: ChannelId) -> impl Iterator<Item = u16> + '_ {
        self.writes.iter().filter_map(move |w| match *w {
            DeviceWrite::Frequency { channel: ch, value } if ch == channel => Some(value),
            _ => None,
        })
    }
}

impl SoundDevice for RegisterLog {
    fn write_register(&mut self, address: u16, value: u8) {
        self.writes.push(DeviceWrite::Register { address, value });
    }

    fn restart(&mut self, channel: ChannelId) {
        self.writes.push(DeviceWrite::Restart(channel));
    }

    fn set_frequency(&mut self, channel: ChannelId, value: u16) {
        self.writes.push(DeviceWrite::Frequency { channel, value });
    }

    fn set_output_enable(&mut self, mask: u8) {
        self.writes.push(DeviceWrite::OutputEnable(mask));
    }

    fn set_channel_output(&mut self, channel: ChannelId, left: bool, right: bool) {
        self.writes.push(DeviceWrite::ChannelOutput { channel, left, right });
    }
}

/// Channel owning a register in NR10..NR44, or `None` for shared registers.
pub fn register_channel(address: u16) -> Option<ChannelId> {
    if address < REG_NR10 {
        return None;
    }
    ChannelId::from_index(((address - REG_NR10) / REGS_PER_CHANNEL) as usize)
}
