//! Per-channel capabilities, register layout and persistent settings.
//!
//! The four channels differ in which registers exist and what the aux
//! bytes of an instrument program mean. Those differences live in
//! constant tables indexed by [`ChannelId`] so call sites never branch on
//! the channel themselves.

use gbt_ir::{ChannelId, WaveTable, Waveform, NOTE_LAST, NOTE_NOISE_LAST};

use crate::device::{SoundDevice, REG_NR30, REG_WAVE_RAM, WAVE_DAC_ON};
use crate::frequency::{self, GB_MAX_FREQUENCY, NOISE_STEP_WIDTH_7};

/// Pitch capabilities of a channel variant.
pub trait ChannelKind {
    /// Ceiling for the output frequency.
    const MAX_FREQUENCY: u16;
    /// Highest note the variant accepts.
    const TOP_NOTE: u8;
    fn note_to_frequency(note: u8) -> u16;
}

/// Pulse and wave channels: 11-bit period table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tone;

/// Noise channel: notes are abstract pitch units, translated to NR43 by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Noise;

/// Pitch units per semitone on the noise channel.
pub const NOISE_UNITS_PER_NOTE: u16 = 4;

impl ChannelKind for Tone {
    const MAX_FREQUENCY: u16 = GB_MAX_FREQUENCY;
    const TOP_NOTE: u8 = NOTE_LAST;

    fn note_to_frequency(note: u8) -> u16 {
        frequency::note_to_frequency(note)
    }
}

impl ChannelKind for Noise {
    const MAX_FREQUENCY: u16 = NOTE_NOISE_LAST as u16 * NOISE_UNITS_PER_NOTE;
    const TOP_NOTE: u8 = NOTE_NOISE_LAST;

    fn note_to_frequency(note: u8) -> u16 {
        note.min(NOTE_NOISE_LAST) as u16 * NOISE_UNITS_PER_NOTE
    }
}

impl Noise {
    /// NR43 value for a noise pitch in units (semitone = 4 units).
    pub fn register(frequency: u16) -> u8 {
        frequency::noise_register((frequency / NOISE_UNITS_PER_NOTE).min(NOTE_NOISE_LAST as u16) as u8)
    }
}

/// What the first aux byte of a program command writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aux1 {
    Sweep,
    Noise,
    Unused,
}

/// What the second aux byte of a program command writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aux2 {
    Envelope,
    Waveform,
}

/// What the 2-bit settings value of a program command writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settings {
    Duty,
    OutputLevel,
    Unused,
}

/// Register map and aux meanings for one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelLayout {
    /// Address of NRx0
    pub base: u16,
    pub aux1: Aux1,
    pub aux2: Aux2,
    pub settings: Settings,
}

const LAYOUTS: [ChannelLayout; 4] = [
    ChannelLayout { base: 0xFF10, aux1: Aux1::Sweep, aux2: Aux2::Envelope, settings: Settings::Duty },
    ChannelLayout { base: 0xFF15, aux1: Aux1::Unused, aux2: Aux2::Envelope, settings: Settings::Duty },
    ChannelLayout { base: 0xFF1A, aux1: Aux1::Unused, aux2: Aux2::Waveform, settings: Settings::OutputLevel },
    ChannelLayout { base: 0xFF1F, aux1: Aux1::Noise, aux2: Aux2::Envelope, settings: Settings::Unused },
];

/// Register layout of `channel`.
pub const fn layout(channel: ChannelId) -> &'static ChannelLayout {
    &LAYOUTS[channel.index()]
}

impl ChannelLayout {
    /// NRx0: sweep (CH1), DAC enable (CH3)
    pub const fn nrx0(&self) -> u16 {
        self.base
    }

    /// NRx1: duty and length
    pub const fn nrx1(&self) -> u16 {
        self.base + 1
    }

    /// NRx2: envelope (CH1, CH2, CH4), output level (CH3)
    pub const fn nrx2(&self) -> u16 {
        self.base + 2
    }

    /// NRx3: frequency low byte (CH1-3), noise polynomial (CH4)
    pub const fn nrx3(&self) -> u16 {
        self.base + 3
    }
}

/// NR51 bits for a 2-bit panning value (bit 1 left, bit 0 right).
pub const fn panning_bits(channel: ChannelId, panning: u8) -> u8 {
    let mut bits = 0;
    if panning & 0b10 != 0 {
        bits |= 0x10;
    }
    if panning & 0b01 != 0 {
        bits |= 0x01;
    }
    bits << channel.index()
}

/// Both NR51 bits belonging to `channel`.
pub const fn panning_mask(channel: ChannelId) -> u8 {
    0x11 << channel.index()
}

/// NR32 value for a wave volume level (0 mute, 1 25%, 2 50%, 3 100%).
pub const fn wave_volume_register(level: u8) -> u8 {
    const TABLE: [u8; 4] = [0x00, 0x60, 0x40, 0x20];
    TABLE[(level & 3) as usize]
}

/// NRx1 duty bits for a timbre value.
pub const fn duty_register(timbre: u8) -> u8 {
    (timbre & 3) << 6
}

/// Persistent per-channel settings changed by track effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Envelope byte (waveform id on CH3)
    pub envelope: u8,
    /// Timbre 0-3
    pub timbre: u8,
    /// 2-bit panning, bit 1 left, bit 0 right
    pub panning: u8,
    /// Retrigger on every note start
    pub auto_retrigger: bool,
}

impl ChannelSettings {
    /// Power-on defaults for `channel`.
    pub const fn new(channel: ChannelId) -> Self {
        let (envelope, timbre) = match channel {
            ChannelId::Ch3 => (0x00, 3),
            ChannelId::Ch4 => (0xF0, 0),
            _ => (0xF0, 3),
        };
        Self {
            envelope,
            timbre,
            panning: 0b11,
            auto_retrigger: false,
        }
    }

    /// Store a new envelope and recompute the auto-retrigger flag.
    pub fn set_envelope(&mut self, channel: ChannelId, envelope: u8) {
        self.envelope = envelope;
        self.auto_retrigger = envelope_has_slope(channel, envelope);
    }
}

/// True when `envelope` sweeps volume, so notes need a retrigger to restart it.
pub const fn envelope_has_slope(channel: ChannelId, envelope: u8) -> bool {
    !matches!(channel, ChannelId::Ch3) && envelope & 0x07 != 0
}

/// Write an envelope byte. On CH3 the byte selects a waveform instead.
pub fn write_envelope(device: &mut impl SoundDevice, channel: ChannelId, envelope: u8, waves: &WaveTable) {
    match layout(channel).aux2 {
        Aux2::Envelope => device.write_register(layout(channel).nrx2(), envelope),
        Aux2::Waveform => {
            if let Some(wave) = waves.get(envelope) {
                write_waveform(device, wave);
            }
        }
    }
}

/// Write a timbre value. CH4 applies timbre at trigger time via [`noise_step_width`].
pub fn write_timbre(device: &mut impl SoundDevice, channel: ChannelId, timbre: u8) {
    let layout = layout(channel);
    match layout.settings {
        Settings::Duty => device.write_register(layout.nrx1(), duty_register(timbre)),
        Settings::OutputLevel => device.write_register(layout.nrx2(), wave_volume_register(timbre)),
        Settings::Unused => {}
    }
}

/// NR43 step-width bit for a noise timbre.
pub const fn noise_step_width(timbre: u8) -> u8 {
    if timbre != 0 {
        NOISE_STEP_WIDTH_7
    } else {
        0
    }
}

/// Load wave RAM: DAC off, 16 bytes, DAC on.
pub fn write_waveform(device: &mut impl SoundDevice, wave: &Waveform) {
    device.write_register(REG_NR30, 0);
    for (addr, &byte) in (REG_WAVE_RAM..).zip(wave.data.iter()) {
        device.write_register(addr, byte);
    }
    device.write_register(REG_NR30, WAVE_DAC_ON);
}
