//! Playback engine for gbtracker.
//!
//! Steps a song one frame at a time and drives a four-channel Game Boy
//! sound device through the [`SoundDevice`] trait. Nothing on the
//! per-frame path allocates.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
pub mod device;
mod frame;
mod frequency;
mod frequency_engine;
mod instrument_engine;
mod note_control;
mod preview;
pub mod sequencer;
mod timer;

pub use channel::{
    duty_register, envelope_has_slope, layout, noise_step_width, panning_bits, panning_mask, wave_volume_register,
    write_envelope, write_timbre, write_waveform, Aux1, Aux2, ChannelKind, ChannelLayout, ChannelSettings, Noise,
    Settings, Tone, NOISE_UNITS_PER_NOTE,
};
pub use device::{DeviceWrite, RegisterLog, SoundDevice};
pub use frame::Frame;
pub use frequency::{noise_register, note_to_frequency, GB_MAX_FREQUENCY};
pub use frequency_engine::{
    FrequencyEngine, FrequencyParams, ModType, Modulation, NoiseFrequencyEngine, SlideDirection, ToneFrequencyEngine,
};
pub use instrument_engine::{Command, InstrumentEngine, MAX_COMMAND_LEN};
pub use note_control::NoteControl;
pub use preview::InstrumentPreview;
pub use sequencer::{Cursor, PatternCommand, Sequencer, SequencerError, SequencerState};
pub use timer::RowTimer;
