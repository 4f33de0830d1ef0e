//! Core data model for the gbtracker playback engine.
//!
//! Songs, tracks, rows, effects, instruments and waveforms live here.
//! The engine only ever reads this data; editing and persistence belong
//! to the caller.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
mod effects;
mod error;
mod instrument;
mod module;
mod note;
mod pattern;
pub mod song;
mod speed;
mod table;
mod waveform;

pub use channel::{ChannelId, CHANNEL_COUNT};
pub use effects::{Effect, EffectCategory, EffectType};
pub use error::IrError;
pub use instrument::{Instrument, Sequence, SequenceCursor, MAX_PROGRAM_LEN, MAX_SEQUENCE_LEN};
pub use module::Module;
pub use note::{Note, NOTE_CUT, NOTE_LAST, NOTE_NOISE_LAST};
pub use pattern::{Row, Track, MAX_EFFECTS};
pub use song::{OrderRow, Pattern, Song};
pub use speed::{Speed, FRAMERATE_GB_MILLIHZ};
pub use table::{InstrumentTable, Table, WaveTable, TABLE_CAPACITY};
pub use waveform::{Waveform, WAVE_RAM_SIZE};

use arrayvec::ArrayString;

/// Copy `name` into a fixed-capacity string, dropping whatever does not fit.
pub(crate) fn truncated_name(name: &str) -> ArrayString<32> {
    let mut out = ArrayString::new();
    for c in name.chars() {
        if out.try_push(c).is_err() {
            break;
        }
    }
    out
}
