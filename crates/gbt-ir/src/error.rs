//! Errors raised while building song data.
//!
//! Playback never produces these; they come from constructors and
//! setters that validate input before it reaches the engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("speed 0x{0:02X} outside 0x10..=0xF0")]
    SpeedOutOfRange(u8),

    #[error("row count {0} outside 1..=256")]
    RowCountOutOfRange(u16),

    #[error("order list is full")]
    OrderFull,

    #[error("order index {0} out of range")]
    OrderIndexOutOfRange(usize),

    #[error("sequence of {0} values exceeds 256")]
    SequenceTooLong(usize),

    #[error("loop index {index} outside sequence of length {len}")]
    LoopIndexOutOfRange { index: u8, len: usize },

    #[error("program of {0} bytes exceeds 256")]
    ProgramTooLong(usize),

    #[error("table id {0} out of range")]
    TableIdOutOfRange(u8),

    #[error("waveform must be 32 hex digits")]
    InvalidWaveform,
}
