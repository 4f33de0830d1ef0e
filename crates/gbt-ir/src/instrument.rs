//! Instruments and their modulation sequences.

use arrayvec::{ArrayString, ArrayVec};

use crate::channel::ChannelId;
use crate::error::IrError;

/// Maximum values in a sequence.
pub const MAX_SEQUENCE_LEN: usize = 256;

/// Maximum bytes in an instrument program.
pub const MAX_PROGRAM_LEN: usize = 256;

/// A finite list of per-frame values with an optional loop point.
///
/// Values are raw bytes; pitch and arpeggio sequences read them as
/// signed offsets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequence {
    data: ArrayVec<u8, MAX_SEQUENCE_LEN>,
    loop_index: Option<u8>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(values: &[u8], loop_index: Option<u8>) -> Result<Self, IrError> {
        let mut data = ArrayVec::new();
        data.try_extend_from_slice(values)
            .map_err(|_| IrError::SequenceTooLong(values.len()))?;
        if let Some(index) = loop_index {
            if index as usize >= data.len() {
                return Err(IrError::LoopIndexOutOfRange { index, len: data.len() });
            }
        }
        Ok(Self { data, loop_index })
    }

    /// Build from signed offsets, the usual form for pitch and arpeggio.
    pub fn from_signed(values: &[i8], loop_index: Option<u8>) -> Result<Self, IrError> {
        if values.len() > MAX_SEQUENCE_LEN {
            return Err(IrError::SequenceTooLong(values.len()));
        }
        let bytes: ArrayVec<u8, MAX_SEQUENCE_LEN> = values.iter().map(|&v| v as u8).collect();
        Self::from_slice(&bytes, loop_index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn loop_index(&self) -> Option<u8> {
        self.loop_index
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A cursor positioned at the first value.
    pub fn cursor(&self) -> SequenceCursor {
        SequenceCursor {
            sequence: self.clone(),
            index: 0,
        }
    }
}

/// Playback position within a [`Sequence`].
///
/// Owns a copy of the sequence so the engine can hold it without
/// borrowing song data. Yields `None` once the end is reached unless the
/// sequence loops.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceCursor {
    sequence: Sequence,
    index: usize,
}

impl SequenceCursor {
    pub fn restart(&mut self) {
        self.index = 0;
    }
}

impl Iterator for SequenceCursor {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.index >= self.sequence.data.len() {
            self.index = self.sequence.loop_index? as usize;
        }
        let value = *self.sequence.data.get(self.index)?;
        self.index += 1;
        Some(value)
    }
}

/// An instrument: a bytecode program plus pitch modulation sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instrument {
    /// Instrument name (max 32 bytes)
    pub name: ArrayString<32>,
    /// Channel the instrument is meant for (used by preview)
    pub channel: ChannelId,
    /// Envelope written when previewing (waveform id on CH3)
    pub envelope: u8,
    /// Timbre written when previewing
    pub timbre: u8,
    /// 2-bit preview panning, bit 1 left, bit 0 right
    pub panning: u8,
    /// Relative semitone offsets applied per frame
    pub arpeggio: Sequence,
    /// Pitch offsets accumulated per frame
    pub pitch: Sequence,
    program: ArrayVec<u8, MAX_PROGRAM_LEN>,
}

impl Instrument {
    pub fn new(name: &str, channel: ChannelId) -> Self {
        Self {
            name: crate::truncated_name(name),
            channel,
            envelope: if channel == ChannelId::Ch3 { 0 } else { 0xF0 },
            timbre: 3,
            panning: 0b11,
            arpeggio: Sequence::new(),
            pitch: Sequence::new(),
            program: ArrayVec::new(),
        }
    }

    /// Instrument bytecode.
    pub fn program(&self) -> &[u8] {
        &self.program
    }

    pub fn set_program(&mut self, bytes: &[u8]) -> Result<(), IrError> {
        let mut program = ArrayVec::new();
        program
            .try_extend_from_slice(bytes)
            .map_err(|_| IrError::ProgramTooLong(bytes.len()))?;
        self.program = program;
        Ok(())
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::new("", ChannelId::Ch1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_without_loop_ends() {
        let seq = Sequence::from_slice(&[1, 2, 3], None).unwrap();
        let values: alloc::vec::Vec<u8> = seq.cursor().take(10).collect();
        assert_eq!(values, [1, 2, 3]);
    }

    #[test]
    fn cursor_with_loop_repeats_tail() {
        let seq = Sequence::from_slice(&[1, 2, 3], Some(1)).unwrap();
        let mut cursor = seq.cursor();
        let values: [Option<u8>; 6] = core::array::from_fn(|_| cursor.next());
        assert_eq!(values, [Some(1), Some(2), Some(3), Some(2), Some(3), Some(2)]);
    }

    #[test]
    fn empty_sequence_yields_nothing() {
        assert_eq!(Sequence::new().cursor().next(), None);
    }

    #[test]
    fn restart_rewinds() {
        let seq = Sequence::from_slice(&[7, 8], None).unwrap();
        let mut cursor = seq.cursor();
        cursor.next();
        cursor.next();
        assert_eq!(cursor.next(), None);
        cursor.restart();
        assert_eq!(cursor.next(), Some(7));
    }

    #[test]
    fn validation() {
        assert_eq!(
            Sequence::from_slice(&[1], Some(1)),
            Err(IrError::LoopIndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            Sequence::from_slice(&[0; 300], None),
            Err(IrError::SequenceTooLong(300))
        );
        let mut inst = Instrument::new("lead", ChannelId::Ch1);
        assert_eq!(inst.set_program(&[0; 257]), Err(IrError::ProgramTooLong(257)));
        assert!(inst.set_program(&[0x40, 0x00]).is_ok());
        assert_eq!(inst.program(), [0x40, 0x00]);
    }

    #[test]
    fn signed_values_are_stored_as_bytes() {
        let seq = Sequence::from_signed(&[-1, 2], None).unwrap();
        assert_eq!(seq.data(), [0xFF, 0x02]);
    }
}
