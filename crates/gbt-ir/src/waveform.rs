//! Wave channel sample data.

use arrayvec::ArrayString;

use crate::error::IrError;

/// Bytes of wave RAM; each byte packs two 4-bit samples, high nibble first.
pub const WAVE_RAM_SIZE: usize = 16;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Waveform {
    pub name: ArrayString<32>,
    pub data: [u8; WAVE_RAM_SIZE],
}

impl Waveform {
    pub fn new(name: &str, data: [u8; WAVE_RAM_SIZE]) -> Self {
        Self {
            name: crate::truncated_name(name),
            data,
        }
    }

    /// Parse 32 hex digits, one per sample.
    pub fn from_hex(name: &str, hex: &str) -> Result<Self, IrError> {
        let digits = hex.as_bytes();
        if digits.len() != WAVE_RAM_SIZE * 2 {
            return Err(IrError::InvalidWaveform);
        }
        let mut data = [0u8; WAVE_RAM_SIZE];
        for (byte, pair) in data.iter_mut().zip(digits.chunks_exact(2)) {
            let hi = hex_digit(pair[0]).ok_or(IrError::InvalidWaveform)?;
            let lo = hex_digit(pair[1]).ok_or(IrError::InvalidWaveform)?;
            *byte = (hi << 4) | lo;
        }
        Ok(Self::new(name, data))
    }

    /// 4-bit sample at `index` (0..32).
    pub fn sample(&self, index: usize) -> u8 {
        let byte = self.data[(index / 2) % WAVE_RAM_SIZE];
        if index % 2 == 0 {
            byte >> 4
        } else {
            byte & 0xF
        }
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}
