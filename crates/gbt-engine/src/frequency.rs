//! Note lookup tables for the tone and noise channels.
//!
//! Tone channels take an 11-bit value `2048 - 131072 / hz`; higher values
//! are higher pitches. The noise channel is driven through NR43, whose
//! clock shift and divisor select the pitch.

use gbt_ir::{NOTE_LAST, NOTE_NOISE_LAST};

/// Largest value the 11-bit tone frequency register accepts.
pub const GB_MAX_FREQUENCY: u16 = 0x7FF;

/// NR43 bit selecting the 7-bit LFSR.
pub const NOISE_STEP_WIDTH_7: u8 = 0x08;

/// Tone register values for C-2 through B-8.
const NOTE_FREQ_TABLE: [u16; NOTE_LAST as usize + 1] = [
    0x02C, 0x09D, 0x107, 0x16B, 0x1C9, 0x223, 0x277, 0x2C7, 0x312, 0x358, 0x39B, 0x3DA, // 2
    0x416, 0x44E, 0x483, 0x4B5, 0x4E5, 0x511, 0x53B, 0x563, 0x589, 0x5AC, 0x5CE, 0x5ED, // 3
    0x60B, 0x627, 0x642, 0x65B, 0x672, 0x689, 0x69E, 0x6B2, 0x6C4, 0x6D6, 0x6E7, 0x6F7, // 4
    0x706, 0x714, 0x721, 0x72D, 0x739, 0x744, 0x74F, 0x759, 0x762, 0x76B, 0x773, 0x77B, // 5
    0x783, 0x78A, 0x790, 0x797, 0x79D, 0x7A2, 0x7A7, 0x7AC, 0x7B1, 0x7B6, 0x7BA, 0x7BE, // 6
    0x7C1, 0x7C5, 0x7C8, 0x7CB, 0x7CE, 0x7D1, 0x7D4, 0x7D6, 0x7D9, 0x7DB, 0x7DD, 0x7DF, // 7
    0x7E1, 0x7E2, 0x7E4, 0x7E6, 0x7E7, 0x7E9, 0x7EA, 0x7EB, 0x7EC, 0x7ED, 0x7EE, 0x7EF, // 8
];

/// NR43 values for noise notes C-2 through B-6.
const NOTE_NOISE_TABLE: [u8; NOTE_NOISE_LAST as usize + 1] = [
    0xD7, 0xD6, 0xD5, 0xD4, 0xC7, 0xC6, 0xC5, 0xC4, 0xB7, 0xB6, 0xB5, 0xB4,
    0xA7, 0xA6, 0xA5, 0xA4, 0x97, 0x96, 0x95, 0x94, 0x87, 0x86, 0x85, 0x84,
    0x77, 0x76, 0x75, 0x74, 0x67, 0x66, 0x65, 0x64, 0x57, 0x56, 0x55, 0x54,
    0x47, 0x46, 0x45, 0x44, 0x37, 0x36, 0x35, 0x34, 0x27, 0x26, 0x25, 0x24,
    0x17, 0x16, 0x15, 0x14, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, 0x00,
];

/// Tone register value for a note. Notes past B-8 clamp to B-8.
pub fn note_to_frequency(note: u8) -> u16 {
    NOTE_FREQ_TABLE[note.min(NOTE_LAST) as usize]
}

/// NR43 value for a noise note. Notes past the noise range clamp to its top.
pub fn noise_register(note: u8) -> u8 {
    NOTE_NOISE_TABLE[note.min(NOTE_NOISE_LAST) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_table_is_strictly_increasing() {
        for pair in NOTE_FREQ_TABLE.windows(2) {
            assert!(pair[0] < pair[1], "{:#x} >= {:#x}", pair[0], pair[1]);
        }
        assert!(NOTE_FREQ_TABLE[NOTE_LAST as usize] <= GB_MAX_FREQUENCY);
    }

    #[test]
    fn a4_is_440hz() {
        // A-4 is index 33; 131072 / (2048 - f) should round to 440
        let f = note_to_frequency(33) as u32;
        let hz = 131072 / (2048 - f);
        assert!((439..=441).contains(&hz), "A-4 = {} Hz", hz);
    }

    #[test]
    fn out_of_range_notes_clamp() {
        assert_eq!(note_to_frequency(200), note_to_frequency(NOTE_LAST));
        assert_eq!(noise_register(200), 0x00);
        assert_eq!(noise_register(0), 0xD7);
    }

    #[test]
    fn noise_table_never_sets_step_width() {
        assert!(NOTE_NOISE_TABLE.iter().all(|v| v & NOISE_STEP_WIDTH_7 == 0));
    }
}
