//! Fixed-point row speed.
//!
//! `Speed` counts frames per row in Q4.4: the high nibble is whole
//! frames, the low nibble sixteenths of a frame. Fractional speeds give
//! rows of uneven length, which is how non-integer tempos are reached.

use crate::error::IrError;

/// Game Boy vertical-blank rate in millihertz.
pub const FRAMERATE_GB_MILLIHZ: u32 = 59_727;

/// Frames per row in Q4.4 fixed point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Speed(u8);

impl Speed {
    /// Fractional bits.
    pub const FRACTION_BITS: u32 = 4;
    /// One frame in Q4.4.
    pub const UNIT: u8 = 1 << Self::FRACTION_BITS;
    /// 1.0 frames per row.
    pub const MIN: Speed = Speed(0x10);
    /// 15.0 frames per row.
    pub const MAX: Speed = Speed(0xF0);
    /// 6.0 frames per row (150 BPM at 4 rows per beat).
    pub const DEFAULT: Speed = Speed(0x60);

    /// Wrap a raw Q4.4 value. Returns `None` outside `MIN..=MAX`.
    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= Self::MIN.0 && raw <= Self::MAX.0 {
            Some(Speed(raw))
        } else {
            None
        }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Whole frames per row.
    pub const fn whole(self) -> u8 {
        self.0 >> Self::FRACTION_BITS
    }

    /// Fractional part in sixteenths of a frame.
    pub const fn fraction(self) -> u8 {
        self.0 & (Self::UNIT - 1)
    }

    /// Speed that plays `tempo` beats per minute at `rows_per_beat`,
    /// rounded to the nearest sixteenth and clamped to the valid range.
    pub fn from_tempo(tempo: u16, rows_per_beat: u8) -> Self {
        let den = tempo as u64 * rows_per_beat as u64 * 1000;
        if den == 0 {
            return Self::MAX;
        }
        let num = FRAMERATE_GB_MILLIHZ as u64 * 60 * Self::UNIT as u64;
        let raw = (num + den / 2) / den;
        Speed(raw.clamp(Self::MIN.0 as u64, Self::MAX.0 as u64) as u8)
    }

    /// Tempo in BPM this speed plays at, rounded down.
    pub fn tempo(self, rows_per_beat: u8) -> u32 {
        let den = self.0 as u64 * rows_per_beat.max(1) as u64 * 1000;
        (FRAMERATE_GB_MILLIHZ as u64 * 60 * Self::UNIT as u64 / den) as u32
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Speed {
    type Error = IrError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Speed::new(raw).ok_or(IrError::SpeedOutOfRange(raw))
    }
}

impl core::fmt::Display for Speed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:04}", self.whole(), self.fraction() as u32 * 625)
    }
}
