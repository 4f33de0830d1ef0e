//! Per-frame playback report.

use gbt_ir::Speed;

/// What the sequencer did on one call to `step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Playback has stopped
    pub halted: bool,
    /// This frame started a row
    pub started_new_row: bool,
    /// This frame started a pattern (order changed or first frame)
    pub started_new_pattern: bool,
    /// Row timer period in effect
    pub speed: Speed,
    /// Frames stepped since playback began
    pub time: u32,
    /// Order index of the current row
    pub order: u8,
    /// Current row within the pattern
    pub row: u16,
}

impl Frame {
    /// The report before any step has run.
    pub const fn start(speed: Speed, order: u8, row: u16) -> Self {
        Self {
            halted: false,
            started_new_row: false,
            started_new_pattern: false,
            speed,
            time: 0,
            order,
            row,
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::start(Speed::DEFAULT, 0, 0)
    }
}

impl core::fmt::Display for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:06} {:02X}:{:02X} speed {}", self.time, self.order, self.row, self.speed)?;
        if self.started_new_pattern {
            f.write_str(" pattern")?;
        } else if self.started_new_row {
            f.write_str(" row")?;
        }
        if self.halted {
            f.write_str(" halt")?;
        }
        Ok(())
    }
}
