//! Fixed-point row timer.

use gbt_ir::Speed;

/// Counts frames against a Q4.4 period.
///
/// Every step adds one frame. When the counter reaches the period it
/// wraps, keeping the fractional remainder, and the step reports an
/// overflow. A fractional period therefore alternates between row
/// lengths, e.g. 2.5 gives rows of 2 and 3 frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowTimer {
    period: u16,
    counter: u16,
}

impl Default for RowTimer {
    fn default() -> Self {
        Self::new(Speed::DEFAULT)
    }
}

impl RowTimer {
    pub const fn new(speed: Speed) -> Self {
        Self {
            period: speed.raw() as u16,
            counter: 0,
        }
    }

    /// True on the first frame of a row.
    pub const fn active(&self) -> bool {
        self.counter < Speed::UNIT as u16
    }

    pub const fn period(&self) -> Speed {
        match Speed::new(self.period as u8) {
            Some(s) => s,
            None => Speed::DEFAULT,
        }
    }

    /// Change the period. Takes effect from the next step.
    pub fn set_period(&mut self, speed: Speed) {
        self.period = speed.raw() as u16;
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Advance one frame. Returns true when the row ends.
    pub fn step(&mut self) -> bool {
        self.counter += Speed::UNIT as u16;
        if self.counter >= self.period {
            self.counter -= self.period;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run `frames` steps and render each as `A` (active), `O` (overflow),
    /// `B` (both) or `-`.
    fn pattern(timer: &mut RowTimer, frames: usize) -> alloc::string::String {
        (0..frames)
            .map(|_| {
                let active = timer.active();
                let overflow = timer.step();
                match (active, overflow) {
                    (true, true) => 'B',
                    (true, false) => 'A',
                    (false, true) => 'O',
                    (false, false) => '-',
                }
            })
            .collect()
    }

    #[test]
    fn whole_period() {
        let mut timer = RowTimer::new(Speed::new(0x30).unwrap());
        assert_eq!(pattern(&mut timer, 9), "A-OA-OA-O");
    }

    #[test]
    fn speed_one_is_active_and_overflows_every_frame() {
        let mut timer = RowTimer::new(Speed::MIN);
        assert_eq!(pattern(&mut timer, 4), "BBBB");
    }

    #[test]
    fn fractional_period_alternates_row_lengths() {
        let mut timer = RowTimer::new(Speed::new(0x28).unwrap());
        assert_eq!(pattern(&mut timer, 10), "A-OAOA-OAO");
    }

    #[test]
    fn set_period_applies_from_next_step() {
        let mut timer = RowTimer::new(Speed::new(0x40).unwrap());
        assert!(!timer.step());
        timer.set_period(Speed::new(0x20).unwrap());
        assert!(timer.step());
        assert!(timer.active());
        assert_eq!(timer.period().raw(), 0x20);
    }

    #[test]
    fn reset_restarts_row() {
        let mut timer = RowTimer::new(Speed::new(0x40).unwrap());
        timer.step();
        assert!(!timer.active());
        timer.reset();
        assert!(timer.active());
    }
}
