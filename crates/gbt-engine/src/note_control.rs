//! Delayed note trigger and cut scheduling for one channel.

use gbt_ir::NOTE_CUT;

/// Turns (note, delay) and (cut, delay) requests into per-frame
/// trigger and playing state.
///
/// A delay of 0 fires on the next [`step`](NoteControl::step). When a
/// trigger and a cut fire on the same step, the cut wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoteControl {
    trigger_in: Option<u8>,
    cut_in: Option<u8>,
    note: u8,
    playing: bool,
}

impl NoteControl {
    pub const fn new() -> Self {
        Self {
            trigger_in: None,
            cut_in: None,
            note: 0,
            playing: false,
        }
    }

    /// Schedule `note` to start after `delay` frames. [`NOTE_CUT`]
    /// schedules a cut instead and indices above it are ignored.
    pub fn note_trigger(&mut self, note: u8, delay: u8) {
        match note {
            NOTE_CUT => self.note_cut(delay),
            n if n < NOTE_CUT => {
                self.note = n;
                self.trigger_in = Some(delay);
            }
            _ => {}
        }
    }

    /// Schedule a cut after `delay` frames, replacing any pending cut.
    pub fn note_cut(&mut self, delay: u8) {
        self.cut_in = Some(delay);
    }

    /// Advance one frame. Returns the note if it triggered this frame.
    pub fn step(&mut self) -> Option<u8> {
        let mut triggered = None;

        if let Some(frames) = self.trigger_in {
            if frames == 0 {
                self.trigger_in = None;
                self.playing = true;
                triggered = Some(self.note);
            } else {
                self.trigger_in = Some(frames - 1);
            }
        }

        if let Some(frames) = self.cut_in {
            if frames == 0 {
                self.cut_in = None;
                self.playing = false;
                triggered = None;
            } else {
                self.cut_in = Some(frames - 1);
            }
        }

        triggered
    }

    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Drop pending requests and stop playing.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
