//! Per-channel pitch state machine.
//!
//! Converts a note plus the frequency-class effects (slides, portamento,
//! arpeggio, vibrato, tuning) into one clamped frequency per frame.
//! Parameter changes are staged with the `set_*` methods and committed
//! together by [`FrequencyEngine::apply`]; [`FrequencyEngine::step`]
//! advances the modulation by one frame.

use core::marker::PhantomData;

use gbt_ir::{Effect, EffectType, Sequence, SequenceCursor};

use crate::channel::{ChannelKind, Noise, Tone};

/// Active slide-class or chord modulation. At most one runs at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModType {
    #[default]
    None,
    Portamento,
    PitchSlide,
    NoteSlide,
    Arpeggio,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlideDirection {
    Up,
    Down,
}

/// A modulation request. A zero parameter turns the mode off, except
/// for note slides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modulation {
    Arpeggio(u8),
    PitchSlide(SlideDirection, u8),
    NoteSlide(SlideDirection, u8),
    Portamento(u8),
}

/// Sparse parameter update. Absent fields leave state untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyParams {
    pub note: Option<u8>,
    pub modulation: Option<Modulation>,
    pub vibrato: Option<u8>,
    pub vibrato_delay: Option<u8>,
    pub tune: Option<u8>,
    pub pitch_sequence: Option<Sequence>,
    pub arp_sequence: Option<Sequence>,
}

impl FrequencyParams {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Vibrato {
    enabled: bool,
    /// Frames to hold off after a trigger
    delay: u8,
    delay_counter: u8,
    /// Frames until the next sign flip
    counter: u8,
    /// Current signed offset
    value: i8,
    /// Raw 4xy byte: x = speed, y = depth
    param: u8,
}

impl Vibrato {
    fn depth(&self) -> i8 {
        (self.param & 0xF) as i8
    }

    fn set(&mut self, param: u8) {
        self.param = param;
        let depth = self.depth();
        if depth == 0 {
            self.enabled = false;
            self.value = 0;
        } else {
            self.enabled = true;
            self.value = if self.value < 0 { -depth } else { depth };
        }
    }

    fn restart(&mut self) {
        self.delay_counter = self.delay;
        self.counter = 0;
        if self.enabled {
            self.value = self.depth();
        }
    }

    fn step(&mut self) {
        if !self.enabled {
            return;
        }
        if self.delay_counter > 0 {
            self.delay_counter -= 1;
        } else if self.counter == 0 {
            self.value = -self.value;
            self.counter = self.param >> 4;
        } else {
            self.counter -= 1;
        }
    }

    fn offset(&self) -> i32 {
        if self.enabled && self.delay_counter == 0 {
            self.value as i32
        } else {
            0
        }
    }
}

/// Pitch state for one channel of variant `K`.
#[derive(Clone, Debug)]
pub struct FrequencyEngine<K: ChannelKind> {
    pending: FrequencyParams,
    mod_type: ModType,
    note: u8,
    /// Base frequency before tune, instrument pitch and vibrato
    frequency: u16,
    tune: i8,
    instrument_pitch: i16,
    slide_amount: u8,
    slide_target: u16,
    chord_offsets: [u8; 2],
    chord: [u16; 3],
    chord_index: usize,
    vibrato: Vibrato,
    pitch_sequence: Option<SequenceCursor>,
    arp_sequence: Option<SequenceCursor>,
    _kind: PhantomData<K>,
}

pub type ToneFrequencyEngine = FrequencyEngine<Tone>;
pub type NoiseFrequencyEngine = FrequencyEngine<Noise>;

impl<K: ChannelKind> Default for FrequencyEngine<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ChannelKind> FrequencyEngine<K> {
    pub fn new() -> Self {
        Self {
            pending: FrequencyParams::default(),
            mod_type: ModType::None,
            note: 0,
            frequency: 0,
            tune: 0,
            instrument_pitch: 0,
            slide_amount: 0,
            slide_target: 0,
            chord_offsets: [0; 2],
            chord: [0; 3],
            chord_index: 0,
            vibrato: Vibrato::default(),
            pitch_sequence: None,
            arp_sequence: None,
            _kind: PhantomData,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // --- Staged setters ---

    pub fn set_note(&mut self, note: u8) {
        self.pending.note = Some(note);
    }

    pub fn set_arpeggio(&mut self, param: u8) {
        self.pending.modulation = Some(Modulation::Arpeggio(param));
    }

    pub fn set_pitch_slide(&mut self, direction: SlideDirection, param: u8) {
        self.pending.modulation = Some(Modulation::PitchSlide(direction, param));
    }

    pub fn set_note_slide(&mut self, direction: SlideDirection, param: u8) {
        self.pending.modulation = Some(Modulation::NoteSlide(direction, param));
    }

    pub fn set_portamento(&mut self, param: u8) {
        self.pending.modulation = Some(Modulation::Portamento(param));
    }

    pub fn set_vibrato(&mut self, param: u8) {
        self.pending.vibrato = Some(param);
    }

    pub fn set_vibrato_delay(&mut self, param: u8) {
        self.pending.vibrato_delay = Some(param);
    }

    /// Bias-128 tuning: 0x80 is in tune.
    pub fn set_tune(&mut self, param: u8) {
        self.pending.tune = Some(param);
    }

    pub fn set_pitch_sequence(&mut self, sequence: Sequence) {
        self.pending.pitch_sequence = Some(sequence);
    }

    pub fn set_arp_sequence(&mut self, sequence: Sequence) {
        self.pending.arp_sequence = Some(sequence);
    }

    /// Stage a frequency-class effect. Returns true when the change should
    /// be applied this frame even without a note on the row.
    pub fn set_effect(&mut self, effect: Effect) -> bool {
        let p = effect.param;
        match effect.kind {
            EffectType::Arpeggio => self.set_arpeggio(p),
            EffectType::PitchUp => self.set_pitch_slide(SlideDirection::Up, p),
            EffectType::PitchDown => self.set_pitch_slide(SlideDirection::Down, p),
            EffectType::AutoPortamento => self.set_portamento(p),
            EffectType::Vibrato => self.set_vibrato(p),
            EffectType::Tuning => self.set_tune(p),
            EffectType::NoteSlideUp => self.set_note_slide(SlideDirection::Up, p),
            EffectType::NoteSlideDown => self.set_note_slide(SlideDirection::Down, p),
            EffectType::VibratoDelay => {
                self.set_vibrato_delay(p);
                return false;
            }
            _ => return false,
        }
        true
    }

    /// Commit everything staged since the last apply.
    pub fn apply(&mut self) {
        let params = core::mem::take(&mut self.pending);
        self.apply_params(params);
    }

    /// Commit a parameter set directly.
    pub fn apply_params(&mut self, params: FrequencyParams) {
        let mut note_frequency = None;
        if let Some(note) = params.note.filter(|&n| n <= K::TOP_NOTE) {
            if self.mod_type == ModType::NoteSlide {
                self.mod_type = ModType::None;
            }
            self.note = note;
            note_frequency = Some(K::note_to_frequency(note));
        }

        let mut recompute_chord = false;
        if let Some(modulation) = params.modulation {
            recompute_chord = self.set_modulation(modulation);
        }

        if let Some(param) = params.vibrato {
            self.vibrato.set(param);
        }
        if let Some(delay) = params.vibrato_delay {
            self.vibrato.delay = delay;
        }
        if let Some(tune) = params.tune {
            self.tune = tune.wrapping_sub(0x80) as i8;
        }
        if let Some(seq) = params.pitch_sequence {
            self.pitch_sequence = (!seq.is_empty()).then(|| seq.cursor());
        }
        if let Some(seq) = params.arp_sequence {
            self.arp_sequence = (!seq.is_empty()).then(|| seq.cursor());
        }

        if let Some(freq) = note_frequency {
            if self.mod_type == ModType::Portamento {
                self.slide_target = freq;
            } else {
                self.frequency = freq;
                recompute_chord |= self.mod_type == ModType::Arpeggio;
            }
            self.vibrato.restart();
            self.instrument_pitch = 0;
            if let Some(cursor) = &mut self.pitch_sequence {
                cursor.restart();
            }
            if let Some(cursor) = &mut self.arp_sequence {
                cursor.restart();
            }
        }

        if recompute_chord {
            self.compute_chord();
        }
    }

    /// Switch modulation mode. Returns true if the chord needs recomputing.
    fn set_modulation(&mut self, modulation: Modulation) -> bool {
        match modulation {
            Modulation::Arpeggio(0)
            | Modulation::PitchSlide(_, 0)
            | Modulation::Portamento(0) => {
                self.mod_type = ModType::None;
            }
            Modulation::Arpeggio(param) => {
                self.mod_type = ModType::Arpeggio;
                self.chord_offsets = [param >> 4, param & 0xF];
                return true;
            }
            Modulation::PitchSlide(direction, param) => {
                self.mod_type = ModType::PitchSlide;
                self.slide_amount = param;
                self.slide_target = match direction {
                    SlideDirection::Up => K::MAX_FREQUENCY,
                    SlideDirection::Down => 0,
                };
            }
            Modulation::NoteSlide(direction, param) => {
                let semitones = param >> 4;
                let target = match direction {
                    SlideDirection::Up => self.note.saturating_add(semitones).min(K::TOP_NOTE),
                    SlideDirection::Down => self.note.saturating_sub(semitones),
                };
                self.mod_type = ModType::NoteSlide;
                self.slide_amount = 1 + 2 * (param & 0xF);
                self.slide_target = K::note_to_frequency(target);
                // chained slides start from the target of the previous one
                self.note = target;
            }
            Modulation::Portamento(param) => {
                if self.mod_type != ModType::Portamento {
                    self.mod_type = ModType::Portamento;
                    self.slide_target = self.frequency;
                }
                self.slide_amount = param;
            }
        }
        false
    }

    fn compute_chord(&mut self) {
        let [a, b] = self.chord_offsets;
        self.chord = [
            K::note_to_frequency(self.note),
            K::note_to_frequency(self.note.saturating_add(a).min(K::TOP_NOTE)),
            K::note_to_frequency(self.note.saturating_add(b).min(K::TOP_NOTE)),
        ];
        self.chord_index = 0;
    }

    /// Advance modulation by one frame.
    pub fn step(&mut self) {
        self.vibrato.step();

        if let Some(value) = self.pitch_sequence.as_mut().and_then(Iterator::next) {
            self.instrument_pitch = self.instrument_pitch.saturating_add(value as i8 as i16);
        }

        if let Some(offset) = self.arp_sequence.as_mut().and_then(Iterator::next) {
            let note = (self.note as i16 + offset as i8 as i16).clamp(0, K::TOP_NOTE as i16);
            self.frequency = K::note_to_frequency(note as u8);
            return;
        }

        match self.mod_type {
            ModType::None => {}
            ModType::Portamento | ModType::PitchSlide | ModType::NoteSlide => {
                let target = self.slide_target;
                let amount = self.slide_amount as u16;
                self.frequency = if self.frequency < target {
                    self.frequency.saturating_add(amount).min(target)
                } else {
                    self.frequency.saturating_sub(amount).max(target)
                };
                if self.frequency == target && self.mod_type == ModType::NoteSlide {
                    self.mod_type = ModType::None;
                }
            }
            ModType::Arpeggio => {
                self.frequency = self.chord[self.chord_index];
                self.chord_index = (self.chord_index + 1) % self.chord.len();
            }
        }
    }

    /// Output frequency: base plus tune, instrument pitch and vibrato, clamped.
    pub fn frequency(&self) -> u16 {
        let f = self.frequency as i32
            + self.tune as i32
            + self.instrument_pitch as i32
            + self.vibrato.offset();
        f.clamp(0, K::MAX_FREQUENCY as i32) as u16
    }

    // --- Inspection ---

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn mod_type(&self) -> ModType {
        self.mod_type
    }

    pub fn chord(&self) -> [u16; 3] {
        self.chord
    }

    pub fn tune(&self) -> i8 {
        self.tune
    }

    pub fn instrument_pitch(&self) -> i16 {
        self.instrument_pitch
    }

    pub fn vibrato_enabled(&self) -> bool {
        self.vibrato.enabled
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{note_to_frequency, GB_MAX_FREQUENCY};

    const C4: u8 = 24;

    fn engine_at(note: u8) -> ToneFrequencyEngine {
        let mut fe = ToneFrequencyEngine::new();
        fe.set_note(note);
        fe.apply();
        fe
    }

    fn steps(fe: &mut ToneFrequencyEngine, n: usize) -> alloc::vec::Vec<u16> {
        (0..n)
            .map(|_| {
                fe.step();
                fe.frequency()
            })
            .collect()
    }

    #[test]
    fn note_snaps_frequency() {
        let fe = engine_at(C4);
        assert_eq!(fe.frequency(), note_to_frequency(C4));
        assert_eq!(fe.note(), C4);
    }

    #[test]
    fn invalid_note_is_ignored() {
        let mut fe = engine_at(C4);
        fe.set_note(200);
        fe.apply();
        assert_eq!(fe.note(), C4);
        assert_eq!(fe.frequency(), note_to_frequency(C4));
    }

    #[test]
    fn arpeggio_cycles_chord() {
        let mut fe = ToneFrequencyEngine::new();
        fe.set_note(C4);
        fe.set_arpeggio(0x47);
        fe.apply();
        let expected = [
            note_to_frequency(C4),
            note_to_frequency(C4 + 4),
            note_to_frequency(C4 + 7),
        ];
        assert_eq!(fe.chord(), expected);
        let out = steps(&mut fe, 6);
        assert_eq!(out, [expected[0], expected[1], expected[2], expected[0], expected[1], expected[2]]);
    }

    #[test]
    fn arpeggio_clamps_to_top_note() {
        let mut fe = engine_at(80);
        fe.set_arpeggio(0x3F);
        fe.apply();
        let top = note_to_frequency(gbt_ir::NOTE_LAST);
        assert_eq!(fe.chord(), [note_to_frequency(80), note_to_frequency(83), top]);
    }

    #[test]
    fn arpeggio_zero_disables() {
        let mut fe = engine_at(C4);
        fe.set_arpeggio(0x37);
        fe.apply();
        steps(&mut fe, 2);
        fe.set_arpeggio(0);
        fe.apply();
        assert_eq!(fe.mod_type(), ModType::None);
        let held = fe.frequency();
        assert_eq!(steps(&mut fe, 3), [held, held, held]);
    }

    #[test]
    fn new_note_recomputes_chord() {
        let mut fe = engine_at(C4);
        fe.set_arpeggio(0x47);
        fe.apply();
        fe.step();
        fe.set_note(C4 + 12);
        fe.apply();
        assert_eq!(fe.chord()[0], note_to_frequency(C4 + 12));
        assert_eq!(steps(&mut fe, 1), [note_to_frequency(C4 + 12)]);
    }

    #[test]
    fn note_slide_terminates_exactly() {
        let mut fe = engine_at(C4);
        // 1 semitone up, 5 units per frame
        fe.set_note_slide(SlideDirection::Up, 0x12);
        fe.apply();
        let start = note_to_frequency(C4);
        let target = note_to_frequency(C4 + 1);
        assert_eq!(fe.note(), C4 + 1);
        let n = (target - start).div_ceil(5) as usize;

        let out = steps(&mut fe, n - 1);
        assert!(out.iter().all(|&f| f < target));
        assert_eq!(fe.mod_type(), ModType::NoteSlide);

        fe.step();
        assert_eq!(fe.frequency(), target);
        assert_eq!(fe.mod_type(), ModType::None);
        assert_eq!(steps(&mut fe, 3), [target, target, target]);
    }

    #[test]
    fn note_slide_down_clamps_at_lowest_note() {
        let mut fe = engine_at(2);
        fe.set_note_slide(SlideDirection::Down, 0x5F);
        fe.apply();
        assert_eq!(fe.note(), 0);
        steps(&mut fe, 10);
        assert_eq!(fe.frequency(), note_to_frequency(0));
    }

    #[test]
    fn note_slides_chain() {
        let mut fe = engine_at(C4);
        fe.set_note_slide(SlideDirection::Up, 0x20);
        fe.apply();
        fe.step();
        fe.set_note_slide(SlideDirection::Up, 0x20);
        fe.apply();
        assert_eq!(fe.note(), C4 + 4);
    }

    #[test]
    fn new_note_cancels_note_slide() {
        let mut fe = engine_at(C4);
        fe.set_note_slide(SlideDirection::Up, 0x70);
        fe.apply();
        fe.set_note(C4 + 2);
        fe.apply();
        assert_eq!(fe.mod_type(), ModType::None);
        assert_eq!(fe.frequency(), note_to_frequency(C4 + 2));
    }

    #[test]
    fn pitch_slide_stops_at_ceiling_and_floor() {
        let mut fe = engine_at(gbt_ir::NOTE_LAST);
        fe.set_pitch_slide(SlideDirection::Up, 8);
        fe.apply();
        let out = steps(&mut fe, 4);
        assert_eq!(out[3], GB_MAX_FREQUENCY);
        assert_eq!(fe.mod_type(), ModType::PitchSlide);

        let mut fe = engine_at(0);
        fe.set_pitch_slide(SlideDirection::Down, 0xFF);
        fe.apply();
        assert_eq!(steps(&mut fe, 2), [0, 0]);
    }

    #[test]
    fn pitch_slide_zero_disables() {
        let mut fe = engine_at(C4);
        fe.set_pitch_slide(SlideDirection::Up, 4);
        fe.apply();
        fe.set_pitch_slide(SlideDirection::Up, 0);
        fe.apply();
        assert_eq!(fe.mod_type(), ModType::None);
    }

    #[test]
    fn portamento_glides_to_next_note() {
        let mut fe = engine_at(C4);
        fe.set_portamento(0x10);
        fe.set_note(C4 + 1);
        fe.apply();
        let start = note_to_frequency(C4);
        let target = note_to_frequency(C4 + 1);
        assert_eq!(fe.frequency(), start);
        assert_eq!(steps(&mut fe, 3), [start + 16, target, target]);
        assert_eq!(fe.mod_type(), ModType::Portamento);
    }

    #[test]
    fn vibrato_oscillates() {
        let mut fe = ToneFrequencyEngine::new();
        fe.set_vibrato(0x12);
        fe.set_note(C4);
        fe.apply();
        let base = note_to_frequency(C4);
        assert_eq!(fe.frequency(), base + 2);
        assert_eq!(steps(&mut fe, 5), [base - 2, base - 2, base + 2, base + 2, base - 2]);
    }

    #[test]
    fn vibrato_delay_holds_off_after_trigger() {
        let mut fe = ToneFrequencyEngine::new();
        fe.set_vibrato(0x02);
        fe.set_vibrato_delay(2);
        fe.set_note(C4);
        fe.apply();
        let base = note_to_frequency(C4);
        assert_eq!(fe.frequency(), base);
        assert_eq!(steps(&mut fe, 3), [base, base + 2, base - 2]);
    }

    #[test]
    fn vibrato_zero_depth_disables() {
        let mut fe = ToneFrequencyEngine::new();
        fe.set_vibrato(0x14);
        fe.set_note(C4);
        fe.apply();
        fe.step();
        fe.set_vibrato(0x10);
        fe.apply();
        assert!(!fe.vibrato_enabled());
        assert_eq!(fe.frequency(), note_to_frequency(C4));
    }

    #[test]
    fn vibrato_change_keeps_sign() {
        let mut fe = ToneFrequencyEngine::new();
        fe.set_vibrato(0x42);
        fe.set_note(C4);
        fe.apply();
        fe.step();
        let base = note_to_frequency(C4);
        assert_eq!(fe.frequency(), base - 2);
        fe.set_vibrato(0x45);
        fe.apply();
        assert_eq!(fe.frequency(), base - 5);
    }

    #[test]
    fn tune_is_bias_128() {
        let mut fe = engine_at(C4);
        fe.set_tune(0x83);
        fe.apply();
        assert_eq!(fe.tune(), 3);
        assert_eq!(fe.frequency(), note_to_frequency(C4) + 3);
        fe.set_tune(0x7E);
        fe.apply();
        assert_eq!(fe.frequency(), note_to_frequency(C4) - 2);
    }

    #[test]
    fn output_is_always_clamped() {
        let mut fe = engine_at(gbt_ir::NOTE_LAST);
        fe.set_tune(0xFF);
        fe.set_vibrato(0x0F);
        fe.set_pitch_sequence(Sequence::from_signed(&[127], Some(0)).unwrap());
        fe.apply();
        for _ in 0..40 {
            fe.step();
            assert!(fe.frequency() <= GB_MAX_FREQUENCY);
        }

        let mut fe = engine_at(0);
        fe.set_tune(0x00);
        fe.set_pitch_sequence(Sequence::from_signed(&[-128], Some(0)).unwrap());
        fe.apply();
        for _ in 0..40 {
            fe.step();
            assert_eq!(fe.frequency(), 0);
        }
    }

    #[test]
    fn empty_apply_changes_nothing() {
        let mut fe = engine_at(C4);
        fe.set_arpeggio(0x47);
        fe.set_vibrato(0x23);
        fe.set_tune(0x90);
        fe.apply();
        fe.step();
        let before = fe.clone();
        fe.apply();
        fe.apply_params(FrequencyParams::default());
        assert_eq!(fe.frequency(), before.frequency());
        assert_eq!(fe.mod_type(), before.mod_type());
        assert_eq!(fe.chord(), before.chord());
        let mut reference = before;
        assert_eq!(steps(&mut fe, 6), steps(&mut reference, 6));
    }

    #[test]
    fn pitch_sequence_accumulates_and_resets_on_note() {
        let mut fe = ToneFrequencyEngine::new();
        fe.set_pitch_sequence(Sequence::from_signed(&[2, 2, -1], None).unwrap());
        fe.set_note(C4);
        fe.apply();
        let base = note_to_frequency(C4);
        assert_eq!(steps(&mut fe, 4), [base + 2, base + 4, base + 3, base + 3]);
        fe.set_note(C4);
        fe.apply();
        assert_eq!(fe.instrument_pitch(), 0);
        assert_eq!(steps(&mut fe, 1), [base + 2]);
    }

    #[test]
    fn arp_sequence_overrides_modulation() {
        let mut fe = ToneFrequencyEngine::new();
        fe.set_pitch_slide(SlideDirection::Up, 0x20);
        fe.set_arp_sequence(Sequence::from_signed(&[0, 12, -1], None).unwrap());
        fe.set_note(C4);
        fe.apply();
        assert_eq!(
            steps(&mut fe, 3),
            [note_to_frequency(C4), note_to_frequency(C4 + 12), note_to_frequency(C4 - 1)]
        );
        // sequence exhausted: the slide resumes
        fe.step();
        assert_eq!(fe.frequency(), note_to_frequency(C4 - 1) + 0x20);
    }

    #[test]
    fn set_effect_reports_immediate_apply() {
        let mut fe = ToneFrequencyEngine::new();
        assert!(fe.set_effect(Effect::new(EffectType::PitchUp, 1)));
        assert!(fe.set_effect(Effect::new(EffectType::Arpeggio, 0x37)));
        assert!(!fe.set_effect(Effect::new(EffectType::VibratoDelay, 4)));
        assert!(!fe.set_effect(Effect::new(EffectType::SetEnvelope, 0xF0)));
        assert!(fe.has_pending());
        fe.apply();
        assert!(!fe.has_pending());
        assert_eq!(fe.mod_type(), ModType::Arpeggio);
    }

    #[test]
    fn noise_variant_uses_pitch_units() {
        let mut fe = NoiseFrequencyEngine::new();
        fe.set_note(10);
        fe.apply();
        assert_eq!(fe.frequency(), 40);
        fe.set_pitch_slide(SlideDirection::Up, 0xFF);
        fe.apply();
        fe.step();
        assert_eq!(fe.frequency(), Noise::MAX_FREQUENCY);
        fe.set_note(gbt_ir::NOTE_NOISE_LAST + 1);
        fe.apply();
        assert_eq!(fe.note(), 10);
    }
}
