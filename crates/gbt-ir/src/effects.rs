//! Effect commands carried in the effect columns of a row.
//!
//! The top two bits of an effect tag select its category, so the
//! sequencer can route a whole class of effects with one mask.

/// Which handler consumes an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectCategory {
    /// Flow control: goto, halt, skip, tempo
    Pattern,
    /// Persistent per-channel settings
    Track,
    /// Pitch modulation, routed to the frequency engine
    Frequency,
}

/// Effect type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EffectType {
    /// Bxx: jump to order xx
    PatternGoto = 0x00,
    /// C00: stop playback
    PatternHalt = 0x01,
    /// Dxx: advance to the next order, starting at row xx
    PatternSkip = 0x02,
    /// Fxx: set speed (Q4.4 frames per row)
    SetTempo = 0x03,
    /// Txx: sound effect trigger (reserved)
    Sfx = 0x04,

    /// Exx: set envelope (waveform index on CH3)
    SetEnvelope = 0x40,
    /// Vxx: set timbre (duty, wave volume or noise step width)
    SetTimbre = 0x41,
    /// Ixy: set panning
    SetPanning = 0x42,
    /// Hxx: set sweep register (CH1 only)
    SetSweep = 0x43,
    /// Sxx: cut the note after xx frames
    DelayedCut = 0x44,
    /// Gxx: trigger the row's note after xx frames
    DelayedNote = 0x45,
    /// L00: lock channel (reserved)
    Lock = 0x46,

    /// 0xy: arpeggio
    Arpeggio = 0x80,
    /// 1xx: pitch slide up
    PitchUp = 0x81,
    /// 2xx: pitch slide down
    PitchDown = 0x82,
    /// 3xx: automatic portamento
    AutoPortamento = 0x83,
    /// 4xy: vibrato, x = speed, y = depth
    Vibrato = 0x84,
    /// 5xx: vibrato delay in frames
    VibratoDelay = 0x85,
    /// Pxx: fine tuning, 0x80 is in tune
    Tuning = 0x86,
    /// Qxy: note slide up y*2+1 units per frame, x semitones
    NoteSlideUp = 0x87,
    /// Rxy: note slide down y*2+1 units per frame, x semitones
    NoteSlideDown = 0x88,
}

const CATEGORY_MASK: u8 = 0xC0;
const CATEGORY_TRACK: u8 = 0x40;
const CATEGORY_FREQUENCY: u8 = 0x80;

impl EffectType {
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn category(self) -> EffectCategory {
        match self.tag() & CATEGORY_MASK {
            0 => EffectCategory::Pattern,
            CATEGORY_TRACK => EffectCategory::Track,
            _ => EffectCategory::Frequency,
        }
    }

    /// Decode a raw tag. Unknown tags yield `None`.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        use EffectType::*;
        Some(match tag {
            0x00 => PatternGoto,
            0x01 => PatternHalt,
            0x02 => PatternSkip,
            0x03 => SetTempo,
            0x04 => Sfx,
            0x40 => SetEnvelope,
            0x41 => SetTimbre,
            0x42 => SetPanning,
            0x43 => SetSweep,
            0x44 => DelayedCut,
            0x45 => DelayedNote,
            0x46 => Lock,
            0x80 => Arpeggio,
            0x81 => PitchUp,
            0x82 => PitchDown,
            0x83 => AutoPortamento,
            0x84 => Vibrato,
            0x85 => VibratoDelay,
            0x86 => Tuning,
            0x87 => NoteSlideUp,
            0x88 => NoteSlideDown,
            _ => return None,
        })
    }

    /// Column symbol shown in the pattern editor.
    pub const fn symbol(self) -> char {
        use EffectType::*;
        match self {
            PatternGoto => 'B',
            PatternHalt => 'C',
            PatternSkip => 'D',
            SetTempo => 'F',
            Sfx => 'T',
            SetEnvelope => 'E',
            SetTimbre => 'V',
            SetPanning => 'I',
            SetSweep => 'H',
            DelayedCut => 'S',
            DelayedNote => 'G',
            Lock => 'L',
            Arpeggio => '0',
            PitchUp => '1',
            PitchDown => '2',
            AutoPortamento => '3',
            Vibrato => '4',
            VibratoDelay => '5',
            Tuning => 'P',
            NoteSlideUp => 'Q',
            NoteSlideDown => 'R',
        }
    }

    pub fn name(&self) -> &'static str {
        use EffectType::*;
        match self {
            PatternGoto => "Pattern Goto",
            PatternHalt => "Pattern Halt",
            PatternSkip => "Pattern Skip",
            SetTempo => "Set Tempo",
            Sfx => "Sound Effect",
            SetEnvelope => "Set Envelope",
            SetTimbre => "Set Timbre",
            SetPanning => "Set Panning",
            SetSweep => "Set Sweep",
            DelayedCut => "Delayed Cut",
            DelayedNote => "Delayed Note",
            Lock => "Lock",
            Arpeggio => "Arpeggio",
            PitchUp => "Pitch Slide Up",
            PitchDown => "Pitch Slide Down",
            AutoPortamento => "Portamento",
            Vibrato => "Vibrato",
            VibratoDelay => "Vibrato Delay",
            Tuning => "Tuning",
            NoteSlideUp => "Note Slide Up",
            NoteSlideDown => "Note Slide Down",
        }
    }
}

/// An effect column entry: type plus 8-bit parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Effect {
    pub kind: EffectType,
    pub param: u8,
}

impl Effect {
    pub const fn new(kind: EffectType, param: u8) -> Self {
        Self { kind, param }
    }

    pub const fn category(self) -> EffectCategory {
        self.kind.category()
    }
}

impl core::fmt::Display for Effect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{:02X}", self.kind.symbol(), self.param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_follows_top_bits() {
        assert_eq!(EffectType::PatternHalt.category(), EffectCategory::Pattern);
        assert_eq!(EffectType::SetTempo.category(), EffectCategory::Pattern);
        assert_eq!(EffectType::SetPanning.category(), EffectCategory::Track);
        assert_eq!(EffectType::Lock.category(), EffectCategory::Track);
        assert_eq!(EffectType::Arpeggio.category(), EffectCategory::Frequency);
        assert_eq!(EffectType::NoteSlideDown.category(), EffectCategory::Frequency);
    }

    #[test]
    fn from_tag_rejects_gaps() {
        assert_eq!(EffectType::from_tag(0x05), None);
        assert_eq!(EffectType::from_tag(0x47), None);
        assert_eq!(EffectType::from_tag(0xC0), None);
        assert_eq!(EffectType::from_tag(0x84), Some(EffectType::Vibrato));
    }

    #[test]
    fn display_uses_symbol_and_hex_param() {
        let e = Effect::new(EffectType::Arpeggio, 0x47);
        assert_eq!(alloc::format!("{}", e), "047");
        let e = Effect::new(EffectType::NoteSlideUp, 0x3A);
        assert_eq!(alloc::format!("{}", e), "Q3A");
    }
}
