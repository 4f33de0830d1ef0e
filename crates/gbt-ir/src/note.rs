//! Note values as they appear in a track row.

/// Highest playable note index (B-8).
pub const NOTE_LAST: u8 = 83;

/// Highest note index the noise channel accepts (B-6).
pub const NOTE_NOISE_LAST: u8 = 59;

/// Note index reserved for a note cut.
pub const NOTE_CUT: u8 = NOTE_LAST + 1;

/// Lowest octave in the note table; index 0 is C-2.
const OCTAVE_BASE: u8 = 2;

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// A note value in a track row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Note {
    /// No note
    #[default]
    None,
    /// Note on with a table index (0 = C-2, 83 = B-8)
    On(u8),
    /// Note cut
    Cut,
}

impl Note {
    /// Create a note from octave (2-8) and semitone (0-11).
    pub const fn from_octave_semitone(octave: u8, semitone: u8) -> Self {
        Note::On((octave - OCTAVE_BASE) * 12 + semitone)
    }

    /// Get the octave (2-8) if this is a note on.
    pub const fn octave(self) -> Option<u8> {
        match self {
            Note::On(n) => Some(n / 12 + OCTAVE_BASE),
            _ => None,
        }
    }

    /// Get the semitone (0-11) if this is a note on.
    pub const fn semitone(self) -> Option<u8> {
        match self {
            Note::On(n) => Some(n % 12),
            _ => None,
        }
    }

    /// Raw index handed to note control. Cuts map to [`NOTE_CUT`].
    pub const fn index(self) -> Option<u8> {
        match self {
            Note::None => None,
            Note::On(n) => Some(n),
            Note::Cut => Some(NOTE_CUT),
        }
    }
}

impl core::fmt::Display for Note {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Note::None => f.write_str("---"),
            Note::Cut => f.write_str("==="),
            Note::On(n) if n <= NOTE_LAST => {
                write!(f, "{}{}", NOTE_NAMES[(n % 12) as usize], n / 12 + OCTAVE_BASE)
            }
            Note::On(_) => f.write_str("???"),
        }
    }
}
