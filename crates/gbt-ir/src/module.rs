//! A song together with the instruments and waveforms it references.

use crate::song::Song;
use crate::table::{InstrumentTable, WaveTable};

#[derive(Clone, Debug, Default)]
pub struct Module {
    pub song: Song,
    pub instruments: InstrumentTable,
    pub waveforms: WaveTable,
}

impl Module {
    pub fn new(song: Song) -> Self {
        Self {
            song,
            ..Self::default()
        }
    }
}
