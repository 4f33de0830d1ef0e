//! Row and track types.

use alloc::vec::Vec;

use crate::effects::Effect;
use crate::note::Note;

/// Effect columns per row.
pub const MAX_EFFECTS: usize = 3;

/// One row of one track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Row {
    /// Note value
    pub note: Note,
    /// Instrument id, if the row selects one
    pub instrument: Option<u8>,
    /// Effect columns, processed left to right
    pub effects: [Option<Effect>; MAX_EFFECTS],
}

impl Row {
    /// Create an empty row.
    pub const fn empty() -> Self {
        Self {
            note: Note::None,
            instrument: None,
            effects: [None; MAX_EFFECTS],
        }
    }

    /// Returns true if the row carries nothing.
    pub fn is_empty(&self) -> bool {
        self.note == Note::None && self.instrument.is_none() && self.effects.iter().all(Option::is_none)
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.note = note;
        self
    }

    pub fn with_instrument(mut self, id: u8) -> Self {
        self.instrument = Some(id);
        self
    }

    /// Put `effect` in the first free column. A full row is left unchanged.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        if let Some(slot) = self.effects.iter_mut().find(|e| e.is_none()) {
            *slot = Some(effect);
        }
        self
    }

    /// Occupied effect columns in order.
    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter().flatten()
    }
}

/// A fixed-length column of rows for one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    rows: Vec<Row>,
}

impl Track {
    /// Create a track of `rows` empty rows.
    pub fn new(rows: u16) -> Self {
        Self {
            rows: alloc::vec![Row::empty(); rows as usize],
        }
    }

    pub fn len(&self) -> u16 {
        self.rows.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: u16) -> Option<&Row> {
        self.rows.get(index as usize)
    }

    pub fn row_mut(&mut self, index: u16) -> Option<&mut Row> {
        self.rows.get_mut(index as usize)
    }

    /// Overwrite row `index`. Out-of-range indices are ignored.
    pub fn set_row(&mut self, index: u16, row: Row) {
        if let Some(slot) = self.rows.get_mut(index as usize) {
            *slot = row;
        }
    }

    /// Rows that carry anything, with their index.
    pub fn non_empty_rows(&self) -> impl Iterator<Item = (u16, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_empty())
            .map(|(i, r)| (i as u16, r))
    }

    pub(crate) fn resize(&mut self, rows: u16) {
        self.rows.resize(rows as usize, Row::empty());
    }
}
