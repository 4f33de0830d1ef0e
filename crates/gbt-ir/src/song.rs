//! Song: order list plus per-channel track storage.
//!
//! Each order row names one track id per channel. Tracks are stored per
//! channel and all share the song's rows-per-pattern length, so a
//! pattern is just the four tracks an order row points at.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::channel::{ChannelId, CHANNEL_COUNT};
use crate::error::IrError;
use crate::pattern::{Row, Track};
use crate::speed::Speed;

/// Maximum entries in the order list.
pub const MAX_ORDERS: usize = 256;
/// Maximum rows per pattern.
pub const MAX_ROWS: u16 = 256;
/// Rows per pattern for a new song.
pub const DEFAULT_ROWS: u16 = 64;
/// Rows per beat for a new song.
pub const DEFAULT_ROWS_PER_BEAT: u8 = 4;

/// Track ids for each channel at one position in the order list.
pub type OrderRow = [u8; CHANNEL_COUNT];

#[derive(Clone, Debug)]
pub struct Song {
    /// Song title (max 32 bytes)
    pub title: ArrayString<32>,
    /// Rows per beat, used to derive speed from tempo
    pub rows_per_beat: u8,
    speed: Speed,
    rows_per_pattern: u16,
    order: Vec<OrderRow>,
    tracks: [Vec<Track>; CHANNEL_COUNT],
}

impl Default for Song {
    fn default() -> Self {
        Self {
            title: ArrayString::new(),
            rows_per_beat: DEFAULT_ROWS_PER_BEAT,
            speed: Speed::DEFAULT,
            rows_per_pattern: DEFAULT_ROWS,
            order: alloc::vec![[0; CHANNEL_COUNT]],
            tracks: Default::default(),
        }
    }
}

impl Song {
    /// Create a song with one order row pointing at track 0 on every channel.
    pub fn new(title: &str) -> Self {
        Self {
            title: crate::truncated_name(title),
            ..Self::default()
        }
    }

    // --- Timing ---

    /// Initial speed.
    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Set the initial speed from a raw Q4.4 value.
    pub fn set_speed(&mut self, raw: u8) -> Result<(), IrError> {
        self.speed = Speed::try_from(raw)?;
        Ok(())
    }

    /// Set the initial speed from a tempo in BPM.
    pub fn set_tempo(&mut self, tempo: u16) {
        self.speed = Speed::from_tempo(tempo, self.rows_per_beat);
    }

    // --- Layout ---

    pub fn rows_per_pattern(&self) -> u16 {
        self.rows_per_pattern
    }

    /// Change the track length; every stored track is resized.
    pub fn set_rows_per_pattern(&mut self, rows: u16) -> Result<(), IrError> {
        if rows == 0 || rows > MAX_ROWS {
            return Err(IrError::RowCountOutOfRange(rows));
        }
        self.rows_per_pattern = rows;
        for track in self.tracks.iter_mut().flatten() {
            track.resize(rows);
        }
        Ok(())
    }

    // --- Order list ---

    pub fn order(&self) -> &[OrderRow] {
        &self.order
    }

    pub fn order_len(&self) -> usize {
        self.order.len()
    }

    pub fn push_order(&mut self, row: OrderRow) -> Result<(), IrError> {
        if self.order.len() >= MAX_ORDERS {
            return Err(IrError::OrderFull);
        }
        self.order.push(row);
        Ok(())
    }

    pub fn set_order(&mut self, index: usize, row: OrderRow) -> Result<(), IrError> {
        let slot = self.order.get_mut(index).ok_or(IrError::OrderIndexOutOfRange(index))?;
        *slot = row;
        Ok(())
    }

    /// Replace the whole order list. An empty list is rejected.
    pub fn set_order_list(&mut self, order: &[OrderRow]) -> Result<(), IrError> {
        if order.is_empty() {
            return Err(IrError::OrderIndexOutOfRange(0));
        }
        if order.len() > MAX_ORDERS {
            return Err(IrError::OrderFull);
        }
        self.order.clear();
        self.order.extend_from_slice(order);
        Ok(())
    }

    // --- Tracks ---

    pub fn track(&self, channel: ChannelId, id: u8) -> Option<&Track> {
        self.tracks[channel.index()].get(id as usize)
    }

    /// Get a track for editing, creating it (and any lower ids) if needed.
    pub fn track_mut(&mut self, channel: ChannelId, id: u8) -> &mut Track {
        let rows = self.rows_per_pattern;
        let tracks = &mut self.tracks[channel.index()];
        if tracks.len() <= id as usize {
            tracks.resize_with(id as usize + 1, || Track::new(rows));
        }
        &mut tracks[id as usize]
    }

    /// Convenience for building songs in code.
    pub fn set_row(&mut self, channel: ChannelId, track_id: u8, row_index: u16, row: Row) {
        self.track_mut(channel, track_id).set_row(row_index, row);
    }

    /// The four tracks at `order_index`, or `None` past the end of the order list.
    pub fn pattern(&self, order_index: usize) -> Option<Pattern<'_>> {
        let ids = self.order.get(order_index)?;
        let mut tracks = [None; CHANNEL_COUNT];
        for (slot, ch) in tracks.iter_mut().zip(ChannelId::ALL) {
            *slot = self.track(ch, ids[ch.index()]);
        }
        Some(Pattern {
            tracks,
            rows: self.rows_per_pattern,
        })
    }
}

/// A read-only view of the tracks referenced by one order row.
#[derive(Clone, Copy, Debug)]
pub struct Pattern<'a> {
    tracks: [Option<&'a Track>; CHANNEL_COUNT],
    rows: u16,
}

impl Pattern<'_> {
    /// Number of rows in each track.
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Row on `channel`. Missing tracks and out-of-range rows read as empty.
    pub fn row(&self, channel: ChannelId, row: u16) -> Row {
        self.tracks[channel.index()]
            .and_then(|t| t.row(row))
            .copied()
            .unwrap_or_default()
    }
}
