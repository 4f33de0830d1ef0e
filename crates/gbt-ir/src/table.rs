//! Id-indexed storage for instruments and waveforms.

use alloc::vec::Vec;

use crate::error::IrError;
use crate::instrument::Instrument;
use crate::waveform::Waveform;

/// Number of ids a table can hold.
pub const TABLE_CAPACITY: usize = 64;

/// Sparse table addressed by the ids stored in rows and programs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table<T> {
    items: Vec<Option<T>>,
}

pub type InstrumentTable = Table<Instrument>;
pub type WaveTable = Table<Waveform>;

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Table<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u8) -> Option<&T> {
        self.items.get(id as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: u8) -> Option<&mut T> {
        self.items.get_mut(id as usize)?.as_mut()
    }

    /// Store `item` under `id`, returning what was there before.
    pub fn insert(&mut self, id: u8, item: T) -> Result<Option<T>, IrError> {
        if id as usize >= TABLE_CAPACITY {
            return Err(IrError::TableIdOutOfRange(id));
        }
        if self.items.len() <= id as usize {
            self.items.resize_with(id as usize + 1, || None);
        }
        Ok(self.items[id as usize].replace(item))
    }

    pub fn remove(&mut self, id: u8) -> Option<T> {
        self.items.get_mut(id as usize)?.take()
    }

    /// Lowest id with nothing stored.
    pub fn next_available_id(&self) -> Option<u8> {
        (0..TABLE_CAPACITY)
            .find(|&i| self.items.get(i).map_or(true, Option::is_none))
            .map(|i| i as u8)
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|i| i.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &T)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_ref().map(|t| (i as u8, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut table: Table<u32> = Table::new();
        assert_eq!(table.insert(3, 30), Ok(None));
        assert_eq!(table.insert(3, 31), Ok(Some(30)));
        assert_eq!(table.get(3), Some(&31));
        assert_eq!(table.get(2), None);
        assert_eq!(table.get(200), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.remove(3), Some(31));
        assert!(table.is_empty());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut table: Table<u32> = Table::new();
        assert_eq!(table.insert(64, 0), Err(IrError::TableIdOutOfRange(64)));
    }

    #[test]
    fn next_available_skips_used_ids() {
        let mut table: Table<u32> = Table::new();
        table.insert(0, 0).unwrap();
        table.insert(2, 0).unwrap();
        assert_eq!(table.next_available_id(), Some(1));
        let ids: Vec<u8> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, [0, 2]);
    }
}
