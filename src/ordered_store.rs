//! OrderedStore: the storage behind one runtime object.
//!
//! Unique string keys in insertion order. Entries live in a `SlotMap`, a
//! `HashTable` indexes them by key hash, and `order` lists slot keys in
//! enumeration order. Removing a key shifts the position of every key after
//! it; positions are only meaningful until the next mutation.

use core::hash::BuildHasher;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: String,
    hash: u64,
}

#[derive(Clone)]
pub(crate) struct OrderedStore {
    hasher: RandomState,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry>,
    order: Vec<DefaultKey>,
}

impl OrderedStore {
    pub(crate) fn new() -> Self {
        Self {
            hasher: RandomState::new(),
            index: HashTable::new(),
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    fn find_slot(&self, key: &str) -> Option<DefaultKey> {
        let hash = self.hasher.hash_one(key);
        self.index
            .find(hash, |&k| self.slots.get(k).map(|e| e.key == key).unwrap_or(false))
            .copied()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        let k = self.find_slot(key)?;
        self.slots.get(k).map(|e| e.value.as_str())
    }

    /// Overwrite the value of an existing key in place, or append a new key
    /// at the end of the order. Returns true if the key was new.
    pub(crate) fn set(&mut self, key: &str, value: &str) -> bool {
        let hash = self.hasher.hash_one(key);
        match self.index.entry(
            hash,
            |&kk| self.slots.get(kk).map(|e| e.key == key).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                let entry = self.slots.get_mut(k).expect("indexed slot must be live");
                entry.value.clear();
                entry.value.push_str(value);
                false
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let k = self.slots.insert(Entry {
                    key: key.to_owned(),
                    value: value.to_owned(),
                    hash,
                });
                let _ = v.insert(k);
                self.order.push(k);
                true
            }
        }
    }

    /// Remove `key`; later keys move one position towards the front.
    pub(crate) fn remove(&mut self, key: &str) -> Option<String> {
        let k = self.find_slot(key)?;
        let entry = self.slots.remove(k)?;
        if let Ok(indexed) = self.index.find_entry(entry.hash, |&kk| kk == k) {
            indexed.remove();
        }
        let pos = self
            .order
            .iter()
            .position(|&kk| kk == k)
            .expect("live slot must be ordered");
        self.order.remove(pos);
        Some(entry.value)
    }

    pub(crate) fn nth_key(&self, n: usize) -> Option<&str> {
        let k = *self.order.get(n)?;
        self.slots.get(k).map(|e| e.key.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order.iter().map(move |&k| {
            let e = &self.slots[k];
            (e.key.as_str(), e.value.as_str())
        })
    }
}
