//! Stable integer handles into the queue and vertical-entry arenas.
//!
//! The reference source links `queue_entry` and `vertical_entry` records
//! together with raw pointers embedded in singly-linked lists and hash
//! chains. We replace that graph with two arenas (`SeedQueue`, a
//! `Vec<VerticalEntry>`) indexed by these newtypes, per the design note in
//! spec.md section 9.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeedId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u32);

impl SeedId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EntryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
