//! LRU Tracker Module
//!
//! Implements the recency ordering used for cache eviction.

use std::collections::HashMap;
use std::time::Instant;

use crate::cache::CacheEntry;

/// Index into the node slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot(usize);

#[derive(Debug)]
struct Node {
    entry: CacheEntry,
    prev: Option<Slot>,
    next: Option<Slot>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Entries live in a slab-backed doubly linked list where:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// A key index points at each node, so lookup, move-to-head and tail
/// eviction are all O(1). Freed slots are recycled.
#[derive(Debug, Default)]
pub struct LruTracker {
    index: HashMap<Vec<u8>, Slot>,
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<Slot>,
    tail: Option<Slot>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the entry for `key` without changing its position.
    pub fn get(&self, key: &[u8]) -> Option<&CacheEntry> {
        self.index.get(key).map(|&slot| &self.node(slot).entry)
    }

    // == Touch ==
    /// Marks a key as recently used (moves to head) and refreshes its timestamp.
    ///
    /// Inserts the key at head if it is not tracked yet. Returns `true` when the
    /// key was newly inserted.
    pub fn touch(&mut self, key: &[u8], now: Instant) -> bool {
        if let Some(&slot) = self.index.get(key) {
            self.node_mut(slot).entry.touch(now);
            self.move_to_front(slot);
            return false;
        }

        let slot = self.alloc(CacheEntry::new(key.to_vec(), now));
        self.link_front(slot);
        self.index.insert(key.to_vec(), slot);
        true
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &[u8]) -> Option<CacheEntry> {
        let slot = self.index.remove(key)?;
        Some(self.release(slot))
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used entry.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<CacheEntry> {
        let tail = self.tail?;
        let key = self.node(tail).entry.key.clone();
        self.index.remove(&key);
        Some(self.release(tail))
    }

    // == Restore Oldest ==
    /// Puts a previously evicted entry back at the tail, keeping its timestamp.
    pub fn restore_oldest(&mut self, entry: CacheEntry) {
        if let Some(slot) = self.index.remove(entry.key.as_slice()) {
            self.release(slot);
        }
        let key = entry.key.clone();
        let slot = self.alloc(entry);
        self.link_back(slot);
        self.index.insert(key, slot);
    }

    // == Peek Oldest ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_oldest(&self) -> Option<&CacheEntry> {
        self.tail.map(|slot| &self.node(slot).entry)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    // == Keys ==
    /// Returns tracked keys from most to least recently used.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = self.node(slot);
            keys.push(node.entry.key.clone());
            cursor = node.next;
        }
        keys
    }

    fn node(&self, slot: Slot) -> &Node {
        self.slots[slot.0]
            .as_ref()
            .expect("LRU index points at a vacant slot")
    }

    fn node_mut(&mut self, slot: Slot) -> &mut Node {
        self.slots[slot.0]
            .as_mut()
            .expect("LRU index points at a vacant slot")
    }

    fn alloc(&mut self, entry: CacheEntry) -> Slot {
        let node = Node {
            entry,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                Slot(idx)
            }
            None => {
                self.slots.push(Some(node));
                Slot(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, slot: Slot) -> CacheEntry {
        self.unlink(slot);
        let node = self.slots[slot.0]
            .take()
            .expect("LRU release on a vacant slot");
        self.free.push(slot.0);
        node.entry
    }

    fn unlink(&mut self, slot: Slot) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let node = self.node_mut(slot);
        node.prev = None;
        node.next = None;
    }

    fn link_front(&mut self, slot: Slot) {
        let old_head = self.head;
        {
            let node = self.node_mut(slot);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn link_back(&mut self, slot: Slot) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(slot);
            node.next = None;
            node.prev = old_tail;
        }
        match old_tail {
            Some(t) => self.node_mut(t).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }

    fn move_to_front(&mut self, slot: Slot) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.link_front(slot);
    }
}
