use std::collections::VecDeque;

/// How many input lines the shell remembers.
///
/// A few hundred entries keep the store easy to reason about while covering
/// any realistic interactive session.
pub const MAX_ITEMS: usize = 100;

/// Fixed-capacity, insertion-ordered log of raw input lines.
///
/// Entries are indexed from 0 in insertion order; index 0 is always the
/// oldest surviving entry. Once the store is full, appending evicts the
/// oldest entry and every surviving entry's index drops by one, so the
/// store is a sliding window over the last [`capacity`](Self::capacity)
/// inputs. Entries are owned copies and never mutated in place.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    /// Create a store with the default capacity of [`MAX_ITEMS`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_ITEMS)
    }

    /// Create a store bounded at `capacity` entries.
    ///
    /// Backing storage is allocated on first append, not here.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Record one input line, evicting the oldest entry when full.
    ///
    /// The store keeps its own copy; the caller's buffer stays untouched.
    pub fn append(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    /// Drop every stored entry.
    ///
    /// Length becomes 0, the capacity is unchanged and the store keeps
    /// accepting appends. Clearing an empty store is a no-op.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries the store can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The entry at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Entries as `(index, line)` pairs in ascending index order.
    ///
    /// The iterator borrows the live store, so re-listing after further
    /// appends or clears reflects the current state.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, line)| (index, line.as_str()))
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
