//! Bounded, ordered candidate list for streaming top-k selection.

use std::cmp::Ordering;

/// Keeps at most `k` items ordered by ascending distance.
///
/// Equal distances keep insertion order, so a scan produces the same
/// result every time for the same file.
#[derive(Debug)]
pub struct TopK<T> {
    k: usize,
    items: Vec<(f32, T)>,
}

impl<T> TopK<T> {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k.saturating_add(1).min(1024)),
        }
    }

    /// Offer a candidate; returns whether it was kept.
    pub fn push(&mut self, distance: f32, item: T) -> bool {
        if self.k == 0 {
            return false;
        }

        // Upper bound: after every existing entry with distance <= this one
        let pos = self
            .items
            .partition_point(|(d, _)| d.total_cmp(&distance) != Ordering::Greater);
        if pos >= self.k {
            return false;
        }

        self.items.insert(pos, (distance, item));
        self.items.truncate(self.k);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume into `(distance, item)` pairs, nearest first.
    pub fn into_sorted_vec(self) -> Vec<(f32, T)> {
        self.items
    }
}
