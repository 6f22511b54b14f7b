use log::debug;

use crate::atom::{AtomLibrary, Value};
use crate::node::FuncNode;
use crate::suitability::Suitability;
use crate::target::Target;

/// Bounded list of the best candidate trees, ordered by [`Suitability`].
///
/// Entries are deep copies, independent of the enumeration cursor, and keep
/// their evaluation caches so re-ranking an existing entry costs nothing.
/// The `threshold` mirrors the suitability of the worst entry whenever the
/// pool is full; before the pool has ever filled it stays at
/// [`Suitability::WORST`], which disables the early-rejection shortcut.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPool<T> {
    entries: Vec<FuncNode<T>>,
    threshold: Suitability,
}

impl<T: Value> Default for RankedPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Value> RankedPool<T> {
    pub fn new() -> Self {
        RankedPool {
            entries: Vec::new(),
            threshold: Suitability::WORST,
        }
    }

    /// Rebuild a pool from restored state.
    pub fn from_parts(entries: Vec<FuncNode<T>>, threshold: Suitability) -> Self {
        RankedPool { entries, threshold }
    }

    pub fn entries(&self) -> &[FuncNode<T>] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [FuncNode<T>] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn threshold(&self) -> Suitability {
        self.threshold
    }

    pub fn pop_last(&mut self) -> Option<FuncNode<T>> {
        self.entries.pop()
    }

    /// Offer a candidate to the pool of bound `k`. Returns whether a copy of
    /// the candidate was inserted.
    ///
    /// A candidate enters only at the first position it improves on; one that
    /// beats no existing entry is rejected even while the pool has room.
    /// Insertion is also refused when any existing entry has the same output
    /// vector or the same match-position set (two formulas that agree
    /// everywhere, or fail in exactly the same places, teach nothing new).
    /// When the pool is full, a candidate worse than the threshold is
    /// rejected outright.
    pub fn try_admit(
        &mut self,
        tree: &mut FuncNode<T>,
        k: usize,
        atoms: &AtomLibrary<T>,
        target: &dyn Target<T>,
    ) -> bool {
        if k == 0 {
            return false;
        }
        if self.entries.is_empty() {
            tree.evaluate(atoms, false);
            self.entries.push(tree.clone());
            if self.entries.len() == k {
                self.threshold = Suitability::of(&mut self.entries[0], atoms, target);
            }
            return true;
        }

        let new_key = Suitability::of(tree, atoms, target);
        if self.entries.len() >= k && new_key > self.threshold {
            return false;
        }

        let new_values = tree.evaluate(atoms, false).to_vec();
        let new_positions = target.match_positions(&new_values);

        let mut insert_at = None;
        for i in 0..self.entries.len() {
            let key = Suitability::of(&mut self.entries[i], atoms, target);
            if new_key < key {
                insert_at = Some(i);
                break;
            }
        }

        let mut admitted = false;
        if let Some(pos) = insert_at {
            let duplicate = self.entries.iter_mut().any(|entry| {
                let values = entry.evaluate(atoms, false);
                values == new_values.as_slice() || target.match_positions(values) == new_positions
            });
            if !duplicate {
                debug!("pool: insert at {} key ({}) {}", pos, new_key, tree.repr(atoms));
                self.entries.insert(pos, tree.clone());
                admitted = true;
            }
        }

        if self.entries.len() > k {
            self.entries.truncate(k);
        }
        if self.entries.len() == k {
            let last = self.entries.last_mut().expect("pool is non-empty");
            self.threshold = Suitability::of(last, atoms, target);
        }
        admitted
    }
}
