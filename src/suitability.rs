use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::atom::{AtomLibrary, Value};
use crate::node::FuncNode;
use crate::target::Target;

/// Composite ranking key for candidate trees, smaller is better.
///
/// The ordering is lexicographic in field declaration order: exact-distance
/// improvement always dominates, and equal-distance ties break towards the
/// structurally simpler tree. Two keys equal in every field are *equivalent*
/// trees for ranking purposes, not necessarily identical trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Suitability {
    /// Mismatch count reported by the target; 0 is a perfect match.
    pub distance: usize,
    /// Tree height.
    pub max_level: usize,
    /// Number of internal nodes.
    pub functions_count: usize,
    /// Number of distinct internal subtrees, by serial number.
    pub functions_unique: usize,
}

impl Suitability {
    /// The worst possible key. Doubles as the pool threshold before the pool
    /// has ever been full, which keeps the early-rejection shortcut inert.
    pub const WORST: Suitability = Suitability {
        distance: usize::MAX,
        max_level: usize::MAX,
        functions_count: usize::MAX,
        functions_unique: usize::MAX,
    };

    /// Rank a tree against a target. Uses the tree's evaluation cache when it
    /// is warm.
    pub fn of<T: Value>(
        tree: &mut FuncNode<T>,
        atoms: &AtomLibrary<T>,
        target: &dyn Target<T>,
    ) -> Self {
        let values = tree.evaluate(atoms, false);
        let distance = target.compare(values);
        let mut uniq = HashSet::new();
        tree.unique_function_serials(atoms, &mut uniq);
        Suitability {
            distance,
            max_level: tree.depth_max(),
            functions_count: tree.functions_count(),
            functions_unique: uniq.len(),
        }
    }
}

impl Default for Suitability {
    fn default() -> Self {
        Suitability::WORST
    }
}

impl fmt::Display for Suitability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dist {} lvl {} fnc {} fnu {}",
            self.distance, self.max_level, self.functions_count, self.functions_unique
        )
    }
}
