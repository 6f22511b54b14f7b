use crate::atom::Value;
use crate::range_set::RangeSet;

/// Number of positions at which a candidate disagrees with the target;
/// 0 means an exact match on all positions.
pub type Distance = usize;

/// The function being synthesized, tabulated over all `N` input positions.
///
/// `compare` and `match_positions` have default implementations derived from
/// [`values`](Target::values), which keeps the two views consistent: equal
/// candidate vectors always produce equal distances and equal match-position
/// sets. Implementations may override them (e.g. to weight positions) as long
/// as that consistency holds.
pub trait Target<T: Value>: Send + Sync {
    /// The desired output vector.
    fn values(&self) -> &[T];

    /// How far a candidate output is from the target.
    fn compare(&self, values: &[T]) -> Distance {
        self.values()
            .iter()
            .zip(values)
            .filter(|(want, got)| want != got)
            .count()
    }

    /// The set of positions where the candidate agrees with the target.
    fn match_positions(&self, values: &[T]) -> RangeSet {
        self.values()
            .iter()
            .zip(values)
            .enumerate()
            .filter(|(_, (want, got))| want == got)
            .map(|(i, _)| i)
            .collect()
    }
}

/// The canonical target: a plain lookup table.
#[derive(Debug, Clone)]
pub struct TableTarget<T> {
    values: Vec<T>,
}

impl<T: Value> TableTarget<T> {
    pub fn new(values: Vec<T>) -> Self {
        TableTarget { values }
    }

    /// Tabulate `f` over positions `0..width`.
    pub fn from_fn(width: usize, f: impl FnMut(usize) -> T) -> Self {
        TableTarget {
            values: (0..width).map(f).collect(),
        }
    }
}

impl<T: Value> Target<T> for TableTarget<T> {
    fn values(&self) -> &[T] {
        &self.values
    }
}
