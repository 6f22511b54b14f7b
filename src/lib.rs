//! # symsynth: exhaustive symbolic synthesis over typed expression trees
//!
//! Given a tabulated target function `T: {0..N-1} -> V` and a library of
//! atomic operations of arity 0, 1, and 2, `symsynth` enumerates every
//! well-formed expression tree up to a depth bound, evaluates each against
//! the target, and keeps a bounded ranked list of the closest matches. The
//! motivating use case is hunting for a compact bitwise formula that
//! reproduces a byte-indexed decoding table (see the `alaw` binary), but the
//! core is generic over the value type and the operator set.
//!
//! ## How the enumeration works
//!
//! Every tree has a **serial number**: trees are ordered by depth first,
//! then lexicographically within a depth class. The canonical form pins a
//! binary node's right subtree (and a unary node's only subtree) at depth
//! exactly one less than the node, so the count of trees of depth `<= l`
//! follows
//!
//! ```text
//! M(0) = A0
//! M(l) = M(l-1) + (M(l-1) - M(l-2)) * A1 + M(l-1) * (M(l-1) - M(l-2)) * A2
//! ```
//!
//! The [`Enumerator`][crate::enumerate::Enumerator] walks this order in
//! place, optionally skipping constant trees and the symmetric half of
//! commutative applications. Serial numbers use
//! [`BigUint`](num_bigint::BigUint): the space overflows 64 bits around
//! depth 6 with realistic libraries.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use symsynth::atom::{AtomLibrary, BinaryAtom, NullaryAtom, UnaryAtom};
//! use symsynth::search::{SearchTask, Settings};
//! use symsynth::target::TableTarget;
//!
//! // Atoms over vectors indexed by 0..=7.
//! let mut atoms = AtomLibrary::new(8);
//! atoms.add_nullary(NullaryAtom::table("X", (0..8u16).collect()));
//! atoms.add_nullary(NullaryAtom::constant("1", 1, 8));
//! atoms.add_unary(UnaryAtom::new("NOT", true, false, |xs: &[u16]| {
//!     xs.iter().map(|x| !x).collect()
//! }));
//! atoms.add_binary(BinaryAtom::new("OR", true, true, |a: &[u16], b: &[u16]| {
//!     a.iter().zip(b).map(|(x, y)| x | y).collect()
//! }));
//!
//! // Synthesize x | 1.
//! let target = Arc::new(TableTarget::from_fn(8, |i| i as u16 | 1));
//! let task = SearchTask::new(Settings::default(), Arc::new(atoms), target);
//! while task.step() {
//!     if task.status().best_entries.first().map(|b| b.suitability.distance) == Some(0) {
//!         break;
//!     }
//! }
//! assert_eq!(task.status().best_entries[0].repr, "OR(X;1)");
//! ```
//!
//! ## Core components
//!
//! - [`atom`]: the operator library, grouped by arity.
//! - [`node`]: expression trees with cached evaluation and serial numbering.
//! - [`enumerate`]: the canonical successor operation and pruning rules.
//! - [`pool`] / [`suitability`]: the bounded ranked list of best candidates.
//! - [`search`]: the background search driver with pause/resume state.

pub mod atom;
pub mod enumerate;
pub mod error;
pub mod node;
pub mod pool;
pub mod range_set;
pub mod search;
pub mod status;
pub mod suitability;
pub mod target;
