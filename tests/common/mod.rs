#![allow(dead_code)]

use std::sync::Arc;

use symsynth::atom::{AtomLibrary, BinaryAtom, NullaryAtom, UnaryAtom};
use symsynth::target::TableTarget;

pub const WIDTH: usize = 256;

/// The reference atom set: argument `X`, constants `1..=3`, unary `NOT` and
/// `BITCOUNT`, binary `SUM`, `AND`, `OR` over `u16` vectors of width 256.
pub fn test_atoms() -> AtomLibrary<u16> {
    let mut atoms = AtomLibrary::new(WIDTH);
    atoms.add_nullary(NullaryAtom::table("X", (0..WIDTH as u16).collect()));
    for c in 1..=3u16 {
        atoms.add_nullary(NullaryAtom::constant(c.to_string(), c, WIDTH));
    }
    atoms.add_unary(UnaryAtom::new("NOT", true, false, |xs: &[u16]| {
        xs.iter().map(|x| !x).collect()
    }));
    atoms.add_unary(UnaryAtom::new("BITCOUNT", false, false, |xs: &[u16]| {
        xs.iter().map(|x| x.count_ones() as u16).collect()
    }));
    atoms.add_binary(BinaryAtom::new("SUM", true, false, |a: &[u16], b: &[u16]| {
        a.iter().zip(b).map(|(x, y)| x.wrapping_add(*y)).collect()
    }));
    atoms.add_binary(BinaryAtom::new("AND", true, true, |a: &[u16], b: &[u16]| {
        a.iter().zip(b).map(|(x, y)| x & y).collect()
    }));
    atoms.add_binary(BinaryAtom::new("OR", true, true, |a: &[u16], b: &[u16]| {
        a.iter().zip(b).map(|(x, y)| x | y).collect()
    }));
    atoms
}

pub fn shared_atoms() -> Arc<AtomLibrary<u16>> {
    Arc::new(test_atoms())
}

/// `T[i] = i`.
pub fn identity_target() -> TableTarget<u16> {
    TableTarget::from_fn(WIDTH, |i| i as u16)
}
