//! End-to-end checks of the canonical enumeration: the exact yielded
//! sequences, the counting law, serial monotonicity and the bijection with
//! serial numbers.

mod common;

use num_bigint::BigUint;
use num_traits::Zero;

use symsynth::atom::{Arity, AtomLibrary};
use symsynth::enumerate::{Enumerator, PruneRules};
use symsynth::node::FuncNode;

use common::test_atoms;

const SKIP_SYMMETRIC: PruneRules = PruneRules {
    skip_constant: false,
    skip_symmetric: true,
};

const SKIP_CONSTANT: PruneRules = PruneRules {
    skip_constant: true,
    skip_symmetric: false,
};

#[test]
fn test_initial_state() {
    let atoms = test_atoms();
    let e = Enumerator::<u16>::new(PruneRules::NONE);
    assert_eq!(e.cursor().repr(&atoms), "X");
    assert_eq!(e.cursor().serial_number(&atoms), BigUint::zero());
}

#[test]
fn test_skip_symmetric_sequence_depth2() {
    let atoms = test_atoms();
    let mut e = Enumerator::<u16>::new(SKIP_SYMMETRIC);

    let expected = [
        // depth 0: all leaves
        "1", "2", "3",
        // depth 1: unary over the leaves
        "NOT(X)", "NOT(1)", "NOT(2)", "NOT(3)",
        "BITCOUNT(X)", "BITCOUNT(1)", "BITCOUNT(2)", "BITCOUNT(3)",
        // SUM is commutative but not idempotent: equal children stay
        "SUM(X;X)", "SUM(X;1)", "SUM(1;1)", "SUM(X;2)", "SUM(1;2)", "SUM(2;2)",
        "SUM(X;3)", "SUM(1;3)", "SUM(2;3)", "SUM(3;3)",
        // AND and OR are idempotent: equal children are gone
        "AND(X;1)", "AND(X;2)", "AND(1;2)", "AND(X;3)", "AND(1;3)", "AND(2;3)",
        "OR(X;1)", "OR(X;2)", "OR(1;2)", "OR(X;3)", "OR(1;3)", "OR(2;3)",
        // the first tree of depth 2
        "NOT(NOT(X))",
    ];
    for want in expected {
        assert!(e.advance(&atoms, 2), "enumeration ended before {}", want);
        assert_eq!(e.cursor().repr(&atoms), want);
    }
}

#[test]
fn test_count_law() {
    let atoms = test_atoms();

    for (max_depth, expected) in [(0usize, 4u32), (1, 60), (2, 10252)] {
        let mut e = Enumerator::<u16>::new(PruneRules::NONE);
        let mut count = 1u32; // the initial tree
        while e.advance(&atoms, max_depth) {
            count += 1;
        }
        assert_eq!(count, expected, "depth <= {}", max_depth);
        assert_eq!(atoms.tree_count(max_depth), expected.into());
    }
}

#[test]
fn test_monotone_serials_raw() {
    let atoms = test_atoms();
    let mut e = Enumerator::<u16>::new(PruneRules::NONE);
    let mut last = e.cursor().serial_number(&atoms);
    while e.advance(&atoms, 2) {
        let sn = e.cursor().serial_number(&atoms);
        assert!(sn > last, "serial went {} -> {} at {}", last, sn, e.cursor().repr(&atoms));
        last = sn;
    }
    // The final tree is the last one of the space.
    assert_eq!(last + 1u32, atoms.tree_count(2));
}

#[test]
fn test_monotone_serials_with_pruning() {
    let atoms = test_atoms();
    let mut e = Enumerator::<u16>::new(PruneRules::ALL);
    let mut last = e.cursor().serial_number(&atoms);
    let mut yielded = 0u32;
    while e.advance(&atoms, 2) {
        let sn = e.cursor().serial_number(&atoms);
        assert!(sn > last, "serial went {} -> {} at {}", last, sn, e.cursor().repr(&atoms));
        last = sn;
        yielded += 1;
    }
    // Pruning dropped something but kept a nontrivial share.
    assert!(yielded > 0);
    assert!(BigUint::from(yielded) < atoms.tree_count(2));
}

#[test]
fn test_serial_bijection() {
    let atoms = test_atoms();
    let mut e = Enumerator::<u16>::new(PruneRules::NONE);
    loop {
        let sn = e.cursor().serial_number(&atoms);
        let rebuilt = FuncNode::from_serial_number(&atoms, &sn)
            .unwrap_or_else(|err| panic!("{} for {}", err, e.cursor().repr(&atoms)));
        assert_eq!(&rebuilt, e.cursor(), "serial {} rebuilt differently", sn);
        if !e.advance(&atoms, 2) {
            break;
        }
    }
}

#[test]
fn test_constant_skip_law() {
    let atoms = test_atoms();
    let mut e = Enumerator::<u16>::new(SKIP_CONSTANT);
    while e.advance(&atoms, 2) {
        assert!(!e.cursor().is_constant(&atoms), "{}", e.cursor().repr(&atoms));
        let mut tree = e.cursor().clone();
        tree.evaluate(&atoms, true);
        let (lo, hi) = tree.extremes().expect("evaluated tree has extremes");
        assert!(lo != hi, "constant output leaked through: {}", tree.repr(&atoms));
    }
}

/// Independent re-check of the symmetry canon, written against the public
/// API only.
fn assert_symmetry_canon(tree: &FuncNode<u16>, atoms: &AtomLibrary<u16>) {
    if tree.arity() != Arity::Binary {
        if let Some(arg) = tree.arg1() {
            assert_symmetry_canon(arg, atoms);
        }
        return;
    }
    let left = tree.arg1().unwrap();
    let right = tree.arg2().unwrap();
    let atom = atoms.binary(tree.atom().num);
    if atom.commutative() {
        let sl = left.serial_number(atoms);
        let sr = right.serial_number(atoms);
        if atom.idempotent() {
            assert!(sl < sr, "idempotent atom with sL >= sR in {}", tree.repr(atoms));
        } else {
            assert!(sl <= sr, "commutative atom with sL > sR in {}", tree.repr(atoms));
        }
    }
    assert_symmetry_canon(left, atoms);
    assert_symmetry_canon(right, atoms);
}

#[test]
fn test_symmetry_skip_law() {
    let atoms = test_atoms();
    let mut e = Enumerator::<u16>::new(SKIP_SYMMETRIC);
    let mut saw_nested_binary = false;
    while e.advance(&atoms, 2) {
        assert_symmetry_canon(e.cursor(), &atoms);
        if e.cursor().functions_count() >= 2 && e.cursor().arity() == Arity::Binary {
            saw_nested_binary = true;
        }
    }
    assert!(saw_nested_binary, "the sweep never reached nested binary trees");
}
