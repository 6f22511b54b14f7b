use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;

/// Bound on the element type of value vectors.
///
/// `Ord` gives the evaluator its cached `(min, max)` and the numeric
/// constant check; `Send + Sync` lets the search worker share the library
/// across threads.
pub trait Value: Clone + Ord + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + Ord + fmt::Debug + Send + Sync + 'static> Value for T {}

/// Number of operand positions of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Nullary,
    Unary,
    Binary,
}

impl Arity {
    pub fn index(self) -> u8 {
        match self {
            Arity::Nullary => 0,
            Arity::Unary => 1,
            Arity::Binary => 2,
        }
    }

    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Arity::Nullary),
            1 => Some(Arity::Unary),
            2 => Some(Arity::Binary),
            _ => None,
        }
    }
}

/// Identifies an atom by `(arity, index)`. Stable for the lifetime of the
/// library that registered the atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomRef {
    pub arity: Arity,
    pub num: usize,
}

impl AtomRef {
    pub fn nullary(num: usize) -> Self {
        AtomRef { arity: Arity::Nullary, num }
    }

    pub fn unary(num: usize) -> Self {
        AtomRef { arity: Arity::Unary, num }
    }

    pub fn binary(num: usize) -> Self {
        AtomRef { arity: Arity::Binary, num }
    }
}

/// A leaf operator: a fixed output vector.
pub struct NullaryAtom<T> {
    symbol: String,
    values: Vec<T>,
    constant: bool,
}

impl<T: Value> NullaryAtom<T> {
    /// A non-constant leaf (an argument of the synthesized formula),
    /// tabulated over all `N` input positions.
    pub fn table(symbol: impl Into<String>, values: Vec<T>) -> Self {
        NullaryAtom { symbol: symbol.into(), values, constant: false }
    }

    /// A constant leaf: the same value at every position.
    pub fn constant(symbol: impl Into<String>, value: T, width: usize) -> Self {
        NullaryAtom {
            symbol: symbol.into(),
            values: vec![value; width],
            constant: true,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }
}

type UnaryEval<T> = Box<dyn Fn(&[T]) -> Vec<T> + Send + Sync>;

/// A one-operand operator.
pub struct UnaryAtom<T> {
    symbol: String,
    involutive: bool,
    identity: bool,
    eval: UnaryEval<T>,
}

impl<T: Value> UnaryAtom<T> {
    pub fn new<F>(symbol: impl Into<String>, involutive: bool, identity: bool, eval: F) -> Self
    where
        F: Fn(&[T]) -> Vec<T> + Send + Sync + 'static,
    {
        UnaryAtom {
            symbol: symbol.into(),
            involutive,
            identity,
            eval: Box::new(eval),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// `f(f(x)) == x` for all x.
    pub fn involutive(&self) -> bool {
        self.involutive
    }

    /// `f(x) == x` for all x.
    pub fn identity(&self) -> bool {
        self.identity
    }

    pub fn eval(&self, arg: &[T]) -> Vec<T> {
        (self.eval)(arg)
    }
}

type BinaryEval<T> = Box<dyn Fn(&[T], &[T]) -> Vec<T> + Send + Sync>;

/// A two-operand operator.
pub struct BinaryAtom<T> {
    symbol: String,
    commutative: bool,
    idempotent: bool,
    eval: BinaryEval<T>,
}

impl<T: Value> BinaryAtom<T> {
    pub fn new<F>(symbol: impl Into<String>, commutative: bool, idempotent: bool, eval: F) -> Self
    where
        F: Fn(&[T], &[T]) -> Vec<T> + Send + Sync + 'static,
    {
        BinaryAtom {
            symbol: symbol.into(),
            commutative,
            idempotent,
            eval: Box::new(eval),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// `f(a, b) == f(b, a)`.
    pub fn commutative(&self) -> bool {
        self.commutative
    }

    /// Whether `f(x, x)` is never worth enumerating (e.g. `f(x, x) == x`, or
    /// collapses to a constant).
    pub fn idempotent(&self) -> bool {
        self.idempotent
    }

    pub fn eval(&self, arg1: &[T], arg2: &[T]) -> Vec<T> {
        (self.eval)(arg1, arg2)
    }
}

/// All atomic operations available to the synthesizer, grouped by arity.
///
/// Atoms are registered up front and are immutable afterwards; trees refer to
/// them by [`AtomRef`]. Within arity 0, non-constant atoms always precede
/// constants: the enumerator depends on never crossing from a constant back
/// to a non-constant when it increments a leaf index.
pub struct AtomLibrary<T> {
    width: usize,
    nullary: Vec<NullaryAtom<T>>,
    unary: Vec<UnaryAtom<T>>,
    binary: Vec<BinaryAtom<T>>,
}

impl<T: Value> AtomLibrary<T> {
    /// Create an empty library for output vectors of length `width`.
    pub fn new(width: usize) -> Self {
        AtomLibrary {
            width,
            nullary: Vec::new(),
            unary: Vec::new(),
            binary: Vec::new(),
        }
    }

    /// Declared length of every value vector.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn add_nullary(&mut self, atom: NullaryAtom<T>) {
        assert_eq!(
            atom.values().len(),
            self.width,
            "nullary atom {:?} does not match the library width",
            atom.symbol()
        );
        if atom.is_constant() {
            self.nullary.push(atom);
        } else {
            self.nullary.insert(0, atom);
        }
    }

    pub fn add_unary(&mut self, atom: UnaryAtom<T>) {
        self.unary.push(atom);
    }

    pub fn add_binary(&mut self, atom: BinaryAtom<T>) {
        self.binary.push(atom);
    }

    pub fn nullary_len(&self) -> usize {
        self.nullary.len()
    }

    pub fn unary_len(&self) -> usize {
        self.unary.len()
    }

    pub fn binary_len(&self) -> usize {
        self.binary.len()
    }

    pub fn nullary(&self, num: usize) -> &NullaryAtom<T> {
        &self.nullary[num]
    }

    pub fn unary(&self, num: usize) -> &UnaryAtom<T> {
        &self.unary[num]
    }

    pub fn binary(&self, num: usize) -> &BinaryAtom<T> {
        &self.binary[num]
    }

    /// Checked membership; used when reconstructing trees from persisted
    /// state, where a bad index is data corruption rather than a bug.
    pub fn contains(&self, arity: Arity, num: usize) -> bool {
        num < match arity {
            Arity::Nullary => self.nullary.len(),
            Arity::Unary => self.unary.len(),
            Arity::Binary => self.binary.len(),
        }
    }

    pub fn symbol(&self, r: AtomRef) -> &str {
        match r.arity {
            Arity::Nullary => self.nullary(r.num).symbol(),
            Arity::Unary => self.unary(r.num).symbol(),
            Arity::Binary => self.binary(r.num).symbol(),
        }
    }

    /// `M(l)`: the number of canonical trees of depth `<= max_depth`.
    ///
    /// ```text
    /// M(0) = A0
    /// M(l) = M(l-1) + (M(l-1) - M(l-2)) * A1 + M(l-1) * (M(l-1) - M(l-2)) * A2
    /// ```
    ///
    /// where `(M(l-1) - M(l-2))` counts trees of depth exactly `l-1`: the
    /// canonical form pins a unary child (and a binary right child) at depth
    /// exactly one less than its parent.
    pub fn tree_count(&self, max_depth: usize) -> BigUint {
        let a1 = BigUint::from(self.unary.len());
        let a2 = BigUint::from(self.binary.len());

        let mut prev = BigUint::zero(); // M(l-2)
        let mut current = BigUint::from(self.nullary.len()); // M(l-1)
        for _ in 0..max_depth {
            let exact = &current - &prev; // trees of depth exactly l-1
            let next = &current + &exact * &a1 + &current * &exact * &a2;
            prev = std::mem::replace(&mut current, next);
        }
        current
    }
}

impl<T> fmt::Debug for AtomLibrary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomLibrary")
            .field("width", &self.width)
            .field("nullary", &self.nullary.len())
            .field("unary", &self.unary.len())
            .field("binary", &self.binary.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> AtomLibrary<u16> {
        let mut atoms = AtomLibrary::new(4);
        atoms.add_nullary(NullaryAtom::constant("0", 0, 4));
        atoms.add_nullary(NullaryAtom::table("X", vec![0, 1, 2, 3]));
        atoms.add_nullary(NullaryAtom::constant("7", 7, 4));
        atoms.add_nullary(NullaryAtom::table("Y", vec![3, 2, 1, 0]));
        atoms.add_unary(UnaryAtom::new("NOT", true, false, |xs: &[u16]| {
            xs.iter().map(|x| !x).collect()
        }));
        atoms.add_binary(BinaryAtom::new("AND", true, true, |a: &[u16], b: &[u16]| {
            a.iter().zip(b).map(|(x, y)| x & y).collect()
        }));
        atoms
    }

    #[test]
    fn test_nonconstants_precede_constants() {
        let atoms = library();
        let symbols: Vec<_> = (0..atoms.nullary_len())
            .map(|i| atoms.nullary(i).symbol().to_string())
            .collect();
        // The two tables were pushed to the front (latest first), the two
        // constants appended in registration order.
        assert_eq!(symbols, ["Y", "X", "0", "7"]);
        assert!(!atoms.nullary(0).is_constant());
        assert!(!atoms.nullary(1).is_constant());
        assert!(atoms.nullary(2).is_constant());
        assert!(atoms.nullary(3).is_constant());
    }

    #[test]
    fn test_contains() {
        let atoms = library();
        assert!(atoms.contains(Arity::Nullary, 3));
        assert!(!atoms.contains(Arity::Nullary, 4));
        assert!(atoms.contains(Arity::Unary, 0));
        assert!(!atoms.contains(Arity::Unary, 1));
        assert!(!atoms.contains(Arity::Binary, 1));
    }

    #[test]
    fn test_tree_count_small() {
        // A0 = 4, A1 = 2, A2 = 3:
        //   M(0) = 4
        //   M(1) = 4 + 4*2 + 4*4*3 = 60
        //   M(2) = 60 + 56*2 + 60*56*3 = 10252
        let mut atoms = AtomLibrary::<u16>::new(1);
        for s in ["a", "b", "c", "d"] {
            atoms.add_nullary(NullaryAtom::table(s, vec![0]));
        }
        for s in ["u", "v"] {
            atoms.add_unary(UnaryAtom::new(s, false, false, |xs: &[u16]| xs.to_vec()));
        }
        for s in ["f", "g", "h"] {
            atoms.add_binary(BinaryAtom::new(s, false, false, |a: &[u16], _: &[u16]| {
                a.to_vec()
            }));
        }
        assert_eq!(atoms.tree_count(0), 4u32.into());
        assert_eq!(atoms.tree_count(1), 60u32.into());
        assert_eq!(atoms.tree_count(2), 10252u32.into());
    }

    #[test]
    fn test_tree_count_leaves_only() {
        let mut atoms = AtomLibrary::<u16>::new(1);
        atoms.add_nullary(NullaryAtom::table("X", vec![0]));
        atoms.add_nullary(NullaryAtom::constant("1", 1, 1));
        // No internal atoms: the space never grows past the leaves.
        assert_eq!(atoms.tree_count(0), 2u32.into());
        assert_eq!(atoms.tree_count(5), 2u32.into());
    }

    #[test]
    #[should_panic(expected = "width")]
    fn test_width_mismatch_panics() {
        let mut atoms = AtomLibrary::<u16>::new(4);
        atoms.add_nullary(NullaryAtom::table("X", vec![0, 1]));
    }
}
