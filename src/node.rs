use std::collections::HashSet;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::atom::{Arity, AtomLibrary, AtomRef, Value};
use crate::error::{Error, Result};

/// A node in an expression tree.
///
/// # Fields
///
/// - `atom`: which atomic operation this node applies
/// - `arg1`: first child (present iff arity >= 1)
/// - `arg2`: second child (present iff arity == 2)
/// - `values` / `extremes`: cached evaluation output and its `(min, max)`
///
/// Children are owned exclusively; copies are deep and keep their caches, so
/// a tree stored away from the enumeration cursor re-ranks without
/// recomputation. Structural equality and the serial number ignore caches.
///
/// Every tree operation takes the [`AtomLibrary`] as a parameter instead of
/// holding a back-reference per node: the library outlives every tree, and
/// keeping nodes plain data makes deep copies and (de)serialization trivial.
#[derive(Debug, Clone)]
pub struct FuncNode<T> {
    pub(crate) atom: AtomRef,
    pub(crate) arg1: Option<Box<FuncNode<T>>>,
    pub(crate) arg2: Option<Box<FuncNode<T>>>,
    values: Vec<T>,
    extremes: Option<(T, T)>,
}

impl<T: Value> Default for FuncNode<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Value> FuncNode<T> {
    /// The first tree of the enumeration: arity 0, atom 0 (serial 0).
    pub fn new() -> Self {
        Self::leaf(0)
    }

    pub fn leaf(num: usize) -> Self {
        FuncNode {
            atom: AtomRef::nullary(num),
            arg1: None,
            arg2: None,
            values: Vec::new(),
            extremes: None,
        }
    }

    pub fn unary(num: usize, arg: FuncNode<T>) -> Self {
        FuncNode {
            atom: AtomRef::unary(num),
            arg1: Some(Box::new(arg)),
            arg2: None,
            values: Vec::new(),
            extremes: None,
        }
    }

    pub fn binary(num: usize, arg1: FuncNode<T>, arg2: FuncNode<T>) -> Self {
        FuncNode {
            atom: AtomRef::binary(num),
            arg1: Some(Box::new(arg1)),
            arg2: Some(Box::new(arg2)),
            values: Vec::new(),
            extremes: None,
        }
    }

    pub fn atom(&self) -> AtomRef {
        self.atom
    }

    pub fn arity(&self) -> Arity {
        self.atom.arity
    }

    pub fn arg1(&self) -> Option<&FuncNode<T>> {
        self.arg1.as_deref()
    }

    pub fn arg2(&self) -> Option<&FuncNode<T>> {
        self.arg2.as_deref()
    }

    /// Height of the tree: length of the longest root-to-leaf path.
    pub fn depth_max(&self) -> usize {
        match self.arity() {
            Arity::Nullary => 0,
            Arity::Unary => self.first_child().depth_max() + 1,
            Arity::Binary => {
                let a = self.first_child().depth_max();
                let b = self.second_child().depth_max();
                a.max(b) + 1
            }
        }
    }

    /// Length of the shortest root-to-leaf path.
    pub fn depth_min(&self) -> usize {
        match self.arity() {
            Arity::Nullary => 0,
            Arity::Unary => self.first_child().depth_min() + 1,
            Arity::Binary => {
                let a = self.first_child().depth_min();
                let b = self.second_child().depth_min();
                a.min(b) + 1
            }
        }
    }

    /// Number of internal (arity >= 1) nodes.
    pub fn functions_count(&self) -> usize {
        match self.arity() {
            Arity::Nullary => 0,
            Arity::Unary => self.first_child().functions_count() + 1,
            Arity::Binary => {
                self.first_child().functions_count() + self.second_child().functions_count() + 1
            }
        }
    }

    /// Collect the serial numbers of every internal-node subtree. Leaves are
    /// excluded; repeated subtrees collapse into one entry, which makes the
    /// set size a proxy for complexity after subtree sharing.
    pub fn unique_function_serials(&self, atoms: &AtomLibrary<T>, out: &mut HashSet<BigUint>) {
        match self.arity() {
            Arity::Nullary => return,
            Arity::Unary => {
                self.first_child().unique_function_serials(atoms, out);
            }
            Arity::Binary => {
                self.first_child().unique_function_serials(atoms, out);
                self.second_child().unique_function_serials(atoms, out);
            }
        }
        out.insert(self.serial_number(atoms));
    }

    /// Structural constant check: an arity-0 constant, or a tree all of whose
    /// leaves are constants. A tree that merely *evaluates* to a constant
    /// vector is caught by the numeric check on [`extremes`](Self::extremes).
    pub fn is_constant(&self, atoms: &AtomLibrary<T>) -> bool {
        match self.arity() {
            Arity::Nullary => atoms.nullary(self.atom.num).is_constant(),
            Arity::Unary => self.first_child().is_constant(atoms),
            Arity::Binary => {
                self.first_child().is_constant(atoms) && self.second_child().is_constant(atoms)
            }
        }
    }

    /// Evaluate the tree over all `N` input positions, memoizing per node.
    ///
    /// With `force` the output of *this* node is recomputed; children still
    /// reuse their caches. Updates the cached `(min, max)`.
    pub fn evaluate(&mut self, atoms: &AtomLibrary<T>, force: bool) -> &[T] {
        if force || self.values.is_empty() {
            let values = match self.arity() {
                Arity::Nullary => atoms.nullary(self.atom.num).values().to_vec(),
                Arity::Unary => {
                    let arg = self
                        .arg1
                        .as_mut()
                        .expect("unary node missing argument")
                        .evaluate(atoms, false);
                    atoms.unary(self.atom.num).eval(arg)
                }
                Arity::Binary => {
                    let v1 = self
                        .arg1
                        .as_mut()
                        .expect("binary node missing argument 1")
                        .evaluate(atoms, false);
                    let v2 = self
                        .arg2
                        .as_mut()
                        .expect("binary node missing argument 2")
                        .evaluate(atoms, false);
                    atoms.binary(self.atom.num).eval(v1, v2)
                }
            };
            debug_assert_eq!(values.len(), atoms.width(), "atom produced a vector of the wrong width");
            self.extremes = match (values.iter().min(), values.iter().max()) {
                (Some(lo), Some(hi)) => Some((lo.clone(), hi.clone())),
                _ => None,
            };
            self.values = values;
        }
        &self.values
    }

    /// Cached `(min, max)` of the last evaluation, if any.
    pub fn extremes(&self) -> Option<(&T, &T)> {
        self.extremes.as_ref().map(|(lo, hi)| (lo, hi))
    }

    /// Drop cached outputs in the whole tree; they are rebuilt lazily by the
    /// next [`evaluate`](Self::evaluate).
    pub fn clear_cached(&mut self) {
        self.clear_cached_self();
        if let Some(arg) = self.arg1.as_mut() {
            arg.clear_cached();
        }
        if let Some(arg) = self.arg2.as_mut() {
            arg.clear_cached();
        }
    }

    pub(crate) fn clear_cached_self(&mut self) {
        self.values.clear();
        self.extremes = None;
    }

    fn first_child(&self) -> &FuncNode<T> {
        self.arg1.as_deref().expect("node missing argument 1")
    }

    fn second_child(&self) -> &FuncNode<T> {
        self.arg2.as_deref().expect("node missing argument 2")
    }

    /// The canonical serial number of this tree.
    ///
    /// Trees are ordered by depth first, then lexicographically inside the
    /// depth class: a depth class of depth `l` starts at `M(l-1)`, holds the
    /// unary trees first (grouped by atom, ordered by child serial), then the
    /// binary trees (grouped by atom, then by right-child serial, with the
    /// left child varying fastest).
    pub fn serial_number(&self, atoms: &AtomLibrary<T>) -> BigUint {
        if self.arity() == Arity::Nullary {
            return BigUint::from(self.atom.num);
        }

        let level = self.depth_max();
        let m_prev = atoms.tree_count(level - 1);
        let m_prev2 = if level > 1 {
            atoms.tree_count(level - 2)
        } else {
            BigUint::zero()
        };
        let exact = &m_prev - &m_prev2; // trees of depth exactly level-1

        match self.arity() {
            Arity::Nullary => unreachable!(),
            Arity::Unary => {
                let child_sn = self.first_child().serial_number(atoms) - &m_prev2;
                m_prev + exact * BigUint::from(self.atom.num) + child_sn
            }
            Arity::Binary => {
                let left_sn = self.first_child().serial_number(atoms);
                let right_sn = self.second_child().serial_number(atoms) - &m_prev2;
                let mut sn = m_prev.clone();
                sn += &exact * BigUint::from(atoms.unary_len());
                sn += &m_prev * &exact * BigUint::from(self.atom.num);
                sn += &m_prev * right_sn;
                sn += left_sn;
                sn
            }
        }
    }

    /// Reconstruct the canonical tree with the given serial number.
    ///
    /// Inverse of [`serial_number`](Self::serial_number): locate the smallest
    /// depth class containing `sn`, then unpack the atom index and child
    /// serials in reverse order of the assignment.
    pub fn from_serial_number(atoms: &AtomLibrary<T>, sn: &BigUint) -> Result<Self> {
        let mut level = 0usize;
        let mut m = atoms.tree_count(0);
        let mut m_prev = BigUint::zero();
        while sn >= &m {
            let next = atoms.tree_count(level + 1);
            if next == m {
                // The space stopped growing: no depth class contains sn.
                return Err(Error::SerialOutOfRange { sn: sn.clone() });
            }
            m_prev = std::mem::replace(&mut m, next);
            level += 1;
        }

        if level == 0 {
            let num = sn.to_usize().expect("leaf index fits in usize");
            return Ok(FuncNode::leaf(num));
        }

        let m_prev2 = if level > 1 {
            atoms.tree_count(level - 2)
        } else {
            BigUint::zero()
        };
        let exact = &m_prev - &m_prev2;
        let rem = sn - &m_prev;
        let unary_block = &exact * BigUint::from(atoms.unary_len());

        if rem < unary_block {
            let num = (&rem / &exact).to_usize().expect("unary index fits in usize");
            let child_sn = &rem % &exact + &m_prev2;
            let child = Self::from_serial_number(atoms, &child_sn)?;
            Ok(FuncNode::unary(num, child))
        } else {
            let rem = rem - unary_block;
            let block = &m_prev * &exact;
            let num = (&rem / &block).to_usize().expect("binary index fits in usize");
            let inner = &rem % &block;
            let right_sn = &inner / &m_prev + &m_prev2;
            let left_sn = &inner % &m_prev;
            let left = Self::from_serial_number(atoms, &left_sn)?;
            let right = Self::from_serial_number(atoms, &right_sn)?;
            Ok(FuncNode::binary(num, left, right))
        }
    }

    /// Printable form: `SYM`, `SYM(arg)`, or `SYM(arg1;arg2)`.
    pub fn repr(&self, atoms: &AtomLibrary<T>) -> String {
        let symbol = atoms.symbol(self.atom);
        match self.arity() {
            Arity::Nullary => symbol.to_string(),
            Arity::Unary => format!("{}({})", symbol, self.first_child().repr(atoms)),
            Arity::Binary => format!(
                "{}({};{})",
                symbol,
                self.first_child().repr(atoms),
                self.second_child().repr(atoms)
            ),
        }
    }

    /// Serializable form of the tree. The atom symbol travels along as an
    /// advisory `name` for human readers of the state file.
    pub fn to_json(&self, atoms: &AtomLibrary<T>) -> NodeJson {
        NodeJson {
            arity: u64::from(self.atom.arity.index()),
            num: self.atom.num as u64,
            name: Some(atoms.symbol(self.atom).to_string()),
            arg1: self.arg1.as_ref().map(|a| Box::new(a.to_json(atoms))),
            arg2: self.arg2.as_ref().map(|a| Box::new(a.to_json(atoms))),
        }
    }

    /// Rebuild a tree from its serialized form, validating every atom
    /// reference against the library. Children beyond the declared arity are
    /// ignored; missing required children are an error.
    pub fn from_json(atoms: &AtomLibrary<T>, json: &NodeJson) -> Result<Self> {
        let arity = Arity::from_index(json.arity).ok_or(Error::BadArity { arity: json.arity })?;
        let num = usize::try_from(json.num).map_err(|_| Error::UnknownAtom {
            arity: arity.index(),
            num: json.num,
        })?;
        if !atoms.contains(arity, num) {
            return Err(Error::UnknownAtom {
                arity: arity.index(),
                num: json.num,
            });
        }

        let arg1 = if arity == Arity::Nullary {
            None
        } else {
            let child = json.arg1.as_deref().ok_or(Error::MissingChild {
                arity: arity.index(),
                slot: 1,
            })?;
            Some(Box::new(Self::from_json(atoms, child)?))
        };
        let arg2 = if arity == Arity::Binary {
            let child = json.arg2.as_deref().ok_or(Error::MissingChild {
                arity: arity.index(),
                slot: 2,
            })?;
            Some(Box::new(Self::from_json(atoms, child)?))
        } else {
            None
        };

        Ok(FuncNode {
            atom: AtomRef { arity, num },
            arg1,
            arg2,
            values: Vec::new(),
            extremes: None,
        })
    }
}

/// Structural equality: `(arity, index)` tuples and children, recursively.
/// Evaluation caches do not participate.
impl<T> PartialEq for FuncNode<T> {
    fn eq(&self, other: &Self) -> bool {
        self.atom == other.atom && self.arg1 == other.arg1 && self.arg2 == other.arg2
    }
}

impl<T> Eq for FuncNode<T> {}

/// Wire form of a tree node.
///
/// `arg1` is present iff `arity >= 1`, `arg2` iff `arity == 2`. Unknown
/// fields in the input are tolerated; `name` is advisory on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeJson {
    pub arity: u64,
    pub num: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg1: Option<Box<NodeJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg2: Option<Box<NodeJson>>,
}
