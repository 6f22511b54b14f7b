use crate::atom::{Arity, AtomLibrary, AtomRef, Value};
use crate::node::FuncNode;

/// Which equivalence classes the enumerator collapses.
///
/// Both rules are filters over the raw canonical enumeration: the cursor
/// never stops on a tree that violates an enabled rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneRules {
    /// Skip trees whose output is constant, checked both structurally (all
    /// leaves constant) and numerically (evaluated `min == max`).
    pub skip_constant: bool,
    /// For commutative binary atoms require `sL <= sR` over child serials,
    /// strengthened to `sL < sR` when the atom is also idempotent.
    pub skip_symmetric: bool,
}

impl PruneRules {
    pub const NONE: PruneRules = PruneRules {
        skip_constant: false,
        skip_symmetric: false,
    };

    pub const ALL: PruneRules = PruneRules {
        skip_constant: true,
        skip_symmetric: true,
    };
}

impl Default for PruneRules {
    fn default() -> Self {
        PruneRules::ALL
    }
}

/// Cursor over the canonical enumeration of expression trees.
///
/// The initial state is the first leaf (serial 0); [`advance`] moves the
/// cursor in place to its successor. Serial numbers of successive yielded
/// trees are strictly increasing, and the sequence is fully determined by the
/// atom library, the depth bound, and the pruning rules.
///
/// [`advance`]: Enumerator::advance
#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator<T> {
    cursor: FuncNode<T>,
    rules: PruneRules,
}

impl<T: Value> Enumerator<T> {
    pub fn new(rules: PruneRules) -> Self {
        Enumerator {
            cursor: FuncNode::new(),
            rules,
        }
    }

    /// Resume from a previously saved cursor position.
    pub fn with_cursor(cursor: FuncNode<T>, rules: PruneRules) -> Self {
        Enumerator { cursor, rules }
    }

    pub fn rules(&self) -> PruneRules {
        self.rules
    }

    pub fn cursor(&self) -> &FuncNode<T> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut FuncNode<T> {
        &mut self.cursor
    }

    /// Advance the cursor to the next admissible tree of depth
    /// `<= max_depth`. Returns `false` once the enumeration is exhausted;
    /// the cursor then still holds the last tree it visited.
    pub fn advance(&mut self, atoms: &AtomLibrary<T>, max_depth: usize) -> bool {
        loop {
            if !self.cursor.iterate_raw(atoms, &self.rules, max_depth, 0) {
                return false;
            }
            if self.admissible(atoms) {
                return true;
            }
        }
    }

    fn admissible(&mut self, atoms: &AtomLibrary<T>) -> bool {
        if self.rules.skip_symmetric && !symmetry_canonical(&self.cursor, atoms) {
            return false;
        }
        if self.rules.skip_constant {
            if self.cursor.is_constant(atoms) {
                return false;
            }
            self.cursor.evaluate(atoms, false);
            if let Some((lo, hi)) = self.cursor.extremes() {
                if lo == hi {
                    return false;
                }
            }
        }
        true
    }
}

/// Check the symmetry canon on every binary node of the tree.
fn symmetry_canonical<T: Value>(node: &FuncNode<T>, atoms: &AtomLibrary<T>) -> bool {
    match node.arity() {
        Arity::Nullary => true,
        Arity::Unary => symmetry_canonical(node.arg1().expect("unary node missing argument"), atoms),
        Arity::Binary => {
            let left = node.arg1().expect("binary node missing argument 1");
            let right = node.arg2().expect("binary node missing argument 2");
            let atom = atoms.binary(node.atom().num);
            if atom.commutative() {
                let sl = left.serial_number(atoms);
                let sr = right.serial_number(atoms);
                let ordered = if atom.idempotent() { sl < sr } else { sl <= sr };
                if !ordered {
                    return false;
                }
            }
            symmetry_canonical(left, atoms) && symmetry_canonical(right, atoms)
        }
    }
}

impl<T: Value> FuncNode<T> {
    /// Rebuild this node as the minimal canonical tree of exact depth
    /// `depth`: a chain of first-unary-atom nodes ending in the first leaf.
    /// In a library with no unary atoms the chain degenerates to binary
    /// nodes; returns `false` if the requested depth does not exist at all.
    pub fn init_depth(&mut self, atoms: &AtomLibrary<T>, depth: usize) -> bool {
        self.init_at(atoms, depth, 0)
    }

    fn init_at(&mut self, atoms: &AtomLibrary<T>, target: usize, current: usize) -> bool {
        debug_assert!(current <= target);
        self.clear_cached_self();
        self.arg2 = None;
        if current == target {
            self.atom = AtomRef::nullary(0);
            self.arg1 = None;
            return true;
        }
        if atoms.unary_len() > 0 {
            self.atom = AtomRef::unary(0);
            let mut child = FuncNode::new();
            if !child.init_at(atoms, target, current + 1) {
                return false;
            }
            self.arg1 = Some(Box::new(child));
            true
        } else if atoms.binary_len() > 0 {
            self.atom = AtomRef::binary(0);
            self.arg1 = Some(Box::new(FuncNode::new()));
            let mut right = FuncNode::new();
            if !right.init_at(atoms, target, current + 1) {
                return false;
            }
            self.arg2 = Some(Box::new(right));
            true
        } else {
            false
        }
    }

    /// One raw successor step at this node.
    ///
    /// `max_depth` is the absolute depth this subtree may grow to (the
    /// caller's depth budget); `current_depth` is the node's distance from
    /// the enumeration root. Children are advanced with the budget
    /// `local_max = current_depth + depth_max()`, which confines them to the
    /// current depth class; only once every shape of that class is spent
    /// does the node re-initialize one class higher.
    pub(crate) fn iterate_raw(
        &mut self,
        atoms: &AtomLibrary<T>,
        rules: &PruneRules,
        max_depth: usize,
        current_depth: usize,
    ) -> bool {
        let next_depth = current_depth + 1;
        let local_max = current_depth + self.depth_max();

        let advanced = match self.arity() {
            Arity::Nullary => self.step_leaf(atoms),
            Arity::Unary => self.step_unary(atoms, rules, local_max, next_depth),
            Arity::Binary => self.step_binary(atoms, rules, local_max, next_depth),
        };
        if advanced {
            self.clear_cached_self();
            return true;
        }

        // The current depth class is exhausted; open the next one if the
        // budget allows.
        if local_max < max_depth && self.init_at(atoms, local_max + 1, current_depth) {
            return true;
        }
        false
    }

    fn step_leaf(&mut self, atoms: &AtomLibrary<T>) -> bool {
        if self.atom.num + 1 < atoms.nullary_len() {
            self.atom.num += 1;
            true
        } else {
            false
        }
    }

    fn step_unary(
        &mut self,
        atoms: &AtomLibrary<T>,
        rules: &PruneRules,
        local_max: usize,
        next_depth: usize,
    ) -> bool {
        let child = self.arg1.as_mut().expect("unary node missing argument");
        let mut child_advanced = child.iterate_raw(atoms, rules, local_max, next_depth);
        if rules.skip_constant
            && child_advanced
            && child.arity() == Arity::Nullary
            && child.is_constant(atoms)
        {
            // Constants close out the arity-0 bucket, so the rest of this
            // run is constant as well.
            child_advanced = false;
        }
        if child_advanced {
            return true;
        }

        if self.atom.num + 1 < atoms.unary_len() {
            self.atom.num += 1;
            return self
                .arg1
                .as_mut()
                .expect("unary node missing argument")
                .init_at(atoms, local_max, next_depth);
        }

        if atoms.binary_len() > 0 {
            self.atom = AtomRef::binary(0);
            self.arg1 = Some(Box::new(FuncNode::new()));
            let mut right = FuncNode::new();
            if !right.init_at(atoms, local_max, next_depth) {
                return false;
            }
            self.arg2 = Some(Box::new(right));
            return true;
        }
        false
    }

    fn step_binary(
        &mut self,
        atoms: &AtomLibrary<T>,
        rules: &PruneRules,
        local_max: usize,
        next_depth: usize,
    ) -> bool {
        let arg1 = self.arg1.as_mut().expect("binary node missing argument 1");
        let arg2 = self.arg2.as_mut().expect("binary node missing argument 2");

        let mut left_advanced = arg1.iterate_raw(atoms, rules, local_max, next_depth);
        if rules.skip_constant
            && left_advanced
            && arg1.arity() == Arity::Nullary
            && arg1.is_constant(atoms)
            && arg2.arity() == Arity::Nullary
            && arg2.is_constant(atoms)
        {
            left_advanced = false;
        }
        if rules.skip_symmetric && left_advanced {
            let atom = atoms.binary(self.atom.num);
            if atom.commutative() {
                // Left serials only grow: once the canon is violated the
                // whole remaining left run is, so hand control to the right.
                let sl = arg1.serial_number(atoms);
                let sr = arg2.serial_number(atoms);
                let violated = if atom.idempotent() { sl >= sr } else { sl > sr };
                if violated {
                    left_advanced = false;
                }
            }
        }
        if left_advanced {
            return true;
        }

        if arg2.iterate_raw(atoms, rules, local_max, next_depth) {
            **arg1 = FuncNode::new();
            return true;
        }

        if self.atom.num + 1 < atoms.binary_len() {
            self.atom.num += 1;
            **arg1 = FuncNode::new();
            return arg2.init_at(atoms, local_max, next_depth);
        }
        false
    }
}
