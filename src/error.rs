use num_bigint::BigUint;

/// Errors produced when restoring persisted state or inverting serial
/// numbers. Violated structural invariants (a missing child, an out-of-range
/// direct index) are programming errors and panic instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The state string is not valid JSON or does not match the layout.
    #[error("malformed state: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A persisted node declares an arity outside `{0, 1, 2}`.
    #[error("arity {arity} is out of range")]
    BadArity { arity: u64 },
    /// A persisted node references an atom the library does not have.
    #[error("no atom with arity {arity} and index {num}")]
    UnknownAtom { arity: u8, num: u64 },
    /// A persisted node of arity >= 1 lacks a required child.
    #[error("arity-{arity} node is missing argument {slot}")]
    MissingChild { arity: u8, slot: u8 },
    /// The serial number lies beyond the enumerable space of the library.
    #[error("serial number {sn} exceeds the enumerable tree space")]
    SerialOutOfRange { sn: BigUint },
}

pub type Result<T> = std::result::Result<T, Error>;
