use itertools::Itertools;
use static_assertions::const_assert;
use std::fmt::{self, Display};
use strum_macros::{Display, EnumIter};

pub type Opcode = u64;

/// The raw contents of one operand slot of an encoded instruction.
pub type Slot = i64;

pub const OPERAND_SLOTS: usize = 4;

pub type Slots = [Slot; OPERAND_SLOTS];

/*
    The kinds of operand an operation can declare in its signature. These are exactly the
    classifications the compiler can make of an operand token, after labels have been
    folded into `Address`.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum OperandKind {
    None,
    Address,
    Identifier,
    IntLiteral,
    BoolLiteral,
    FloatLiteral,
    StringLiteral,
}

impl Default for OperandKind {
    fn default() -> Self {
        OperandKind::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature([OperandKind; OPERAND_SLOTS]);

impl Signature {
    pub const EMPTY: Signature = Signature([OperandKind::None; OPERAND_SLOTS]);

    pub const fn new(kinds: [OperandKind; OPERAND_SLOTS]) -> Self {
        Signature(kinds)
    }

    /// Builds a signature from up to `OPERAND_SLOTS` kinds, padding the tail with
    /// `OperandKind::None`. Returns `None` if too many kinds were supplied.
    pub fn from_kinds(kinds: &[OperandKind]) -> Option<Self> {
        if kinds.len() > OPERAND_SLOTS {
            return None;
        }

        let mut sig = Signature::EMPTY;
        sig.0[..kinds.len()].copy_from_slice(kinds);
        Some(sig)
    }

    pub fn kinds(&self) -> &[OperandKind; OPERAND_SLOTS] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0
            .iter()
            .take_while(|kind| **kind != OperandKind::None)
            .count()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

pub const MNEMONIC_CAPACITY: usize = 8;

const_assert!(MNEMONIC_CAPACITY <= u8::MAX as usize);

// A short operation name stored inline, so that `Operation`s stay `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mnemonic {
    raw: [u8; MNEMONIC_CAPACITY],
    len: u8,
}

impl Mnemonic {
    pub fn new(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() > MNEMONIC_CAPACITY {
            return None;
        }

        let mut raw = [0; MNEMONIC_CAPACITY];
        raw[..bytes.len()].copy_from_slice(bytes);
        Some(Mnemonic {
            raw,
            len: bytes.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        // Always a whole `&str` copied in by `new()`.
        std::str::from_utf8(&self.raw[..self.len as usize]).unwrap_or_default()
    }
}

impl PartialEq<str> for Mnemonic {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mnemonic({:?})", self.as_str())
    }
}
