use super::types::{Mnemonic, Opcode, Signature, Slots};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

pub const NOOP_OPCODE: Opcode = 0;

/// The operation list is laid out densely by opcode, so opcodes are kept small.
pub const MAX_OPCODE: Opcode = 0xFFFF;

/// What a handler asks of whichever machine is driving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Pause,
    Stop,
    Exit,
}

pub type Handler = fn(&Slots) -> Flow;

#[derive(Clone, Copy)]
pub struct Operation {
    pub opcode: Opcode,
    pub mnemonic: Mnemonic,
    pub handler: Handler,
    pub signature: Signature,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("opcode", &self.opcode)
            .field("mnemonic", &self.mnemonic)
            .field("signature", &self.signature)
            .finish()
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06X} {} {}", self.opcode, self.mnemonic, self.signature)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    DuplicateOpcode { opcode: Opcode, existing: String },
    MnemonicTooLong(String),
    OpcodeTooLarge(Opcode),
    MissingNoOp,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateOpcode { opcode, existing } => write!(
                f,
                "Operation code {} already in use by {}",
                opcode, existing
            ),
            Error::MnemonicTooLong(name) => write!(
                f,
                "Mnemonic '{}' is longer than {} bytes",
                name,
                super::types::MNEMONIC_CAPACITY
            ),
            Error::OpcodeTooLarge(opcode) => write!(
                f,
                "Operation code {} is above the maximum of {}",
                opcode, MAX_OPCODE
            ),
            Error::MissingNoOp => write!(
                f,
                "No operation registered at opcode {}, which must hold the no-op",
                NOOP_OPCODE
            ),
        }
    }
}

/*
    The host machine's table of operations, keyed by opcode. Opcodes are unique; the
    compiler never sees this directly, only the `OperationList` built from it.
*/
#[derive(Debug, Default)]
pub struct Registry {
    operations: BTreeMap<Opcode, Operation>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register(
        &mut self,
        opcode: Opcode,
        mnemonic: &str,
        handler: Handler,
        signature: Signature,
    ) -> Result<(), Error> {
        if opcode > MAX_OPCODE {
            return Err(Error::OpcodeTooLarge(opcode));
        }

        if let Some(existing) = self.operations.get(&opcode) {
            warn!(
                "Operation code {} already in use by {}.",
                opcode, existing.mnemonic
            );
            return Err(Error::DuplicateOpcode {
                opcode,
                existing: existing.mnemonic.to_string(),
            });
        }

        let mnemonic =
            Mnemonic::new(mnemonic).ok_or_else(|| Error::MnemonicTooLong(mnemonic.to_owned()))?;

        self.operations.insert(
            opcode,
            Operation {
                opcode,
                mnemonic,
                handler,
                signature,
            },
        );
        debug!("Operation {} registered ({}).", opcode, mnemonic);

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Lay the registered operations out by opcode, filling every unregistered
    /// opcode below the maximum with the no-op.
    pub fn build(&self) -> Result<OperationList, Error> {
        debug!("Building operations list...");

        let noop = *self
            .operations
            .get(&NOOP_OPCODE)
            .ok_or(Error::MissingNoOp)?;

        // Nonempty, since the no-op is present.
        let max_opcode = self.operations.keys().next_back().copied().unwrap_or(0);
        debug!("Maximum operation code used: {}", max_opcode);

        let operations = (0..=max_opcode)
            .map(|opcode| *self.operations.get(&opcode).unwrap_or(&noop))
            .collect::<Vec<_>>();

        debug!(
            "Operations list built. Operations supported: {}.",
            operations.len()
        );
        Ok(OperationList { operations })
    }
}

/// The registry flattened into opcode order. Index `i` holds the operation
/// dispatched for opcode `i`.
#[derive(Debug, Clone)]
pub struct OperationList {
    operations: Vec<Operation>,
}

impl OperationList {
    pub fn get(&self, opcode: Opcode) -> Option<&Operation> {
        self.operations.get(opcode as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The first operation (in opcode order) with this mnemonic whose signature is
    /// exactly `signature`.
    pub fn resolve(&self, mnemonic: &str, signature: &Signature) -> Option<&Operation> {
        self.operations
            .iter()
            .filter(|op| op.mnemonic == *mnemonic)
            .find(|op| op.signature == *signature)
    }

    pub fn contains_mnemonic(&self, mnemonic: &str) -> bool {
        self.operations.iter().any(|op| op.mnemonic == *mnemonic)
    }
}
