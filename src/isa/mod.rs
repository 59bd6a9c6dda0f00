pub mod builtin;
pub mod registry;
pub mod types;

pub use registry::{Error, Flow, Handler, Operation, OperationList, Registry, MAX_OPCODE};
pub use types::{Mnemonic, OperandKind, Opcode, Signature, Slot, Slots, OPERAND_SLOTS};
