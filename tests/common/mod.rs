use bcasm::isa::{Flow, OperandKind, OperationList, Registry, Signature, Slots};

pub const JMP: u64 = 4;
pub const PUSH_INT: u64 = 5;
pub const PUSH_STR: u64 = 6;
pub const PRINT: u64 = 7;
pub const STORE: u64 = 9;

fn op_any(_: &Slots) -> Flow {
    Flow::Continue
}

fn sig(kinds: &[OperandKind]) -> Signature {
    Signature::from_kinds(kinds).unwrap()
}

/// The built-in operations plus a handful of overloaded ones, leaving opcode 8 unused.
pub fn operations() -> OperationList {
    let mut registry = Registry::with_builtins();
    registry
        .register(JMP, "JMP", op_any, sig(&[OperandKind::Address]))
        .unwrap();
    registry
        .register(PUSH_INT, "PUSH", op_any, sig(&[OperandKind::IntLiteral]))
        .unwrap();
    registry
        .register(PUSH_STR, "PUSH", op_any, sig(&[OperandKind::StringLiteral]))
        .unwrap();
    registry
        .register(PRINT, "PRINT", op_any, sig(&[OperandKind::StringLiteral]))
        .unwrap();
    registry
        .register(
            STORE,
            "STORE",
            op_any,
            sig(&[
                OperandKind::Identifier,
                OperandKind::FloatLiteral,
                OperandKind::BoolLiteral,
            ]),
        )
        .unwrap();
    registry.build().unwrap()
}
