use crate::isa::{Opcode, OperandKind, Operation, OperationList, Slot};
use crate::program::{Instruction, Program};
use std::fmt::{self, Display};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    InvalidOpcode(usize, Opcode),
    MissingString(usize, u64),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidOpcode(at, raw) => {
                write!(f, "Invalid Opcode at @{}: {:#06X}", at, raw)
            }
            Error::MissingString(at, index) => write!(
                f,
                "Instruction at @{} refers to string {}, which is not in the string table",
                at, index
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A single decoded operand, rendered back the way it would be written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Address(Slot),
    Identifier(String),
    Int(Slot),
    Bool(bool),
    Float(f64),
    Str(String),
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Address(addr) => write!(f, "@{}", addr),
            Operand::Identifier(name) => write!(f, "{}", name),
            Operand::Int(i) => write!(f, "{}", i),
            Operand::Bool(b) => write!(f, "{}", b),
            Operand::Float(x) => fmt_float(f, *x),
            Operand::Str(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
        }
    }
}

// Plain positional notation with at least one fractional digit, which is the only shape
// the tokenizer reads back as a float. `Display` for `f64` never uses an exponent.
fn fmt_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let text = x.to_string();
    if x.is_finite() && !text.contains('.') {
        write!(f, "{}.0", text)
    } else {
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone)]
pub struct DisassembledInstruction<'a> {
    pub inst: Instruction,
    pub op: &'a Operation,
    pub operands: Vec<Operand>,
}

impl<'a> Display for DisassembledInstruction<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op.mnemonic)?;
        for (i, operand) in self.operands.iter().enumerate() {
            write!(f, "{}{}", if i == 0 { " " } else { ", " }, operand)?;
        }
        Ok(())
    }
}

fn decode_operand(
    program: &Program,
    at: usize,
    kind: OperandKind,
    slot: Slot,
) -> Result<Option<Operand>, Error> {
    let string = |index: Slot| {
        program
            .string(index as u64)
            .map(|bs| String::from_utf8_lossy(bs).into_owned())
            .ok_or(Error::MissingString(at, index as u64))
    };

    Ok(Some(match kind {
        OperandKind::None => return Ok(None),
        OperandKind::Address => Operand::Address(slot),
        OperandKind::Identifier => Operand::Identifier(string(slot)?),
        OperandKind::IntLiteral => Operand::Int(slot),
        OperandKind::BoolLiteral => Operand::Bool(slot != 0),
        OperandKind::FloatLiteral => Operand::Float(f64::from_bits(slot as u64)),
        OperandKind::StringLiteral => Operand::Str(string(slot)?),
    }))
}

pub fn disassemble_instruction<'a>(
    program: &Program,
    operations: &'a OperationList,
    at: usize,
    inst: Instruction,
) -> Result<DisassembledInstruction<'a>, Error> {
    let op = operations
        .get(inst.opcode)
        .ok_or(Error::InvalidOpcode(at, inst.opcode))?;

    let mut operands = Vec::with_capacity(op.signature.arity());
    for (kind, slot) in op.signature.kinds().iter().zip(inst.slots.iter()) {
        if let Some(operand) = decode_operand(program, at, *kind, *slot)? {
            operands.push(operand);
        }
    }

    Ok(DisassembledInstruction { inst, op, operands })
}

/// Statically disassemble every instruction of `program`, using the signatures in
/// `operations` to decide how each slot is to be read.
pub fn disassemble<'a>(
    program: &Program,
    operations: &'a OperationList,
) -> Result<Vec<DisassembledInstruction<'a>>, Error> {
    program
        .instructions()
        .enumerate()
        .map(|(at, inst)| disassemble_instruction(program, operations, at, inst))
        .collect()
}
