use super::label::LabelTable;
use super::tokenize::{Token, Tokenizer};
use super::types::Located;
use crate::isa::{OperandKind, OperationList, Signature, OPERAND_SLOTS};
use crate::program::{self, Operands, Program, Value};
use log::debug;
use std::fmt::{self, Display};

/// An instruction names at most this many operands; the last slot is never filled
/// from source.
pub const MAX_OPERANDS: usize = OPERAND_SLOTS - 1;

#[derive(Debug)]
pub enum Error {
    LabelNotFound(String),
    AddressOutOfRange(i64, i64),
    TooManyOperands(String),
    UnexpectedSeparator,
    UnexpectedToken(Token),
    ExpectedSeparator(Token),
    NoMatchingOperation(String, Signature),
    Program(program::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LabelNotFound(name) => write!(f, "label !{} not found", name),
            Error::AddressOutOfRange(addr, count) => write!(
                f,
                "address @{} out of range (program has {} operations)",
                addr, count
            ),
            Error::TooManyOperands(mnemonic) => write!(
                f,
                "too many parameters for {} (at most {})",
                mnemonic, MAX_OPERANDS
            ),
            Error::UnexpectedSeparator => {
                write!(f, "parameter expected, but parameter separator found")
            }
            Error::UnexpectedToken(tk) => write!(f, "unexpected token \"{}\"", tk),
            Error::ExpectedSeparator(tk) => write!(
                f,
                "parameter separator or new line expected, but \"{}\" was found",
                tk
            ),
            Error::NoMatchingOperation(mnemonic, sig) => write!(
                f,
                "unknown operation ({}) or could not find one that matches the parameters {}",
                mnemonic, sig
            ),
            Error::Program(err) => write!(f, "{}", err),
        }
    }
}

struct Statement {
    mnemonic: String,
    kinds: Vec<OperandKind>,
    operands: Operands,
}

impl Statement {
    fn new(mnemonic: String) -> Self {
        Statement {
            mnemonic,
            kinds: Vec::with_capacity(MAX_OPERANDS),
            operands: Default::default(),
        }
    }

    fn is_full(&self) -> bool {
        self.kinds.len() == MAX_OPERANDS
    }

    fn push(&mut self, kind: OperandKind, value: Value) {
        self.operands[self.kinds.len()] = Some(value);
        self.kinds.push(kind);
    }

    fn signature(&self) -> Signature {
        // At most `MAX_OPERANDS` kinds are ever pushed.
        Signature::from_kinds(&self.kinds).unwrap_or_default()
    }
}

fn classify(tk: Token, labels: &LabelTable) -> Result<(OperandKind, Value), Error> {
    Ok(match tk {
        Token::Identifier(name) => (OperandKind::Identifier, Value::Str(name)),
        Token::Label(name) => match labels.get(&name) {
            Some(index) => (OperandKind::Address, Value::Int(index)),
            None => return Err(Error::LabelNotFound(name)),
        },
        Token::Address(addr) => {
            if addr < 0 || addr >= labels.operation_count() {
                return Err(Error::AddressOutOfRange(addr, labels.operation_count()));
            }
            (OperandKind::Address, Value::Int(addr))
        }
        Token::IntLiteral(i) => (OperandKind::IntLiteral, Value::Int(i)),
        Token::BoolLiteral(b) => (OperandKind::BoolLiteral, Value::Bool(b)),
        Token::FloatLiteral(x) => (OperandKind::FloatLiteral, Value::Float(x)),
        Token::StringLiteral(s) => (OperandKind::StringLiteral, Value::Str(s)),
        Token::ArgumentSeparator => return Err(Error::UnexpectedSeparator),
        tk @ Token::NewLine => return Err(Error::UnexpectedToken(tk)),
    })
}

fn read_operands(
    mut stmt: Statement,
    tokens: &mut Tokenizer,
    labels: &LabelTable,
) -> Result<Statement, Error> {
    while let Some(tk) = tokens.next_token() {
        let tk = tk.value();
        if tk.is_line_end() {
            break;
        }

        // Checked before classification, so that a surplus operand is reported as
        // such whatever it is.
        if stmt.is_full() {
            return Err(Error::TooManyOperands(stmt.mnemonic));
        }

        let (kind, value) = classify(tk, labels)?;
        stmt.push(kind, value);

        match tokens.next_token().map(Located::value) {
            None | Some(Token::NewLine) => break,
            Some(Token::ArgumentSeparator) => (),
            Some(tk) => return Err(Error::ExpectedSeparator(tk)),
        }
    }

    Ok(stmt)
}

fn emit_statement(
    stmt: Statement,
    operations: &OperationList,
    program: &mut Program,
) -> Result<(), Error> {
    let sig = stmt.signature();
    debug!("Parameters: {}.", stmt.kinds.len());

    let op = operations
        .resolve(&stmt.mnemonic, &sig)
        .ok_or_else(|| Error::NoMatchingOperation(stmt.mnemonic.clone(), sig))?;

    debug!("Operation found with opcode {}.", op.opcode);
    program
        .emit(op.opcode, &stmt.operands)
        .map_err(Error::Program)
}

pub fn emit(
    tokens: &mut Tokenizer,
    labels: &LabelTable,
    operations: &OperationList,
    program: &mut Program,
) -> Result<(), Located<Error>> {
    debug!("Doing second pass...");
    tokens.reset();

    while let Some(tk) = tokens.next_token() {
        let line = tk.transfer(());
        match tk.value() {
            Token::Identifier(mnemonic) => {
                debug!("Compiling operation \"{}\"...", mnemonic);
                read_operands(Statement::new(mnemonic), tokens, labels)
                    .and_then(|stmt| emit_statement(stmt, operations, program))
                    .map_err(|err| line.transfer(err))?;
            }
            Token::NewLine => (),
            // Labels were dealt with in the first pass.
            _ => tokens.skip_line(),
        }
    }

    Ok(())
}
