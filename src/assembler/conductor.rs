use super::phases::{self, types::Error, Tokenizer};
use crate::isa::OperationList;
use crate::program::Program;
use log::info;
use std::path::Path;

/*
    Owns a loaded source and the program compiled from it. A program is only handed out
    (or saved) after a compilation has run to completion; a failed compilation may have
    left some instructions in the buffer, and those must never be persisted.
*/
#[derive(Debug)]
pub struct Compiler {
    tokens: Tokenizer,
    program: Program,
    compiled: bool,
}

impl Compiler {
    fn with_tokenizer(tokens: Tokenizer) -> Result<Self, Error> {
        Ok(Compiler {
            tokens,
            program: Program::new()?,
            compiled: false,
        })
    }

    pub fn new(source: impl Into<Vec<u8>>) -> Result<Self, Error> {
        Compiler::with_tokenizer(Tokenizer::new(source))
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        Compiler::with_tokenizer(Tokenizer::load(path)?)
    }

    pub fn compile(&mut self, operations: &OperationList) -> Result<(), Error> {
        self.compiled = false;
        self.program.reset()?;

        let labels = phases::collect_labels(&mut self.tokens)?;
        phases::emit(&mut self.tokens, &labels, operations, &mut self.program)?;

        self.compiled = true;
        info!("Program compiled successfully.");
        Ok(())
    }

    pub fn program(&self) -> Option<&Program> {
        if self.compiled {
            Some(&self.program)
        } else {
            None
        }
    }

    pub fn into_program(self) -> Result<Program, Error> {
        if self.compiled {
            Ok(self.program)
        } else {
            Err(Error::NotCompiled)
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        self.program()
            .ok_or(Error::NotCompiled)?
            .save(path)
            .map_err(Error::from)
    }
}

pub fn compile(source: impl Into<Vec<u8>>, operations: &OperationList) -> Result<Program, Error> {
    let mut compiler = Compiler::new(source)?;
    compiler.compile(operations)?;
    compiler.into_program()
}
