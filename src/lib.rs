pub mod assets;

pub mod isa;
pub mod program;

pub mod assembler;

pub mod cli;
