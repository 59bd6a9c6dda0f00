pub mod disasm;
pub mod phases;

mod conductor;

pub use conductor::{compile, Compiler};
pub use phases::types::Error;
