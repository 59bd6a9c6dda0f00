use crate::isa::{OperationList, Registry};
use once_cell::sync::Lazy;

pub const DEFAULT_SOURCE_EXT: &str = "basm";
pub const DEFAULT_BINARY_EXT: &str = "bcp";

pub static DEMO_SRC: &str = include_str!("assets/demo.basm");

static BUILTIN_OPERATIONS: Lazy<OperationList> = Lazy::new(build_builtin_operations);

fn build_builtin_operations() -> OperationList {
    Registry::with_builtins()
        .build()
        .expect("Could not build the built-in operation list")
}

/// The operations every machine provides, which is all the command-line tools know about.
pub fn builtin_operations() -> &'static OperationList {
    Lazy::force(&BUILTIN_OPERATIONS)
}
