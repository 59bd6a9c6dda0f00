use super::registry::{Error, Flow, Registry, NOOP_OPCODE};
use super::types::{Opcode, Signature, Slots};

pub const EXIT_OPCODE: Opcode = 1;
pub const PAUSE_OPCODE: Opcode = 2;
pub const STOP_OPCODE: Opcode = 3;

pub fn op_noop(_: &Slots) -> Flow {
    Flow::Continue
}

pub fn op_exit(_: &Slots) -> Flow {
    Flow::Exit
}

pub fn op_pause(_: &Slots) -> Flow {
    Flow::Pause
}

pub fn op_stop(_: &Slots) -> Flow {
    Flow::Stop
}

/// The operations every host machine starts from.
pub fn register(registry: &mut Registry) -> Result<(), Error> {
    registry.register(NOOP_OPCODE, "NOP", op_noop, Signature::EMPTY)?;
    registry.register(EXIT_OPCODE, "EXIT", op_exit, Signature::EMPTY)?;
    registry.register(PAUSE_OPCODE, "PAUSE", op_pause, Signature::EMPTY)?;
    registry.register(STOP_OPCODE, "STOP", op_stop, Signature::EMPTY)?;
    Ok(())
}

impl Registry {
    pub fn with_builtins() -> Self {
        let mut registry = Registry::new();
        // Fresh registry, and the builtin opcodes and names are distinct and short.
        register(&mut registry).expect("builtin operations failed to register");
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_layout() {
        let ops = Registry::with_builtins().build().unwrap();
        assert_eq!(ops.len(), 4);

        let names = ops.iter().map(|op| op.mnemonic.to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["NOP", "EXIT", "PAUSE", "STOP"]);

        let slots = [0; 4];
        assert_eq!((ops.get(NOOP_OPCODE).unwrap().handler)(&slots), Flow::Continue);
        assert_eq!((ops.get(EXIT_OPCODE).unwrap().handler)(&slots), Flow::Exit);
        assert_eq!((ops.get(PAUSE_OPCODE).unwrap().handler)(&slots), Flow::Pause);
        assert_eq!((ops.get(STOP_OPCODE).unwrap().handler)(&slots), Flow::Stop);
    }

    #[test]
    fn builtins_cannot_be_replaced() {
        let mut registry = Registry::with_builtins();
        assert!(registry
            .register(STOP_OPCODE, "HALT", op_stop, Signature::EMPTY)
            .is_err());
    }
}
