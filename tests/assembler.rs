mod common;

use bcasm::assembler::{
    self,
    phases::{emit, label, types::Located},
    Compiler, Error,
};
use bcasm::isa::{OperandKind, Signature};
use bcasm::{assets, program::Program};
use common::*;

fn compile(src: &str) -> Result<Program, Error> {
    assembler::compile(src, &operations())
}

#[test]
fn forward_label_resolves_to_following_operation() {
    let program = compile("JMP !end\nNOP\n!end\nSTOP").unwrap();
    let insts = program.instructions().collect::<Vec<_>>();
    assert_eq!(insts.len(), 3);
    assert_eq!(insts[0].opcode, JMP);
    assert_eq!(insts[0].slots, [3, 0, 0, 0]);
    assert_eq!(insts[2].opcode, 3);
}

#[test]
fn redeclared_label_reported_at_second_declaration() {
    match compile("!a\nNOP\n\n!a\nNOP").unwrap_err() {
        Error::Label(err) => assert_eq!(
            err,
            Located::at_line(4, label::Error::Redeclared(String::from("a")))
        ),
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn address_must_name_an_operation() {
    assert!(compile("JMP @2\nNOP\nNOP").is_ok());
    match compile("JMP @3\nNOP\nNOP").unwrap_err() {
        Error::Emit(err) => {
            assert_eq!(err.line(), Some(1));
            assert!(matches!(
                err.value(),
                emit::Error::AddressOutOfRange(3, 3)
            ));
        }
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn strings_are_deduplicated_across_kinds() {
    let program = compile("PUSH \"x\"\nSTORE x, 1.5, true\nPRINT \"x\"\nPRINT \"y\"").unwrap();
    assert_eq!(program.string_count(), 2);
    assert_eq!(program.data(), b"xy");

    let first_slots = program
        .instructions()
        .map(|inst| inst.slots[0])
        .collect::<Vec<_>>();
    assert_eq!(first_slots, vec![1, 1, 1, 2]);
}

#[test]
fn overloads_pick_exact_signature() {
    let program = compile("PUSH 12\nPUSH \"12\"").unwrap();
    let opcodes = program.instructions().map(|inst| inst.opcode).collect::<Vec<_>>();
    assert_eq!(opcodes, vec![PUSH_INT, PUSH_STR]);

    match compile("PUSH 1.5").unwrap_err() {
        Error::Emit(err) => assert!(matches!(
            err.value(),
            emit::Error::NoMatchingOperation(name, sig)
                if name == "PUSH" && sig == Signature::from_kinds(&[OperandKind::FloatLiteral]).unwrap()
        )),
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn fourth_operand_is_rejected() {
    match compile("NOP\nSTORE x, 1.5, true, 4").unwrap_err() {
        Error::Emit(err) => {
            assert_eq!(err.line(), Some(2));
            assert!(matches!(err.value(), emit::Error::TooManyOperands(_)));
        }
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn error_message_names_phase_and_line() {
    let err = compile("NOP\nJMP !missing").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Assembly Error (in Emitter): @(line: 2): label !missing not found"
    );
}

#[test]
fn crlf_sources_count_lines_once() {
    let err = compile("NOP\r\nNOP\r\nBOGUS\r\n").unwrap_err();
    match err {
        Error::Emit(err) => assert_eq!(err.line(), Some(3)),
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn failed_compile_is_never_saved() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.bcp");

    let mut compiler = Compiler::new("NOP\nPUSH true").unwrap();
    assert!(compiler.compile(&operations()).is_err());
    assert!(matches!(compiler.save(&out), Err(Error::NotCompiled)));
    assert!(!out.exists());
}

#[test]
fn load_compile_save() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("demo.basm");
    let out = dir.path().join("demo.bcp");
    std::fs::write(&src, assets::DEMO_SRC).unwrap();

    let mut compiler = Compiler::load(&src).unwrap();
    compiler.compile(assets::builtin_operations()).unwrap();
    compiler.save(&out).unwrap();

    let loaded = Program::load(&out).unwrap();
    assert_eq!(loaded.code(), compiler.program().unwrap().code());
}

#[test]
fn missing_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Compiler::load(&dir.path().join("nowhere.basm")).unwrap_err();
    assert!(matches!(err, Error::Load(_)));
}
