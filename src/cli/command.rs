use super::config::Config;
use crate::assembler::{disasm, Compiler};
use crate::assets;
use crate::program::Program;
use ansi_term::Colour::Red;
use anyhow::anyhow;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[cfg(windows)]
pub fn terminal_init() {
    ansi_term::enable_ansi_support().expect("Could enable terminal ANSI support");
}

#[cfg(not(windows))]
pub fn terminal_init() {}

#[derive(StructOpt, Debug)]
#[structopt(name = "bcasm")]
pub enum CommandRoot {
    Asm(SubcommandAsm),
    Dis(SubcommandDis),
}

#[derive(StructOpt, Debug)]
struct LogOpts {
    /// Log more (-v for progress, -vv for every token and opcode)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

#[derive(StructOpt, Debug)]
#[structopt(name = "basm")]
pub struct SubcommandAsm {
    #[structopt(flatten)]
    log_opts: LogOpts,

    #[structopt(name = "in.basm", parse(from_os_str))]
    in_src: PathBuf,

    #[structopt(name = "out.bcp", parse(from_os_str))]
    out_bin: Option<PathBuf>,
}

#[derive(StructOpt, Debug)]
#[structopt(name = "bdis")]
pub struct SubcommandDis {
    #[structopt(flatten)]
    log_opts: LogOpts,

    #[structopt(name = "prog.bcp", parse(from_os_str))]
    in_prog: PathBuf,
}

pub fn default_output_path(in_src: &Path) -> Result<PathBuf, anyhow::Error> {
    let stem = in_src
        .file_stem()
        .ok_or_else(|| anyhow!("\"{}\" does not name a file", in_src.display()))?;
    Ok(PathBuf::from(stem).with_extension(assets::DEFAULT_BINARY_EXT))
}

pub fn assemble_path(in_src: &Path, out_bin: &Path) -> Result<(), anyhow::Error> {
    let mut compiler = Compiler::load(in_src)?;
    compiler.compile(assets::builtin_operations())?;
    compiler.save(out_bin)?;
    Ok(())
}

pub fn disassemble_path(in_prog: &Path) -> Result<Vec<String>, anyhow::Error> {
    let program = Program::load(in_prog)?;
    let listing = disasm::disassemble(&program, assets::builtin_operations())?;

    Ok(listing
        .iter()
        .enumerate()
        .map(|(at, inst)| format!("@{:<6}{}", at, inst))
        .collect())
}

fn exit_with(result: Result<(), anyhow::Error>) -> ! {
    match result {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("{}", Red.paint(err.to_string()));
            std::process::exit(1);
        }
    }
}

pub fn root(cmd: CommandRoot) -> ! {
    match cmd {
        CommandRoot::Asm(scmd) => asm_as("bcasm", scmd),
        CommandRoot::Dis(scmd) => dis_as("bcasm", scmd),
    };
}

pub fn asm(cmd: SubcommandAsm) -> ! {
    asm_as("basm", cmd)
}

pub fn dis(cmd: SubcommandDis) -> ! {
    dis_as("bdis", cmd)
}

fn asm_as(name: &'static str, cmd: SubcommandAsm) -> ! {
    Config::new(name, cmd.log_opts.verbose).init_logging();

    exit_with(run_asm(cmd))
}

fn run_asm(cmd: SubcommandAsm) -> Result<(), anyhow::Error> {
    let out_bin = match cmd.out_bin {
        Some(out_bin) => out_bin,
        None => default_output_path(&cmd.in_src)?,
    };
    assemble_path(&cmd.in_src, &out_bin)
}

fn dis_as(name: &'static str, cmd: SubcommandDis) -> ! {
    Config::new(name, cmd.log_opts.verbose).init_logging();

    exit_with(disassemble_path(&cmd.in_prog).map(|listing| {
        for line in listing {
            println!("{}", line);
        }
    }))
}
