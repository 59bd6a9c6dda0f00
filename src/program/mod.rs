mod arena;
mod header;

pub use arena::Arena;
pub use header::{Header, HEADER_SIZE};

use crate::isa::{Opcode, Slots, OPERAND_SLOTS};
use derive_more::Constructor;
use log::{debug, info};
use static_assertions::const_assert_eq;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use strum_macros::Display;

/*
    On-disk layout of a program (all integers little-endian):

        [ header: 32 bytes ][ code ][ data ][ string index ]

    The header holds the signature, the format version, and the byte length of each of
    the three segments which follow it.

    Code is a run of fixed-size instruction records, `[ opcode, slot0, slot1, slot2, slot3 ]`,
    each field 8 bytes. A slot holds an integer or boolean directly, the bit pattern of a
    float, an operation index, or (for identifiers and strings) a 1-based index into the
    string index.

    Data is the concatenated bytes of every distinct string, and the string index is a run
    of `[ start, length ]` records (8 bytes each) locating each string inside data.
*/

pub const SIGNATURE: &[u8; 4] = b"BCVM";
pub const FORMAT_VERSION: i32 = 1;
pub const BLOCK_SIZE: usize = 8192;

pub const INSTRUCTION_SIZE: usize = 8 * (1 + OPERAND_SLOTS);
pub const STRING_RECORD_SIZE: usize = 16;

const_assert_eq!(INSTRUCTION_SIZE, 40);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Segment {
    Header,
    Code,
    Data,
    Strings,
}

#[derive(Debug)]
pub enum Error {
    Io {
        path: Option<PathBuf>,
        source: io::Error,
    },
    BadSignature,
    BadVersion(i32),
    Truncated(Segment),
    Malformed(Segment, u64),
    Allocation(Segment, usize),
    ReadOnly,
}

impl Error {
    fn io(source: io::Error) -> Self {
        Error::Io { path: None, source }
    }

    fn at(self, file: &Path) -> Self {
        match self {
            Error::Io { path: None, source } => Error::Io {
                path: Some(file.to_owned()),
                source,
            },
            err => err,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io {
                path: Some(path),
                source,
            } => write!(f, "I/O error on \"{}\": {}", path.display(), source),
            Error::Io { path: None, source } => write!(f, "I/O error: {}", source),
            Error::BadSignature => write!(f, "The program signature is invalid"),
            Error::BadVersion(version) => write!(
                f,
                "Unsupported program version {} (expected {})",
                version, FORMAT_VERSION
            ),
            Error::Truncated(seg) => write!(f, "Program file truncated in {} segment", seg),
            Error::Malformed(seg, len) => {
                write!(f, "Program {} segment has invalid length {}", seg, len)
            }
            Error::Allocation(seg, bytes) => write!(
                f,
                "Could not allocate {} bytes for the program {} segment",
                bytes, seg
            ),
            Error::ReadOnly => write!(f, "Cannot emit into a loaded program"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// An operand payload, as handed to `Program::emit()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Float(f64),
    Str(String),
}

pub type Operands = [Option<Value>; OPERAND_SLOTS];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct Instruction {
    pub opcode: Opcode,
    pub slots: Slots,
}

impl Instruction {
    fn encode_into(&self, out: &mut [u8]) {
        out[0..8].copy_from_slice(&self.opcode.to_le_bytes());
        for (chunk, slot) in out[8..].chunks_exact_mut(8).zip(self.slots.iter()) {
            chunk.copy_from_slice(&slot.to_le_bytes());
        }
    }

    fn decode(raw: &[u8]) -> Self {
        let mut fields = raw.chunks_exact(8).map(|chunk| {
            let mut bs = [0; 8];
            bs.copy_from_slice(chunk);
            bs
        });

        let opcode = fields.next().map(u64::from_le_bytes).unwrap_or(0);
        let mut slots = [0; OPERAND_SLOTS];
        for (slot, bs) in slots.iter_mut().zip(fields) {
            *slot = i64::from_le_bytes(bs);
        }

        Instruction { opcode, slots }
    }
}

pub struct Program {
    code: Arena,
    data: Arena,
    strings: Arena,

    // Only consulted while emitting, never persisted.
    string_index: HashMap<String, u64>,
    writable: bool,
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("code", &self.code.len())
            .field("data", &self.data.len())
            .field("strings", &self.strings.len())
            .field("writable", &self.writable)
            .finish()
    }
}

fn segment_len(seg: Segment, len: u64, record: usize) -> Result<usize, Error> {
    let len_usize = usize::try_from(len).map_err(|_| Error::Malformed(seg, len))?;
    if len_usize % record != 0 {
        return Err(Error::Malformed(seg, len));
    }
    Ok(len_usize)
}

fn read_exact(r: &mut impl Read, buf: &mut [u8], seg: Segment) -> Result<(), Error> {
    r.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated(seg),
        _ => Error::io(err),
    })
}

/// Read `len` bytes into `arena`, growing it only as they actually arrive. The capacity
/// ends up at the first block boundary past `len`.
fn read_segment(r: &mut impl Read, arena: &mut Arena, len: usize) -> Result<(), Error> {
    let seg = arena.segment();
    let mut remaining = len;
    while remaining > 0 {
        let chunk = remaining.min(BLOCK_SIZE);
        arena.reserve(chunk)?;
        read_exact(r, arena.fill(chunk), seg)?;
        remaining -= chunk;
    }
    arena.reserve(1)
}

impl Program {
    fn empty(writable: bool) -> Result<Self, Error> {
        Ok(Program {
            code: Arena::new(Segment::Code)?,
            data: Arena::new(Segment::Data)?,
            strings: Arena::new(Segment::Strings)?,
            string_index: HashMap::new(),
            writable,
        })
    }

    pub fn new() -> Result<Self, Error> {
        let program = Program::empty(true)?;
        debug!("New program created.");
        Ok(program)
    }

    /// Discard everything and start again with an empty, writable program.
    pub fn reset(&mut self) -> Result<(), Error> {
        *self = Program::new()?;
        Ok(())
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn emit(&mut self, opcode: Opcode, operands: &Operands) -> Result<(), Error> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }

        debug!("Emit {}:", opcode);

        // Reserved before any string is interned.
        self.code.reserve(INSTRUCTION_SIZE)?;

        let mut slots = [0; OPERAND_SLOTS];
        for (idx, (slot, operand)) in slots.iter_mut().zip(operands.iter()).enumerate() {
            *slot = match operand {
                None => 0,
                Some(Value::Int(i)) => *i,
                Some(Value::Bool(b)) => *b as i64,
                Some(Value::Float(x)) => x.to_bits() as i64,
                Some(Value::Str(s)) => self.intern(s)? as i64,
            };
            debug!("  P{} = {}", idx, slot);
        }

        Instruction::new(opcode, slots).encode_into(self.code.fill(INSTRUCTION_SIZE));
        Ok(())
    }

    /// The 1-based string index entry for `s`, adding it if this is its first use.
    fn intern(&mut self, s: &str) -> Result<u64, Error> {
        if let Some(index) = self.string_index.get(s) {
            return Ok(*index);
        }

        self.data.reserve(s.len())?;
        self.strings.reserve(STRING_RECORD_SIZE)?;

        let start = self.data.push(s.as_bytes())?;
        let mut record = [0; STRING_RECORD_SIZE];
        record[..8].copy_from_slice(&(start as u64).to_le_bytes());
        record[8..].copy_from_slice(&(s.len() as u64).to_le_bytes());
        self.strings.push(&record)?;

        let index = (self.strings.len() / STRING_RECORD_SIZE) as u64;
        self.string_index.insert(s.to_owned(), index);
        Ok(index)
    }

    pub fn code(&self) -> &[u8] {
        self.code.as_slice()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn strings(&self) -> &[u8] {
        self.strings.as_slice()
    }

    pub fn instruction_count(&self) -> usize {
        self.code.len() / INSTRUCTION_SIZE
    }

    pub fn string_count(&self) -> usize {
        self.strings.len() / STRING_RECORD_SIZE
    }

    pub fn instructions(&self) -> impl Iterator<Item = Instruction> + '_ {
        self.code().chunks_exact(INSTRUCTION_SIZE).map(Instruction::decode)
    }

    /// Look up a (1-based) string index entry. Entries pointing outside the data
    /// segment are treated as absent.
    pub fn string(&self, index: u64) -> Option<&[u8]> {
        let at = usize::try_from(index.checked_sub(1)?)
            .ok()?
            .checked_mul(STRING_RECORD_SIZE)?;
        let record = self.strings().get(at..at.checked_add(STRING_RECORD_SIZE)?)?;

        let field = |off: usize| {
            let mut bs = [0; 8];
            bs.copy_from_slice(&record[off..off + 8]);
            usize::try_from(u64::from_le_bytes(bs)).ok()
        };
        let start = field(0)?;
        let len = field(8)?;
        self.data().get(start..start.checked_add(len)?)
    }

    pub fn write_to(&self, mut w: impl Write) -> Result<(), Error> {
        let header = Header::new(
            self.code.len() as u64,
            self.data.len() as u64,
            self.strings.len() as u64,
        );

        w.write_all(&header.encode()).map_err(Error::io)?;
        for arena in [&self.code, &self.data, &self.strings].iter() {
            w.write_all(arena.as_slice()).map_err(Error::io)?;
        }
        w.flush().map_err(Error::io)
    }

    /// Read a whole program. The result is read-only.
    pub fn read_from(mut r: impl Read) -> Result<Self, Error> {
        let mut raw = [0; HEADER_SIZE];
        read_exact(&mut r, &mut raw, Segment::Header)?;
        let header = Header::decode(&raw)?;

        debug!(
            "Program blocks sizes: {}, {}, {}",
            header.code_len, header.data_len, header.strings_len
        );

        let code_len = segment_len(Segment::Code, header.code_len, INSTRUCTION_SIZE)?;
        let data_len = segment_len(Segment::Data, header.data_len, 1)?;
        let strings_len = segment_len(Segment::Strings, header.strings_len, STRING_RECORD_SIZE)?;

        // Lengths come straight from the file, so nothing is allocated up front for them.
        let mut program = Program::empty(false)?;
        read_segment(&mut r, &mut program.code, code_len)?;
        read_segment(&mut r, &mut program.data, data_len)?;
        read_segment(&mut r, &mut program.strings, strings_len)?;
        Ok(program)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path).map_err(|err| Error::io(err).at(path))?;
        self.write_to(BufWriter::new(file))
            .map_err(|err| err.at(path))?;

        info!("Program saved to \"{}\"", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|err| Error::io(err).at(path))?;
        let program = Program::read_from(BufReader::new(file)).map_err(|err| err.at(path))?;

        info!("Program loaded from \"{}\"", path.display());
        Ok(program)
    }
}
