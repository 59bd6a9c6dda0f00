use super::{emit, label, tokenize};
use crate::program;
use derive_more::Constructor;
use std::fmt::{self, Display};

/*
    Phases:

        1.  Tokenization: The source bytes are cut into tokens on spaces, commas and line
            endings. Each token is classified on its own (by its leading sigil, or by
            whether it reads as a literal) and tagged with the line it was found on.
            Nothing can fail here, except reading the file in the first place.

        2.  Labeling: A first walk over the tokens counts the operations (statements
            beginning with an identifier) and records, for every `!label` statement, the
            1-based index of the operation following it. This is what lets labels be
            referenced before they are defined.

        3.  Emission: A second walk re-tokenizes the source from the start. Each operation
            statement has its operands classified (labels are replaced by the index found
            in the previous phase, and `@N` addresses are range-checked), and the resulting
            operand-kind signature is matched exactly against every same-named operation
            of the host machine. The first match is emitted into the `Program`.

    The first error in any phase aborts the whole compilation.
*/

#[derive(Debug, PartialEq, Clone, Copy, Eq, Constructor)]
pub struct Loc {
    line: usize,
}

impl Loc {
    pub fn line(&self) -> usize {
        self.line
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Located<T: Sized> {
    loc: Option<Loc>,
    val: T,
}

impl Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(line: {})", self.line)
    }
}

impl<T: Display> Display for Located<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.loc {
            None => write!(f, "@<unknown location>: {}", self.val),
            Some(loc) => write!(f, "@{}: {}", loc, self.val),
        }
    }
}

impl<T> Located<T> {
    fn new(loc: Option<Loc>, val: T) -> Self {
        Located { loc, val }
    }

    pub fn with_loc(loc: Loc, val: T) -> Self {
        Located::new(Some(loc), val)
    }

    pub fn at_line(line: usize, val: T) -> Self {
        Located::with_loc(Loc::new(line), val)
    }

    pub fn loc(&self) -> Option<Loc> {
        self.loc
    }

    pub fn line(&self) -> Option<usize> {
        self.loc.map(|loc| loc.line)
    }

    pub fn value(self) -> T {
        self.val
    }

    pub fn as_value(&self) -> &T {
        &self.val
    }

    pub fn map<S, F>(self, f: F) -> Located<S>
    where
        F: FnOnce(T) -> S,
    {
        Located::new(self.loc, f(self.val))
    }

    pub fn transfer<S>(&self, s: S) -> Located<S> {
        Located::new(self.loc, s)
    }
}

impl<T> From<T> for Located<T> {
    fn from(val: T) -> Self {
        Located { loc: None, val }
    }
}

#[derive(Debug)]
pub enum Error {
    Load(tokenize::LoadError),
    Label(Located<label::Error>),
    Emit(Located<emit::Error>),
    Program(program::Error),
    NotCompiled,
}

impl From<tokenize::LoadError> for Error {
    fn from(err: tokenize::LoadError) -> Self {
        Error::Load(err)
    }
}

impl From<Located<label::Error>> for Error {
    fn from(err: Located<label::Error>) -> Self {
        Error::Label(err)
    }
}

impl From<Located<emit::Error>> for Error {
    fn from(err: Located<emit::Error>) -> Self {
        Error::Emit(err)
    }
}

impl From<program::Error> for Error {
    fn from(err: program::Error) -> Self {
        Error::Program(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Assembly Error (in ")?;
        match self {
            Error::Load(_) => write!(f, "Loader"),
            Error::Label(_) => write!(f, "Labeler"),
            Error::Emit(_) => write!(f, "Emitter"),
            Error::Program(_) | Error::NotCompiled => write!(f, "Program"),
        }?;
        write!(f, "): ")?;
        match self {
            Error::Load(err) => write!(f, "{}", err),
            Error::Label(err) => write!(f, "{}", err),
            Error::Emit(err) => write!(f, "{}", err),
            Error::Program(err) => write!(f, "{}", err),
            Error::NotCompiled => write!(f, "no successfully compiled program to save"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Load(err) => Some(err),
            Error::Program(err) => Some(err),
            _ => None,
        }
    }
}
