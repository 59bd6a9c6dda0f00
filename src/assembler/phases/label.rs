use super::tokenize::{Token, Tokenizer};
use super::types::Located;
use log::debug;
use std::collections::HashMap;
use std::fmt::{self, Display};

#[derive(Debug, PartialEq)]
pub enum Error {
    Redeclared(String),
    NotFollowedByNewLine(Token),
    ExpectedOperationOrLabel(Token),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Redeclared(name) => write!(f, "label !{} redeclared", name),
            Error::NotFollowedByNewLine(tk) => write!(
                f,
                "a label declaration must be followed by a new line, but \"{}\" was found",
                tk
            ),
            Error::ExpectedOperationOrLabel(tk) => write!(
                f,
                "operation identifier or label expected, but \"{}\" was found",
                tk
            ),
        }
    }
}

/// Label names mapped to the 1-based index of the operation they precede, plus
/// the total number of operations in the source.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: HashMap<String, i64>,
    operation_count: i64,
}

impl LabelTable {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.labels.get(name).copied()
    }

    pub fn operation_count(&self) -> i64 {
        self.operation_count
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn declare(&mut self, name: String) -> Result<(), Error> {
        if self.labels.contains_key(&name) {
            return Err(Error::Redeclared(name));
        }

        debug!("Label !{} at operation {}.", name, self.operation_count + 1);
        self.labels.insert(name, self.operation_count + 1);
        Ok(())
    }
}

pub fn collect(tokens: &mut Tokenizer) -> Result<LabelTable, Located<Error>> {
    debug!("Doing first pass...");
    tokens.reset();

    let mut table = LabelTable::default();
    while let Some(tk) = tokens.next_token() {
        match tk.as_value() {
            Token::Identifier(_) => {
                table.operation_count += 1;
                tokens.skip_line();
            }
            Token::Label(name) => {
                table
                    .declare(name.clone())
                    .map_err(|err| tk.transfer(err))?;

                match tokens.next_token() {
                    None => (),
                    Some(next) if next.as_value().is_line_end() => (),
                    Some(next) => return Err(next.map(Error::NotFollowedByNewLine)),
                }
            }
            Token::NewLine => (),
            _ => return Err(tk.map(Error::ExpectedOperationOrLabel)),
        }
    }

    Ok(table)
}
