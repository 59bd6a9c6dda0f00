use super::types::{Loc, Located};
use log::{debug, info};
use std::fmt::{self, Display};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LoadError {
    path: PathBuf,
    source: io::Error,
}

impl LoadError {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not read the file \"{}\": {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

// Each kind of token carries at most one payload, whose type is fixed by the kind.
// The end of the input is not a token; `Tokenizer::next_token()` returns `None` there.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    Label(String),
    Address(i64),
    IntLiteral(i64),
    BoolLiteral(bool),
    FloatLiteral(f64),
    StringLiteral(String),
    ArgumentSeparator,
    NewLine,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Label(name) => write!(f, "!{}", name),
            Token::Address(addr) => write!(f, "@{}", addr),
            Token::IntLiteral(i) => write!(f, "{}", i),
            Token::BoolLiteral(b) => write!(f, "{}", b),
            Token::FloatLiteral(x) => write!(f, "{:?}", x),
            Token::StringLiteral(s) => write!(f, "\"{}\"", s),
            Token::ArgumentSeparator => write!(f, ","),
            Token::NewLine => write!(f, "new line"),
        }
    }
}

const STRING_CHAR: u8 = b'"';
const ADDRESS_CHAR: u8 = b'@';
const LABEL_CHAR: u8 = b'!';
const ESCAPE_CHAR: u8 = b'\\';
const SEPARATOR_CHAR: u8 = b',';
const SPACE_CHAR: u8 = b' ';

fn is_line_end(c: u8) -> bool {
    c == b'\r' || c == b'\n'
}

fn is_int(raw: &[u8]) -> bool {
    let digits = raw.strip_prefix(b"-").unwrap_or(raw);
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

fn is_float(raw: &[u8]) -> bool {
    let digits = raw.strip_prefix(b"-").unwrap_or(raw);
    digits.iter().filter(|c| **c == b'.').count() == 1
        && digits.iter().any(u8::is_ascii_digit)
        && digits.iter().all(|c| c.is_ascii_digit() || *c == b'.')
}

#[derive(Debug, PartialEq, Eq)]
enum RawToken {
    Value(Vec<u8>),
    Separator,
    LineEnd,
}

impl Token {
    fn from_raw(raw: RawToken) -> Self {
        match raw {
            RawToken::Separator => Token::ArgumentSeparator,
            RawToken::LineEnd => Token::NewLine,
            RawToken::Value(value) => Token::classify(value),
        }
    }

    fn classify(raw: Vec<u8>) -> Self {
        let text = String::from_utf8_lossy(&raw).into_owned();

        match raw.first() {
            Some(&STRING_CHAR) => return Token::StringLiteral(text[1..].to_owned()),
            Some(&LABEL_CHAR) => return Token::Label(text[1..].to_owned()),
            Some(&ADDRESS_CHAR) => {
                if is_int(&raw[1..]) {
                    if let Ok(addr) = text[1..].parse() {
                        return Token::Address(addr);
                    }
                }
            }
            _ => (),
        }

        // Anything which fails to parse (e.g. an out of range integer) is just a name.
        match text.as_str() {
            "true" => Token::BoolLiteral(true),
            "false" => Token::BoolLiteral(false),
            _ if is_int(&raw) => text
                .parse()
                .map(Token::IntLiteral)
                .unwrap_or(Token::Identifier(text)),
            _ if is_float(&raw) => text
                .parse()
                .map(Token::FloatLiteral)
                .unwrap_or(Token::Identifier(text)),
            _ => Token::Identifier(text),
        }
    }

    pub fn is_line_end(&self) -> bool {
        *self == Token::NewLine
    }
}

/*
    Reads tokens from a source buffer one at a time. Only the cursor and the line counter
    are kept between calls, so `reset()` rewinds to the start for another pass without
    touching the buffer.
*/
#[derive(Debug, Clone)]
pub struct Tokenizer {
    source: Vec<u8>,
    cursor: usize,
    line: usize,
}

impl Tokenizer {
    pub fn new(source: impl Into<Vec<u8>>) -> Self {
        Tokenizer {
            source: source.into(),
            cursor: 0,
            line: 1,
        }
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read(path).map_err(|source| LoadError {
            path: path.to_owned(),
            source,
        })?;

        info!("File \"{}\" loaded.", path.display());
        Ok(Tokenizer::new(source))
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.line = 1;
    }

    pub fn line(&self) -> usize {
        self.line
    }

    fn peek_byte(&self) -> Option<u8> {
        self.source.get(self.cursor).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let c = self.peek_byte()?;
        self.cursor += 1;
        Some(c)
    }

    fn skip_blank(&mut self) {
        while let Some(c) = self.peek_byte() {
            if c > SPACE_CHAR || is_line_end(c) {
                break;
            }
            self.cursor += 1;
        }
    }

    fn next_raw(&mut self) -> Option<RawToken> {
        self.skip_blank();

        let mut value = Vec::new();
        let mut in_string = false;

        while let Some(c) = self.next_byte() {
            if c == STRING_CHAR {
                if in_string {
                    break;
                }

                // The opening quote stays, to mark the value as a string literal.
                value.push(c);
                in_string = true;
                continue;
            }

            if c == ESCAPE_CHAR {
                if let Some(escaped) = self.next_byte() {
                    value.push(escaped);
                    continue;
                }
            }

            if !in_string {
                if c == SPACE_CHAR {
                    break;
                }

                if c == SEPARATOR_CHAR {
                    if value.is_empty() {
                        return Some(RawToken::Separator);
                    }

                    // Leave the separator to be read as a token of its own.
                    self.cursor -= 1;
                    break;
                }

                if is_line_end(c) {
                    if !value.is_empty() {
                        self.cursor -= 1;
                        break;
                    }

                    if c == b'\r' && self.peek_byte() == Some(b'\n') {
                        self.cursor += 1;
                    }
                    return Some(RawToken::LineEnd);
                }
            }

            value.push(c);
        }

        if value.is_empty() {
            None
        } else {
            Some(RawToken::Value(value))
        }
    }

    pub fn next_token(&mut self) -> Option<Located<Token>> {
        let loc = Loc::new(self.line);
        let raw = self.next_raw()?;

        if raw == RawToken::LineEnd {
            self.line += 1;
        }

        let token = Token::from_raw(raw);
        debug!("TOKEN: {:?}", token);
        Some(Located::with_loc(loc, token))
    }

    /// Consume tokens up to and including the next line end.
    pub fn skip_line(&mut self) {
        while let Some(tk) = self.next_token() {
            if tk.as_value().is_line_end() {
                break;
            }
        }
    }
}

impl Iterator for Tokenizer {
    type Item = Located<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::Located;
    use super::{RawToken, Token, Tokenizer};

    fn tokens(src: &str) -> Vec<Token> {
        Tokenizer::new(src).map(Located::value).collect()
    }

    fn lines(src: &str) -> Vec<usize> {
        Tokenizer::new(src)
            .map(|tk| tk.line().unwrap())
            .collect()
    }

    fn id(s: &str) -> Token {
        Token::Identifier(s.to_owned())
    }

    #[test]
    fn raw_simple() {
        let mut tz = Tokenizer::new("MOV a,b");
        assert_eq!(tz.next_raw(), Some(RawToken::Value(b"MOV".to_vec())));
        assert_eq!(tz.next_raw(), Some(RawToken::Value(b"a".to_vec())));
        assert_eq!(tz.next_raw(), Some(RawToken::Separator));
        assert_eq!(tz.next_raw(), Some(RawToken::Value(b"b".to_vec())));
        assert_eq!(tz.next_raw(), None);
        assert_eq!(tz.next_raw(), None);
    }

    #[test]
    fn raw_string_keeps_opening_quote() {
        let mut tz = Tokenizer::new("\"a, b\" ");
        assert_eq!(tz.next_raw(), Some(RawToken::Value(b"\"a, b".to_vec())));
        assert_eq!(tz.next_raw(), None);
    }

    #[test]
    fn raw_trailing_blanks() {
        let mut tz = Tokenizer::new("NOP \t ");
        assert_eq!(tz.next_raw(), Some(RawToken::Value(b"NOP".to_vec())));
        assert_eq!(tz.next_raw(), None);
    }

    #[test]
    fn nothing() {
        assert_eq!(tokens(""), vec![]);
        assert_eq!(tokens("   \t"), vec![]);
    }

    #[test]
    fn statement() {
        assert_eq!(
            tokens("PUSH 1, -2.5, true\n"),
            vec![
                id("PUSH"),
                Token::IntLiteral(1),
                Token::ArgumentSeparator,
                Token::FloatLiteral(-2.5),
                Token::ArgumentSeparator,
                Token::BoolLiteral(true),
                Token::NewLine,
            ]
        );
    }

    #[test]
    fn sigils() {
        assert_eq!(
            tokens("JMP !loop @12 \"str\" name"),
            vec![
                id("JMP"),
                Token::Label(String::from("loop")),
                Token::Address(12),
                Token::StringLiteral(String::from("str")),
                id("name"),
            ]
        );
    }

    #[test]
    fn classification_edges() {
        assert_eq!(
            tokens("- . -0 1.2.3 12a True @x @-3 99999999999999999999"),
            vec![
                id("-"),
                id("."),
                Token::IntLiteral(0),
                id("1.2.3"),
                id("12a"),
                id("True"),
                id("@x"),
                Token::Address(-3),
                id("99999999999999999999"),
            ]
        );
        assert_eq!(
            tokens(".5 -3. !"),
            vec![
                Token::FloatLiteral(0.5),
                Token::FloatLiteral(-3.0),
                Token::Label(String::new()),
            ]
        );
    }

    #[test]
    fn separator_without_spaces() {
        assert_eq!(
            tokens("a,,b"),
            vec![
                id("a"),
                Token::ArgumentSeparator,
                Token::ArgumentSeparator,
                id("b"),
            ]
        );
    }

    #[test]
    fn string_with_spaces_and_escapes() {
        assert_eq!(
            tokens(r#"PRINT "say \"hi\", ok" "#),
            vec![
                id("PRINT"),
                Token::StringLiteral(String::from("say \"hi\", ok")),
            ]
        );
        assert_eq!(tokens(r"a\ b"), vec![id("a b")]);
        assert_eq!(tokens("\"\""), vec![Token::StringLiteral(String::new())]);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(
            tokens("\"abc\ndef"),
            vec![Token::StringLiteral(String::from("abc\ndef"))]
        );
    }

    #[test]
    fn line_endings() {
        assert_eq!(
            tokens("A\r\nB\rC\n\nD"),
            vec![
                id("A"),
                Token::NewLine,
                id("B"),
                Token::NewLine,
                id("C"),
                Token::NewLine,
                Token::NewLine,
                id("D"),
            ]
        );
        assert_eq!(lines("A\r\nB\rC\n\nD"), vec![1, 1, 2, 2, 3, 3, 4, 5]);
    }

    #[test]
    fn reset_is_deterministic() {
        let src = "!start\nPUSH 1, \"x\"\r\nJMP !start\n";
        let mut tz = Tokenizer::new(src);
        let first = tz.by_ref().collect::<Vec<_>>();
        assert_eq!(tz.next_token(), None);

        tz.reset();
        assert_eq!(tz.line(), 1);
        let second = tz.by_ref().collect::<Vec<_>>();
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn skip_line() {
        let mut tz = Tokenizer::new("A b, c\nD");
        tz.next_token();
        tz.skip_line();
        assert_eq!(tz.next_token().map(Located::value), Some(id("D")));
        assert_eq!(tz.line(), 2);
    }

    #[test]
    fn display() {
        let rendered = tokens("x !l @3 \"s\" 4 1.5 false ,\n")
            .iter()
            .map(Token::to_string)
            .collect::<Vec<_>>();
        assert_eq!(
            rendered,
            vec!["x", "!l", "@3", "\"s\"", "4", "1.5", "false", ",", "new line"]
        );
    }
}
