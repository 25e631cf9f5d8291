use std::{collections::VecDeque, fmt, io, io::BufRead, iter::Fuse};

use lazy_static::lazy_static;
use log::{trace, warn};
use regex::{CaptureMatches, Regex};

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum LexError {
    #[error("number literal {0} is out of range")]
    NumberOutOfRange(String),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Identifier(String),
    Number(f64),
    Char(char),
    /// Text the scanner matched but could not turn into a token.
    Invalid(LexError),
}

impl Token {
    pub fn is_char(&self, c: char) -> bool {
        *self == Token::Char(c)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "EOF"),
            Token::Def => write!(f, "def"),
            Token::Extern => write!(f, "extern"),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Number(value) => write!(f, "{}", value),
            Token::Char(c) => write!(f, "{}", c),
            Token::Invalid(LexError::NumberOutOfRange(text)) => write!(f, "{}", text),
        }
    }
}

/// Anything the parser can pull tokens from.
pub trait TokenSource {
    /// Returns the next token, or `Token::Eof` once the input is exhausted.
    fn next_token(&mut self) -> Token;
}

impl<I: Iterator<Item = Token>> TokenSource for I {
    fn next_token(&mut self) -> Token {
        self.next().unwrap_or(Token::Eof)
    }
}

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(&[
        r"(?P<comment>#[^\n]*)",
        r"(?P<number>[0-9]+(?:\.[0-9]*)?)",
        r"(?P<ident>[A-Za-z]+)",
        r"(?P<char>\S)",
    ].join("|"))
    .unwrap();
}

/// Pull-based scanner over an in-memory source string.
pub struct Lexer<'a> {
    captures: Fuse<CaptureMatches<'static, 'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            captures: TOKEN_RE.captures_iter(input).fuse(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        for cap in &mut self.captures {
            let token = if cap.name("comment").is_some() {
                continue;
            } else if let Some(num) = cap.name("number") {
                match num.as_str().parse::<f64>() {
                    Ok(value) if value.is_finite() => Token::Number(value),
                    _ => {
                        warn!("number literal out of range: {}", num.as_str());
                        Token::Invalid(LexError::NumberOutOfRange(num.as_str().to_string()))
                    }
                }
            } else if let Some(ident) = cap.name("ident") {
                match ident.as_str() {
                    "def" => Token::Def,
                    "extern" => Token::Extern,
                    name => Token::Identifier(name.to_string()),
                }
            } else if let Some(c) = cap.name("char").and_then(|m| m.as_str().chars().next()) {
                Token::Char(c)
            } else {
                continue;
            };

            trace!("lexed {:?}", token);
            return Some(token);
        }

        None
    }
}

/// lex a whole string, without the trailing `Token::Eof`
pub fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

/// Scanner over a reader that lexes one line at a time, so an interactive
/// session never reads past the line holding the current token.
pub struct LineLexer<R> {
    reader: R,
    pending: VecDeque<Token>,
    finished: bool,
    error: Option<io::Error>,
}

impl<R: BufRead> LineLexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            finished: false,
            error: None,
        }
    }

    /// The read error that ended the stream, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<R: BufRead> Iterator for LineLexer<R> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => self.finished = true,
                Ok(_) => self.pending.extend(Lexer::new(&line)),
                Err(err) => {
                    warn!("input ended by read error: {}", err);
                    self.error = Some(err);
                    self.finished = true;
                }
            }
        }
    }
}

/// Shortest-form rendering with six significant digits, switching to
/// exponent notation outside `1e-4..1e6` (`1234567` is `1.23457e+06`).
pub fn general_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{:.5e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => return value.to_string(),
    };

    if exponent < -4 || exponent >= 6 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (5 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Render the token stream one token per line, ending with `EOF`.
pub fn dump_tokens<S: TokenSource>(source: &mut S) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        let token = source.next_token();
        lines.push(match token {
            Token::Number(value) => general_number(value),
            ref other => other.to_string(),
        });
        if token == Token::Eof {
            return lines;
        }
    }
}
