use std::{
    collections::HashMap,
    io::{self, Write},
};

use lazy_static::lazy_static;
use log::{debug, trace};

use super::{
    ast::{ASTNode, Expression, Function, Prototype},
    lexer::{LexError, Lexer, Token, TokenSource},
};

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("expected expression, found `{0}`")]
    ExpectedExpression(Token),
    #[error("expected ')', found `{0}`")]
    ExpectedCloseParen(Token),
    #[error("expected ')' or ',' in argument list, found `{0}`")]
    ExpectedArgumentSeparator(Token),
    #[error("expected function name in prototype, found `{0}`")]
    ExpectedFunctionName(Token),
    #[error("expected '(' in prototype, found `{0}`")]
    ExpectedPrototypeOpen(Token),
    #[error("expected ')' in prototype, found `{0}`")]
    ExpectedPrototypeClose(Token),
    #[error("duplicate parameter `{1}` in prototype of `{0}`")]
    DuplicateParameter(String, String),
    #[error("expression nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error(transparent)]
    Lex(#[from] LexError),
}

pub type PartialParseResult = Result<Expression, ParseError>;
pub type UnitResult = Result<ASTNode, ParseError>;

lazy_static! {
    /// Binary operators and their precedence; higher binds tighter.
    pub static ref BINOP_PRECEDENCE: HashMap<char, u32> = {
        let mut map = HashMap::new();
        map.insert('<', 10);
        map.insert('+', 20);
        map.insert('-', 20);
        map.insert('*', 40);
        map.insert('/', 40);
        map
    };
}

pub const PROMPT: &str = "kaleidoscope> ";

/// Deepest chain of parenthesised expressions and call arguments accepted.
pub const MAX_NESTING: usize = 256;

/// Recursive descent parser holding one token of lookahead.
pub struct Parser<S> {
    source: S,
    current: Token,
    depth: usize,
}

impl<S: TokenSource> Parser<S> {
    pub fn new(mut source: S) -> Self {
        let current = source.next_token();
        Self {
            source,
            current,
            depth: 0,
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Overwrite the current token with the next one from the source.
    fn advance(&mut self) {
        self.current = self.source.next_token();
    }

    fn current_precedence(&self) -> Option<u32> {
        match self.current {
            Token::Char(c) => BINOP_PRECEDENCE.get(&c).copied(),
            _ => None,
        }
    }

    fn parse_number(&mut self, value: f64) -> PartialParseResult {
        self.advance();
        Ok(Expression::Number(value))
    }

    /// Run `parse` one nesting level deeper, failing past `MAX_NESTING`.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_nested(&mut self) -> PartialParseResult {
        self.advance();
        let inner = self.nested(Self::parse_expr)?;
        if !self.current.is_char(')') {
            return Err(ParseError::ExpectedCloseParen(self.current.clone()));
        }
        self.advance();
        Ok(inner)
    }

    fn parse_identifier(&mut self, name: String) -> PartialParseResult {
        self.advance();
        if !self.current.is_char('(') {
            return Ok(Expression::Variable(name));
        }
        self.advance();

        let mut args = Vec::new();
        if !self.current.is_char(')') {
            loop {
                args.push(self.nested(Self::parse_expr)?);

                if self.current.is_char(')') {
                    break;
                }
                if !self.current.is_char(',') {
                    return Err(ParseError::ExpectedArgumentSeparator(
                        self.current.clone(),
                    ));
                }
                self.advance();
            }
        }
        self.advance();

        Ok(Expression::Call(name, args))
    }

    fn parse_primary(&mut self) -> PartialParseResult {
        trace!("parse_primary: current token = {:?}", self.current);
        match self.current {
            Token::Number(value) => self.parse_number(value),
            Token::Identifier(ref name) => {
                let name = name.clone();
                self.parse_identifier(name)
            }
            Token::Char('(') => self.parse_nested(),
            Token::Invalid(ref err) => Err(err.clone().into()),
            _ => Err(ParseError::ExpectedExpression(self.current.clone())),
        }
    }

    fn parse_rhs(&mut self, expr_precedence: u32, lhs: Expression) -> PartialParseResult {
        let mut result = lhs;

        loop {
            let (operator, precedence) = match (&self.current, self.current_precedence()) {
                (&Token::Char(op), Some(pr)) if pr >= expr_precedence => (op, pr),
                _ => return Ok(result),
            };
            self.advance();

            let mut rhs = self.parse_primary()?;

            if let Some(next_precedence) = self.current_precedence() {
                if precedence < next_precedence {
                    rhs = self.parse_rhs(precedence + 1, rhs)?;
                }
            }

            result = Expression::binary(operator, result, rhs);
        }
    }

    pub fn parse_expr(&mut self) -> PartialParseResult {
        let lhs = self.parse_primary()?;
        self.parse_rhs(0, lhs)
    }

    pub fn parse_prototype(&mut self) -> Result<Prototype, ParseError> {
        trace!("parse_prototype: current token = {:?}", self.current);
        let name = match self.current {
            Token::Identifier(ref name) => name.clone(),
            _ => return Err(ParseError::ExpectedFunctionName(self.current.clone())),
        };
        self.advance();

        if !self.current.is_char('(') {
            return Err(ParseError::ExpectedPrototypeOpen(self.current.clone()));
        }

        let mut args: Vec<String> = Vec::new();
        loop {
            self.advance();
            let arg = match self.current {
                Token::Identifier(ref arg) => arg.clone(),
                _ => break,
            };
            if args.contains(&arg) {
                return Err(ParseError::DuplicateParameter(name, arg));
            }
            args.push(arg);
        }

        if !self.current.is_char(')') {
            return Err(ParseError::ExpectedPrototypeClose(self.current.clone()));
        }
        self.advance();

        Ok(Prototype::new(name, args))
    }

    pub fn parse_definition(&mut self) -> Result<Function, ParseError> {
        self.advance();
        let prototype = self.parse_prototype()?;
        let body = self.parse_expr()?;
        Ok(Function { prototype, body })
    }

    pub fn parse_extern(&mut self) -> Result<Prototype, ParseError> {
        self.advance();
        self.parse_prototype()
    }

    pub fn parse_top_level_expr(&mut self) -> Result<Function, ParseError> {
        let body = self.parse_expr()?;
        Ok(Function::anonymous(body))
    }

    fn at_unit_boundary(&self) -> bool {
        matches!(
            self.current,
            Token::Eof | Token::Def | Token::Extern | Token::Char(';')
        )
    }

    /// Skip the remainder of a failed unit, stopping before the next `;`,
    /// `def`, `extern` or end of input.
    fn synchronize(&mut self) {
        while !self.at_unit_boundary() {
            debug!("skipping `{}` after parse error", self.current);
            self.advance();
        }
    }

    /// Parse the next top-level unit, skipping `;` separators.
    ///
    /// Returns `None` once the input is exhausted. On error the parser has
    /// already moved to the next unit boundary, so calling again resumes with
    /// the following unit.
    pub fn parse_unit(&mut self) -> Option<UnitResult> {
        loop {
            trace!("parse_unit: current token = {:?}", self.current);
            let unit = match self.current {
                Token::Eof => return None,
                Token::Char(';') => {
                    self.advance();
                    continue;
                }
                Token::Def => self.parse_definition().map(ASTNode::Function),
                Token::Extern => self.parse_extern().map(ASTNode::Extern),
                _ => self.parse_top_level_expr().map(ASTNode::Function),
            };

            if let Err(ref err) = unit {
                debug!("parse error: {}", err);
                self.synchronize();
            }
            return Some(unit);
        }
    }

    /// Drive the parser over the whole input, handing every unit (or its
    /// error) to `sink`. In interactive mode a prompt is written to stderr
    /// after each unit while input remains.
    pub fn run<F>(&mut self, interactive: bool, sink: F) -> io::Result<()>
    where
        F: FnMut(UnitResult),
    {
        if interactive {
            self.run_with_prompt(Some(&mut io::stderr()), sink)
        } else {
            self.run_with_prompt(None::<&mut io::Stderr>, sink)
        }
    }

    /// `run` with the prompt written to `prompt` instead of stderr.
    pub fn run_with_prompt<W, F>(
        &mut self,
        mut prompt: Option<&mut W>,
        mut sink: F,
    ) -> io::Result<()>
    where
        W: Write,
        F: FnMut(UnitResult),
    {
        while let Some(unit) = self.parse_unit() {
            sink(unit);
            if let Some(out) = prompt.as_mut() {
                if self.current != Token::Eof {
                    write!(out, "{}", PROMPT)?;
                    out.flush()?;
                }
            }
        }
        Ok(())
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: TokenSource> Iterator for Parser<S> {
    type Item = UnitResult;

    fn next(&mut self) -> Option<UnitResult> {
        self.parse_unit()
    }
}

/// Parse every unit of `input`, failing on the first error.
pub fn parse_str(input: &str) -> Result<Vec<ASTNode>, ParseError> {
    Parser::new(Lexer::new(input)).collect()
}
