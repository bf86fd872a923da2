use super::lexer::{tokenize, LexError};
use super::literal::{coerce, Literal};
use super::tokens::{LogicOp, TKind, Token};
use super::tree::PredicateNode;
use super::validation;

use log::{debug, trace, warn};
use thiserror::Error;

use std::collections::HashSet;
use std::fmt;

/// Maximum number of nested parenthesised groups accepted by default.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Maximum height of a predicate tree accepted by default, a single
/// comparison being 1. Bounds the tree however its operands are grouped.
pub const DEFAULT_MAX_HEIGHT: usize = 256;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("querying on field `{field}` is not allowed")]
    FieldNotAllowed { field: String },
    #[error("groups nested deeper than {limit} levels at position {position}")]
    MaxDepthExceeded { position: usize, limit: usize },
    #[error("predicate tree higher than {limit} levels at position {position}")]
    MaxHeightExceeded { position: usize, limit: usize },
}

impl ParseError {
    /// Byte offset the error points at, if it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Lex(err) => Some(err.position),
            ParseError::Syntax(err) => Some(err.position),
            ParseError::FieldNotAllowed { .. } => None,
            ParseError::MaxDepthExceeded { position, .. } => Some(*position),
            ParseError::MaxHeightExceeded { position, .. } => Some(*position),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("expected {} but found {} at position {position}", expected_list(.expected), .found.describe())]
pub struct SyntaxError {
    pub position: usize,
    pub expected: Vec<Expected>,
    pub found: Token,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expected {
    Expression,
    Operator,
    Literal,
    Keyword,
    RParen,
    End,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Expected::Expression => "expression",
            Expected::Operator => "comparison operator",
            Expected::Literal => "value",
            Expected::Keyword => "AND/OR",
            Expected::RParen => "`)`",
            Expected::End => "end of input",
        };

        write!(f, "{}", name)
    }
}

fn expected_list(expected: &[Expected]) -> String {
    let names: Vec<String> = expected.iter().map(|e| e.to_string()).collect();
    match names.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => "nothing".to_string(),
    }
}

fn unexp_token(found: &Token, expected: Expected) -> ParseError {
    unexp_token_plural(found, vec![expected])
}

fn unexp_token_plural(found: &Token, expected: Vec<Expected>) -> ParseError {
    ParseError::Syntax(SyntaxError {
        position: found.get_pos(),
        expected,
        found: found.clone(),
    })
}

/// Parses `query` into a predicate tree, rejecting fields missing from
/// `allowed_fields` when it is given.
pub fn parse(query: &str, allowed_fields: Option<&HashSet<String>>) -> Result<PredicateNode, ParseError> {
    parse_with(query, allowed_fields, DEFAULT_MAX_DEPTH, DEFAULT_MAX_HEIGHT)
}

fn parse_with(
    query: &str,
    allowed_fields: Option<&HashSet<String>>,
    max_depth: usize,
    max_height: usize,
) -> Result<PredicateNode, ParseError> {
    debug!(
        "parsing query of {} bytes ({})",
        query.len(),
        match allowed_fields {
            Some(allowed) => format!("{} allowed fields", allowed.len()),
            None => "unrestricted".to_string(),
        },
    );

    let result = tokenize(query)
        .map_err(ParseError::from)
        .and_then(|tokens| {
            trace!("tokens: {:?}", tokens);

            let mut parser = Parser {
                tokens: &tokens,
                pos: 0,
                allowed_fields,
                max_depth,
                max_height,
                depth: 0,
            };
            parser.parse_query()
        });

    if let Err(err) = &result {
        debug!("query rejected: {}", err);
    }

    result
}

/// Reusable parser configuration. Holds no per-query state, so one instance
/// can serve any number of threads.
#[derive(Clone, Debug)]
pub struct QueryParser {
    allowed_fields: Option<HashSet<String>>,
    max_depth: usize,
    max_height: usize,
}

impl Default for QueryParser {
    fn default() -> QueryParser {
        QueryParser {
            allowed_fields: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

impl QueryParser {
    pub fn new() -> QueryParser {
        QueryParser::default()
    }

    /// Restricts queries to the given fields. An empty list allows none.
    pub fn with_allowed_fields<I, S>(mut self, fields: I) -> QueryParser
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: HashSet<String> = fields.into_iter().map(Into::into).collect();

        for name in validation::unreachable_fields(&allowed) {
            warn!("allowed field `{}` is not a valid identifier and will never match", name);
        }

        self.allowed_fields = Some(allowed);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> QueryParser {
        self.max_depth = max_depth;
        self
    }

    /// Limits the height of the produced tree. A single comparison is always
    /// accepted, so 0 and 1 both forbid `AND`/`OR`.
    pub fn with_max_height(mut self, max_height: usize) -> QueryParser {
        self.max_height = max_height;
        self
    }

    pub fn allowed_fields(&self) -> Option<&HashSet<String>> {
        self.allowed_fields.as_ref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    pub fn parse(&self, query: &str) -> Result<PredicateNode, ParseError> {
        parse_with(query, self.allowed_fields.as_ref(), self.max_depth, self.max_height)
    }
}

// A parsed node together with its height.
type Subtree = (PredicateNode, usize);

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    allowed_fields: Option<&'a HashSet<String>>,
    max_depth: usize,
    max_height: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    // The lexer always terminates the stream with End, so the last token is
    // returned for any position past it.
    fn peek(&self) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn parse_query(&mut self) -> Result<PredicateNode, ParseError> {
        let (expr, _) = self.parse_or()?;

        let next = self.peek();
        if *next.get_kind() != TKind::End {
            return Err(unexp_token_plural(next, vec![Expected::Keyword, Expected::End]));
        }

        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Subtree, ParseError> {
        let mut left = self.parse_and()?;

        while *self.peek().get_kind() == TKind::Keyword(LogicOp::Or) {
            let keyword = self.advance();
            let right = self.parse_and()?;
            left = self.combine(keyword, LogicOp::Or, left, right)?;
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Subtree, ParseError> {
        let mut left = self.parse_term()?;

        while *self.peek().get_kind() == TKind::Keyword(LogicOp::And) {
            let keyword = self.advance();
            let right = self.parse_term()?;
            left = self.combine(keyword, LogicOp::And, left, right)?;
        }

        Ok(left)
    }

    // Chains are built in a loop, so their length is only bounded here.
    fn combine(
        &self,
        keyword: &Token,
        op: LogicOp,
        (left, left_height): Subtree,
        (right, right_height): Subtree,
    ) -> Result<Subtree, ParseError> {
        let height = left_height.max(right_height) + 1;
        if height > self.max_height {
            return Err(ParseError::MaxHeightExceeded {
                position: keyword.get_pos(),
                limit: self.max_height,
            });
        }

        Ok((PredicateNode::logical(op, left, right), height))
    }

    fn parse_term(&mut self) -> Result<Subtree, ParseError> {
        let token = self.peek();
        match token.get_kind() {
            TKind::LParen => self.parse_group(),
            TKind::Field => self.parse_comparison(),
            _ => Err(unexp_token(token, Expected::Expression)),
        }
    }

    fn parse_group(&mut self) -> Result<Subtree, ParseError> {
        let open = self.advance();

        if self.depth >= self.max_depth {
            return Err(ParseError::MaxDepthExceeded {
                position: open.get_pos(),
                limit: self.max_depth,
            });
        }

        self.depth += 1;
        let expr = self.parse_or()?;
        self.depth -= 1;

        let close = self.peek();
        if *close.get_kind() != TKind::RParen {
            return Err(unexp_token_plural(close, vec![Expected::Keyword, Expected::RParen]));
        }
        self.advance();

        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Subtree, ParseError> {
        let field = self.advance();

        let op_token = self.peek();
        let op = match op_token.get_kind() {
            TKind::Operator(op) => *op,
            _ => return Err(unexp_token(op_token, Expected::Operator)),
        };
        self.advance();

        let value_token = self.peek();
        let value = match value_token.get_kind() {
            TKind::Literal { quoted: true } => Literal::String(value_token.get_text().to_string()),
            TKind::Literal { quoted: false } => coerce(value_token.get_text()),
            _ => return Err(unexp_token(value_token, Expected::Literal)),
        };
        self.advance();

        validation::check_field(field.get_text(), self.allowed_fields)?;

        Ok((PredicateNode::comparison(field.get_text(), op.into(), value), 1))
    }
}

#[cfg(test)]
mod tests;
