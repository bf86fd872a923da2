use super::tokens::*;

use thiserror::Error;

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{reason} at position {position}")]
pub struct LexError {
    pub position: usize,
    pub reason: LexErrorReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LexErrorReason {
    #[error("unrecognized character `{0}`")]
    UnexpectedChar(char),
    #[error("unterminated quoted string")]
    UnterminatedString,
}

type Chars<'a> = Peekable<CharIndices<'a>>;

/// Splits a query into tokens. The result always ends with a single
/// [`TokenKind::End`] token positioned at `src.len()`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens: Vec<Token> = vec![];
    let mut chars = src.char_indices().peekable();

    // Set right after an operator: the next token is read as a value.
    let mut value_expected = false;

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if value_expected {
            value_expected = false;

            if c != ')' && c != '"' {
                tokens.push(read_unquoted(src, &mut chars));
                continue;
            }
        }

        let token = match c {
            '(' => {
                chars.next();
                Token::new(TKind::LParen, "(", position)
            },
            ')' => {
                chars.next();
                Token::new(TKind::RParen, ")", position)
            },
            '"' => {
                chars.next();
                read_quoted(&mut chars, position)?
            },
            c if is_identifier_start(c) => read_word(src, &mut chars),
            c => match guess_operator(src, position) {
                Some(op) => {
                    let lexeme = op.lexeme();
                    for _ in 0..lexeme.len() {
                        chars.next();
                    }

                    value_expected = true;
                    Token::new(TKind::Operator(op), lexeme, position)
                },
                None => return Err(LexError {
                    position,
                    reason: LexErrorReason::UnexpectedChar(c),
                }),
            },
        };

        tokens.push(token);
    }

    tokens.push(Token::new(TKind::End, "", src.len()));

    Ok(tokens)
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn guess_operator(src: &str, position: usize) -> Option<Operator> {
    let two = src.get(position..position + 2).and_then(Operator::from_lexeme);
    two.or_else(|| src.get(position..position + 1).and_then(Operator::from_lexeme))
}

fn end_of(src: &str, chars: &mut Chars<'_>) -> usize {
    chars.peek().map_or(src.len(), |&(i, _)| i)
}

fn read_word(src: &str, chars: &mut Chars<'_>) -> Token {
    let start = end_of(src, chars);

    while let Some(&(_, c)) = chars.peek() {
        if !is_identifier_part(c) {
            break;
        }
        chars.next();
    }

    let word = &src[start..end_of(src, chars)];

    let kind = match LogicOp::from_keyword(word) {
        Some(op) => TKind::Keyword(op),
        None if is_literal_keyword(word) => TKind::Literal { quoted: false },
        None => TKind::Field,
    };

    Token::new(kind, word, start)
}

fn is_literal_keyword(word: &str) -> bool {
    ["true", "false", "null"]
        .iter()
        .any(|kw| word.eq_ignore_ascii_case(kw))
}

fn read_unquoted(src: &str, chars: &mut Chars<'_>) -> Token {
    let start = end_of(src, chars);

    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() || c == ')' {
            break;
        }
        chars.next();
    }

    Token::new(
        TKind::Literal { quoted: false },
        &src[start..end_of(src, chars)],
        start,
    )
}

// Expects the opening quote at `start` to be consumed already.
fn read_quoted(chars: &mut Chars<'_>, start: usize) -> Result<Token, LexError> {
    let unterminated = LexError {
        position: start,
        reason: LexErrorReason::UnterminatedString,
    };

    let mut contents = String::new();
    loop {
        match chars.next() {
            Some((_, '"')) => break,
            Some((_, '\\')) => match chars.next() {
                Some((_, c @ ('"' | '\\'))) => contents.push(c),
                Some((_, c)) => {
                    contents.push('\\');
                    contents.push(c);
                },
                None => return Err(unterminated),
            },
            Some((_, c)) => contents.push(c),
            None => return Err(unterminated),
        }
    }

    Ok(Token::new(TKind::Literal { quoted: true }, contents, start))
}
