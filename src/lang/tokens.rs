use serde::Serialize;

use std::fmt;

pub use TokenKind as TKind;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    kind: TokenKind,
    text: String,
    position: usize,
}

impl Token {
    pub(super) fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Token {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn get_kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Source text of the token. Quoted literals hold their unescaped contents.
    pub fn get_text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the first character of the token.
    pub fn get_pos(&self) -> usize {
        self.position
    }

    pub fn describe(&self) -> String {
        match self.kind {
            TKind::Field => format!("field `{}`", self.text),
            TKind::Operator(_) => format!("operator `{}`", self.text),
            TKind::Keyword(_) => format!("keyword `{}`", self.text),
            TKind::LParen => "`(`".to_string(),
            TKind::RParen => "`)`".to_string(),
            TKind::Literal { quoted: true } => format!("value `\"{}\"`", self.text),
            TKind::Literal { quoted: false } => format!("value `{}`", self.text),
            TKind::End => "end of input".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Field,
    Operator(Operator),
    Keyword(LogicOp),
    LParen,
    RParen,
    Literal { quoted: bool },
    End,
}

/// Comparison operators as written in a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Operator {
    Eq,
    EqAlias,
    IContains,
    NotEqual,
    Greater,
    Lesser,
    GreaterOrEqual,
    LesserOrEqual,
}

impl Operator {
    /// Longest lexemes come first so that a prefix never shadows them.
    pub const LEXEMES: [(&'static str, Operator); 8] = [
        (":=", Operator::EqAlias),
        (">=", Operator::GreaterOrEqual),
        ("<=", Operator::LesserOrEqual),
        ("!=", Operator::NotEqual),
        ("~=", Operator::IContains),
        (":", Operator::Eq),
        (">", Operator::Greater),
        ("<", Operator::Lesser),
    ];

    pub fn from_lexeme(s: &str) -> Option<Operator> {
        Operator::LEXEMES
            .iter()
            .find(|(lexeme, _)| *lexeme == s)
            .map(|(_, op)| *op)
    }

    pub fn lexeme(&self) -> &'static str {
        match self {
            Operator::Eq => ":",
            Operator::EqAlias => ":=",
            Operator::IContains => "~=",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Lesser => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LesserOrEqual => "<=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn from_keyword(s: &str) -> Option<LogicOp> {
        if s.eq_ignore_ascii_case("and") {
            Some(LogicOp::And)
        } else if s.eq_ignore_ascii_case("or") {
            Some(LogicOp::Or)
        } else {
            None
        }
    }

    /// Higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            LogicOp::Or => 1,
            LogicOp::And => 2,
        }
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicOp::And => write!(f, "AND"),
            LogicOp::Or => write!(f, "OR"),
        }
    }
}
