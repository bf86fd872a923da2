use regex::Regex;
use serde::Serialize;

use std::fmt;
use std::sync::OnceLock;

static INTEGER_REGEX: OnceLock<Regex> = OnceLock::new();
static FLOAT_REGEX: OnceLock<Regex> = OnceLock::new();

fn integer_regex() -> &'static Regex {
    INTEGER_REGEX.get_or_init(|| Regex::new(r"^-?[0-9]+$").unwrap())
}

fn float_regex() -> &'static Regex {
    FLOAT_REGEX.get_or_init(|| Regex::new(r"^-?[0-9]+\.[0-9]+$").unwrap())
}

/// Typed value on the right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Literal {
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// Determines the type of an unquoted value. Never fails: anything that is
/// not a boolean, null or number is a string.
pub fn coerce(raw: &str) -> Literal {
    if raw.eq_ignore_ascii_case("true") {
        return Literal::Boolean(true);
    }

    if raw.eq_ignore_ascii_case("false") {
        return Literal::Boolean(false);
    }

    if raw.eq_ignore_ascii_case("null") {
        return Literal::Null;
    }

    if integer_regex().is_match(raw) {
        if let Ok(num) = raw.parse::<i64>() {
            return Literal::Number(Number::Int(num));
        }
    }

    if float_regex().is_match(raw) {
        match raw.parse::<f64>() {
            Ok(num) if num.is_finite() => return Literal::Number(Number::Float(num)),
            _ => {},
        }
    }

    Literal::String(raw.to_string())
}

impl Literal {
    /// Whether writing this value unquoted would read back the same.
    fn is_bare(s: &str) -> bool {
        !s.is_empty()
            && !s.starts_with(|c| c == '"' || c == '=')
            && !s.chars().any(|c| c.is_whitespace() || c == ')')
            && coerce(s) == Literal::String(s.to_string())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(num) => write!(f, "{}", num),
            Number::Float(num) => {
                let s = num.to_string();
                if s.contains('.') {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{}.0", s)
                }
            },
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) if Literal::is_bare(s) => write!(f, "{}", s),
            Literal::String(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Literal::Number(num) => write!(f, "{}", num),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}
