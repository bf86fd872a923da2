pub mod lexer;
pub mod literal;
pub mod parser;
pub mod tokens;
pub mod tree;
pub mod validation;

pub use lexer::{tokenize, LexError, LexErrorReason};
pub use literal::{coerce, Literal, Number};
pub use parser::{
    parse, Expected, ParseError, QueryParser, SyntaxError, DEFAULT_MAX_DEPTH, DEFAULT_MAX_HEIGHT,
};
pub use tokens::{LogicOp, Operator, Token, TokenKind};
pub use tree::{CmpOp, Comparison, Logical, PredicateNode};
