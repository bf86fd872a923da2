//! Parses compact filter queries such as
//! `(status:active OR status:pending) AND priority>=5` into a boolean
//! [`PredicateNode`] tree that callers translate into their own backend
//! filters.
//!
//! ```
//! use qfilter::{CmpOp, Literal, Number, PredicateNode};
//!
//! let tree = qfilter::parse("priority>=5", None).unwrap();
//! match tree {
//!     PredicateNode::Comparison(cmp) => {
//!         assert_eq!(cmp.field(), "priority");
//!         assert_eq!(cmp.op(), CmpOp::Gte);
//!         assert_eq!(*cmp.value(), Literal::Number(Number::Int(5)));
//!     },
//!     PredicateNode::Logical(_) => unreachable!(),
//! }
//! ```

pub mod lang;

pub use lang::{
    coerce, parse, tokenize, CmpOp, Comparison, Expected, LexError, LexErrorReason, Literal,
    LogicOp, Logical, Number, Operator, ParseError, PredicateNode, QueryParser, SyntaxError,
    Token, TokenKind, DEFAULT_MAX_DEPTH, DEFAULT_MAX_HEIGHT,
};
