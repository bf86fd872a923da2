//! Predicate tree produced by the parser.
//!
//! Leaves are [`Comparison`]s, inner nodes are binary [`Logical`] nodes.
//! Nodes are built only by the parser and have no setters, so a tree handed
//! to the caller always satisfies the field invariants checked during parsing.

use super::literal::Literal;
use super::tokens::{LogicOp, Operator};

use serde::Serialize;

use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateNode {
    Comparison(Comparison),
    Logical(Logical),
}

impl PredicateNode {
    pub(crate) fn comparison(field: impl Into<String>, op: CmpOp, value: Literal) -> PredicateNode {
        PredicateNode::Comparison(Comparison {
            field: field.into(),
            op,
            value,
        })
    }

    pub(crate) fn logical(op: LogicOp, left: PredicateNode, right: PredicateNode) -> PredicateNode {
        PredicateNode::Logical(Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Names of all fields referenced by the tree.
    pub fn fields(&self) -> BTreeSet<&str> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, fields: &mut BTreeSet<&'a str>) {
        match self {
            PredicateNode::Comparison(cmp) => {
                fields.insert(cmp.field());
            },
            PredicateNode::Logical(logical) => {
                logical.left.collect_fields(fields);
                logical.right.collect_fields(fields);
            },
        }
    }

    /// Height of the tree, a single comparison being 1.
    pub fn depth(&self) -> usize {
        match self {
            PredicateNode::Comparison(_) => 1,
            PredicateNode::Logical(logical) => {
                1 + logical.left.depth().max(logical.right.depth())
            },
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parent: LogicOp, right: bool) -> fmt::Result {
        let parens = match self {
            PredicateNode::Comparison(_) => false,
            PredicateNode::Logical(child) => {
                child.op.precedence() < parent.precedence()
                    || (right && child.op == parent)
            },
        };

        if parens {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateNode::Comparison(cmp) => write!(f, "{}", cmp),
            PredicateNode::Logical(logical) => {
                logical.left.fmt_child(f, logical.op, false)?;
                write!(f, " {} ", logical.op)?;
                logical.right.fmt_child(f, logical.op, true)
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comparison {
    field: String,
    op: CmpOp,
    value: Literal,
}

impl Comparison {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    pub fn value(&self) -> &Literal {
        &self.value
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.op, self.value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Logical {
    op: LogicOp,
    left: Box<PredicateNode>,
    right: Box<PredicateNode>,
}

impl Logical {
    pub fn op(&self) -> LogicOp {
        self.op
    }

    pub fn left(&self) -> &PredicateNode {
        &self.left
    }

    pub fn right(&self) -> &PredicateNode {
        &self.right
    }
}

/// Comparison operator of a tree leaf. `:` and `:=` both map to `Eq`.
/// `Neq` is kept as a plain operator; negation is left to the consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CmpOp {
    Eq,
    IContains,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl From<Operator> for CmpOp {
    fn from(op: Operator) -> CmpOp {
        match op {
            Operator::Eq | Operator::EqAlias => CmpOp::Eq,
            Operator::IContains => CmpOp::IContains,
            Operator::NotEqual => CmpOp::Neq,
            Operator::Greater => CmpOp::Gt,
            Operator::Lesser => CmpOp::Lt,
            Operator::GreaterOrEqual => CmpOp::Gte,
            Operator::LesserOrEqual => CmpOp::Lte,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CmpOp::Eq => Operator::Eq,
            CmpOp::IContains => Operator::IContains,
            CmpOp::Neq => Operator::NotEqual,
            CmpOp::Gt => Operator::Greater,
            CmpOp::Lt => Operator::Lesser,
            CmpOp::Gte => Operator::GreaterOrEqual,
            CmpOp::Lte => Operator::LesserOrEqual,
        };

        write!(f, "{}", op.lexeme())
    }
}
