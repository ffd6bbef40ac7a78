//! The closed formula grammar: arithmetic over account variables plus `ABS(x)`.
//!
//! Formulas are tokenized, parsed into an [`Expr`] tree and evaluated by an
//! exhaustive match. Anything outside the grammar (attribute access, indexing,
//! comparisons, other function names, string or boolean literals) is rejected
//! with [`KpiError::UnsupportedConstruct`](crate::KpiError::UnsupportedConstruct)
//! before any evaluation happens.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, Function, UnaryOp, Value};
pub use eval::{evaluate, BindingContext};
pub use parser::parse_expression;
