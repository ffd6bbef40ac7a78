use crate::error::{KpiError, Result};
use crate::formula::ast::{BinaryOp, Expr, Function, UnaryOp, Value};
use crate::formula::parser::parse_expression;
use std::collections::BTreeMap;

/// Values bound to the internal variable names of one rewritten formula.
/// Built fresh for every KPI evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingContext {
    values: BTreeMap<String, Value>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for BindingContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut context = BindingContext::new();
        for (name, value) in iter {
            context.insert(name, value);
        }
        context
    }
}

/// Parses `expression` against the closed formula grammar and evaluates it.
pub fn evaluate(expression: &str, context: &BindingContext) -> Result<Value> {
    parse_expression(expression)?.evaluate(context)
}

impl Expr {
    pub fn evaluate(&self, context: &BindingContext) -> Result<Value> {
        let value = self.eval_node(context)?;
        if !value.is_finite() {
            return Err(KpiError::NonFiniteResult);
        }
        Ok(value)
    }

    fn eval_node(&self, context: &BindingContext) -> Result<Value> {
        match self {
            Expr::Literal(value) => Ok(*value),
            Expr::Variable(name) => context
                .get(name)
                .ok_or_else(|| KpiError::UnboundVariable(name.clone())),
            Expr::Unary { op, operand } => {
                let value = operand.eval_node(context)?;
                match op {
                    UnaryOp::Plus => Ok(value),
                    UnaryOp::Minus => Ok(-value),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let left = lhs.eval_node(context)?;
                let right = rhs.eval_node(context)?;
                match op {
                    BinaryOp::Add => Ok(left + right),
                    BinaryOp::Sub => Ok(left - right),
                    BinaryOp::Mul => Ok(left * right),
                    BinaryOp::Div => left.checked_div(right),
                }
            }
            Expr::Call { function, argument } => {
                let value = argument.eval_node(context)?;
                match function {
                    Function::Abs => Ok(value.abs()),
                }
            }
        }
    }
}
