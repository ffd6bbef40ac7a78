use crate::error::{KpiError, Result};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A formula value. Integer arithmetic stays integral until a division or a float
/// literal promotes it, which is what lets the formatter tell whole amounts from
/// computed ratios. Integers are 128-bit so products of two filing amounts stay
/// exact; anything wider falls back to a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i128),
    Float(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Value::Int(v) => v == 0,
            Value::Float(v) => v == 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            Value::Int(_) => true,
            Value::Float(v) => v.is_finite(),
        }
    }

    /// True division: always a float, even for two integers.
    pub fn checked_div(self, rhs: Value) -> Result<Value> {
        if rhs.is_zero() {
            return Err(KpiError::DivisionByZero);
        }
        Ok(Value::Float(self.as_f64() / rhs.as_f64()))
    }

    pub fn abs(self) -> Value {
        match self {
            Value::Int(v) => v.checked_abs().map_or(Value::Float((v as f64).abs()), Value::Int),
            Value::Float(v) => Value::Float(v.abs()),
        }
    }

    fn integral_or_float(
        self,
        rhs: Value,
        int_op: fn(i128, i128) -> Option<i128>,
        float_op: fn(f64, f64) -> f64,
    ) -> Value {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                int_op(a, b).map_or_else(|| Value::Float(float_op(a as f64, b as f64)), Value::Int)
            }
            (a, b) => Value::Float(float_op(a.as_f64(), b.as_f64())),
        }
    }
}

impl Add for Value {
    type Output = Value;

    fn add(self, rhs: Value) -> Value {
        self.integral_or_float(rhs, i128::checked_add, |a, b| a + b)
    }
}

impl Sub for Value {
    type Output = Value;

    fn sub(self, rhs: Value) -> Value {
        self.integral_or_float(rhs, i128::checked_sub, |a, b| a - b)
    }
}

impl Mul for Value {
    type Output = Value;

    fn mul(self, rhs: Value) -> Value {
        self.integral_or_float(rhs, i128::checked_mul, |a, b| a * b)
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        match self {
            Value::Int(v) => v.checked_neg().map_or(Value::Float(-(v as f64)), Value::Int),
            Value::Float(v) => Value::Float(-v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(i128::from(v))
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// The closed set of callable functions. There is no registration hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
}

impl Function {
    pub const ABS_NAME: &'static str = "ABS";

    pub fn from_name(name: &str) -> Option<Function> {
        match name {
            Self::ABS_NAME => Some(Function::Abs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Abs => Self::ABS_NAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        argument: Box<Expr>,
    },
}

impl Expr {
    /// Variable names in order of first appearance, without duplicates.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Unary { operand, .. } => operand.collect_variables(names),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Expr::Call { argument, .. } => argument.collect_variables(names),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Variable(name) => f.write_str(name),
            Expr::Unary { op: UnaryOp::Plus, operand } => write!(f, "(+{})", operand),
            Expr::Unary { op: UnaryOp::Minus, operand } => write!(f, "(-{})", operand),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Expr::Call { function, argument } => write!(f, "{}({})", function.name(), argument),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        assert_eq!(Value::Int(2) + Value::Int(3), Value::Int(5));
        assert_eq!(Value::Int(2) * Value::Float(1.5), Value::Float(3.0));
        assert_eq!(Value::Int(1).checked_div(Value::Int(4)).unwrap(), Value::Float(0.25));
        assert_eq!(-Value::Int(7), Value::Int(-7));
        assert_eq!(Value::Int(-7).abs(), Value::Int(7));
    }

    #[test]
    fn test_division_by_zero_both_kinds() {
        assert!(matches!(Value::Int(1).checked_div(Value::Int(0)), Err(KpiError::DivisionByZero)));
        assert!(matches!(Value::Float(1.0).checked_div(Value::Float(-0.0)), Err(KpiError::DivisionByZero)));
    }

    #[test]
    fn test_product_of_filing_amounts_is_exact() {
        let revenue = Value::from(258_935_494_000_000_i64);
        let assets = Value::from(455_905_980_000_000_i64);
        assert_eq!(
            revenue * assets,
            Value::Int(258_935_494_000_000_i128 * 455_905_980_000_000_i128)
        );
    }

    #[test]
    fn test_integer_overflow_promotes_to_float() {
        assert_eq!(Value::Int(i128::MAX) + Value::Int(1), Value::Float(i128::MAX as f64 + 1.0));
        assert_eq!(Value::Int(i128::MAX) * Value::Int(4), Value::Float(i128::MAX as f64 * 4.0));
        assert_eq!(-Value::Int(i128::MIN), Value::Float(-(i128::MIN as f64)));
        assert_eq!(Value::Int(i128::MIN).abs(), Value::Float((i128::MIN as f64).abs()));
    }

    #[test]
    fn test_function_whitelist_is_case_sensitive() {
        assert_eq!(Function::from_name("ABS"), Some(Function::Abs));
        assert_eq!(Function::from_name("abs"), None);
        assert_eq!(Function::from_name("EXP"), None);
    }
}
