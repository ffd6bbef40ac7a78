// Recursive-descent parser for the KPI formula grammar:
//
//   expr    := term (('+' | '-') term)*
//   term    := unary (('*' | '/') unary)*
//   unary   := ('+' | '-') unary | primary
//   primary := NUMBER | IDENT | IDENT '(' expr ')' | '(' expr ')'

use crate::error::{KpiError, Result};
use crate::formula::ast::{BinaryOp, Expr, Function, UnaryOp};
use crate::formula::lexer::{tokenize, Token, TokenKind};

const MAX_DEPTH: usize = 64;

const RESERVED_LITERALS: [&str; 3] = ["True", "False", "None"];

pub fn parse_expression(src: &str) -> Result<Expr> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        src_len: src.len(),
    };

    if tokens.is_empty() {
        return Err(KpiError::Syntax {
            position: 0,
            details: "empty formula".to_string(),
        });
    }

    let expr = parser.parse_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(KpiError::Syntax {
            position: tok.position,
            details: format!("unexpected {:?} after complete expression", tok.kind),
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    src_len: usize,
}

impl<'a> Parser<'a> {
    /* --------------------------- token helpers -------------------------- */

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&'a Token> {
        let tok = self.tokens.get(self.pos).ok_or_else(|| KpiError::Syntax {
            position: self.src_len,
            details: "unexpected end of formula".to_string(),
        })?;
        self.pos += 1;
        Ok(tok)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        match self.peek() {
            Some(tok) if tok.kind == *kind => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<()> {
        let tok = self.next()?;
        if tok.kind == kind {
            Ok(())
        } else {
            Err(KpiError::Syntax {
                position: tok.position,
                details: format!("expected {} but found {:?}", what, tok.kind),
            })
        }
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(KpiError::UnsupportedConstruct(format!(
                "nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    /* ---------------------------- grammar ------------------------------- */

    fn parse_expr(&mut self) -> Result<Expr> {
        self.descend()?;
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= 1;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = if self.eat(&TokenKind::Minus) {
            UnaryOp::Minus
        } else if self.eat(&TokenKind::Plus) {
            UnaryOp::Plus
        } else {
            return self.parse_primary();
        };

        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let tok = self.next()?;
        match &tok.kind {
            TokenKind::Number(value) => Ok(Expr::Literal(*value)),
            TokenKind::Identifier(name) => {
                if self.eat(&TokenKind::LParen) {
                    return self.parse_call(name);
                }
                if RESERVED_LITERALS.contains(&name.as_str()) {
                    return Err(KpiError::UnsupportedConstruct(format!("literal '{}'", name)));
                }
                Ok(Expr::Variable(name.clone()))
            }
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(KpiError::Syntax {
                position: tok.position,
                details: format!("expected a value but found {:?}", other),
            }),
        }
    }

    /// Called after `name(` has been consumed.
    fn parse_call(&mut self, name: &str) -> Result<Expr> {
        let function = Function::from_name(name)
            .ok_or_else(|| KpiError::UnsupportedConstruct(format!("call to '{}'", name)))?;

        let argument = self.parse_expr()?;
        if self.peek().map(|t| &t.kind) == Some(&TokenKind::Comma) {
            return Err(KpiError::UnsupportedConstruct(format!(
                "{} takes exactly one argument",
                function.name()
            )));
        }
        self.expect(TokenKind::RParen, "')'")?;

        Ok(Expr::Call {
            function,
            argument: Box::new(argument),
        })
    }
}
