use crate::error::{KpiError, Result};
use crate::formula::ast::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(Value),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token's first character.
    pub position: usize,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        let kind = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' if bytes.get(pos + 1) == Some(&b'*') => {
                return Err(unsupported("operator '**'"));
            }
            b'*' => TokenKind::Star,
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                return Err(unsupported("operator '//'"));
            }
            b'/' => TokenKind::Slash,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b'0'..=b'9' => {
                let (value, end) = lex_number(src, pos)?;
                pos = end;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position: start,
                });
                continue;
            }
            b'.' if bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) => {
                let (value, end) = lex_number(src, pos)?;
                pos = end;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position: start,
                });
                continue;
            }
            b'.' => return Err(unsupported("attribute access")),
            c if c == b'_' || c.is_ascii_alphabetic() => {
                while pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphanumeric()) {
                    pos += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Identifier(src[start..pos].to_string()),
                    position: start,
                });
                continue;
            }
            b'[' | b']' => return Err(unsupported("indexing")),
            b'\'' | b'"' => return Err(unsupported("string literal")),
            b'=' if bytes.get(pos + 1) == Some(&b'=') => return Err(unsupported("comparison")),
            b'=' => return Err(unsupported("assignment")),
            b'<' | b'>' | b'!' => return Err(unsupported("comparison")),
            b'%' | b'@' | b'&' | b'|' | b'^' | b'~' => {
                return Err(unsupported(&format!("operator '{}'", c as char)));
            }
            _ => {
                let found = src[pos..].chars().next().unwrap_or('?');
                return Err(KpiError::Syntax {
                    position: pos,
                    details: format!("unexpected character '{}'", found),
                });
            }
        };

        tokens.push(Token {
            kind,
            position: start,
        });
        pos += 1;
    }

    Ok(tokens)
}

fn unsupported(construct: &str) -> KpiError {
    KpiError::UnsupportedConstruct(construct.to_string())
}

/// Integer literals stay integral; anything with a fraction or exponent is a float.
fn lex_number(src: &str, start: usize) -> Result<(Value, usize)> {
    let bytes = src.as_bytes();
    let mut pos = start;
    let mut is_float = false;

    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        is_float = true;
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp_end = pos + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        if exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            is_float = true;
            pos = exp_end;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let text = &src[start..pos];
    let malformed = || KpiError::Syntax {
        position: start,
        details: format!("invalid numeric literal '{}'", text),
    };

    let value = if is_float {
        Value::Float(text.parse::<f64>().map_err(|_| malformed())?)
    } else {
        match text.parse::<i128>() {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Float(text.parse::<f64>().map_err(|_| malformed())?),
        }
    };

    if pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphabetic()) {
        return Err(malformed());
    }

    Ok((value, pos))
}
