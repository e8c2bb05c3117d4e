//! a module turns a String expression into a symbolic expression
//!
//! A conventional recursive-descent grammar over the infix notation the
//! engine prints: `+ - * /` with standard precedence, right-associative `^`,
//! unary minus, parentheses, identifiers and `Name[arg1, arg2]` call syntax.
//!
//! Numeric literals - integer, decimal and scientific - parse to exact
//! rationals (the mantissa over a power of ten), so constants imported from
//! circuit model text stay exact until something genuinely inexact touches
//! them.
//!
//!# Example
//! ```
//! use RustedCAS::symbolic::symbolic_engine::Expr;
//! let e = Expr::parse_expression("2 + 3*4").unwrap();
//! assert_eq!(e.evaluate(), Expr::int(14));
//! ```

use crate::symbolic::real_arithmetic::Real;
use crate::symbolic::symbolic_engine::Expr;
use num::BigRational;
use num::bigint::BigInt;
use num_traits::Pow;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Real),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '0'..='9' | '.' => {
                let mut integer = String::new();
                let mut fraction = String::new();
                let mut exponent = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        integer.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if chars.peek() == Some(&'.') {
                    chars.next();
                    while let Some(&d) = chars.peek() {
                        if d.is_ascii_digit() {
                            fraction.push(d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
                if matches!(chars.peek(), Some(&'e') | Some(&'E')) {
                    chars.next();
                    if matches!(chars.peek(), Some(&'+') | Some(&'-')) {
                        if chars.peek() == Some(&'-') {
                            exponent.push('-');
                        }
                        chars.next();
                    }
                    while let Some(&d) = chars.peek() {
                        if d.is_ascii_digit() {
                            exponent.push(d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if exponent.is_empty() || exponent == "-" {
                        return Err("malformed exponent in numeric literal".to_string());
                    }
                }
                if integer.is_empty() && fraction.is_empty() {
                    return Err("malformed numeric literal".to_string());
                }
                tokens.push(Token::Number(literal_to_real(
                    &integer, &fraction, &exponent,
                )?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => {
                return Err(format!("unexpected character '{}' in expression", other));
            }
        }
    }
    Ok(tokens)
}

// mantissa.fraction * 10^exponent as an exact rational.
fn literal_to_real(integer: &str, fraction: &str, exponent: &str) -> Result<Real, String> {
    let digits = format!(
        "{}{}",
        if integer.is_empty() { "0" } else { integer },
        fraction
    );
    let numer: BigInt = digits
        .parse()
        .map_err(|_| format!("malformed numeric literal '{}'", digits))?;
    let mut denom = BigInt::from(10).pow(fraction.len() as u32);
    let mut numer = numer;
    if !exponent.is_empty() {
        let exp: i32 = exponent
            .parse()
            .map_err(|_| format!("malformed exponent '{}'", exponent))?;
        if exp >= 0 {
            numer *= BigInt::from(10).pow(exp as u32);
        } else {
            denom *= BigInt::from(10).pow(exp.unsigned_abs());
        }
    }
    Ok(Real::Rational(BigRational::new(numer, denom)))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            Some(t) => Err(format!("expected {:?}, found {:?}", token, t)),
            None => Err(format!("expected {:?}, found end of input", token)),
        }
    }

    // sum := product (('+' | '-') product)*
    fn parse_sum(&mut self) -> Result<Expr, String> {
        let mut terms = vec![self.parse_product()?];
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    terms.push(self.parse_product()?);
                }
                Some(Token::Minus) => {
                    self.next();
                    terms.push(-self.parse_product()?);
                }
                _ => break,
            }
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::sum(terms)
        })
    }

    // product := unary (('*' | '/') unary)*
    fn parse_product(&mut self) -> Result<Expr, String> {
        let mut e = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    e = e * self.parse_unary()?;
                }
                Some(Token::Slash) => {
                    self.next();
                    e = e / self.parse_unary()?;
                }
                _ => break,
            }
        }
        Ok(e)
    }

    // unary := '-' unary | power
    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Token::Minus) {
            self.next();
            return Ok(-self.parse_unary()?);
        }
        self.parse_power()
    }

    // power := atom ('^' unary)?   (right associative)
    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_atom()?;
        if self.peek() == Some(&Token::Caret) {
            self.next();
            let exponent = self.parse_unary()?;
            return Ok(base.pow(exponent));
        }
        Ok(base)
    }

    // atom := number | ident | ident '[' sum (',' sum)* ']' | '(' sum ')'
    fn parse_atom(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Number(x)) => Ok(Expr::Const(x)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LBracket) {
                    self.next();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RBracket) {
                        args.push(self.parse_sum()?);
                        while self.peek() == Some(&Token::Comma) {
                            self.next();
                            args.push(self.parse_sum()?);
                        }
                    }
                    self.expect(Token::RBracket)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.parse_sum()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(t) => Err(format!("unexpected token {:?}", t)),
            None => Err("unexpected end of input".to_string()),
        }
    }
}

/// Parse `input` into a symbolic expression.
pub fn parse_expression_func(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let e = parser.parse_sum()?;
    match parser.peek() {
        None => Ok(e),
        Some(t) => Err(format!("unexpected trailing token {:?}", t)),
    }
}

impl Expr {
    /// Parse a string expression into a symbolic expression.
    pub fn parse_expression(input: &str) -> Result<Expr, String> {
        parse_expression_func(input)
    }
}
