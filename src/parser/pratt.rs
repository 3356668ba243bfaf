use rustc_hash::FxHashMap;

use crate::functions::registry::Registry;
use crate::parser::lexer::RATIONAL;
use crate::parser::tokens::{Operator, Spanned, Token};
use crate::{DiffError, Expr, Span};

/// Binding power of unary minus: between Mul (20) and Pow (30),
/// so `-x^2` parses as `-(x^2)`
const UNARY_PRECEDENCE: u8 = 25;

/// Parse tokens into an AST using the Pratt parsing algorithm
pub(crate) fn parse_expression(tokens: &[Spanned], max_depth: usize) -> Result<Expr, DiffError> {
    if tokens.is_empty() {
        return Err(DiffError::UnexpectedEndOfInput);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let expr = parser.parse_expr(0)?;

    match parser.current() {
        None => Ok(expr),
        Some(extra) => Err(DiffError::UnexpectedToken {
            expected: "end of input".to_string(),
            got: extra.token.to_string(),
            span: Some(extra.span),
        }),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect_right_paren(&mut self) -> Result<(), DiffError> {
        match self.current() {
            Some(Spanned {
                token: Token::RightParen,
                ..
            }) => {
                self.advance();
                Ok(())
            }
            Some(other) => Err(DiffError::UnexpectedToken {
                expected: ")".to_string(),
                got: other.token.to_string(),
                span: Some(other.span),
            }),
            None => Err(DiffError::UnexpectedEndOfInput),
        }
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Expr, DiffError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(DiffError::MaxDepthExceeded);
        }

        let mut left = self.parse_prefix()?;

        while let Some(Spanned {
            token: Token::Operator(op),
            ..
        }) = self.current()
        {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();

            // Right associative for power, left for others
            let next_precedence = if *op == Operator::Pow {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_expr(next_precedence)?;

            left = match op {
                Operator::Add => Expr::add_expr(left, right),
                Operator::Sub => Expr::sub_expr(left, right),
                Operator::Mul => Expr::mul_expr(left, right),
                Operator::Div => Expr::div_expr(left, right),
                Operator::Pow => Expr::pow(left, right),
            };
        }

        self.depth -= 1;
        Ok(left)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, DiffError> {
        let mut args = Vec::new();

        loop {
            args.push(self.parse_expr(0)?);

            match self.current() {
                Some(Spanned {
                    token: Token::Comma,
                    ..
                }) => self.advance(),
                Some(Spanned {
                    token: Token::RightParen,
                    ..
                }) => break,
                Some(other) => {
                    return Err(DiffError::UnexpectedToken {
                        expected: ", or )".to_string(),
                        got: other.token.to_string(),
                        span: Some(other.span),
                    });
                }
                None => return Err(DiffError::UnexpectedEndOfInput),
            }
        }

        Ok(args)
    }

    fn parse_prefix(&mut self) -> Result<Expr, DiffError> {
        let spanned = self.current().ok_or(DiffError::UnexpectedEndOfInput)?;

        match &spanned.token {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::number(*n))
            }

            Token::Identifier(name) => {
                self.advance();
                Ok(Expr::symbol(name))
            }

            Token::Function(name) => {
                self.advance();
                match self.current() {
                    Some(Spanned {
                        token: Token::LeftParen,
                        ..
                    }) => self.advance(),
                    _ => return Err(DiffError::UnexpectedEndOfInput),
                }
                let args = self.parse_arguments()?;
                self.expect_right_paren()?;
                build_call(name, args, spanned.span)
            }

            Token::Operator(Operator::Sub) => {
                self.advance();
                let expr = self.parse_expr(UNARY_PRECEDENCE)?;
                Ok(match expr.as_number() {
                    Some(n) => Expr::number(-n),
                    None => Expr::mul_expr(Expr::number(-1.0), expr),
                })
            }

            Token::Operator(Operator::Add) => {
                self.advance();
                self.parse_expr(UNARY_PRECEDENCE)
            }

            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                self.expect_right_paren()?;
                Ok(expr)
            }

            other => Err(DiffError::invalid_token_at(other.to_string(), spanned.span)),
        }
    }
}

/// Build a function call node, checking arity and resolving `Rational`
fn build_call(name: &str, args: Vec<Expr>, span: Span) -> Result<Expr, DiffError> {
    if name == RATIONAL {
        let empty = FxHashMap::default();
        let values: Option<Vec<f64>> = args.iter().map(|a| a.evaluate(&empty).as_number()).collect();
        return match values.as_deref() {
            Some([numerator, denominator]) => Ok(Expr::div_expr(
                Expr::number(*numerator),
                Expr::number(*denominator),
            )),
            Some(_) => Err(DiffError::InvalidArity {
                name: RATIONAL.to_string(),
                expected: "2".to_string(),
                got: args.len(),
            }),
            None => Err(DiffError::invalid_syntax_at(
                "Rational expects numeric arguments",
                span,
            )),
        };
    }

    let def = Registry::get(name).ok_or_else(|| DiffError::UnknownFunction {
        name: name.to_string(),
        span: Some(span),
    })?;
    if !def.validate_arity(args.len()) {
        return Err(DiffError::InvalidArity {
            name: name.to_string(),
            expected: def.arity_description(),
            got: args.len(),
        });
    }
    Ok(Expr::func_multi(def.name, args))
}
