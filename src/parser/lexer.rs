//! Tokenizer for formula strings

use crate::functions::is_known_function;
use crate::parser::tokens::{Operator, Spanned, Token};
use crate::{DiffError, Span};

/// Pseudo-function producing an exact fraction `a/b`
pub(crate) const RATIONAL: &str = "Rational";

/// Reject unbalanced parentheses before lexing
pub(crate) fn check_parentheses(input: &str) -> Result<(), DiffError> {
    let mut open = Vec::new();
    for (pos, c) in input.char_indices() {
        match c {
            '(' => open.push(pos),
            ')' => {
                if open.pop().is_none() {
                    return Err(DiffError::invalid_syntax_at("unmatched ')'", Span::at(pos)));
                }
            }
            _ => {}
        }
    }
    match open.last() {
        Some(&pos) => Err(DiffError::invalid_syntax_at("unclosed '('", Span::at(pos))),
        None => Ok(()),
    }
}

/// Split the input into tokens
///
/// Identifiers start with an ASCII letter and continue with letters or
/// digits. An identifier directly followed by `(` must name a known function.
pub(crate) fn lex(input: &str) -> Result<Vec<Spanned>, DiffError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::with_capacity(input.len() / 2 + 1);
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b'0'..=b'9' | b'.' => {
                let (token, end) = lex_number(input, pos)?;
                tokens.push(Spanned::new(token, Span::new(pos, end)));
                pos = end;
            }
            b'a'..=b'z' | b'A'..=b'Z' => {
                let end = pos
                    + bytes[pos..]
                        .iter()
                        .take_while(|b| b.is_ascii_alphanumeric())
                        .count();
                let name = &input[pos..end];
                let span = Span::new(pos, end);
                let next = bytes[end..].iter().find(|b| !b.is_ascii_whitespace());
                let token = if next == Some(&b'(') {
                    if name != RATIONAL && !is_known_function(name) {
                        return Err(DiffError::UnknownFunction {
                            name: name.to_string(),
                            span: Some(span),
                        });
                    }
                    Token::Function(name.to_string())
                } else {
                    Token::Identifier(name.to_string())
                };
                tokens.push(Spanned::new(token, span));
                pos = end;
            }
            b'*' if bytes.get(pos + 1) == Some(&b'*') => {
                tokens.push(Spanned::new(
                    Token::Operator(Operator::Pow),
                    Span::new(pos, pos + 2),
                ));
                pos += 2;
            }
            b'+' | b'-' | b'*' | b'/' | b'^' | b'(' | b')' | b',' => {
                let token = match c {
                    b'+' => Token::Operator(Operator::Add),
                    b'-' => Token::Operator(Operator::Sub),
                    b'*' => Token::Operator(Operator::Mul),
                    b'/' => Token::Operator(Operator::Div),
                    b'^' => Token::Operator(Operator::Pow),
                    b'(' => Token::LeftParen,
                    b')' => Token::RightParen,
                    _ => Token::Comma,
                };
                tokens.push(Spanned::new(token, Span::at(pos)));
                pos += 1;
            }
            _ => {
                let ch = input[pos..].chars().next().unwrap_or('?');
                return Err(DiffError::invalid_token_at(
                    ch.to_string(),
                    Span::new(pos, pos + ch.len_utf8()),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Lex a decimal number with optional fraction and exponent (`1.5e-3`, `.5`)
fn lex_number(input: &str, start: usize) -> Result<(Token, usize), DiffError> {
    let bytes = input.as_bytes();
    let mut end = start;
    let mut seen_dot = false;

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    // Exponent only when digits follow, so `2e` stays `2 * e`
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut probe = end + 1;
        if probe < bytes.len() && matches!(bytes[probe], b'+' | b'-') {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe].is_ascii_digit() {
            end = probe + bytes[probe..].iter().take_while(|b| b.is_ascii_digit()).count();
        }
    }

    let text = &input[start..end];
    text.parse::<f64>()
        .map(|n| (Token::Number(n), end))
        .map_err(|_| DiffError::invalid_number_at(text, Span::new(start, end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input)
            .expect("input lexes")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_lex_power_operators() {
        assert_eq!(
            kinds("x**2"),
            vec![
                Token::Identifier("x".into()),
                Token::Operator(Operator::Pow),
                Token::Number(2.0)
            ]
        );
        assert_eq!(kinds("x^2"), kinds("x**2"));
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(kinds("1.5e-3"), vec![Token::Number(1.5e-3)]);
        assert_eq!(kinds(".5"), vec![Token::Number(0.5)]);
        assert_eq!(
            kinds("2e"),
            vec![Token::Number(2.0), Token::Identifier("e".into())]
        );
        assert!(matches!(
            lex("1.2.3"),
            Ok(ref t) if t.len() == 2
        ));
        assert!(matches!(lex("."), Err(DiffError::InvalidNumber { .. })));
    }

    #[test]
    fn test_lex_functions() {
        assert_eq!(
            kinds("sin (x)")[0],
            Token::Function("sin".into()),
            "whitespace before the paren still makes a call"
        );
        assert_eq!(kinds("Rational(1,2)")[0], Token::Function("Rational".into()));
        assert!(matches!(
            lex("f(x)"),
            Err(DiffError::UnknownFunction { ref name, .. }) if name == "f"
        ));
    }

    #[test]
    fn test_lex_invalid_character() {
        let err = lex("a $ b").unwrap_err();
        assert_eq!(err, DiffError::invalid_token_at("$", Span::at(2)));
    }

    #[test]
    fn test_parentheses_balance() {
        assert!(check_parentheses("(a+(b))").is_ok());
        assert!(check_parentheses("(a").is_err());
        assert!(check_parentheses("a)").is_err());
    }
}
