//! Implicit multiplication insertion for natural notation
//!
//! Inserts `*` operators between tokens where multiplication is implied, e.g. `2x` → `2 * x`.

use crate::Span;
use crate::parser::tokens::{Operator, Spanned, Token};

/// Check if implicit multiplication should be inserted between two tokens
fn should_insert_mul(current: &Token, next: &Token) -> bool {
    matches!(
        (current, next),
        // 2x, 2 sin(x), 2(x), x y, x sin(y), x(..) is a call and never reaches here
        (
            Token::Number(_),
            Token::Identifier(_) | Token::Function(_) | Token::LeftParen
        ) | (
            Token::Identifier(_),
            Token::Identifier(_) | Token::Function(_)
        ) | (
            Token::RightParen,
            Token::Identifier(_) | Token::Function(_) | Token::Number(_) | Token::LeftParen
        )
    )
}

/// Insert implicit multiplication operators between appropriate tokens
///
/// Rules:
/// - Number * Identifier/Function/(: `2 x` → `2 * x`, `2(x)` → `2 * (x)`
/// - Identifier * Identifier/Function: `a x` → `a * x`
/// - ) * Identifier/Function/Number/(: `(a) x` → `(a) * x`
pub(crate) fn insert_implicit_multiplication(tokens: Vec<Spanned>) -> Vec<Spanned> {
    let needs_insertion = tokens
        .windows(2)
        .any(|w| should_insert_mul(&w[0].token, &w[1].token));

    if !needs_insertion {
        return tokens;
    }

    let mut result = Vec::with_capacity(tokens.len() * 3 / 2);
    let mut it = tokens.into_iter().peekable();

    while let Some(current) = it.next() {
        let inserted_at = it
            .peek()
            .filter(|next| should_insert_mul(&current.token, &next.token))
            .map(|next| next.span.start);

        result.push(current);
        if let Some(pos) = inserted_at {
            result.push(Spanned::new(
                Token::Operator(Operator::Mul),
                Span::new(pos, pos),
            ));
        }
    }

    result
}
