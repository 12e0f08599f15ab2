//! Boolean evaluator for fully reduced conditional expressions.
//!
//! By the time a `#if` condition reaches this module it has been reduced to
//! the alphabet `T F & | ! ( )` with no whitespace. Evaluation works by
//! repeatedly rewriting the token vector until a single truth value is left.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("unknown character '{character}' in boolean expression '{expression}'")]
    UnknownCharacter { character: char, expression: String },

    #[error("malformed boolean expression '{expression}'")]
    Malformed { expression: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolToken {
    False,
    True,
    Or,
    And,
    Not,
    LeftParen,
    RightParen,
}

fn truth(token: BoolToken) -> Option<bool> {
    match token {
        BoolToken::True => Some(true),
        BoolToken::False => Some(false),
        _ => None,
    }
}

fn from_bool(value: bool) -> BoolToken {
    if value {
        BoolToken::True
    } else {
        BoolToken::False
    }
}

/// Evaluate a reduced boolean expression.
///
/// Reduction rules, applied anywhere in the vector until no token pair
/// qualifies: `!v`, `v & v`, `v | v` and `(v)` each collapse to a single
/// truth value. A pass that makes no progress means the expression was
/// malformed.
pub fn evaluate(expression: &str) -> Result<bool, EvalError> {
    let malformed = || EvalError::Malformed {
        expression: expression.to_string(),
    };

    let mut tokens = Vec::with_capacity(expression.len());
    for character in expression.chars() {
        let token = match character {
            'T' => BoolToken::True,
            'F' => BoolToken::False,
            '&' => BoolToken::And,
            '|' => BoolToken::Or,
            '!' => BoolToken::Not,
            '(' => BoolToken::LeftParen,
            ')' => BoolToken::RightParen,
            _ => {
                return Err(EvalError::UnknownCharacter {
                    character,
                    expression: expression.to_string(),
                })
            }
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(malformed());
    }

    while tokens.len() > 1 {
        let mut changed = false;
        let mut i = 0;
        while i < tokens.len() {
            if reduce_at(&mut tokens, i) {
                changed = true;
            } else {
                i += 1;
            }
        }
        if !changed {
            return Err(malformed());
        }
    }

    truth(tokens[0]).ok_or_else(malformed)
}

/// Try one rewrite with its leftmost token at `i`.
fn reduce_at(tokens: &mut Vec<BoolToken>, i: usize) -> bool {
    if tokens[i] == BoolToken::Not && i + 1 < tokens.len() {
        if let Some(value) = truth(tokens[i + 1]) {
            tokens[i] = from_bool(!value);
            tokens.remove(i + 1);
            return true;
        }
    }
    if i + 2 < tokens.len() {
        let (left, middle, right) = (tokens[i], tokens[i + 1], tokens[i + 2]);
        if let (Some(l), Some(r)) = (truth(left), truth(right)) {
            let value = match middle {
                BoolToken::And => Some(l && r),
                BoolToken::Or => Some(l || r),
                _ => None,
            };
            if let Some(value) = value {
                tokens[i] = from_bool(value);
                tokens.drain(i + 1..=i + 2);
                return true;
            }
        }
        if left == BoolToken::LeftParen && right == BoolToken::RightParen {
            if let Some(value) = truth(middle) {
                tokens[i] = from_bool(value);
                tokens.drain(i + 1..=i + 2);
                return true;
            }
        }
    }
    false
}
