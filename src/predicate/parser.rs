//! Composite predicate string parser
//!
//! Accepts the free-text form used by the discount pages, e.g.
//! `(and (age 17) (or (time 23 00 14 00) (season summer)))`.
//! Parentheses are cosmetic: they are stripped before tokenizing, and the
//! tree shape comes from operator arity and tag boundaries alone.

use crate::error::{Result, TradeCenterError};
use crate::predicate::ast::{CompositeOp, ConstraintTag, Operand, Operands, PredicateNode, Scalar};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Deepest composite nesting accepted before giving up
pub const MAX_DEPTH: usize = 64;

static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,]+").expect("separator pattern is valid"));

/// Parse a composite predicate string into an AST.
///
/// Returns `Ok(None)` when the input holds no tokens.
pub fn parse(input: &str) -> Result<Option<PredicateNode>> {
    let tokens = tokenize(input);
    debug!(tokens = tokens.len(), "parsing predicate expression");
    build(&tokens)
}

/// Split an expression into tokens, discarding every parenthesis.
pub fn tokenize(input: &str) -> Vec<String> {
    let stripped: String = input.chars().filter(|c| *c != '(' && *c != ')').collect();
    SEPARATORS
        .split(&stripped)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Classify a token as integer, float or string, in that order.
pub fn map_scalar(token: &str) -> Scalar {
    if let Ok(i) = token.parse::<i64>() {
        return Scalar::Integer(i);
    }

    // "inf" and "NaN" parse as f64 but are not decimal numbers
    if let Ok(f) = token.parse::<f64>() {
        if f.is_finite() {
            return Scalar::Float(f);
        }
    }

    Scalar::String(token.to_string())
}

/// Build a tree from a token sequence.
///
/// Tokens left over once the root node is complete are ignored.
pub fn build<S: AsRef<str>>(tokens: &[S]) -> Result<Option<PredicateNode>> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    let (node, next) = build_at(&tokens, 0, 0)?;

    if next < tokens.len() {
        warn!(
            consumed = next,
            total = tokens.len(),
            trailing = ?&tokens[next..],
            "ignoring tokens after complete predicate"
        );
    }

    Ok(Some(node))
}

fn is_keyword(token: &str) -> bool {
    CompositeOp::from_name(token).is_some() || ConstraintTag::from_name(token).is_some()
}

/// Build the node starting at `index`; returns it with the index of the first
/// token it did not consume.
fn build_at(tokens: &[&str], index: usize, depth: usize) -> Result<(PredicateNode, usize)> {
    if depth > MAX_DEPTH {
        return Err(TradeCenterError::InvalidPredicate(format!(
            "Nesting deeper than {} levels",
            MAX_DEPTH
        )));
    }

    let token = tokens.get(index).ok_or_else(|| {
        TradeCenterError::InvalidPredicate(format!("Unexpected end of expression at {}", index))
    })?;

    if let Some(op) = CompositeOp::from_name(token) {
        if index + 1 >= tokens.len() {
            return Err(TradeCenterError::InvalidPredicate(format!(
                "'{}' at position {} has no operands",
                op.as_str(),
                index
            )));
        }
        let (left, after_left) = build_at(tokens, index + 1, depth + 1)?;

        if after_left >= tokens.len() {
            return Err(TradeCenterError::InvalidPredicate(format!(
                "'{}' at position {} is missing its second operand",
                op.as_str(),
                index
            )));
        }
        let (right, after_right) = build_at(tokens, after_left, depth + 1)?;

        return Ok((PredicateNode::composite(op, left, right), after_right));
    }

    if let Some(tag) = ConstraintTag::from_name(token) {
        let mut operands = Operands::new();
        let mut next = index + 1;

        // The leaf ends at the next tag or operator, which is left for the caller
        while let Some(token) = tokens.get(next) {
            if is_keyword(token) {
                break;
            }
            operands.push(Operand::Scalar(map_scalar(token)));
            next += 1;
        }

        return Ok((PredicateNode::Leaf { tag, operands }, next));
    }

    Err(TradeCenterError::InvalidPredicate(format!(
        "'{}' at position {} is not a constraint or operator",
        token, index
    )))
}
