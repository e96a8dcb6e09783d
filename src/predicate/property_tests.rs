//! Property tests for the predicate module

use proptest::prelude::*;

use crate::predicate::ast::{CompositeOp, ConstraintTag, PredicateNode, Scalar};
use crate::predicate::cache::get_or_parse;
use crate::predicate::parser::{build, map_scalar, parse, tokenize};

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

fn tag_strategy() -> impl Strategy<Value = ConstraintTag> {
    prop::sample::select(ConstraintTag::ALL.to_vec())
}

fn op_strategy() -> impl Strategy<Value = CompositeOp> {
    prop::sample::select(CompositeOp::ALL.to_vec())
}

/// Identifiers that cannot be mistaken for a number, tag or operator
fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,10}".prop_filter("must not be a keyword", |s| {
        ConstraintTag::from_name(s).is_none() && CompositeOp::from_name(s).is_none()
    })
}

/// Floats with a fractional part, so they never read back as integers
fn fractional_strategy() -> impl Strategy<Value = f64> {
    (-1.0e6..1.0e6f64).prop_filter("needs a fraction", |f| f.fract() != 0.0)
}

fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<i64>().prop_map(Scalar::Integer),
        fractional_strategy().prop_map(Scalar::Float),
        identifier_strategy().prop_map(Scalar::String),
    ]
}

fn leaf_strategy() -> impl Strategy<Value = PredicateNode> {
    (tag_strategy(), prop::collection::vec(scalar_strategy(), 0..=4))
        .prop_map(|(tag, operands)| PredicateNode::leaf(tag, operands))
}

fn tree_strategy() -> impl Strategy<Value = PredicateNode> {
    leaf_strategy().prop_recursive(4, 16, 2, |inner| {
        (op_strategy(), inner.clone(), inner)
            .prop_map(|(op, left, right)| PredicateNode::composite(op, left, right))
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// A parenthesized leaf parses to its tag followed by mapped operands
    #[test]
    fn prop_simple_leaf_round_trip(
        tag in tag_strategy(),
        operands in prop::collection::vec(scalar_strategy(), 0..=5)
    ) {
        let text: Vec<String> = operands.iter().map(|s| s.to_string()).collect();
        let expr = format!("({} {})", tag.as_str(), text.join(" "));

        let ast = parse(&expr).unwrap();
        prop_assert_eq!(ast, Some(PredicateNode::leaf(tag, operands)));
    }

    /// Integers always map to Integer
    #[test]
    fn prop_integer_tokens_map_to_integer(value in any::<i64>()) {
        prop_assert_eq!(map_scalar(&value.to_string()), Scalar::Integer(value));
    }

    /// Fractional numbers always map to Float with the same value
    #[test]
    fn prop_fractional_tokens_map_to_float(value in fractional_strategy()) {
        prop_assert_eq!(map_scalar(&format!("{:?}", value)), Scalar::Float(value));
    }

    /// Non-numeric words are returned unchanged
    #[test]
    fn prop_words_map_to_string(word in identifier_strategy()) {
        prop_assert_eq!(map_scalar(&word), Scalar::String(word.clone()));
    }

    /// Tokenizing already-normalized text is the identity
    #[test]
    fn prop_tokenizer_idempotent(words in prop::collection::vec("[a-z0-9_.]{1,8}", 0..=12)) {
        let normalized = words.join(" ");
        prop_assert_eq!(tokenize(&normalized), words.clone());
        prop_assert_eq!(tokenize(&tokenize(&normalized).join(" ")), words);
    }

    /// Composites always take exactly the two following children, in order
    #[test]
    fn prop_composite_arity(
        op in op_strategy(),
        left in leaf_strategy(),
        right in leaf_strategy()
    ) {
        let expr = format!("({} {} {})", op.as_str(), left, right);
        let ast = parse(&expr).unwrap().unwrap();
        prop_assert_eq!(ast, PredicateNode::composite(op, left, right));
    }

    /// Rendering a tree and parsing it back yields the same tree
    #[test]
    fn prop_display_parse_round_trip(tree in tree_strategy()) {
        let rendered = tree.to_string();
        prop_assert_eq!(parse(&rendered).unwrap(), Some(tree));
    }

    /// The JSON codec inverts itself on any tree
    #[test]
    fn prop_json_round_trip(tree in tree_strategy()) {
        let json = tree.to_json().unwrap();
        prop_assert_eq!(PredicateNode::from_json(&json).unwrap(), tree);
    }

    /// Building from tokens matches parsing from text
    #[test]
    fn prop_build_matches_parse(tree in tree_strategy()) {
        let rendered = tree.to_string();
        prop_assert_eq!(build(&tokenize(&rendered)).unwrap(), parse(&rendered).unwrap());
    }

    /// Cached results agree with direct parsing
    #[test]
    fn prop_cache_consistency(tree in tree_strategy()) {
        let rendered = tree.to_string();
        let direct = parse(&rendered).unwrap();
        let cached_first = get_or_parse(&rendered).unwrap();
        let cached_second = get_or_parse(&rendered).unwrap();

        prop_assert_eq!(&direct, &cached_first);
        prop_assert_eq!(cached_first, cached_second);
    }
}
