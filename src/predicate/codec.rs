//! Wire encoding of predicate trees
//!
//! The backend receives a tree as nested JSON arrays: a composite is
//! `[op, left, right]` and a leaf is `[tag, operand...]`.

use crate::error::{Result, TradeCenterError};
use crate::predicate::ast::{
    CompositeOp, ConstraintTag, Location, Operand, Operands, PredicateNode, Scalar,
};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::Value;

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Operand::Scalar(s) => s.serialize(serializer),
            Operand::Location(loc) => loc.serialize(serializer),
        }
    }
}

impl Serialize for PredicateNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PredicateNode::Composite { op, left, right } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(op.as_str())?;
                seq.serialize_element(left.as_ref())?;
                seq.serialize_element(right.as_ref())?;
                seq.end()
            }
            PredicateNode::Leaf { tag, operands } => {
                let mut seq = serializer.serialize_seq(Some(operands.len() + 1))?;
                seq.serialize_element(tag.as_str())?;
                for operand in operands {
                    seq.serialize_element(operand)?;
                }
                seq.end()
            }
        }
    }
}

impl PredicateNode {
    /// Encode as the nested-array JSON value the backend expects
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a tree previously encoded with [`PredicateNode::to_json`]
    pub fn from_json(value: &Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            TradeCenterError::InvalidPredicate(format!("Expected array node, got {}", value))
        })?;

        let (head, rest) = items.split_first().ok_or_else(|| {
            TradeCenterError::InvalidPredicate("Empty node".to_string())
        })?;

        let name = head.as_str().ok_or_else(|| {
            TradeCenterError::InvalidPredicate(format!("Node tag must be a string, got {}", head))
        })?;

        if let Some(op) = CompositeOp::from_name(name) {
            return match rest {
                [left, right] => Ok(PredicateNode::composite(
                    op,
                    PredicateNode::from_json(left)?,
                    PredicateNode::from_json(right)?,
                )),
                _ => Err(TradeCenterError::InvalidPredicate(format!(
                    "'{}' needs exactly 2 children, got {}",
                    name,
                    rest.len()
                ))),
            };
        }

        let tag = ConstraintTag::from_name(name).ok_or_else(|| {
            TradeCenterError::InvalidPredicate(format!("Unknown node tag: {}", name))
        })?;

        let operands = rest
            .iter()
            .map(|operand| operand_from_json(tag, operand))
            .collect::<Result<Operands>>()?;

        Ok(PredicateNode::Leaf { tag, operands })
    }
}

fn operand_from_json(tag: ConstraintTag, value: &Value) -> Result<Operand> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Operand::Scalar(Scalar::Integer(i)))
            } else if let Some(f) = n.as_f64() {
                Ok(Operand::Scalar(Scalar::Float(f)))
            } else {
                Err(TradeCenterError::InvalidPredicate(format!(
                    "Unsupported number: {}",
                    n
                )))
            }
        }
        Value::String(s) => Ok(Operand::Scalar(Scalar::String(s.clone()))),
        Value::Object(_) if tag == ConstraintTag::Location => {
            let location: Location = serde_json::from_value(value.clone()).map_err(|e| {
                TradeCenterError::InvalidPredicate(format!("Malformed location {}: {}", value, e))
            })?;
            Ok(Operand::from(location))
        }
        other => Err(TradeCenterError::InvalidPredicate(format!(
            "Unsupported operand for '{}': {}",
            tag.as_str(),
            other
        ))),
    }
}
