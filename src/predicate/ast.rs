//! Abstract Syntax Tree for predicate expressions

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Composite (boolean combinator) operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeOp {
    And,
    Or,
    Xor,
    Implies,
}

impl CompositeOp {
    pub const ALL: [CompositeOp; 4] = [
        CompositeOp::And,
        CompositeOp::Or,
        CompositeOp::Xor,
        CompositeOp::Implies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeOp::And => "and",
            CompositeOp::Or => "or",
            CompositeOp::Xor => "xor",
            CompositeOp::Implies => "implies",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "and" => Some(CompositeOp::And),
            "or" => Some(CompositeOp::Or),
            "xor" => Some(CompositeOp::Xor),
            "implies" => Some(CompositeOp::Implies),
            _ => None,
        }
    }
}

/// Leaf constraint kinds understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintTag {
    Age,
    Time,
    Location,
    DayOfMonth,
    DayOfWeek,
    Season,
    HolidaysOfCountry,
    PriceBasket,
    PriceProduct,
    PriceCategory,
    AmountBasket,
    AmountProduct,
    AmountCategory,
    WeightBasket,
    WeightProduct,
    WeightCategory,
}

impl ConstraintTag {
    pub const ALL: [ConstraintTag; 16] = [
        ConstraintTag::Age,
        ConstraintTag::Time,
        ConstraintTag::Location,
        ConstraintTag::DayOfMonth,
        ConstraintTag::DayOfWeek,
        ConstraintTag::Season,
        ConstraintTag::HolidaysOfCountry,
        ConstraintTag::PriceBasket,
        ConstraintTag::PriceProduct,
        ConstraintTag::PriceCategory,
        ConstraintTag::AmountBasket,
        ConstraintTag::AmountProduct,
        ConstraintTag::AmountCategory,
        ConstraintTag::WeightBasket,
        ConstraintTag::WeightProduct,
        ConstraintTag::WeightCategory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintTag::Age => "age",
            ConstraintTag::Time => "time",
            ConstraintTag::Location => "location",
            ConstraintTag::DayOfMonth => "day_of_month",
            ConstraintTag::DayOfWeek => "day_of_week",
            ConstraintTag::Season => "season",
            ConstraintTag::HolidaysOfCountry => "holidays_of_country",
            ConstraintTag::PriceBasket => "price_basket",
            ConstraintTag::PriceProduct => "price_product",
            ConstraintTag::PriceCategory => "price_category",
            ConstraintTag::AmountBasket => "amount_basket",
            ConstraintTag::AmountProduct => "amount_product",
            ConstraintTag::AmountCategory => "amount_category",
            ConstraintTag::WeightBasket => "weight_basket",
            ConstraintTag::WeightProduct => "weight_product",
            ConstraintTag::WeightCategory => "weight_category",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ConstraintTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == name)
    }
}

/// A token resolved to the most specific literal type
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Whole numbers become `Integer` so they serialize without a fraction.
    pub fn number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Scalar::Integer(value as i64)
        } else {
            Scalar::Float(value)
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Integer(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(i) => write!(f, "{}", i),
            // Debug keeps the fractional part ("17.0") so the text maps back to a float
            Scalar::Float(x) => write!(f, "{:?}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// Postal location operand of the `location` constraint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub zip_code: String,
}

/// Leaf operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Scalar),
    /// Never produced by the text parser, only by the typed constraint builders.
    /// Boxed so a leaf's inline operand storage stays small.
    Location(Box<Location>),
}

impl From<Scalar> for Operand {
    fn from(value: Scalar) -> Self {
        Operand::Scalar(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Scalar(Scalar::Integer(value))
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(Scalar::Float(value))
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Scalar(Scalar::from(value))
    }
}

impl From<Location> for Operand {
    fn from(value: Location) -> Self {
        Operand::Location(Box::new(value))
    }
}

pub type Operands = SmallVec<[Operand; 4]>;

/// AST node for predicate expressions
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    /// Boolean combination of exactly two sub-predicates
    Composite {
        op: CompositeOp,
        left: Box<PredicateNode>,
        right: Box<PredicateNode>,
    },
    /// Single constraint with its operand list
    Leaf { tag: ConstraintTag, operands: Operands },
}

impl PredicateNode {
    pub fn composite(op: CompositeOp, left: PredicateNode, right: PredicateNode) -> Self {
        PredicateNode::Composite {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn leaf<I>(tag: ConstraintTag, operands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        PredicateNode::Leaf {
            tag,
            operands: operands.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            PredicateNode::Composite { left, right, .. } => left.leaf_count() + right.leaf_count(),
            PredicateNode::Leaf { .. } => 1,
        }
    }

    /// Nesting depth; a lone leaf has depth 1
    pub fn depth(&self) -> usize {
        match self {
            PredicateNode::Composite { left, right, .. } => 1 + left.depth().max(right.depth()),
            PredicateNode::Leaf { .. } => 1,
        }
    }
}

impl fmt::Display for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateNode::Composite { op, left, right } => {
                write!(f, "({} {} {})", op.as_str(), left, right)
            }
            PredicateNode::Leaf { tag, operands } => {
                f.write_str("(")?;
                f.write_str(tag.as_str())?;
                for operand in operands {
                    match operand {
                        Operand::Scalar(s) => write!(f, " {}", s)?,
                        Operand::Location(loc) => {
                            let json = serde_json::to_string(loc).map_err(|_| fmt::Error)?;
                            write!(f, " {}", json)?;
                        }
                    }
                }
                f.write_str(")")
            }
        }
    }
}
