//! Typed leaf constraints
//!
//! Structured counterparts of the leaf shapes the discount and purchase
//! policy forms assemble. Each constraint checks its own fields before it is
//! turned into a [`PredicateNode`] leaf.

use crate::error::{Result, TradeCenterError};
use crate::predicate::{
    map_scalar, CompositeOp, ConstraintTag, Location, Operand, PredicateNode, Scalar,
};

/// Oldest age accepted for an age constraint
pub const MAX_AGE: u32 = 150;

/// Season names the backend recognizes
pub const SEASONS: [&str; 5] = ["spring", "summer", "autumn", "fall", "winter"];

/// Quantity a bound constraint measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Price,
    Amount,
    Weight,
}

/// A single non-decomposable condition with typed operands
#[derive(Debug, Clone, PartialEq)]
pub enum LeafConstraint {
    Age {
        min_age: u32,
    },
    Time {
        start_hour: u32,
        start_minute: u32,
        end_hour: u32,
        end_minute: u32,
    },
    Location(Location),
    DayOfMonth {
        start: u32,
        end: u32,
    },
    DayOfWeek {
        start: u32,
        end: u32,
    },
    Season(String),
    HolidaysOfCountry(String),
    Basket {
        measure: Measure,
        min: f64,
        max: f64,
        store_id: Scalar,
    },
    Product {
        measure: Measure,
        min: f64,
        max: f64,
        product_id: Scalar,
        store_id: Scalar,
    },
    Category {
        measure: Measure,
        min: f64,
        max: f64,
        category_id: Scalar,
    },
}

fn invalid(msg: impl Into<String>) -> TradeCenterError {
    TradeCenterError::InvalidConstraint(msg.into())
}

fn check_range(name: &str, value: u32, low: u32, high: u32) -> Result<()> {
    if value < low || value > high {
        return Err(invalid(format!(
            "{} must be between {} and {}, got {}",
            name, low, high, value
        )));
    }
    Ok(())
}

fn check_bounds(min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(invalid("bounds must be finite numbers"));
    }
    if min < 0.0 {
        return Err(invalid(format!("minimum must not be negative, got {}", min)));
    }
    if min > max {
        return Err(invalid(format!(
            "minimum {} is greater than maximum {}",
            min, max
        )));
    }
    Ok(())
}

/// A string operand must survive rendering and re-parsing as itself
fn check_token(name: &str, value: &str) -> Result<()> {
    if value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == ',' || c == '(' || c == ')')
    {
        return Err(invalid(format!("{} must be a single word, got '{}'", name, value)));
    }
    if CompositeOp::from_name(value).is_some() || ConstraintTag::from_name(value).is_some() {
        return Err(invalid(format!("{} must not be a keyword, got '{}'", name, value)));
    }
    if !matches!(map_scalar(value), Scalar::String(_)) {
        return Err(invalid(format!(
            "{} '{}' looks numeric, pass it as a number",
            name, value
        )));
    }
    Ok(())
}

fn check_id(name: &str, id: &Scalar) -> Result<()> {
    match id {
        Scalar::String(s) => check_token(name, s),
        Scalar::Integer(_) => Ok(()),
        Scalar::Float(_) => Err(invalid(format!("{} must be an integer or a word", name))),
    }
}

impl LeafConstraint {
    /// Tag this constraint is submitted under
    pub fn tag(&self) -> ConstraintTag {
        match self {
            LeafConstraint::Age { .. } => ConstraintTag::Age,
            LeafConstraint::Time { .. } => ConstraintTag::Time,
            LeafConstraint::Location(_) => ConstraintTag::Location,
            LeafConstraint::DayOfMonth { .. } => ConstraintTag::DayOfMonth,
            LeafConstraint::DayOfWeek { .. } => ConstraintTag::DayOfWeek,
            LeafConstraint::Season(_) => ConstraintTag::Season,
            LeafConstraint::HolidaysOfCountry(_) => ConstraintTag::HolidaysOfCountry,
            LeafConstraint::Basket { measure, .. } => match measure {
                Measure::Price => ConstraintTag::PriceBasket,
                Measure::Amount => ConstraintTag::AmountBasket,
                Measure::Weight => ConstraintTag::WeightBasket,
            },
            LeafConstraint::Product { measure, .. } => match measure {
                Measure::Price => ConstraintTag::PriceProduct,
                Measure::Amount => ConstraintTag::AmountProduct,
                Measure::Weight => ConstraintTag::WeightProduct,
            },
            LeafConstraint::Category { measure, .. } => match measure {
                Measure::Price => ConstraintTag::PriceCategory,
                Measure::Amount => ConstraintTag::AmountCategory,
                Measure::Weight => ConstraintTag::WeightCategory,
            },
        }
    }

    /// Check field ranges; the first failure is reported
    pub fn validate(&self) -> Result<()> {
        match self {
            LeafConstraint::Age { min_age } => check_range("age", *min_age, 0, MAX_AGE),
            LeafConstraint::Time {
                start_hour,
                start_minute,
                end_hour,
                end_minute,
            } => {
                check_range("start hour", *start_hour, 0, 23)?;
                check_range("start minute", *start_minute, 0, 59)?;
                check_range("end hour", *end_hour, 0, 23)?;
                check_range("end minute", *end_minute, 0, 59)
            }
            LeafConstraint::Location(location) => {
                if location.country.trim().is_empty() {
                    return Err(invalid("location requires a country"));
                }
                Ok(())
            }
            LeafConstraint::DayOfMonth { start, end } => {
                check_range("start day", *start, 1, 31)?;
                check_range("end day", *end, *start, 31)
            }
            LeafConstraint::DayOfWeek { start, end } => {
                check_range("start day", *start, 1, 7)?;
                check_range("end day", *end, *start, 7)
            }
            LeafConstraint::Season(name) => {
                if !SEASONS.contains(&name.as_str()) {
                    return Err(invalid(format!("unknown season: {}", name)));
                }
                Ok(())
            }
            LeafConstraint::HolidaysOfCountry(code) => {
                if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(invalid(format!("invalid country code: '{}'", code)));
                }
                check_token("country code", code)
            }
            LeafConstraint::Basket {
                min, max, store_id, ..
            } => {
                check_bounds(*min, *max)?;
                check_id("store id", store_id)
            }
            LeafConstraint::Product {
                min,
                max,
                product_id,
                store_id,
                ..
            } => {
                check_bounds(*min, *max)?;
                check_id("product id", product_id)?;
                check_id("store id", store_id)
            }
            LeafConstraint::Category {
                min,
                max,
                category_id,
                ..
            } => {
                check_bounds(*min, *max)?;
                check_id("category id", category_id)
            }
        }
    }

    /// Operands in the order the backend expects for this tag
    pub fn operands(&self) -> Vec<Operand> {
        match self {
            LeafConstraint::Age { min_age } => vec![Scalar::from(*min_age).into()],
            LeafConstraint::Time {
                start_hour,
                start_minute,
                end_hour,
                end_minute,
            } => [start_hour, start_minute, end_hour, end_minute]
                .into_iter()
                .map(|v| Scalar::from(*v).into())
                .collect(),
            LeafConstraint::Location(location) => vec![Operand::from(location.clone())],
            LeafConstraint::DayOfMonth { start, end } | LeafConstraint::DayOfWeek { start, end } => {
                vec![Scalar::from(*start).into(), Scalar::from(*end).into()]
            }
            LeafConstraint::Season(name) => vec![Scalar::from(name.as_str()).into()],
            LeafConstraint::HolidaysOfCountry(code) => vec![Scalar::from(code.as_str()).into()],
            LeafConstraint::Basket {
                min, max, store_id, ..
            } => vec![
                Scalar::number(*min).into(),
                Scalar::number(*max).into(),
                store_id.clone().into(),
            ],
            LeafConstraint::Product {
                min,
                max,
                product_id,
                store_id,
                ..
            } => vec![
                Scalar::number(*min).into(),
                Scalar::number(*max).into(),
                product_id.clone().into(),
                store_id.clone().into(),
            ],
            LeafConstraint::Category {
                min,
                max,
                category_id,
                ..
            } => vec![
                Scalar::number(*min).into(),
                Scalar::number(*max).into(),
                category_id.clone().into(),
            ],
        }
    }

    /// Validate and convert into a predicate leaf
    pub fn into_node(self) -> Result<PredicateNode> {
        self.validate()?;
        Ok(PredicateNode::leaf(self.tag(), self.operands()))
    }
}
