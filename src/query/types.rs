//! Core types for the query vocabulary

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Value type for range bounds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeValue {
    /// 64-bit integer
    Long(i64),
    /// 64-bit floating point
    Double(f64),
    /// String (dates, unparsable numbers)
    String(String),
}

impl RangeValue {
    /// Build a bound from a request literal
    ///
    /// Numeric fields keep numbers as JSON numbers; everything else stays a string.
    pub fn from_literal(literal: &str, numeric: bool) -> Self {
        if numeric {
            if let Ok(v) = literal.parse::<i64>() {
                return RangeValue::Long(v);
            }
            if let Ok(v) = literal.parse::<f64>() {
                if v.is_finite() {
                    return RangeValue::Double(v);
                }
            }
        }
        RangeValue::String(literal.to_string())
    }

    /// Convert to f64 if possible
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RangeValue::Long(v) => Some(*v as f64),
            RangeValue::Double(v) => Some(*v),
            RangeValue::String(s) => s.parse().ok(),
        }
    }

    /// Compare two bounds: numerically when both are numbers, lexically otherwise
    pub fn compare(&self, other: &RangeValue) -> Ordering {
        match (self, other) {
            (RangeValue::String(a), RangeValue::String(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => self.to_string().cmp(&other.to_string()),
            },
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeValue::Long(v) => write!(f, "{}", v),
            RangeValue::Double(v) => write!(f, "{}", v),
            RangeValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// Direction of a range boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeOp {
    Gte,
    Gt,
    Lte,
    Lt,
}

impl RangeOp {
    /// Wire name of the boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeOp::Gte => "gte",
            RangeOp::Gt => "gt",
            RangeOp::Lte => "lte",
            RangeOp::Lt => "lt",
        }
    }

    /// Whether this boundary constrains from below
    pub fn is_lower(&self) -> bool {
        matches!(self, RangeOp::Gte | RangeOp::Gt)
    }
}

/// Range bounds for range queries
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    /// Greater than or equal to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<RangeValue>,
    /// Greater than
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<RangeValue>,
    /// Less than or equal to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<RangeValue>,
    /// Less than
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<RangeValue>,
}

impl RangeBounds {
    /// Get the bound for a direction
    pub fn get(&self, op: RangeOp) -> Option<&RangeValue> {
        match op {
            RangeOp::Gte => self.gte.as_ref(),
            RangeOp::Gt => self.gt.as_ref(),
            RangeOp::Lte => self.lte.as_ref(),
            RangeOp::Lt => self.lt.as_ref(),
        }
    }

    /// Set the bound for a direction
    pub fn set(&mut self, op: RangeOp, value: RangeValue) {
        let slot = match op {
            RangeOp::Gte => &mut self.gte,
            RangeOp::Gt => &mut self.gt,
            RangeOp::Lte => &mut self.lte,
            RangeOp::Lt => &mut self.lt,
        };
        *slot = Some(value);
    }

    /// True when no bound is set
    pub fn is_empty(&self) -> bool {
        self.gte.is_none() && self.gt.is_none() && self.lte.is_none() && self.lt.is_none()
    }

    /// Check whether a value satisfies every bound
    ///
    /// Bounds are compared with [`RangeValue::compare`], so numeric bounds compare
    /// numerically and date strings compare lexically.
    pub fn contains(&self, value: &RangeValue) -> bool {
        let satisfies = |op: RangeOp| -> bool {
            match self.get(op) {
                None => true,
                Some(bound) => {
                    let ord = value.compare(bound);
                    match op {
                        RangeOp::Gte => ord != Ordering::Less,
                        RangeOp::Gt => ord == Ordering::Greater,
                        RangeOp::Lte => ord != Ordering::Greater,
                        RangeOp::Lt => ord == Ordering::Less,
                    }
                }
            }
        };
        satisfies(RangeOp::Gte)
            && satisfies(RangeOp::Gt)
            && satisfies(RangeOp::Lte)
            && satisfies(RangeOp::Lt)
    }
}
