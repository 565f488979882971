//! Value lists for the single-attribute rules.
//!
//! Year/month/day rules hold a list of single values and inclusive ranges,
//! persisted as JSON integers or `"lo-hi"` strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single value or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Single(i64),
    Range(i64, i64),
}

impl RuleValue {
    pub fn contains(&self, v: i64) -> bool {
        match *self {
            Self::Single(x) => v == x,
            Self::Range(lo, hi) => (lo..=hi).contains(&v),
        }
    }

    /// Parse one JSON element: an integer, a `[lo, hi]` pair, or a
    /// `"lo-hi"` string.
    pub fn from_json(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) => n.as_i64().map(Self::Single),
            Value::Array(items) => match items.as_slice() {
                [a, b] => Some(Self::Range(a.as_i64()?, b.as_i64()?)),
                _ => None,
            },
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    /// Parse `"v"` or `"lo-hi"` (either bound may be negative).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return Some(Self::Single(v));
        }
        // Split on the first '-' that is not a leading sign.
        let sep = s.get(1..)?.find('-')? + 1;
        let lo: i64 = s[..sep].trim().parse().ok()?;
        let hi: i64 = s[sep + 1..].trim().parse().ok()?;
        Some(Self::Range(lo, hi))
    }

    pub fn to_json(&self) -> Value {
        match *self {
            Self::Single(v) => Value::from(v),
            Self::Range(lo, hi) => Value::from(format!("{lo}-{hi}")),
        }
    }
}

impl std::fmt::Display for RuleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Single(v) => write!(f, "{v}"),
            Self::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

/// Parse a whole value list: a single element or a JSON array of elements.
/// Returns `None` if any element is malformed.
pub fn values_from_json(v: &Value) -> Option<Vec<RuleValue>> {
    match v {
        Value::Array(items) => items.iter().map(RuleValue::from_json).collect(),
        other => RuleValue::from_json(other).map(|rv| vec![rv]),
    }
}

pub fn values_to_json(values: &[RuleValue]) -> Value {
    Value::Array(values.iter().map(RuleValue::to_json).collect())
}

/// Membership over a value list. An empty list matches nothing.
pub fn values_contain(values: &[RuleValue], v: i64) -> bool {
    values.iter().any(|rv| rv.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_singles_and_ranges() {
        assert_eq!(RuleValue::parse("2024"), Some(RuleValue::Single(2024)));
        assert_eq!(RuleValue::parse("1990-1995"), Some(RuleValue::Range(1990, 1995)));
        assert_eq!(RuleValue::parse("-100-50"), Some(RuleValue::Range(-100, 50)));
        assert_eq!(RuleValue::parse("-44"), Some(RuleValue::Single(-44)));
        assert_eq!(RuleValue::parse("abc"), None);
    }

    #[test]
    fn test_from_json_shapes() {
        assert_eq!(
            values_from_json(&json!([2020, "2022-2024", [1, 3]])),
            Some(vec![
                RuleValue::Single(2020),
                RuleValue::Range(2022, 2024),
                RuleValue::Range(1, 3),
            ])
        );
        assert_eq!(values_from_json(&json!(7)), Some(vec![RuleValue::Single(7)]));
        assert_eq!(values_from_json(&json!([true])), None);
    }

    #[test]
    fn test_contains() {
        let values = vec![RuleValue::Single(1), RuleValue::Range(5, 7)];
        assert!(values_contain(&values, 1));
        assert!(values_contain(&values, 5));
        assert!(values_contain(&values, 7));
        assert!(!values_contain(&values, 4));
        assert!(!values_contain(&[], 1));
    }

    #[test]
    fn test_round_trip_json() {
        let values = vec![RuleValue::Single(3), RuleValue::Range(10, 20)];
        let json = values_to_json(&values);
        assert_eq!(values_from_json(&json), Some(values));
    }
}
