//! Field validation rules.
//!
//! Rules are advisory: a failing rule marks the field invalid but never blocks
//! serialization or execution.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::core::values::{FieldPath, Values, parse_float, parse_int, tokens};

type CustomRule = Arc<dyn Fn(&str, &Values) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub enum Rule {
    #[default]
    Any,
    Int,
    Float,
    OneOf(Vec<i64>),
    IntRange { min: i64, max: i64 },
    /// Blank passes; anything else must satisfy the inner rule.
    Optional(Box<Rule>),
    /// Token count must equal the integer held by a sibling field.
    CountOf(FieldPath),
    /// Integer, and strictly positive whenever `selector >= at_least`.
    PositiveWhen { selector: FieldPath, at_least: i64 },
    Custom(CustomRule),
}

impl Rule {
    pub fn optional(inner: Rule) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn count_of(group: impl Into<String>, field: impl Into<String>) -> Self {
        Self::CountOf(FieldPath::new(group, field))
    }

    pub fn custom(check: impl Fn(&str, &Values) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(check))
    }

    /// Evaluate against `value` and the sibling snapshot. A panicking custom
    /// rule counts as invalid.
    pub fn check(&self, value: &str, values: &Values) -> bool {
        match self {
            Rule::Any => true,
            Rule::Int => parse_int(value).is_some(),
            Rule::Float => parse_float(value).is_some(),
            Rule::OneOf(allowed) => parse_int(value).is_some_and(|v| allowed.contains(&v)),
            Rule::IntRange { min, max } => parse_int(value).is_some_and(|v| (*min..=*max).contains(&v)),
            Rule::Optional(inner) => value.trim().is_empty() || inner.check(value, values),
            Rule::CountOf(path) => match values.int(path) {
                Some(expected) if expected >= 0 => {
                    usize::try_from(expected).is_ok_and(|n| tokens(value).len() == n)
                }
                _ => false,
            },
            Rule::PositiveWhen { selector, at_least } => match parse_int(value) {
                Some(v) => values.int(selector).is_none_or(|s| s < *at_least) || v > 0,
                None => false,
            },
            Rule::Custom(check) => {
                panic::catch_unwind(AssertUnwindSafe(|| check(value, values))).unwrap_or(false)
            }
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Any => write!(f, "Any"),
            Rule::Int => write!(f, "Int"),
            Rule::Float => write!(f, "Float"),
            Rule::OneOf(allowed) => f.debug_tuple("OneOf").field(allowed).finish(),
            Rule::IntRange { min, max } => f
                .debug_struct("IntRange")
                .field("min", min)
                .field("max", max)
                .finish(),
            Rule::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Rule::CountOf(path) => write!(f, "CountOf({path})"),
            Rule::PositiveWhen { selector, at_least } => {
                write!(f, "PositiveWhen({selector} >= {at_least})")
            }
            Rule::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(group: &str, field: &str, value: &str) -> Values {
        let mut values = Values::new();
        values.insert(FieldPath::new(group, field), value);
        values
    }

    /// Verifies a count-bound list is valid iff its token count equals N,
    /// including N = 0.
    #[test]
    fn count_of_matches_token_count() {
        let rule = Rule::count_of("c2_1", "ntemp2_1");

        assert!(rule.check("300 600 900", &with("c2_1", "ntemp2_1", "3")));
        assert!(rule.check("300,600", &with("c2_1", "ntemp2_1", "2")));
        assert!(!rule.check("300 600", &with("c2_1", "ntemp2_1", "3")));
        assert!(rule.check("", &with("c2_1", "ntemp2_1", "0")));
        assert!(!rule.check("300", &with("c2_1", "ntemp2_1", "0")));
        assert!(!rule.check("300", &with("c2_1", "ntemp2_1", "-1")));
        assert!(!rule.check("300", &with("c2_1", "ntemp2_1", "x")));
        assert!(!rule.check("300", &Values::new()));
    }

    #[test]
    fn positive_when_only_binds_above_threshold() {
        let rule = Rule::PositiveWhen {
            selector: FieldPath::new("c2_1", "iin_1"),
            at_least: 2,
        };
        assert!(rule.check("0", &with("c2_1", "iin_1", "1")));
        assert!(!rule.check("0", &with("c2_1", "iin_1", "2")));
        assert!(rule.check("1301", &with("c2_1", "iin_1", "2")));
        assert!(!rule.check("abc", &with("c2_1", "iin_1", "1")));
    }

    #[test]
    fn optional_accepts_blank() {
        let rule = Rule::optional(Rule::Float);
        assert!(rule.check("", &Values::new()));
        assert!(rule.check("1.0d-3", &Values::new()));
        assert!(!rule.check("fast", &Values::new()));
    }

    #[test]
    fn panicking_custom_rule_fails_closed() {
        let rule = Rule::custom(|_, _| panic!("boom"));
        assert!(!rule.check("1", &Values::new()));
    }

    #[test]
    fn numeric_rules() {
        let values = Values::new();
        assert!(Rule::OneOf(vec![0, 1]).check("1", &values));
        assert!(!Rule::OneOf(vec![0, 1]).check("2", &values));
        assert!(Rule::IntRange { min: 1, max: 7 }.check("7", &values));
        assert!(!Rule::IntRange { min: 1, max: 7 }.check("8", &values));
        assert!(Rule::Int.check(" 20 ", &values));
        assert!(!Rule::Int.check("2.0", &values));
    }
}
