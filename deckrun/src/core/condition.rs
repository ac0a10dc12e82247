//! Group activation predicates.
//!
//! A predicate is a pure function of a [`Values`] snapshot. A missing or
//! unparseable operand makes the predicate false.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::core::error::ConditionError;
use crate::core::values::{FieldPath, Values};

type CustomCondition = Arc<dyn Fn(&Values) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Condition {
    AtLeast { path: FieldPath, min: i64 },
    Equals { path: FieldPath, value: i64 },
    In { path: FieldPath, values: Vec<i64> },
    /// Parseable and different from `value`.
    NotEquals { path: FieldPath, value: i64 },
    /// `min <= |value| <= max`
    AbsBetween { path: FieldPath, min: i64, max: i64 },
    All(Vec<Condition>),
    Custom(CustomCondition),
}

impl Condition {
    pub fn at_least(group: impl Into<String>, field: impl Into<String>, min: i64) -> Self {
        Self::AtLeast {
            path: FieldPath::new(group, field),
            min,
        }
    }

    pub fn equals(group: impl Into<String>, field: impl Into<String>, value: i64) -> Self {
        Self::Equals {
            path: FieldPath::new(group, field),
            value,
        }
    }

    pub fn one_of(group: impl Into<String>, field: impl Into<String>, values: &[i64]) -> Self {
        Self::In {
            path: FieldPath::new(group, field),
            values: values.to_vec(),
        }
    }

    pub fn not_equals(group: impl Into<String>, field: impl Into<String>, value: i64) -> Self {
        Self::NotEquals {
            path: FieldPath::new(group, field),
            value,
        }
    }

    pub fn abs_between(
        group: impl Into<String>,
        field: impl Into<String>,
        min: i64,
        max: i64,
    ) -> Self {
        Self::AbsBetween {
            path: FieldPath::new(group, field),
            min,
            max,
        }
    }

    pub fn custom(check: impl Fn(&Values) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(check))
    }

    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::All(mut all) => {
                all.push(other);
                Condition::All(all)
            }
            first => Condition::All(vec![first, other]),
        }
    }

    pub fn evaluate(&self, values: &Values) -> Result<bool, ConditionError> {
        match self {
            Condition::AtLeast { path, min } => Ok(values.int(path).is_some_and(|v| v >= *min)),
            Condition::Equals { path, value } => Ok(values.int(path) == Some(*value)),
            Condition::In { path, values: allowed } => {
                Ok(values.int(path).is_some_and(|v| allowed.contains(&v)))
            }
            Condition::NotEquals { path, value } => {
                Ok(values.int(path).is_some_and(|v| v != *value))
            }
            Condition::AbsBetween { path, min, max } => Ok(values
                .int(path)
                .is_some_and(|v| (*min..=*max).contains(&v.abs()))),
            Condition::All(all) => {
                for condition in all {
                    if !condition.evaluate(values)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Custom(check) => panic::catch_unwind(AssertUnwindSafe(|| check(values)))
                .map_err(|_| ConditionError::Panicked),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::AtLeast { path, min } => write!(f, "{path} >= {min}"),
            Condition::Equals { path, value } => write!(f, "{path} == {value}"),
            Condition::In { path, values } => write!(f, "{path} in {values:?}"),
            Condition::NotEquals { path, value } => write!(f, "{path} != {value}"),
            Condition::AbsBetween { path, min, max } => write!(f, "{min} <= |{path}| <= {max}"),
            Condition::All(all) => f.debug_list().entries(all).finish(),
            Condition::Custom(_) => write!(f, "custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str, &str)]) -> Values {
        pairs
            .iter()
            .map(|(group, field, value)| (FieldPath::new(*group, *field), (*value).to_string()))
            .collect()
    }

    #[test]
    fn missing_or_unparseable_operand_is_false() {
        let condition = Condition::at_least("c1", "ngrid", 1);
        assert_eq!(condition.evaluate(&Values::new()), Ok(false));
        assert_eq!(condition.evaluate(&values(&[("c1", "ngrid", "many")])), Ok(false));
        assert_eq!(condition.evaluate(&values(&[("c1", "ngrid", "2")])), Ok(true));
    }

    #[test]
    fn abs_between_uses_magnitude() {
        let condition = Condition::abs_between("c1", "nin", 1, 19);
        assert_eq!(condition.evaluate(&values(&[("c1", "nin", "-1")])), Ok(true));
        assert_eq!(condition.evaluate(&values(&[("c1", "nin", "20")])), Ok(false));
    }

    #[test]
    fn all_requires_every_branch() {
        let condition =
            Condition::equals("c2", "iopt", 1).and(Condition::equals("c7", "thinning", 1));
        assert_eq!(
            condition.evaluate(&values(&[("c2", "iopt", "1"), ("c7", "thinning", "0")])),
            Ok(false)
        );
        assert_eq!(
            condition.evaluate(&values(&[("c2", "iopt", "1"), ("c7", "thinning", "1")])),
            Ok(true)
        );
    }

    #[test]
    fn membership_and_inequality_need_a_number() {
        let one_of = Condition::one_of("c2", "ign", &[1, 19]);
        let nonzero = Condition::not_equals("c1", "nstan", 0);
        assert_eq!(one_of.evaluate(&values(&[("c2", "ign", "19")])), Ok(true));
        assert_eq!(one_of.evaluate(&values(&[("c2", "ign", "2")])), Ok(false));
        assert_eq!(nonzero.evaluate(&values(&[("c1", "nstan", "0")])), Ok(false));
        assert_eq!(nonzero.evaluate(&values(&[("c1", "nstan", "-")])), Ok(false));
        assert_eq!(nonzero.evaluate(&values(&[("c1", "nstan", "25")])), Ok(true));
    }

    #[test]
    fn panicking_predicate_is_an_error() {
        let condition = Condition::custom(|_| panic!("bad predicate"));
        assert_eq!(
            condition.evaluate(&Values::new()),
            Err(ConditionError::Panicked)
        );
    }
}
