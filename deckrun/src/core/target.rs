//! Deck-wide field addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::TargetParseError;
use crate::core::values::FieldPath;

/// A field addressed by module position, group name and field name.
///
/// `module` is zero-based; the textual form `<n>:<group>.<field>` uses the
/// one-based position shown to users.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldTarget {
    pub module: usize,
    pub group: String,
    pub field: String,
}

impl FieldTarget {
    pub fn new(module: usize, group: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            module,
            group: group.into(),
            field: field.into(),
        }
    }

    pub fn path(&self) -> FieldPath {
        FieldPath::new(&self.group, &self.field)
    }
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.module + 1, self.group, self.field)
    }
}

impl FromStr for FieldTarget {
    type Err = TargetParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let (module, path) = text
            .split_once(':')
            .ok_or_else(|| TargetParseError::Malformed(text.to_string()))?;
        let (group, field) = path
            .split_once('.')
            .ok_or_else(|| TargetParseError::Malformed(text.to_string()))?;
        if group.is_empty() || field.is_empty() {
            return Err(TargetParseError::Malformed(text.to_string()));
        }
        let position: usize = module
            .trim()
            .parse()
            .map_err(|_| TargetParseError::BadModule(module.to_string()))?;
        if position == 0 {
            return Err(TargetParseError::BadModule(module.to_string()));
        }
        Ok(Self::new(position - 1, group, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_based_module_position() {
        let target: FieldTarget = "2:c4_1.temp_1".parse().expect("parse");
        assert_eq!(target, FieldTarget::new(1, "c4_1", "temp_1"));
        assert_eq!(target.to_string(), "2:c4_1.temp_1");
    }

    #[test]
    fn rejects_malformed_targets() {
        assert!(matches!(
            "c1.nin".parse::<FieldTarget>(),
            Err(TargetParseError::Malformed(_))
        ));
        assert!(matches!(
            "0:c1.nin".parse::<FieldTarget>(),
            Err(TargetParseError::BadModule(_))
        ));
        assert!(matches!(
            "1:c1".parse::<FieldTarget>(),
            Err(TargetParseError::Malformed(_))
        ));
    }
}
