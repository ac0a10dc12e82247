//! Value snapshots and the text parsing helpers shared by rules, predicates
//! and module schemas.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a field inside one module: `group.field`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPath {
    pub group: String,
    pub field: String,
}

impl FieldPath {
    pub fn new(group: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.field)
    }
}

/// Immutable snapshot of every field value of a module, keyed by path.
///
/// Activation predicates, validation rules and schemas only ever see a
/// snapshot, never the live groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    entries: BTreeMap<FieldPath, String>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: FieldPath, value: impl Into<String>) {
        self.entries.insert(path, value.into());
    }

    pub fn get(&self, path: &FieldPath) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn lookup(&self, group: &str, field: &str) -> Option<&str> {
        self.get(&FieldPath::new(group, field))
    }

    pub fn int(&self, path: &FieldPath) -> Option<i64> {
        self.get(path).and_then(parse_int)
    }

    /// Repetition count read from `group.field`, normalized by `bounds`.
    pub fn count(&self, group: &str, field: &str, bounds: Bounds) -> usize {
        usize::try_from(bounds.resolve(self.lookup(group, field))).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &str)> {
        self.entries.iter().map(|(path, value)| (path, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(FieldPath, String)> for Values {
    fn from_iter<T: IntoIterator<Item = (FieldPath, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Inclusive integer range for count fields.
///
/// Unparseable text resolves to `min`; out-of-range integers clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }

    pub fn resolve(&self, text: Option<&str>) -> i64 {
        text.and_then(parse_int)
            .map_or(self.min, |value| self.clamp(value))
    }
}

pub fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

/// Parse a float, accepting Fortran `d`/`D` exponents (`1.0d-5`).
pub fn parse_float(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(['d', 'D'], "e");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok()
}

/// Split a list value on whitespace and commas, dropping empty tokens.
pub fn tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Format a computed number as a protocol token, rounded to 12 significant
/// digits.
pub fn format_number(value: f64) -> String {
    let value: f64 = format!("{value:.11e}").parse().unwrap_or(value);
    if value == 0.0 {
        return "0.0".to_string();
    }
    let magnitude = value.abs();
    if (1e-4..1e7).contains(&magnitude) {
        let text = format!("{value}");
        if text.contains('.') {
            text
        } else {
            format!("{text}.0")
        }
    } else {
        format!("{value:e}")
    }
}
