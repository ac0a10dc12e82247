//! Leaf unit of configuration.

use serde::{Deserialize, Serialize};

use crate::core::rule::Rule;
use crate::core::values::{Bounds, FieldPath, Values, format_number, parse_float, parse_int};

/// File role of a field that holds a unit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Input,
    Output,
}

/// How a value is projected onto the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Raw,
    /// Wrapped in single quotes unless already quoted.
    Quoted,
    /// Commas become spaces.
    List,
}

/// Token emitted in place of a blank value.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    Fixed(String),
    /// A sibling's numeric value multiplied by `factor`.
    Scaled { source: FieldPath, factor: f64 },
}

/// Value → label table shown next to a field.
pub type Choices = &'static [(&'static str, &'static str)];

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub description: String,
    pub reference: String,
    pub value: String,
    pub default: String,
    pub rule: Rule,
    pub role: Option<FileRole>,
    pub choices: Option<Choices>,
    /// Held and validated but never written.
    pub hidden: bool,
    /// Changing the value may change the module's group list.
    pub structural: bool,
    pub bounds: Option<Bounds>,
    pub format: Format,
    pub fallback: Option<Fallback>,
    pub valid: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, default: impl Into<String>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            description: String::new(),
            reference: String::new(),
            value: default.clone(),
            default,
            rule: Rule::Any,
            role: None,
            choices: None,
            hidden: false,
            structural: false,
            bounds: None,
            format: Format::Raw,
            fallback: None,
            valid: true,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = rule;
        self
    }

    pub fn input_file(mut self) -> Self {
        self.role = Some(FileRole::Input);
        self
    }

    pub fn output_file(mut self) -> Self {
        self.role = Some(FileRole::Output);
        self
    }

    pub fn choices(mut self, choices: Choices) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn structural(mut self) -> Self {
        self.structural = true;
        self
    }

    /// Integer count driving repetition; implies `structural`.
    pub fn count(mut self, bounds: Bounds) -> Self {
        self.structural = true;
        self.bounds = Some(bounds);
        self.rule = Rule::IntRange {
            min: bounds.min,
            max: bounds.max,
        };
        self
    }

    pub fn quoted(mut self) -> Self {
        self.format = Format::Quoted;
        self
    }

    pub fn list(mut self) -> Self {
        self.format = Format::List;
        self
    }

    pub fn or_else(mut self, token: impl Into<String>) -> Self {
        self.fallback = Some(Fallback::Fixed(token.into()));
        self
    }

    pub fn or_scaled(mut self, group: &str, field: &str, factor: f64) -> Self {
        self.fallback = Some(Fallback::Scaled {
            source: FieldPath::new(group, field),
            factor,
        });
        self
    }

    pub fn is_input_file(&self) -> bool {
        self.role == Some(FileRole::Input)
    }

    pub fn is_output_file(&self) -> bool {
        self.role == Some(FileRole::Output)
    }

    /// Re-run the rule and cache the result.
    pub fn validate(&mut self, values: &Values) -> bool {
        self.valid = self.rule.check(&self.value, values);
        self.valid
    }

    /// Value carried forward from a previous layout, or `None` to keep the
    /// default. Count fields are clamped to their bounds.
    pub fn carry(&self, previous: &str) -> Option<String> {
        match self.bounds {
            Some(bounds) => parse_int(previous).map(|v| bounds.clamp(v).to_string()),
            None => Some(previous.to_string()),
        }
    }

    /// Wire text for this field.
    pub fn project(&self, values: &Values) -> String {
        let raw = self.value.trim();
        let text = if raw.is_empty() {
            match &self.fallback {
                Some(Fallback::Fixed(token)) => token.clone(),
                Some(Fallback::Scaled { source, factor }) => values
                    .get(source)
                    .and_then(parse_float)
                    .map(|v| format_number(v * factor))
                    .unwrap_or_default(),
                None => String::new(),
            }
        } else {
            raw.to_string()
        };

        match self.format {
            Format::Raw => text,
            Format::Quoted => quote(&text),
            Format::List => text
                .replace(',', " ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    pub fn choice_label(&self) -> Option<&'static str> {
        let value = self.value.trim();
        self.choices?
            .iter()
            .find(|(key, _)| *key == value)
            .map(|(_, label)| *label)
    }
}

fn quote(text: &str) -> String {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        return text.to_string();
    }
    format!("'{}'", text.trim_matches(|c| c == '\'' || c == '"'))
}
