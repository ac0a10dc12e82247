//! Ordered fields that serialize to one protocol line.

use crate::core::condition::Condition;
use crate::core::error::ConditionError;
use crate::core::field::Field;
use crate::core::values::Values;

/// Line terminator of the positional protocol.
pub const LINE_END: char = '/';

#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub description: String,
    pub reference: String,
    pub fields: Vec<Field>,
    /// `None` means always active.
    pub activation: Option<Condition>,
}

impl Group {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            reference: String::new(),
            fields: Vec::new(),
            activation: None,
        }
    }

    /// Single constant token closing a repeated section (`0/`).
    pub fn terminator(name: impl Into<String>, token: &str) -> Self {
        Self::new(name, "End of input").with(
            Field::new("terminator", token).describe("Terminates the module input"),
        )
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn active_if(mut self, condition: Condition) -> Self {
        self.activation = Some(condition);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    pub fn is_active(&self, values: &Values) -> Result<bool, ConditionError> {
        match &self.activation {
            Some(condition) => condition.evaluate(values),
            None => Ok(true),
        }
    }

    /// Protocol line, or `None` when the group is inactive or holds no
    /// visible fields.
    pub fn serialize(&self, values: &Values) -> Result<Option<String>, ConditionError> {
        if !self.is_active(values)? {
            return Ok(None);
        }
        let tokens: Vec<String> = self
            .fields
            .iter()
            .filter(|field| !field.hidden)
            .map(|field| field.project(values))
            .collect();
        if tokens.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!("{}{LINE_END}", tokens.join(" "))))
    }
}
