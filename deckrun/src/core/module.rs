//! One processing step: an ordered group list produced by a schema.
//!
//! The schema is a pure function from a value snapshot to a fresh group list
//! with default values. [`Module::rebuild`] calls it with the current values
//! and copies forward every value whose field still exists, which is how
//! count fields and mode selectors change the module's cardinality.

use std::fmt;
use std::sync::Arc;

use crate::core::error::{ResolveError, SerializeError};
use crate::core::field::{Field, FileRole};
use crate::core::group::Group;
use crate::core::values::{FieldPath, Values};

/// Upper bound on rebuild rounds in [`Module::hydrate`]; one per level of
/// count fields nested inside repeated groups.
const MAX_HYDRATE_PASSES: usize = 8;

/// Produces the group layout implied by a value snapshot.
pub trait Schema: Send + Sync {
    fn groups(&self, values: &Values) -> Vec<Group>;
}

#[derive(Clone)]
pub struct Module {
    type_tag: String,
    name: String,
    description: String,
    reference: String,
    groups: Vec<Group>,
    schema: Arc<dyn Schema>,
}

impl Module {
    /// Build a module with the schema's default layout.
    pub fn new(
        type_tag: impl Into<String>,
        name: impl Into<String>,
        schema: impl Schema + 'static,
    ) -> Self {
        let schema: Arc<dyn Schema> = Arc::new(schema);
        let groups = schema.groups(&Values::new());
        let mut module = Self {
            type_tag: type_tag.into(),
            name: name.into(),
            description: String::new(),
            reference: String::new(),
            groups,
            schema,
        };
        // Defaults may already imply a different layout (e.g. a floor above the
        // schema's empty-snapshot count).
        module.rebuild();
        module
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Protocol token written before the module's lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn field(&self, group: &str, field: &str) -> Option<&Field> {
        self.group(group)?.field(field)
    }

    /// Direct mutable access. Editing a structural field this way leaves the
    /// layout stale until [`Module::rebuild`] runs.
    pub fn field_mut(&mut self, group: &str, field: &str) -> Option<&mut Field> {
        self.groups
            .iter_mut()
            .find(|g| g.name == group)?
            .field_mut(field)
    }

    /// Snapshot of every field value, visible or not.
    pub fn values(&self) -> Values {
        self.groups
            .iter()
            .flat_map(|group| {
                group.fields.iter().map(|field| {
                    (
                        FieldPath::new(&group.name, &field.name),
                        field.value.clone(),
                    )
                })
            })
            .collect()
    }

    /// Whether the current values imply a different group layout.
    pub fn needs_rebuild(&self) -> bool {
        let expected = self.schema.groups(&self.values());
        !same_layout(&self.groups, &expected)
    }

    /// Regenerate the group list from current values, carrying forward the
    /// values of fields that still exist. Idempotent.
    pub fn rebuild(&mut self) {
        let prior = self.values();
        let mut groups = self.schema.groups(&prior);
        for group in &mut groups {
            for field in &mut group.fields {
                if let Some(previous) = prior.lookup(&group.name, &field.name)
                    && let Some(carried) = field.carry(previous)
                {
                    field.value = carried;
                }
            }
        }
        self.groups = groups;
        self.validate();
    }

    /// Set one value, rebuilding when the field is structural or the layout
    /// changed. Returns whether a rebuild happened.
    pub fn set_value(
        &mut self,
        group: &str,
        field: &str,
        value: impl Into<String>,
    ) -> Result<bool, ResolveError> {
        let module = self.name.clone();
        let target_group = self
            .groups
            .iter_mut()
            .find(|g| g.name == group)
            .ok_or_else(|| ResolveError::GroupNotFound {
                module: module.clone(),
                group: group.to_string(),
            })?;
        let target = target_group
            .field_mut(field)
            .ok_or_else(|| ResolveError::FieldNotFound {
                module,
                group: group.to_string(),
                field: field.to_string(),
            })?;
        target.value = value.into();
        let structural = target.structural;

        if structural || self.needs_rebuild() {
            self.rebuild();
            Ok(true)
        } else {
            self.validate();
            Ok(false)
        }
    }

    /// Write every value whose path exists in the current layout, without
    /// rebuilding. Returns how many were applied.
    pub fn apply_values(&mut self, values: &Values) -> usize {
        let mut applied = 0;
        for group in &mut self.groups {
            for field in &mut group.fields {
                if let Some(value) = values.lookup(&group.name, &field.name) {
                    field.value = value.to_string();
                    applied += 1;
                }
            }
        }
        applied
    }

    /// Load a saved value set: apply, then rebuild and apply again until the
    /// layout settles, so counts nested inside repeated groups land too.
    pub fn hydrate(&mut self, values: &Values) -> usize {
        let mut applied = self.apply_values(values);
        for _ in 0..MAX_HYDRATE_PASSES {
            if !self.needs_rebuild() {
                break;
            }
            self.rebuild();
            applied = self.apply_values(values);
        }
        self.validate();
        applied
    }

    /// Recompute every field's `valid` flag. Fields of inactive groups are
    /// exempt and report valid. Returns the invalid paths.
    pub fn validate(&mut self) -> Vec<FieldPath> {
        let values = self.values();
        let mut invalid = Vec::new();
        for group in &mut self.groups {
            let active = group.is_active(&values).unwrap_or(false);
            for field in &mut group.fields {
                if !active {
                    field.valid = true;
                } else if !field.validate(&values) {
                    invalid.push(FieldPath::new(&group.name, &field.name));
                }
            }
        }
        invalid
    }

    /// Paths whose cached `valid` flag is false.
    pub fn invalid_fields(&self) -> Vec<FieldPath> {
        self.groups
            .iter()
            .flat_map(|group| {
                group
                    .fields
                    .iter()
                    .filter(|field| !field.valid)
                    .map(|field| FieldPath::new(&group.name, &field.name))
            })
            .collect()
    }

    /// Module name line followed by one line per active group.
    pub fn serialize(&self) -> Result<String, SerializeError> {
        if self.needs_rebuild() {
            return Err(SerializeError::StaleLayout {
                module: self.name.clone(),
            });
        }
        let values = self.values();
        let mut lines = vec![self.name.clone()];
        for group in &self.groups {
            let line = group
                .serialize(&values)
                .map_err(|source| SerializeError::Activation {
                    module: self.name.clone(),
                    group: group.name.clone(),
                    source,
                })?;
            lines.extend(line);
        }
        Ok(lines.join("\n"))
    }

    /// Fields of active groups, in wire order.
    pub fn active_fields(&self) -> Vec<(&Group, &Field)> {
        let values = self.values();
        self.groups
            .iter()
            .filter(|group| group.is_active(&values).unwrap_or(false))
            .flat_map(|group| group.fields.iter().map(move |field| (group, field)))
            .collect()
    }

    /// Raw unit values of active fields carrying `role`.
    pub fn units(&self, role: FileRole) -> Vec<&str> {
        self.active_fields()
            .into_iter()
            .filter(|(_, field)| field.role == Some(role))
            .map(|(_, field)| field.value.as_str())
            .collect()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("type_tag", &self.type_tag)
            .field("name", &self.name)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

fn same_layout(current: &[Group], expected: &[Group]) -> bool {
    current.len() == expected.len()
        && current.iter().zip(expected).all(|(a, b)| {
            a.name == b.name
                && a.fields.len() == b.fields.len()
                && a.fields.iter().zip(&b.fields).all(|(x, y)| x.name == y.name)
        })
}
