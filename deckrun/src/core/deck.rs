//! Ordered module list and full-protocol serialization.

use std::collections::BTreeSet;
use std::fmt;

use crate::core::error::{ResolveError, SerializeError};
use crate::core::field::{Field, FileRole};
use crate::core::module::Module;
use crate::core::target::FieldTarget;
use crate::core::values::parse_int;

/// Sentinel line closing every serialized deck.
pub const STOP_TOKEN: &str = "stop";

#[derive(Debug, Clone, Default)]
pub struct Deck {
    modules: Vec<Module>,
}

/// A module that could not be serialized. Its place in the output holds a
/// marker line instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleError {
    pub index: usize,
    pub module: String,
    pub source: SerializeError,
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error in module {} ({}): {}",
            self.index + 1,
            self.module,
            self.source
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub errors: Vec<ModuleError>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_modules(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    pub fn module_mut(&mut self, index: usize) -> Option<&mut Module> {
        self.modules.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn push(&mut self, module: Module) {
        self.modules.push(module);
    }

    /// Insert at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, module: Module) {
        let index = index.min(self.modules.len());
        self.modules.insert(index, module);
    }

    pub fn remove(&mut self, index: usize) -> Option<Module> {
        (index < self.modules.len()).then(|| self.modules.remove(index))
    }

    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.modules.len() {
            return false;
        }
        self.modules.swap(index - 1, index);
        true
    }

    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.modules.len() {
            return false;
        }
        self.modules.swap(index, index + 1);
        true
    }

    pub fn resolve(&self, target: &FieldTarget) -> Result<&Field, ResolveError> {
        let module = self
            .modules
            .get(target.module)
            .ok_or(ResolveError::ModuleOutOfRange {
                index: target.module,
                len: self.modules.len(),
            })?;
        let group = module
            .group(&target.group)
            .ok_or_else(|| ResolveError::GroupNotFound {
                module: module.name().to_string(),
                group: target.group.clone(),
            })?;
        group
            .field(&target.field)
            .ok_or_else(|| ResolveError::FieldNotFound {
                module: module.name().to_string(),
                group: target.group.clone(),
                field: target.field.clone(),
            })
    }

    /// Set one value; see [`Module::set_value`].
    pub fn set_value(&mut self, target: &FieldTarget, value: &str) -> Result<bool, ResolveError> {
        let len = self.modules.len();
        self.modules
            .get_mut(target.module)
            .ok_or(ResolveError::ModuleOutOfRange {
                index: target.module,
                len,
            })?
            .set_value(&target.group, &target.field, value)
    }

    /// Revalidate every module; returns the invalid targets.
    pub fn validate(&mut self) -> Vec<FieldTarget> {
        self.modules
            .iter_mut()
            .enumerate()
            .flat_map(|(index, module)| {
                module
                    .validate()
                    .into_iter()
                    .map(move |path| FieldTarget::new(index, path.group, path.field))
            })
            .collect()
    }

    /// Every field of every active group, in deck order.
    pub fn targets(&self) -> Vec<FieldTarget> {
        self.modules
            .iter()
            .enumerate()
            .flat_map(|(index, module)| {
                module
                    .active_fields()
                    .into_iter()
                    .map(move |(group, field)| FieldTarget::new(index, &group.name, &field.name))
            })
            .collect()
    }

    /// Serialize every module followed by exactly one stop line. A module
    /// that fails is replaced by a marker line and reported in `errors`.
    pub fn render(&self) -> Rendered {
        let mut text = String::new();
        let mut errors = Vec::new();
        for (index, module) in self.modules.iter().enumerate() {
            match module.serialize() {
                Ok(block) => text.push_str(&block),
                Err(source) => {
                    let error = ModuleError {
                        index,
                        module: module.name().to_string(),
                        source,
                    };
                    text.push_str(&format!("-- {error}"));
                    errors.push(error);
                }
            }
            text.push('\n');
        }
        text.push_str(STOP_TOKEN);
        text.push('\n');
        Rendered { text, errors }
    }

    /// Input units that no earlier module produces, i.e. files that must be
    /// staged before invoking the engine. Unit 0 means "unused".
    pub fn external_inputs(&self) -> BTreeSet<i64> {
        let mut produced = BTreeSet::new();
        let mut external = BTreeSet::new();
        for module in &self.modules {
            for unit in module.units(FileRole::Input).into_iter().filter_map(parse_int) {
                let unit = unit.abs();
                if unit != 0 && !produced.contains(&unit) {
                    external.insert(unit);
                }
            }
            for unit in module.units(FileRole::Output).into_iter().filter_map(parse_int) {
                produced.insert(unit.abs());
            }
        }
        external
    }
}
