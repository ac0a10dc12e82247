//! Type tag → module factory.

use crate::core::module::Module;

pub type Factory = fn() -> Module;

/// Insertion-ordered registry of module factories. Tags match
/// case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<(&'static str, Factory)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `tag`, replacing an earlier entry with the
    /// same tag.
    pub fn register(&mut self, tag: &'static str, factory: Factory) -> &mut Self {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(tag))
        {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((tag, factory)),
        }
        self
    }

    /// Fresh module with default values, or `None` for an unknown tag.
    pub fn create(&self, tag: &str) -> Option<Module> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(tag))
            .map(|(_, factory)| factory())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(tag))
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(tag, _)| *tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::Field;
    use crate::core::group::Group;
    use crate::core::module::Schema;
    use crate::core::values::Values;

    struct One;

    impl Schema for One {
        fn groups(&self, _values: &Values) -> Vec<Group> {
            vec![Group::new("c1", "Only").with(Field::new("x", "1"))]
        }
    }

    fn one() -> Module {
        Module::new("ONE", "one", One)
    }

    #[test]
    fn create_is_case_insensitive_and_fresh() {
        let mut registry = Registry::new();
        registry.register("ONE", one);

        let mut first = registry.create("one").expect("known tag");
        first.set_value("c1", "x", "9").expect("set");
        let second = registry.create("ONE").expect("known tag");

        assert_eq!(second.field("c1", "x").expect("x").value, "1");
        assert!(registry.create("two").is_none());
        assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["ONE"]);
    }
}
