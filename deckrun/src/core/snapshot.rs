//! Pre-job capture of every field value in a deck.

use crate::core::deck::Deck;
use crate::core::error::RestoreError;
use crate::core::values::Values;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleState {
    type_tag: String,
    values: Values,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    modules: Vec<ModuleState>,
}

impl Snapshot {
    pub fn capture(deck: &Deck) -> Self {
        Self {
            modules: deck
                .modules()
                .iter()
                .map(|module| ModuleState {
                    type_tag: module.type_tag().to_string(),
                    values: module.values(),
                })
                .collect(),
        }
    }

    /// Write every captured value back, rebuilding modules whose layout
    /// changed, and verify each captured field exists again.
    pub fn restore(&self, deck: &mut Deck) -> Result<(), RestoreError> {
        if deck.len() != self.modules.len() {
            return Err(RestoreError::ModuleCountChanged {
                expected: self.modules.len(),
                found: deck.len(),
            });
        }
        for (index, state) in self.modules.iter().enumerate() {
            let Some(module) = deck.module_mut(index) else {
                return Err(RestoreError::ModuleCountChanged {
                    expected: self.modules.len(),
                    found: index,
                });
            };
            if module.type_tag() != state.type_tag {
                return Err(RestoreError::ModuleReplaced {
                    index,
                    expected: state.type_tag.clone(),
                    found: module.type_tag().to_string(),
                });
            }
            module.hydrate(&state.values);
            for (path, _) in state.values.iter() {
                if module.field(&path.group, &path.field).is_none() {
                    return Err(RestoreError::FieldMissing {
                        index,
                        path: path.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::Field;
    use crate::core::group::Group;
    use crate::core::module::{Module, Schema};
    use crate::core::target::FieldTarget;
    use crate::core::values::Bounds;

    const MATS: Bounds = Bounds::new(1, 4);

    struct Mats;

    impl Schema for Mats {
        fn groups(&self, values: &Values) -> Vec<Group> {
            let n = values.count("c1", "nmat", MATS);
            let mut groups =
                vec![Group::new("c1", "Count").with(Field::new("nmat", n.to_string()).count(MATS))];
            for i in 1..=n {
                groups.push(
                    Group::new(format!("c2_{i}"), "Material")
                        .with(Field::new(format!("mat_{i}"), "125")),
                );
            }
            groups
        }
    }

    fn deck() -> Deck {
        let mut module = Module::new("MATS", "mats", Mats);
        module.set_value("c1", "nmat", "3").expect("set");
        module.set_value("c2_3", "mat_3", "9228").expect("set");
        Deck::from_modules(vec![module])
    }

    #[test]
    fn restore_undoes_structural_changes() {
        let mut deck = deck();
        let snapshot = Snapshot::capture(&deck);

        deck.set_value(&FieldTarget::new(0, "c1", "nmat"), "1").expect("shrink");
        deck.set_value(&FieldTarget::new(0, "c2_1", "mat_1"), "1001").expect("set");
        assert!(deck.resolve(&FieldTarget::new(0, "c2_3", "mat_3")).is_err());

        snapshot.restore(&mut deck).expect("restore");

        assert_eq!(Snapshot::capture(&deck), snapshot);
        assert_eq!(
            deck.resolve(&FieldTarget::new(0, "c2_3", "mat_3")).expect("mat_3").value,
            "9228"
        );
    }

    /// Verifies restore rebuilds through counts nested in repeated groups
    /// (RECONR materials, then comment cards per material).
    #[test]
    fn restore_handles_nested_counts() {
        let mut reconr = crate::modules::reconr::module();
        reconr.set_value("c2", "nmat", "2").expect("nmat");
        reconr.set_value("c3_2", "ncards_2", "2").expect("ncards_2");
        reconr.set_value("comment_2_1", "cards5_2_1", "second").expect("comment");
        let mut deck = Deck::from_modules(vec![reconr]);
        let before = deck.render();
        let snapshot = Snapshot::capture(&deck);

        deck.set_value(&FieldTarget::new(0, "c2", "nmat"), "1").expect("shrink");
        assert!(deck.resolve(&FieldTarget::new(0, "comment_2_1", "cards5_2_1")).is_err());

        snapshot.restore(&mut deck).expect("restore");

        assert_eq!(deck.render(), before);
        assert!(deck.render().errors.is_empty());
        assert_eq!(Snapshot::capture(&deck), snapshot);
    }

    #[test]
    fn restore_rejects_replaced_module() {
        let mut deck = deck();
        let snapshot = Snapshot::capture(&deck);
        deck.remove(0);
        assert_eq!(
            snapshot.restore(&mut deck),
            Err(RestoreError::ModuleCountChanged {
                expected: 1,
                found: 0
            })
        );
    }
}
