//! Persisted project shape: `[{ "type": TAG, "cards": { group: { field: value } } }]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::deck::Deck;
use crate::core::module::Module;
use crate::core::registry::Registry;
use crate::core::values::{FieldPath, Values};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub cards: BTreeMap<String, BTreeMap<String, Value>>,
}

impl ModuleRecord {
    pub fn capture(module: &Module) -> Self {
        let mut cards: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
        for (path, value) in module.values().iter() {
            cards
                .entry(path.group.clone())
                .or_default()
                .insert(path.field.clone(), Value::String(value.to_string()));
        }
        Self {
            type_tag: module.type_tag().to_string(),
            cards,
        }
    }

    /// Saved values as text; numbers keep their JSON spelling.
    pub fn values(&self) -> Values {
        self.cards
            .iter()
            .flat_map(|(group, fields)| {
                fields
                    .iter()
                    .map(move |(field, value)| (FieldPath::new(group, field), value_text(value)))
            })
            .collect()
    }
}

pub fn capture(deck: &Deck) -> Vec<ModuleRecord> {
    deck.modules().iter().map(ModuleRecord::capture).collect()
}

/// Rebuild a deck from saved records. Records with unknown tags are skipped
/// and reported.
pub fn hydrate(records: &[ModuleRecord], registry: &Registry) -> (Deck, Vec<String>) {
    let mut deck = Deck::new();
    let mut skipped = Vec::new();
    for (position, record) in records.iter().enumerate() {
        match registry.create(&record.type_tag) {
            Some(mut module) => {
                module.hydrate(&record.values());
                deck.push(module);
            }
            None => skipped.push(format!(
                "record {}: unknown module type '{}'",
                position + 1,
                record.type_tag
            )),
        }
    }
    (deck, skipped)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
