//! Project files: the persisted deck as a JSON array of module records.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{instrument, warn};

use crate::core::deck::Deck;
use crate::core::document::{self, ModuleRecord};
use crate::core::registry::Registry;
use crate::io::write_json;

pub fn load_project(path: &Path) -> Result<Vec<ModuleRecord>> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Atomically write the deck's records to `path`.
pub fn write_project(path: &Path, deck: &Deck) -> Result<()> {
    write_json(path, &document::capture(deck))
}

/// Load and hydrate a project. Records of unknown module types are skipped;
/// their messages are returned alongside the deck.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn open_deck(path: &Path, registry: &Registry) -> Result<(Deck, Vec<String>)> {
    let records = load_project(path)?;
    let (deck, skipped) = document::hydrate(&records, registry);
    for message in &skipped {
        warn!("{message}");
    }
    Ok((deck, skipped))
}
