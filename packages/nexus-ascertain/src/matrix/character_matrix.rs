use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Symbol for a state which was not observed
pub const MISSING_STATE: &str = "?";

/// Symbol for the absent state
pub const ABSENT_STATE: &str = "0";

/// Symbol for the present state
pub const PRESENT_STATE: &str = "1";

/// States of one character, keyed by taxon name
pub type CharacterStates = IndexMap<String, String>;

/// Taxa x characters table of discrete state symbols.
///
/// Characters are stored by label in their column order. Every character holds a state for every taxon: taxa and
/// characters added later are back-filled with `MISSING_STATE`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterMatrix {
  taxa: IndexSet<String>,
  characters: IndexMap<String, CharacterStates>,
}

impl CharacterMatrix {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_taxa<I, S>(taxa: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut matrix = Self::new();
    for taxon in taxa {
      matrix.add_taxon(taxon);
    }
    matrix
  }

  pub fn taxa(&self) -> impl Iterator<Item = &str> {
    self.taxa.iter().map(String::as_str)
  }

  pub fn labels(&self) -> impl Iterator<Item = &str> {
    self.characters.keys().map(String::as_str)
  }

  pub fn characters(&self) -> impl Iterator<Item = (&str, &CharacterStates)> {
    self.characters.iter().map(|(label, states)| (label.as_str(), states))
  }

  pub fn ntax(&self) -> usize {
    self.taxa.len()
  }

  pub fn nchar(&self) -> usize {
    self.characters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.characters.is_empty()
  }

  pub fn contains(&self, label: &str) -> bool {
    self.characters.contains_key(label)
  }

  pub fn character(&self, label: &str) -> Option<&CharacterStates> {
    self.characters.get(label)
  }

  pub fn get(&self, label: &str, taxon: &str) -> Option<&str> {
    self.characters.get(label)?.get(taxon).map(String::as_str)
  }

  /// Registers a taxon. Existing characters receive a missing state for it.
  pub fn add_taxon(&mut self, taxon: impl AsRef<str>) {
    let taxon = taxon.as_ref();
    if self.taxa.insert(taxon.to_owned()) {
      for states in self.characters.values_mut() {
        states.insert(taxon.to_owned(), MISSING_STATE.to_owned());
      }
    }
  }

  /// Appends an all-missing character after the last column. No-op if the label exists.
  pub fn add_character(&mut self, label: impl AsRef<str>) {
    let label = label.as_ref();
    if !self.characters.contains_key(label) {
      let states = self.missing_states();
      self.characters.insert(label.to_owned(), states);
    }
  }

  /// Sets a state, creating the character and the taxon if needed
  pub fn set(&mut self, label: impl AsRef<str>, taxon: impl AsRef<str>, state: impl AsRef<str>) {
    let (label, taxon) = (label.as_ref(), taxon.as_ref());
    self.add_taxon(taxon);
    self.add_character(label);
    if let Some(states) = self.characters.get_mut(label) {
      states.insert(taxon.to_owned(), state.as_ref().to_owned());
    }
  }

  /// Appends a complete character. States of taxa unknown to the matrix register those taxa.
  pub fn push_character(&mut self, label: impl AsRef<str>, states: CharacterStates) {
    let label = label.as_ref();
    self.add_character(label);
    for (taxon, state) in states {
      self.set(label, taxon, state);
    }
  }

  /// Distinct state symbols in first-seen order, excluding the missing and gap symbols
  pub fn symbols(&self) -> Vec<String> {
    self
      .characters
      .values()
      .flat_map(|states| states.values())
      .filter(|state| state.as_str() != MISSING_STATE && state.as_str() != "-")
      .unique()
      .cloned()
      .collect_vec()
  }

  fn missing_states(&self) -> CharacterStates {
    self
      .taxa
      .iter()
      .map(|taxon| (taxon.clone(), MISSING_STATE.to_owned()))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_character_matrix_backfills_missing_for_new_taxa() {
    let mut matrix = CharacterMatrix::with_taxa(["A", "B"]);
    matrix.set("hand_1", "A", "1");
    matrix.set("hand_1", "C", "0");

    assert_eq!(matrix.taxa().collect_vec(), vec!["A", "B", "C"]);
    assert_eq!(matrix.get("hand_1", "A"), Some("1"));
    assert_eq!(matrix.get("hand_1", "B"), Some("?"));
    assert_eq!(matrix.get("hand_1", "C"), Some("0"));
  }

  #[test]
  fn test_character_matrix_backfills_missing_for_new_characters() {
    let mut matrix = CharacterMatrix::new();
    matrix.set("hand_1", "A", "1");
    matrix.add_taxon("B");
    matrix.add_character("hand_2");

    assert_eq!(matrix.labels().collect_vec(), vec!["hand_1", "hand_2"]);
    assert_eq!(matrix.get("hand_1", "B"), Some("?"));
    assert_eq!(matrix.get("hand_2", "A"), Some("?"));
    assert_eq!(matrix.nchar(), 2);
    assert_eq!(matrix.ntax(), 2);
  }

  #[test]
  fn test_character_matrix_symbols() {
    let mut matrix = CharacterMatrix::new();
    matrix.set("a_1", "A", "1");
    matrix.set("a_1", "B", "?");
    matrix.set("a_2", "A", "0");
    matrix.set("a_2", "B", "-");
    matrix.set("a_3", "A", "1");

    assert_eq!(matrix.symbols(), vec!["1", "0"]);
  }
}
