use crate::io::nex::NexusWriter;
use crate::labels::get_words::get_words_with;
use crate::labels::parse_word::{WordParser, DEFAULT_DELIMITER};
use crate::make_internal_report;
use crate::matrix::character_matrix::{CharacterMatrix, ABSENT_STATE, MISSING_STATE, PRESENT_STATE};
use crate::matrix::role::{require_role, MatrixRole, NexusSource};
use crate::utils::error::AscertainmentError;
use eyre::{Report, WrapErr};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Suffix of the ascertainment character added to every word. Existing characters must not use it.
pub const ASCERTAINMENT_SUFFIX: &str = "0";

/// How the state of a word's ascertainment character is derived from the states of the word's characters
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum_macros::Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AscertainmentMode {
  /// Absent (`0`) for every taxon with data for the word. The column is invariant, as required for correcting
  /// ascertainment bias.
  #[default]
  Absence,

  /// Present (`1`) for taxa with at least one state other than absent or missing, absent otherwise
  Presence,
}

#[derive(Clone, Debug, SmartDefault)]
pub struct WordAscertainmentOptions {
  pub mode: AscertainmentMode,

  /// Separates the word from the suffix in character labels
  #[default(DEFAULT_DELIMITER.to_owned())]
  pub delimiter: String,
}

/// Inserts an ascertainment character `<word>_0` before the first character of every word
pub fn add_ascertainment_words(source: &impl NexusSource) -> Result<NexusWriter, Report> {
  add_ascertainment_words_with(source, &WordAscertainmentOptions::default())
}

/// Inserts an ascertainment character before the first character of every word.
///
/// A taxon gets `?` in the new character when all of its states for the word are missing, otherwise the state
/// is given by `options.mode`. Characters keep their relative order. The input is not modified: the result is a
/// new writer holding a copy of the matrix.
pub fn add_ascertainment_words_with(
  source: &impl NexusSource,
  options: &WordAscertainmentOptions,
) -> Result<NexusWriter, Report> {
  require_role(source, MatrixRole::Reader).wrap_err("When adding ascertainment characters for words")?;

  let matrix = source.matrix();
  if matrix.is_empty() {
    return Err(AscertainmentError::NoCharacters.into());
  }

  let parser = WordParser::new(&options.delimiter)?;

  for label in matrix.labels() {
    if parser.parse(label)?.suffix == ASCERTAINMENT_SUFFIX {
      return Err(
        AscertainmentError::ReservedSuffix {
          label: label.to_owned(),
          suffix: ASCERTAINMENT_SUFFIX.to_owned(),
        }
        .into(),
      );
    }
  }

  let words = get_words_with(matrix.labels(), &parser)?;
  let word_of_label: IndexMap<&str, &str> = words
    .iter()
    .flat_map(|(word, labels)| labels.iter().map(move |label| (label.as_str(), word.as_str())))
    .collect();

  let mut result = CharacterMatrix::with_taxa(matrix.taxa());
  let mut seen = IndexSet::<&str>::new();
  for label in matrix.labels() {
    let word = word_of_label
      .get(label)
      .copied()
      .ok_or_else(|| make_internal_report!("Character '{label}' is not assigned to a word"))?;

    if seen.insert(word) {
      let labels = &words[word];
      let ascertainment_label = parser.label(word, ASCERTAINMENT_SUFFIX);
      let states = matrix
        .taxa()
        .map(|taxon| {
          let state = ascertainment_state(matrix, labels, taxon, options.mode);
          (taxon.to_owned(), state.to_owned())
        })
        .collect();
      debug!("Adding ascertainment character '{ascertainment_label}' for {} characters", labels.len());
      result.push_character(ascertainment_label, states);
    }

    let states = matrix
      .character(label)
      .ok_or_else(|| make_internal_report!("Character '{label}' not found in matrix"))?;
    result.push_character(label, states.clone());
  }

  info!(
    "Added {} ascertainment characters ({} mode) to {} characters",
    words.len(),
    options.mode,
    matrix.nchar()
  );

  let mut writer = NexusWriter::from_source(source);
  super::drop_stale_blocks(&mut writer);
  *writer.matrix_mut() = result;
  Ok(writer)
}

fn ascertainment_state(
  matrix: &CharacterMatrix,
  labels: &[String],
  taxon: &str,
  mode: AscertainmentMode,
) -> &'static str {
  let states = labels
    .iter()
    .map(|label| matrix.get(label, taxon).unwrap_or(MISSING_STATE))
    .collect::<Vec<_>>();

  if states.iter().all(|&state| state == MISSING_STATE) {
    return MISSING_STATE;
  }

  match mode {
    AscertainmentMode::Absence => ABSENT_STATE,
    AscertainmentMode::Presence => {
      if states
        .iter()
        .any(|&state| state != MISSING_STATE && state != ABSENT_STATE)
      {
        PRESENT_STATE
      } else {
        ABSENT_STATE
      }
    }
  }
}
