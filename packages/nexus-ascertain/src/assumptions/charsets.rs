use crate::io::nex::NexusWriter;
use crate::make_error;
use crate::matrix::role::NexusSource;
use crate::utils::error::AscertainmentError;
use crate::utils::string::nexus_token;
use eyre::{Report, WrapErr};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Zero-based column positions of characters, grouped by the label prefix they share
pub type CharacterPositions = IndexMap<String, Vec<usize>>;

/// Contiguous, inclusive, 1-based range of columns belonging to one word
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumptionRange {
  pub word: String,
  pub start: usize,
  pub end: usize,
}

impl AssumptionRange {
  pub fn from_positions(word: impl AsRef<str>, positions: &[usize]) -> Result<Self, AscertainmentError> {
    let word = word.as_ref();
    match (positions.first(), positions.last()) {
      (Some(&first), Some(&last)) if is_sequential(positions) => Ok(Self {
        word: word.to_owned(),
        start: first + 1,
        end: last + 1,
      }),
      _ => Err(AscertainmentError::NonContiguous {
        word: word.to_owned(),
        positions: positions.to_vec(),
      }),
    }
  }
}

impl Display for AssumptionRange {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let word = nexus_token(&self.word);
    if self.start == self.end {
      write!(f, "charset {word} = {};", self.start)
    } else {
      write!(f, "charset {word} = {}-{};", self.start, self.end)
    }
  }
}

/// Groups column positions by everything before the last occurrence of `delimiter` in the label. Labels without the
/// delimiter form a group of their own, keyed by the whole label. Fails if no label contains the delimiter.
pub fn get_characters(source: &impl NexusSource, delimiter: &str) -> Result<CharacterPositions, Report> {
  if delimiter.is_empty() {
    return make_error!("Character label delimiter must not be empty");
  }

  let mut positions = CharacterPositions::new();
  let mut found = false;
  for (index, label) in source.matrix().labels().enumerate() {
    let word = match label.rsplit_once(delimiter) {
      Some((word, _)) => {
        found = true;
        word
      }
      None => label,
    };
    positions.entry(word.to_owned()).or_default().push(index);
  }

  if !found {
    return Err(
      AscertainmentError::DelimiterNotFound {
        delimiter: delimiter.to_owned(),
      }
      .into(),
    );
  }

  Ok(positions)
}

/// Whether every element is one greater than the previous one
pub fn is_sequential(seq: &[usize]) -> bool {
  seq.iter().tuple_windows().all(|(prev, next)| *next == prev + 1)
}

pub fn charset_ranges(positions: &CharacterPositions) -> Result<Vec<AssumptionRange>, Report> {
  positions
    .iter()
    .map(|(word, positions)| AssumptionRange::from_positions(word, positions).map_err(Report::from))
    .collect()
}

/// Renders one `charset` declaration per word, in order
pub fn create_assumptions(positions: &CharacterPositions) -> Result<Vec<String>, Report> {
  Ok(
    charset_ranges(positions)?
      .iter()
      .map(AssumptionRange::to_string)
      .collect_vec(),
  )
}

/// Returns a copy of the document with an `assumptions` block declaring a charset for every word
pub fn add_assumptions(source: &impl NexusSource) -> Result<NexusWriter, Report> {
  add_assumptions_with(source, crate::labels::parse_word::DEFAULT_DELIMITER)
}

pub fn add_assumptions_with(source: &impl NexusSource, delimiter: &str) -> Result<NexusWriter, Report> {
  let positions = get_characters(source, delimiter).wrap_err("When grouping characters for assumptions")?;
  let charsets = create_assumptions(&positions).wrap_err("When creating assumptions")?;

  info!("Adding assumptions block with {} charsets", charsets.len());

  let mut writer = NexusWriter::from_source(source);
  if writer.add_block("assumptions", &charsets).is_some() {
    warn!("Replacing existing assumptions block");
  }
  Ok(writer)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ascertainment::overall::add_ascertainment_overall;
  use crate::ascertainment::words::add_ascertainment_words;
  use crate::io::json::{json_write_str, JsonPretty};
  use crate::io::nex::{nex_read_str, NexWriteOptions, NexusReader};
  use crate::testing::nexus;
  use crate::utils::error::ascertainment_error;
  use indoc::indoc;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  #[case(&[1, 2, 3, 4, 5], true)]
  #[case(&[3, 4, 5, 6, 7], true)]
  #[case(&[4], true)]
  #[case(&[], true)]
  #[case(&[1, 3], false)]
  #[case(&[2, 1], false)]
  #[case(&[1, 1], false)]
  fn test_is_sequential(#[case] seq: &[usize], #[case] expected: bool) {
    assert_eq!(is_sequential(seq), expected);
  }

  #[rstest]
  fn test_get_characters_simple(nexus: NexusReader) {
    let chars = get_characters(&nexus, "_").unwrap();
    assert_eq!(chars.keys().collect_vec(), vec!["bear", "bodyhairfeathers", "many", "skinbark"]);
    assert_eq!(chars["bear"], vec![0]);
    assert_eq!(chars["bodyhairfeathers"], vec![1]);
    assert_eq!(chars["many"], vec![2, 3, 4, 5, 6]);
    assert_eq!(chars["skinbark"], vec![7, 8]);
  }

  #[rstest]
  fn test_get_characters_delim(nexus: NexusReader) {
    let chars = get_characters(&nexus, "a").unwrap();
    assert_eq!(chars["be"], vec![0]);
    assert_eq!(chars["bodyhairfe"], vec![1]);
    assert_eq!(chars["m"], vec![2, 3, 4, 5, 6]);
    assert_eq!(chars["skinb"], vec![7, 8]);
  }

  #[rstest]
  fn test_get_characters_error(nexus: NexusReader) {
    let report = get_characters(&nexus, "X").unwrap_err();
    assert_eq!(
      ascertainment_error(&report),
      Some(&AscertainmentError::DelimiterNotFound {
        delimiter: "X".to_owned(),
      })
    );
  }

  #[test]
  fn test_get_characters_keeps_labels_without_delimiter() {
    let nexus = nex_read_str(indoc! {r#"
      #NEXUS
      begin data;
        dimensions ntax=2 nchar=3;
        charlabels bear_1 misc bear_2;
        matrix
          A 010
          B 1?0
        ;
      end;
    "#})
    .unwrap();

    let chars = get_characters(&nexus, "_").unwrap();
    assert_eq!(chars.keys().collect_vec(), vec!["bear", "misc"]);
    assert_eq!(chars["bear"], vec![0, 2]);
    assert_eq!(chars["misc"], vec![1]);
  }

  #[test]
  fn test_get_characters_fails_on_empty_matrix() {
    let report = get_characters(&NexusWriter::new(), "_").unwrap_err();
    assert_eq!(
      ascertainment_error(&report),
      Some(&AscertainmentError::DelimiterNotFound { delimiter: "_".to_owned() })
    );
  }

  #[rstest]
  fn test_create_assumptions(nexus: NexusReader) {
    let assumptions = create_assumptions(&get_characters(&nexus, "_").unwrap()).unwrap();
    assert_eq!(
      assumptions,
      vec![
        "charset bear = 1;",
        "charset bodyhairfeathers = 2;",
        "charset many = 3-7;",
        "charset skinbark = 8-9;",
      ]
    );
  }

  #[test]
  fn test_create_assumptions_fails_on_gap() {
    let positions = CharacterPositions::from([("hand".to_owned(), vec![0, 1]), ("foot".to_owned(), vec![2, 4])]);
    let report = create_assumptions(&positions).unwrap_err();
    assert_eq!(
      ascertainment_error(&report),
      Some(&AscertainmentError::NonContiguous {
        word: "foot".to_owned(),
        positions: vec![2, 4],
      })
    );
  }

  #[test]
  fn test_create_assumptions_fails_on_empty_group() {
    let positions = CharacterPositions::from([("hand".to_owned(), vec![])]);
    assert!(create_assumptions(&positions).is_err());
  }

  #[rstest]
  fn test_add_assumpts(nexus: NexusReader) {
    let written = add_assumptions(&nexus)
      .unwrap()
      .write(&NexWriteOptions::default())
      .unwrap();
    let nex = nex_read_str(written).unwrap();
    assert_eq!(
      nex.block("assumptions").unwrap(),
      [
        "begin assumptions;",
        "charset bear = 1;",
        "charset bodyhairfeathers = 2;",
        "charset many = 3-7;",
        "charset skinbark = 8-9;",
        "end;",
      ]
    );
  }

  #[rstest]
  fn test_add_assumpts_after_words(nexus: NexusReader) {
    let nexus = add_ascertainment_words(&nexus).unwrap();
    let written = add_assumptions(&nexus)
      .unwrap()
      .write(&NexWriteOptions::default())
      .unwrap();
    let nex = nex_read_str(written).unwrap();
    assert_eq!(
      nex.block("assumptions").unwrap(),
      [
        "begin assumptions;",
        "charset bear = 1-2;",
        "charset bodyhairfeathers = 3-4;",
        "charset many = 5-10;",
        "charset skinbark = 11-13;",
        "end;",
      ]
    );
  }

  #[rstest]
  fn test_add_assumpts_after_overall(nexus: NexusReader) {
    let nexus = add_ascertainment_overall(&nexus).unwrap();
    let writer = add_assumptions(&nexus).unwrap();
    assert_eq!(
      writer.blocks()["assumptions"].last().map(String::as_str),
      Some("end;")
    );
    assert_eq!(writer.blocks()["assumptions"][5], "charset '' = 10;");
  }

  #[rstest]
  fn test_add_assumpts_replaces_existing_block(nexus: NexusReader) {
    let nexus = add_assumptions(&nexus).unwrap();
    let nexus = add_assumptions(&nexus).unwrap();
    assert_eq!(nexus.blocks().len(), 1);
    assert_eq!(nexus.blocks()["assumptions"].len(), 6);
  }

  #[rstest]
  fn test_add_ascertainment_drops_stale_assumptions(nexus: NexusReader) {
    let with_assumptions = add_assumptions(&nexus).unwrap();
    let reread = nex_read_str(with_assumptions.write(&NexWriteOptions::default()).unwrap()).unwrap();
    let output = add_ascertainment_words(&reread).unwrap();
    assert!(output.blocks().get("assumptions").is_none());
  }

  #[rstest]
  fn test_charset_ranges_serialize(nexus: NexusReader) {
    let ranges = charset_ranges(&get_characters(&nexus, "_").unwrap()).unwrap();
    let json = json_write_str(&ranges[2], JsonPretty(false)).unwrap();
    assert_eq!(json, r#"{"word":"many","start":3,"end":7}"#);
  }
}
