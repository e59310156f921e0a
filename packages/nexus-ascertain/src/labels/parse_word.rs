use crate::utils::error::AscertainmentError;
use eyre::{Report, WrapErr};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DEFAULT_DELIMITER: &str = "_";

/// Character label split into the word it codes for and the suffix distinguishing it from the word's other
/// characters. Suffixes are numeric (`hand_3`), or carry a `u` marker for characters unique to one language
/// (`hand_u_3`, `hand_u3`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordLabel {
  pub word: String,
  pub suffix: String,
  pub is_unique: bool,
}

/// Splits labels of the form `<word><delimiter><suffix>`.
///
/// The word may itself contain the delimiter (`One_Hundred_16`), so the split happens at the first delimiter after
/// which the remainder is a complete suffix.
#[derive(Clone, Debug)]
pub struct WordParser {
  delimiter: String,
  regex: Regex,
}

impl WordParser {
  pub fn new(delimiter: impl AsRef<str>) -> Result<Self, Report> {
    let delimiter = delimiter.as_ref().to_owned();
    let d = regex::escape(&delimiter);
    let pattern = format!(r"^(?P<word>.+?){d}(?P<suffix>(?P<unique>u(?:{d})?)?\d+)$");
    let regex = Regex::new(&pattern).wrap_err_with(|| format!("When compiling regular expression '{pattern}'"))?;
    Ok(Self { delimiter, regex })
  }

  pub fn delimiter(&self) -> &str {
    &self.delimiter
  }

  pub fn parse(&self, label: impl AsRef<str>) -> Result<WordLabel, AscertainmentError> {
    let label = label.as_ref();
    let captures = self
      .regex
      .captures(label)
      .ok_or_else(|| AscertainmentError::LabelParse {
        label: label.to_owned(),
        delimiter: self.delimiter.clone(),
      })?;

    Ok(WordLabel {
      word: captures["word"].to_owned(),
      suffix: captures["suffix"].to_owned(),
      is_unique: captures.name("unique").is_some(),
    })
  }

  /// Label of a character belonging to `word`
  pub fn label(&self, word: impl AsRef<str>, suffix: impl AsRef<str>) -> String {
    format!("{}{}{}", word.as_ref(), self.delimiter, suffix.as_ref())
  }
}

impl Default for WordParser {
  fn default() -> Self {
    DEFAULT_PARSER.clone()
  }
}

#[allow(clippy::expect_used)]
static DEFAULT_PARSER: LazyLock<WordParser> =
  LazyLock::new(|| WordParser::new(DEFAULT_DELIMITER).expect("default word pattern is valid"));

/// Parses a label using the default `_` delimiter
pub fn parse_word(label: impl AsRef<str>) -> Result<WordLabel, Report> {
  Ok(DEFAULT_PARSER.parse(label)?)
}

/// Parses a label using a custom delimiter
pub fn parse_word_with(label: impl AsRef<str>, delimiter: impl AsRef<str>) -> Result<WordLabel, Report> {
  Ok(WordParser::new(delimiter)?.parse(label)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::utils::error::ascertainment_error;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rustfmt::skip]
  #[rstest]
  #[case("One_1",                   "One",              "1",      false)]
  #[case("One_13",                  "One",              "13",     false)]
  #[case("One_u_21",                "One",              "u_21",   true )]
  #[case("One_u21",                 "One",              "u21",    true )]
  #[case("One_Hundred_16",          "One_Hundred",      "16",     false)]
  #[case("One_Hundred_u_16",        "One_Hundred",      "u_16",   true )]
  #[case("One_Hundred_u16",         "One_Hundred",      "u16",    true )]
  #[case("Eight_u_3569",            "Eight",            "u_3569", true )]
  #[case("Eight_u3569",             "Eight",            "u3569",  true )]
  #[case("correct_true_u_5631",     "correct_true",     "u_5631", true )]
  #[case("correct_true_u5631",      "correct_true",     "u5631",  true )]
  #[case("to_tie_up_fasten_u_5685", "to_tie_up_fasten", "u_5685", true )]
  #[case("to_tie_up_fasten_u5685",  "to_tie_up_fasten", "u5685",  true )]
  #[case("emu_u_2",                 "emu",              "u_2",    true )]
  fn test_parse_word(#[case] label: &str, #[case] word: &str, #[case] suffix: &str, #[case] is_unique: bool) {
    let actual = parse_word(label).unwrap();
    assert_eq!(
      actual,
      WordLabel {
        word: word.to_owned(),
        suffix: suffix.to_owned(),
        is_unique
      }
    );
  }

  #[rstest]
  #[case("Eight")]
  #[case("Eight_")]
  #[case("_1")]
  #[case("Eight_x1")]
  #[case("_ascertainment")]
  fn test_parse_word_fails_on_malformed_label(#[case] label: &str) {
    let report = parse_word(label).unwrap_err();
    assert!(matches!(
      ascertainment_error(&report),
      Some(AscertainmentError::LabelParse { .. })
    ));
  }

  #[test]
  fn test_parse_word_fails_on_foreign_delimiter() {
    let report = parse_word_with("Eight_569", "X").unwrap_err();
    assert_eq!(
      ascertainment_error(&report),
      Some(&AscertainmentError::LabelParse {
        label: "Eight_569".to_owned(),
        delimiter: "X".to_owned()
      })
    );
  }

  #[test]
  fn test_parse_word_with_custom_delimiter() {
    let actual = parse_word_with("One.Hundred.u.16", ".").unwrap();
    assert_eq!(actual.word, "One.Hundred");
    assert_eq!(actual.suffix, "u.16");
    assert!(actual.is_unique);
  }

  #[test]
  fn test_word_parser_label() {
    let parser = WordParser::default();
    assert_eq!(parser.label("One_Hundred", "0"), "One_Hundred_0");
  }
}
