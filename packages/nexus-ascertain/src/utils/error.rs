#![allow(clippy::pub_use)]

use crate::matrix::role::MatrixRole;
use eyre::Report;
use thiserror::Error;

/// Failures of the matrix transformations. These are wrapped into `eyre::Report` like every other error in the crate,
/// and can be recovered with `report.downcast_ref::<AscertainmentError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AscertainmentError {
  #[error("Unable to parse character label '{label}': expected '<word>{delimiter}<number>' or '<word>{delimiter}u{delimiter}<number>'")]
  LabelParse { label: String, delimiter: String },

  #[error("Expected a {expected} but received a {actual}")]
  WrongRole { expected: MatrixRole, actual: MatrixRole },

  #[error("Character matrix has no characters")]
  NoCharacters,

  #[error("Character label '{label}' uses the suffix '{suffix}' which is reserved for ascertainment characters")]
  ReservedSuffix { label: String, suffix: String },

  #[error("Characters of '{word}' are not contiguous: {positions:?}")]
  NonContiguous { word: String, positions: Vec<usize> },

  #[error("Delimiter '{delimiter}' not found in any character label")]
  DelimiterNotFound { delimiter: String },
}

/// Extracts the domain error kind from a report, if the report carries one anywhere in its chain
pub fn ascertainment_error(report: &Report) -> Option<&AscertainmentError> {
  report
    .chain()
    .find_map(|cause| cause.downcast_ref::<AscertainmentError>())
}

#[macro_export(local_inner_macros)]
macro_rules! make_error {
  ($($arg:tt)*) => {
    {
      Err(eyre::eyre!(std::format!($($arg)*)))
    }
  };
}

pub use make_error;

#[macro_export(local_inner_macros)]
macro_rules! make_report {
  ($($arg:tt)*) => {
    {
      eyre::eyre!($($arg)*)
    }
  };
}

pub use make_report;

#[macro_export(local_inner_macros)]
macro_rules! make_internal_report {
  ($($arg:tt)*) => {
    {
      let msg_external = std::format!($($arg)*);
      let msg = std::format!("{msg_external}. This is an internal error. Please report it to developers.");
      eyre::eyre!(msg)
    }
  };
}

pub use make_internal_report;

#[cfg(test)]
mod tests {
  use super::*;
  use eyre::WrapErr;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_ascertainment_error_survives_context() {
    let report: Result<(), Report> = Err(AscertainmentError::NoCharacters.into());
    let report = report.wrap_err("When adding ascertainment characters").unwrap_err();
    assert_eq!(ascertainment_error(&report), Some(&AscertainmentError::NoCharacters));
    assert_eq!(
      report.chain().map(|cause| cause.to_string()).collect::<Vec<_>>(),
      vec!["When adding ascertainment characters", "Character matrix has no characters"]
    );
  }

  #[test]
  fn test_ascertainment_error_absent_in_plain_report() {
    let report = make_report!("Something else");
    assert_eq!(ascertainment_error(&report), None);
  }
}
