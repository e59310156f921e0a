use crate::matrix::character_matrix::CharacterMatrix;
use crate::utils::error::AscertainmentError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw lines of a NEXUS block, keyed by lowercase block name
pub type NexusBlocks = IndexMap<String, Vec<String>>;

/// Whether a document was read from an existing NEXUS file or is an output under construction
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum_macros::Display, Serialize, Deserialize)]
pub enum MatrixRole {
  #[strum(serialize = "NEXUS reader")]
  Reader,
  #[strum(serialize = "NEXUS writer")]
  Writer,
}

/// Read access to a character matrix and to the other blocks of the document it belongs to
pub trait NexusSource {
  fn role(&self) -> MatrixRole;

  fn matrix(&self) -> &CharacterMatrix;

  /// Raw blocks in document order. Each entry holds the block's full text lines, including its `begin` and `end`
  /// lines. A reader also lists the blocks its matrix was parsed from.
  fn blocks(&self) -> &NexusBlocks;
}

/// Fails unless the source has the requested role
pub fn require_role(source: &impl NexusSource, expected: MatrixRole) -> Result<(), AscertainmentError> {
  let actual = source.role();
  if actual == expected {
    Ok(())
  } else {
    Err(AscertainmentError::WrongRole { expected, actual })
  }
}
