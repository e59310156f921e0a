use crate::io::nex::NexusWriter;
use crate::matrix::character_matrix::ABSENT_STATE;
use crate::matrix::role::{require_role, MatrixRole, NexusSource};
use eyre::{Report, WrapErr};
use log::info;

/// Label of the character added by `add_ascertainment_overall`
pub const OVERALL_ASCERTAINMENT_LABEL: &str = "_ascertainment";

/// Appends a single invariant character, absent in every taxon, after the last column.
///
/// The input is not modified: the result is a new writer holding a copy of the matrix.
pub fn add_ascertainment_overall(source: &impl NexusSource) -> Result<NexusWriter, Report> {
  require_role(source, MatrixRole::Reader).wrap_err("When adding overall ascertainment character")?;

  let mut writer = NexusWriter::from_source(source);
  super::drop_stale_blocks(&mut writer);

  let taxa = source.matrix().taxa().map(str::to_owned).collect::<Vec<_>>();
  let matrix = writer.matrix_mut();
  matrix.add_character(OVERALL_ASCERTAINMENT_LABEL);
  for taxon in &taxa {
    matrix.set(OVERALL_ASCERTAINMENT_LABEL, taxon, ABSENT_STATE);
  }

  info!(
    "Added overall ascertainment character '{OVERALL_ASCERTAINMENT_LABEL}' for {} taxa",
    taxa.len()
  );

  Ok(writer)
}
