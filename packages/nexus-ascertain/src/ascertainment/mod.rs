pub mod overall;
pub mod words;

use crate::io::nex::NexusWriter;
use log::warn;

/// Blocks referring to characters by index, which no longer match once columns are inserted
const STALE_BLOCKS: &[&str] = &["assumptions", "sets"];

fn drop_stale_blocks(writer: &mut NexusWriter) {
  for name in STALE_BLOCKS {
    if writer.remove_block(name).is_some() {
      warn!("Dropping NEXUS block '{name}': its character indices do not match the matrix with ascertainment characters");
    }
  }
}
