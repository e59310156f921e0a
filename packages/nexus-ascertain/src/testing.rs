use crate::io::nex::{nex_read_str, NexusReader};
use rstest::fixture;

pub const FIXTURE_NEX: &str = include_str!("../test_data/ascertainment.nex");

pub const FIXTURE_TAXA: [&str; 4] = ["ASLIAN_CheqWong", "ASLIAN_JahHut", "ASLIAN_Jahai", "ASLIAN_Kensiw"];

#[fixture]
pub fn nexus() -> NexusReader {
  nex_read_str(FIXTURE_NEX).unwrap()
}

#[fixture]
pub fn taxa() -> [&'static str; 4] {
  FIXTURE_TAXA
}
