pub mod ascertain_cli;
pub mod run_ascertain;
