use crate::cli::ascertain_cli::{
  NexusAscertainAssumptionsArgs, NexusAscertainIoArgs, NexusAscertainOverallArgs, NexusAscertainWordsArgs,
};
use eyre::{Report, WrapErr};
use log::{info, warn};
use nexus_ascertain::ascertainment::overall::add_ascertainment_overall;
use nexus_ascertain::ascertainment::words::{add_ascertainment_words_with, AscertainmentMode, WordAscertainmentOptions};
use nexus_ascertain::assumptions::charsets::{add_assumptions_with, charset_ranges, get_characters};
use nexus_ascertain::io::file::is_path_stdout;
use nexus_ascertain::io::fs::extension;
use nexus_ascertain::io::json::{json_write_file, JsonPretty};
use nexus_ascertain::io::nex::{nex_read_file, nex_write_file, NexWriteOptions, NexusReader, NexusWriter};

const NEXUS_EXTENSIONS: &[&str] = &["nex", "nexus", "nxs"];

pub fn run_ascertain_words(args: &NexusAscertainWordsArgs) -> Result<(), Report> {
  let NexusAscertainWordsArgs {
    io,
    presence,
    assumptions,
  } = args;

  let nexus = read_input(io)?;

  let options = WordAscertainmentOptions {
    mode: if *presence {
      AscertainmentMode::Presence
    } else {
      AscertainmentMode::Absence
    },
    delimiter: io.delimiter.clone(),
  };
  info!("Adding ascertainment characters for words (mode: {})", options.mode);
  let mut writer = add_ascertainment_words_with(&nexus, &options)?;

  if *assumptions {
    writer = add_assumptions_with(&writer, &io.delimiter)?;
  }

  write_output(io, &writer)
}

pub fn run_ascertain_overall(args: &NexusAscertainOverallArgs) -> Result<(), Report> {
  let NexusAscertainOverallArgs { io, assumptions } = args;

  let nexus = read_input(io)?;

  info!("Adding overall ascertainment character");
  let mut writer = add_ascertainment_overall(&nexus)?;

  if *assumptions {
    writer = add_assumptions_with(&writer, &io.delimiter)?;
  }

  write_output(io, &writer)
}

pub fn run_assumptions(args: &NexusAscertainAssumptionsArgs) -> Result<(), Report> {
  let NexusAscertainAssumptionsArgs { io, charsets_json } = args;

  let nexus = read_input(io)?;

  if let Some(charsets_json) = charsets_json {
    let ranges = charset_ranges(&get_characters(&nexus, &io.delimiter)?)?;
    json_write_file(charsets_json, &ranges, JsonPretty(true))
      .wrap_err_with(|| format!("When writing charsets to '{}'", charsets_json.display()))?;
  }

  let writer = add_assumptions_with(&nexus, &io.delimiter)?;
  write_output(io, &writer)
}

fn read_input(io: &NexusAscertainIoArgs) -> Result<NexusReader, Report> {
  info!("Reading '{}'", io.input.display());
  nex_read_file(&io.input)
}

fn write_output(io: &NexusAscertainIoArgs, writer: &NexusWriter) -> Result<(), Report> {
  let output = &io.output;
  if !is_path_stdout(output) {
    let is_nexus = extension(output).is_some_and(|ext| NEXUS_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
    if !is_nexus {
      warn!(
        "Output file '{}' does not have a NEXUS extension ({}). Writing NEXUS anyway.",
        output.display(),
        NEXUS_EXTENSIONS.join(", ")
      );
    }
  }
  info!("Writing '{}'", output.display());
  nex_write_file(output, writer, &NexWriteOptions::default())
}

#[cfg(test)]
mod tests {
  use super::*;
  use nexus_ascertain::io::fs::read_file_to_string;
  use nexus_ascertain::io::nex::nex_read_str;
  use nexus_ascertain::matrix::role::NexusSource;
  use pretty_assertions::assert_eq;
  use std::path::{Path, PathBuf};

  const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../nexus-ascertain/test_data/ascertainment.nex");

  fn tmp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join("nexus-ascertain-cli-tests").join(name)
  }

  fn io_args(output: &Path) -> NexusAscertainIoArgs {
    NexusAscertainIoArgs {
      input: PathBuf::from(FIXTURE),
      output: output.to_owned(),
      delimiter: "_".to_owned(),
    }
  }

  #[test]
  fn test_run_ascertain_words_with_assumptions() -> Result<(), Report> {
    let output = tmp_path("words.nex");
    run_ascertain_words(&NexusAscertainWordsArgs {
      io: io_args(&output),
      presence: false,
      assumptions: true,
    })?;

    let result = nex_read_str(read_file_to_string(&output)?)?;
    assert_eq!(
      result.matrix().labels().collect::<Vec<_>>(),
      vec![
        "bear_0",
        "bear_1",
        "bodyhairfeathers_0",
        "bodyhairfeathers_1",
        "many_0",
        "many_1",
        "many_2",
        "many_3",
        "many_4",
        "many_74",
        "skinbark_0",
        "skinbark_1",
        "skinbark_2",
      ]
    );
    assert_eq!(
      result.block("assumptions"),
      Some(
        [
          "begin assumptions;",
          "charset bear = 1-2;",
          "charset bodyhairfeathers = 3-4;",
          "charset many = 5-10;",
          "charset skinbark = 11-13;",
          "end;",
        ]
        .map(str::to_owned)
        .as_slice()
      )
    );
    Ok(())
  }

  #[test]
  fn test_run_ascertain_overall() -> Result<(), Report> {
    let output = tmp_path("overall.nex");
    run_ascertain_overall(&NexusAscertainOverallArgs {
      io: io_args(&output),
      assumptions: false,
    })?;

    let result = nex_read_str(read_file_to_string(&output)?)?;
    assert_eq!(result.matrix().nchar(), 10);
    assert_eq!(result.matrix().labels().last(), Some("_ascertainment"));
    assert_eq!(result.block("assumptions"), None);
    Ok(())
  }

  #[test]
  fn test_run_assumptions_writes_charsets_json() -> Result<(), Report> {
    let output = tmp_path("assumptions.nex");
    let charsets_json = tmp_path("charsets.json");
    run_assumptions(&NexusAscertainAssumptionsArgs {
      io: io_args(&output),
      charsets_json: Some(charsets_json.clone()),
    })?;

    let json: serde_json::Value = serde_json::from_str(&read_file_to_string(&charsets_json)?)?;
    assert_eq!(
      json,
      serde_json::json!([
        { "word": "bear", "start": 1, "end": 1 },
        { "word": "bodyhairfeathers", "start": 2, "end": 2 },
        { "word": "many", "start": 3, "end": 7 },
        { "word": "skinbark", "start": 8, "end": 9 },
      ])
    );

    let result = nex_read_str(read_file_to_string(&output)?)?;
    assert_eq!(result.matrix().nchar(), 9);
    Ok(())
  }
}
