use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::{generate, Shell};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use eyre::Report;
use log::LevelFilter;
use nexus_ascertain::labels::parse_word::DEFAULT_DELIMITER;
use nexus_ascertain::utils::global_init::setup_logger;
use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

const VERBOSITIES: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

#[derive(Parser, Debug)]
#[clap(name = "nexus-ascertain")]
#[clap(author, version)]
#[clap(verbatim_doc_comment)]
/// Add ascertainment characters and charset assumptions to NEXUS character matrices
///
/// Characters are expected to be labelled '<word>_<number>', for example 'hand_1', 'hand_2', or
/// '<word>_u_<number>' for characters unique to one language, for example 'hand_u_3'.
pub struct NexusAscertainArgs {
  #[clap(subcommand)]
  pub command: NexusAscertainCommands,

  /// Make output more quiet or more verbose
  #[clap(flatten)]
  pub verbose: Verbosity<WarnLevel>,

  /// Set verbosity level
  #[clap(long, global = true, conflicts_with = "verbose", conflicts_with = "silent")]
  #[clap(value_parser = PossibleValuesParser::new(VERBOSITIES).map(|s| s.parse::<LevelFilter>().unwrap()))]
  pub verbosity: Option<LevelFilter>,

  /// Disable all console output. Same as --verbosity=off
  #[clap(long, global = true, conflicts_with = "verbose", conflicts_with = "verbosity")]
  pub silent: bool,
}

#[derive(Subcommand, Debug)]
#[clap(verbatim_doc_comment)]
pub enum NexusAscertainCommands {
  /// Insert an ascertainment character '<word>_0' before the characters of every word.
  ///
  /// A taxon is coded as missing ('?') in the new character if all of its states for the word are missing.
  Words(NexusAscertainWordsArgs),

  /// Append a single ascertainment character '_ascertainment', absent ('0') in every taxon.
  Overall(NexusAscertainOverallArgs),

  /// Add an assumptions block declaring a charset for every word.
  Assumptions(NexusAscertainAssumptionsArgs),

  /// Generate shell completions.
  ///
  /// This will print the completions file contents to the console. Refer to your shell's documentation on how to install the completions.
  ///
  /// Example for Ubuntu Linux:
  ///
  ///    nexus-ascertain completions bash > ~/.local/share/bash-completion/nexus-ascertain
  ///
  Completions {
    /// Name of the shell to generate appropriate completions
    #[clap(value_name = "SHELL", value_enum, default_value_t = Shell::Bash)]
    shell: Shell,
  },
}

#[derive(Args, Debug)]
pub struct NexusAscertainIoArgs {
  /// Path to input NEXUS file
  ///
  /// Omit this argument or use special value "-" to read from standard input (stdin).
  #[clap(value_hint = ValueHint::FilePath)]
  #[clap(default_value = "-")]
  pub input: PathBuf,

  /// Path to output NEXUS file
  ///
  /// Omit this argument or use special value "-" to write to standard output (stdout).
  #[clap(long, short = 'o')]
  #[clap(value_hint = ValueHint::AnyPath)]
  #[clap(default_value = "-")]
  pub output: PathBuf,

  /// Separates the word from the suffix in character labels
  #[clap(long, short = 'd')]
  #[clap(default_value = DEFAULT_DELIMITER)]
  pub delimiter: String,
}

#[derive(Args, Debug)]
pub struct NexusAscertainWordsArgs {
  #[clap(flatten)]
  pub io: NexusAscertainIoArgs,

  /// Code taxa with at least one present state for a word as present ('1') instead of absent ('0')
  #[clap(long)]
  pub presence: bool,

  /// Also add an assumptions block declaring a charset for every word, ascertainment character included
  #[clap(long)]
  pub assumptions: bool,
}

#[derive(Args, Debug)]
pub struct NexusAscertainOverallArgs {
  #[clap(flatten)]
  pub io: NexusAscertainIoArgs,

  /// Also add an assumptions block declaring a charset for every word
  #[clap(long)]
  pub assumptions: bool,
}

#[derive(Args, Debug)]
pub struct NexusAscertainAssumptionsArgs {
  #[clap(flatten)]
  pub io: NexusAscertainIoArgs,

  /// Also write the charset ranges as JSON to this file
  #[clap(long)]
  #[clap(value_hint = ValueHint::AnyPath)]
  pub charsets_json: Option<PathBuf>,
}

pub fn generate_shell_completions(shell: Shell) -> Result<(), Report> {
  let mut command = NexusAscertainArgs::command();
  let bin_name = command.get_name().to_owned();
  generate(shell, &mut command, bin_name, &mut io::stdout());
  Ok(())
}

pub fn nexus_ascertain_parse_cli_args() -> Result<NexusAscertainArgs, Report> {
  let args = NexusAscertainArgs::parse();

  // --verbosity=<level> and --silent take priority over -v and -q
  let filter_level = if args.silent {
    LevelFilter::Off
  } else {
    match args.verbosity {
      None => args.verbose.log_level_filter(),
      Some(verbosity) => verbosity,
    }
  };

  setup_logger(filter_level);

  Ok(args)
}
