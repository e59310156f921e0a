use ctor::ctor;
use eyre::Report;
use log::info;
use nexus_ascertain::utils::global_init::global_init;
use nexus_ascertain_cli::cli::ascertain_cli::{
  generate_shell_completions, nexus_ascertain_parse_cli_args, NexusAscertainCommands,
};
use nexus_ascertain_cli::cli::run_ascertain::{run_ascertain_overall, run_ascertain_words, run_assumptions};

#[ctor]
fn init() {
  global_init();
}

fn main() -> Result<(), Report> {
  let args = nexus_ascertain_parse_cli_args()?;
  info!("{:#?}", &args);

  match args.command {
    NexusAscertainCommands::Words(words_args) => run_ascertain_words(&words_args),
    NexusAscertainCommands::Overall(overall_args) => run_ascertain_overall(&overall_args),
    NexusAscertainCommands::Assumptions(assumptions_args) => run_assumptions(&assumptions_args),
    NexusAscertainCommands::Completions { shell } => generate_shell_completions(shell),
  }
}
