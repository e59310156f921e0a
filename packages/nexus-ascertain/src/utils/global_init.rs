use crate::io::fs::filename_maybe;
use chrono::{SecondsFormat, Utc};
use color_eyre::owo_colors::OwoColorize;
use env_logger::Env;
use log::{Level, LevelFilter, Record};
use std::io::Write;

/// One-letter level tag, e.g. `[W]`
fn level_tag(level: Level) -> String {
  let tag = level.as_str().chars().next().unwrap_or_default();
  let tag = match level {
    Level::Error => tag.red().to_string(),
    Level::Warn => tag.yellow().to_string(),
    Level::Info => tag.cyan().to_string(),
    Level::Debug | Level::Trace => tag.dimmed().to_string(),
  };
  format!("[{tag}]")
}

fn source_location(record: &Record) -> String {
  match (record.file().and_then(filename_maybe), record.line()) {
    (Some(file), Some(line)) => format!("{file}:{line}:"),
    (Some(file), None) => format!("{file}:"),
    _ => String::new(),
  }
}

/// Installs the global logger. `filter_level` takes priority over `RUST_LOG`.
pub fn setup_logger(filter_level: LevelFilter) {
  env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
    .filter_level(filter_level)
    .format(|buf, record| {
      let date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
      writeln!(
        buf,
        "{} {} {} {}",
        date.dimmed(),
        level_tag(record.level()),
        source_location(record).dimmed(),
        record.args()
      )
    })
    .init();
}

/// Installs colored error reports and panic messages
pub fn global_init() {
  color_eyre::config::HookBuilder::default()
    .display_env_section(false)
    .panic_section(format!(
      "If you think it's a bug, consider reporting at: '{}/issues'",
      env!("CARGO_PKG_REPOSITORY"),
    ))
    .install()
    .expect("color_eyre initialization failed");
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_source_location() {
    let record = Record::builder()
      .file(Some("packages/nexus-ascertain/src/io/nex.rs"))
      .line(Some(12))
      .build();
    assert_eq!(source_location(&record), "nex.rs:12:");
    assert_eq!(source_location(&Record::builder().build()), "");
  }
}
