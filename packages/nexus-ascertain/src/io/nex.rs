use crate::io::file::create_file_or_stdout;
use crate::io::fs::read_file_to_string;
use crate::matrix::character_matrix::{CharacterMatrix, MISSING_STATE};
use crate::matrix::role::{MatrixRole, NexusBlocks, NexusSource};
use crate::utils::string::nexus_token;
use crate::{make_error, make_report};
use eyre::{Report, WrapErr};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info, warn};
use regex::Regex;
use smart_default::SmartDefault;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

const NEXUS_HEADER: &str = "#NEXUS";

/// Blocks holding character data
const DATA_BLOCKS: &[&str] = &["data", "characters"];

/// Blocks which are regenerated from the matrix on write
const MATRIX_BLOCKS: &[&str] = &["taxa", "data", "characters"];

/// Parsed NEXUS document: the character matrix of its `data` (or `characters`) block, and every block as raw lines
#[derive(Clone, Debug, Default)]
pub struct NexusReader {
  matrix: CharacterMatrix,
  blocks: NexusBlocks,
}

impl NexusReader {
  /// Commands of a block, each terminated with `;`, including its `begin` and `end` commands
  pub fn block(&self, name: &str) -> Option<&[String]> {
    self.blocks.get(&name.to_lowercase()).map(Vec::as_slice)
  }

  #[cfg(test)]
  pub(crate) fn matrix_mut(&mut self) -> &mut CharacterMatrix {
    &mut self.matrix
  }
}

impl NexusSource for NexusReader {
  fn role(&self) -> MatrixRole {
    MatrixRole::Reader
  }

  fn matrix(&self) -> &CharacterMatrix {
    &self.matrix
  }

  fn blocks(&self) -> &NexusBlocks {
    &self.blocks
  }
}

pub fn nex_read_file(filepath: impl AsRef<Path>) -> Result<NexusReader, Report> {
  let filepath = filepath.as_ref();
  let contents = read_file_to_string(filepath)?;
  nex_read_str(contents).wrap_err_with(|| format!("When parsing NEXUS file '{}'", filepath.display()))
}

pub fn nex_read_str(contents: impl AsRef<str>) -> Result<NexusReader, Report> {
  let contents = strip_comments(contents.as_ref());
  let contents = contents.trim_start();

  let body = match (contents.get(..NEXUS_HEADER.len()), contents.get(NEXUS_HEADER.len()..)) {
    (Some(header), Some(body)) if header.eq_ignore_ascii_case(NEXUS_HEADER) => body,
    _ => return make_error!("Expected '#NEXUS' header at the start of the document"),
  };

  let blocks = split_blocks(&split_commands(body)?)?;

  let matrix = match blocks
    .iter()
    .find(|(name, _)| DATA_BLOCKS.contains(&name.as_str()))
  {
    Some((name, lines)) => parse_data_block(lines).wrap_err_with(|| format!("When parsing NEXUS block '{name}'"))?,
    None => {
      warn!("NEXUS document contains no 'data' or 'characters' block. Proceeding with an empty matrix.");
      CharacterMatrix::new()
    }
  };

  info!(
    "Read NEXUS matrix with {} taxa and {} characters, {} blocks in total",
    matrix.ntax(),
    matrix.nchar(),
    blocks.len()
  );

  Ok(NexusReader { matrix, blocks })
}

#[derive(Clone, Debug, SmartDefault)]
pub struct NexWriteOptions {
  /// Number of spaces block contents are indented with
  #[default = 2]
  pub indent: usize,
}

/// NEXUS document under construction: a character matrix and extra blocks appended after the `data` block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NexusWriter {
  matrix: CharacterMatrix,
  blocks: NexusBlocks,
}

impl NexusWriter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Copies the matrix and the extra blocks of a document. Taxa and character blocks are not copied, these are
  /// regenerated from the matrix on write.
  pub fn from_source(source: &impl NexusSource) -> Self {
    let blocks = source
      .blocks()
      .iter()
      .filter(|(name, _)| !MATRIX_BLOCKS.contains(&name.as_str()))
      .map(|(name, lines)| (name.clone(), lines.clone()))
      .collect();

    Self {
      matrix: source.matrix().clone(),
      blocks,
    }
  }

  pub fn matrix_mut(&mut self) -> &mut CharacterMatrix {
    &mut self.matrix
  }

  /// Adds a block with the given content lines, wrapped into `begin <name>;` and `end;`. Returns the lines of the
  /// block it replaces, if any.
  pub fn add_block<I, S>(&mut self, name: impl AsRef<str>, content: I) -> Option<Vec<String>>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let name = name.as_ref().to_lowercase();
    let lines = std::iter::once(format!("begin {name};"))
      .chain(content.into_iter().map(|line| line.as_ref().to_owned()))
      .chain(std::iter::once("end;".to_owned()))
      .collect_vec();
    self.blocks.insert(name, lines)
  }

  pub fn remove_block(&mut self, name: &str) -> Option<Vec<String>> {
    self.blocks.shift_remove(&name.to_lowercase())
  }

  pub fn write(&self, options: &NexWriteOptions) -> Result<String, Report> {
    nex_write_string(self, options)
  }
}

impl NexusSource for NexusWriter {
  fn role(&self) -> MatrixRole {
    MatrixRole::Writer
  }

  fn matrix(&self) -> &CharacterMatrix {
    &self.matrix
  }

  fn blocks(&self) -> &NexusBlocks {
    &self.blocks
  }
}

pub fn nex_write_file(
  filepath: impl AsRef<Path>,
  writer: &NexusWriter,
  options: &NexWriteOptions,
) -> Result<(), Report> {
  let filepath = filepath.as_ref();
  let mut f = create_file_or_stdout(filepath)?;
  nex_write(&mut f, writer, options).wrap_err_with(|| format!("When writing NEXUS file '{}'", filepath.display()))?;
  f.flush()?;
  Ok(())
}

pub fn nex_write_string(writer: &NexusWriter, options: &NexWriteOptions) -> Result<String, Report> {
  let mut buf = Vec::new();
  nex_write(&mut buf, writer, options)?;
  Ok(String::from_utf8(buf)?)
}

pub fn nex_write(w: &mut impl Write, writer: &NexusWriter, options: &NexWriteOptions) -> Result<(), Report> {
  let pad = " ".repeat(options.indent);
  let matrix = writer.matrix();

  let symbols = matrix
    .symbols()
    .into_iter()
    .filter(|symbol| symbol.chars().count() == 1)
    .sorted()
    .join("");

  writeln!(w, "#NEXUS")?;
  writeln!(w, "begin data;")?;
  writeln!(w, "{pad}dimensions ntax={} nchar={};", matrix.ntax(), matrix.nchar())?;
  writeln!(
    w,
    "{pad}format datatype=standard missing={MISSING_STATE} gap=- symbols=\"{symbols}\";"
  )?;

  if !matrix.is_empty() {
    writeln!(w, "{pad}charstatelabels")?;
    let nchar = matrix.nchar();
    for (index, label) in matrix.labels().enumerate() {
      let separator = if index + 1 < nchar { "," } else { "" };
      writeln!(w, "{pad}{pad}{} {}{separator}", index + 1, nexus_token(label))?;
    }
    writeln!(w, "{pad};")?;
  }

  writeln!(w, "{pad}matrix")?;
  let names = matrix.taxa().map(nexus_token).collect_vec();
  let width = names.iter().map(String::len).max().unwrap_or_default();
  for (taxon, name) in matrix.taxa().zip(&names) {
    let states = matrix
      .characters()
      .map(|(_, states)| states.get(taxon).map_or(MISSING_STATE, String::as_str))
      .join("");
    writeln!(w, "{pad}{pad}{name:<width$}  {states}")?;
  }
  writeln!(w, "{pad};")?;
  writeln!(w, "end;")?;

  for lines in writer.blocks().values() {
    let last = lines.len().saturating_sub(1);
    for (index, command) in lines.iter().enumerate() {
      if index == 0 || index == last {
        writeln!(w, "{command}")?;
      } else {
        for line in command.lines() {
          writeln!(w, "{pad}{line}")?;
        }
      }
    }
  }

  Ok(())
}

/// Removes `[...]` comments, which may be nested
fn strip_comments(contents: &str) -> String {
  let mut depth = 0_usize;
  let mut result = String::with_capacity(contents.len());
  for c in contents.chars() {
    match c {
      '[' => depth += 1,
      ']' if depth > 0 => depth -= 1,
      _ if depth == 0 => result.push(c),
      _ => {}
    }
  }
  result
}

/// Splits a document body into `;`-terminated commands. Lines of a command are trimmed, empty lines are removed.
fn split_commands(body: &str) -> Result<Vec<String>, Report> {
  let mut parts = split_outside_quotes(body, ';');
  let trailing = parts.pop().unwrap_or_default();
  if !trailing.trim().is_empty() {
    return make_error!("Expected ';' after: '{}'", trailing.trim());
  }

  Ok(
    parts
      .iter()
      .map(|part| {
        let command = part.lines().map(str::trim).filter(|line| !line.is_empty()).join("\n");
        format!("{command};")
      })
      .collect_vec(),
  )
}

fn split_blocks(commands: &[String]) -> Result<NexusBlocks, Report> {
  let mut blocks = NexusBlocks::new();
  let mut current: Option<(String, Vec<String>)> = None;

  for command in commands.iter().filter(|command| command.as_str() != ";") {
    if let Some((name, mut block_commands)) = current.take() {
      block_commands.push(command.clone());
      if is_block_end(command) {
        if blocks.insert(name.clone(), block_commands).is_some() {
          warn!("NEXUS block '{name}' occurs more than once. Only the last occurrence is kept.");
        }
      } else {
        current = Some((name, block_commands));
      }
    } else {
      let name =
        parse_block_begin(command).ok_or_else(|| make_report!("Expected 'begin <block>;', but found: '{command}'"))?;
      debug!("Reading NEXUS block '{name}'");
      current = Some((name, vec![command.clone()]));
    }
  }

  if let Some((name, _)) = current {
    return make_error!("NEXUS block '{name}' is not terminated with 'end;'");
  }

  Ok(blocks)
}

fn parse_block_begin(command: &str) -> Option<String> {
  let (keyword, rest) = command.split_once(char::is_whitespace)?;
  if !keyword.eq_ignore_ascii_case("begin") {
    return None;
  }
  let name = rest.trim().trim_end_matches(';').trim().to_lowercase();
  (!name.is_empty() && !name.contains(char::is_whitespace)).then_some(name)
}

fn is_block_end(command: &str) -> bool {
  let command = command.split_whitespace().join("").to_lowercase();
  command == "end;" || command == "endblock;"
}

#[derive(Clone, Debug, SmartDefault)]
struct NexusFormat {
  #[default(MISSING_STATE.to_owned())]
  missing: String,
}

fn parse_data_block(lines: &[String]) -> Result<CharacterMatrix, Report> {
  let body = lines.get(1..lines.len().saturating_sub(1)).unwrap_or_default().join("\n");

  let mut format = NexusFormat::default();
  let mut ntax: Option<usize> = None;
  let mut nchar: Option<usize> = None;
  let mut labels = BTreeMap::<usize, String>::new();
  let mut rows = IndexMap::<String, Vec<String>>::new();

  for command in split_outside_quotes(&body, ';') {
    let command = command.trim();
    let (keyword, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    match keyword.to_lowercase().as_str() {
      "dimensions" => {
        let params = parse_params(rest);
        ntax = params.get("ntax").map(|n| parse_count("ntax", n)).transpose()?;
        nchar = params.get("nchar").map(|n| parse_count("nchar", n)).transpose()?;
      }
      "format" => {
        if let Some(missing) = parse_params(rest).get("missing") {
          format.missing.clone_from(missing);
        }
      }
      "charlabels" => {
        labels = split_tokens(rest)
          .into_iter()
          .enumerate()
          .map(|(index, label)| (index + 1, label))
          .collect();
      }
      "charstatelabels" => labels = parse_charstatelabels(rest)?,
      "matrix" => parse_matrix_rows(rest, &format, &mut rows)?,
      "" => {}
      other => debug!("Skipping unsupported command '{other}' in character block"),
    }
  }

  let nchar = nchar.unwrap_or_else(|| rows.values().map(Vec::len).max().unwrap_or_default());

  if let Some(ntax) = ntax {
    if ntax != rows.len() {
      warn!("NEXUS dimensions declare {ntax} taxa, but the matrix contains {}", rows.len());
    }
  }

  if let Some((&index, label)) = labels.iter().find(|&(&index, _)| index == 0 || index > nchar) {
    return make_error!("Character label '{label}' has index {index}, which is outside of the {nchar} characters");
  }

  let labels = (1..=nchar)
    .map(|index| labels.get(&index).cloned().unwrap_or_else(|| index.to_string()))
    .collect_vec();

  if let Some(label) = labels.iter().duplicates().next() {
    return make_error!("Character label '{label}' is used more than once");
  }

  if let Some((taxon, states)) = rows.iter().find(|(_, states)| states.len() != nchar) {
    return make_error!(
      "Taxon '{taxon}' has {} states, but there are {nchar} characters",
      states.len()
    );
  }

  let mut matrix = CharacterMatrix::with_taxa(rows.keys());
  for (index, label) in labels.iter().enumerate() {
    matrix.add_character(label);
    for (taxon, states) in &rows {
      matrix.set(label, taxon, &states[index]);
    }
  }

  Ok(matrix)
}

fn parse_count(name: &str, value: &str) -> Result<usize, Report> {
  value
    .parse::<usize>()
    .wrap_err_with(|| format!("When parsing '{name}={value}'"))
}

/// Parses `key=value` pairs. Keys are lowercased, quotes around values are removed.
fn parse_params(s: &str) -> IndexMap<String, String> {
  #[allow(clippy::unwrap_used)]
  static EQUALS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*=\s*").unwrap());
  let s = EQUALS.replace_all(s, "=");
  split_tokens(&s)
    .into_iter()
    .filter_map(|token| {
      let (key, value) = token.split_once('=')?;
      Some((key.to_lowercase(), value.to_owned()))
    })
    .collect()
}

/// Parses `1 label, 2 'other label' / absent present, ...` into labels by 1-based index
fn parse_charstatelabels(s: &str) -> Result<BTreeMap<usize, String>, Report> {
  split_outside_quotes(s, ',')
    .iter()
    .filter(|entry| !entry.trim().is_empty())
    .map(|entry| {
      let tokens = split_tokens(entry);
      let (index, label) = match tokens.as_slice() {
        [index, label, ..] if label != "/" => (index, label),
        _ => return make_error!("Unable to parse character state label entry: '{}'", entry.trim()),
      };
      let index = parse_count("charstatelabels", index)?;
      Ok((index, label.clone()))
    })
    .collect()
}

fn parse_matrix_rows(s: &str, format: &NexusFormat, rows: &mut IndexMap<String, Vec<String>>) -> Result<(), Report> {
  for line in s.lines().map(str::trim).filter(|line| !line.is_empty()) {
    let (taxon, states) = split_first_token(line);
    let states = parse_states(states, format).wrap_err_with(|| format!("When parsing states of taxon '{taxon}'"))?;
    // Interleaved matrices repeat the taxon for every chunk of characters
    rows.entry(taxon).or_default().extend(states);
  }
  Ok(())
}

/// Splits a row of states into symbols. Polymorphic and uncertain states, `(01)` and `{01}`, are kept as one symbol.
fn parse_states(s: &str, format: &NexusFormat) -> Result<Vec<String>, Report> {
  let mut states = vec![];
  let mut chars = s.chars();
  while let Some(c) = chars.next() {
    match c {
      c if c.is_whitespace() => {}
      '(' | '{' => {
        let close = if c == '(' { ')' } else { '}' };
        let mut state = c.to_string();
        loop {
          match chars.next() {
            Some(next) if next.is_whitespace() => {}
            Some(next) => {
              state.push(next);
              if next == close {
                break;
              }
            }
            None => return make_error!("Unterminated multistate symbol: '{state}'"),
          }
        }
        states.push(state);
      }
      c => {
        let state = c.to_string();
        if state == format.missing {
          states.push(MISSING_STATE.to_owned());
        } else {
          states.push(state);
        }
      }
    }
  }
  Ok(states)
}

/// Splits on a separator, ignoring separators inside quotes. Quotes are retained.
fn split_outside_quotes(s: &str, separator: char) -> Vec<String> {
  let mut parts = vec![];
  let mut current = String::new();
  let mut quote: Option<char> = None;
  for c in s.chars() {
    match quote {
      Some(q) if c == q => {
        quote = None;
        current.push(c);
      }
      Some(_) => current.push(c),
      None if c == '\'' || c == '"' => {
        quote = Some(c);
        current.push(c);
      }
      None if c == separator => parts.push(std::mem::take(&mut current)),
      None => current.push(c),
    }
  }
  parts.push(current);
  parts
}

/// Splits on whitespace outside of quotes. Quotes are removed, doubled quotes inside quotes are literal.
fn split_tokens(s: &str) -> Vec<String> {
  let mut tokens = vec![];
  let mut current = String::new();
  let mut quote: Option<char> = None;
  let mut in_token = false;
  let mut chars = s.chars().peekable();
  while let Some(c) = chars.next() {
    match quote {
      Some(q) if c == q => {
        if chars.peek() == Some(&q) {
          current.push(q);
          chars.next();
        } else {
          quote = None;
        }
      }
      Some(_) => current.push(c),
      None if c == '\'' || c == '"' => {
        quote = Some(c);
        in_token = true;
      }
      None if c.is_whitespace() => {
        if in_token {
          tokens.push(std::mem::take(&mut current));
          in_token = false;
        }
      }
      None => {
        current.push(c);
        in_token = true;
      }
    }
  }
  if in_token {
    tokens.push(current);
  }
  tokens
}

/// Splits the first, possibly quoted, token off a line
#[allow(clippy::string_slice)]
fn split_first_token(line: &str) -> (String, &str) {
  let line = line.trim_start();
  let mut token = String::new();
  let mut quote: Option<char> = None;
  let mut chars = line.char_indices().peekable();
  while let Some((index, c)) = chars.next() {
    match quote {
      Some(q) if c == q => {
        if chars.peek().map(|&(_, next)| next) == Some(q) {
          token.push(q);
          chars.next();
        } else {
          quote = None;
        }
      }
      Some(_) => token.push(c),
      None if c == '\'' || c == '"' => quote = Some(c),
      None if c.is_whitespace() => return (token, &line[index..]),
      None => token.push(c),
    }
  }
  (token, "")
}
