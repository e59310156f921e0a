use crate::labels::parse_word::WordParser;
use eyre::Report;
use indexmap::IndexMap;
use log::debug;

/// Labels grouped by the word they code for, in order of first appearance
pub type Words = IndexMap<String, Vec<String>>;

/// Groups labels by word using the default `_` delimiter
pub fn get_words<I, S>(labels: I) -> Result<Words, Report>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  get_words_with(labels, &WordParser::default())
}

pub fn get_words_with<I, S>(labels: I, parser: &WordParser) -> Result<Words, Report>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut words = Words::new();
  let mut unique = 0_usize;
  for label in labels {
    let label = label.as_ref();
    let parsed = parser.parse(label)?;
    if parsed.is_unique {
      unique += 1;
    }
    words.entry(parsed.word).or_default().push(label.to_owned());
  }
  debug!("Grouped characters into {} words, {unique} characters unique to one taxon", words.len());
  Ok(words)
}
