use std::fmt::Display;

#[macro_export]
macro_rules! o {
  ($x:expr $(,)?) => {
    ToOwned::to_owned($x)
  };
}

pub fn quote_single(x: impl Display) -> String {
  format!("'{x}'")
}

/// Characters which end an unquoted NEXUS word
const NEXUS_PUNCTUATION: &str = "()[]{}/\\,;:=*'\"`<>";

/// Formats a taxon or character name as a NEXUS word, quoting it when it contains whitespace or punctuation
pub fn nexus_token(name: &str) -> String {
  let needs_quotes =
    name.is_empty() || name.chars().any(|c| c.is_whitespace() || NEXUS_PUNCTUATION.contains(c));
  if needs_quotes {
    quote_single(name.replace('\'', "''"))
  } else {
    name.to_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rustfmt::skip]
  #[rstest]
  #[case("ASLIAN_Jahai", "ASLIAN_Jahai"  )]
  #[case("Jah-Hut",      "Jah-Hut"       )]
  #[case("Jah Hut",      "'Jah Hut'"     )]
  #[case("Mah Meri's",   "'Mah Meri''s'" )]
  #[case("",             "''"            )]
  fn test_nexus_token(#[case] name: &str, #[case] expected: &str) {
    assert_eq!(nexus_token(name), expected);
  }
}
