pub mod get_words;
pub mod parse_word;
