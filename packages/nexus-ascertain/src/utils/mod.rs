pub mod error;
pub mod global_init;
pub mod string;
