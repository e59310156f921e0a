pub mod ascertainment;
pub mod assumptions;
pub mod io;
pub mod labels;
pub mod matrix;
pub mod utils;

#[cfg(test)]
mod testing;
