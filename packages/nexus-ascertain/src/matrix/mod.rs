pub mod character_matrix;
pub mod role;
