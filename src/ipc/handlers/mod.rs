pub mod core;
pub mod students;
