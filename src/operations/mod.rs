pub mod creation;
pub mod editing;
