pub mod board;
pub mod engine;
pub mod eval;
pub mod genetic;
