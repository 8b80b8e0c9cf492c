pub mod resolver;
pub mod settlement;
