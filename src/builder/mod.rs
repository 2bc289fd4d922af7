mod generator;
mod types;

pub use generator::*;
pub use types::*;
