mod graph;
mod schema;
mod types;

pub use graph::*;
pub use schema::*;
pub use types::*;
