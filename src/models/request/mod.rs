pub mod lateness;
mod queries;
mod types;

pub use queries::*;
pub use types::*;
