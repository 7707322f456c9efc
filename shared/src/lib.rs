pub mod defaults;
pub mod types;

pub use types::*;
