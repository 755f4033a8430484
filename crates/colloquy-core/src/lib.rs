pub mod config;
pub mod error;
pub mod types;

pub use config::ColloquyConfig;
pub use error::{ColloquyError, Result};
pub use types::*;
