pub mod client;
pub mod types;

pub use client::{CatalogClient, TmdbError};
pub use types::*;
