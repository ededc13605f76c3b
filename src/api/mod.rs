pub mod auth;
pub mod catalog;
pub mod error;
pub mod favorites;
pub mod lists;
pub mod ratings;
pub mod trending;
pub mod watchlist;

pub use error::{ApiError, ApiResult};
