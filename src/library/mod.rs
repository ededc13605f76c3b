//! Client-side data aggregation: HTTP wrappers over the backend REST
//! surface, an in-memory mirror of the user's library, and the pure
//! projector that merges catalog pages with that mirror.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod page;
pub mod project;
pub mod sequence;

pub use api::{ClientError, LibraryHttpClient, UserLibraryApi};
pub use cache::{LibraryCache, ListInfo};
pub use catalog::CatalogApi;
pub use page::cap_total_pages;
pub use project::{project_movies, MovieCard};
pub use sequence::RequestSequencer;
