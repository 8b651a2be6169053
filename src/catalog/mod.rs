//! Data access for a paginated REST catalog.

pub mod client;
pub mod resolve;
pub mod transport;
pub mod types;
pub mod url;

pub use client::CatalogClient;
pub use resolve::populate_all;
pub use types::{CategoryMap, Entity, ResolvedEntity, ResolvedField, ResultPage};
