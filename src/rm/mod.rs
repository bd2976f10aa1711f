pub mod api_types;
pub mod client;
pub mod error;
pub mod location;
pub mod record;
pub mod repository;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::RickMortyClient;
pub use error::{RemoteError, RepositoryError, RepositoryResult};
pub use location::LocationRepository;
pub use repository::CharacterRepository;
pub use source::RemoteSource;
