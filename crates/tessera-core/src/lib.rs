//! Tessera Core - Domain types, path scheme and collaborator traits

pub mod error;
pub mod ids;
pub mod models;
pub mod paths;
pub mod traits;

#[cfg(test)]
mod tests;

pub use error::*;
pub use ids::*;
pub use models::*;
pub use paths::*;
pub use traits::*;
