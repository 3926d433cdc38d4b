//! Storage subsystem
//!
//! Persistence for captured artifacts and their text descriptions.
//!
//! Components:
//! - `types`: artifact identifiers and description records.
//! - `record_codec`: one-line encoding of a description record.
//! - `description_store`: append-only description file with rewrite-on-delete.
//! - `artifact_directory`: the directory of captured image files.

pub mod artifact_directory;
pub mod description_store;
pub mod record_codec;
pub mod types;

pub use artifact_directory::ArtifactDirectory;
pub use description_store::DescriptionStore;
pub use types::{ArtifactId, DescriptionRecord};
