pub mod controller_handler;
pub mod types;

pub use controller_handler::Controller;
pub use types::{ArtifactImage, Status, TimelineEntry};
