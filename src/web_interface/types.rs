use serde::{Deserialize, Serialize};

use crate::controller::Status;
use crate::storage::types::ArtifactId;

/// API error payload
#[derive(Serialize)]
pub struct ApiError {
    pub message: String,
}

#[derive(Serialize)]
pub struct ArtifactResponse {
    pub id: ArtifactId,
    pub captured_at: String,
    pub url: String,
}

impl From<ArtifactId> for ArtifactResponse {
    fn from(id: ArtifactId) -> Self {
        Self {
            captured_at: id.display_time(),
            url: format!("/artifacts/{}", id),
            id,
        }
    }
}

#[derive(Serialize)]
pub struct DescriptionResponse {
    pub id: ArtifactId,
    pub description: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ArtifactResponse>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub id: ArtifactId,
    pub deleted: bool,
}

#[derive(Deserialize)]
pub struct CapacityRequest {
    pub capacity: usize,
}

/// Reply to start, stop and capacity changes.
#[derive(Serialize)]
pub struct ControlResponse {
    /// False when the request left the state as it was
    pub changed: bool,
    pub status: Status,
}
