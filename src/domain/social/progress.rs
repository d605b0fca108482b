//! Media processing progress notices.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::RecordId;

/// Processing progress for an upload, pushed live to its owner only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Fraction in `0.0..=1.0`.
    pub progress: f32,
}

impl ProgressMessage {
    pub fn new(id: Option<RecordId>, progress: f32) -> Self {
        Self {
            id,
            progress: progress.clamp(0.0, 1.0),
        }
    }
}
