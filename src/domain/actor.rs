//! The user performing a workflow action.

use serde::{Deserialize, Serialize};

/// Identity supplied by the session provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user id
    pub id: String,

    /// Display name
    pub name: String,

    /// Faculty the user belongs to
    pub faculty_id: String,
}

impl Actor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        faculty_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            faculty_id: faculty_id.into(),
        }
    }
}
