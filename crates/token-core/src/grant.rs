//! Capability grants carried by a voice access token

use serde::{Deserialize, Serialize};

/// A capability assertion embedded in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grant {
    /// May place outgoing calls routed through the named application.
    Voice { outgoing_application_id: String },
}

impl Grant {
    pub fn voice(application_id: impl Into<String>) -> Self {
        Grant::Voice {
            outgoing_application_id: application_id.into(),
        }
    }

    /// Routing application this grant is scoped to
    pub fn application_id(&self) -> &str {
        match self {
            Grant::Voice { outgoing_application_id } => outgoing_application_id,
        }
    }
}
