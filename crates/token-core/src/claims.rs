//! Claim set of a voice access token

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::grant::Grant;

/// JWT claims for voice access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceClaims {
    pub jti: String,          // Token ID, "<key id>-<uuid>"
    pub iss: String,          // Issuing account
    pub sub: String,          // Identity
    pub iat: u64,             // Issued at
    pub exp: u64,             // Expiration
    pub grants: Vec<Grant>,
}

impl VoiceClaims {
    /// Lifetime encoded in the token (`exp - iat`)
    pub fn time_to_live(&self) -> Duration {
        Duration::from_secs(self.exp.saturating_sub(self.iat))
    }

    pub fn identity(&self) -> &str {
        &self.sub
    }

    /// Routing application of the single voice grant, if the claims carry exactly one grant.
    pub fn voice_application(&self) -> Option<&str> {
        match self.grants.as_slice() {
            [grant @ Grant::Voice { .. }] => Some(grant.application_id()),
            _ => None,
        }
    }
}
