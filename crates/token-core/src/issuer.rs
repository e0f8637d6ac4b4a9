//! Voice access token issuance

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::claims::VoiceClaims;
use crate::config::{IssuerConfig, SigningAlgorithm};
use crate::grant::Grant;
use crate::{Error, Result};

/// Signs voice access tokens for one issuance configuration
pub struct TokenIssuer {
    config: IssuerConfig,
    encoding_key: Arc<EncodingKey>,
    header: Header,
}

impl TokenIssuer {
    pub fn new(config: IssuerConfig) -> Result<Self> {
        config.validate()?;

        let secret = config.signing_key_secret.as_bytes();
        let encoding_key = match config.algorithm {
            SigningAlgorithm::RS256 => EncodingKey::from_rsa_pem(secret)
                .map_err(|e| Error::Signing(format!("Invalid RSA key: {}", e)))?,
            _ => EncodingKey::from_secret(secret),
        };

        let mut header = Header::new(config.algorithm.into());
        header.kid = Some(config.signing_key_id.clone());

        Ok(Self {
            config,
            encoding_key: Arc::new(encoding_key),
            header,
        })
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Issue a token for `identity`, falling back to the configured default.
    pub fn issue(&self, identity: Option<&str>) -> Result<String> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, identity: Option<&str>, now: DateTime<Utc>) -> Result<String> {
        let identity = resolve_identity(identity, self.config.default_identity.as_deref())?;
        let claims = self.claims_for(identity, now)?;

        let token = encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| Error::Signing(e.to_string()))?;

        info!(
            identity = %claims.sub,
            kid = %self.config.signing_key_id,
            exp = claims.exp,
            "Issued voice access token"
        );
        Ok(token)
    }

    fn claims_for(&self, identity: String, now: DateTime<Utc>) -> Result<VoiceClaims> {
        let iat = u64::try_from(now.timestamp())
            .map_err(|_| Error::Configuration(format!("Clock is before the epoch: {}", now)))?;
        let exp = iat + self.config.time_to_live.as_secs();

        Ok(VoiceClaims {
            jti: format!("{}-{}", self.config.signing_key_id, Uuid::new_v4().simple()),
            iss: self.config.account_id.clone(),
            sub: identity,
            iat,
            exp,
            grants: vec![Grant::voice(self.config.routing_application_id.clone())],
        })
    }

    /// Public verification key in PEM format (RS256 only)
    pub fn public_key_pem(&self) -> Result<String> {
        if self.config.algorithm == SigningAlgorithm::RS256 {
            crate::verify::public_key_from_private(&self.config.signing_key_secret)
        } else {
            Err(Error::Configuration("Public key only available for RS256".to_string()))
        }
    }
}

/// Issue a single token from `config`.
pub fn issue(identity: Option<&str>, config: &IssuerConfig) -> Result<String> {
    TokenIssuer::new(config.clone())?.issue(identity)
}

/// Message of the `Configuration` error raised when no identity can be resolved.
pub const NO_IDENTITY: &str = "No identity available";

/// Pick the requested identity, or the default when none (or a blank one) was given.
///
/// Blank means empty after trimming, the same rule required settings follow.
pub fn resolve_identity(requested: Option<&str>, default: Option<&str>) -> Result<String> {
    let is_set = |id: &&str| !id.trim().is_empty();

    if let Some(id) = requested.filter(is_set) {
        return Ok(id.to_string());
    }
    match default.filter(is_set) {
        Some(id) => {
            debug!(identity = %id, "No identity requested, using configured default");
            Ok(id.to_string())
        }
        None => {
            warn!("No identity available: pass `clientid` with the request or configure CLIENT_ID");
            Err(Error::Configuration(NO_IDENTITY.to_string()))
        }
    }
}
