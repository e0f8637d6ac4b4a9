//! Token verification, as performed by the telephony backend before call setup

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};
use tracing::debug;

use crate::claims::VoiceClaims;
use crate::config::{IssuerConfig, SigningAlgorithm};
use crate::{Error, Result};

/// Clock skew tolerated when checking `exp`, in seconds.
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// Validates signature, expiry, issuer, key id and grant of voice tokens
pub struct TokenVerifier {
    decoding_key: Arc<DecodingKey>,
    algorithm: Algorithm,
    issuer: String,
    key_id: String,
    leeway: u64,
}

impl TokenVerifier {
    /// Derive verification material from an issuance configuration.
    pub fn from_config(config: &IssuerConfig) -> Result<Self> {
        match config.algorithm {
            SigningAlgorithm::RS256 => {
                let public_pem = public_key_from_private(&config.signing_key_secret)?;
                Self::with_rsa_public_pem(&config.account_id, &config.signing_key_id, &public_pem)
            }
            alg => Ok(Self::with_shared_secret(
                alg,
                &config.account_id,
                &config.signing_key_id,
                config.signing_key_secret.as_bytes(),
            )),
        }
    }

    pub fn with_shared_secret(
        algorithm: SigningAlgorithm,
        issuer: &str,
        key_id: &str,
        secret: &[u8],
    ) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            algorithm: algorithm.into(),
            issuer: issuer.to_string(),
            key_id: key_id.to_string(),
            leeway: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn with_rsa_public_pem(issuer: &str, key_id: &str, public_pem: &str) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| Error::Configuration(format!("Invalid public key: {}", e)))?;
        Ok(Self {
            decoding_key: Arc::new(key),
            algorithm: Algorithm::RS256,
            issuer: issuer.to_string(),
            key_id: key_id.to_string(),
            leeway: DEFAULT_LEEWAY_SECS,
        })
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    pub fn verify(&self, token: &str) -> Result<VoiceClaims> {
        let header = decode_header(token).map_err(|e| Error::InvalidToken(e.to_string()))?;
        if header.kid.as_deref() != Some(self.key_id.as_str()) {
            return Err(Error::InvalidToken(format!(
                "Unknown key id: {}",
                header.kid.unwrap_or_default()
            )));
        }

        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.leeway = self.leeway;

        let claims = decode::<VoiceClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => Error::InvalidToken(e.to_string()),
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(Error::InvalidToken("Empty identity".to_string()));
        }
        if claims.voice_application().is_none() {
            return Err(Error::InvalidToken(format!(
                "Expected exactly one voice grant, found {}",
                claims.grants.len()
            )));
        }

        debug!(identity = %claims.sub, jti = %claims.jti, "Verified voice access token");
        Ok(claims)
    }

    /// Verify and require the grant to authorize `application_id`.
    pub fn verify_for_application(&self, token: &str, application_id: &str) -> Result<VoiceClaims> {
        let claims = self.verify(token)?;
        match claims.voice_application() {
            Some(found) if found == application_id => Ok(claims),
            found => Err(Error::GrantMismatch {
                expected: application_id.to_string(),
                found: found.unwrap_or_default().to_string(),
            }),
        }
    }
}

/// Decode header and claims without checking the signature or expiry.
///
/// For diagnostics only; never authorize on the result.
pub fn decode_unverified(token: &str) -> Result<(Header, VoiceClaims)> {
    let header = decode_header(token).map_err(|e| Error::InvalidToken(e.to_string()))?;

    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::InvalidToken("Missing claims segment".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Error::InvalidToken(format!("Claims are not base64url: {}", e)))?;
    let claims = serde_json::from_slice(&bytes)
        .map_err(|e| Error::InvalidToken(format!("Malformed claims: {}", e)))?;

    Ok((header, claims))
}

/// Derive the PEM public key from a PKCS#8 or PKCS#1 PEM private key.
pub(crate) fn public_key_from_private(private_pem: &str) -> Result<String> {
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
    use rsa::{RsaPrivateKey, RsaPublicKey};

    let private_key = RsaPrivateKey::from_pkcs8_pem(private_pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_pem))
        .map_err(|e| Error::Signing(format!("Failed to parse private key: {}", e)))?;

    let public_key = RsaPublicKey::from(&private_key);

    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::Signing(format!("Failed to encode public key: {}", e)))
}
