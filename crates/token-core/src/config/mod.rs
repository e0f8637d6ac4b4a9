//! Configuration for voice token issuance
//!
//! Issuance parameters come from the process environment, using the same keys
//! the hosted token function reads:
//!
//! | key                        | field                    |
//! |----------------------------|--------------------------|
//! | `ACCOUNT_SID`              | `account_id`             |
//! | `VOICE_API_KEY`            | `signing_key_id`         |
//! | `VOICE_API_SECRET`         | `signing_key_secret`     |
//! | `VOICE_TWIML_APP_SID_CALL` | `routing_application_id` |
//! | `CLIENT_ID`                | `default_identity`       |
//! | `VOICE_TOKEN_TTL`          | `time_to_live` (seconds) |
//! | `VOICE_TOKEN_ALGORITHM`    | `algorithm`              |

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::Deserialize;

use crate::{Error, Result};

/// Three hours.
pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(10_800);

/// Upper bound accepted for `time_to_live`.
pub const MAX_TIME_TO_LIVE: Duration = Duration::from_secs(86_400);

/// Signature algorithm used for issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningAlgorithm {
    /// HMAC-SHA256 keyed with the signing key secret.
    #[default]
    HS256,
    HS384,
    HS512,
    /// RSA-SHA256; the signing key secret is a PEM encoded private key.
    RS256,
}

impl SigningAlgorithm {
    pub fn is_hmac(&self) -> bool {
        !matches!(self, SigningAlgorithm::RS256)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
            SigningAlgorithm::HS384 => "HS384",
            SigningAlgorithm::HS512 => "HS512",
            SigningAlgorithm::RS256 => "RS256",
        }
    }
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
            SigningAlgorithm::RS256 => Algorithm::RS256,
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(SigningAlgorithm::HS256),
            "HS384" => Ok(SigningAlgorithm::HS384),
            "HS512" => Ok(SigningAlgorithm::HS512),
            "RS256" => Ok(SigningAlgorithm::RS256),
            other => Err(Error::Configuration(format!("Unsupported algorithm: {}", other))),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters needed to issue a voice access token
#[derive(Clone)]
pub struct IssuerConfig {
    /// Account (tenant) issuing the credential; becomes the `iss` claim.
    pub account_id: String,
    /// Key identifier placed in the token header as `kid`.
    pub signing_key_id: String,
    /// Shared secret (HMAC) or PEM private key (RSA). Never embedded in a token.
    pub signing_key_secret: String,
    /// Call-routing application the voice grant authorizes.
    pub routing_application_id: String,
    pub time_to_live: Duration,
    /// Identity used when a request does not name one.
    pub default_identity: Option<String>,
    pub algorithm: SigningAlgorithm,
}

// The secret stays out of logs and panic messages.
impl fmt::Debug for IssuerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerConfig")
            .field("account_id", &self.account_id)
            .field("signing_key_id", &self.signing_key_id)
            .field("signing_key_secret", &"<redacted>")
            .field("routing_application_id", &self.routing_application_id)
            .field("time_to_live", &self.time_to_live)
            .field("default_identity", &self.default_identity)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl IssuerConfig {
    pub fn new(
        account_id: impl Into<String>,
        signing_key_id: impl Into<String>,
        signing_key_secret: impl Into<String>,
        routing_application_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            signing_key_id: signing_key_id.into(),
            signing_key_secret: signing_key_secret.into(),
            routing_application_id: routing_application_id.into(),
            time_to_live: DEFAULT_TIME_TO_LIVE,
            default_identity: None,
            algorithm: SigningAlgorithm::default(),
        }
    }

    pub fn with_default_identity(mut self, identity: impl Into<String>) -> Self {
        self.default_identity = Some(identity.into());
        self
    }

    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = ttl;
        self
    }

    pub fn with_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::default())
    }

    /// Load configuration from an explicit set of environment-style variables
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::load(config::Environment::default().source(Some(map)))
    }

    fn load(env: config::Environment) -> Result<Self> {
        let settings: EnvSettings = config::Config::builder()
            .add_source(env.ignore_empty(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Configuration(format!("Failed to read environment: {}", e)))?;

        settings.try_into()
    }

    /// Check every required field; issuance refuses an invalid configuration.
    pub fn validate(&self) -> Result<()> {
        require("ACCOUNT_SID", &self.account_id)?;
        require("VOICE_API_KEY", &self.signing_key_id)?;
        require("VOICE_API_SECRET", &self.signing_key_secret)?;
        require("VOICE_TWIML_APP_SID_CALL", &self.routing_application_id)?;

        if self.time_to_live.is_zero() {
            return Err(Error::Configuration("Time to live must be positive".to_string()));
        }
        if self.time_to_live > MAX_TIME_TO_LIVE {
            return Err(Error::Configuration(format!(
                "Time to live of {}s exceeds the maximum of {}s",
                self.time_to_live.as_secs(),
                MAX_TIME_TO_LIVE.as_secs()
            )));
        }
        // Sub-second lifetimes cannot be expressed in the `exp` claim.
        if self.time_to_live.subsec_nanos() != 0 {
            return Err(Error::Configuration(
                "Time to live must be a whole number of seconds".to_string(),
            ));
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::Configuration(format!("Missing required setting {}", key)))
    } else {
        Ok(())
    }
}

/// Raw environment view; keys are lowercased by the `config` crate.
#[derive(Debug, Default, Deserialize)]
struct EnvSettings {
    account_sid: Option<String>,
    voice_api_key: Option<String>,
    voice_api_secret: Option<String>,
    voice_twiml_app_sid_call: Option<String>,
    client_id: Option<String>,
    voice_token_ttl: Option<String>,
    voice_token_algorithm: Option<String>,
}

impl TryFrom<EnvSettings> for IssuerConfig {
    type Error = Error;

    fn try_from(env: EnvSettings) -> Result<Self> {
        let missing = |key: &str| Error::Configuration(format!("Missing required setting {}", key));

        let time_to_live = match env.voice_token_ttl {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::Configuration(format!("VOICE_TOKEN_TTL is not a number of seconds: {}", raw))
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIME_TO_LIVE,
        };

        let algorithm = match env.voice_token_algorithm {
            Some(raw) => raw.parse()?,
            None => SigningAlgorithm::default(),
        };

        let config = IssuerConfig {
            account_id: env.account_sid.ok_or_else(|| missing("ACCOUNT_SID"))?,
            signing_key_id: env.voice_api_key.ok_or_else(|| missing("VOICE_API_KEY"))?,
            signing_key_secret: env.voice_api_secret.ok_or_else(|| missing("VOICE_API_SECRET"))?,
            routing_application_id: env
                .voice_twiml_app_sid_call
                .ok_or_else(|| missing("VOICE_TWIML_APP_SID_CALL"))?,
            time_to_live,
            default_identity: env.client_id.filter(|id| !id.is_empty()),
            algorithm,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Where request handlers obtain issuance configuration.
///
/// Configuration is loaded on every invocation; implementations must not
/// cache across calls.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<IssuerConfig>;
}

/// Reads the process environment on each load
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn load(&self) -> Result<IssuerConfig> {
        IssuerConfig::from_env()
    }
}

/// Hands out a fixed configuration
#[derive(Debug, Clone)]
pub struct StaticConfigSource(pub IssuerConfig);

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<IssuerConfig> {
        Ok(self.0.clone())
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}
