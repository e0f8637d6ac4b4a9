//! # Voice-Token-Core
//!
//! Issuance of short-lived voice access tokens for VoIP clients.
//!
//! A client asks for a token naming its identity; the issuer answers with a
//! compact signed JWT carrying a single voice grant for the configured
//! call-routing application. The telephony backend verifies the signature,
//! expiry and grant before it registers the device or sets up a call.
//!
//! This crate provides:
//! - Token issuance (`issuer`) and backend-side verification (`verify`)
//! - Environment-driven configuration (`config`)
//! - An HTTP endpoint mirroring the hosted token function (`api`)
//! - Tracing setup (`logging`)
//!
//! ## Example
//!
//! ```
//! use voice_token_core::{issue, IssuerConfig, TokenVerifier};
//!
//! let config = IssuerConfig::new("AC1", "SK1", "secret", "AP1").with_default_identity("100");
//! let token = issue(None, &config).unwrap();
//!
//! let claims = TokenVerifier::from_config(&config).unwrap().verify(&token).unwrap();
//! assert_eq!(claims.sub, "100");
//! ```

pub mod error;
pub mod config;
pub mod grant;
pub mod claims;
pub mod issuer;
pub mod verify;
pub mod api;
pub mod logging;

pub use error::{Error, Result};
pub use config::{ConfigSource, EnvConfigSource, IssuerConfig, SigningAlgorithm, StaticConfigSource};
pub use grant::Grant;
pub use claims::VoiceClaims;
pub use issuer::{issue, TokenIssuer};
pub use verify::{decode_unverified, TokenVerifier};
