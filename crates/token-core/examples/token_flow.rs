//! Token flow example
//!
//! Issues a voice token the way the hosted function does and shows how the
//! telephony backend would validate it before registering the device.

use std::time::Duration;

use anyhow::Result;
use voice_token_core::{decode_unverified, IssuerConfig, TokenIssuer, TokenVerifier};

fn main() -> Result<()> {
    println!("🔑 Voice Token Flow Example\n");

    let config = IssuerConfig::new("AC_example", "SK_example", "example-secret", "AP_example")
        .with_default_identity("100")
        .with_time_to_live(Duration::from_secs(3 * 3600));

    let issuer = TokenIssuer::new(config.clone())?;

    // The mobile client asks for a token for its own handle
    let token = issuer.issue(Some("200"))?;
    println!("✅ Issued token for client 200");
    println!("   {}...", &token[..token.len().min(48)]);

    // No clientid: the configured default identity is used
    let fallback = issuer.issue(None)?;
    let (_, claims) = decode_unverified(&fallback)?;
    println!("✅ Issued fallback token for client {}", claims.sub);

    // Backend side
    println!("\n🔐 Backend validates the token...");
    let verifier = TokenVerifier::from_config(&config)?;
    let claims = verifier.verify_for_application(&token, "AP_example")?;
    println!("   - Identity: {}", claims.sub);
    println!("   - Account: {}", claims.iss);
    println!("   - Application: {:?}", claims.voice_application());
    println!("   - Lifetime: {}s", claims.time_to_live().as_secs());

    match verifier.verify_for_application(&token, "AP_other") {
        Ok(_) => println!("❌ Unexpected: token accepted for another application"),
        Err(e) => println!("✅ Rejected for another application: {}", e),
    }

    Ok(())
}
