//! JWT authentication with Ed25519 signatures
//!
//! Boundary adapter for the identity provider: a bearer credential goes in,
//! a [`Caller`] comes out. Service operations never read identity
//! ambiently; they take the verified `Caller` as an explicit parameter.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{EscrowError, EscrowResult};
use crate::types::{Caller, PartyRole};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Party id
    pub sub: String,
    /// Ed25519 public key (hex) the token is signed with
    pub pk: String,
    /// Role tag: "investor" | "freelancer"
    pub role: String,
    /// Expiration timestamp
    pub exp: u64,
    /// Issued at timestamp
    pub iat: u64,
}

/// Verify a JWT token signed with Ed25519 and produce the acting caller.
///
/// Any failure (bad algorithm, bad signature, unknown role, expiry) maps to
/// `Unauthenticated`.
pub fn verify_jwt(token: &str) -> EscrowResult<Caller> {
    let header = decode_header(token)
        .map_err(|e| EscrowError::unauthenticated(format!("invalid JWT header: {}", e)))?;

    if header.alg != Algorithm::EdDSA {
        return Err(EscrowError::unauthenticated(format!(
            "invalid algorithm: expected EdDSA, got {:?}",
            header.alg
        )));
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(EscrowError::unauthenticated("invalid JWT format"));
    }

    // Decode the claims without verification first to get the public key
    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| EscrowError::unauthenticated(format!("invalid JWT claims: {}", e)))?;
    let claims = &token_data.claims;

    let public_key_bytes = hex::decode(&claims.pk)
        .map_err(|e| EscrowError::unauthenticated(format!("invalid public key hex: {}", e)))?;
    let public_key_bytes: [u8; 32] = public_key_bytes
        .try_into()
        .map_err(|_| EscrowError::unauthenticated("invalid public key length"))?;
    let public_key = VerifyingKey::from_bytes(&public_key_bytes)
        .map_err(|e| EscrowError::unauthenticated(format!("invalid public key: {}", e)))?;

    // Verify the signature over header.payload
    let message = format!("{}.{}", parts[0], parts[1]);
    let signature_bytes = base64_url_decode(parts[2])
        .map_err(|e| EscrowError::unauthenticated(format!("invalid signature encoding: {}", e)))?;
    let signature_bytes: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| EscrowError::unauthenticated("invalid signature length"))?;
    let signature = Signature::from_bytes(&signature_bytes);

    public_key
        .verify(message.as_bytes(), &signature)
        .map_err(|_| EscrowError::unauthenticated("invalid signature"))?;

    // Check expiration
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| EscrowError::unauthenticated(e.to_string()))?
        .as_secs();

    if claims.exp <= now {
        return Err(EscrowError::unauthenticated("token expired"));
    }

    let role = PartyRole::parse(&claims.role)
        .ok_or_else(|| EscrowError::unauthenticated(format!("unknown role '{}'", claims.role)))?;

    Ok(Caller {
        id: claims.sub.clone(),
        role,
    })
}

/// Create a JWT token (for issuing test credentials)
pub fn create_jwt(
    private_key_bytes: &[u8],
    public_key_hex: &str,
    party_id: &str,
    role: PartyRole,
    duration_secs: u64,
) -> anyhow::Result<String> {
    use ed25519_dalek::{Signer, SigningKey};

    let key_bytes: [u8; 32] = private_key_bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("invalid private key length"))?;
    let signing_key = SigningKey::from_bytes(&key_bytes);

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        sub: party_id.to_string(),
        pk: public_key_hex.to_string(),
        role: role.as_str().to_string(),
        exp: now + duration_secs,
        iat: now,
    };

    let header = r#"{"alg":"EdDSA","typ":"JWT"}"#;
    let header_b64 = base64_url_encode(header.as_bytes());

    let payload = serde_json::to_string(&claims)?;
    let payload_b64 = base64_url_encode(payload.as_bytes());

    let message = format!("{}.{}", header_b64, payload_b64);
    let signature = signing_key.sign(message.as_bytes());
    let signature_b64 = base64_url_encode(&signature.to_bytes());

    Ok(format!("{}.{}", message, signature_b64))
}

/// Base64URL encode (without padding)
fn base64_url_encode(data: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, data)
}

/// Base64URL decode (without padding)
fn base64_url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, data)
}
