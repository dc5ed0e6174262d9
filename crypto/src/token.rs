//! Signed, time-boxed verification tokens.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! with no padding. The claims bind a subscriber id to its current
//! verification code plus an absolute expiry in Unix seconds.
//!
//! Parsing verifies the MAC before trusting anything in the payload, then
//! checks expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use wordrop_types::{SubscriberId, Timestamp};

use crate::{CryptoError, TokenError};

type HmacSha256 = Hmac<Sha256>;

const ALG: &str = "HS256";
const TYP: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawClaims {
    id: String,
    verification_code: String,
    exp: u64,
}

/// What a valid token proves: this subscriber was sent this code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationClaims {
    pub id: SubscriberId,
    pub verification_code: String,
    pub expires_at: Timestamp,
}

/// Issues and validates verification tokens with a symmetric secret.
pub struct TokenCodec {
    keyed: HmacSha256,
    ttl_secs: u64,
}

impl TokenCodec {
    /// Default token lifetime: 15 minutes.
    pub const DEFAULT_TTL_SECS: u64 = 15 * 60;

    /// Build a codec. An empty secret is a configuration error.
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::MissingSecret);
        }
        let keyed = HmacSha256::new_from_slice(secret).map_err(|_| CryptoError::MissingSecret)?;
        Ok(Self { keyed, ttl_secs })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Mint a token for `(id, code)` that expires `ttl_secs` after `now`.
    pub fn issue(&self, id: &SubscriberId, code: &str, now: Timestamp) -> Result<String, CryptoError> {
        let header = TokenHeader {
            alg: ALG.to_string(),
            typ: TYP.to_string(),
        };
        let claims = RawClaims {
            id: id.as_str().to_string(),
            verification_code: code.to_string(),
            exp: now.plus_secs(self.ttl_secs).as_secs(),
        };

        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = URL_SAFE_NO_PAD.encode(self.mac(signing_input.as_bytes()).finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Validate a token and return its claims.
    pub fn parse(&self, token: &str, now: Timestamp) -> Result<VerificationClaims, TokenError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed("expected three segments".into()));
        };

        let header: TokenHeader = decode_json(header_b64, "header")?;
        if header.alg != ALG || !header.typ.eq_ignore_ascii_case(TYP) {
            return Err(TokenError::Malformed(format!(
                "unexpected signing method {}",
                header.alg
            )));
        }

        let signature = decode_segment(sig_b64, "signature")?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        self.mac(signing_input.as_bytes())
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: RawClaims = decode_json(claims_b64, "claims")?;
        let expires_at = Timestamp::new(claims.exp);
        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        let id = SubscriberId::parse(&claims.id)
            .map_err(|_| TokenError::Malformed("invalid subscriber id".into()))?;

        Ok(VerificationClaims {
            id,
            verification_code: claims.verification_code,
            expires_at,
        })
    }

    fn mac(&self, data: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(data);
        mac
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(segment.as_bytes())
        .map_err(|e| TokenError::Malformed(format!("invalid base64url in {what}: {e}")))
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str, what: &str) -> Result<T, TokenError> {
    let raw = decode_segment(segment, what)?;
    serde_json::from_slice(&raw).map_err(|e| TokenError::Malformed(format!("invalid {what} JSON: {e}")))
}
