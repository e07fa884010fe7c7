//! Webhook signature verification.
//!
//! The gateway signs each delivery with HMAC-SHA256 over `"<t>.<body>"` and
//! sends `t=<unix seconds>,v1=<hex digest>` in the signature header. Several
//! `v1` entries may be present while the secret is being rotated.

use super::SignatureError;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifies and produces webhook signature headers for one shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
    tolerance: Duration,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"<redacted>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

struct ParsedHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

impl WebhookVerifier {
    /// Creates a verifier for the shared secret and accepted clock skew.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::EmptySecret`] when the secret is empty.
    pub fn new(secret: impl Into<Vec<u8>>, tolerance: Duration) -> Result<Self, SignatureError> {
        let key = secret.into();
        if key.is_empty() {
            return Err(SignatureError::EmptySecret);
        }
        Ok(Self {
            secret: key,
            tolerance,
        })
    }

    /// Verifies a raw body against its signature header.
    ///
    /// This runs before the body is parsed; nothing in the payload is
    /// trusted until it succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the header is missing or malformed,
    /// the timestamp is outside the tolerance, or no signature matches.
    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        if header.trim().is_empty() {
            return Err(SignatureError::MissingHeader);
        }
        let parsed = parse_header(header)?;

        let skew = now.timestamp().abs_diff(parsed.timestamp);
        if skew > self.tolerance.num_seconds().unsigned_abs() {
            return Err(SignatureError::TimestampOutOfTolerance {
                timestamp: parsed.timestamp,
                tolerance_secs: self.tolerance.num_seconds(),
            });
        }

        let expected = self.digest(parsed.timestamp, payload)?;
        let matched = parsed
            .signatures
            .iter()
            .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));
        if matched {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    /// Produces the signature header the gateway would send for `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::EmptySecret`] if the key is rejected.
    pub fn sign(&self, payload: &[u8], timestamp: DateTime<Utc>) -> Result<String, SignatureError> {
        let unix = timestamp.timestamp();
        let digest = self.digest(unix, payload)?;
        Ok(format!("t={unix},v1={digest}"))
    }

    fn digest(&self, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| SignatureError::EmptySecret)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::MalformedHeader)?;
                timestamp = Some(parsed);
            }
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(ts) if !signatures.is_empty() => Ok(ParsedHeader {
            timestamp: ts,
            signatures,
        }),
        _ => Err(SignatureError::MalformedHeader),
    }
}
