//! HMAC-signed bearer tokens.
//!
//! A token is `<claims>.<signature>` where `claims` is the URL-safe base64
//! encoding of a JSON [`TokenClaims`] document and `signature` is the hex
//! HMAC-SHA256 of the encoded claims under the shared secret.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::DateTime;
use hmac::{Hmac, Mac};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

use crate::identity::{
    domain::{Caller, Role, UserId},
    ports::{Authenticator, IdentityError, IdentityResult},
};

type HmacSha256 = Hmac<Sha256>;

const BEARER_SCHEME: &str = "Bearer";

/// Claims carried inside a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject user identifier.
    pub sub: String,
    /// Display name shown to other parties.
    pub name: String,
    /// Authorization role.
    pub role: Role,
    /// Expiry as a Unix timestamp in seconds.
    pub exp: i64,
}

/// Authenticator verifying HMAC-signed bearer tokens.
#[derive(Clone)]
pub struct HmacTokenAuthenticator<C>
where
    C: Clock + Send + Sync,
{
    secret: Vec<u8>,
    clock: Arc<C>,
}

impl<C> HmacTokenAuthenticator<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an authenticator for the shared signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptySecret`] when the secret is empty.
    pub fn new(secret: impl Into<Vec<u8>>, clock: Arc<C>) -> IdentityResult<Self> {
        let key = secret.into();
        if key.is_empty() {
            return Err(IdentityError::EmptySecret);
        }
        Ok(Self { secret: key, clock })
    }

    /// Issues a signed token for the given claims.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedToken`] when the claims cannot be
    /// encoded.
    pub fn issue(&self, claims: &TokenClaims) -> IdentityResult<String> {
        let json = serde_json::to_vec(claims)
            .map_err(|err| IdentityError::MalformedToken(err.to_string()))?;
        let encoded = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.mac_for(&encoded)?.finalize().into_bytes());
        Ok(format!("{encoded}.{signature}"))
    }

    fn mac_for(&self, encoded_claims: &str) -> IdentityResult<HmacSha256> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| IdentityError::EmptySecret)?;
        mac.update(encoded_claims.as_bytes());
        Ok(mac)
    }
}

impl<C> Authenticator for HmacTokenAuthenticator<C>
where
    C: Clock + Send + Sync,
{
    fn authenticate(&self, bearer_token: &str) -> IdentityResult<Caller> {
        let trimmed = bearer_token.trim();
        let token = trimmed
            .strip_prefix(BEARER_SCHEME)
            .map_or(trimmed, str::trim_start);
        if token.is_empty() {
            return Err(IdentityError::MissingCredentials);
        }

        let (encoded, signature_hex) = token
            .split_once('.')
            .ok_or_else(|| IdentityError::MalformedToken("missing signature".to_owned()))?;
        let signature = hex::decode(signature_hex)
            .map_err(|err| IdentityError::MalformedToken(err.to_string()))?;
        self.mac_for(encoded)?
            .verify_slice(&signature)
            .map_err(|_| IdentityError::InvalidSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|err| IdentityError::MalformedToken(err.to_string()))?;
        let claims: TokenClaims = serde_json::from_slice(&json)
            .map_err(|err| IdentityError::MalformedToken(err.to_string()))?;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| IdentityError::MalformedToken("expiry out of range".to_owned()))?;
        if expires_at <= self.clock.utc() {
            return Err(IdentityError::Expired(expires_at));
        }

        let user_id = UserId::new(claims.sub)?;
        Ok(Caller::new(user_id, claims.name, claims.role))
    }
}
