use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::models::PublicUser;

/// Token lifetime. Clients must log in again after this elapses; there is no
/// refresh mechanism.
const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    // Bad signature, malformed structure and elapsed expiry all collapse
    // into one rejection.
    #[error("authentication required")]
    Invalid,
}

/// Signed-identity claims. The identity lives under the `user` key and
/// carries public fields only.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user: PublicUser,
    iat: u64,
    exp: u64,
}

/// Stateless token service: HS256 over a process-wide secret, no server-side
/// session state.
#[derive(Clone)]
pub struct Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Tokens {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, user: &PublicUser) -> Result<String, TokenError> {
        self.issue_at(user, unix_now())
    }

    fn issue_at(&self, user: &PublicUser, now: u64) -> Result<String, TokenError> {
        let claims = Claims {
            user: user.clone(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Invalid)
    }

    /// Checks signature and expiry. The returned identity is whatever the
    /// token asserts; it is not re-checked against the credential store.
    pub fn verify(&self, token: &str) -> Result<PublicUser, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.user)
            .map_err(|_| TokenError::Invalid)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
