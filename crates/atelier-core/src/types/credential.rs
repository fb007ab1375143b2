//! Channel credential — the signed token that authorizes a realtime
//! subscription for one user within one tenant.
//!
//! The transport validates the token server-side; the channel manager also
//! checks expiry and subject *client-side* before attempting to subscribe,
//! so a stale or foreign session never reaches the transport handshake.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::id::{TenantId, UserId};

/// Claims payload embedded in every channel credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Subject — the user ID this credential was issued for.
    pub sub: Uuid,
    /// Tenant the subscription is scoped to.
    pub tid: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl CredentialClaims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Checks whether this credential has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_leeway(0)
    }

    /// Expiry check with clock-skew leeway: the credential is still
    /// accepted for `leeway_seconds` past its nominal expiry.
    pub fn is_expired_with_leeway(&self, leeway_seconds: u64) -> bool {
        Utc::now().timestamp() >= self.exp.saturating_add(leeway_seconds as i64)
    }
}

/// A decoded channel credential: the raw token plus its verified claims.
#[derive(Clone)]
pub struct ChannelCredential {
    /// Raw signed token, forwarded to the transport as-is.
    token: String,
    /// Verified claims.
    claims: CredentialClaims,
}

impl std::fmt::Debug for ChannelCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the raw token.
        f.debug_struct("ChannelCredential")
            .field("sub", &self.claims.sub)
            .field("tid", &self.claims.tid)
            .field("exp", &self.claims.exp)
            .finish()
    }
}

impl ChannelCredential {
    /// Builds a credential from an already-decoded token and its claims.
    ///
    /// Intended for transports that perform their own signature
    /// verification and hand back the claims.
    pub fn from_parts(token: impl Into<String>, claims: CredentialClaims) -> Self {
        Self {
            token: token.into(),
            claims,
        }
    }

    /// Decodes and validates a credential token string.
    ///
    /// Checks:
    /// 1. Signature validity (HS256)
    /// 2. Expiration (with the given leeway for clock skew)
    pub fn decode(token: &str, secret: &[u8], leeway_seconds: u64) -> AppResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_seconds;

        let data = decode::<CredentialClaims>(token, &DecodingKey::from_secret(secret), &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Credential has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::authentication("Invalid credential format")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid credential signature")
                }
                _ => AppError::authentication(format!("Credential validation failed: {e}")),
            })?;

        Ok(Self {
            token: token.to_string(),
            claims: data.claims,
        })
    }

    /// Issues a new signed credential for a tenant/user pair.
    pub fn issue(
        secret: &[u8],
        tenant_id: TenantId,
        user_id: UserId,
        ttl_seconds: i64,
    ) -> AppResult<Self> {
        let now = Utc::now().timestamp();
        let claims = CredentialClaims {
            sub: user_id.into_uuid(),
            tid: tenant_id.into_uuid(),
            iat: now,
            exp: now + ttl_seconds,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| AppError::authentication(format!("Failed to sign credential: {e}")))?;

        Ok(Self { token, claims })
    }

    /// Returns the raw token string.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the subject user ID.
    pub fn subject(&self) -> UserId {
        UserId::from_uuid(self.claims.sub)
    }

    /// Returns the tenant claim.
    pub fn tenant(&self) -> TenantId {
        TenantId::from_uuid(self.claims.tid)
    }

    /// Returns the claims payload.
    pub fn claims(&self) -> &CredentialClaims {
        &self.claims
    }

    /// Checks whether the credential has expired.
    pub fn is_expired(&self) -> bool {
        self.claims.is_expired()
    }

    /// Verifies that this credential is valid for the expected scope.
    ///
    /// Rejects expired credentials (with the given clock-skew leeway),
    /// subject mismatches (a credential for a different user of the same
    /// transport), and tenant mismatches.
    pub fn verify_scope(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        leeway_seconds: u64,
    ) -> AppResult<()> {
        if self.claims.is_expired_with_leeway(leeway_seconds) {
            return Err(AppError::authentication("Credential has expired"));
        }
        if self.claims.sub != user_id.into_uuid() {
            return Err(AppError::authentication(format!(
                "Credential subject {} does not match expected user {}",
                self.claims.sub, user_id
            )));
        }
        if self.claims.tid != tenant_id.into_uuid() {
            return Err(AppError::authentication(format!(
                "Credential tenant {} does not match expected tenant {}",
                self.claims.tid, tenant_id
            )));
        }
        Ok(())
    }
}
