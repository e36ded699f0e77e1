//! Concrete [`TokenVerifier`] (bearer-token auth, spec.md §6).

use async_trait::async_trait;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::services::TokenVerifier;
use lexi_domain::value_objects::UserId;
use sha2::{Digest, Sha256};

/// Verifies bearer tokens of the form `<user-id>.<hmac-ish signature>`
/// against a single shared secret (spec.md leaves auth provider-agnostic;
/// this is the bundled default suitable for a single-tenant deployment).
/// A real multi-tenant deployment would swap this for a JWT/OIDC verifier
/// behind the same [`TokenVerifier`] port.
pub struct SharedSecretTokenVerifier {
    secret: String,
}

impl SharedSecretTokenVerifier {
    /// Build a verifier keyed on `secret`.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    fn sign(&self, user_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        hasher.update(self.secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Issue a bearer token for `user_id`, for use by tests and local
    /// tooling that need a valid token without a full auth provider.
    #[must_use]
    pub fn issue(&self, user_id: UserId) -> String {
        format!("{}.{}", user_id, self.sign(&user_id.to_string()))
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId> {
        let (user_part, signature) = token
            .split_once('.')
            .ok_or_else(|| Error::authentication("malformed bearer token"))?;
        let user_id: UserId = user_part
            .parse()
            .map_err(|_| Error::authentication("bearer token does not name a valid user id"))?;
        if self.sign(user_part) != signature {
            return Err(Error::authentication("bearer token signature mismatch"));
        }
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_verifies() {
        let verifier = SharedSecretTokenVerifier::new("shh");
        let user_id = UserId::new();
        let token = verifier.issue(user_id);
        let verified = verifier.verify(&token).await.unwrap();
        assert_eq!(verified, user_id);
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let verifier = SharedSecretTokenVerifier::new("shh");
        let token = verifier.issue(UserId::new());
        let tampered = format!("{token}x");
        assert!(verifier.verify(&tampered).await.is_err());
    }
}
