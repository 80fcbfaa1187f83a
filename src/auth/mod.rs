//! Credential checks for administrative and tool-scoped operations.
//!
//! Every comparison goes through a [`CredentialVerifier`]. A verifier decides
//! how a secret is kept at rest ([`CredentialVerifier::seal`]) and how a
//! presented secret is compared against that form
//! ([`CredentialVerifier::verify`]). The plain-text verifier is an exact
//! equality check; the SHA-256 verifier stores digests and compares them in
//! constant time.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Seals and checks secrets.
pub trait CredentialVerifier: Send + Sync {
    /// Returns the at-rest form of `secret`.
    fn seal(&self, secret: &str) -> String;

    /// Returns whether `presented` matches the at-rest form `sealed`.
    fn verify(&self, presented: &str, sealed: &str) -> bool;
}

/// Exact string equality; secrets are kept as given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainTextVerifier;

impl CredentialVerifier for PlainTextVerifier {
    fn seal(&self, secret: &str) -> String {
        secret.to_owned()
    }

    fn verify(&self, presented: &str, sealed: &str) -> bool {
        presented == sealed
    }
}

/// Secrets are kept as lower-case hex SHA-256 digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Verifier;

impl CredentialVerifier for Sha256Verifier {
    fn seal(&self, secret: &str) -> String {
        hex::encode(Sha256::digest(secret.as_bytes()))
    }

    fn verify(&self, presented: &str, sealed: &str) -> bool {
        let Ok(expected) = hex::decode(sealed.trim()) else {
            return false;
        };
        let candidate = Sha256::digest(presented.as_bytes());
        candidate.as_slice().ct_eq(&expected).into()
    }
}

/// Credential scheme selected by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialScheme {
    /// Plain-text equality.
    #[default]
    Plain,
    /// SHA-256 digests at rest.
    Sha256,
}

/// Verifier chosen at runtime from a [`CredentialScheme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfiguredVerifier {
    /// See [`PlainTextVerifier`].
    Plain(PlainTextVerifier),
    /// See [`Sha256Verifier`].
    Sha256(Sha256Verifier),
}

impl From<CredentialScheme> for ConfiguredVerifier {
    fn from(scheme: CredentialScheme) -> Self {
        match scheme {
            CredentialScheme::Plain => Self::Plain(PlainTextVerifier),
            CredentialScheme::Sha256 => Self::Sha256(Sha256Verifier),
        }
    }
}

impl CredentialVerifier for ConfiguredVerifier {
    fn seal(&self, secret: &str) -> String {
        match self {
            Self::Plain(verifier) => verifier.seal(secret),
            Self::Sha256(verifier) => verifier.seal(secret),
        }
    }

    fn verify(&self, presented: &str, sealed: &str) -> bool {
        match self {
            Self::Plain(verifier) => verifier.verify(presented, sealed),
            Self::Sha256(verifier) => verifier.verify(presented, sealed),
        }
    }
}

/// Reasons a credential check failed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccessError {
    /// No credential was presented.
    #[error("credential missing")]
    Missing,
    /// The presented credential did not match.
    #[error("credential rejected")]
    Rejected,
}

/// Guards administrative operations with a single fixed secret.
///
/// A gate built without a secret rejects every request.
pub struct AdminGate<V: CredentialVerifier> {
    verifier: Arc<V>,
    sealed_secret: Option<String>,
}

impl<V: CredentialVerifier> AdminGate<V> {
    /// Creates a gate from the at-rest form of the admin secret.
    #[must_use]
    pub const fn new(verifier: Arc<V>, sealed_secret: Option<String>) -> Self {
        Self {
            verifier,
            sealed_secret,
        }
    }

    /// Checks a presented admin credential.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Missing`] when nothing was presented and
    /// [`AccessError::Rejected`] when the credential does not match or no
    /// admin secret is configured.
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), AccessError> {
        let credential = presented.ok_or(AccessError::Missing)?;
        let Some(sealed) = self.sealed_secret.as_deref() else {
            return Err(AccessError::Rejected);
        };
        if self.verifier.verify(credential, sealed) {
            Ok(())
        } else {
            Err(AccessError::Rejected)
        }
    }
}

impl<V: CredentialVerifier> Clone for AdminGate<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            sealed_secret: self.sealed_secret.clone(),
        }
    }
}

/// Static set of accepted tokens for the legacy common-record path.
pub struct TokenSet<V: CredentialVerifier> {
    verifier: Arc<V>,
    sealed_tokens: Vec<String>,
}

impl<V: CredentialVerifier> TokenSet<V> {
    /// Creates a set from at-rest token forms.
    #[must_use]
    pub const fn new(verifier: Arc<V>, sealed_tokens: Vec<String>) -> Self {
        Self {
            verifier,
            sealed_tokens,
        }
    }

    /// Checks a presented token for membership.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Missing`] when nothing was presented and
    /// [`AccessError::Rejected`] when the token is not in the set.
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), AccessError> {
        let token = presented.ok_or(AccessError::Missing)?;
        if self
            .sealed_tokens
            .iter()
            .any(|sealed| self.verifier.verify(token, sealed))
        {
            Ok(())
        } else {
            Err(AccessError::Rejected)
        }
    }
}

impl<V: CredentialVerifier> Clone for TokenSet<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            sealed_tokens: self.sealed_tokens.clone(),
        }
    }
}
