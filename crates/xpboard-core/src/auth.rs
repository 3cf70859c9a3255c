//! Credential provider contract
//!
//! Sign-in and token storage live outside this crate. The pipeline only asks
//! a [`CredentialProvider`] for the current bearer token at call time.

use parking_lot::RwLock;
use std::fmt;

/// Opaque bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Supplies the bearer token; implemented by the auth collaborator
pub trait CredentialProvider: Send + Sync {
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    fn token(&self) -> Option<Credential>;

    fn logout(&self);
}

/// Token handed over by the caller (CLI flag, environment variable)
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Option<Credential>>,
}

impl StaticCredentials {
    /// Blank tokens count as absent
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Credential::new);
        Self {
            token: RwLock::new(token),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn token(&self) -> Option<Credential> {
        self.token.read().clone()
    }

    fn logout(&self) {
        *self.token.write() = None;
    }
}
