use serde::{Deserialize, Serialize};

/// Authenticated identity persisted in the cookie session.
///
/// This is what the login flow hands over: an email that has been proven by
/// some authentication step. It carries no family, role or member id; those
/// are resolved per request against the active member roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    email: String,
}

impl SessionIdentity {
    /// Creates a session identity for an authenticated email.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_ascii_lowercase(),
        }
    }

    /// Returns the normalized email used as the stable member lookup key.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}
