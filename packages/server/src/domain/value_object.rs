//! Value objects for the chat relay.

use std::fmt;

use uuid::Uuid;

use super::error::AdmissionError;

/// Identity of one accepted TCP connection.
///
/// Generated once per accepted socket and never reused, so two sessions of a
/// client with the same display name are still distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random connection identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name chosen by a client.
///
/// Surrounding whitespace (including the line terminator) is stripped on
/// construction. Comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientName(String);

impl ClientName {
    /// Create a name from the raw line the peer sent
    ///
    /// # Errors
    ///
    /// Returns `AdmissionError::EmptyName` when nothing is left after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AdmissionError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AdmissionError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
