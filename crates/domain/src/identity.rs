//! Caller identity as seen by the gate.

use std::net::IpAddr;
use std::str::FromStr;

use quotagate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Network address of the calling client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientAddress(IpAddr);

impl ClientAddress {
    /// Parses a textual IPv4 or IPv6 address.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        IpAddr::from_str(trimmed)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid client address '{trimmed}': {error}")))
    }
}

impl From<IpAddr> for ClientAddress {
    fn from(value: IpAddr) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ClientAddress {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a profile record owned by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Parses a user identifier, rejecting blank and non-UUID input.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("user id must not be empty".to_owned()));
        }

        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid user id '{trimmed}': {error}")))
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The (address, optional user id) pair gating a single request.
///
/// The user id is asserted by the caller and is not authenticated here; it
/// only ever widens access when the matching profile carries an entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    address: ClientAddress,
    user_id: Option<UserId>,
}

impl Identity {
    /// Creates an identity.
    #[must_use]
    pub fn new(address: ClientAddress, user_id: Option<UserId>) -> Self {
        Self { address, user_id }
    }

    /// Returns the client address.
    #[must_use]
    pub fn address(&self) -> ClientAddress {
        self.address
    }

    /// Returns the caller-supplied user id, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientAddress, UserId};

    #[test]
    fn client_address_accepts_ipv4_and_ipv6() {
        assert!(ClientAddress::parse(" 203.0.113.7 ").is_ok());
        assert!(ClientAddress::parse("2001:db8::1").is_ok());
    }

    #[test]
    fn client_address_rejects_hostnames() {
        assert!(ClientAddress::parse("proxy.internal").is_err());
        assert!(ClientAddress::parse("").is_err());
    }

    #[test]
    fn user_id_requires_uuid() {
        assert!(UserId::parse("6f1c1d2e-7c1b-4b8e-9a43-1f2d3c4b5a69").is_ok());
        assert!(UserId::parse("alice").is_err());
        assert!(UserId::parse("   ").is_err());
    }
}
