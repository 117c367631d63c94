// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Missing prefix length: {0} (expected address/prefix)")]
    MissingPrefixLength(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),

    #[error("Invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(i64),

    #[error("Invalid interface name: {0:?}")]
    InvalidInterface(String),
}

/// IP Address with CIDR notation value object
///
/// A self IP is always bound with a prefix, so unlike a bare host address the
/// prefix length is mandatory here.
/// Invariants:
/// - Valid IP address format
/// - Prefix length present and within range for the address family
/// - Canonical representation
///
/// # Examples
///
/// ```rust
/// use bigip_network::domain::IpAddressWithCidr;
///
/// let ip = IpAddressWithCidr::new("11.1.1.1/24").unwrap();
/// assert_eq!(ip.address().to_string(), "11.1.1.1");
/// assert_eq!(ip.prefix_length(), 24);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpAddressWithCidr {
    address: IpAddr,
    prefix_length: u8,
}

impl IpAddressWithCidr {
    /// Parse `address/prefix` notation
    ///
    /// # Invariants
    /// - Valid IP address format
    /// - Prefix 0-32 for IPv4, 0-128 for IPv6
    /// - No surrounding whitespace
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        if cidr.trim() != cidr {
            return Err(NetworkError::InvalidCidr(cidr.to_string()));
        }

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::MissingPrefixLength(cidr.to_string()))?;

        let address = IpAddr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        if prefix_str.is_empty() || !prefix_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(NetworkError::InvalidCidr(cidr.to_string()));
        }

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: IpAddr, prefix_length: u8) -> Result<Self, NetworkError> {
        let max_prefix = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if prefix_length > max_prefix {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    /// Get the IP address
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Get the prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Check if this is an IPv4 address
    pub fn is_ipv4(&self) -> bool {
        matches!(self.address, IpAddr::V4(_))
    }

    /// Check if this is an IPv6 address
    pub fn is_ipv6(&self) -> bool {
        matches!(self.address, IpAddr::V6(_))
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.address, self.prefix_length)
    }
}

impl fmt::Display for IpAddressWithCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for IpAddressWithCidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// VLAN ID value object
///
/// Represents a VLAN ID (IEEE 802.1Q) with validation.
/// Invariants:
/// - Valid VLAN ID range (1-4094)
/// - VLAN 0 and 4095 are reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID
    pub const MAX: u16 = 4094;

    /// Create a new VLAN ID with validation
    ///
    /// Takes a wide integer so that negative and oversized fixture values
    /// are reported as-is instead of wrapping.
    pub fn new(id: i64) -> Result<Self, NetworkError> {
        if id < i64::from(Self::MIN) || id > i64::from(Self::MAX) {
            return Err(NetworkError::InvalidVlanId(id));
        }

        Ok(Self(id as u16))
    }

    /// Get the VLAN ID value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = NetworkError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

/// Physical or trunk interface name a VLAN is attached to (e.g. `1.2`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Create a new interface name
    ///
    /// # Invariants
    /// - Non-empty
    /// - No whitespace and no `/` (interface names are not folder-scoped)
    pub fn new(name: impl Into<String>) -> Result<Self, NetworkError> {
        let name = name.into();

        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(NetworkError::InvalidInterface(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(" 11.1.1.1/24" ; "leading space")]
    #[test_case("11.1.1.1/24 " ; "trailing space")]
    #[test_case("11.1.1.1/24\n" ; "trailing newline")]
    fn test_cidr_rejects_surrounding_whitespace(raw: &str) {
        assert_eq!(
            IpAddressWithCidr::new(raw),
            Err(NetworkError::InvalidCidr(raw.to_string()))
        );
    }

    #[test]
    fn test_ip_address_cidr() {
        let ip = IpAddressWithCidr::new("11.1.1.1/24").unwrap();
        assert_eq!(ip.address().to_string(), "11.1.1.1");
        assert_eq!(ip.prefix_length(), 24);
        assert!(ip.is_ipv4());
        assert_eq!(ip.as_cidr(), "11.1.1.1/24");
    }

    #[test]
    fn test_ipv6_address() {
        let ip = IpAddressWithCidr::new("2001:db8::1/64").unwrap();
        assert!(ip.is_ipv6());
        assert_eq!(ip.prefix_length(), 64);
    }

    #[test]
    fn test_canonical_form() {
        let ip = IpAddressWithCidr::new("2001:0db8:0000::0001/64").unwrap();
        assert_eq!(ip.to_string(), "2001:db8::1/64");
    }

    #[test_case("11.1.1.1" ; "missing prefix")]
    #[test_case("999.999.999.999/24" ; "octet out of range")]
    #[test_case("11.1.1.1/33" ; "ipv4 prefix too long")]
    #[test_case("2001:db8::1/129" ; "ipv6 prefix too long")]
    #[test_case("11.1.1.1/" ; "empty prefix")]
    #[test_case("11.1.1.1/+4" ; "signed prefix")]
    #[test_case("/24" ; "empty address")]
    #[test_case("" ; "empty")]
    fn test_invalid_cidr(input: &str) {
        assert!(IpAddressWithCidr::new(input).is_err());
    }

    #[test]
    fn test_missing_prefix_error_kind() {
        assert_eq!(
            IpAddressWithCidr::new("11.1.1.1"),
            Err(NetworkError::MissingPrefixLength("11.1.1.1".to_string()))
        );
    }

    #[test]
    fn test_vlan_id() {
        assert!(VlanId::new(101).is_ok());
        assert!(VlanId::new(1).is_ok());
        assert!(VlanId::new(4094).is_ok());
        assert!(VlanId::new(0).is_err()); // Reserved
        assert!(VlanId::new(4095).is_err()); // Reserved
        assert!(VlanId::new(-1).is_err());
        assert_eq!(VlanId::new(70000), Err(NetworkError::InvalidVlanId(70000)));
    }

    #[test]
    fn test_interface_name() {
        assert_eq!(InterfaceName::new("1.2").unwrap().as_str(), "1.2");
        assert!(InterfaceName::new("").is_err());
        assert!(InterfaceName::new("1 2").is_err());
        assert!(InterfaceName::new("/Common/trunk").is_err());
    }
}
