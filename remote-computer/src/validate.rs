//! Validation of configured network addresses.
//!
//! MAC addresses are accepted as six hex pairs separated consistently by
//! `:` or `-`, or with no separator at all. Mixed separators are rejected.

use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Field, InvalidInputError};

/// One alternative per separator, since the same separator must recur in
/// every group.
static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[0-9a-f]{2}(?::[0-9a-f]{2}){5}|[0-9a-f]{2}(?:-[0-9a-f]{2}){5}|[0-9a-f]{12})$",
    )
    .expect("MAC pattern is valid")
});

/// A validated hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacAddress {
    octets: [u8; 6],
    raw: String,
}

impl MacAddress {
    /// The six address octets.
    pub fn octets(&self) -> [u8; 6] {
        self.octets
    }

    /// The address exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Canonical dot-separated lower-case form, e.g. `00.11.22.33.44.55`.
    pub fn normalized(&self) -> String {
        self.octets
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validate a MAC address and decode its octets.
pub fn validate_mac(raw: &str) -> Result<MacAddress, InvalidInputError> {
    let lower = raw.to_ascii_lowercase();
    if !MAC_PATTERN.is_match(&lower) {
        return Err(InvalidInputError::new(Field::Mac, raw));
    }

    let digits: String = lower.chars().filter(char::is_ascii_hexdigit).collect();
    let mut octets = [0u8; 6];
    hex::decode_to_slice(&digits, &mut octets)
        .map_err(|_| InvalidInputError::new(Field::Mac, raw))?;

    Ok(MacAddress {
        octets,
        raw: raw.to_string(),
    })
}

/// Validate an IPv4 or IPv6 literal.
pub fn validate_ip(raw: &str) -> Result<IpAddr, InvalidInputError> {
    raw.parse::<IpAddr>()
        .map_err(|_| InvalidInputError::new(Field::Ip, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_colon_separated() {
        let mac = validate_mac("1a:2b:3c:4d:5e:6f").unwrap();
        assert_eq!(mac.octets(), [0x1a, 0x2b, 0x3c, 0x4d, 0x5e, 0x6f]);
        assert_eq!(mac.as_str(), "1a:2b:3c:4d:5e:6f");
    }

    #[test]
    fn test_mac_dash_and_bare() {
        assert!(validate_mac("00-11-22-33-44-55").is_ok());
        assert!(validate_mac("1a2b3c4d5e6f").is_ok());
    }

    #[test]
    fn test_mac_is_case_insensitive() {
        let mac = validate_mac("AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(mac.octets(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_mac_mixed_separators_rejected() {
        let err = validate_mac("1a:2b-3c:4d:5e:6f").unwrap_err();
        assert_eq!(err.field, Field::Mac);
        assert!(validate_mac("1a2b:3c:4d:5e:6f").is_err());
    }

    #[test]
    fn test_mac_malformed_rejected() {
        assert!(validate_mac("").is_err());
        assert!(validate_mac("1a:2b:3c:4d:5e").is_err());
        assert!(validate_mac("1a:2b:3c:4d:5e:6f:70").is_err());
        assert!(validate_mac("gg:2b:3c:4d:5e:6f").is_err());
        assert!(validate_mac("1a.2b.3c.4d.5e.6f").is_err());
        assert!(validate_mac("1a:2b:3c:4d:5e:6f ").is_err());
    }

    #[test]
    fn test_mac_normalized() {
        let mac = validate_mac("00-11-22-33-44-55").unwrap();
        assert_eq!(mac.normalized(), "00.11.22.33.44.55");
        let mac = validate_mac("A0B1C2D3E4F5").unwrap();
        assert_eq!(mac.normalized(), "a0.b1.c2.d3.e4.f5");
    }

    #[test]
    fn test_ip_validation() {
        assert!(validate_ip("192.168.1.1").is_ok());
        assert!(validate_ip("::1").is_ok());
        assert!(validate_ip("fe80::1ff:fe23:4567:890a").is_ok());

        let err = validate_ip("999.1.1.1").unwrap_err();
        assert_eq!(err.field, Field::Ip);
        assert!(validate_ip("").is_err());
        assert!(validate_ip("host.example").is_err());
        assert!(validate_ip("192.168.1").is_err());
    }
}
