//! Device addressing and byte-string helpers.
//!
//! Readers are addressed by scheme-qualified URIs: `ser://com4` for a
//! serial port, `tcp://192.168.1.50` for a network address, and
//! `mdns://reader.local` for a discovery-resolved name. [`DeviceUri`]
//! parses and validates these; unknown schemes are rejected at parse
//! time so they never reach a transport.

use crate::error::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport scheme of a device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UriScheme {
    /// Serial line; the host part is the port identifier (e.g. `com4`).
    Serial,

    /// TCP network connection; the host part is a network address.
    Tcp,

    /// mDNS-discovered device; the host part is the advertised name.
    Mdns,
}

impl UriScheme {
    /// Scheme prefix as it appears in a URI, without the `://`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "ser",
            Self::Tcp => "tcp",
            Self::Mdns => "mdns",
        }
    }
}

impl fmt::Display for UriScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scheme-qualified device address (e.g. `tcp://192.168.1.50`).
///
/// # Examples
///
/// ```
/// use tagstream_core::{DeviceUri, UriScheme};
///
/// let uri: DeviceUri = "ser://com4".parse().unwrap();
/// assert_eq!(uri.scheme(), UriScheme::Serial);
/// assert_eq!(uri.address(), "com4");
/// assert_eq!(uri.to_string(), "ser://com4");
///
/// assert!("ftp://somewhere".parse::<DeviceUri>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceUri {
    scheme: UriScheme,
    address: String,
}

impl DeviceUri {
    /// Create a device URI from parts.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAddress` if the address part is empty.
    pub fn new(scheme: UriScheme, address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(Error::invalid_address(format!("{}://", scheme)));
        }
        Ok(Self { scheme, address })
    }

    /// Get the URI scheme.
    pub fn scheme(&self) -> UriScheme {
        self.scheme
    }

    /// Get the address part (serial port identifier, host, or name).
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for DeviceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.address)
    }
}

impl FromStr for DeviceUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (scheme, address) = s
            .split_once("://")
            .ok_or_else(|| Error::invalid_address(s))?;

        let scheme = match scheme {
            "ser" => UriScheme::Serial,
            "tcp" => UriScheme::Tcp,
            "mdns" => UriScheme::Mdns,
            _ => return Err(Error::invalid_address(s)),
        };

        if address.is_empty() {
            return Err(Error::invalid_address(s));
        }

        Ok(Self {
            scheme,
            address: address.to_string(),
        })
    }
}

/// Render a byte slice as an uppercase hex string.
///
/// # Examples
///
/// ```
/// assert_eq!(tagstream_core::to_hex_string(&[0x04, 0xAB, 0xCD]), "04ABCD");
/// ```
pub fn to_hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Parse a hex string into bytes. Accepts upper and lower case.
///
/// # Errors
///
/// Returns `Error::InvalidParameter` for odd-length input or
/// non-hex characters.
///
/// # Examples
///
/// ```
/// let bytes = tagstream_core::parse_hex_string("04abCD").unwrap();
/// assert_eq!(bytes, vec![0x04, 0xAB, 0xCD]);
/// ```
pub fn parse_hex_string(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(Error::invalid_parameter(format!(
            "Hex string must have even length, got {}",
            s.len()
        )));
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| {
                Error::invalid_parameter(format!("Invalid hex digit in '{}'", &s[i..i + 2]))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ser://com4", UriScheme::Serial, "com4")]
    #[case("tcp://192.168.3.106", UriScheme::Tcp, "192.168.3.106")]
    #[case("mdns://reader-01.local", UriScheme::Mdns, "reader-01.local")]
    fn test_parse_valid_uri(
        #[case] input: &str,
        #[case] scheme: UriScheme,
        #[case] address: &str,
    ) {
        let uri: DeviceUri = input.parse().unwrap();
        assert_eq!(uri.scheme(), scheme);
        assert_eq!(uri.address(), address);
        assert_eq!(uri.to_string(), input);
    }

    #[rstest]
    #[case("ftp://reader")]
    #[case("no-scheme")]
    #[case("tcp://")]
    #[case("")]
    fn test_parse_invalid_uri(#[case] input: &str) {
        let result = input.parse::<DeviceUri>();
        assert!(matches!(result, Err(Error::InvalidAddress { .. })));
    }

    #[test]
    fn test_uri_new_rejects_empty_address() {
        assert!(DeviceUri::new(UriScheme::Tcp, "").is_err());
        assert!(DeviceUri::new(UriScheme::Serial, "com6").is_ok());
    }

    #[test]
    fn test_uri_equality_as_registry_key() {
        let a: DeviceUri = "tcp://1.2.3.4".parse().unwrap();
        let b: DeviceUri = "tcp://1.2.3.4".parse().unwrap();
        let c: DeviceUri = "mdns://1.2.3.4".parse().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hex_round_trip() {
        let bytes = vec![0x00, 0x12, 0xAB, 0xFF];
        let hex = to_hex_string(&bytes);
        assert_eq!(hex, "0012ABFF");
        assert_eq!(parse_hex_string(&hex).unwrap(), bytes);
    }

    #[test]
    fn test_parse_hex_rejects_bad_input() {
        assert!(parse_hex_string("ABC").is_err());
        assert!(parse_hex_string("ZZ").is_err());
        assert!(parse_hex_string("").unwrap().is_empty());
    }

    #[test]
    fn test_uri_serde_round_trip() {
        let uri: DeviceUri = "tcp://10.0.0.9".parse().unwrap();
        let json = serde_json::to_string(&uri).unwrap();
        let back: DeviceUri = serde_json::from_str(&json).unwrap();
        assert_eq!(uri, back);
    }
}
