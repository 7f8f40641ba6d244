//! Identity types for tables, assets and participants
//!
//! Every party the escrow deals with (the table itself, the escrowed asset,
//! the trusted authority, hosts, players, the beneficiary) is identified by a
//! 20-byte [`Address`]. Textual forms are case-insensitive on input and always
//! rendered as `0x`-prefixed lowercase hex, which is also the form that goes
//! into signed authorization messages.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::AddressError;

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A 20-byte identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Address with every byte set to `byte`. Handy for fixtures.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; ADDRESS_LEN])
    }

    /// Take the trailing 20 bytes of a 32-byte digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[32 - ADDRESS_LEN..]);
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Canonical lowercase text form, `0x` followed by 40 hex digits.
    pub fn to_lowercase_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength { len: digits.len() });
        }

        // hex::decode accepts both cases, which is what normalizes
        // checksummed and upper-case inputs onto the same identity.
        let decoded = hex::decode(digits).map_err(|_| AddressError::InvalidHex {
            input: s.to_string(),
        })?;

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl TryFrom<&str> for Address {
    type Error = AddressError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_lowercase_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MIXED: &str = "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4";

    #[test]
    fn test_parse_normalizes_case() {
        let mixed: Address = MIXED.parse().unwrap();
        let lower: Address = MIXED.to_lowercase().parse().unwrap();
        let upper: Address = format!("0x{}", &MIXED[2..].to_uppercase()).parse().unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed, upper);
        assert_eq!(mixed.to_string(), MIXED.to_lowercase());
    }

    #[test]
    fn test_parse_without_prefix() {
        let addr: Address = "5b38da6a701c568545dcfcb03fcb875f56beddc4".parse().unwrap();
        assert_eq!(addr.to_string(), MIXED.to_lowercase());
    }

    #[test]
    fn test_parse_wrong_length() {
        let result = "0x1234".parse::<Address>();
        assert_eq!(result, Err(AddressError::InvalidLength { len: 4 }));
    }

    #[test]
    fn test_parse_bad_hex() {
        let input = "0xzz38da6a701c568545dcfcb03fcb875f56beddc4";
        assert!(matches!(
            input.parse::<Address>(),
            Err(AddressError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_zero_and_repeat() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::repeat_byte(1).is_zero());
        assert_eq!(
            Address::repeat_byte(0xab).to_string(),
            format!("0x{}", "ab".repeat(20))
        );
    }

    #[test]
    fn test_from_digest_takes_tail() {
        let mut digest = [0u8; 32];
        digest[12..].copy_from_slice(&[7u8; 20]);
        digest[0] = 0xff;
        assert_eq!(Address::from_digest(&digest), Address::repeat_byte(7));
    }

    #[test]
    fn test_serialization_is_lowercase_string() {
        let addr: Address = MIXED.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", MIXED.to_lowercase()));

        let from_mixed: Address = serde_json::from_str(&format!("\"{MIXED}\"")).unwrap();
        assert_eq!(from_mixed, addr);
    }

    proptest! {
        #[test]
        fn prop_display_parse_identity(bytes in proptest::array::uniform20(any::<u8>())) {
            let addr = Address::from_bytes(bytes);
            let text = addr.to_string();
            prop_assert_eq!(text.clone(), text.to_lowercase());
            prop_assert_eq!(text.parse::<Address>().unwrap(), addr);
            prop_assert_eq!(text.to_uppercase().replacen("0X", "0x", 1).parse::<Address>().unwrap(), addr);
        }
    }
}
