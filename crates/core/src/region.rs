//! Region ("state") codes partitioning leads and capacity.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Two-letter region code, normalized to upper case (`"ca"` → `"CA"`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode([u8; 2]);

impl RegionCode {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(DomainError::validation(format!(
                "region code must be two ASCII letters, got {trimmed:?}"
            )));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Only ever built from ASCII letters.
        core::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl core::fmt::Display for RegionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RegionCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RegionCode> for String {
    fn from(value: RegionCode) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let code = RegionCode::parse(" ca ").unwrap();
        assert_eq!(code.as_str(), "CA");
        assert_eq!(code, "CA".parse().unwrap());
    }

    #[test]
    fn parse_rejects_wrong_length_and_digits() {
        for bad in ["", "C", "CAL", "C1", "12"] {
            assert!(
                matches!(RegionCode::parse(bad), Err(DomainError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn serde_uses_plain_string() {
        let code = RegionCode::parse("ny").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"NY\"");
        let back: RegionCode = serde_json::from_str("\"ny\"").unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<RegionCode>("\"NYC\"").is_err());
    }

    proptest! {
        /// Property: any pair of ASCII letters parses and displays upper-cased.
        #[test]
        fn any_two_letters_parse(a in "[a-zA-Z]", b in "[a-zA-Z]") {
            let raw = format!("{a}{b}");
            let code = RegionCode::parse(&raw).unwrap();
            prop_assert_eq!(code.as_str(), raw.to_ascii_uppercase());
        }
    }
}
