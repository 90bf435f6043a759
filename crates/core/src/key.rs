//! Normalization of 11-digit national identifiers (CPF)
//!
//! A raw key may carry any formatting ("111.444.777-35", "111 444 777 35");
//! only its ASCII digits are significant. Two raw keys name the same record
//! when their digit strings are identical.

use crate::{Error, Result};
use std::fmt;

/// Number of digits in a normalized key
pub const KEY_DIGITS: usize = 11;

/// A validated, normalized 11-digit key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpfKey {
    digits: String,
    value: u64,
}

impl CpfKey {
    /// Strip formatting from `raw` and validate the digit count
    pub fn parse(raw: &str) -> Result<Self> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

        if digits.len() != KEY_DIGITS {
            return Err(Error::MalformedKey {
                key: raw.to_string(),
                digits: digits.len(),
            });
        }

        // 11 decimal digits always fit in a u64
        let value = digits
            .bytes()
            .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'));

        Ok(Self { digits, value })
    }

    /// The normalized digits
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// The digits read as an integer
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Canonical `XXX.XXX.XXX-XX` rendering
    pub fn formatted(&self) -> String {
        let d = &self.digits;
        format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
    }

    /// Whether the last two digits satisfy the CPF mod-11 check digit rule.
    ///
    /// The table never looks at this; it only matters to the generator.
    pub fn has_valid_check_digits(&self) -> bool {
        let digits: Vec<u8> = self.digits.bytes().map(|b| b - b'0').collect();
        check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
    }
}

/// Compute the next CPF check digit for `base` (9 or 10 digits)
pub fn check_digit(base: &[u8]) -> u8 {
    let weight_start = base.len() as u32 + 1;
    let sum: u32 = base
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * (weight_start - i as u32))
        .sum();

    match sum % 11 {
        r if r < 2 => 0,
        r => (11 - r) as u8,
    }
}

impl fmt::Display for CpfKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl std::str::FromStr for CpfKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_formatting() {
        let plain = CpfKey::parse("11144477735").unwrap();
        let formatted = CpfKey::parse("111.444.777-35").unwrap();

        assert_eq!(plain, formatted);
        assert_eq!(formatted.as_str(), "11144477735");
        assert_eq!(formatted.value(), 11_144_477_735);
    }

    #[test]
    fn test_parse_keeps_leading_zeros() {
        let key = CpfKey::parse("000.000.001-91").unwrap();
        assert_eq!(key.as_str(), "00000000191");
        assert_eq!(key.value(), 191);
    }

    #[test]
    fn test_malformed_keys() {
        for raw in ["123", "123.456.789-000", "", "abc.def.ghi-jk", "1114447773"] {
            let err = CpfKey::parse(raw).unwrap_err();
            assert!(err.is_malformed_key(), "{raw:?} should be malformed");
        }

        match CpfKey::parse("123.456.789-000") {
            Err(Error::MalformedKey { key, digits }) => {
                assert_eq!(key, "123.456.789-000");
                assert_eq!(digits, 12);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_non_ascii_digits_are_ignored() {
        // Arabic-Indic digits are not ASCII and are stripped like separators
        let err = CpfKey::parse("١١١٤٤٤٧٧٧٣٥").unwrap_err();
        assert_eq!(
            err,
            Error::MalformedKey {
                key: "١١١٤٤٤٧٧٧٣٥".to_string(),
                digits: 0
            }
        );
    }

    #[test]
    fn test_formatted() {
        let key: CpfKey = "11144477735".parse().unwrap();
        assert_eq!(key.formatted(), "111.444.777-35");
        assert_eq!(key.to_string(), "11144477735");
    }

    #[test]
    fn test_check_digits() {
        assert!(CpfKey::parse("111.444.777-35").unwrap().has_valid_check_digits());
        assert!(!CpfKey::parse("111.444.777-36").unwrap().has_valid_check_digits());
        assert_eq!(check_digit(&[1, 1, 1, 4, 4, 4, 7, 7, 7]), 3);
        assert_eq!(check_digit(&[1, 1, 1, 4, 4, 4, 7, 7, 7, 3]), 5);
    }
}
