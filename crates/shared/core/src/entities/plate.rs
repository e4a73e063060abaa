use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of leading letters in a canonical plate
const LETTERS: usize = 3;
/// Number of trailing digits in a canonical plate
const DIGITS: usize = 4;

/// Reasons a captured plate string is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlateError {
    #[error("Plate is empty")]
    Empty,

    #[error("Plate must have {expected} characters, got {actual}: {plate}")]
    InvalidLength {
        plate: String,
        expected: usize,
        actual: usize,
    },

    #[error("Plate must start with 3 letters: {0}")]
    InvalidLetters(String),

    #[error("Plate must end with 4 digits: {0}")]
    InvalidDigits(String),
}

/// Validated licence plate: three letters followed by four digits (`ABC1234`)
///
/// Letters are stored uppercase, so two captures of the same plate compare equal
/// regardless of how the camera reported the case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plate(String);

impl Plate {
    /// Parse and canonicalize a raw plate string
    pub fn parse(raw: &str) -> Result<Self, PlateError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PlateError::Empty);
        }

        let chars: Vec<char> = raw.chars().collect();
        if chars.len() != LETTERS + DIGITS {
            return Err(PlateError::InvalidLength {
                plate: raw.to_string(),
                expected: LETTERS + DIGITS,
                actual: chars.len(),
            });
        }

        let (letters, digits) = chars.split_at(LETTERS);
        if !letters.iter().all(|c| c.is_ascii_alphabetic()) {
            return Err(PlateError::InvalidLetters(raw.to_string()));
        }
        if !digits.iter().all(|c| c.is_ascii_digit()) {
            return Err(PlateError::InvalidDigits(raw.to_string()));
        }

        Ok(Self(raw.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Plate {
    type Err = PlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Plate {
    type Error = PlateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Plate> for String {
    fn from(plate: Plate) -> Self {
        plate.0
    }
}

impl AsRef<str> for Plate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_plate() {
        let plate = Plate::parse("ABC1234").unwrap();
        assert_eq!(plate.as_str(), "ABC1234");
    }

    #[test]
    fn test_plate_is_uppercased_and_trimmed() {
        let plate = Plate::parse("  abc1234 ").unwrap();
        assert_eq!(plate.to_string(), "ABC1234");
    }

    #[test]
    fn test_invalid_length() {
        assert!(matches!(
            Plate::parse("AB1234"),
            Err(PlateError::InvalidLength { actual: 6, .. })
        ));
        assert!(matches!(
            Plate::parse("ABCD12345"),
            Err(PlateError::InvalidLength { actual: 9, .. })
        ));
    }

    #[test]
    fn test_invalid_layout() {
        // Mercosul-style plates mix letters into the digit block
        assert!(matches!(
            Plate::parse("ABC1D23"),
            Err(PlateError::InvalidDigits(_))
        ));
        assert!(matches!(
            Plate::parse("A1C1234"),
            Err(PlateError::InvalidLetters(_))
        ));
        assert_eq!(Plate::parse(""), Err(PlateError::Empty));
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert!(Plate::parse("ÁBC1234").is_err());
        assert!(Plate::parse("ABC١٢٣٤").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let plate: Plate = serde_json::from_str("\"xyz9876\"").unwrap();
        assert_eq!(plate.as_str(), "XYZ9876");
        assert!(serde_json::from_str::<Plate>("\"bad\"").is_err());
    }
}
