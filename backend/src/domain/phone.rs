//! M-PESA subscriber number normalisation.
//!
//! Daraja requires MSISDNs as 12 digits with the 254 country prefix. Users
//! type numbers as `07XX...`, `+254...`, or `254...`; everything non-numeric
//! is stripped before normalising.

use serde::{Deserialize, Serialize};

/// Validation failure for subscriber numbers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("phone number must normalise to 12 digits with the 254 prefix")]
pub struct PhoneNumberError;

/// Normalised M-PESA subscriber number (`254XXXXXXXXX`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalise a raw phone number.
    ///
    /// Strips non-digits, replaces a leading `0` with `254`, prefixes bare
    /// subscriber numbers, and insists on exactly 12 digits.
    ///
    /// # Errors
    /// Returns [`PhoneNumberError`] when the cleaned value is not 12 digits.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PhoneNumberError> {
        let digits: String = raw.as_ref().chars().filter(char::is_ascii_digit).collect();
        let normalised = if let Some(rest) = digits.strip_prefix('0') {
            format!("254{rest}")
        } else if digits.starts_with("254") {
            digits
        } else {
            format!("254{digits}")
        };
        if normalised.len() != 12 {
            return Err(PhoneNumberError);
        }
        Ok(Self(normalised))
    }

    /// The normalised number as sent to Daraja.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}
