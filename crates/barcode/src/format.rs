//! The canonical barcode wrapper type.

use crate::{BarcodeError, BarcodeResult, BARCODE_LEN};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// idmint's canonical barcode representation (8 lowercase ASCII
/// alphanumeric characters).
///
/// This wrapper type guarantees that once constructed, the contained
/// barcode is in canonical form. Barcodes are compared case-insensitively
/// throughout the system (scanners and keyboards drift on case), so the
/// fold to lowercase happens exactly once, here.
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Accepting a barcode string from *outside* the core (a scan, a CLI
///   argument, an API request), or
/// - Deriving the default barcode for a freshly minted UUID.
///
/// # Construction
/// - [`Barcode::from_uuid`] derives the default barcode for a UUID.
/// - [`Barcode::parse`] case-folds and validates an externally supplied
///   barcode.
///
/// # Errors
/// [`Barcode::parse`] returns [`BarcodeError::InvalidInput`] if the input
/// is not 8 alphanumeric characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Barcode(String);

impl Barcode {
    /// Derives the default barcode for a UUID.
    ///
    /// The barcode is the head of the UUID's final hex group: characters
    /// 20..28 of the 32-character simple (unhyphenated) form. Because the
    /// source is hex, derived barcodes are always canonical.
    pub fn from_uuid(uuid: &Uuid) -> Self {
        let simple = uuid.simple().to_string();
        Self(simple[20..28].to_string())
    }

    /// Case-folds and validates an externally supplied barcode.
    ///
    /// Lowercasing is the only normalisation performed; wrong-width input
    /// and characters outside `0-9a-z` are rejected rather than repaired.
    ///
    /// # Errors
    ///
    /// Returns [`BarcodeError::InvalidInput`] if the folded input is not in
    /// canonical form.
    pub fn parse(input: &str) -> BarcodeResult<Self> {
        let folded = input.trim().to_lowercase();
        if Self::is_canonical(&folded) {
            return Ok(Self(folded));
        }
        Err(BarcodeError::InvalidInput(format!(
            "barcode must be {} alphanumeric characters, got: '{}'",
            BARCODE_LEN, input
        )))
    }

    /// Returns true if `input` is in canonical barcode form.
    ///
    /// This is a purely syntactic check: exactly [`BARCODE_LEN`] bytes,
    /// all of them lowercase ASCII alphanumerics.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == BARCODE_LEN
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z'))
    }

    /// Returns the canonical barcode as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Barcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Barcode {
    type Err = BarcodeError;

    /// Parses a string into a `Barcode`. Equivalent to [`Barcode::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Barcode::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Barcode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Barcode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Barcode::parse(&s).map_err(serde::de::Error::custom)
    }
}
