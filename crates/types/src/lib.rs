//! Validated vocabulary types shared across the idmint workspace.
//!
//! Identifier sets are named pools of barcodes, and every set carries a
//! `use` tag from a closed vocabulary describing what the identifiers in it
//! will label (samples, collection tubes, kits, ...). Both the set name and
//! the use tag are validated at the edge so the core never sees a malformed
//! value.

/// Errors that can occur when creating validated vocabulary types.
#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    /// The input text was empty or contained only whitespace
    #[error("set name cannot be empty")]
    EmptyName,
    /// The input contained a character outside the allowed alphabet
    #[error("set name may only contain letters, digits, '-' and '_' (found {0:?})")]
    InvalidNameCharacter(char),
    /// The input did not match any known identifier use
    #[error("unknown identifier use {0:?} (expected one of: sample, collection, clia, kit, test-strip)")]
    UnknownUse(String),
}

/// The name of an identifier set.
///
/// This type wraps a `String` and guarantees it is non-empty, trimmed, and
/// lowercase, using only letters, digits, `-` and `_`. Set names are
/// compared case-insensitively everywhere (operators type them by hand), so
/// they are case-folded once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetName(String);

impl SetName {
    /// Creates a new `SetName` from the given input.
    ///
    /// The input is trimmed and lowercased. If the result is empty, or
    /// contains characters outside the allowed alphabet, an error is
    /// returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, VocabularyError> {
        let folded = input.as_ref().trim().to_lowercase();
        if folded.is_empty() {
            return Err(VocabularyError::EmptyName);
        }
        if let Some(bad) = folded
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(VocabularyError::InvalidNameCharacter(bad));
        }
        Ok(Self(folded))
    }

    /// Returns the inner name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for SetName {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SetName::new(s)
    }
}

impl serde::Serialize for SetName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for SetName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SetName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// The kind of thing the identifiers in a set will label.
///
/// This enum is deliberately *closed*: new uses are a schema decision, not
/// something callers invent on the fly. The wire/stored form is the
/// kebab-case name (`"test-strip"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierUse {
    /// Aliquots and other lab sample tubes.
    Sample,
    /// Collection containers as received from the field.
    Collection,
    /// CLIA-compliant result reporting identifiers.
    Clia,
    /// Self-test or mail-in kits.
    Kit,
    /// Rapid test strips.
    TestStrip,
}

impl IdentifierUse {
    /// Returns the kebab-case name used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierUse::Sample => "sample",
            IdentifierUse::Collection => "collection",
            IdentifierUse::Clia => "clia",
            IdentifierUse::Kit => "kit",
            IdentifierUse::TestStrip => "test-strip",
        }
    }
}

impl std::fmt::Display for IdentifierUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IdentifierUse {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sample" => Ok(IdentifierUse::Sample),
            "collection" => Ok(IdentifierUse::Collection),
            "clia" => Ok(IdentifierUse::Clia),
            "kit" => Ok(IdentifierUse::Kit),
            "test-strip" => Ok(IdentifierUse::TestStrip),
            other => Err(VocabularyError::UnknownUse(other.to_string())),
        }
    }
}
