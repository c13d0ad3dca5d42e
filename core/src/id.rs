//! Tolerant numeric identifiers.
//!
//! # Design
//! The remote service encodes the same identifier as `7`, `"7"` or `"007"`,
//! sometimes within a single response. `Id::decode` keeps only the ASCII
//! digits of the raw token and parses what remains, so every one of those
//! spellings lands on the same value. A minus sign is not a digit, so an
//! accidentally negative encoding decodes to its magnitude; the service
//! behaves the same way and callers rely on it.
//!
//! Encoding always produces a bare JSON number.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Reasons a raw token cannot be read as an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Nothing was left after stripping non-digit characters.
    #[error("malformed identifier {raw:?}: no digits")]
    NoDigits { raw: String },

    /// The digit string does not fit in 64 bits.
    #[error("malformed identifier {raw:?}: does not fit in 64 bits")]
    Overflow { raw: String },
}

/// A non-negative 64-bit identifier of a remote resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Zero is what the service hands back for "no reference".
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Decode a raw JSON token (quoted or not) into an identifier.
    pub fn decode(raw: &[u8]) -> Result<Self, IdError> {
        let digits: String = raw
            .iter()
            .filter(|b| b.is_ascii_digit())
            .map(|&b| char::from(b))
            .collect();

        if digits.is_empty() {
            return Err(IdError::NoDigits {
                raw: String::from_utf8_lossy(raw).into_owned(),
            });
        }

        digits.parse::<u64>().map(Self).map_err(|_| IdError::Overflow {
            raw: String::from_utf8_lossy(raw).into_owned(),
        })
    }

    /// Canonical JSON token: a bare number.
    pub fn encode(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s.as_bytes())
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Id> for u64 {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = Id;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a string containing digits")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Id, E> {
        Ok(Id(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Id, E> {
        Ok(Id(v.unsigned_abs()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Id, E> {
        Id::decode(v.to_string().as_bytes()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Id, E> {
        Id::decode(v.as_bytes()).map_err(E::custom)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Id, E> {
        Id::decode(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor)
    }
}

/// Deserialize a count (`meta.total`, `subscriber_count`, ...) with the same
/// tolerance as identifiers. `null` and digitless strings count as zero.
pub fn loose_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    optional(deserializer).map(|count| count.map_or(0, Id::get))
}

/// Deserialize an optional reference. `null`, an empty string and a string
/// without digits all mean "no reference".
pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Id>, D::Error> {
    struct OptionalIdVisitor;

    impl<'de> Visitor<'de> for OptionalIdVisitor {
        type Value = Option<Id>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("null, a number or a string containing digits")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            IdVisitor.visit_u64(v).map(Some)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            IdVisitor.visit_i64(v).map(Some)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            IdVisitor.visit_f64(v).map(Some)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            match Id::decode(v.as_bytes()) {
                Ok(id) => Ok(Some(id)),
                Err(IdError::NoDigits { .. }) => Ok(None),
                Err(err) => Err(E::custom(err)),
            }
        }
    }

    deserializer.deserialize_option(OptionalIdVisitor)
}
