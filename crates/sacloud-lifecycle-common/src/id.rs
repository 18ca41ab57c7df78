//! Resource identifiers
//!
//! The provider assigns every resource a 64-bit numeric id. The API serializes
//! it as a JSON string in most payloads and as a number in a few, so the
//! `Deserialize` impl accepts both.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque identifier of a remote resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

/// Error returned when a token is not a valid resource id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("resource id cannot be empty")]
    Empty,

    #[error("resource id must contain only digits, got: {0}")]
    NotNumeric(String),

    #[error("resource id is out of range: {0}")]
    OutOfRange(String),

    #[error("resource id cannot be zero")]
    Zero,
}

impl ResourceId {
    /// Wrap a raw id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Check whether a token consists only of ASCII digits.
///
/// Such tokens are always treated as ids, never as names.
pub fn is_numeric_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for ResourceId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdParseError::Empty);
        }
        if !is_numeric_token(s) {
            return Err(IdParseError::NotNumeric(s.to_string()));
        }
        let raw: u64 = s
            .parse()
            .map_err(|_| IdParseError::OutOfRange(s.to_string()))?;
        if raw == 0 {
            return Err(IdParseError::Zero);
        }
        Ok(Self(raw))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ResourceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct ResourceIdVisitor;

impl Visitor<'_> for ResourceIdVisitor {
    type Value = ResourceId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a resource id as a digit string or unsigned integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ResourceId(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(ResourceId)
            .map_err(|_| E::custom(format!("negative resource id: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ResourceIdVisitor)
    }
}
