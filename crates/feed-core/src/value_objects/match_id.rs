//! Match ID - the topic key clients subscribe to
//!
//! Matches are owned by the persistence layer. The feed never checks that a
//! match exists; any integer a client sends is a valid topic.

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a match (a subscribable topic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MatchId(i64);

impl MatchId {
    /// Create a new MatchId from a raw i64 value
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MatchId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<MatchId> for i64 {
    fn from(id: MatchId) -> Self {
        id.0
    }
}

/// Accepts any JSON number with an integral value in the i64 range,
/// including float spellings such as `42.0` or `1e2`.
impl<'de> Deserialize<'de> for MatchId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MatchIdVisitor)
    }
}

struct MatchIdVisitor;

impl Visitor<'_> for MatchIdVisitor {
    type Value = MatchId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer match id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MatchId, E> {
        Ok(MatchId(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MatchId, E> {
        i64::try_from(v)
            .map(MatchId)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MatchId, E> {
        // i64::MAX as f64 rounds up to 2^63, which is out of range
        let in_range = v >= i64::MIN as f64 && v < i64::MAX as f64;
        if v.is_finite() && v.fract() == 0.0 && in_range {
            Ok(MatchId(v as i64))
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }
}
