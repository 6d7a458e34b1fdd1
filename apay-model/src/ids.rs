use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::ModelError;

/// Tenant (church) identifier assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ChurchId(pub i64);

impl ChurchId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for ChurchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChurchId {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim()
            .parse::<i64>()
            .map(ChurchId)
            .map_err(|_| ModelError::InvalidChurchId(raw.to_string()))
    }
}

// Some backend builds serialize the id as a string; accept both.
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ChurchId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ChurchIdVisitor;

        impl serde::de::Visitor<'_> for ChurchIdVisitor {
            type Value = ChurchId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer church id or a numeric string")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<ChurchId, E> {
                Ok(ChurchId(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<ChurchId, E> {
                i64::try_from(v)
                    .map(ChurchId)
                    .map_err(|_| E::custom(format!("church id {v} out of range")))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ChurchId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ChurchIdVisitor)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let a: ChurchId = serde_json::from_str("7").unwrap();
        let b: ChurchId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "7");
    }

    #[test]
    fn rejects_non_numeric_strings() {
        assert!(serde_json::from_str::<ChurchId>("\"seven\"").is_err());
        assert!(serde_json::from_str::<ChurchId>("7.5").is_err());
    }
}
