//! Entity identifiers - `PREFIX-<ULID>` strings
//!
//! Every record in a labtrack project is addressed by an [`EntityId`]: a typed
//! prefix naming the entity kind followed by a ULID, e.g.
//! `PART-01HQ3K4N5M6P7Q8R9S0T1V2W3X`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityPrefix {
    /// Inventory item
    Inv,
    /// Machine
    Mach,
    /// Wear part installed on a machine
    Part,
    /// Usage log entry
    Use,
    /// Maintenance record
    Mnt,
    /// Notification
    Ntf,
    /// Incident report
    Inc,
}

impl EntityPrefix {
    /// All known prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Inv,
            EntityPrefix::Mach,
            EntityPrefix::Part,
            EntityPrefix::Use,
            EntityPrefix::Mnt,
            EntityPrefix::Ntf,
            EntityPrefix::Inc,
        ]
    }

    /// The uppercase prefix string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Inv => "INV",
            EntityPrefix::Mach => "MACH",
            EntityPrefix::Part => "PART",
            EntityPrefix::Use => "USE",
            EntityPrefix::Mnt => "MNT",
            EntityPrefix::Ntf => "NTF",
            EntityPrefix::Inc => "INC",
        }
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityPrefix::all()
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| IdParseError::UnknownPrefix(s.to_string()))
    }
}

/// Errors from parsing an entity ID string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("missing '-' separator in entity ID '{0}'")]
    MissingSeparator(String),

    #[error("unknown entity prefix '{0}'")]
    UnknownPrefix(String),

    #[error("invalid ULID '{0}'")]
    InvalidUlid(String),
}

/// A typed entity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Generate a new ID with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse an ID and check it carries the expected prefix
    pub fn parse_with_prefix(s: &str, expected: EntityPrefix) -> Result<Self, IdParseError> {
        let id: EntityId = s.parse()?;
        if id.prefix != expected {
            return Err(IdParseError::UnknownPrefix(format!(
                "{} (expected {})",
                id.prefix, expected
            )));
        }
        Ok(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, ulid) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingSeparator(s.to_string()))?;
        let prefix: EntityPrefix = prefix.parse()?;
        let ulid = Ulid::from_string(ulid).map_err(|_| IdParseError::InvalidUlid(ulid.to_string()))?;
        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_has_prefix() {
        let id = EntityId::new(EntityPrefix::Part);
        assert!(id.to_string().starts_with("PART-"));
        assert_eq!(id.prefix(), EntityPrefix::Part);
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = EntityId::new(EntityPrefix::Mach);
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_lowercase_prefix() {
        let id = EntityId::new(EntityPrefix::Inv);
        let lower = id.to_string().replacen("INV", "inv", 1);
        assert_eq!(lower.parse::<EntityId>().unwrap(), id);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "NOSEPARATOR".parse::<EntityId>(),
            Err(IdParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "XYZ-01HQ3K4N5M6P7Q8R9S0T1V2W3X".parse::<EntityId>(),
            Err(IdParseError::UnknownPrefix(_))
        ));
        assert!(matches!(
            "INV-notaulid".parse::<EntityId>(),
            Err(IdParseError::InvalidUlid(_))
        ));
    }

    #[test]
    fn test_parse_with_prefix_rejects_other_kind() {
        let id = EntityId::new(EntityPrefix::Inv);
        assert!(EntityId::parse_with_prefix(&id.to_string(), EntityPrefix::Mach).is_err());
        assert!(EntityId::parse_with_prefix(&id.to_string(), EntityPrefix::Inv).is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let id = EntityId::new(EntityPrefix::Ntf);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
