//! Dispatch zone selection and zone info.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of configurable dispatch zones.
pub const ZONE_COUNT: u8 = 6;

/// Error constructing a [`ZoneId`] from an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("zone id {0} out of range 1..={ZONE_COUNT}")]
pub struct ZoneIdError(pub u8);

/// A validated dispatch zone identifier, 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ZoneId(u8);

impl ZoneId {
    /// Construct a zone id, rejecting values outside 1..=6.
    pub fn new(id: u8) -> Result<Self, ZoneIdError> {
        if (1..=ZONE_COUNT).contains(&id) {
            Ok(Self(id))
        } else {
            Err(ZoneIdError(id))
        }
    }

    /// The raw zone number.
    pub fn get(&self) -> u8 {
        self.0
    }

    /// All valid zone ids in order.
    pub fn all() -> impl Iterator<Item = ZoneId> {
        (1..=ZONE_COUNT).map(ZoneId)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for ZoneId {
    type Error = ZoneIdError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

/// Severity of a zone alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ZoneAlertKind {
    Info,
    Warning,
}

/// An alert attached to a zone's remote-fetched info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneAlert {
    pub kind: ZoneAlertKind,
    pub message: String,
}

/// Remote-confirmed projection of a dispatch zone.
///
/// Only valid for the selection that produced it; any selection change
/// invalidates it before a new fetch resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneInfo {
    /// Zone this info was fetched for
    pub id: ZoneId,

    /// Display name
    pub name: String,

    /// Boxes currently counted in the zone
    pub count: u64,

    /// Active alerts
    pub alerts: Vec<ZoneAlert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_id_range() {
        assert!(ZoneId::new(1).is_ok());
        assert!(ZoneId::new(6).is_ok());
        assert_eq!(ZoneId::new(0), Err(ZoneIdError(0)));
        assert_eq!(ZoneId::new(7), Err(ZoneIdError(7)));
    }

    #[test]
    fn test_zone_id_all() {
        let ids: Vec<u8> = ZoneId::all().map(|z| z.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_zone_id_serializes_as_number() {
        let zone = ZoneId::new(3).unwrap();
        assert_eq!(serde_json::to_string(&zone).unwrap(), "3");
    }
}
