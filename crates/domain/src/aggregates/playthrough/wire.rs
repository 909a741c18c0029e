//! Persisted shape of a playthrough.
//!
//! Older records carry a boolean `remixMode` instead of `gameMode`. It is
//! folded into `gameMode` on read and never written back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Playthrough;
use crate::entities::{CustomLocation, EncounterSlot};
use crate::error::DomainError;
use crate::ids::{LocationId, PlaythroughId};
use crate::value_objects::{GameMode, PlaythroughName};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaythroughRecord {
    id: PlaythroughId,
    name: PlaythroughName,
    #[serde(default)]
    game_mode: Option<GameMode>,
    #[serde(default, skip_serializing)]
    remix_mode: Option<bool>,
    #[serde(default)]
    encounters: BTreeMap<LocationId, EncounterSlot>,
    #[serde(default)]
    custom_locations: Vec<CustomLocation>,
    created_at: DateTime<Utc>,
    #[serde(alias = "lastModified")]
    updated_at: DateTime<Utc>,
}

impl TryFrom<PlaythroughRecord> for Playthrough {
    type Error = DomainError;

    fn try_from(record: PlaythroughRecord) -> Result<Self, Self::Error> {
        let mut encounters = record.encounters;
        encounters.retain(|_, slot| !slot.is_removable());

        Ok(Self {
            id: record.id,
            name: record.name,
            game_mode: GameMode::from_legacy(record.game_mode, record.remix_mode),
            encounters,
            custom_locations: record.custom_locations,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

impl From<Playthrough> for PlaythroughRecord {
    fn from(run: Playthrough) -> Self {
        Self {
            id: run.id,
            name: run.name,
            game_mode: Some(run.game_mode),
            remix_mode: None,
            encounters: run.encounters,
            custom_locations: run.custom_locations,
            created_at: run.created_at,
            updated_at: run.updated_at,
        }
    }
}
