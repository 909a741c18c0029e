use serde::{Deserialize, Serialize};

use crate::ids::LocationId;
use crate::value_objects::LocationName;

/// A user-defined location inserted after an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLocation {
    id: LocationId,
    name: LocationName,
    #[serde(alias = "afterLocationId")]
    insert_after: LocationId,
}

impl CustomLocation {
    pub fn new(name: LocationName, insert_after: LocationId) -> Self {
        Self {
            id: LocationId::custom(),
            name,
            insert_after,
        }
    }

    pub fn with_id(mut self, id: LocationId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &LocationId {
        &self.id
    }

    pub fn name(&self) -> &LocationName {
        &self.name
    }

    pub fn insert_after(&self) -> &LocationId {
        &self.insert_after
    }

    pub(crate) fn set_name(&mut self, name: LocationName) {
        self.name = name;
    }

    pub(crate) fn set_insert_after(&mut self, anchor: LocationId) {
        self.insert_after = anchor;
    }
}

/// Splice custom locations into the base route order.
///
/// Each custom location lands right after its anchor; several custom
/// locations on the same anchor keep their insertion order, and a custom
/// location may anchor on another custom one. Locations whose anchor is
/// unknown are appended at the end.
pub fn ordered_locations(base: &[LocationId], custom: &[CustomLocation]) -> Vec<LocationId> {
    let mut ordered = Vec::with_capacity(base.len() + custom.len());
    let mut placed = vec![false; custom.len()];

    fn place(
        anchor: &LocationId,
        custom: &[CustomLocation],
        placed: &mut [bool],
        ordered: &mut Vec<LocationId>,
    ) {
        for (i, location) in custom.iter().enumerate() {
            if !placed[i] && location.insert_after() == anchor {
                placed[i] = true;
                ordered.push(location.id().clone());
                place(location.id(), custom, placed, ordered);
            }
        }
    }

    for location in base {
        ordered.push(location.clone());
        place(location, custom, &mut placed, &mut ordered);
    }

    for i in 0..custom.len() {
        if !placed[i] {
            placed[i] = true;
            ordered.push(custom[i].id().clone());
            place(custom[i].id(), custom, &mut placed, &mut ordered);
        }
    }

    ordered
}
