//! Encounter mutations.
//!
//! Every operation applies completely or not at all: invalid targets (a
//! missing location, an empty source, a swap with nothing on one side) leave
//! the playthrough untouched and return an empty `EncounterUpdate`.
//!
//! Identity is always decided by `CreatureUid`. Two slots holding the same
//! species are two different creatures.

use chrono::{DateTime, Utc};

use super::Playthrough;
use crate::entities::{Creature, EncounterSlot, SlotPart};
use crate::events::{EncounterUpdate, SlotChange};
use crate::ids::LocationId;
use crate::value_objects::{Composition, VariantKey};

/// State of one location captured before a mutation touches it.
struct Before {
    location: LocationId,
    composition: Composition,
    variant: Option<VariantKey>,
}

impl Playthrough {
    // =========================================================================
    // Operations
    // =========================================================================

    /// Write (or clear, with `None`) one half of a location.
    ///
    /// Creates the slot on demand with `force_fusion` deciding its mode;
    /// writing a body promotes the slot to a fusion. The written creature is
    /// stamped with this location as its origin if it has none, and takes the
    /// other half's status if its own is unset. If the same individual sits
    /// anywhere else it is moved here rather than duplicated.
    pub fn set_slot(
        &mut self,
        location: LocationId,
        creature: Option<Creature>,
        part: SlotPart,
        force_fusion: bool,
        now: DateTime<Utc>,
    ) -> EncounterUpdate {
        let before = self.before(&location);
        let mut detached = Vec::new();

        match creature {
            None => {
                let Some(slot) = self.encounters.get_mut(&location) else {
                    return EncounterUpdate::none();
                };
                if slot.take(part, now).is_none() {
                    return EncounterUpdate::none();
                }
            }
            Some(mut creature) => {
                creature.stamp_origin(&location);
                detached = self.detach_elsewhere(&creature, &location, now);

                let slot = self
                    .encounters
                    .entry(location.clone())
                    .or_insert_with(|| EncounterSlot::empty(force_fusion, now));
                if force_fusion && !slot.is_fusion() {
                    slot.set_fusion(true, now);
                }
                if slot
                    .part(part.other())
                    .is_some_and(|other| other.is_same_individual(&creature))
                {
                    slot.take(part.other(), now);
                }
                slot.put(part, Some(creature), now);
                slot.fill_status_gap(part);
            }
        }

        let mut changes = vec![self.settle(before, now)];
        changes.extend(detached);
        EncounterUpdate::from_changes(changes)
    }

    /// Clear a whole location (`part` = `None`) or one half of it.
    ///
    /// Clearing a half keeps the fusion flag, so a fusion survives losing one
    /// or even both halves as an empty placeholder.
    pub fn clear_slot(
        &mut self,
        location: &LocationId,
        part: Option<SlotPart>,
        now: DateTime<Utc>,
    ) -> EncounterUpdate {
        let before = self.before(location);

        match part {
            None => {
                if self.encounters.remove(location).is_none() {
                    return EncounterUpdate::none();
                }
            }
            Some(part) => {
                let Some(slot) = self.encounters.get_mut(location) else {
                    return EncounterUpdate::none();
                };
                if slot.take(part, now).is_none() {
                    return EncounterUpdate::none();
                }
            }
        }

        EncounterUpdate::from_changes(vec![self.settle(before, now)])
    }

    /// Relocate one individual to `(to, part)`.
    ///
    /// The individual is found in `from` by uid, whichever half it is in. If
    /// the destination half already holds someone else the move becomes a
    /// swap, so nobody is overwritten. Both locations are updated within this
    /// call; there is no state in which the creature is in both or neither.
    pub fn move_slot(
        &mut self,
        from: &LocationId,
        to: &LocationId,
        creature: &Creature,
        part: SlotPart,
        now: DateTime<Utc>,
    ) -> EncounterUpdate {
        let Some(source_part) = self
            .encounters
            .get(from)
            .and_then(|slot| slot.locate(creature))
        else {
            return EncounterUpdate::none();
        };
        if from == to && source_part == part {
            return EncounterUpdate::none();
        }

        let occupied = self
            .occupant(to, part)
            .is_some_and(|occupant| !occupant.is_same_individual(creature));
        if occupied {
            return self.swap_slots(from, to, source_part, part, now);
        }

        let before_from = self.before(from);
        let before_to = (from != to).then(|| self.before(to));

        let Some(mut moved) = self
            .encounters
            .get_mut(from)
            .and_then(|slot| slot.take(source_part, now))
        else {
            return EncounterUpdate::none();
        };
        moved.stamp_origin(to);

        let slot = self
            .encounters
            .entry(to.clone())
            .or_insert_with(|| EncounterSlot::empty(false, now));
        slot.put(part, Some(moved), now);
        slot.fill_status_gap(part);

        let mut changes = vec![self.settle(before_from, now)];
        if let Some(before_to) = before_to {
            changes.push(self.settle(before_to, now));
        }
        EncounterUpdate::from_changes(changes)
    }

    /// Exchange the creatures at `(a, part_a)` and `(b, part_b)`.
    ///
    /// Works across any mix of fusion and single slots: writing into the body
    /// of a single slot turns it into a fusion. Nicknames, statuses and uids
    /// travel with their creature unchanged. Swapping with an empty half or a
    /// missing location is a no-op.
    pub fn swap_slots(
        &mut self,
        a: &LocationId,
        b: &LocationId,
        part_a: SlotPart,
        part_b: SlotPart,
        now: DateTime<Utc>,
    ) -> EncounterUpdate {
        if a == b && part_a == part_b {
            return EncounterUpdate::none();
        }
        let (Some(first), Some(second)) = (self.occupant(a, part_a), self.occupant(b, part_b))
        else {
            return EncounterUpdate::none();
        };
        if first.is_same_individual(second) {
            return EncounterUpdate::none();
        }
        if a == b {
            return self.flip_fusion(a, now);
        }

        let before_a = self.before(a);
        let before_b = self.before(b);

        let first = self
            .encounters
            .get_mut(a)
            .and_then(|slot| slot.take(part_a, now));
        let second = self
            .encounters
            .get_mut(b)
            .and_then(|slot| slot.take(part_b, now));
        if let Some(slot) = self.encounters.get_mut(a) {
            slot.put(part_a, second, now);
        }
        if let Some(slot) = self.encounters.get_mut(b) {
            slot.put(part_b, first, now);
        }

        EncounterUpdate::from_changes(vec![self.settle(before_a, now), self.settle(before_b, now)])
    }

    /// Turn a location's fusion mode on or off.
    ///
    /// On: the current creature stays as head. On a missing location this
    /// creates an empty fusion placeholder. Off: the head survives, or the
    /// body if there is no head, and becomes the single creature.
    pub fn toggle_fusion(&mut self, location: &LocationId, now: DateTime<Utc>) -> EncounterUpdate {
        let before = self.before(location);

        if let Some(slot) = self.encounters.get_mut(location) {
            let fusion = !slot.is_fusion();
            slot.set_fusion(fusion, now);
        } else {
            self.encounters
                .insert(location.clone(), EncounterSlot::empty(true, now));
        }

        EncounterUpdate::from_changes(vec![self.settle(before, now)])
    }

    /// Swap head and body of a fusion in one step. Reported as a single
    /// composition change.
    pub fn flip_fusion(&mut self, location: &LocationId, now: DateTime<Utc>) -> EncounterUpdate {
        let flippable = self
            .encounters
            .get(location)
            .is_some_and(|slot| slot.is_fusion() && !slot.is_empty());
        if !flippable {
            return EncounterUpdate::none();
        }

        let before = self.before(location);
        if let Some(slot) = self.encounters.get_mut(location) {
            slot.flip(now);
        }

        EncounterUpdate::from_changes(vec![self.settle(before, now)])
    }

    /// Replace a location with a full fusion of `head` and `body`.
    ///
    /// Nicknames and statuses on both inputs are kept; an unset status is
    /// filled from the other half.
    pub fn create_fusion(
        &mut self,
        location: LocationId,
        mut head: Creature,
        mut body: Creature,
        now: DateTime<Utc>,
    ) -> EncounterUpdate {
        if head.is_same_individual(&body) {
            return EncounterUpdate::none();
        }
        let before = self.before(&location);

        head.stamp_origin(&location);
        body.stamp_origin(&location);
        let mut detached = self.detach_elsewhere(&head, &location, now);
        detached.extend(self.detach_elsewhere(&body, &location, now));

        let mut slot = EncounterSlot::fusion(head, body, now);
        slot.fill_status_gap(SlotPart::Body);
        slot.fill_status_gap(SlotPart::Head);
        slot.set_preferred_variant(before.variant.clone());
        self.encounters.insert(location, slot);

        let mut changes = vec![self.settle(before, now)];
        changes.extend(detached);
        EncounterUpdate::from_changes(changes)
    }

    /// Edit the creature in one half in place (nickname, status). The
    /// composition cannot change this way.
    pub fn update_creature(
        &mut self,
        location: &LocationId,
        part: SlotPart,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut Creature),
    ) -> EncounterUpdate {
        let before = self.before(location);
        let Some(slot) = self.encounters.get_mut(location) else {
            return EncounterUpdate::none();
        };
        let Some(creature) = slot.part_mut(part) else {
            return EncounterUpdate::none();
        };

        let original = creature.clone();
        edit(creature);
        if *creature == original {
            return EncounterUpdate::none();
        }
        slot.touch(now);

        EncounterUpdate::from_changes(vec![self.settle(before, now)])
    }

    /// Store a resolved artwork variant, but only while the slot still shows
    /// the composition it was resolved for. Returns whether anything changed.
    pub fn apply_variant(
        &mut self,
        location: &LocationId,
        composition: Composition,
        key: Option<VariantKey>,
    ) -> bool {
        match self.encounters.get_mut(location) {
            Some(slot) if slot.composition() == composition => {
                if slot.preferred_variant() == key.as_ref() {
                    return false;
                }
                slot.set_preferred_variant(key);
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn occupant(&self, location: &LocationId, part: SlotPart) -> Option<&Creature> {
        self.encounters.get(location).and_then(|slot| slot.part(part))
    }

    fn before(&self, location: &LocationId) -> Before {
        let slot = self.encounters.get(location);
        Before {
            location: location.clone(),
            composition: slot.map_or(Composition::EMPTY, EncounterSlot::composition),
            variant: slot.and_then(|s| s.preferred_variant().cloned()),
        }
    }

    /// Remove `creature` from every location other than `keep`.
    fn detach_elsewhere(
        &mut self,
        creature: &Creature,
        keep: &LocationId,
        now: DateTime<Utc>,
    ) -> Vec<SlotChange> {
        let holders: Vec<(LocationId, SlotPart)> = self
            .encounters
            .iter()
            .filter(|(location, _)| *location != keep)
            .filter_map(|(location, slot)| slot.locate(creature).map(|part| (location.clone(), part)))
            .collect();

        holders
            .into_iter()
            .map(|(location, part)| {
                let before = self.before(&location);
                if let Some(slot) = self.encounters.get_mut(&location) {
                    slot.take(part, now);
                }
                self.settle(before, now)
            })
            .collect()
    }

    /// Enforce the slot invariants after a mutation and describe the result:
    /// empty single slots are dropped, and the variant key is cleared when
    /// the composition changed.
    fn settle(&mut self, before: Before, now: DateTime<Utc>) -> SlotChange {
        let removable = self
            .encounters
            .get(&before.location)
            .is_some_and(EncounterSlot::is_removable);
        if removable {
            self.encounters.remove(&before.location);
        }

        let after = self
            .encounters
            .get(&before.location)
            .map_or(Composition::EMPTY, EncounterSlot::composition);
        if after != before.composition {
            if let Some(slot) = self.encounters.get_mut(&before.location) {
                slot.set_preferred_variant(None);
            }
        }
        self.updated_at = now;

        SlotChange {
            location: before.location,
            before: before.composition,
            after,
            previous_variant: before.variant,
        }
    }
}
