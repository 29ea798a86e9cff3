//! Skills module - per-board skill card slots
//!
//! Cards are acquired by chance on clearing locks or granted by the catch-up
//! timer. A new card fills the first empty slot; with every slot full it is
//! dropped.

use rand::Rng;

use crate::types::{SkillId, SKILL_SLOTS};

/// Fixed-size skill card inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkillInventory {
    slots: [Option<SkillId>; SKILL_SLOTS],
}

impl SkillInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[Option<SkillId>; SKILL_SLOTS] {
        &self.slots
    }

    pub fn get(&self, slot: usize) -> Option<SkillId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn has_space(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    /// Put `skill` in the first empty slot; returns the slot index
    pub fn insert(&mut self, skill: SkillId) -> Option<usize> {
        let idx = self.slots.iter().position(Option::is_none)?;
        self.slots[idx] = Some(skill);
        Some(idx)
    }

    /// Grant a uniformly random skill if there is space; returns `(slot, skill)`
    pub fn grant_random(&mut self, rng: &mut impl Rng) -> Option<(usize, SkillId)> {
        if !self.has_space() {
            return None;
        }
        let skill = SkillId::ALL[rng.random_range(0..SkillId::ALL.len())];
        self.insert(skill).map(|slot| (slot, skill))
    }

    /// Roll `chance` and grant a random skill on success
    pub fn try_acquire(&mut self, chance: f64, rng: &mut impl Rng) -> Option<(usize, SkillId)> {
        if !self.has_space() {
            return None;
        }
        if rng.random::<f64>() >= chance {
            return None;
        }
        self.grant_random(rng)
    }

    /// Empty a slot and return its card (`None` for an empty or unknown slot)
    pub fn take(&mut self, slot: usize) -> Option<SkillId> {
        self.slots.get_mut(slot)?.take()
    }

    pub fn clear(&mut self) {
        self.slots = [None; SKILL_SLOTS];
    }
}
