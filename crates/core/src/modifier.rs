//! Modifier module - timed and one-shot effects applied to a board
//!
//! A modifier is an `{apply, remove, update}` triple over a [`ModifierContext`].
//! The [`ModifierPipeline`] owns every active modifier of one board and holds at
//! most one instance per skill: a second application of the same skill refreshes
//! the remaining time instead of stacking.

use std::fmt;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::board::Board;
use crate::types::{MoveDirection, RotateDirection, SkillId};

/// Board-level switches that modifiers toggle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectState {
    /// Toggle count of vertical inversions; odd means inverted
    pub vertical_toggles: u32,
    /// Toggle count of horizontal inversions; odd means inverted
    pub horizontal_toggles: u32,
    pub color_flash: u32,
    pub jump_board: u32,
    /// Gravity speed factor; the drop interval is divided by it
    pub speed_multiplier: f32,
}

impl EffectState {
    pub fn new() -> Self {
        Self {
            vertical_toggles: 0,
            horizontal_toggles: 0,
            color_flash: 0,
            jump_board: 0,
            speed_multiplier: 1.0,
        }
    }

    pub fn inversion(&self) -> ControlInversion {
        ControlInversion {
            vertical: self.vertical_toggles % 2 == 1,
            horizontal: self.horizontal_toggles % 2 == 1,
        }
    }

    pub fn color_flash_active(&self) -> bool {
        self.color_flash > 0
    }

    pub fn jump_board_active(&self) -> bool {
        self.jump_board > 0
    }
}

impl Default for EffectState {
    fn default() -> Self {
        Self::new()
    }
}

/// Active control inversion, used to map player input to the effective action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlInversion {
    pub vertical: bool,
    pub horizontal: bool,
}

impl ControlInversion {
    /// Whether exactly one axis is inverted; two inversions cancel out
    pub fn is_reversed(&self) -> bool {
        self.vertical != self.horizontal
    }

    /// Left and right swap while reversed; down is never swapped
    pub fn effective_move(&self, direction: MoveDirection) -> MoveDirection {
        match direction {
            MoveDirection::Left if self.is_reversed() => MoveDirection::Right,
            MoveDirection::Right if self.is_reversed() => MoveDirection::Left,
            other => other,
        }
    }

    /// Rotation swaps while reversed
    pub fn effective_rotation(&self, direction: RotateDirection) -> RotateDirection {
        if self.is_reversed() {
            direction.reversed()
        } else {
            direction
        }
    }
}

/// Everything a modifier may touch on its board
pub struct ModifierContext<'a> {
    pub board: &'a mut Board,
    pub effects: &'a mut EffectState,
    pub rng: &'a mut ChaCha8Rng,
}

/// Side effects of one modifier kind
pub trait ModifierEffect: fmt::Debug + Send {
    fn apply(&mut self, ctx: &mut ModifierContext<'_>);

    fn remove(&mut self, _ctx: &mut ModifierContext<'_>) {}

    fn update(&mut self, _dt_secs: f32, _ctx: &mut ModifierContext<'_>) {}
}

#[derive(Debug, Default)]
pub struct InvertVertical;

impl ModifierEffect for InvertVertical {
    fn apply(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.vertical_toggles += 1;
    }

    fn remove(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.vertical_toggles = ctx.effects.vertical_toggles.saturating_sub(1);
    }
}

#[derive(Debug, Default)]
pub struct InvertHorizontal;

impl ModifierEffect for InvertHorizontal {
    fn apply(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.horizontal_toggles += 1;
    }

    fn remove(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.horizontal_toggles = ctx.effects.horizontal_toggles.saturating_sub(1);
    }
}

#[derive(Debug, Default)]
pub struct ColorFlash;

impl ModifierEffect for ColorFlash {
    fn apply(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.color_flash += 1;
    }

    fn remove(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.color_flash = ctx.effects.color_flash.saturating_sub(1);
    }
}

#[derive(Debug, Default)]
pub struct JumpBoard;

impl ModifierEffect for JumpBoard {
    fn apply(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.jump_board += 1;
    }

    fn remove(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.jump_board = ctx.effects.jump_board.saturating_sub(1);
    }
}

/// Multiplies gravity speed while active
#[derive(Debug)]
pub struct SpeedBoost {
    pub factor: f32,
}

impl Default for SpeedBoost {
    fn default() -> Self {
        Self { factor: 2.0 }
    }
}

impl ModifierEffect for SpeedBoost {
    fn apply(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.speed_multiplier *= self.factor;
    }

    fn remove(&mut self, ctx: &mut ModifierContext<'_>) {
        ctx.effects.speed_multiplier /= self.factor;
    }
}

/// One-shot: empty up to `holes` random occupied cells at or below `min_row`
#[derive(Debug)]
pub struct DigHole {
    pub holes: u32,
    pub min_row: u8,
    pub max_attempts: u32,
    /// Cells cleared by the last apply
    pub dug: u32,
}

impl Default for DigHole {
    fn default() -> Self {
        Self {
            holes: 4,
            min_row: 5,
            max_attempts: 50,
            dug: 0,
        }
    }
}

impl ModifierEffect for DigHole {
    fn apply(&mut self, ctx: &mut ModifierContext<'_>) {
        self.dug = 0;
        let board = &mut *ctx.board;
        if board.filled_count() == 0 || self.min_row >= board.height() {
            return;
        }

        let mut attempts = 0;
        while self.dug < self.holes && attempts < self.max_attempts {
            attempts += 1;
            let x = ctx.rng.random_range(0..board.width()) as i8;
            let y = ctx.rng.random_range(self.min_row..board.height()) as i8;
            if board.is_occupied(x, y) {
                board.set(x, y, Default::default());
                self.dug += 1;
            }
        }
        tracing::debug!(dug = self.dug, attempts, "dig hole applied");
    }
}

/// Create the effect for a skill
pub fn create_effect(skill: SkillId) -> Box<dyn ModifierEffect> {
    match skill {
        SkillId::ReverseV => Box::new(InvertVertical),
        SkillId::ReverseH => Box::new(InvertHorizontal),
        SkillId::DigHole => Box::new(DigHole::default()),
        SkillId::ColorFlash => Box::new(ColorFlash),
        SkillId::JumpBoard => Box::new(JumpBoard),
        SkillId::SpeedBoost => Box::new(SpeedBoost::default()),
    }
}

/// Who a modifier was cast on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifierTarget {
    SelfBoard,
    /// Cast on this board by another player
    From(String),
}

/// An active or pending modifier instance
#[derive(Debug)]
pub struct Modifier {
    pub id: u64,
    pub skill: SkillId,
    pub name: &'static str,
    /// Seconds left; `<= 0` means one-shot
    pub remaining_secs: f32,
    pub target: ModifierTarget,
    effect: Box<dyn ModifierEffect>,
}

impl Modifier {
    /// Build a modifier for `skill` with the catalogue duration
    pub fn for_skill(skill: SkillId, target: ModifierTarget) -> Self {
        let card = skill.card();
        Self::new(skill, card.name, card.duration_secs, target, create_effect(skill))
    }

    pub fn new(
        skill: SkillId,
        name: &'static str,
        duration_secs: f32,
        target: ModifierTarget,
        effect: Box<dyn ModifierEffect>,
    ) -> Self {
        Self {
            id: 0,
            skill,
            name,
            remaining_secs: duration_secs,
            target,
            effect,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.remaining_secs > 0.0
    }
}

/// Active modifiers of one board, in application order
#[derive(Debug, Default)]
pub struct ModifierPipeline {
    active: Vec<Modifier>,
    next_id: u64,
}

impl ModifierPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a modifier and keep it for countdown if it is timed.
    ///
    /// Returns true when the modifier was kept.
    pub fn add(&mut self, mut modifier: Modifier, ctx: &mut ModifierContext<'_>) -> bool {
        self.next_id += 1;
        modifier.id = self.next_id;
        modifier.effect.apply(ctx);
        tracing::debug!(
            skill = modifier.skill.as_str(),
            secs = modifier.remaining_secs,
            "modifier applied"
        );

        if modifier.is_timed() {
            self.active.push(modifier);
            true
        } else {
            false
        }
    }

    /// Extend an active modifier of the same skill to `max(remaining, duration)`.
    ///
    /// Returns false if no modifier of that skill is active.
    pub fn refresh(&mut self, skill: SkillId, duration_secs: f32) -> bool {
        match self.active.iter_mut().find(|m| m.skill == skill) {
            Some(existing) => {
                existing.remaining_secs = existing.remaining_secs.max(duration_secs);
                tracing::debug!(
                    skill = skill.as_str(),
                    secs = existing.remaining_secs,
                    "modifier refreshed"
                );
                true
            }
            None => false,
        }
    }

    /// Refresh if already active, otherwise apply
    pub fn apply_or_refresh(&mut self, modifier: Modifier, ctx: &mut ModifierContext<'_>) {
        if modifier.is_timed() && self.refresh(modifier.skill, modifier.remaining_secs) {
            return;
        }
        self.add(modifier, ctx);
    }

    /// Advance every modifier by `dt_secs`; expired ones are removed and returned
    pub fn update(&mut self, dt_secs: f32, ctx: &mut ModifierContext<'_>) -> Vec<SkillId> {
        let mut expired = Vec::new();
        for modifier in &mut self.active {
            modifier.remaining_secs -= dt_secs;
            modifier.effect.update(dt_secs, ctx);
        }

        self.active.retain_mut(|modifier| {
            if modifier.remaining_secs > 0.0 {
                return true;
            }
            modifier.effect.remove(ctx);
            tracing::debug!(skill = modifier.skill.as_str(), "modifier expired");
            expired.push(modifier.skill);
            false
        });

        expired
    }

    /// Remove every modifier, running its remove effect
    pub fn clear_all(&mut self, ctx: &mut ModifierContext<'_>) {
        for mut modifier in self.active.drain(..) {
            modifier.effect.remove(ctx);
        }
    }

    pub fn is_active(&self, skill: SkillId) -> bool {
        self.active.iter().any(|m| m.skill == skill)
    }

    pub fn count(&self, skill: SkillId) -> usize {
        self.active.iter().filter(|m| m.skill == skill).count()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.active.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockKind, PieceKind};
    use rand::SeedableRng;

    struct Fixture {
        board: Board,
        effects: EffectState,
        rng: ChaCha8Rng,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                board: Board::default(),
                effects: EffectState::new(),
                rng: ChaCha8Rng::seed_from_u64(5),
            }
        }

        fn ctx(&mut self) -> ModifierContext<'_> {
            ModifierContext {
                board: &mut self.board,
                effects: &mut self.effects,
                rng: &mut self.rng,
            }
        }
    }

    fn own(skill: SkillId) -> Modifier {
        Modifier::for_skill(skill, ModifierTarget::SelfBoard)
    }

    #[test]
    fn test_duplicate_refreshes_instead_of_stacking() {
        let mut fx = Fixture::new();
        let mut pipeline = ModifierPipeline::new();

        pipeline.apply_or_refresh(own(SkillId::SpeedBoost), &mut fx.ctx());
        pipeline.update(4.0, &mut fx.ctx());
        pipeline.apply_or_refresh(own(SkillId::SpeedBoost), &mut fx.ctx());

        assert_eq!(pipeline.count(SkillId::SpeedBoost), 1);
        assert_eq!(fx.effects.speed_multiplier, 2.0);
        let remaining = pipeline.iter().next().unwrap().remaining_secs;
        assert_eq!(remaining, 10.0);
    }

    #[test]
    fn test_refresh_keeps_longer_remaining() {
        let mut fx = Fixture::new();
        let mut pipeline = ModifierPipeline::new();
        pipeline.add(own(SkillId::ColorFlash), &mut fx.ctx());
        assert!(pipeline.refresh(SkillId::ColorFlash, 5.0));
        assert_eq!(pipeline.iter().next().unwrap().remaining_secs, 20.0);
        assert!(!pipeline.refresh(SkillId::JumpBoard, 5.0));
    }

    #[test]
    fn test_update_expires_and_removes() {
        let mut fx = Fixture::new();
        let mut pipeline = ModifierPipeline::new();
        pipeline.add(own(SkillId::ReverseH), &mut fx.ctx());
        assert!(fx.effects.inversion().horizontal);

        assert!(pipeline.update(7.5, &mut fx.ctx()).is_empty());
        let expired = pipeline.update(0.5, &mut fx.ctx());
        assert_eq!(expired, vec![SkillId::ReverseH]);
        assert!(!fx.effects.inversion().horizontal);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_one_shot_is_not_kept() {
        let mut fx = Fixture::new();
        for x in 0..10 {
            for y in 10..20 {
                fx.board.set(x, y, BlockKind::Piece(PieceKind::Z));
            }
        }
        let mut pipeline = ModifierPipeline::new();
        let kept = pipeline.add(own(SkillId::DigHole), &mut fx.ctx());
        assert!(!kept);
        assert!(pipeline.is_empty());
        assert!(fx.board.filled_count() < 100);
        assert!(fx.board.filled_count() >= 96);
    }

    #[test]
    fn test_dig_hole_on_empty_board_is_noop() {
        let mut fx = Fixture::new();
        let mut dig = DigHole::default();
        dig.apply(&mut fx.ctx());
        assert_eq!(dig.dug, 0);
        assert_eq!(fx.board.filled_count(), 0);
    }

    #[test]
    fn test_clear_all_restores_effects() {
        let mut fx = Fixture::new();
        let mut pipeline = ModifierPipeline::new();
        for skill in [SkillId::SpeedBoost, SkillId::ReverseV, SkillId::JumpBoard] {
            pipeline.add(own(skill), &mut fx.ctx());
        }
        pipeline.clear_all(&mut fx.ctx());
        assert!(pipeline.is_empty());
        assert_eq!(fx.effects, EffectState::new());
    }

    #[test]
    fn test_effective_direction_transform() {
        let none = ControlInversion::default();
        let h = ControlInversion { vertical: false, horizontal: true };
        let v = ControlInversion { vertical: true, horizontal: false };
        let both = ControlInversion { vertical: true, horizontal: true };

        assert_eq!(h.effective_move(MoveDirection::Left), MoveDirection::Right);
        assert_eq!(h.effective_move(MoveDirection::Down), MoveDirection::Down);
        assert_eq!(v.effective_move(MoveDirection::Right), MoveDirection::Left);
        assert_eq!(both.effective_move(MoveDirection::Left), MoveDirection::Left);
        assert_eq!(none.effective_move(MoveDirection::Right), MoveDirection::Right);

        let cw = RotateDirection::Clockwise;
        assert_eq!(none.effective_rotation(cw), cw);
        assert_eq!(h.effective_rotation(cw), cw.reversed());
        assert_eq!(v.effective_rotation(cw), cw.reversed());
        assert_eq!(both.effective_rotation(cw), cw);
    }
}
