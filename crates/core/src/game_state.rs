//! Game state module - one player's board simulation
//!
//! Ties together the board, the seeded piece queue, scoring, the garbage queue,
//! the modifier pipeline and the skill inventory. Every operation is
//! synchronous; callers drive time through [`GameState::tick`].
//!
//! Operations on a board that is not running are no-ops returning `false`.
//! Anything other boards or the room need to hear about is pushed to an event
//! list drained with [`GameState::take_events`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::Board;
use crate::config::GameConfig;
use crate::garbage::GarbageQueue;
use crate::modifier::{
    ControlInversion, EffectState, Modifier, ModifierContext, ModifierPipeline, ModifierTarget,
};
use crate::pieces::{get_shape, spawn_x, try_rotate, PieceShape, SPAWN_Y};
use crate::rng::PieceQueue;
use crate::scoring::{ScoreState, NO_COMBO};
use crate::skills::SkillInventory;
use crate::snapshot::{ActiveSnapshot, BoardSnapshot, EffectsSnapshot};
use crate::types::{
    GameAction, MoveDirection, PieceKind, RotateDirection, Rotation, SkillId, SpinKind,
    NEXT_QUEUE_LEN, SECOND_MS, SKILL_SLOTS,
};

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl Tetromino {
    /// New piece at the spawn position of a board `board_width` wide
    pub fn spawn(kind: PieceKind, board_width: u8) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            x: spawn_x(kind, board_width),
            y: SPAWN_Y,
        }
    }

    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Whether the piece fits at an offset from its current position
    pub fn fits(&self, board: &Board, dx: i8, dy: i8) -> bool {
        self.shape()
            .iter()
            .all(|&(mx, my)| board.is_free(self.x + mx + dx, self.y + my + dy))
    }
}

/// Lifecycle of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardPhase {
    /// Created but not started
    Idle,
    Falling,
    /// Resting on the stack with the lock-delay timer running
    LockPending,
    /// Running but frozen; time and input are ignored
    Paused,
    GameOver,
}

impl BoardPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardPhase::Idle => "idle",
            BoardPhase::Falling => "falling",
            BoardPhase::LockPending => "lock_pending",
            BoardPhase::Paused => "paused",
            BoardPhase::GameOver => "game_over",
        }
    }
}

/// Why a board ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// A new piece collided on spawn
    BlockOut,
    /// A piece locked with minos above the visible area
    LockOut,
    /// Incoming garbage had no room
    GarbageOverflow,
    /// Match timer reached zero
    TimeUp,
}

impl GameOverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverReason::BlockOut => "block_out",
            GameOverReason::LockOut => "lock_out",
            GameOverReason::GarbageOverflow => "garbage_overflow",
            GameOverReason::TimeUp => "time_up",
        }
    }
}

/// Where a cast skill goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastTarget {
    SelfBoard,
    Player(String),
}

/// Notable things that happened on a board since the last drain
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    PieceLocked {
        kind: PieceKind,
        lines: u32,
        spin: SpinKind,
        points: u32,
        combo: i32,
        back_to_back: bool,
    },
    /// Attack left after cancelling pending garbage
    AttackSent { lines: u32 },
    GarbageApplied { lines: u32 },
    SkillAcquired { skill: SkillId, slot: usize },
    SkillCast { skill: SkillId, target: CastTarget },
    SkillReceived { skill: SkillId, from: Option<String> },
    ModifierExpired { skill: SkillId },
    /// Practice board restarted after topping out
    Restarted { seed: i64 },
    GameOver { reason: GameOverReason },
}

/// Complete state of one board
#[derive(Debug)]
pub struct GameState {
    config: GameConfig,
    board: Board,
    active: Option<Tetromino>,
    hold: Option<PieceKind>,
    can_hold: bool,
    queue: PieceQueue,
    seed: i64,
    /// Randomness for garbage holes, skill rolls and dig-hole cells
    effect_rng: ChaCha8Rng,
    scoring: ScoreState,
    garbage: GarbageQueue,
    modifiers: ModifierPipeline,
    effects: EffectState,
    skills: SkillInventory,
    last_spin: SpinKind,
    drop_timer_ms: u32,
    lock_timer_ms: Option<u32>,
    second_timer_ms: u32,
    remaining_secs: Option<u32>,
    secs_since_score: u32,
    started: bool,
    paused: bool,
    game_over: bool,
    events: Vec<BoardEvent>,
}

impl GameState {
    /// Create a board with the default configuration
    pub fn new(seed: i64) -> Self {
        Self::with_config(seed, GameConfig::default())
    }

    pub fn with_config(seed: i64, config: GameConfig) -> Self {
        Self {
            board: Board::new(config.width, config.height),
            active: None,
            hold: None,
            can_hold: true,
            queue: PieceQueue::new(seed),
            seed,
            effect_rng: ChaCha8Rng::seed_from_u64(seed as u64),
            scoring: ScoreState::new(),
            garbage: GarbageQueue::new(),
            modifiers: ModifierPipeline::new(),
            effects: EffectState::new(),
            skills: SkillInventory::new(),
            last_spin: SpinKind::None,
            drop_timer_ms: 0,
            lock_timer_ms: None,
            second_timer_ms: 0,
            remaining_secs: config.time_limit(),
            secs_since_score: 0,
            started: false,
            paused: false,
            game_over: false,
            events: Vec::new(),
            config,
        }
    }

    /// Start the board and spawn the first piece
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        tracing::debug!(seed = self.seed, "board started");
        self.spawn_piece();
        true
    }

    /// Reset everything and start again from `seed`.
    ///
    /// Active modifiers are removed through their remove effect first.
    pub fn restart(&mut self, seed: i64) {
        self.clear_modifiers();
        self.board.clear();
        self.garbage.clear();
        self.skills.clear();

        self.seed = seed;
        self.queue = PieceQueue::new(seed);
        self.effect_rng = ChaCha8Rng::seed_from_u64(seed as u64);
        self.scoring = ScoreState::new();
        self.active = None;
        self.hold = None;
        self.can_hold = true;
        self.last_spin = SpinKind::None;
        self.drop_timer_ms = 0;
        self.lock_timer_ms = None;
        self.second_timer_ms = 0;
        self.remaining_secs = self.config.time_limit();
        self.secs_since_score = 0;
        self.started = false;
        self.paused = false;
        self.game_over = false;
        self.start();
    }

    /// Freeze the board: `tick` and player input are ignored until `resume`.
    ///
    /// Incoming garbage and skills are still accepted.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() || self.paused {
            return false;
        }
        self.paused = true;
        tracing::debug!(seed = self.seed, "board paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        tracing::debug!(seed = self.seed, "board resumed");
        true
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Running and not paused
    fn accepts_input(&self) -> bool {
        self.is_running() && !self.paused
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> BoardPhase {
        if self.game_over {
            BoardPhase::GameOver
        } else if !self.started {
            BoardPhase::Idle
        } else if self.paused {
            BoardPhase::Paused
        } else if self.lock_timer_ms.is_some() {
            BoardPhase::LockPending
        } else {
            BoardPhase::Falling
        }
    }

    pub fn is_running(&self) -> bool {
        self.started && !self.game_over
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Direct grid access for scenario setup
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn active(&self) -> Option<Tetromino> {
        self.active
    }

    pub fn hold_piece(&self) -> Option<PieceKind> {
        self.hold
    }

    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    pub fn next_queue(&self) -> &[PieceKind] {
        self.queue.preview()
    }

    pub fn score(&self) -> u32 {
        self.scoring.score
    }

    pub fn lines(&self) -> u32 {
        self.scoring.lines
    }

    pub fn combo(&self) -> i32 {
        self.scoring.combo
    }

    pub fn back_to_back(&self) -> bool {
        self.scoring.back_to_back
    }

    pub fn pending_garbage(&self) -> u32 {
        self.garbage.pending()
    }

    pub fn skills(&self) -> &SkillInventory {
        &self.skills
    }

    pub fn modifiers(&self) -> &ModifierPipeline {
        &self.modifiers
    }

    pub fn effects(&self) -> &EffectState {
        &self.effects
    }

    pub fn inversion(&self) -> ControlInversion {
        self.effects.inversion()
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }

    pub fn last_spin(&self) -> SpinKind {
        self.last_spin
    }

    pub fn lock_timer_ms(&self) -> Option<u32> {
        self.lock_timer_ms
    }

    /// Current gravity interval after speed modifiers
    pub fn drop_interval_ms(&self) -> u32 {
        let interval = self.config.base_drop_ms as f32 / self.effects.speed_multiplier;
        (interval as u32).max(1)
    }

    /// Whether the stack reaches into the danger rows at the top
    pub fn in_danger_zone(&self) -> bool {
        match self.board.highest_occupied_row() {
            Some(row) => row <= self.config.danger_rows,
            None => false,
        }
    }

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    fn modifier_ctx(&mut self) -> (&mut ModifierPipeline, ModifierContext<'_>) {
        (
            &mut self.modifiers,
            ModifierContext {
                board: &mut self.board,
                effects: &mut self.effects,
                rng: &mut self.effect_rng,
            },
        )
    }

    fn clear_modifiers(&mut self) {
        let (pipeline, mut ctx) = self.modifier_ctx();
        pipeline.clear_all(&mut ctx);
    }

    /// Spawn the next piece from the queue
    fn spawn_piece(&mut self) -> bool {
        let kind = self.queue.pop();
        let piece = Tetromino::spawn(kind, self.board.width());

        self.active = Some(piece);
        self.can_hold = true;
        self.lock_timer_ms = None;
        self.drop_timer_ms = 0;
        self.last_spin = SpinKind::None;

        if !piece.fits(&self.board, 0, 0) {
            self.end_game(GameOverReason::BlockOut);
            return false;
        }

        tracing::trace!(kind = kind.as_str(), "spawned");
        true
    }

    /// Apply a player action; ignored while paused
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        if !self.accepts_input() {
            return false;
        }
        match action {
            GameAction::MoveLeft => self.move_piece(MoveDirection::Left),
            GameAction::MoveRight => self.move_piece(MoveDirection::Right),
            GameAction::SoftDrop => self.move_piece(MoveDirection::Down),
            GameAction::HardDrop => self.hard_drop(),
            GameAction::RotateCw => self.rotate(RotateDirection::Clockwise),
            GameAction::RotateCcw => self.rotate(RotateDirection::CounterClockwise),
            GameAction::Hold => self.hold(),
        }
    }

    /// Player move, subject to control inversion
    pub fn move_piece(&mut self, direction: MoveDirection) -> bool {
        let direction = self.inversion().effective_move(direction);
        self.shift(direction)
    }

    /// Move without inversion; a blocked downward step arms the lock timer
    fn shift(&mut self, direction: MoveDirection) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(piece) = self.active else {
            return false;
        };

        if direction != MoveDirection::Down {
            self.last_spin = SpinKind::None;
        }

        let (dx, dy) = direction.offset();
        if piece.fits(&self.board, dx, dy) {
            self.active = Some(Tetromino {
                x: piece.x + dx,
                y: piece.y + dy,
                ..piece
            });
            self.lock_timer_ms = None;
            return true;
        }

        if direction == MoveDirection::Down && self.lock_timer_ms.is_none() {
            self.lock_timer_ms = Some(0);
        }
        false
    }

    /// Player rotation, subject to control inversion
    pub fn rotate(&mut self, direction: RotateDirection) -> bool {
        let direction = self.inversion().effective_rotation(direction);
        if !self.accepts_input() {
            return false;
        }
        let Some(piece) = self.active else {
            return false;
        };

        self.last_spin = SpinKind::None;

        let board = &self.board;
        let attempt = try_rotate(
            piece.kind,
            piece.rotation,
            piece.x,
            piece.y,
            direction,
            |x, y| board.is_free(x, y),
        );
        let Some(result) = attempt else {
            return false;
        };

        let rotated = Tetromino {
            rotation: result.rotation,
            x: result.x,
            y: result.y,
            ..piece
        };
        self.active = Some(rotated);

        self.lock_timer_ms = None;
        if !rotated.fits(&self.board, 0, 1) {
            self.lock_timer_ms = Some(0);
        }

        if rotated.kind == PieceKind::T && self.corner_count(rotated.x + 1, rotated.y + 1) >= 3 {
            self.last_spin = SpinKind::TSpin;
            tracing::debug!(x = rotated.x, y = rotated.y, "t-spin");
        }

        true
    }

    /// Occupied diagonal neighbours of a cell, counting only cells on the board
    fn corner_count(&self, cx: i8, cy: i8) -> usize {
        [(-1, -1), (1, -1), (-1, 1), (1, 1)]
            .iter()
            .filter(|&&(dx, dy)| self.board.is_occupied(cx + dx, cy + dy))
            .count()
    }

    /// Rows the active piece can fall before resting
    fn drop_distance(&self, piece: &Tetromino) -> i8 {
        let mut distance = 0;
        while piece.fits(&self.board, 0, distance + 1) {
            distance += 1;
        }
        distance
    }

    pub fn ghost_y(&self) -> Option<i8> {
        let piece = self.active?;
        Some(piece.y + self.drop_distance(&piece))
    }

    /// Drop to the resting row and lock
    pub fn hard_drop(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(piece) = self.active else {
            return false;
        };

        self.lock_timer_ms = None;
        let distance = self.drop_distance(&piece);
        self.active = Some(Tetromino {
            y: piece.y + distance,
            ..piece
        });
        self.lock_piece();
        true
    }

    /// Swap with the hold slot, once per spawn
    pub fn hold(&mut self) -> bool {
        if !self.accepts_input() || !self.can_hold {
            return false;
        }
        let Some(piece) = self.active else {
            return false;
        };

        self.lock_timer_ms = None;
        self.last_spin = SpinKind::None;

        match self.hold.replace(piece.kind) {
            Some(held) => {
                let swapped = Tetromino::spawn(held, self.board.width());
                self.active = Some(swapped);
                self.drop_timer_ms = 0;
                if !swapped.fits(&self.board, 0, 0) {
                    self.end_game(GameOverReason::BlockOut);
                    return true;
                }
            }
            None => {
                if !self.spawn_piece() {
                    return true;
                }
            }
        }

        self.can_hold = false;
        true
    }

    /// Merge the active piece, score it, apply garbage and spawn the next piece
    fn lock_piece(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        self.lock_timer_ms = None;
        self.drop_timer_ms = 0;

        let inside = self
            .board
            .merge_piece(&piece.shape(), piece.x, piece.y, piece.kind);
        let lines = self.board.clear_full_rows() as u32;
        let spin = std::mem::take(&mut self.last_spin);

        let outcome = self.scoring.record_lock(lines, spin);
        if outcome.points > 0 {
            self.secs_since_score = 0;
        }

        self.events.push(BoardEvent::PieceLocked {
            kind: piece.kind,
            lines,
            spin,
            points: outcome.points,
            combo: outcome.combo,
            back_to_back: outcome.back_to_back,
        });

        if lines > 0 {
            let sent = self.garbage.cancel(outcome.attack);
            if sent > 0 {
                tracing::debug!(attack = outcome.attack, sent, "attack");
                self.events.push(BoardEvent::AttackSent { lines: sent });
            }
            if !self.config.practice {
                self.roll_skill();
            }
        }

        // Rows this lock completed are already scored
        if !inside {
            self.end_game(GameOverReason::LockOut);
            return;
        }

        if self.scoring.combo == NO_COMBO && self.garbage.pending() > 0 {
            let applied = self.garbage.apply(&mut self.board, &mut self.effect_rng);
            if applied.inserted > 0 {
                self.events.push(BoardEvent::GarbageApplied {
                    lines: applied.inserted,
                });
            }
            if applied.topped_out {
                self.end_game(GameOverReason::GarbageOverflow);
                return;
            }
        }

        self.spawn_piece();
    }

    fn roll_skill(&mut self) {
        let chance = self.config.skill_chance;
        if let Some((slot, skill)) = self.skills.try_acquire(chance, &mut self.effect_rng) {
            self.push_acquired(slot, skill);
        }
    }

    fn push_acquired(&mut self, slot: usize, skill: SkillId) {
        tracing::debug!(skill = skill.as_str(), slot, "skill acquired");
        self.events.push(BoardEvent::SkillAcquired { skill, slot });
    }

    /// Queue incoming garbage lines
    pub fn receive_garbage(&mut self, lines: u32) -> bool {
        if self.game_over || lines == 0 {
            return false;
        }
        self.garbage.receive(lines);
        true
    }

    /// Apply a skill cast on this board, refreshing it if already active
    pub fn receive_skill(&mut self, skill: SkillId, from: Option<String>) -> bool {
        if self.game_over {
            return false;
        }
        let target = match &from {
            Some(id) => ModifierTarget::From(id.clone()),
            None => ModifierTarget::SelfBoard,
        };
        let (pipeline, mut ctx) = self.modifier_ctx();
        pipeline.apply_or_refresh(Modifier::for_skill(skill, target), &mut ctx);
        self.events.push(BoardEvent::SkillReceived { skill, from });
        true
    }

    /// Spend the card in `slot`.
    ///
    /// Self-targeted casts apply here; casts on another player are only
    /// reported through the returned skill and a `SkillCast` event.
    pub fn use_skill(&mut self, slot: usize, target: CastTarget) -> Option<SkillId> {
        if !self.accepts_input() {
            return None;
        }
        let skill = self.skills.take(slot)?;
        tracing::debug!(skill = skill.as_str(), slot, cast = ?target, "skill cast");

        if target == CastTarget::SelfBoard {
            let (pipeline, mut ctx) = self.modifier_ctx();
            let modifier = Modifier::for_skill(skill, ModifierTarget::SelfBoard);
            pipeline.apply_or_refresh(modifier, &mut ctx);
        }
        self.events.push(BoardEvent::SkillCast { skill, target });
        Some(skill)
    }

    /// Grant a random skill card directly
    pub fn grant_skill(&mut self) -> Option<SkillId> {
        let (slot, skill) = self.skills.grant_random(&mut self.effect_rng)?;
        self.push_acquired(slot, skill);
        Some(skill)
    }

    /// End the board. Practice boards restart instead, unless time ran out.
    fn end_game(&mut self, reason: GameOverReason) {
        if self.game_over {
            return;
        }

        if self.config.practice && reason != GameOverReason::TimeUp {
            let seed = self.effect_rng.random_range(0..233_280);
            tracing::info!(reason = reason.as_str(), seed, "practice board restarted");
            self.restart(seed);
            self.events.push(BoardEvent::Restarted { seed });
            return;
        }

        self.game_over = true;
        self.lock_timer_ms = None;
        self.clear_modifiers();
        tracing::info!(reason = reason.as_str(), score = self.scoring.score, "game over");
        self.events.push(BoardEvent::GameOver { reason });
    }

    /// Advance time by `elapsed_ms`. Returns true if the piece moved or locked.
    ///
    /// A paused board does not advance.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let mut changed = false;

        if let Some(lock_ms) = self.lock_timer_ms {
            let lock_ms = lock_ms + elapsed_ms;
            if lock_ms >= self.config.lock_delay_ms {
                self.lock_piece();
                changed = true;
            } else {
                self.lock_timer_ms = Some(lock_ms);
            }
        }

        if self.is_running() {
            self.drop_timer_ms += elapsed_ms;
            if self.drop_timer_ms >= self.drop_interval_ms() {
                self.drop_timer_ms = 0;
                changed |= self.shift(MoveDirection::Down);
            }
        }

        if self.is_running() {
            let (pipeline, mut ctx) = self.modifier_ctx();
            let expired = pipeline.update(elapsed_ms as f32 / 1000.0, &mut ctx);
            self.events
                .extend(expired.into_iter().map(|skill| BoardEvent::ModifierExpired { skill }));
        }

        self.second_timer_ms += elapsed_ms;
        while self.second_timer_ms >= SECOND_MS && self.is_running() {
            self.second_timer_ms -= SECOND_MS;
            self.second_tick();
        }

        changed
    }

    /// Per-second bookkeeping: match timer and catch-up skill grant
    fn second_tick(&mut self) {
        if let Some(secs) = self.remaining_secs {
            let secs = secs.saturating_sub(1);
            self.remaining_secs = Some(secs);
            if secs == 0 {
                self.end_game(GameOverReason::TimeUp);
                return;
            }
        }

        if self.config.practice {
            return;
        }
        self.secs_since_score += 1;
        if self.secs_since_score >= self.config.catch_up_secs {
            self.secs_since_score = 0;
            self.grant_skill();
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut next_queue = [PieceKind::I; NEXT_QUEUE_LEN];
        for (dst, kind) in next_queue.iter_mut().zip(self.queue.preview()) {
            *dst = *kind;
        }
        let skills: [Option<SkillId>; SKILL_SLOTS] = *self.skills.slots();
        let inversion = self.inversion();

        BoardSnapshot {
            board: self.board.to_id_rows(),
            active: self.active.map(ActiveSnapshot::from),
            ghost_y: self.ghost_y(),
            hold: self.hold,
            can_hold: self.can_hold,
            next_queue,
            score: self.scoring.score,
            lines: self.scoring.lines,
            combo: self.scoring.combo,
            back_to_back: self.scoring.back_to_back,
            pending_garbage: self.garbage.pending(),
            skills,
            modifiers: self
                .modifiers
                .iter()
                .map(|m| (m.skill, m.remaining_secs))
                .collect(),
            effects: EffectsSnapshot {
                inverted_vertical: inversion.vertical,
                inverted_horizontal: inversion.horizontal,
                color_flash: self.effects.color_flash_active(),
                jump_board: self.effects.jump_board_active(),
                speed_multiplier: self.effects.speed_multiplier,
            },
            remaining_secs: self.remaining_secs,
            danger: self.in_danger_zone(),
            game_over: self.game_over,
            seed: self.seed,
        }
    }
}
