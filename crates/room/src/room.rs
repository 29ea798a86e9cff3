//! Room orchestrator - membership, host role, match lifecycle and win detection
//!
//! The room never simulates boards. It trusts members to report their own
//! elimination and score, and is the single authority for who is in the room,
//! who is host, who is still alive and who won.

use rand::RngCore;

use crate::targeting::TargetingPolicy;

pub type PlayerId = String;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room is full")]
    RoomFull,

    #[error("Player not found in the room")]
    PlayerNotFound,

    #[error("Player already in the room")]
    AlreadyMember,

    #[error("Only the room host can perform this action: {0}")]
    RoomHostOnly(&'static str),

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not in a room")]
    NotInRoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Lobby,
    Running,
    /// Match finished; members stay and the host may start again
    Ended,
}

impl RoomPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomPhase::Lobby => "lobby",
            RoomPhase::Running => "running",
            RoomPhase::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: PlayerId,
    pub name: String,
    pub is_dead: bool,
    pub score: u32,
    /// Last member that sent garbage to this one in the current match
    pub last_attacker: Option<PlayerId>,
}

/// Result of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joined {
    pub is_host: bool,
    /// Joined a running match and watches until the next one
    pub spectator: bool,
}

/// Result of a leave
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Departure {
    /// The room has no members left
    pub emptied: bool,
    pub new_host: Option<PlayerId>,
    pub winner: Option<PlayerId>,
}

/// Result of an elimination report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Elimination {
    /// False when the player was already eliminated or no match is running
    pub newly_dead: bool,
    pub winner: Option<PlayerId>,
}

#[derive(Debug, Clone)]
pub struct Room {
    id: String,
    host_id: Option<PlayerId>,
    phase: RoomPhase,
    seed: i64,
    max_members: usize,
    /// Members in join order
    members: Vec<Member>,
    winner: Option<PlayerId>,
}

impl Room {
    pub fn new(id: impl Into<String>, max_members: usize) -> Self {
        Self {
            id: id.into(),
            host_id: None,
            phase: RoomPhase::Lobby,
            seed: 0,
            max_members,
            members: Vec::new(),
            winner: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RoomPhase::Running
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    fn member_mut(&mut self, id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    pub fn is_member(&self, id: &str) -> bool {
        self.member(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn alive_count(&self) -> usize {
        self.members.iter().filter(|m| !m.is_dead).count()
    }

    /// Add a member. The first member becomes host; joining a running match
    /// makes the member a spectator.
    pub fn join(
        &mut self,
        id: impl Into<PlayerId>,
        name: impl Into<String>,
    ) -> Result<Joined, RoomError> {
        let id = id.into();
        if self.is_member(&id) {
            return Err(RoomError::AlreadyMember);
        }
        if self.members.len() >= self.max_members {
            return Err(RoomError::RoomFull);
        }

        let spectator = self.is_running();
        let is_host = self.host_id.is_none();
        if is_host {
            self.host_id = Some(id.clone());
        }

        tracing::info!(room = %self.id, player = %id, spectator, is_host, "player joined");
        self.members.push(Member {
            id,
            name: name.into(),
            is_dead: spectator,
            score: 0,
            last_attacker: None,
        });

        Ok(Joined { is_host, spectator })
    }

    /// Remove a member, re-checking the win condition and moving the host role
    pub fn leave(&mut self, id: &str) -> Result<Departure, RoomError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or(RoomError::PlayerNotFound)?;
        self.members.remove(idx);
        tracing::info!(room = %self.id, player = %id, "player left");

        let mut departure = Departure::default();
        if self.members.is_empty() {
            self.host_id = None;
            departure.emptied = true;
            return Ok(departure);
        }

        if self.is_running() {
            departure.winner = self.check_win();
        }

        if self.host_id.as_deref() == Some(id) {
            let next = self.members[0].id.clone();
            tracing::info!(room = %self.id, host = %next, "host migrated");
            self.host_id = Some(next.clone());
            departure.new_host = Some(next);
        }

        Ok(departure)
    }

    /// Start a match with `seed`. Only the host may start, and not while running.
    pub fn start(&mut self, requester: &str, seed: i64) -> Result<i64, RoomError> {
        if !self.is_member(requester) {
            return Err(RoomError::PlayerNotFound);
        }
        if self.host_id.as_deref() != Some(requester) {
            return Err(RoomError::RoomHostOnly("start"));
        }
        if self.is_running() {
            return Err(RoomError::GameAlreadyStarted);
        }

        self.phase = RoomPhase::Running;
        self.seed = seed;
        self.winner = None;
        for member in &mut self.members {
            member.is_dead = false;
            member.score = 0;
            member.last_attacker = None;
        }

        tracing::info!(room = %self.id, seed, members = self.members.len(), "match started");
        Ok(seed)
    }

    /// Mark a member eliminated (idempotent) and re-check the win condition
    pub fn eliminate(&mut self, id: &str) -> Result<Elimination, RoomError> {
        if !self.is_running() {
            return Ok(Elimination::default());
        }
        let room_id = self.id.clone();
        let member = self.member_mut(id).ok_or(RoomError::PlayerNotFound)?;
        if member.is_dead {
            return Ok(Elimination::default());
        }
        member.is_dead = true;
        tracing::info!(room = %room_id, player = %id, "player eliminated");

        Ok(Elimination {
            newly_dead: true,
            winner: self.check_win(),
        })
    }

    pub fn update_score(&mut self, id: &str, score: u32) -> Result<(), RoomError> {
        let member = self.member_mut(id).ok_or(RoomError::PlayerNotFound)?;
        member.score = score;
        Ok(())
    }

    /// Pick the recipient of `from`'s attack among living opponents.
    ///
    /// Returns `None` when no opponent is alive or no match is running.
    pub fn route_attack(
        &mut self,
        from: &str,
        policy: &dyn TargetingPolicy,
        rng: &mut dyn RngCore,
    ) -> Result<Option<PlayerId>, RoomError> {
        let attacker = self.member(from).ok_or(RoomError::PlayerNotFound)?;
        if !self.is_running() {
            return Ok(None);
        }

        let candidates: Vec<&Member> = self
            .members
            .iter()
            .filter(|m| m.id != from && !m.is_dead)
            .collect();
        let Some(target) = policy.choose(attacker, &candidates, rng) else {
            return Ok(None);
        };

        if let Some(member) = self.member_mut(&target) {
            member.last_attacker = Some(from.to_string());
        }
        Ok(Some(target))
    }

    /// Decide whether the match is over and end it if so
    fn check_win(&mut self) -> Option<PlayerId> {
        let total = self.members.len();
        let alive: Vec<&Member> = self.members.iter().filter(|m| !m.is_dead).collect();

        let winner = match (total, alive.len()) {
            (0, _) => None,
            (1, _) => Some(self.members[0].id.clone()),
            (_, 1) => Some(alive[0].id.clone()),
            (_, 0) => self
                .members
                .iter()
                .enumerate()
                .max_by(|(ia, a), (ib, b)| a.score.cmp(&b.score).then(ib.cmp(ia)))
                .map(|(_, m)| m.id.clone()),
            _ => None,
        }?;

        self.end(winner.clone());
        Some(winner)
    }

    fn end(&mut self, winner: PlayerId) {
        tracing::info!(room = %self.id, winner = %winner, "match ended");
        self.phase = RoomPhase::Ended;
        self.winner = Some(winner);
    }
}
