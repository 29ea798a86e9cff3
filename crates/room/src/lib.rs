//! Room orchestration and relay server
//!
//! The room is the only authority over cross-board facts: who is a member, who
//! is host, who is eliminated and who won. Board state itself stays on the
//! clients; the server relays attacks, skills and state snapshots between them.
//!
//! # Module Structure
//!
//! - [`room`]: membership, host role, match lifecycle and win detection
//! - [`targeting`]: pluggable attack target selection
//! - [`registry`]: room lookup, creation on first join, removal when empty
//! - [`protocol`]: line-delimited JSON messages
//! - [`server`]: tokio TCP server and per-connection handling

pub mod protocol;
pub mod registry;
pub mod room;
pub mod server;
pub mod targeting;

pub use protocol::{ClientMessage, ErrorCode, ServerMessage};
pub use registry::RoomRegistry;
pub use room::{Departure, Elimination, Joined, Member, PlayerId, Room, RoomError, RoomPhase};
pub use server::{run_server, Hub, ServerConfig, Session};
pub use targeting::{HighestThreat, RandomTarget, Retaliate, TargetingKind, TargetingPolicy};
