//! TCP relay server
//!
//! Handles incoming connections, routes each client's messages through the
//! room registry and fans the results out to the other members.
//! Uses tokio for async networking.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

use chaos_tetris_types::{MoveDirection, RotateDirection, SkillId};

use crate::protocol::*;
use crate::registry::RoomRegistry;
use crate::room::{PlayerId, RoomError};
use crate::targeting::{TargetingKind, TargetingPolicy};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_members: usize,
    pub targeting: TargetingKind,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            max_members: 8,
            targeting: TargetingKind::Random,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("CHAOS_TETRIS_HOST").unwrap_or(defaults.host);
        let port = env::var("CHAOS_TETRIS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let max_members = env::var("CHAOS_TETRIS_MAX_MEMBERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_members);
        let targeting = env::var("CHAOS_TETRIS_TARGETING")
            .ok()
            .and_then(|s| TargetingKind::from_str(s.trim()))
            .unwrap_or(defaults.targeting);

        Self {
            host,
            port,
            max_members,
            targeting,
        }
    }
}

/// Why a client request was refused
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("Invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },
}

impl RequestError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RequestError::Room(e) => ErrorCode::from(e),
            RequestError::Invalid { .. } => ErrorCode::InvalidMessage,
        }
    }
}

/// Per-connection state
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,
    pub room_id: Option<String>,
}

impl Session {
    pub fn new(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            room_id: None,
        }
    }

    fn room(&self) -> Result<&str, RoomError> {
        self.room_id.as_deref().ok_or(RoomError::NotInRoom)
    }
}

/// Shared server state: rooms plus an outbound channel per connected player
pub struct Hub {
    registry: RoomRegistry,
    policy: Box<dyn TargetingPolicy>,
    clients: RwLock<HashMap<PlayerId, mpsc::UnboundedSender<ServerMessage>>>,
}

impl Hub {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            registry: RoomRegistry::new(config.max_members),
            policy: config.targeting.policy(),
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn register(&self, player_id: &str, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.clients.write().insert(player_id.to_string(), tx);
    }

    pub fn unregister(&self, player_id: &str) {
        self.clients.write().remove(player_id);
    }

    fn send_to(&self, player_id: &str, msg: ServerMessage) {
        if let Some(tx) = self.clients.read().get(player_id) {
            let _ = tx.send(msg);
        }
    }

    fn send_all(&self, recipients: &[PlayerId], msg: &ServerMessage) {
        let clients = self.clients.read();
        for id in recipients {
            if let Some(tx) = clients.get(id) {
                let _ = tx.send(msg.clone());
            }
        }
    }

    /// Member ids of `room_id`, optionally without `except`
    fn recipients(&self, room_id: &str, except: Option<&str>) -> Vec<PlayerId> {
        let Ok(room) = self.registry.get(room_id) else {
            return Vec::new();
        };
        let room = room.lock();
        room.members()
            .iter()
            .map(|m| m.id.clone())
            .filter(|id| Some(id.as_str()) != except)
            .collect()
    }

    fn broadcast(&self, room_id: &str, msg: ServerMessage) {
        let recipients = self.recipients(room_id, None);
        self.send_all(&recipients, &msg);
    }

    fn broadcast_others(&self, room_id: &str, sender: &str, msg: ServerMessage) {
        let recipients = self.recipients(room_id, Some(sender));
        self.send_all(&recipients, &msg);
    }

    fn broadcast_room_state(&self, room_id: &str) {
        let Ok(room) = self.registry.get(room_id) else {
            return;
        };
        let payload = RoomStatePayload::from(&*room.lock());
        self.broadcast(room_id, ServerMessage::RoomState(payload));
    }

    fn announce_winner(&self, room_id: &str, winner: Option<PlayerId>) {
        if let Some(winner_id) = winner {
            self.broadcast(room_id, ServerMessage::GameEnd { winner_id });
            self.broadcast_room_state(room_id);
        }
    }

    /// Apply one client message
    pub fn handle(&self, session: &mut Session, msg: ClientMessage) -> Result<(), RequestError> {
        let player = session.player_id.clone();
        match msg {
            ClientMessage::Join { room_id, player_name } => {
                if let Some(current) = session.room_id.clone() {
                    if current == room_id {
                        return Err(RoomError::AlreadyMember.into());
                    }
                    self.leave(session)?;
                }
                self.registry.join(&room_id, &player, &player_name)?;
                session.room_id = Some(room_id.clone());

                self.broadcast_others(
                    &room_id,
                    &player,
                    ServerMessage::PlayerJoined {
                        id: player.clone(),
                        name: player_name,
                    },
                );
                self.broadcast_room_state(&room_id);
            }

            ClientMessage::Leave { room_id } => {
                let current = session.room()?;
                if room_id.as_deref().is_some_and(|id| id != current) {
                    return Err(RoomError::NotInRoom.into());
                }
                self.leave(session)?;
            }

            ClientMessage::StartRequest => {
                let room_id = session.room()?;
                let seed = rand::rng().random_range(0..i64::from(i32::MAX));
                self.registry.get(room_id)?.lock().start(&player, seed)?;
                self.broadcast(room_id, ServerMessage::GameStart { seed });
                self.broadcast_room_state(room_id);
            }

            ClientMessage::State { state } => {
                let room_id = session.room()?;
                self.registry.get(room_id)?.lock().update_score(&player, state.score)?;
                self.broadcast_others(
                    room_id,
                    &player,
                    ServerMessage::PlayerState {
                        player_id: player.clone(),
                        state,
                    },
                );
            }

            ClientMessage::Move { direction } => {
                let room_id = self.member_room(session)?;
                let direction = MoveDirection::from_str(&direction).ok_or(RequestError::Invalid {
                    field: "direction",
                    value: direction,
                })?;
                self.broadcast_others(
                    room_id,
                    &player,
                    ServerMessage::PlayerMove {
                        player_id: player.clone(),
                        direction: direction.as_str().to_string(),
                    },
                );
            }

            ClientMessage::Rotate { direction } => {
                let room_id = self.member_room(session)?;
                let direction = RotateDirection::from_str(&direction).ok_or(RequestError::Invalid {
                    field: "direction",
                    value: direction,
                })?;
                self.broadcast_others(
                    room_id,
                    &player,
                    ServerMessage::PlayerRotate {
                        player_id: player.clone(),
                        direction: direction.as_str().to_string(),
                    },
                );
            }

            ClientMessage::Drop => {
                let room_id = self.member_room(session)?;
                let msg = ServerMessage::PlayerDrop {
                    player_id: player.clone(),
                };
                self.broadcast_others(room_id, &player, msg);
            }

            ClientMessage::SkillCast {
                skill_id,
                target_player_id,
            } => {
                let room_id = self.member_room(session)?;
                let skill = SkillId::from_str(&skill_id).ok_or(RequestError::Invalid {
                    field: "skillId",
                    value: skill_id,
                })?;
                if !self.registry.get(room_id)?.lock().is_member(&target_player_id) {
                    return Err(RoomError::PlayerNotFound.into());
                }
                tracing::debug!(
                    room = %room_id,
                    from = %player,
                    to = %target_player_id,
                    skill = skill.as_str(),
                    "skill cast"
                );
                self.broadcast(
                    room_id,
                    ServerMessage::SkillApplied {
                        skill_id: skill.as_str().to_string(),
                        target_player_id,
                        from: player.clone(),
                    },
                );
            }

            ClientMessage::Attack { lines } => {
                let room_id = session.room()?;
                if lines == 0 {
                    return Ok(());
                }
                let target = {
                    let room = self.registry.get(room_id)?;
                    let mut rng = rand::rng();
                    let mut room = room.lock();
                    room.route_attack(&player, self.policy.as_ref(), &mut rng)?
                };
                match target {
                    Some(target) => {
                        tracing::debug!(
                            room = %room_id,
                            from = %player,
                            to = %target,
                            lines,
                            "attack routed"
                        );
                        let msg = ServerMessage::Attacked {
                            lines,
                            from: player.clone(),
                        };
                        self.send_to(&target, msg);
                    }
                    None => {
                        tracing::debug!(room = %room_id, from = %player, lines, "attack dropped");
                    }
                }
            }

            ClientMessage::GameOver => {
                let room_id = session.room()?.to_string();
                self.eliminate(&room_id, &player)?;
            }
        }
        Ok(())
    }

    /// Leave the current room, if any, announcing the departure
    pub fn leave(&self, session: &mut Session) -> Result<(), RequestError> {
        let Some(room_id) = session.room_id.take() else {
            return Ok(());
        };
        let player = session.player_id.as_str();
        let departure = self.registry.leave(&room_id, player)?;
        if departure.emptied {
            return Ok(());
        }

        self.broadcast(&room_id, ServerMessage::PlayerLeft { id: player.to_string() });
        if let Some(winner_id) = departure.winner {
            self.broadcast(&room_id, ServerMessage::GameEnd { winner_id });
        }
        self.broadcast_room_state(&room_id);
        Ok(())
    }

    /// Connection dropped: counts as elimination, then as a leave
    pub fn disconnect(&self, session: &mut Session) {
        if let Some(room_id) = session.room_id.clone() {
            if let Err(e) = self.eliminate(&room_id, &session.player_id) {
                let player = &session.player_id;
                tracing::debug!(player = %player, error = %e, "no elimination on disconnect");
            }
            if let Err(e) = self.leave(session) {
                let player = &session.player_id;
                tracing::warn!(player = %player, error = %e, "leave on disconnect failed");
            }
        }
        self.unregister(&session.player_id);
    }

    fn eliminate(&self, room_id: &str, player: &str) -> Result<(), RequestError> {
        let result = self.registry.get(room_id)?.lock().eliminate(player)?;
        if result.newly_dead {
            self.broadcast(
                room_id,
                ServerMessage::PlayerDead {
                    player_id: player.to_string(),
                },
            );
            self.announce_winner(room_id, result.winner);
        }
        Ok(())
    }

    fn member_room<'s>(&self, session: &'s Session) -> Result<&'s str, RequestError> {
        let room_id = session.room()?;
        if !self.registry.get(room_id)?.lock().is_member(&session.player_id) {
            return Err(RoomError::PlayerNotFound.into());
        }
        Ok(room_id)
    }
}

/// Start the TCP server
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound = listener.local_addr()?;
    tracing::info!(
        addr = %bound,
        max_members = config.max_members,
        targeting = config.targeting.as_str(),
        "relay server listening"
    );
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let hub = Arc::new(Hub::new(&config));
    let mut client_id_counter = 0u64;

    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let player_id = format!("p{}", client_id_counter);

        tracing::info!(player = %player_id, %addr, "client connected");

        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, player_id.clone(), hub).await {
                tracing::warn!(player = %player_id, error = %e, "client error");
            }
            tracing::info!(player = %player_id, "client disconnected");
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    player_id: PlayerId,
    hub: Arc<Hub>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    hub.register(&player_id, tx.clone());

    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if serde_json::to_writer(&mut buf, &msg).is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let _ = tx.send(ServerMessage::Welcome {
        player_id: player_id.clone(),
    });

    let mut session = Session::new(player_id);
    let mut line = String::new();
    let result: anyhow::Result<()> = loop {
        line.clear();
        let bytes_read = match reader.read_line(&mut line).await {
            Ok(n) => n,
            Err(e) => break Err(e.into()),
        };
        if bytes_read == 0 {
            break Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Message(msg)) => {
                if let Err(e) = hub.handle(&mut session, msg) {
                    tracing::warn!(player = %session.player_id, error = %e, "request rejected");
                    let _ = tx.send(create_error(e.code(), &e.to_string()));
                }
            }
            Ok(ParsedMessage::Unknown(msg_type)) => {
                tracing::warn!(
                    player = %session.player_id,
                    msg_type = %msg_type,
                    "unknown message type"
                );
                let _ = tx.send(create_error(
                    ErrorCode::UnknownType,
                    &format!("Unknown message type: {}", msg_type),
                ));
            }
            Err(e) => {
                tracing::warn!(player = %session.player_id, error = %e, "malformed message");
                let _ = tx.send(create_error(
                    ErrorCode::InvalidMessage,
                    &format!("JSON parse error: {}", e),
                ));
            }
        }
    };

    hub.disconnect(&mut session);

    drop(tx);
    let _ = write_task.await;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> (Hub, HashMap<&'static str, mpsc::UnboundedReceiver<ServerMessage>>) {
        let hub = Hub::new(&ServerConfig::default());
        let mut receivers = HashMap::new();
        for id in ["p1", "p2", "p3"] {
            let (tx, rx) = mpsc::unbounded_channel();
            hub.register(id, tx);
            receivers.insert(id, rx);
        }
        (hub, receivers)
    }

    fn join(hub: &Hub, id: &str, room: &str) -> Session {
        let mut session = Session::new(id);
        hub.handle(
            &mut session,
            ClientMessage::Join {
                room_id: room.to_string(),
                player_name: id.to_uppercase(),
            },
        )
        .unwrap();
        session
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_non_host_start_is_rejected() {
        let (hub, _rx) = hub();
        let _host = join(&hub, "p1", "r");
        let mut guest = join(&hub, "p2", "r");
        let err = hub.handle(&mut guest, ClientMessage::StartRequest).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotHost);
    }

    #[test]
    fn test_attack_reaches_only_the_opponent() {
        let (hub, mut rx) = hub();
        let mut host = join(&hub, "p1", "r");
        let _guest = join(&hub, "p2", "r");
        hub.handle(&mut host, ClientMessage::StartRequest).unwrap();
        drain(rx.get_mut("p1").unwrap());
        drain(rx.get_mut("p2").unwrap());

        hub.handle(&mut host, ClientMessage::Attack { lines: 3 }).unwrap();
        assert_eq!(
            drain(rx.get_mut("p2").unwrap()),
            vec![ServerMessage::Attacked {
                lines: 3,
                from: "p1".to_string()
            }]
        );
        assert!(drain(rx.get_mut("p1").unwrap()).is_empty());
    }

    #[test]
    fn test_game_over_announces_winner() {
        let (hub, mut rx) = hub();
        let mut host = join(&hub, "p1", "r");
        let _guest = join(&hub, "p2", "r");
        hub.handle(&mut host, ClientMessage::StartRequest).unwrap();
        drain(rx.get_mut("p2").unwrap());

        hub.handle(&mut host, ClientMessage::GameOver).unwrap();
        let seen = drain(rx.get_mut("p2").unwrap());
        assert!(seen.contains(&ServerMessage::PlayerDead {
            player_id: "p1".to_string()
        }));
        assert!(seen.contains(&ServerMessage::GameEnd {
            winner_id: "p2".to_string()
        }));
    }

    #[test]
    fn test_bad_direction_is_invalid() {
        let (hub, _rx) = hub();
        let mut s = join(&hub, "p1", "r");
        let err = hub
            .handle(
                &mut s,
                ClientMessage::Move {
                    direction: "up".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidMessage);
    }

    #[test]
    fn test_disconnect_migrates_host() {
        let (hub, mut rx) = hub();
        let mut host = join(&hub, "p1", "r");
        let _guest = join(&hub, "p2", "r");
        drain(rx.get_mut("p2").unwrap());

        hub.disconnect(&mut host);
        let seen = drain(rx.get_mut("p2").unwrap());
        let state = seen.iter().find_map(|m| match m {
            ServerMessage::RoomState(s) => Some(s.clone()),
            _ => None,
        });
        assert_eq!(state.unwrap().host_id.as_deref(), Some("p2"));
    }
}
