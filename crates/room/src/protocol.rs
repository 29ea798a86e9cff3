//! Wire protocol for the room relay
//!
//! One JSON object per line in both directions. Every message carries a
//! `"type"` tag such as `"room:join"` or `"game:attacked"`. Field names are
//! camelCase on the wire.

use serde::{Deserialize, Serialize};

use chaos_tetris_core::BoardSnapshot;

use crate::room::{Room, RoomError};

/// Messages a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "room:join")]
    Join {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "playerName")]
        player_name: String,
    },
    #[serde(rename = "room:leave")]
    Leave {
        #[serde(rename = "roomId", default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
    #[serde(rename = "game:start-request")]
    StartRequest,
    #[serde(rename = "game:state")]
    State { state: PlayerStatePayload },
    #[serde(rename = "game:move")]
    Move { direction: String },
    #[serde(rename = "game:rotate")]
    Rotate { direction: String },
    #[serde(rename = "game:drop")]
    Drop,
    #[serde(rename = "skill:cast")]
    SkillCast {
        #[serde(rename = "skillId")]
        skill_id: String,
        #[serde(rename = "targetPlayerId")]
        target_player_id: String,
    },
    #[serde(rename = "game:attack")]
    Attack { lines: u32 },
    #[serde(rename = "game:over")]
    GameOver,
}

/// Type tags accepted from clients
pub const CLIENT_MESSAGE_TYPES: [&str; 10] = [
    "room:join",
    "room:leave",
    "game:start-request",
    "game:state",
    "game:move",
    "game:rotate",
    "game:drop",
    "skill:cast",
    "game:attack",
    "game:over",
];

/// Messages the server sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// First line on every connection
    #[serde(rename = "session:welcome")]
    Welcome {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "room:state")]
    RoomState(RoomStatePayload),
    #[serde(rename = "player:joined")]
    PlayerJoined { id: String, name: String },
    #[serde(rename = "player:left")]
    PlayerLeft { id: String },
    #[serde(rename = "game:start")]
    GameStart { seed: i64 },
    #[serde(rename = "player:dead")]
    PlayerDead {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "player:move")]
    PlayerMove {
        #[serde(rename = "playerId")]
        player_id: String,
        direction: String,
    },
    #[serde(rename = "player:rotate")]
    PlayerRotate {
        #[serde(rename = "playerId")]
        player_id: String,
        direction: String,
    },
    #[serde(rename = "player:drop")]
    PlayerDrop {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "game:attacked")]
    Attacked { lines: u32, from: String },
    #[serde(rename = "skill:applied")]
    SkillApplied {
        #[serde(rename = "skillId")]
        skill_id: String,
        #[serde(rename = "targetPlayerId")]
        target_player_id: String,
        from: String,
    },
    #[serde(rename = "player:state")]
    PlayerState {
        #[serde(rename = "playerId")]
        player_id: String,
        state: PlayerStatePayload,
    },
    #[serde(rename = "game:end")]
    GameEnd {
        #[serde(rename = "winnerId")]
        winner_id: String,
    },
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPayload {
    pub id: String,
    pub name: String,
    #[serde(rename = "isDead")]
    pub is_dead: bool,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatePayload {
    pub id: String,
    #[serde(rename = "hostId")]
    pub host_id: Option<String>,
    #[serde(rename = "isRunning")]
    pub is_running: bool,
    pub phase: String,
    pub players: Vec<MemberPayload>,
}

impl From<&Room> for RoomStatePayload {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id().to_string(),
            host_id: room.host_id().map(str::to_string),
            is_running: room.is_running(),
            phase: room.phase().as_str().to_string(),
            players: room
                .members()
                .iter()
                .map(|m| MemberPayload {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    is_dead: m.is_dead,
                    score: m.score,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePiecePayload {
    pub kind: String,
    pub rotation: String,
    pub x: i8,
    pub y: i8,
}

/// Board state a client publishes for its opponents' views.
///
/// The server does not validate it beyond recording `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatePayload {
    #[serde(default)]
    pub board: Vec<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<ActivePiecePayload>,
    pub score: u32,
    #[serde(default)]
    pub lines: u32,
    #[serde(default)]
    pub combo: i32,
    #[serde(rename = "pendingGarbage", default)]
    pub pending_garbage: u32,
    #[serde(rename = "remainingSecs", default, skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u32>,
    #[serde(default)]
    pub danger: bool,
    #[serde(rename = "gameOver", default)]
    pub game_over: bool,
}

impl From<&BoardSnapshot> for PlayerStatePayload {
    fn from(snapshot: &BoardSnapshot) -> Self {
        Self {
            board: snapshot.board.clone(),
            active: snapshot.active.map(|a| ActivePiecePayload {
                kind: a.kind.as_str().to_string(),
                rotation: a.rotation.as_str().to_string(),
                x: a.x,
                y: a.y,
            }),
            score: snapshot.score,
            lines: snapshot.lines,
            combo: snapshot.combo,
            pending_garbage: snapshot.pending_garbage,
            remaining_secs: snapshot.remaining_secs,
            danger: snapshot.danger,
            game_over: snapshot.game_over,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "room_not_found")]
    RoomNotFound,
    #[serde(rename = "room_full")]
    RoomFull,
    #[serde(rename = "not_member")]
    NotMember,
    #[serde(rename = "already_member")]
    AlreadyMember,
    #[serde(rename = "not_host")]
    NotHost,
    #[serde(rename = "already_running")]
    AlreadyRunning,
    #[serde(rename = "not_in_room")]
    NotInRoom,
    #[serde(rename = "invalid_message")]
    InvalidMessage,
    #[serde(rename = "unknown_type")]
    UnknownType,
}

impl From<&RoomError> for ErrorCode {
    fn from(err: &RoomError) -> Self {
        match err {
            RoomError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            RoomError::RoomFull => ErrorCode::RoomFull,
            RoomError::PlayerNotFound => ErrorCode::NotMember,
            RoomError::AlreadyMember => ErrorCode::AlreadyMember,
            RoomError::RoomHostOnly(_) => ErrorCode::NotHost,
            RoomError::GameAlreadyStarted => ErrorCode::AlreadyRunning,
            RoomError::NotInRoom => ErrorCode::NotInRoom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    pub ts: u64,
}

/// Parsed inbound line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMessage {
    Message(ClientMessage),
    /// Well-formed JSON with a type tag we do not handle
    Unknown(String),
}

/// Parse one inbound line.
///
/// Unknown types are not a parse error; a known type with bad fields is.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    match serde_json::from_str::<ClientMessage>(json) {
        Ok(msg) => Ok(ParsedMessage::Message(msg)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type", borrow)]
                msg_type: Option<&'a str>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or("unknown");
            if CLIENT_MESSAGE_TYPES.contains(&msg_type) {
                Err(e)
            } else {
                Ok(ParsedMessage::Unknown(msg_type.to_string()))
            }
        }
    }
}

pub fn create_error(code: ErrorCode, message: &str) -> ServerMessage {
    ServerMessage::Error(ErrorPayload {
        code,
        message: message.to_string(),
        ts: current_timestamp_ms(),
    })
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join() {
        let json = r#"{"type":"room:join","roomId":"lobby-1","playerName":"kai"}"#;
        assert_eq!(
            parse_message(json).unwrap(),
            ParsedMessage::Message(ClientMessage::Join {
                room_id: "lobby-1".to_string(),
                player_name: "kai".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_unit_messages() {
        assert_eq!(
            parse_message(r#"{"type":"game:start-request"}"#).unwrap(),
            ParsedMessage::Message(ClientMessage::StartRequest)
        );
        assert_eq!(
            parse_message(r#"{"type":"room:leave"}"#).unwrap(),
            ParsedMessage::Message(ClientMessage::Leave { room_id: None })
        );
    }

    #[test]
    fn test_parse_state_with_defaults() {
        let json = r#"{"type":"game:state","state":{"score":1200,"gameOver":false}}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Message(ClientMessage::State { state }) => {
                assert_eq!(state.score, 1200);
                assert!(state.board.is_empty());
                assert_eq!(state.remaining_secs, None);
            }
            other => panic!("Expected state message, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let parsed = parse_message(r#"{"type":"chat:say","text":"hi"}"#).unwrap();
        assert_eq!(parsed, ParsedMessage::Unknown("chat:say".to_string()));
    }

    #[test]
    fn test_known_type_with_bad_fields_is_an_error() {
        assert!(parse_message(r#"{"type":"game:attack","lines":"many"}"#).is_err());
        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn test_server_message_wire_names() {
        let msg = ServerMessage::Attacked {
            lines: 2,
            from: "p1".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"game:attacked","lines":2,"from":"p1"}"#);

        let err = create_error(ErrorCode::NotHost, "host only");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "not_host");
    }

    #[test]
    fn test_room_state_payload() {
        let mut room = Room::new("r9", 4);
        room.join("p1", "Ann").unwrap();
        room.join("p2", "Bo").unwrap();
        room.start("p1", 5).unwrap();

        let payload = RoomStatePayload::from(&room);
        assert_eq!(payload.host_id.as_deref(), Some("p1"));
        assert!(payload.is_running);
        assert_eq!(payload.players.len(), 2);

        let json = serde_json::to_value(ServerMessage::RoomState(payload)).unwrap();
        assert_eq!(json["type"], "room:state");
        assert_eq!(json["players"][1]["isDead"], false);
    }
}
