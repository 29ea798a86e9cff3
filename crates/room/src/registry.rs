//! Room registry - rooms are created on first join and dropped when empty

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::room::{Departure, Joined, Room, RoomError};

pub type SharedRoom = Arc<Mutex<Room>>;

pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, SharedRoom>>,
    max_members: usize,
}

impl RoomRegistry {
    pub fn new(max_members: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            max_members,
        }
    }

    /// Join `room_id`, creating it if needed
    pub fn join(
        &self,
        room_id: &str,
        player_id: &str,
        name: &str,
    ) -> Result<(SharedRoom, Joined), RoomError> {
        let mut rooms = self.rooms.write();
        let room = rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                tracing::info!(room = %room_id, "room created");
                Arc::new(Mutex::new(Room::new(room_id, self.max_members)))
            })
            .clone();

        let mut guard = room.lock();
        match guard.join(player_id, name) {
            Ok(joined) => {
                drop(guard);
                Ok((room, joined))
            }
            Err(e) => {
                if guard.is_empty() {
                    rooms.remove(room_id);
                }
                Err(e)
            }
        }
    }

    pub fn get(&self, room_id: &str) -> Result<SharedRoom, RoomError> {
        self.rooms
            .read()
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))
    }

    /// Remove `player_id` from `room_id`, dropping the room once empty
    pub fn leave(&self, room_id: &str, player_id: &str) -> Result<Departure, RoomError> {
        let mut rooms = self.rooms.write();
        let room = rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        let departure = room.lock().leave(player_id)?;
        if departure.emptied {
            rooms.remove(room_id);
            tracing::info!(room = %room_id, "room closed");
        }
        Ok(departure)
    }

    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.read().contains_key(room_id)
    }
}
