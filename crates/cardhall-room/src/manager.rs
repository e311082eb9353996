//! Room manager: finds or creates rooms by code and routes joins to them.

use std::collections::HashMap;

use cardhall_protocol::{JoinRequest, RoomCode};

use crate::room::spawn_room;
use crate::{Joined, Link, RoomConfig, RoomError, RoomHandle};

/// Every live room, keyed by its code.
///
/// A room closes itself when its last member's grace period ends. The
/// manager notices lazily: closed handles are reaped on the next join,
/// and a join that races a closing room is retried on a fresh one.
pub struct RoomManager {
    rooms: HashMap<RoomCode, RoomHandle>,
    config: RoomConfig,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Joins `request` to the room named in it, creating the room if absent.
    ///
    /// Returns the room's handle so the connection can send later
    /// commands without going through the manager again.
    ///
    /// # Errors
    /// - [`RoomError::CodeRequired`]: missing or blank room code
    /// - [`RoomError::RoomFull`]: the room is at capacity
    pub async fn join(
        &mut self,
        request: JoinRequest,
        link: Link,
    ) -> Result<(RoomHandle, Joined), RoomError> {
        let code = request
            .room_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(RoomCode::from)
            .ok_or(RoomError::CodeRequired)?;

        self.reap();
        let handle = self.get_or_create(&code);
        match handle.join(request.clone(), link.clone()).await {
            Ok(joined) => Ok((handle, joined)),
            Err(RoomError::Unavailable(_)) => {
                tracing::debug!(room = %code, "room closed during join, recreating");
                self.rooms.remove(&code);
                let handle = self.get_or_create(&code);
                let joined = handle.join(request, link).await?;
                Ok((handle, joined))
            }
            Err(err) => Err(err),
        }
    }

    fn get_or_create(&mut self, code: &RoomCode) -> RoomHandle {
        self.rooms
            .entry(code.clone())
            .or_insert_with(|| {
                tracing::info!(room = %code, "room created");
                spawn_room(code.clone(), self.config.clone())
            })
            .clone()
    }

    /// Forgets rooms whose actors have stopped.
    pub fn reap(&mut self) {
        self.rooms.retain(|code, handle| {
            let open = !handle.is_closed();
            if !open {
                tracing::info!(room = %code, "room removed");
            }
            open
        });
    }

    pub fn get(&self, code: &RoomCode) -> Option<&RoomHandle> {
        self.rooms.get(code).filter(|handle| !handle.is_closed())
    }

    /// Rooms whose actors are still running.
    pub fn room_count(&self) -> usize {
        self.rooms.values().filter(|handle| !handle.is_closed()).count()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
