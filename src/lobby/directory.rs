//! Room registry and connection index

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tracing::info;

use crate::game::rng::GameRng;
use crate::game::{ConnectionId, RoomError, RoomHandle, Slot};

use super::codes::allocate_code;

/// Default cap on live rooms
pub const DEFAULT_MAX_ROOMS: usize = 10_000;

/// Where a connection currently sits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub code: String,
    pub slot: Slot,
}

struct DirectoryInner {
    rooms: HashMap<String, RoomHandle>,
    connections: HashMap<ConnectionId, Membership>,
    /// Joins queued on a room but not yet applied by it
    pending: HashMap<ConnectionId, String>,
    /// Codes handed out to rooms still being built
    reserved: HashSet<String>,
    rng: GameRng,
}

impl DirectoryInner {
    fn is_attached(&self, conn: ConnectionId) -> bool {
        self.connections.contains_key(&conn) || self.pending.contains_key(&conn)
    }
}

/// Live rooms keyed by code plus the connection -> (room, slot) index.
/// Both maps sit behind one lock so they can never disagree.
pub struct RoomDirectory {
    inner: Mutex<DirectoryInner>,
    max_rooms: usize,
}

impl RoomDirectory {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            inner: Mutex::new(DirectoryInner {
                rooms: HashMap::new(),
                connections: HashMap::new(),
                pending: HashMap::new(),
                reserved: HashSet::new(),
                rng: GameRng::from_entropy(),
            }),
            max_rooms,
        }
    }

    /// Allocate a code and seed, build the room with `build` (outside the
    /// lock), then register it and index `creator` into slot A.
    pub fn create_room<R>(
        &self,
        creator: ConnectionId,
        build: impl FnOnce(String, u64) -> (R, RoomHandle),
    ) -> Result<(String, R), RoomError> {
        let (code, seed) = self.reserve(creator)?;
        let (room, handle) = build(code.clone(), seed);

        let mut inner = self.inner.lock();
        inner.reserved.remove(&code);
        if inner.is_attached(creator) {
            return Err(RoomError::AlreadyInRoom);
        }
        inner.rooms.insert(code.clone(), handle);
        inner.connections.insert(
            creator,
            Membership {
                code: code.clone(),
                slot: Slot::A,
            },
        );

        info!(room = %code, conn = %creator, live_rooms = inner.rooms.len(), "Room created");
        Ok((code, room))
    }

    fn reserve(&self, creator: ConnectionId) -> Result<(String, u64), RoomError> {
        let mut inner = self.inner.lock();
        if inner.is_attached(creator) {
            return Err(RoomError::AlreadyInRoom);
        }
        if inner.rooms.len() + inner.reserved.len() >= self.max_rooms {
            return Err(RoomError::ServerFull);
        }

        let DirectoryInner {
            rooms,
            reserved,
            rng,
            ..
        } = &mut *inner;
        let code = allocate_code(rng, |c| rooms.contains_key(c) || reserved.contains(c));
        let seed = rng.next_seed();
        reserved.insert(code.clone());
        Ok((code, seed))
    }

    /// Record that `conn` has a join queued on room `code` and return its handle
    pub fn begin_join(&self, conn: ConnectionId, code: &str) -> Result<RoomHandle, RoomError> {
        let mut inner = self.inner.lock();
        if inner.is_attached(conn) {
            return Err(RoomError::AlreadyInRoom);
        }
        let handle = inner.rooms.get(code).cloned().ok_or(RoomError::RoomNotFound)?;
        inner.pending.insert(conn, code.to_string());
        Ok(handle)
    }

    /// Drop a queued join that the room refused or never received
    pub fn cancel_join(&self, conn: ConnectionId, code: &str) {
        let mut inner = self.inner.lock();
        if inner.pending.get(&conn).is_some_and(|c| c == code) {
            inner.pending.remove(&conn);
        }
    }

    pub fn get(&self, code: &str) -> Option<RoomHandle> {
        self.inner.lock().rooms.get(code).cloned()
    }

    pub fn membership(&self, conn: ConnectionId) -> Option<Membership> {
        self.inner.lock().connections.get(&conn).cloned()
    }

    /// Index `conn` into a slot of a live room
    pub fn bind(&self, conn: ConnectionId, code: &str, slot: Slot) -> Result<(), RoomError> {
        let mut inner = self.inner.lock();
        if !inner.rooms.contains_key(code) {
            return Err(RoomError::RoomNotFound);
        }
        let membership = Membership {
            code: code.to_string(),
            slot,
        };
        match inner.connections.get(&conn) {
            Some(existing) if *existing != membership => Err(RoomError::AlreadyInRoom),
            _ => {
                if inner.pending.get(&conn).is_some_and(|c| c == code) {
                    inner.pending.remove(&conn);
                }
                inner.connections.insert(conn, membership);
                Ok(())
            }
        }
    }

    /// Drop `conn` from the index if it belongs to room `code`
    pub fn unbind(&self, conn: ConnectionId, code: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.connections.get(&conn) {
            Some(m) if m.code == code => {
                inner.connections.remove(&conn);
                true
            }
            _ => false,
        }
    }

    /// Detach `conn` from the index, returning the room it was bound to or
    /// had a join queued on
    pub fn detach(&self, conn: ConnectionId) -> Option<String> {
        let mut inner = self.inner.lock();
        let bound = inner.connections.remove(&conn).map(|m| m.code);
        let queued = inner.pending.remove(&conn);
        bound.or(queued)
    }

    /// Delete a room and every index entry pointing at it
    pub fn remove_room(&self, code: &str) {
        let mut inner = self.inner.lock();
        inner.rooms.remove(code);
        inner.connections.retain(|_, m| m.code != code);
        inner.pending.retain(|_, c| c != code);
        info!(room = %code, live_rooms = inner.rooms.len(), "Room removed");
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.lock().connections.len()
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROOMS)
    }
}
