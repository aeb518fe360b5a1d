//! Game simulation modules

pub mod combat;
pub mod error;
pub mod physics;
pub mod rng;
pub mod room;
pub mod snapshot;
pub mod state;
pub mod terrain;
pub mod timers;

pub use error::RoomError;
pub use room::{GameRoom, RoomCommand, RoomHandle};
pub use state::{Phase, Slot};

use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

/// Identity of one WebSocket session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outbound handle of one session; rooms push messages through it
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerMsg>,
}

impl Connection {
    /// New connection plus the receiver its socket writer drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: ConnectionId::new(),
                tx,
            },
            rx,
        )
    }

    /// Returns false once the socket side has gone away
    pub fn send(&self, msg: ServerMsg) -> bool {
        self.tx.send(msg).is_ok()
    }

    pub fn send_error(&self, err: &RoomError) -> bool {
        self.send(ServerMsg::error(err.code(), err.to_string()))
    }
}
