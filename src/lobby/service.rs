//! Room service - routes session intents to rooms

use std::sync::Arc;

use tracing::{debug, info};

use crate::game::{Connection, GameRoom, RoomCommand, RoomError, RoomHandle};

use super::directory::RoomDirectory;

/// Entry point for everything a session asks of the lobby
pub struct RoomService {
    directory: Arc<RoomDirectory>,
}

impl RoomService {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            directory: Arc::new(RoomDirectory::new(max_rooms)),
        }
    }

    pub fn directory(&self) -> &Arc<RoomDirectory> {
        &self.directory
    }

    /// Create a room with `conn` seated in slot A and start its task
    pub fn create_room(&self, conn: &Connection) -> Result<String, RoomError> {
        let directory = self.directory.clone();
        let (code, mut room) = self
            .directory
            .create_room(conn.id, |code, seed| GameRoom::new(code, seed, directory))?;

        room.seat_creator(conn.clone());
        tokio::spawn(room.run());
        Ok(code)
    }

    /// Take a free slot, or reclaim one when `token` matches
    pub async fn join_room(
        &self,
        conn: &Connection,
        code: &str,
        token: Option<String>,
    ) -> Result<(), RoomError> {
        self.send_join(conn, code, token, false).await
    }

    /// Reclaim a slot by token only
    pub async fn rejoin_room(
        &self,
        conn: &Connection,
        code: &str,
        token: String,
    ) -> Result<(), RoomError> {
        self.send_join(conn, code, Some(token), true).await
    }

    pub async fn lock_aim(&self, conn: &Connection, angle_deg: f32, power: f32) -> Result<(), RoomError> {
        self.current_room(conn)?
            .send(RoomCommand::Aim {
                conn: conn.clone(),
                angle_deg,
                power,
            })
            .await
    }

    pub async fn fire(&self, conn: &Connection) -> Result<(), RoomError> {
        self.current_room(conn)?
            .send(RoomCommand::Fire { conn: conn.clone() })
            .await
    }

    pub async fn request_rematch(&self, conn: &Connection) -> Result<(), RoomError> {
        self.current_room(conn)?
            .send(RoomCommand::Rematch { conn: conn.clone() })
            .await
    }

    /// Detach `conn` from its room, including one whose join is still queued.
    /// Silent when it is in none.
    pub async fn leave(&self, conn: &Connection) {
        let Some(code) = self.directory.detach(conn.id) else {
            return;
        };
        info!(conn = %conn.id, room = %code, "Leaving room");

        // Queued behind any pending join, so the room sees join then leave
        if let Some(handle) = self.directory.get(&code) {
            if handle.send(RoomCommand::Leave { conn_id: conn.id }).await.is_err() {
                debug!(room = %code, "Room closed before leave was delivered");
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.directory.room_count()
    }

    pub fn connection_count(&self) -> usize {
        self.directory.connection_count()
    }

    async fn send_join(
        &self,
        conn: &Connection,
        code: &str,
        token: Option<String>,
        require_token: bool,
    ) -> Result<(), RoomError> {
        let handle = self.directory.begin_join(conn.id, code)?;
        let sent = handle
            .send(RoomCommand::Join {
                conn: conn.clone(),
                token,
                require_token,
            })
            .await;
        if sent.is_err() {
            self.directory.cancel_join(conn.id, code);
        }
        sent
    }

    fn current_room(&self, conn: &Connection) -> Result<RoomHandle, RoomError> {
        let membership = self
            .directory
            .membership(conn.id)
            .ok_or(RoomError::NotInRoom)?;
        self.directory
            .get(&membership.code)
            .ok_or(RoomError::RoomNotFound)
    }
}

impl Default for RoomService {
    fn default() -> Self {
        Self::new(super::directory::DEFAULT_MAX_ROOMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Phase, Slot};
    use crate::ws::protocol::ServerMsg;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_test::{assert_err, assert_ok};

    async fn next(rx: &mut UnboundedReceiver<ServerMsg>) -> ServerMsg {
        tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("connection channel closed")
    }

    async fn wait_for(
        rx: &mut UnboundedReceiver<ServerMsg>,
        pred: impl Fn(&ServerMsg) -> bool,
    ) -> ServerMsg {
        loop {
            let msg = next(rx).await;
            if pred(&msg) {
                return msg;
            }
        }
    }

    fn created_token(msg: &ServerMsg) -> String {
        match msg {
            ServerMsg::RoomCreated {
                reconnect_token, ..
            } => reconnect_token.clone(),
            other => panic!("expected room_created, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_and_join_starts_match() {
        let service = RoomService::default();
        let (a, mut a_rx) = Connection::channel();
        let (b, mut b_rx) = Connection::channel();

        let code = assert_ok!(service.create_room(&a));
        assert_eq!(code.len(), 5);
        assert_eq!(service.room_count(), 1);
        created_token(&next(&mut a_rx).await);

        assert_ok!(service.join_room(&b, &code, None).await);
        let joined = next(&mut b_rx).await;
        assert!(matches!(joined, ServerMsg::RoomJoined { slot: Slot::B, .. }));

        let started = wait_for(&mut a_rx, |m| matches!(m, ServerMsg::GameStarted { .. })).await;
        let ServerMsg::GameStarted { initial_state, .. } = started else {
            unreachable!();
        };
        assert_eq!(initial_state.phase, Phase::Aiming);
        assert_eq!(initial_state.active_slot, Some(Slot::A));
        assert_eq!(service.connection_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_room_per_connection() {
        let service = RoomService::default();
        let (a, _a_rx) = Connection::channel();
        let code = service.create_room(&a).unwrap();

        assert_eq!(service.create_room(&a).unwrap_err(), RoomError::AlreadyInRoom);
        assert_eq!(
            service.join_room(&a, &code, None).await.unwrap_err(),
            RoomError::AlreadyInRoom
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_room_and_no_membership() {
        let service = RoomService::default();
        let (a, _a_rx) = Connection::channel();

        assert_eq!(
            service.join_room(&a, "ZZZZZ", None).await.unwrap_err(),
            RoomError::RoomNotFound
        );
        assert_eq!(service.fire(&a).await.unwrap_err(), RoomError::NotInRoom);
        assert_eq!(
            service.lock_aim(&a, 45.0, 50.0).await.unwrap_err(),
            RoomError::NotInRoom
        );
        assert_eq!(
            service.request_rematch(&a).await.unwrap_err(),
            RoomError::NotInRoom
        );
        service.leave(&a).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_room_full_is_reported_to_joiner() {
        let service = RoomService::default();
        let (a, _a_rx) = Connection::channel();
        let (b, _b_rx) = Connection::channel();
        let (c, mut c_rx) = Connection::channel();

        let code = service.create_room(&a).unwrap();
        service.join_room(&b, &code, None).await.unwrap();
        service.join_room(&c, &code, None).await.unwrap();

        let msg = next(&mut c_rx).await;
        assert_eq!(msg, ServerMsg::error("room_full", "Room is full"));
        assert!(service.directory().membership(c.id).is_none());

        // The refused join no longer ties c to the room
        assert_ok!(service.create_room(&c));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_join_queued_still_leaves() {
        let service = RoomService::default();
        let (a, _a_rx) = Connection::channel();
        let (b, b_rx) = Connection::channel();
        let code = service.create_room(&a).unwrap();

        // b's socket closes before the room has applied its join
        service.join_room(&b, &code, None).await.unwrap();
        service.leave(&b).await;
        drop(b_rx);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(service.directory().membership(b.id).is_none());
        assert_eq!(service.connection_count(), 1);

        service.leave(&a).await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(service.room_count(), 0);
        assert_eq!(service.connection_count(), 0);
        let err = assert_err!(service.join_room(&b, &code, None).await);
        assert_eq!(err, RoomError::RoomNotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejoin_requires_matching_token() {
        let service = RoomService::default();
        let (a, mut a_rx) = Connection::channel();
        let (b, _b_rx) = Connection::channel();
        let code = service.create_room(&a).unwrap();
        let token = created_token(&next(&mut a_rx).await);
        service.join_room(&b, &code, None).await.unwrap();

        service.leave(&a).await;
        assert!(service.directory().membership(a.id).is_none());

        let (intruder, mut intruder_rx) = Connection::channel();
        service
            .rejoin_room(&intruder, &code, "wrong-token".into())
            .await
            .unwrap();
        let msg = wait_for(&mut intruder_rx, |m| matches!(m, ServerMsg::ErrorEvent { .. })).await;
        assert_eq!(
            msg,
            ServerMsg::error("invalid_token", "Reconnect token does not match this room")
        );

        let (a2, mut a2_rx) = Connection::channel();
        service.rejoin_room(&a2, &code, token).await.unwrap();
        let msg = next(&mut a2_rx).await;
        assert!(matches!(msg, ServerMsg::RoomJoined { slot: Slot::A, .. }));
        let turn = wait_for(&mut a2_rx, |m| matches!(m, ServerMsg::TurnStarted { .. })).await;
        assert!(matches!(turn, ServerMsg::TurnStarted { active_slot: Slot::A, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_creator_leaving_lobby_destroys_room() {
        let service = RoomService::default();
        let (a, _a_rx) = Connection::channel();
        let code = service.create_room(&a).unwrap();

        service.leave(&a).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(service.room_count(), 0);
        let (b, _b_rx) = Connection::channel();
        let err = assert_err!(service.join_room(&b, &code, None).await);
        assert_eq!(err, RoomError::RoomNotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_intents_reach_room() {
        let service = RoomService::default();
        let (a, mut a_rx) = Connection::channel();
        let (b, mut b_rx) = Connection::channel();
        let code = service.create_room(&a).unwrap();
        service.join_room(&b, &code, None).await.unwrap();
        wait_for(&mut a_rx, |m| matches!(m, ServerMsg::TurnStarted { .. })).await;

        service.fire(&b).await.unwrap();
        let msg = wait_for(&mut b_rx, |m| matches!(m, ServerMsg::ErrorEvent { .. })).await;
        assert_eq!(msg, ServerMsg::error("not_your_turn", "It is not your turn"));

        service.lock_aim(&a, 30.0, 55.0).await.unwrap();
        service.fire(&a).await.unwrap();
        let spawned = wait_for(&mut b_rx, |m| matches!(m, ServerMsg::ProjectileSpawned { .. })).await;
        let ServerMsg::ProjectileSpawned { projectile } = spawned else {
            unreachable!();
        };
        assert_eq!(projectile.owner, Slot::A);
        assert!(projectile.vx > 0.0);
    }
}
