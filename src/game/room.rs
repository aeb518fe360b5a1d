//! Room state and the per-room command loop
//!
//! A room owns its match snapshot, its two player slots and its timers. All
//! mutation happens inside [`GameRoom::run`], which drains one queue carrying
//! both player intents and timer firings, so nothing for a room ever overlaps.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::lobby::RoomDirectory;
use crate::util::time::{
    deadline_to_unix_millis, tick_delta, tick_interval, RECONNECT_GRACE_MS,
    ROUND_ADVANCE_DELAY_MS, TURN_DURATION_MS,
};
use crate::ws::protocol::{PlayerInfo, ServerMsg};

use super::combat::CombatSystem;
use super::physics::{Impact, PhysicsSystem, WORLD_HEIGHT, WORLD_WIDTH};
use super::rng::GameRng;
use super::snapshot::{projectile_view, SnapshotBuilder};
use super::state::{MatchSnapshot, Phase, Slot};
use super::terrain::Terrain;
use super::timers::{RoomTimers, TimerKind};
use super::{Connection, ConnectionId, RoomError};

/// Pending commands per room before senders wait
const ROOM_QUEUE_CAPACITY: usize = 256;

/// Work delivered to a room's queue
#[derive(Debug)]
pub enum RoomCommand {
    /// Claim a slot, or reclaim one when `token` matches
    Join {
        conn: Connection,
        token: Option<String>,
        require_token: bool,
    },
    Leave {
        conn_id: ConnectionId,
    },
    Aim {
        conn: Connection,
        angle_deg: f32,
        power: f32,
    },
    Fire {
        conn: Connection,
    },
    Rematch {
        conn: Connection,
    },
    Timer {
        kind: TimerKind,
        epoch: u64,
    },
}

/// Sending side of a room's queue
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub code: String,
    pub tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.tx.send(cmd).await.map_err(|_| RoomError::RoomNotFound)
    }
}

/// A claimed slot. The token never changes for the life of the room.
#[derive(Debug)]
struct Player {
    token: String,
    conn: Option<Connection>,
    connected: bool,
}

/// What a disconnect interrupted
#[derive(Debug, Clone, Copy)]
struct PauseState {
    interrupted: Phase,
    turn_remaining: Option<Duration>,
}

/// Room aggregate (owned by the room task)
pub struct Room {
    code: String,
    rng: GameRng,
    snapshot: MatchSnapshot,
    players: [Option<Player>; 2],
    rematch_votes: [bool; 2],
    pause: Option<PauseState>,
    next_starting_slot: Slot,
    timers: RoomTimers,
    snapshots: SnapshotBuilder,
    directory: Arc<RoomDirectory>,
    closed: bool,
}

impl Room {
    fn new(
        code: String,
        seed: u64,
        directory: Arc<RoomDirectory>,
        room_tx: mpsc::Sender<RoomCommand>,
    ) -> Self {
        let mut rng = GameRng::new(seed);
        let preview_seed = rng.next_seed();
        let mut snapshot =
            MatchSnapshot::new(Terrain::generate(preview_seed, WORLD_WIDTH, WORLD_HEIGHT));
        snapshot.seed = preview_seed;
        PhysicsSystem::reground_tanks(&mut snapshot);

        Self {
            snapshots: SnapshotBuilder::new(code.clone()),
            code,
            rng,
            snapshot,
            players: [None, None],
            rematch_votes: [false; 2],
            pause: None,
            next_starting_slot: Slot::A,
            timers: RoomTimers::new(room_tx),
            directory,
            closed: false,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Seat the creator in slot A. The directory has already indexed them.
    fn seat_creator(&mut self, conn: Connection) -> Slot {
        let slot = Slot::A;
        let token = self.rng.token();
        conn.send(ServerMsg::RoomCreated {
            room_code: self.code.clone(),
            slot,
            reconnect_token: token.clone(),
        });
        self.players[slot.index()] = Some(Player {
            token,
            conn: Some(conn),
            connected: true,
        });
        self.snapshot.tank_mut(slot).connected = true;
        self.broadcast_state();
        slot
    }

    /// Apply one queued command
    pub fn handle_command(&mut self, cmd: RoomCommand) {
        if self.closed {
            debug!(room = %self.code, ?cmd, "Command for closed room dropped");
            return;
        }
        match cmd {
            RoomCommand::Join {
                conn,
                token,
                require_token,
            } => {
                let result = self.handle_join(&conn, token.as_deref(), require_token);
                if result.is_err() {
                    self.directory.cancel_join(conn.id, &self.code);
                }
                self.reply(&conn, result.map(|_| ()));
            }
            RoomCommand::Leave { conn_id } => {
                if let Err(e) = self.handle_leave(conn_id) {
                    debug!(room = %self.code, conn = %conn_id, error = %e, "Leave ignored");
                }
            }
            RoomCommand::Aim {
                conn,
                angle_deg,
                power,
            } => {
                let result = self.handle_aim(conn.id, angle_deg, power);
                self.reply(&conn, result);
            }
            RoomCommand::Fire { conn } => {
                let result = self.handle_fire(conn.id);
                self.reply(&conn, result);
            }
            RoomCommand::Rematch { conn } => {
                let result = self.handle_rematch(conn.id);
                self.reply(&conn, result);
            }
            RoomCommand::Timer { kind, epoch } => self.handle_timer(kind, epoch),
        }
    }

    fn reply(&self, conn: &Connection, result: Result<(), RoomError>) {
        if let Err(e) = result {
            debug!(room = %self.code, conn = %conn.id, code = e.code(), "Intent rejected");
            conn.send_error(&e);
        }
    }

    // ------------------------------------------------------------------
    // Player intents
    // ------------------------------------------------------------------

    fn handle_join(
        &mut self,
        conn: &Connection,
        token: Option<&str>,
        require_token: bool,
    ) -> Result<Slot, RoomError> {
        if let Some(slot) = token.and_then(|t| self.slot_for_token(t)) {
            self.reconnect(slot, conn)?;
            return Ok(slot);
        }
        if require_token {
            return Err(RoomError::InvalidToken);
        }

        let slot = Slot::ALL
            .into_iter()
            .find(|s| self.players[s.index()].is_none())
            .ok_or(RoomError::RoomFull)?;
        self.directory.bind(conn.id, &self.code, slot)?;

        let token = self.rng.token();
        self.players[slot.index()] = Some(Player {
            token: token.clone(),
            conn: Some(conn.clone()),
            connected: true,
        });
        self.snapshot.tank_mut(slot).connected = true;

        info!(room = %self.code, slot = %slot, conn = %conn.id, "Player joined room");
        conn.send(ServerMsg::RoomJoined {
            room_code: self.code.clone(),
            slot,
            players: self.player_infos(),
            reconnect_token: token,
        });

        if self.snapshot.phase == Phase::Lobby && self.all_connected() {
            self.start_match();
        } else {
            self.broadcast_state();
        }
        Ok(slot)
    }

    fn reconnect(&mut self, slot: Slot, conn: &Connection) -> Result<(), RoomError> {
        self.directory.bind(conn.id, &self.code, slot)?;

        let Some(player) = self.players[slot.index()].as_mut() else {
            return Err(RoomError::InvalidToken);
        };
        let previous = player.conn.replace(conn.clone());
        player.connected = true;
        let token = player.token.clone();

        if let Some(old) = previous.filter(|old| old.id != conn.id) {
            self.directory.unbind(old.id, &self.code);
            old.send(ServerMsg::error(
                "session_replaced",
                "This slot was reclaimed by another connection",
            ));
        }
        self.snapshot.tank_mut(slot).connected = true;

        info!(room = %self.code, slot = %slot, conn = %conn.id, phase = ?self.snapshot.phase, "Player reconnected");
        conn.send(ServerMsg::RoomJoined {
            room_code: self.code.clone(),
            slot,
            players: self.player_infos(),
            reconnect_token: token,
        });
        self.broadcast(ServerMsg::PlayerReconnected { slot });

        if self.snapshot.phase == Phase::PausedReconnect && self.all_connected() {
            self.resume();
        } else {
            self.broadcast_state();
        }
        Ok(())
    }

    fn handle_leave(&mut self, conn_id: ConnectionId) -> Result<(), RoomError> {
        let slot = self.slot_of(conn_id)?;
        self.directory.unbind(conn_id, &self.code);
        if let Some(player) = self.players[slot.index()].as_mut() {
            player.conn = None;
            player.connected = false;
        }
        self.snapshot.tank_mut(slot).connected = false;

        info!(room = %self.code, slot = %slot, phase = ?self.snapshot.phase, "Player disconnected");

        match self.snapshot.phase {
            Phase::Lobby => {
                if self.any_connected() {
                    self.broadcast_state();
                } else {
                    self.destroy("lobby empty");
                }
            }
            Phase::MatchEnd => {
                self.rematch_votes[slot.index()] = false;
                if self.any_connected() {
                    self.broadcast(ServerMsg::PlayerDisconnected {
                        slot,
                        reconnect_deadline: None,
                    });
                    self.broadcast_rematch(None);
                    self.broadcast_state();
                } else {
                    self.destroy("both players left after match end");
                }
            }
            phase if phase.is_in_progress() => self.enter_pause(slot),
            // The grace timer from the first disconnect keeps running.
            _ => self.broadcast_state(),
        }
        Ok(())
    }

    fn handle_aim(&mut self, conn_id: ConnectionId, angle_deg: f32, power: f32) -> Result<(), RoomError> {
        let slot = self.authorize_turn(conn_id)?;
        let tank = self.snapshot.tank_mut(slot);
        tank.set_aim(angle_deg, power);
        debug!(room = %self.code, slot = %slot, angle = tank.angle_deg, power = tank.power, "Aim locked");
        self.broadcast_state();
        Ok(())
    }

    fn handle_fire(&mut self, conn_id: ConnectionId) -> Result<(), RoomError> {
        let slot = self.authorize_turn(conn_id)?;
        debug!(room = %self.code, slot = %slot, "Fire requested");
        self.resolve_turn();
        Ok(())
    }

    fn handle_rematch(&mut self, conn_id: ConnectionId) -> Result<(), RoomError> {
        let slot = self.slot_of(conn_id)?;
        if self.snapshot.phase != Phase::MatchEnd {
            return Err(RoomError::WrongPhase);
        }
        if !self.is_connected(slot) {
            return Err(RoomError::NotConnected);
        }

        self.rematch_votes[slot.index()] = true;
        info!(room = %self.code, slot = %slot, "Rematch requested");
        self.broadcast_rematch(Some(slot));

        if self.all_connected() && self.rematch_votes.iter().all(|v| *v) {
            self.start_match();
        } else {
            self.broadcast_state();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    fn handle_timer(&mut self, kind: TimerKind, epoch: u64) {
        if !self.timers.is_current(kind, epoch) {
            debug!(room = %self.code, ?kind, epoch, "Stale timer firing ignored");
            return;
        }
        if kind != TimerKind::Tick {
            self.timers.mark_fired(kind);
        }

        match kind {
            TimerKind::Turn => self.on_turn_expired(),
            TimerKind::Tick => self.on_physics_tick(),
            TimerKind::ReconnectGrace => self.on_grace_expired(),
            TimerKind::RoundAdvance => self.on_round_advance(),
        }
    }

    fn on_turn_expired(&mut self) {
        if self.snapshot.phase != Phase::Aiming {
            warn!(room = %self.code, phase = ?self.snapshot.phase, "Turn timer fired outside aiming");
            return;
        }
        info!(room = %self.code, slot = %self.snapshot.active_slot, "Turn expired, auto-firing");
        self.resolve_turn();
    }

    fn on_physics_tick(&mut self) {
        if self.snapshot.phase != Phase::ProjectileFlight {
            warn!(room = %self.code, phase = ?self.snapshot.phase, "Physics tick outside flight");
            self.timers.cancel(TimerKind::Tick);
            return;
        }

        match PhysicsSystem::step_projectile(&mut self.snapshot, tick_delta()) {
            Some(impact) => self.resolve_impact(impact),
            None if self.snapshot.projectile.is_none() => {
                warn!(room = %self.code, "Flight without a projectile, ending round");
                self.timers.cancel(TimerKind::Tick);
                self.finish_round();
            }
            None => self.broadcast_state(),
        }
    }

    fn on_grace_expired(&mut self) {
        if self.snapshot.phase != Phase::PausedReconnect {
            warn!(room = %self.code, phase = ?self.snapshot.phase, "Grace timer fired outside pause");
            return;
        }

        let connected: Vec<Slot> = Slot::ALL
            .into_iter()
            .filter(|s| self.is_connected(*s))
            .collect();
        let winner = match connected.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        info!(room = %self.code, winner = ?winner, "Reconnect grace expired, forfeit");
        self.end_match(winner);

        if !self.any_connected() {
            self.destroy("abandoned during pause");
        }
    }

    fn on_round_advance(&mut self) {
        if self.snapshot.phase != Phase::RoundEnd {
            debug!(room = %self.code, phase = ?self.snapshot.phase, "Pending turn advance dropped");
            return;
        }
        self.advance_turn();
    }

    // ------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------

    fn start_match(&mut self) {
        self.timers.cancel_all();

        let seed = self.rng.next_seed();
        self.snapshot.seed = seed;
        self.snapshot.terrain = Terrain::generate(seed, WORLD_WIDTH, WORLD_HEIGHT);
        self.snapshot.reset_tanks();
        PhysicsSystem::reground_tanks(&mut self.snapshot);
        self.snapshot.projectile = None;
        self.snapshot.winner_slot = None;
        self.rematch_votes = [false; 2];
        self.pause = None;

        let starting = self.next_starting_slot;
        self.next_starting_slot = starting.opponent();
        self.begin_turn(starting);

        info!(room = %self.code, seed, starting_slot = %starting, "Match started");
        let initial_state = self.snapshots.state_view(&self.snapshot, &[], None);
        self.broadcast(ServerMsg::GameStarted {
            seed,
            initial_state,
        });
        self.announce_turn();
        self.broadcast_state();
    }

    /// Hand the turn to `slot` with fresh wind and a full clock
    fn begin_turn(&mut self, slot: Slot) {
        self.snapshot.phase = Phase::Aiming;
        self.snapshot.active_slot = slot;
        self.snapshot.projectile = None;
        self.snapshot.wind = PhysicsSystem::pick_wind(&mut self.rng);
        self.arm_turn_clock(Duration::from_millis(TURN_DURATION_MS));
    }

    fn arm_turn_clock(&mut self, remaining: Duration) {
        self.snapshot.turn_deadline = Some(Instant::now() + remaining);
        self.timers.schedule_once(TimerKind::Turn, remaining);
    }

    fn announce_turn(&self) {
        if let Some(deadline) = self.snapshot.turn_deadline {
            self.broadcast(ServerMsg::TurnStarted {
                active_slot: self.snapshot.active_slot,
                turn_ends_at: deadline_to_unix_millis(deadline),
            });
        }
    }

    fn advance_turn(&mut self) {
        let next = self.snapshot.active_slot.opponent();
        self.begin_turn(next);
        debug!(room = %self.code, slot = %next, wind = self.snapshot.wind, "Turn advanced");
        self.announce_turn();
        self.broadcast_state();
    }

    /// Launch the active tank's shell. Both an explicit fire and turn expiry land here.
    fn resolve_turn(&mut self) {
        if self.snapshot.phase != Phase::Aiming {
            warn!(room = %self.code, phase = ?self.snapshot.phase, "Shot resolution outside aiming");
            return;
        }
        self.timers.cancel(TimerKind::Turn);
        self.snapshot.turn_deadline = None;

        let shooter = self.snapshot.active_slot;
        let projectile = PhysicsSystem::spawn_projectile(&mut self.snapshot, shooter);
        self.snapshot.phase = Phase::ProjectileFlight;
        self.timers.schedule_every(TimerKind::Tick, tick_interval());

        self.broadcast(ServerMsg::ProjectileSpawned {
            projectile: projectile_view(&projectile),
        });
        self.broadcast_state();
    }

    fn resolve_impact(&mut self, impact: Impact) {
        self.timers.cancel(TimerKind::Tick);
        let Some(projectile) = self.snapshot.projectile.take() else {
            warn!(room = %self.code, ?impact, "Impact without a live projectile ignored");
            return;
        };
        let shooter = projectile.owner;

        self.snapshot.terrain.deform(impact.x, impact.y);
        PhysicsSystem::reground_tanks(&mut self.snapshot);
        let reports = CombatSystem::apply_blast_damage(&mut self.snapshot, impact.x, impact.y);

        info!(
            room = %self.code,
            shooter = %shooter,
            kind = ?impact.kind,
            x = impact.x,
            y = impact.y,
            hits = reports.len(),
            "Shell landed"
        );

        self.broadcast(ServerMsg::TerrainUpdated {
            heights: self.snapshot.terrain.heights.clone(),
        });
        for report in &reports {
            self.broadcast(ServerMsg::DamageApplied {
                slot: report.slot,
                amount: report.amount,
                hp_after: report.hp_after,
            });
        }

        match CombatSystem::resolve_winner(&self.snapshot, shooter) {
            Some(winner) => self.end_match(Some(winner)),
            None => self.finish_round(),
        }
    }

    fn finish_round(&mut self) {
        self.snapshot.phase = Phase::RoundEnd;
        self.snapshot.projectile = None;
        self.timers.schedule_once(
            TimerKind::RoundAdvance,
            Duration::from_millis(ROUND_ADVANCE_DELAY_MS),
        );
        self.broadcast_state();
    }

    fn end_match(&mut self, winner: Option<Slot>) {
        self.timers.cancel_all();
        self.snapshot.phase = Phase::MatchEnd;
        self.snapshot.turn_deadline = None;
        self.snapshot.projectile = None;
        self.snapshot.winner_slot = winner;
        self.rematch_votes = [false; 2];
        self.pause = None;

        info!(room = %self.code, winner = ?winner, "Match ended");
        self.broadcast(ServerMsg::MatchEnded {
            winner_slot: winner,
        });
        self.broadcast_state();
    }

    fn enter_pause(&mut self, slot: Slot) {
        let now = Instant::now();
        let interrupted = self.snapshot.phase;
        let turn_remaining = match interrupted {
            Phase::Aiming => self
                .snapshot
                .turn_deadline
                .map(|d| d.saturating_duration_since(now)),
            _ => None,
        };

        self.timers.cancel(TimerKind::Turn);
        self.timers.cancel(TimerKind::Tick);
        self.timers.cancel(TimerKind::RoundAdvance);
        self.snapshot.turn_deadline = None;
        self.snapshot.phase = Phase::PausedReconnect;
        self.pause = Some(PauseState {
            interrupted,
            turn_remaining,
        });

        let grace = Duration::from_millis(RECONNECT_GRACE_MS);
        self.timers.schedule_once(TimerKind::ReconnectGrace, grace);

        info!(
            room = %self.code,
            slot = %slot,
            interrupted = ?interrupted,
            remaining_ms = turn_remaining.map(|d| d.as_millis() as u64),
            "Match paused for reconnect"
        );
        self.broadcast(ServerMsg::PlayerDisconnected {
            slot,
            reconnect_deadline: Some(deadline_to_unix_millis(now + grace)),
        });
        self.broadcast_state();
    }

    fn resume(&mut self) {
        self.timers.cancel(TimerKind::ReconnectGrace);
        let Some(pause) = self.pause.take() else {
            warn!(room = %self.code, "Resume without pause state");
            return;
        };
        info!(room = %self.code, restored = ?pause.interrupted, "Match resumed");

        match pause.interrupted {
            Phase::Aiming => {
                self.snapshot.phase = Phase::Aiming;
                let remaining = pause
                    .turn_remaining
                    .unwrap_or(Duration::from_millis(TURN_DURATION_MS));
                self.arm_turn_clock(remaining);
                self.announce_turn();
                self.broadcast_state();
            }
            Phase::ProjectileFlight if self.snapshot.projectile.is_some() => {
                self.snapshot.phase = Phase::ProjectileFlight;
                self.timers.schedule_every(TimerKind::Tick, tick_interval());
                self.broadcast_state();
            }
            Phase::ProjectileFlight | Phase::RoundEnd => {
                self.snapshot.phase = Phase::RoundEnd;
                self.advance_turn();
            }
            other => {
                warn!(room = %self.code, phase = ?other, "Unexpected paused phase restored");
                self.snapshot.phase = other;
                self.broadcast_state();
            }
        }
    }

    fn destroy(&mut self, reason: &str) {
        if self.closed {
            return;
        }
        self.timers.cancel_all();
        self.directory.remove_room(&self.code);
        self.closed = true;
        info!(room = %self.code, reason, "Room destroyed");
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn slot_of(&self, conn_id: ConnectionId) -> Result<Slot, RoomError> {
        Slot::ALL
            .into_iter()
            .find(|s| {
                self.players[s.index()]
                    .as_ref()
                    .and_then(|p| p.conn.as_ref())
                    .is_some_and(|c| c.id == conn_id)
            })
            .ok_or(RoomError::NotInRoom)
    }

    fn slot_for_token(&self, token: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|s| {
            self.players[s.index()]
                .as_ref()
                .is_some_and(|p| p.token == token)
        })
    }

    /// Caller must own the active slot during aiming
    fn authorize_turn(&self, conn_id: ConnectionId) -> Result<Slot, RoomError> {
        let slot = self.slot_of(conn_id)?;
        if self.snapshot.phase != Phase::Aiming {
            return Err(RoomError::WrongPhase);
        }
        if slot != self.snapshot.active_slot {
            return Err(RoomError::NotYourTurn);
        }
        Ok(slot)
    }

    fn is_connected(&self, slot: Slot) -> bool {
        self.players[slot.index()]
            .as_ref()
            .is_some_and(|p| p.connected)
    }

    fn all_connected(&self) -> bool {
        Slot::ALL.into_iter().all(|s| self.is_connected(s))
    }

    fn any_connected(&self) -> bool {
        Slot::ALL.into_iter().any(|s| self.is_connected(s))
    }

    fn player_infos(&self) -> Vec<PlayerInfo> {
        Slot::ALL
            .into_iter()
            .filter_map(|slot| {
                self.players[slot.index()].as_ref().map(|p| PlayerInfo {
                    slot,
                    connected: p.connected,
                })
            })
            .collect()
    }

    fn votes(&self) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|s| self.rematch_votes[s.index()])
            .collect()
    }

    fn broadcast(&self, msg: ServerMsg) {
        for player in self.players.iter().flatten() {
            if let Some(conn) = player.conn.as_ref().filter(|_| player.connected) {
                conn.send(msg.clone());
            }
        }
    }

    fn broadcast_state(&mut self) {
        let votes = self.votes();
        let paused = self.pause.map(|p| p.interrupted);
        let msg = self.snapshots.build(&self.snapshot, &votes, paused);
        self.broadcast(msg);
    }

    fn broadcast_rematch(&self, requested_by: Option<Slot>) {
        self.broadcast(ServerMsg::RematchUpdated {
            requested_slots: self.votes(),
            requested_by,
        });
    }
}

/// A room together with its command queue
pub struct GameRoom {
    room: Room,
    rx: mpsc::Receiver<RoomCommand>,
}

impl GameRoom {
    pub fn new(code: String, seed: u64, directory: Arc<RoomDirectory>) -> (Self, RoomHandle) {
        let (tx, rx) = mpsc::channel(ROOM_QUEUE_CAPACITY);
        let handle = RoomHandle {
            code: code.clone(),
            tx: tx.clone(),
        };
        let room = Room::new(code, seed, directory, tx);
        (Self { room, rx }, handle)
    }

    /// Seat the creator before the task starts
    pub fn seat_creator(&mut self, conn: Connection) -> Slot {
        self.room.seat_creator(conn)
    }

    /// Drain the queue until the room closes
    pub async fn run(mut self) {
        info!(room = %self.room.code(), "Room task started");

        while let Some(cmd) = self.rx.recv().await {
            self.room.handle_command(cmd);
            if self.room.is_closed() {
                break;
            }
        }

        info!(
            room = %self.room.code(),
            snapshots = self.room.snapshots.sent(),
            "Room task finished"
        );
    }
}
