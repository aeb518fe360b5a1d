//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::physics::{ANGLE_MAX_DEG, ANGLE_MIN_DEG, POWER_MAX, POWER_MIN};
use crate::game::{Phase, Slot};

/// Room code length bounds (after normalisation)
pub const ROOM_CODE_MIN_LEN: usize = 4;
pub const ROOM_CODE_MAX_LEN: usize = 8;

/// Reconnect token length bounds
pub const TOKEN_MIN_LEN: usize = 8;
pub const TOKEN_MAX_LEN: usize = 64;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    /// Open a new room and take slot A
    CreateRoom,

    /// Join a room by code; a matching token turns this into a reconnect
    JoinRoom {
        room_code: String,
        #[serde(default)]
        reconnect_token: Option<String>,
    },

    /// Reclaim a slot; the token is mandatory
    RejoinRoom {
        room_code: String,
        reconnect_token: String,
    },

    /// Set aim for the active turn
    LockAim { angle_deg: f32, power: f32 },

    /// Fire with the current aim
    Fire,

    /// Vote for another match
    RequestRematch,

    /// Leave the current room
    LeaveRoom,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        sent_at: f64,
    },
}

/// Payload shape violations caught before anything reaches a room
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Room code must be 4-8 letters or digits")]
    RoomCode,

    #[error("Reconnect token must be 8-64 characters")]
    Token,

    #[error("Angle must be between 5 and 175 degrees")]
    Angle,

    #[error("Power must be between 20 and 120")]
    Power,
}

impl ClientMsg {
    /// Check message shape and normalise room codes to uppercase
    pub fn validate(self) -> Result<Self, ValidationError> {
        match self {
            ClientMsg::JoinRoom {
                room_code,
                reconnect_token,
            } => Ok(ClientMsg::JoinRoom {
                room_code: normalize_room_code(&room_code)?,
                reconnect_token: reconnect_token.map(|t| validate_token(&t)).transpose()?,
            }),
            ClientMsg::RejoinRoom {
                room_code,
                reconnect_token,
            } => Ok(ClientMsg::RejoinRoom {
                room_code: normalize_room_code(&room_code)?,
                reconnect_token: validate_token(&reconnect_token)?,
            }),
            ClientMsg::LockAim { angle_deg, power } => {
                if !(ANGLE_MIN_DEG..=ANGLE_MAX_DEG).contains(&angle_deg) {
                    return Err(ValidationError::Angle);
                }
                if !(POWER_MIN..=POWER_MAX).contains(&power) {
                    return Err(ValidationError::Power);
                }
                Ok(ClientMsg::LockAim { angle_deg, power })
            }
            other => Ok(other),
        }
    }
}

pub fn normalize_room_code(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim().to_ascii_uppercase();
    let len_ok = (ROOM_CODE_MIN_LEN..=ROOM_CODE_MAX_LEN).contains(&code.len());
    if !len_ok || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ValidationError::RoomCode);
    }
    Ok(code)
}

fn validate_token(raw: &str) -> Result<String, ValidationError> {
    let len = raw.chars().count();
    if !(TOKEN_MIN_LEN..=TOKEN_MAX_LEN).contains(&len) {
        return Err(ValidationError::Token);
    }
    Ok(raw.to_string())
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    RoomCreated {
        room_code: String,
        slot: Slot,
        reconnect_token: String,
    },

    RoomJoined {
        room_code: String,
        slot: Slot,
        players: Vec<PlayerInfo>,
        reconnect_token: String,
    },

    GameStarted {
        seed: u64,
        initial_state: StateView,
    },

    /// Authoritative full state, sent after every change and every physics tick
    StateSnapshot { state: StateView, server_time: u64 },

    TurnStarted { active_slot: Slot, turn_ends_at: u64 },

    ProjectileSpawned { projectile: ProjectileView },

    TerrainUpdated { heights: Vec<f32> },

    DamageApplied { slot: Slot, amount: u32, hp_after: u32 },

    PlayerDisconnected {
        slot: Slot,
        reconnect_deadline: Option<u64>,
    },

    PlayerReconnected { slot: Slot },

    MatchEnded { winner_slot: Option<Slot> },

    RematchUpdated {
        requested_slots: Vec<Slot>,
        requested_by: Option<Slot>,
    },

    ErrorEvent { code: String, message: String },

    Pong {
        /// Echo back client timestamp
        sent_at: f64,
    },
}

impl ServerMsg {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMsg::ErrorEvent {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Claimed slot as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub slot: Slot,
    pub connected: bool,
}

/// Full room state on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub room_code: String,
    pub phase: Phase,
    /// Only present while a turn is in progress
    pub active_slot: Option<Slot>,
    /// Unix millis, only while aiming
    pub turn_ends_at: Option<u64>,
    pub seed: u64,
    pub wind: f32,
    pub terrain: TerrainView,
    pub tanks: TanksView,
    pub projectile: Option<ProjectileView>,
    pub winner_slot: Option<Slot>,
    pub rematch_votes: Vec<Slot>,
    /// Phase a pause interrupted
    pub paused_phase: Option<Phase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainView {
    pub width: usize,
    pub height: f32,
    pub heights: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TanksView {
    #[serde(rename = "A")]
    pub a: TankView,
    #[serde(rename = "B")]
    pub b: TankView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankView {
    pub x: f32,
    pub y: f32,
    pub angle_deg: f32,
    pub power: f32,
    pub hp: u32,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileView {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub owner: Slot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_messages() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"join_room","roomCode":"abcd"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::JoinRoom {
                room_code: "abcd".into(),
                reconnect_token: None
            }
        );

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"lock_aim","angleDeg":45.5,"power":80}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::LockAim {
                angle_deg: 45.5,
                power: 80.0
            }
        );

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"fire"}"#).unwrap();
        assert_eq!(msg, ClientMsg::Fire);

        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"rejoin_room","roomCode":"ABCD"}"#).is_err());
    }

    #[test]
    fn test_validate_normalises_code() {
        let msg = ClientMsg::JoinRoom {
            room_code: "  ab12 ".into(),
            reconnect_token: Some("0123456789abcdef".into()),
        };
        assert_eq!(
            msg.validate(),
            Ok(ClientMsg::JoinRoom {
                room_code: "AB12".into(),
                reconnect_token: Some("0123456789abcdef".into())
            })
        );
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let bad_code = ClientMsg::JoinRoom {
            room_code: "AB".into(),
            reconnect_token: None,
        };
        assert_eq!(bad_code.validate(), Err(ValidationError::RoomCode));

        let bad_chars = ClientMsg::JoinRoom {
            room_code: "AB-CD".into(),
            reconnect_token: None,
        };
        assert_eq!(bad_chars.validate(), Err(ValidationError::RoomCode));

        let short_token = ClientMsg::RejoinRoom {
            room_code: "ABCD".into(),
            reconnect_token: "short".into(),
        };
        assert_eq!(short_token.validate(), Err(ValidationError::Token));

        let angle = ClientMsg::LockAim {
            angle_deg: 190.0,
            power: 50.0,
        };
        assert_eq!(angle.validate(), Err(ValidationError::Angle));

        let power = ClientMsg::LockAim {
            angle_deg: 45.0,
            power: f32::NAN,
        };
        assert_eq!(power.validate(), Err(ValidationError::Power));
    }

    #[test]
    fn test_server_message_wire_shape() {
        let json = serde_json::to_value(ServerMsg::DamageApplied {
            slot: Slot::B,
            amount: 12,
            hp_after: 88,
        })
        .unwrap();
        assert_eq!(json["type"], "damage_applied");
        assert_eq!(json["slot"], "B");
        assert_eq!(json["hpAfter"], 88);

        let json = serde_json::to_value(ServerMsg::error("room_full", "Room is full")).unwrap();
        assert_eq!(json["type"], "error_event");
        assert_eq!(json["code"], "room_full");

        let json = serde_json::to_value(ServerMsg::MatchEnded { winner_slot: None }).unwrap();
        assert!(json["winnerSlot"].is_null());
    }
}
