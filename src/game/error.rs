//! Rejection taxonomy for player intents

/// Why an intent was refused. The snapshot is never touched on rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    #[error("Already in a room")]
    AlreadyInRoom,

    #[error("Not in a room")]
    NotInRoom,

    #[error("Reconnect token does not match this room")]
    InvalidToken,

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("Action not allowed in the current phase")]
    WrongPhase,

    #[error("Player is not connected")]
    NotConnected,

    #[error("Server has no room capacity left")]
    ServerFull,
}

impl RoomError {
    /// Stable wire code for `error_event`
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::RoomNotFound => "room_not_found",
            RoomError::RoomFull => "room_full",
            RoomError::AlreadyInRoom => "already_in_room",
            RoomError::NotInRoom => "not_in_room",
            RoomError::InvalidToken => "invalid_token",
            RoomError::NotYourTurn => "not_your_turn",
            RoomError::WrongPhase => "wrong_phase",
            RoomError::NotConnected => "not_connected",
            RoomError::ServerFull => "server_full",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let all = [
            RoomError::RoomNotFound,
            RoomError::RoomFull,
            RoomError::AlreadyInRoom,
            RoomError::NotInRoom,
            RoomError::InvalidToken,
            RoomError::NotYourTurn,
            RoomError::WrongPhase,
            RoomError::NotConnected,
            RoomError::ServerFull,
        ];
        let mut codes: Vec<&str> = all.iter().map(RoomError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
        assert_eq!(RoomError::NotYourTurn.to_string(), "It is not your turn");
    }
}
