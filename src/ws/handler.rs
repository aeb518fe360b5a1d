//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::{Connection, RoomError};
use crate::lobby::RoomService;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (conn, outbound_rx) = Connection::channel();
    info!(conn = %conn.id, "New WebSocket connection");

    let (ws_sink, mut ws_stream) = socket.split();
    let writer_handle = tokio::spawn(write_loop(conn.clone(), ws_sink, outbound_rx));

    let rate_limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);

    // Reader loop: WebSocket -> room service
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn = %conn.id, "Rate limited input message");
                    conn.send(ServerMsg::error("rate_limited", "Too many messages"));
                    continue;
                }
                handle_text(&state.rooms, &conn, &text).await;
            }
            Ok(Message::Binary(_)) => {
                debug!(conn = %conn.id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn = %conn.id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn = %conn.id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // A dropped socket is a leave
    state.rooms.leave(&conn).await;
    writer_handle.abort();

    info!(conn = %conn.id, "WebSocket connection closed");
}

/// Drain the connection's outbound queue into the socket
async fn write_loop(
    conn: Connection,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<ServerMsg>,
) {
    while let Some(msg) = outbound_rx.recv().await {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(conn = %conn.id, error = %e, "WebSocket send failed");
            break;
        }
    }
}

/// Parse, validate and dispatch one text frame
async fn handle_text(rooms: &RoomService, conn: &Connection, text: &str) {
    let msg = match serde_json::from_str::<ClientMsg>(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug!(conn = %conn.id, error = %e, "Failed to parse client message");
            conn.send(ServerMsg::error("bad_message", "Message could not be parsed"));
            return;
        }
    };

    let msg = match msg.validate() {
        Ok(msg) => msg,
        Err(e) => {
            debug!(conn = %conn.id, error = %e, "Invalid client payload");
            conn.send(ServerMsg::error("invalid_payload", e.to_string()));
            return;
        }
    };

    if let Err(e) = dispatch(rooms, conn, msg).await {
        debug!(conn = %conn.id, code = e.code(), "Intent rejected");
        conn.send_error(&e);
    }
}

async fn dispatch(rooms: &RoomService, conn: &Connection, msg: ClientMsg) -> Result<(), RoomError> {
    match msg {
        ClientMsg::CreateRoom => rooms.create_room(conn).map(|_| ()),
        ClientMsg::JoinRoom {
            room_code,
            reconnect_token,
        } => rooms.join_room(conn, &room_code, reconnect_token).await,
        ClientMsg::RejoinRoom {
            room_code,
            reconnect_token,
        } => rooms.rejoin_room(conn, &room_code, reconnect_token).await,
        ClientMsg::LockAim { angle_deg, power } => rooms.lock_aim(conn, angle_deg, power).await,
        ClientMsg::Fire => rooms.fire(conn).await,
        ClientMsg::RequestRematch => rooms.request_rematch(conn).await,
        ClientMsg::LeaveRoom => {
            rooms.leave(conn).await;
            Ok(())
        }
        ClientMsg::Ping { sent_at } => {
            conn.send(ServerMsg::Pong { sent_at });
            Ok(())
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Slot;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn next(rx: &mut UnboundedReceiver<ServerMsg>) -> ServerMsg {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("connection channel closed")
    }

    #[tokio::test]
    async fn test_bad_json_is_reported() {
        let rooms = RoomService::default();
        let (conn, mut rx) = Connection::channel();
        handle_text(&rooms, &conn, "{not json").await;
        match next(&mut rx).await {
            ServerMsg::ErrorEvent { code, .. } => assert_eq!(code, "bad_message"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_payload_is_reported() {
        let rooms = RoomService::default();
        let (conn, mut rx) = Connection::channel();
        handle_text(&rooms, &conn, r#"{"type":"lock_aim","angleDeg":200,"power":50}"#).await;
        assert_eq!(
            next(&mut rx).await,
            ServerMsg::error("invalid_payload", "Angle must be between 5 and 175 degrees")
        );

        handle_text(&rooms, &conn, r#"{"type":"join_room","roomCode":"a!"}"#).await;
        match next(&mut rx).await {
            ServerMsg::ErrorEvent { code, .. } => assert_eq!(code, "invalid_payload"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ping_answered_directly() {
        let rooms = RoomService::default();
        let (conn, mut rx) = Connection::channel();
        handle_text(&rooms, &conn, r#"{"type":"ping","sentAt":1234.5}"#).await;
        assert_eq!(next(&mut rx).await, ServerMsg::Pong { sent_at: 1234.5 });
    }

    #[tokio::test]
    async fn test_rejection_is_reported() {
        let rooms = RoomService::default();
        let (conn, mut rx) = Connection::channel();
        handle_text(&rooms, &conn, r#"{"type":"fire"}"#).await;
        assert_eq!(next(&mut rx).await, ServerMsg::error("not_in_room", "Not in a room"));
    }

    #[tokio::test]
    async fn test_lowercase_code_joins_room() {
        let rooms = RoomService::default();
        let (a, mut a_rx) = Connection::channel();
        let (b, mut b_rx) = Connection::channel();

        handle_text(&rooms, &a, r#"{"type":"create_room"}"#).await;
        let ServerMsg::RoomCreated { room_code, .. } = next(&mut a_rx).await else {
            panic!("expected room_created");
        };

        let join = format!(
            r#"{{"type":"join_room","roomCode":" {} "}}"#,
            room_code.to_ascii_lowercase()
        );
        handle_text(&rooms, &b, &join).await;
        assert!(matches!(
            next(&mut b_rx).await,
            ServerMsg::RoomJoined { slot: Slot::B, .. }
        ));
    }
}
