//! Per-connection chat session: handshake plus receive loop.
//!
//! The transport-level connection is accepted unconditionally so rejection
//! reasons can travel over the open channel as close frames instead of
//! opaque upgrade failures. The handshake then authenticates the token,
//! authorises trip membership, and only on success registers the
//! connection; no failure path ever touches the registry. Once registered
//! the loop multiplexes inbound frames, the fanout mailbox, and a
//! keep-alive ping until the client disconnects.

use std::time::Duration;

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ports::{MessageStoreError, TokenError};
use crate::domain::{Presence, RoomId};

use super::messages::{
    CLOSE_INVALID_CREDENTIAL, CLOSE_MISSING_CREDENTIAL, CLOSE_NOT_A_MEMBER, ClientEvent,
    ServerEvent,
};
use super::registry::{ConnectionHandle, ConnectionId};
use super::state::WsState;

/// Interval between keep-alive pings. There is deliberately no idle-timeout
/// disconnect: a half-open transport stays registered until the peer or an
/// intermediary tears it down.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Why a handshake was refused before registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HandshakeReject {
    /// No token arrived with the connection request.
    MissingCredential,
    /// The token failed verification or names no live account.
    InvalidCredential,
    /// The authenticated user does not belong to this trip.
    NotAMember,
    /// A collaborator failed; nothing is revealed beyond "internal".
    Internal,
}

impl HandshakeReject {
    /// Machine-distinguishable close frame for this rejection.
    fn close_reason(&self) -> CloseReason {
        match self {
            Self::MissingCredential => CloseReason {
                code: CloseCode::Other(CLOSE_MISSING_CREDENTIAL),
                description: Some("no credential provided".to_owned()),
            },
            Self::InvalidCredential => CloseReason {
                code: CloseCode::Other(CLOSE_INVALID_CREDENTIAL),
                description: Some("invalid credential".to_owned()),
            },
            Self::NotAMember => CloseReason {
                code: CloseCode::Other(CLOSE_NOT_A_MEMBER),
                description: Some("not authorized for this room".to_owned()),
            },
            Self::Internal => CloseReason {
                code: CloseCode::Error,
                description: Some("internal error".to_owned()),
            },
        }
    }
}

/// Why the receive loop stopped.
#[derive(Debug)]
enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    Protocol(ProtocolError),
    Network(Closed),
    Persistence(MessageStoreError),
    MailboxClosed,
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

/// Drive one chat connection from handshake to teardown. Never panics or
/// propagates: every exit path ends in a close frame or a silently dropped
/// transport.
pub(super) async fn run_chat_session(
    state: WsState,
    room: RoomId,
    token: Option<String>,
    session: Session,
    stream: MessageStream,
) {
    match authorize(&state, &room, token.as_deref()).await {
        Ok(presence) => {
            ChatSession::register(state, room, presence)
                .run(session, stream)
                .await;
        }
        Err(reject) => {
            warn!(room = %room, reject = ?reject, "chat handshake refused");
            if let Err(error) = session.close(Some(reject.close_reason())).await {
                debug!(error = %error, "refused connection already gone");
            }
        }
    }
}

/// Authenticate the token, authorise membership, and resolve the caller's
/// presence. Pure with respect to the registry: rejection leaves no trace.
pub(crate) async fn authorize(
    state: &WsState,
    room: &RoomId,
    token: Option<&str>,
) -> Result<Presence, HandshakeReject> {
    let Some(token) = token else {
        return Err(HandshakeReject::MissingCredential);
    };

    let claims = state.verifier.verify(token).await.map_err(|error| match error {
        TokenError::Rejected { .. } => HandshakeReject::InvalidCredential,
        TokenError::Unavailable { message } => {
            warn!(message = %message, "token verifier unavailable");
            HandshakeReject::Internal
        }
    })?;

    let is_member = state
        .membership
        .is_member(&claims.user_id, room)
        .await
        .map_err(|error| {
            warn!(error = %error, "membership lookup failed");
            HandshakeReject::Internal
        })?;
    if !is_member {
        return Err(HandshakeReject::NotAMember);
    }

    let display = state
        .directory
        .display(&claims.user_id)
        .await
        .map_err(|error| {
            warn!(error = %error, "user display lookup failed");
            HandshakeReject::Internal
        })?
        // The credential verified but its subject no longer exists.
        .ok_or(HandshakeReject::InvalidCredential)?;

    Ok(display.into_presence(claims.user_id))
}

struct ChatSession {
    state: WsState,
    room: RoomId,
    presence: Presence,
    connection_id: ConnectionId,
    mailbox: UnboundedReceiver<ServerEvent>,
}

impl ChatSession {
    /// Bind a fresh connection handle and register it with the room.
    fn register(state: WsState, room: RoomId, presence: Presence) -> Self {
        let (connection, mailbox) = ConnectionHandle::new();
        let connection_id = connection.id();
        state.registry.join(&room, connection, presence.clone());
        info!(room = %room, user = %presence.user_id, "chat session registered");
        Self {
            state,
            room,
            presence,
            connection_id,
            mailbox,
        }
    }

    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        // The newcomer renders presence from this snapshot instead of
        // waiting for others to speak.
        let roster = self.state.registry.roster(&self.room);
        let outcome = if let Err(error) =
            send_event(&mut session, &ServerEvent::OnlineUsers { users: roster }).await
        {
            SessionError::Network(error)
        } else {
            self.receive_loop(&mut session, &mut stream).await
        };

        self.teardown();
        self.log_shutdown(&outcome);
        if let CloseAction::Close(reason) = Self::close_action_for(&outcome) {
            if let Err(error) = session.close(reason).await {
                debug!(error = %error, "chat session already closed");
            }
        }
    }

    async fn receive_loop(
        &mut self,
        session: &mut Session,
        stream: &mut MessageStream,
    ) -> SessionError {
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    session.ping(b"").await.map_err(SessionError::Network)
                }
                event = self.mailbox.recv() => {
                    match event {
                        Some(event) => send_event(session, &event)
                            .await
                            .map_err(SessionError::Network),
                        None => Err(SessionError::MailboxClosed),
                    }
                }
                frame = stream.recv() => self.handle_frame(session, frame).await,
            };

            if let Err(error) = result {
                return error;
            }
        }
    }

    async fn handle_frame(
        &self,
        session: &mut Session,
        frame: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(frame) = frame else {
            return Err(SessionError::StreamClosed);
        };

        match frame.map_err(SessionError::Protocol)? {
            Message::Text(text) => self.handle_client_text(text.as_ref()).await,
            Message::Ping(payload) => session
                .pong(&payload)
                .await
                .map_err(SessionError::Network),
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
        }
    }

    /// Parse and dispatch one inbound payload. Malformed events are a
    /// protocol violation by the client, tolerated without closing.
    async fn handle_client_text(&self, text: &str) -> Result<(), SessionError> {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.dispatch(event).await,
            Err(error) => {
                debug!(error = %error, "ignoring malformed chat payload");
                Ok(())
            }
        }
    }

    async fn dispatch(&self, event: ClientEvent) -> Result<(), SessionError> {
        match event {
            ClientEvent::Message { content } => self.handle_message(content.trim()).await,
            ClientEvent::Typing => {
                self.state.registry.broadcast(
                    &self.room,
                    &ServerEvent::Typing {
                        user_id: self.presence.user_id,
                        user_name: self.presence.user_name.clone(),
                    },
                    Some(self.connection_id),
                );
                Ok(())
            }
            ClientEvent::StopTyping => {
                self.state.registry.broadcast(
                    &self.room,
                    &ServerEvent::StopTyping {
                        user_id: self.presence.user_id,
                    },
                    Some(self.connection_id),
                );
                Ok(())
            }
        }
    }

    /// Persist-then-broadcast, at most once. Blank content is dropped
    /// silently; a failed persist drops the message entirely rather than
    /// broadcasting a record that was never stored.
    async fn handle_message(&self, content: &str) -> Result<(), SessionError> {
        if content.is_empty() {
            return Ok(());
        }

        let stored = self
            .state
            .messages
            .persist(&self.room, &self.presence.user_id, content)
            .await
            .map_err(SessionError::Persistence)?;
        self.state
            .registry
            .broadcast(&self.room, &ServerEvent::Message(stored), None);
        Ok(())
    }

    /// Deregister and announce the departure. Safe to reach from every exit
    /// path: `leave` hands the presence back exactly once, so siblings see
    /// at most one `user_left`.
    fn teardown(&self) {
        if let Some(presence) = self.state.registry.leave(&self.room, self.connection_id) {
            self.state.registry.broadcast(
                &self.room,
                &ServerEvent::UserLeft {
                    user_id: presence.user_id,
                    user_name: presence.user_name,
                    timestamp: Utc::now(),
                },
                Some(self.connection_id),
            );
        }
    }

    fn log_shutdown(&self, error: &SessionError) {
        match error {
            SessionError::Protocol(error) => {
                warn!(room = %self.room, error = %error, "chat protocol error");
            }
            SessionError::Persistence(error) => {
                warn!(room = %self.room, error = %error, "message persistence failed; closing session");
            }
            SessionError::MailboxClosed => {
                warn!(room = %self.room, "fanout mailbox closed unexpectedly");
            }
            SessionError::Network(_) | SessionError::ClientClosed(_) | SessionError::StreamClosed => {
                info!(room = %self.room, user = %self.presence.user_id, "chat session ended");
            }
        }
    }

    fn close_action_for(error: &SessionError) -> CloseAction {
        match error {
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::Persistence(_) | SessionError::MailboxClosed => {
                CloseAction::Close(Some(CloseReason {
                    code: CloseCode::Error,
                    description: Some("internal error".to_owned()),
                }))
            }
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }
}

async fn send_event(session: &mut Session, event: &ServerEvent) -> Result<(), Closed> {
    match serde_json::to_string(event) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "failed to serialise chat event");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
