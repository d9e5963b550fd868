//! The protocol state machine.
//!
//! [`ProtocolMachine`] owns everything a connection remembers between
//! messages: the phase, the lobby, the agent, and the id of the last
//! snapshot it answered. Feed it one envelope at a time with
//! [`handle`](ProtocolMachine::handle) and send whatever it returns.
//!
//! # Concurrency note
//!
//! The machine is not internally synchronized. It is a plain
//! struct with `&mut self` methods; the session runner wraps it in a single
//! mutex and holds that lock for a whole `handle` call. That one lock is the
//! serialization point: phase changes, agent calls and snapshot dedup for
//! one envelope complete before the next envelope's begin.
//!
//! # Tolerance
//!
//! Tags that arrive in an unexpected phase are logged at warn and ignored.
//! Payloads that fail to decode come back as errors for the caller to log;
//! only a connection rejection ends the session.

use serde_json::Value;
use tankwire_protocol::{
    Envelope, GameEnd, LobbyInfo, Tag, Warning, decode_snapshot,
    encode_action,
};

use crate::{Agent, Phase, SessionError};

/// Per-connection protocol state and the agent it drives.
pub struct ProtocolMachine<A> {
    phase: Phase,

    /// Created by the first `lobbyData`, updated in place afterwards.
    lobby: Option<LobbyInfo>,

    /// Created together with `lobby`.
    agent: Option<A>,

    /// Id of the last snapshot the agent answered. A repeat of this id is
    /// dropped so each snapshot gets at most one reply.
    last_acted: Option<String>,
}

impl<A: Agent> Default for ProtocolMachine<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Agent> ProtocolMachine<A> {
    /// A machine for a freshly opened connection.
    pub fn new() -> Self {
        Self {
            phase: Phase::Connecting,
            lobby: None,
            agent: None,
            last_acted: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn lobby(&self) -> Option<&LobbyInfo> {
        self.lobby.as_ref()
    }

    pub fn agent(&self) -> Option<&A> {
        self.agent.as_ref()
    }

    /// The id of the most recently answered snapshot.
    pub fn last_acted(&self) -> Option<&str> {
        self.last_acted.as_deref()
    }

    /// Moves to [`Phase::Closed`]. Every later envelope is ignored.
    pub fn close(&mut self) {
        self.transition(Phase::Closed);
    }

    /// Processes one inbound envelope and returns the replies to send, in
    /// order.
    ///
    /// # Errors
    /// - [`SessionError::ConnectionRejected`] when the server refuses the
    ///   connection. The machine is `Closed` afterwards.
    /// - [`SessionError::Protocol`] when a payload can't be decoded. Only
    ///   that envelope is affected; the phase is unchanged.
    pub fn handle(
        &mut self,
        envelope: Envelope,
    ) -> Result<Vec<Envelope>, SessionError> {
        if self.phase == Phase::Closed {
            tracing::debug!(tag = %envelope.tag(), "session closed; ignoring envelope");
            return Ok(Vec::new());
        }

        match envelope.tag() {
            // A session runner answers keepalives before dispatch; these
            // arms serve a machine driven on its own.
            Tag::Ping => Ok(vec![Envelope::pong()]),
            Tag::Pong => {
                tracing::debug!("pong received");
                Ok(Vec::new())
            }
            Tag::ConnectionAccepted => Ok(self.on_connection_accepted()),
            Tag::ConnectionRejected => Err(self.on_connection_rejected(&envelope)),
            Tag::LobbyData => self.on_lobby_data(&envelope),
            Tag::GameStarting => Ok(self.on_game_starting()),
            Tag::GameStarted | Tag::GameInProgress => {
                Ok(self.on_game_started(envelope.tag()))
            }
            Tag::GameState => self.on_game_state(&envelope),
            Tag::GameEnded => self.on_game_ended(&envelope),
            tag if tag.is_warning() => {
                self.on_warning(&envelope);
                Ok(Vec::new())
            }
            tag if tag.is_server_error() => {
                tracing::warn!(
                    %tag,
                    payload = ?envelope.payload(),
                    "server reported a packet error"
                );
                Ok(Vec::new())
            }
            Tag::LobbyDeleted => {
                tracing::warn!(phase = %self.phase, "lobby deleted by server");
                Ok(Vec::new())
            }
            Tag::Unrecognized(tag) => {
                tracing::debug!(%tag, "unrecognized tag ignored");
                Ok(Vec::new())
            }
            tag => {
                tracing::debug!(%tag, "client-bound tag not expected from server; ignored");
                Ok(Vec::new())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn on_connection_accepted(&mut self) -> Vec<Envelope> {
        if self.phase != Phase::Connecting {
            self.out_of_phase(&Tag::ConnectionAccepted);
            return Vec::new();
        }
        self.transition(Phase::AwaitingLobby);
        vec![Envelope::new(Tag::LobbyDataRequest)]
    }

    fn on_connection_rejected(&mut self, envelope: &Envelope) -> SessionError {
        let reason = envelope
            .payload()
            .and_then(|payload| match payload {
                Value::String(reason) => Some(reason.clone()),
                Value::Object(map) => map
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .unwrap_or_else(|| "no reason given".to_string());
        tracing::error!(%reason, phase = %self.phase, "connection rejected");
        self.transition(Phase::Closed);
        SessionError::ConnectionRejected { reason }
    }

    fn on_lobby_data(
        &mut self,
        envelope: &Envelope,
    ) -> Result<Vec<Envelope>, SessionError> {
        if self.phase == Phase::Connecting {
            self.out_of_phase(envelope.tag());
            return Ok(Vec::new());
        }
        let fresh: LobbyInfo = envelope.payload_as()?;
        let mut replies = Vec::new();

        if let Some(lobby) = self.lobby.as_mut() {
            lobby.apply(fresh);
            tracing::debug!(players = lobby.players.len(), "lobby updated");
            if let Some(agent) = self.agent.as_mut() {
                agent.on_lobby_data_changed(lobby);
            }
        } else {
            tracing::info!(
                player_id = %fresh.player_id,
                players = fresh.players.len(),
                grid = fresh.grid_dimension(),
                sandbox = fresh.is_sandbox(),
                "joined lobby"
            );
            if fresh.is_sandbox() {
                // Sandbox lobbies never send `gameStarting`; ask for
                // state straight away.
                replies.push(Envelope::new(Tag::ReadyToReceiveGameState));
                replies.push(Envelope::new(Tag::GameStatusRequest));
            }
            self.agent = Some(A::on_joining_lobby(&fresh));
            self.lobby = Some(fresh);
        }

        if matches!(self.phase, Phase::AwaitingLobby | Phase::LobbyReady) {
            self.transition(Phase::LobbyReady);
        }
        Ok(replies)
    }

    fn on_game_starting(&mut self) -> Vec<Envelope> {
        if self.phase != Phase::LobbyReady {
            self.out_of_phase(&Tag::GameStarting);
            return Vec::new();
        }
        self.transition(Phase::GameStarting);
        if let Some(agent) = self.agent.as_mut() {
            agent.on_game_starting();
        }
        vec![Envelope::new(Tag::ReadyToReceiveGameState)]
    }

    fn on_game_started(&mut self, tag: &Tag) -> Vec<Envelope> {
        match self.phase {
            Phase::GameStarting => {
                self.transition(Phase::InProgress);
                Vec::new()
            }
            // Joined a game that was already running: there was no
            // `gameStarting` handshake, so do it now.
            Phase::LobbyReady => {
                self.transition(Phase::InProgress);
                vec![Envelope::new(Tag::ReadyToReceiveGameState)]
            }
            Phase::InProgress => {
                tracing::debug!(%tag, "game already in progress");
                Vec::new()
            }
            _ => {
                self.out_of_phase(tag);
                Vec::new()
            }
        }
    }

    fn on_game_state(
        &mut self,
        envelope: &Envelope,
    ) -> Result<Vec<Envelope>, SessionError> {
        if self.phase == Phase::Ended {
            tracing::debug!("game ended; snapshot ignored");
            return Ok(Vec::new());
        }
        let (Some(lobby), Some(agent)) = (self.lobby.as_ref(), self.agent.as_mut())
        else {
            tracing::warn!(phase = %self.phase, "snapshot arrived before the lobby; dropped");
            return Ok(Vec::new());
        };

        let payload = envelope
            .payload()
            .ok_or_else(|| tankwire_protocol::ProtocolError::MissingPayload {
                tag: Tag::GameState,
            })?;

        // Cheap duplicate check before paying for a full decode.
        let id = payload.get("id").and_then(Value::as_str);
        if id.is_some() && id == self.last_acted.as_deref() {
            tracing::debug!(id = ?id, "duplicate snapshot dropped");
            return Ok(Vec::new());
        }

        let snapshot = decode_snapshot(payload, lobby.grid_dimension())
            .map_err(tankwire_protocol::ProtocolError::from)?;

        let action = agent.next_move(lobby, &snapshot);
        let reply = encode_action(&action, &snapshot.id);
        tracing::trace!(id = %snapshot.id, tick = snapshot.tick, ?action, "answered snapshot");
        self.last_acted = Some(snapshot.id);

        if matches!(self.phase, Phase::LobbyReady | Phase::GameStarting) {
            self.transition(Phase::InProgress);
        }
        Ok(vec![reply])
    }

    fn on_game_ended(
        &mut self,
        envelope: &Envelope,
    ) -> Result<Vec<Envelope>, SessionError> {
        if !self.phase.accepts_game_end() {
            self.out_of_phase(envelope.tag());
            return Ok(Vec::new());
        }
        let game_end: GameEnd = envelope.payload_as()?;
        tracing::info!(players = game_end.players.len(), "game ended");
        self.transition(Phase::Ended);
        if let Some(agent) = self.agent.as_mut() {
            agent.on_game_ended(&game_end);
        }
        Ok(Vec::new())
    }

    fn on_warning(&mut self, envelope: &Envelope) {
        let Some(warning) = Warning::from_envelope(envelope) else {
            return;
        };
        tracing::warn!(tag = %warning.tag(), %warning, "server warning");
        if let Some(agent) = self.agent.as_mut() {
            agent.on_warning(&warning);
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn transition(&mut self, to: Phase) {
        if self.phase != to {
            tracing::info!(from = %self.phase, %to, "phase transition");
            self.phase = to;
        }
    }

    fn out_of_phase(&self, tag: &Tag) {
        tracing::warn!(%tag, phase = %self.phase, "tag not expected in this phase; ignored");
    }
}

// =========================================================================
// Tests
// =========================================================================
