//! Protocol session logic for Tankwire.
//!
//! This crate decides what a client does with each inbound envelope:
//!
//! 1. **Agent**: the decision-making collaborator a bot author implements
//!    ([`Agent`] trait)
//! 2. **Phase**: where the connection is in its lifecycle ([`Phase`])
//! 3. **Protocol machine**: the tag dispatcher that moves between phases,
//!    calls the agent and produces reply envelopes ([`ProtocolMachine`])
//!
//! The machine never touches a socket. It takes one envelope and returns
//! the envelopes to send back, which keeps it synchronous and testable
//! without a runtime.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session runner (above)  ← owns the socket, serializes calls into the machine
//!     ↕
//! Session Layer (this crate)  ← phase, lobby, agent, dedup of snapshots
//!     ↕
//! Protocol Layer (below)  ← Envelope, WorldSnapshot, Action encoder
//! ```

mod agent;
mod error;
mod machine;
mod phase;

pub use agent::Agent;
pub use error::SessionError;
pub use machine::ProtocolMachine;
pub use phase::Phase;
