//! # Tankwire
//!
//! Reference client for tick-based multiplayer tank arena servers.
//!
//! A bot author implements a single [`Agent`] trait and the client handles
//! the connection, the lobby handshake, snapshot decoding and action
//! encoding. Each snapshot is answered with at most one action.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tankwire::prelude::*;
//!
//! struct Idle;
//!
//! impl Agent for Idle {
//!     fn on_joining_lobby(_lobby: &LobbyInfo) -> Self {
//!         Idle
//!     }
//!
//!     fn next_move(&mut self, _lobby: &LobbyInfo, _snapshot: &WorldSnapshot) -> Action {
//!         Action::Pass
//!     }
//! }
//!
//! # async fn start() -> Result<(), TankwireError> {
//! let session = ClientBuilder::new()
//!     .host("127.0.0.1")
//!     .nickname("idle-bot")
//!     .connect::<Idle>()
//!     .await?;
//! session.run(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await
//! # }
//! ```

mod client;
mod config;
mod error;
mod handler;

pub use client::{ClientBuilder, Session};
pub use config::ClientConfig;
pub use error::TankwireError;

pub use tankwire_protocol as protocol;
pub use tankwire_session as session;
pub use tankwire_transport as transport;

/// Everything a bot author usually needs, in one import.
pub mod prelude {
    pub use crate::{ClientBuilder, ClientConfig, Session, TankwireError};
    pub use tankwire_protocol::{
        AbilityKind, Action, Direction, Envelope, GameEnd, LobbyInfo,
        MoveDirection, Rotation, Tag, Tank, Warning, WorldSnapshot,
    };
    pub use tankwire_session::{Agent, Phase};
}
