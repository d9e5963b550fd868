//! Client configuration and the handshake endpoint.

use std::time::Duration;

use url::Url;

use crate::TankwireError;

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Everything needed to dial a game server and run one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host name or address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Display name sent in the handshake. Must not be empty.
    pub nickname: String,

    /// Optional code for joining a private lobby.
    pub join_code: Option<String>,

    /// Capacity of the bounded outbound queue. Sends beyond it are dropped.
    pub outbound_capacity: usize,

    /// How long shutdown waits for each background loop before aborting it.
    pub shutdown_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
            nickname: String::new(),
            join_code: None,
            outbound_capacity: 100,
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    /// Player type announced in the handshake.
    pub const PLAYER_TYPE: &'static str = "hackathonBot";

    /// Enum encoding requested from the server.
    pub const ENUM_FORMAT: &'static str = "string";

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    pub fn with_join_code(mut self, join_code: impl Into<String>) -> Self {
        self.join_code = Some(join_code.into());
        self
    }

    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Checks the settings that would otherwise fail late or confusingly.
    ///
    /// An empty join code is treated as absent.
    pub fn validated(mut self) -> Result<Self, TankwireError> {
        if self.host.trim().is_empty() {
            return Err(TankwireError::InvalidConfig(
                "host must not be empty".into(),
            ));
        }
        if self.port == 0 {
            return Err(TankwireError::InvalidConfig(
                "port must be non-zero".into(),
            ));
        }
        if self.nickname.trim().is_empty() {
            return Err(TankwireError::InvalidConfig(
                "nickname must not be empty".into(),
            ));
        }
        if self.outbound_capacity == 0 {
            return Err(TankwireError::InvalidConfig(
                "outbound_capacity must be at least 1".into(),
            ));
        }
        if self.join_code.as_deref().is_some_and(str::is_empty) {
            self.join_code = None;
        }
        Ok(self)
    }

    /// The WebSocket URL for the handshake, query string included.
    ///
    /// ```
    /// use tankwire::ClientConfig;
    ///
    /// let url = ClientConfig::default()
    ///     .with_nickname("bot one")
    ///     .endpoint_url()
    ///     .unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "ws://localhost:5000/?nickname=bot+one&playerType=hackathonBot&enumSerializationFormat=string"
    /// );
    /// ```
    pub fn endpoint_url(&self) -> Result<Url, TankwireError> {
        let mut url = Url::parse("ws://localhost/")
            .map_err(|e| TankwireError::InvalidConfig(e.to_string()))?;
        url.set_host(Some(&self.host)).map_err(|e| {
            TankwireError::InvalidConfig(format!("host `{}`: {e}", self.host))
        })?;
        url.set_port(Some(self.port)).map_err(|()| {
            TankwireError::InvalidConfig(format!("port {}", self.port))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("nickname", &self.nickname)
                .append_pair("playerType", Self::PLAYER_TYPE)
                .append_pair("enumSerializationFormat", Self::ENUM_FORMAT);
            if let Some(code) = &self.join_code {
                query.append_pair("joinCode", code);
            }
        }
        Ok(url)
    }
}
