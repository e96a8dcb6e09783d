//! Realtime connection handle
//!
//! The backend's push channel is used only to signal connection state: the
//! client connects with its token, joins a room named after the user, and
//! disconnects on logout. The handle owns its transport and tracks the
//! lifecycle explicitly, so callers pass it around instead of sharing a
//! module-level socket.

use crate::error::{Result, TradeCenterError};
use tracing::{debug, info};

/// Wire-level operations the handle drives
pub trait Transport: Send {
    fn open(&mut self, url: &str, token: Option<&str>) -> Result<()>;
    fn join(&mut self, room: &str) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Lifecycle state of a [`RealtimeConnection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    Joined(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        !matches!(self, ConnectionStatus::Disconnected)
    }
}

/// Owned connection to the backend push channel
pub struct RealtimeConnection<T: Transport> {
    transport: T,
    url: String,
    status: ConnectionStatus,
}

impl<T: Transport> RealtimeConnection<T> {
    pub fn new(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Open the channel; a no-op when already connected
    pub fn connect(&mut self, token: Option<&str>) -> Result<ConnectionStatus> {
        if self.status.is_connected() {
            debug!(url = %self.url, "realtime already connected");
            return Ok(self.status.clone());
        }

        self.transport.open(&self.url, token)?;
        self.status = ConnectionStatus::Connected;
        info!(url = %self.url, "realtime connected");
        Ok(self.status.clone())
    }

    /// Join a room; requires an open channel
    pub fn join(&mut self, room: &str) -> Result<ConnectionStatus> {
        if !self.status.is_connected() {
            return Err(TradeCenterError::Realtime(format!(
                "cannot join '{}' while disconnected",
                room
            )));
        }
        if room.trim().is_empty() {
            return Err(TradeCenterError::Realtime("room name is empty".to_string()));
        }

        self.transport.join(room)?;
        self.status = ConnectionStatus::Joined(room.to_string());
        debug!(room, "realtime room joined");
        Ok(self.status.clone())
    }

    /// Close the channel; a no-op when already disconnected
    pub fn disconnect(&mut self) -> Result<ConnectionStatus> {
        if !self.status.is_connected() {
            return Ok(ConnectionStatus::Disconnected);
        }

        // Even a failed close leaves nothing usable behind
        let closed = self.transport.close();
        self.status = ConnectionStatus::Disconnected;
        info!(url = %self.url, "realtime disconnected");
        closed.map(|_| ConnectionStatus::Disconnected)
    }

    /// Tear down and open again, e.g. after the token changed
    pub fn reconnect(&mut self, token: Option<&str>) -> Result<ConnectionStatus> {
        self.disconnect()?;
        self.connect(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        calls: Vec<String>,
        fail_open: bool,
        fail_close: bool,
    }

    impl Transport for RecordingTransport {
        fn open(&mut self, url: &str, token: Option<&str>) -> Result<()> {
            if self.fail_open {
                return Err(TradeCenterError::Realtime("refused".to_string()));
            }
            self.calls.push(format!("open {} {}", url, token.unwrap_or("-")));
            Ok(())
        }

        fn join(&mut self, room: &str) -> Result<()> {
            self.calls.push(format!("join {}", room));
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.calls.push("close".to_string());
            if self.fail_close {
                return Err(TradeCenterError::Realtime("close failed".to_string()));
            }
            Ok(())
        }
    }

    fn connection() -> RealtimeConnection<RecordingTransport> {
        RealtimeConnection::new(RecordingTransport::default(), "ws://localhost:8000")
    }

    #[test]
    fn test_full_lifecycle() {
        let mut conn = connection();
        assert_eq!(conn.status(), &ConnectionStatus::Disconnected);

        assert_eq!(conn.connect(Some("tok")).unwrap(), ConnectionStatus::Connected);
        assert_eq!(
            conn.join("alice").unwrap(),
            ConnectionStatus::Joined("alice".to_string())
        );
        assert_eq!(conn.disconnect().unwrap(), ConnectionStatus::Disconnected);

        assert_eq!(
            conn.transport().calls,
            vec!["open ws://localhost:8000 tok", "join alice", "close"]
        );
    }

    #[test]
    fn test_join_requires_connection() {
        let mut conn = connection();
        assert!(matches!(
            conn.join("alice"),
            Err(TradeCenterError::Realtime(_))
        ));
        assert!(conn.transport().calls.is_empty());
    }

    #[test]
    fn test_connect_and_disconnect_are_idempotent() {
        let mut conn = connection();
        conn.connect(None).unwrap();
        conn.connect(None).unwrap();
        conn.disconnect().unwrap();
        conn.disconnect().unwrap();
        assert_eq!(conn.transport().calls, vec!["open ws://localhost:8000 -", "close"]);
    }

    #[test]
    fn test_reconnect_uses_new_token() {
        let mut conn = connection();
        conn.connect(Some("old")).unwrap();
        conn.join("bob").unwrap();
        assert_eq!(conn.reconnect(Some("new")).unwrap(), ConnectionStatus::Connected);
        assert_eq!(
            conn.transport().calls.last().map(String::as_str),
            Some("open ws://localhost:8000 new")
        );
    }

    #[test]
    fn test_failed_open_stays_disconnected() {
        let mut conn = RealtimeConnection::new(
            RecordingTransport {
                fail_open: true,
                ..Default::default()
            },
            "ws://x",
        );
        assert!(conn.connect(None).is_err());
        assert_eq!(conn.status(), &ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_failed_close_still_disconnects() {
        let mut conn = RealtimeConnection::new(
            RecordingTransport {
                fail_close: true,
                ..Default::default()
            },
            "ws://x",
        );
        conn.connect(None).unwrap();
        assert!(conn.disconnect().is_err());
        assert_eq!(conn.status(), &ConnectionStatus::Disconnected);
    }
}
