//! Connection lifecycle: one outbound socket at a time, driven by a worker
//! thread that buffers framed lines and reconnects with a fixed delay.

mod transport;
mod worker;

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

pub(crate) use transport::{connect_transport, ActiveConnection, TcpTransport, TlsOptions};
pub(crate) use worker::{spawn_worker, Command};

/// Lifecycle state of the single outbound socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket exists.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The socket is established (and, for TLS, authorized).
    Connected,
    /// The socket is being closed by this side.
    Ending,
}

/// Atomic cell publishing the worker's state to the facade.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Disconnected as u8))
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    pub(crate) fn get(&self) -> ConnectionState {
        match self.0.load(Ordering::SeqCst) {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Ending,
        }
    }
}

/// Settings the worker needs to manage its socket.
#[derive(Clone, Debug)]
pub(crate) struct ConnectionConfig {
    pub transport: TcpTransport,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub reconnect_delay: Duration,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ConnectionState::Disconnected)]
    #[case(ConnectionState::Connecting)]
    #[case(ConnectionState::Connected)]
    #[case(ConnectionState::Ending)]
    fn state_cell_round_trips(#[case] state: ConnectionState) {
        let cell = StateCell::new();
        cell.set(state);
        assert_eq!(cell.get(), state);
    }
}
