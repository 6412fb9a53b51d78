//! Worker thread owning the delivery queue and the active socket.
//!
//! All queue and connection-state mutation is confined to this thread;
//! `log` and `end` arrive as messages. The queue is strictly FIFO and
//! unbounded. A line handed to a failing write is not requeued: without a
//! delivery-receipt protocol from the remote end there is no way to know
//! whether it arrived, so delivery is best-effort, at-most-once.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::errors::ErrorEvent;
use crate::events::EventSinks;

use super::{connect_transport, ActiveConnection, ConnectionConfig, ConnectionState, StateCell};

/// Messages processed by the worker thread.
#[derive(Debug)]
pub(crate) enum Command {
    /// An already-token-prefixed, already-framed line to deliver.
    Line(String),
    /// Close the active socket gracefully; pending lines stay queued.
    End,
    /// Stop the worker after a best-effort final drain.
    Shutdown,
}

pub(crate) fn spawn_worker(
    config: ConnectionConfig,
    events: Arc<EventSinks>,
    state: Arc<StateCell>,
) -> (Sender<Command>, thread::JoinHandle<()>) {
    let (tx, rx) = unbounded();
    let handle = thread::spawn(move || {
        Worker {
            rx,
            config,
            events,
            state,
            pending: VecDeque::new(),
            connection: None,
            hold_until: None,
        }
        .run()
    });
    (tx, handle)
}

struct Worker {
    rx: Receiver<Command>,
    config: ConnectionConfig,
    events: Arc<EventSinks>,
    state: Arc<StateCell>,
    pending: VecDeque<String>,
    connection: Option<ActiveConnection>,
    /// Earliest instant the next connection attempt may start.
    hold_until: Option<Instant>,
}

impl Worker {
    fn run(mut self) {
        'main: loop {
            // Block for work when idle. A connected socket idle beyond the
            // timeout is treated as failed and closed.
            if self.pending.is_empty() {
                let received = if self.connection.is_some() {
                    match self.rx.recv_timeout(self.config.idle_timeout) {
                        Ok(cmd) => cmd,
                        Err(RecvTimeoutError::Timeout) => {
                            self.close_connection();
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match self.rx.recv() {
                        Ok(cmd) => cmd,
                        Err(_) => break,
                    }
                };
                if !self.apply(received) {
                    break;
                }
            }

            // Absorb anything else already queued without blocking.
            while let Ok(cmd) = self.rx.try_recv() {
                if !self.apply(cmd) {
                    break 'main;
                }
            }

            if self.pending.is_empty() {
                continue;
            }

            if self.connection.is_none() {
                // Honour the fixed reconnection delay while staying
                // responsive to incoming commands.
                if let Some(until) = self.hold_until {
                    let now = Instant::now();
                    if now < until {
                        match self.rx.recv_timeout(until - now) {
                            Ok(cmd) => {
                                if !self.apply(cmd) {
                                    break;
                                }
                                continue;
                            }
                            Err(RecvTimeoutError::Timeout) => {}
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                    self.hold_until = None;
                }

                if !self.connect() {
                    self.hold_until = Some(Instant::now() + self.config.reconnect_delay);
                    continue;
                }
            }

            self.drain();
        }

        // Best-effort final drain, only over an already-open connection so
        // dropping the logger never blocks on a fresh connection attempt.
        // Entries still unsent are lost with the worker.
        if !self.pending.is_empty() && self.connection.is_some() {
            self.drain();
        }
        self.close_connection();
    }

    /// Returns false when the worker should shut down.
    fn apply(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Line(line) => {
                self.pending.push_back(line);
                true
            }
            Command::End => {
                self.close_connection();
                if !self.pending.is_empty() {
                    self.hold_until = Some(Instant::now() + self.config.reconnect_delay);
                }
                true
            }
            Command::Shutdown => false,
        }
    }

    fn connect(&mut self) -> bool {
        self.state.set(ConnectionState::Connecting);
        match connect_transport(&self.config.transport, self.config.connect_timeout) {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state.set(ConnectionState::Connected);
                true
            }
            Err(err) => {
                self.state.set(ConnectionState::Disconnected);
                self.events.emit_error(&ErrorEvent::Transport(err));
                false
            }
        }
    }

    /// Transmit queued lines oldest-first while the connection holds. Each
    /// line's `log` event fires before its bytes reach the transport.
    fn drain(&mut self) {
        while self.connection.is_some() {
            let Some(line) = self.pending.pop_front() else {
                break;
            };
            self.events.emit_log(&line);

            let result = self
                .connection
                .as_mut()
                .map(|conn| conn.write_all(line.as_bytes()).and_then(|()| conn.flush()));
            if let Some(Err(err)) = result {
                log::warn!("log write failed: {err}");
                self.connection = None;
                self.state.set(ConnectionState::Disconnected);
                self.events.emit_error(&ErrorEvent::Transport(err));
                self.hold_until = Some(Instant::now() + self.config.reconnect_delay);
            }
        }
    }

    fn close_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            self.state.set(ConnectionState::Ending);
            if let Err(err) = connection.close() {
                log::warn!("error closing connection: {err}");
            }
        }
        self.state.set(ConnectionState::Disconnected);
    }
}
