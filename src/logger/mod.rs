//! Logger facade composing the level table, serialiser, delivery queue, and
//! connection worker.
//!
//! `log` validates the call, renders and frames the entry, and hands it to
//! the worker thread; it always returns synchronously after enqueueing and
//! never panics the host process.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{SecondsFormat, Utc};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::config::{LoggerConfig, Replacer};
use crate::connection::{
    spawn_worker, Command, ConnectionConfig, ConnectionState, StateCell, TcpTransport, TlsOptions,
};
use crate::errors::{ConfigError, ErrorEvent};
use crate::events::EventSinks;
use crate::levels::{LevelSpec, LevelTable};
use crate::payload::Payload;
use crate::serialise;


/// Facade method and field names a custom level may not shadow.
const RESERVED_NAMES: &[&str] = &[
    "new",
    "log",
    "end",
    "min_level",
    "set_min_level",
    "console",
    "set_console",
    "timestamp",
    "set_timestamp",
    "levels",
    "on_error",
    "on_log",
    "connection_state",
    "token",
];

/// Severity slot at or above which console echo goes to the error sink.
const CONSOLE_ERROR_THRESHOLD: usize = 3;

/// Streaming log client. One instance owns one outbound socket at a time.
pub struct Logger {
    token: String,
    levels: LevelTable,
    min_level: AtomicUsize,
    console: AtomicBool,
    timestamp: AtomicBool,
    with_stack: bool,
    flatten: bool,
    flatten_arrays: bool,
    replacer: Option<Replacer>,
    events: Arc<EventSinks>,
    state: Arc<StateCell>,
    tx: Sender<Command>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

macro_rules! level_methods {
    ($(($name:ident, $index:expr)),* $(,)?) => {
        $(
            #[doc = concat!(
                "Log at severity slot ", stringify!($index),
                " (`", stringify!($name), "` in the default table)."
            )]
            pub fn $name(&self, payload: impl Into<Payload>) {
                self.log($index as usize, payload);
            }
        )*
    };
}

impl Logger {
    /// Build a logger from a validated configuration and spawn its worker.
    pub fn new(config: LoggerConfig) -> Result<Self, ConfigError> {
        let levels = LevelTable::normalize(config.levels.clone())?;
        levels.ensure_no_conflicts(RESERVED_NAMES)?;

        // An unresolvable minimum level is ignored, keeping the default.
        let mut min_level = 1;
        if let Some(spec) = &config.min_level {
            if let Some(index) = levels.number(spec) {
                min_level = index;
            }
        }

        let tls = config.secure.then(|| TlsOptions {
            domain: config.host.clone(),
            insecure_skip_verify: config.insecure_skip_verify,
        });
        let connection = ConnectionConfig {
            transport: TcpTransport {
                host: config.host.clone(),
                port: config.port,
                tls,
            },
            connect_timeout: config.connect_timeout,
            idle_timeout: config.idle_timeout,
            reconnect_delay: config.reconnect_delay,
        };

        let events = Arc::new(EventSinks::default());
        let state = Arc::new(StateCell::new());
        let (tx, handle) = spawn_worker(connection, events.clone(), state.clone());

        Ok(Self {
            token: config.token,
            levels,
            min_level: AtomicUsize::new(min_level),
            console: AtomicBool::new(config.console),
            timestamp: AtomicBool::new(config.timestamp),
            with_stack: config.with_stack,
            flatten: config.flatten,
            flatten_arrays: config.flatten_arrays,
            replacer: config.replacer,
            events,
            state,
            tx,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Validate, render, frame, and enqueue one entry (or several, for
    /// sequence payloads). Call failures are reported through the `error`
    /// observers and the call is dropped.
    pub fn log(&self, level: impl Into<LevelSpec>, payload: impl Into<Payload>) {
        self.log_payload(&level.into(), payload.into());
    }

    level_methods![
        (debug, 0),
        (info, 1),
        (notice, 2),
        (warning, 3),
        (err, 4),
        (crit, 5),
        (alert, 6),
        (emerg, 7),
    ];

    /// Close the active socket gracefully. Pending entries stay queued and
    /// trigger a reconnection after the fixed delay.
    pub fn end(&self) {
        if self.tx.send(Command::End).is_err() {
            log::warn!("logger worker is gone; end ignored");
        }
    }

    /// Name of the current minimum level.
    pub fn min_level(&self) -> String {
        self.levels
            .name(self.min_level.load(Ordering::SeqCst))
            .to_owned()
    }

    /// Set the minimum level by name, index, or numeric string; an
    /// unresolvable value leaves the current minimum unchanged.
    pub fn set_min_level(&self, level: impl Into<LevelSpec>) {
        if let Some(index) = self.levels.number(&level.into()) {
            self.min_level.store(index, Ordering::SeqCst);
        }
    }

    /// Whether finished lines are echoed to a local console sink.
    pub fn console(&self) -> bool {
        self.console.load(Ordering::SeqCst)
    }

    pub fn set_console(&self, console: bool) {
        self.console.store(console, Ordering::SeqCst);
    }

    /// Whether entries carry an ISO-8601 timestamp.
    pub fn timestamp(&self) -> bool {
        self.timestamp.load(Ordering::SeqCst)
    }

    pub fn set_timestamp(&self, timestamp: bool) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    /// The eight level names, in slot order.
    pub fn levels(&self) -> [String; 8] {
        self.levels.names()
    }

    /// Subscribe to structured call and transport failures.
    pub fn on_error(&self, callback: impl Fn(&ErrorEvent) + Send + Sync + 'static) {
        self.events.on_error(callback);
    }

    /// Subscribe to raw framed lines; fires for each entry as it is
    /// dequeued, before its bytes are handed to the transport.
    pub fn on_log(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.events.on_log(callback);
    }

    /// Current lifecycle state of the outbound socket.
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    fn log_payload(&self, level: &LevelSpec, payload: Payload) {
        if matches!(payload, Payload::Empty) {
            self.events.emit_error(&ErrorEvent::MissingPayload);
            return;
        }

        let Some(index) = self.levels.number(level) else {
            self.events
                .emit_error(&ErrorEvent::UnknownLevel(spec_text(level)));
            return;
        };

        if index < self.min_level.load(Ordering::SeqCst) {
            return;
        }

        match payload {
            Payload::List(items) => {
                if items.is_empty() {
                    self.events.emit_error(&ErrorEvent::MissingPayload);
                    return;
                }
                for item in items {
                    self.log_payload(level, item);
                }
            }
            Payload::Data(map) => self.submit(index, self.render_structured(index, map)),
            Payload::Error(info) => {
                self.submit(index, self.render_structured(index, info.to_map(self.with_stack)));
            }
            Payload::Text(text) => self.submit(index, self.render_text(index, &text)),
            Payload::Empty => {}
        }
    }

    fn render_structured(&self, index: usize, mut map: Map<String, Value>) -> String {
        if self.timestamp() {
            let key = serialise::safe_key(&map, "time");
            map.insert(key, Value::String(iso_now()));
        }
        let key = serialise::safe_key(&map, "level");
        map.insert(key, Value::String(self.levels.name(index).to_owned()));

        let value = serialise::sanitise(
            Value::Object(map),
            self.replacer.as_deref(),
            serialise::MAX_DEPTH,
        );
        let value = if self.flatten {
            serialise::flatten(value, self.flatten_arrays)
        } else {
            value
        };
        serialise::stringify(&value)
    }

    fn render_text(&self, index: usize, text: &str) -> String {
        let body = format!("{} {}", self.levels.name(index), text);
        if self.timestamp() {
            format!("{} {}", iso_now(), body)
        } else {
            body
        }
    }

    /// Echo, token-prefix, frame, and hand the line to the worker.
    fn submit(&self, index: usize, body: String) {
        if self.console() {
            // A dead console sink must not take the host process with it.
            use std::io::Write;
            let result = if index >= CONSOLE_ERROR_THRESHOLD {
                writeln!(std::io::stderr().lock(), "{body}")
            } else {
                writeln!(std::io::stdout().lock(), "{body}")
            };
            if let Err(err) = result {
                log::warn!("console echo failed: {err}");
            }
        }

        let line = format!("{} {}", self.token, serialise::clean_line(&body));
        if self.tx.send(Command::Line(line)).is_err() {
            log::warn!("logger worker is gone; dropping entry");
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.tx.send(Command::Shutdown).is_err() {
            return;
        }
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            log::warn!("logger worker thread panicked");
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("levels", &self.levels.names())
            .field("min_level", &self.min_level())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

fn spec_text(level: &LevelSpec) -> String {
    match level {
        LevelSpec::Name(name) => name.clone(),
        LevelSpec::Index(index) => index.to_string(),
    }
}

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
