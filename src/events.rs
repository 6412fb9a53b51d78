//! Observer registration for the `error` and `log` events.
//!
//! External adapters subscribe with callbacks rather than inheriting from
//! the logger. The `log` event carries the raw framed line and always fires
//! before the corresponding bytes are handed to the transport.

use parking_lot::Mutex;

use crate::errors::ErrorEvent;

type ErrorCallback = Box<dyn Fn(&ErrorEvent) + Send + Sync>;
type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Registered event observers, shared between the facade and the worker.
#[derive(Default)]
pub(crate) struct EventSinks {
    error: Mutex<Vec<ErrorCallback>>,
    log: Mutex<Vec<LogCallback>>,
}

impl EventSinks {
    pub(crate) fn on_error(&self, callback: impl Fn(&ErrorEvent) + Send + Sync + 'static) {
        self.error.lock().push(Box::new(callback));
    }

    pub(crate) fn on_log(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.log.lock().push(Box::new(callback));
    }

    /// Report a failure; when nobody listens, fall back to the log facade so
    /// the condition is not silently lost.
    pub(crate) fn emit_error(&self, event: &ErrorEvent) {
        let callbacks = self.error.lock();
        if callbacks.is_empty() {
            log::warn!("logtether: {event}");
            return;
        }
        for callback in callbacks.iter() {
            callback(event);
        }
    }

    pub(crate) fn emit_log(&self, line: &str) {
        for callback in self.log.lock().iter() {
            callback(line);
        }
    }
}
