//! Logger configuration and endpoint defaults.
//!
//! The builder validates at [`build`](LoggerBuilder::build) time; a missing
//! or empty token and invalid level sets are construction errors, never
//! runtime surprises.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::levels::{CustomLevels, LevelSpec};
use crate::serialise::ReplacerFn;

/// Default ingestion host for the classic endpoint profile.
pub const DEFAULT_HOST: &str = "api.logentries.com";
/// Plaintext port for the classic profile.
pub const DEFAULT_PORT: u16 = 10000;
/// TLS port for the classic profile.
pub const DEFAULT_PORT_TLS: u16 = 20000;

/// Default ingestion host for the web endpoint profile.
pub const WEB_HOST: &str = "data.logentries.com";
/// Plaintext port for the web profile.
pub const WEB_PORT: u16 = 80;
/// TLS port for the web profile.
pub const WEB_PORT_TLS: u16 = 443;

/// Idle period after which a connected socket is closed as failed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(180_000);
/// Fixed delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1500);
/// Timeout applied when establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Caller-supplied value transform run before the built-in safety transforms.
pub type Replacer = Arc<ReplacerFn>;

/// Host/port pair defaults selected by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndpointProfile {
    /// `api.logentries.com`, ports 10000/20000.
    #[default]
    Classic,
    /// `data.logentries.com`, ports 80/443.
    Web,
}

impl EndpointProfile {
    fn host(self) -> &'static str {
        match self {
            EndpointProfile::Classic => DEFAULT_HOST,
            EndpointProfile::Web => WEB_HOST,
        }
    }

    fn port(self, secure: bool) -> u16 {
        match (self, secure) {
            (EndpointProfile::Classic, false) => DEFAULT_PORT,
            (EndpointProfile::Classic, true) => DEFAULT_PORT_TLS,
            (EndpointProfile::Web, false) => WEB_PORT,
            (EndpointProfile::Web, true) => WEB_PORT_TLS,
        }
    }
}

/// Validated configuration consumed by [`Logger::new`](crate::Logger::new).
#[derive(Clone)]
pub struct LoggerConfig {
    pub(crate) token: String,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) secure: bool,
    pub(crate) insecure_skip_verify: bool,
    pub(crate) levels: Option<CustomLevels>,
    pub(crate) min_level: Option<LevelSpec>,
    pub(crate) console: bool,
    pub(crate) timestamp: bool,
    pub(crate) with_stack: bool,
    pub(crate) flatten: bool,
    pub(crate) flatten_arrays: bool,
    pub(crate) replacer: Option<Replacer>,
    pub(crate) connect_timeout: Duration,
    pub(crate) idle_timeout: Duration,
    pub(crate) reconnect_delay: Duration,
}

impl LoggerConfig {
    /// Start a builder with the required token.
    pub fn builder(token: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(token)
    }
}

impl std::fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("console", &self.console)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`LoggerConfig`].
#[derive(Clone, Default)]
pub struct LoggerBuilder {
    token: String,
    profile: EndpointProfile,
    host: Option<String>,
    port: Option<u16>,
    secure: bool,
    insecure_skip_verify: bool,
    levels: Option<CustomLevels>,
    min_level: Option<LevelSpec>,
    console: bool,
    timestamp: bool,
    with_stack: bool,
    flatten: bool,
    flatten_arrays: bool,
    replacer: Option<Replacer>,
    connect_timeout: Option<Duration>,
    idle_timeout: Option<Duration>,
    reconnect_delay: Option<Duration>,
}

impl LoggerBuilder {
    /// Create a builder with the required token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Select the endpoint profile supplying default host and ports.
    pub fn profile(mut self, profile: EndpointProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Override the ingestion host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Override the port; otherwise derived from the profile and TLS flag.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Use TLS. The handshake must authorize or the connection is failed.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Skip TLS certificate validation. Intended for tests.
    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    /// Supply a custom level table (sequence or name-to-index map).
    pub fn levels(mut self, levels: CustomLevels) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Minimum level, by name, index, or numeric string.
    pub fn min_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.min_level = Some(level.into());
        self
    }

    /// Echo finished lines to a local console sink.
    pub fn console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Inject/prefix an ISO-8601 timestamp on every entry.
    pub fn timestamp(mut self, timestamp: bool) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Include the source chain of captured errors as a `stack` field.
    pub fn with_stack(mut self, with_stack: bool) -> Self {
        self.with_stack = with_stack;
        self
    }

    /// Flatten structured payloads into dot-joined single-level keys.
    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// When flattening, treat array indices as key segments too.
    pub fn flatten_arrays(mut self, flatten_arrays: bool) -> Self {
        self.flatten_arrays = flatten_arrays;
        self
    }

    /// Per-value transform run ahead of the built-in safety transforms.
    pub fn replacer(mut self, replacer: Replacer) -> Self {
        self.replacer = Some(replacer);
        self
    }

    /// Override the connection-establishment timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Override the idle timeout after which a socket is treated as failed.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Override the fixed delay between reconnection attempts.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = Some(delay);
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<LoggerConfig, ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let host = self
            .host
            .unwrap_or_else(|| self.profile.host().to_owned());
        let port = self.port.unwrap_or_else(|| self.profile.port(self.secure));

        Ok(LoggerConfig {
            token: self.token,
            host,
            port,
            secure: self.secure,
            insecure_skip_verify: self.insecure_skip_verify,
            levels: self.levels,
            min_level: self.min_level,
            console: self.console,
            timestamp: self.timestamp,
            with_stack: self.with_stack,
            flatten: self.flatten,
            flatten_arrays: self.flatten_arrays,
            replacer: self.replacer,
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            idle_timeout: self.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT),
            reconnect_delay: self.reconnect_delay.unwrap_or(DEFAULT_RECONNECT_DELAY),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("   ")]
    fn build_rejects_missing_token(#[case] token: &str) {
        let err = LoggerConfig::builder(token).build().expect_err("no token");
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[rstest]
    #[case::classic_plain(EndpointProfile::Classic, false, DEFAULT_HOST, DEFAULT_PORT)]
    #[case::classic_tls(EndpointProfile::Classic, true, DEFAULT_HOST, DEFAULT_PORT_TLS)]
    #[case::web_plain(EndpointProfile::Web, false, WEB_HOST, WEB_PORT)]
    #[case::web_tls(EndpointProfile::Web, true, WEB_HOST, WEB_PORT_TLS)]
    fn profiles_select_host_and_port(
        #[case] profile: EndpointProfile,
        #[case] secure: bool,
        #[case] host: &str,
        #[case] port: u16,
    ) {
        let config = LoggerConfig::builder("x")
            .profile(profile)
            .secure(secure)
            .build()
            .expect("valid config");
        assert_eq!(config.host, host);
        assert_eq!(config.port, port);
    }

    #[rstest]
    fn explicit_host_and_port_win_over_profile() {
        let config = LoggerConfig::builder("x")
            .host("localhost")
            .port(4242)
            .secure(true)
            .build()
            .expect("valid config");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 4242);
    }
}
