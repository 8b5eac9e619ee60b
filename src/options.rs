use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Default bound on how long `LOGOUT` may take.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for a [`Reader`](crate::Reader).
#[derive(Clone, PartialEq, Eq)]
pub struct Options {
    /// Server address with port, e.g. `imap.gmail.com:993`.
    pub addr: String,
    /// User to log in as.
    pub username: String,
    /// Password for `username`.
    pub password: String,
    /// Wrap the connection in TLS right away (IMAPS).
    pub tls: bool,
    /// How long to wait for the server to acknowledge `LOGOUT`.
    pub timeout: Duration,
    /// Flag every message returned by [`Reader::list`](crate::Reader::list) as `\Seen`.
    pub mark_seen: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            addr: String::new(),
            username: String::new(),
            password: String::new(),
            tls: true,
            timeout: DEFAULT_TIMEOUT,
            mark_seen: false,
        }
    }
}

// keep the password out of logs
impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("addr", &self.addr)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tls", &self.tls)
            .field("timeout", &self.timeout)
            .field("mark_seen", &self.mark_seen)
            .finish()
    }
}

impl Options {
    /// Options for logging in to `addr` as `username`, with every other setting at its default.
    pub fn new(
        addr: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Options {
            addr: addr.into(),
            username: username.into(),
            password: password.into(),
            ..Options::default()
        }
    }

    /// Connect with (`true`) or without TLS.
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Bound how long `LOGOUT` may take.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mark listed messages as `\Seen`.
    pub fn mark_seen(mut self, mark_seen: bool) -> Self {
        self.mark_seen = mark_seen;
        self
    }

    /// Read options from the environment.
    ///
    /// `IMAP_ADDR`, `IMAP_USER` and `IMAP_PASSWORD` are required. `IMAP_TLS` and
    /// `IMAP_MARK_SEEN` accept `true`/`false` (or `1`/`0`), `IMAP_TIMEOUT` is in seconds.
    /// The error names the first variable that is missing or does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let flag = |key: &'static str, default: bool| match lookup(key) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => Err(ConfigError::Invalid { key, value: v }),
            },
        };
        let timeout = match lookup("IMAP_TIMEOUT") {
            None => DEFAULT_TIMEOUT,
            Some(secs) => match secs.trim().parse() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        key: "IMAP_TIMEOUT",
                        value: secs,
                    })
                }
            },
        };

        Ok(Options {
            addr: required("IMAP_ADDR")?,
            username: required("IMAP_USER")?,
            password: required("IMAP_PASSWORD")?,
            tls: flag("IMAP_TLS", true)?,
            timeout,
            mark_seen: flag("IMAP_MARK_SEEN", false)?,
        })
    }
}
