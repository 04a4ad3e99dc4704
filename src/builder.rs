//! Builder for [`TcpSink`](crate::sink::TcpSink).
//!
//! Exposes destination selection, timeout tuning, and reconnect parameters.
//! Values are validated when the configuration is built, so setters never
//! fail.

use std::{path::Path, time::Duration};

use log::LevelFilter;

use crate::{
    error::SinkError,
    file_config,
    shutdown::ShutdownToken,
    sink::{Destination, PendingSink, SinkConfig, TcpSink},
};

#[derive(Clone, Debug)]
enum AddressConfig {
    HostPort { host: String, port: u16 },
    Raw(String),
}

/// Overrides for the reconnect timings applied by the worker.
#[derive(Clone, Debug, Default)]
pub struct ReconnectOverrides {
    interval_ms: Option<u64>,
    cap_ms: Option<u64>,
    jitter: Option<bool>,
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(SinkError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

impl ReconnectOverrides {
    /// Create overrides with no custom values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause between failed attempts, in milliseconds.
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }

    /// Upper bound for the growing delay, in milliseconds.
    pub fn with_cap_ms(mut self, cap_ms: u64) -> Self {
        self.cap_ms = Some(cap_ms);
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    fn apply(&self, config: &mut SinkConfig) -> Result<(), SinkError> {
        if let Some(interval) = self.interval_ms {
            ensure_positive!(interval, "reconnect_interval_ms")?;
            config.reconnect.interval = Duration::from_millis(interval);
            if self.cap_ms.is_none() {
                config.reconnect.cap = config.reconnect.interval;
            }
        }
        if let Some(cap) = self.cap_ms {
            ensure_positive!(cap, "reconnect_cap_ms")?;
            config.reconnect.cap = Duration::from_millis(cap);
        }
        if let Some(jitter) = self.jitter {
            config.reconnect.jitter = jitter;
        }
        Ok(())
    }
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`TcpSink`] instances.
#[derive(Clone, Debug, Default)]
pub struct SinkBuilder {
    address: Option<AddressConfig>,
    hash: Option<String>,
    target: Option<String>,
    level: Option<LevelFilter>,
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    join_timeout_ms: Option<u64>,
    max_frame_size: Option<usize>,
    reconnect: ReconnectOverrides,
    shutdown: Option<ShutdownToken>,
}

impl SinkBuilder {
    /// Create a new builder with no destination configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a builder from the `[ironlog]` section of an INI document.
    pub fn from_ini_str(text: &str) -> Result<Self, SinkError> {
        file_config::builder_from_ini_str("<string>", text)
    }

    /// Load a builder from the `[ironlog]` section of an INI file.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        file_config::builder_from_ini_file(path.as_ref())
    }

    /// Ship to `host:port`.
    pub fn with_tcp(mut self, host: impl Into<String>, port: u16) -> Self {
        self.address = Some(AddressConfig::HostPort {
            host: host.into(),
            port,
        });
        self
    }

    /// Ship to an address written as `host:port`; parsed at build time.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(AddressConfig::Raw(address.into()));
        self
    }

    /// Instance identifier attached to every record.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Fixed pause between failed connection attempts.
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        let ms = interval.as_millis().min(u128::from(u64::MAX)) as u64;
        self.reconnect = self.reconnect.with_interval_ms(ms);
        self
    }

    /// Override reconnect timings using the provided overrides.
    pub fn with_reconnect(mut self, overrides: ReconnectOverrides) -> Self {
        self.reconnect = overrides;
        self
    }

    /// Token that cancels the initial connect loop and, later, the sink.
    pub fn with_shutdown_token(mut self, token: ShutdownToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    option_setter!(
        #[doc = "Logger name used by the sink's convenience methods."]
        with_target,
        target,
        String
    );
    option_setter!(
        #[doc = "Most verbose level accepted through the `log` bridge."]
        with_level,
        level,
        LevelFilter
    );
    option_setter!(with_connect_timeout_ms, connect_timeout_ms, u64);
    option_setter!(with_write_timeout_ms, write_timeout_ms, u64);
    option_setter!(with_poll_interval_ms, poll_interval_ms, u64);
    option_setter!(with_join_timeout_ms, join_timeout_ms, u64);
    option_setter!(with_max_frame_size, max_frame_size, usize);

    fn validate(&self) -> Result<(), SinkError> {
        if self.address.is_none() {
            return Err(SinkError::InvalidConfig("sink requires a server address".into()));
        }
        match self.hash.as_deref() {
            None | Some("") => {
                return Err(SinkError::InvalidConfig("sink requires a non-empty hash".into()));
            }
            Some(_) => {}
        }
        for (value, field) in [
            (self.connect_timeout_ms, "connect_timeout_ms"),
            (self.write_timeout_ms, "write_timeout_ms"),
            (self.poll_interval_ms, "poll_interval_ms"),
            (self.join_timeout_ms, "join_timeout_ms"),
        ] {
            if let Some(value) = value {
                ensure_positive!(value, field)?;
            }
        }
        if let Some(size) = self.max_frame_size {
            ensure_positive!(size, "max_frame_size")?;
        }
        Ok(())
    }

    /// Validate and produce the configuration without connecting.
    pub fn build_config(&self) -> Result<SinkConfig, SinkError> {
        self.validate()?;
        let mut config = SinkConfig::default();
        if let Some(address) = &self.address {
            config.destination = build_destination(address)?;
        }
        if let Some(hash) = &self.hash {
            config.hash = hash.clone();
        }
        self.apply_optional_fields(&mut config);
        self.reconnect.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_optional_fields(&self, config: &mut SinkConfig) {
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(timeout) = self.connect_timeout_ms {
            config.connect_timeout = Duration::from_millis(timeout);
        }
        if let Some(timeout) = self.write_timeout_ms {
            config.write_timeout = Duration::from_millis(timeout);
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(interval);
        }
        if let Some(timeout) = self.join_timeout_ms {
            config.join_timeout = Duration::from_millis(timeout);
        }
        if let Some(size) = self.max_frame_size {
            config.max_frame_size = size;
        }
    }

    /// Connect, blocking until the collector accepts the first connection.
    pub fn build(&self) -> Result<TcpSink, SinkError> {
        let config = self.build_config()?;
        let token = self.shutdown.clone().unwrap_or_default();
        TcpSink::connect_with_token(config, token)
    }

    /// Validate eagerly, then connect on a background thread.
    pub fn spawn(&self) -> Result<PendingSink, SinkError> {
        let config = self.build_config()?;
        let token = self.shutdown.clone().unwrap_or_default();
        Ok(TcpSink::spawn_connect_with_token(config, token))
    }
}

fn build_destination(address: &AddressConfig) -> Result<Destination, SinkError> {
    match address {
        AddressConfig::HostPort { host, port } => {
            if host.trim().is_empty() {
                return Err(SinkError::InvalidConfig("tcp host must not be empty".into()));
            }
            Ok(Destination::new(host.clone(), *port))
        }
        AddressConfig::Raw(raw) => raw.parse(),
    }
}
