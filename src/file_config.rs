//! INI configuration for the sink.
//!
//! Settings live in an `[ironlog]` section parsed with the `rust-ini` crate.
//! Other sections are ignored so the sink can share a file with the host
//! application; unknown keys inside `[ironlog]` are rejected.

use std::{fs, io::ErrorKind, path::Path, str::FromStr};

use ini::Ini;

use crate::{
    builder::{ReconnectOverrides, SinkBuilder},
    error::SinkError,
    level::LogLevel,
};

/// Section holding the sink settings.
pub const SECTION: &str = "ironlog";

pub(crate) fn builder_from_ini_file(path: &Path) -> Result<SinkBuilder, SinkError> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|err| SinkError::ConfigFile {
        path: display.clone(),
        reason: match err.kind() {
            ErrorKind::NotFound => "file does not exist".to_owned(),
            _ => format!("failed to read: {err}"),
        },
    })?;
    builder_from_ini_str(&display, &text)
}

pub(crate) fn builder_from_ini_str(origin: &str, text: &str) -> Result<SinkBuilder, SinkError> {
    let ini = Ini::load_from_str(text).map_err(|err| SinkError::ConfigFile {
        path: origin.to_owned(),
        reason: format!("invalid INI: {err}"),
    })?;
    let section = ini.section(Some(SECTION)).ok_or_else(|| SinkError::ConfigFile {
        path: origin.to_owned(),
        reason: format!("missing [{SECTION}] section"),
    })?;

    let mut builder = SinkBuilder::new();
    let mut host = None;
    let mut port = None;
    let mut reconnect = ReconnectOverrides::new();
    for (key, value) in section.iter() {
        let value = value.trim();
        match key.trim() {
            "host" => host = Some(value.to_owned()),
            "port" => port = Some(parse_value::<u16>(key, value)?),
            "address" => builder = builder.with_address(value),
            "hash" => builder = builder.with_hash(value),
            "target" => builder = builder.with_target(value.to_owned()),
            "level" => {
                let level: LogLevel = value
                    .parse()
                    .map_err(|err| SinkError::InvalidConfig(format!("level: {err}")))?;
                builder = builder.with_level(log::Level::from(level).to_level_filter());
            }
            "reconnect_interval_ms" => {
                reconnect = reconnect.with_interval_ms(parse_value(key, value)?);
            }
            "reconnect_cap_ms" => reconnect = reconnect.with_cap_ms(parse_value(key, value)?),
            "reconnect_jitter" => reconnect = reconnect.with_jitter(parse_bool(key, value)?),
            "connect_timeout_ms" => {
                builder = builder.with_connect_timeout_ms(parse_value(key, value)?);
            }
            "write_timeout_ms" => builder = builder.with_write_timeout_ms(parse_value(key, value)?),
            "poll_interval_ms" => builder = builder.with_poll_interval_ms(parse_value(key, value)?),
            "join_timeout_ms" => builder = builder.with_join_timeout_ms(parse_value(key, value)?),
            "max_frame_size" => builder = builder.with_max_frame_size(parse_value(key, value)?),
            other => {
                return Err(SinkError::InvalidConfig(format!(
                    "unknown key {other:?} in [{SECTION}]"
                )));
            }
        }
    }

    match (host, port) {
        (Some(host), Some(port)) => builder = builder.with_tcp(host, port),
        (None, None) => {}
        (Some(_), None) => return Err(SinkError::InvalidConfig("host requires port".into())),
        (None, Some(_)) => return Err(SinkError::InvalidConfig("port requires host".into())),
    }
    Ok(builder.with_reconnect(reconnect))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, SinkError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|err| SinkError::InvalidConfig(format!("{key} = {value:?}: {err}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SinkError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(SinkError::InvalidConfig(format!(
            "{key} = {value:?} is not a boolean"
        ))),
    }
}
