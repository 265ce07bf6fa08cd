//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::TilePosition;
use crate::provider::TileUrlTemplate;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive(section: &str, key: &str, value: &str) -> Result<usize, ConfigFileError> {
    match parse_value::<usize>(section, key, value, "must be a positive integer")? {
        0 => Err(invalid(section, key, value, "must be a positive integer")),
        n => Ok(n),
    }
}

fn parse_radius(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let radius: f64 = parse_value(section, key, value, "must be a number")?;
    if !radius.is_finite() || radius < 0.0 {
        return Err(invalid(section, key, value, "must be a finite non-negative number"));
    }
    Ok(radius)
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

/// Expands a leading `~/` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [network] section
    if let Some(section) = ini.section(Some("network")) {
        let s = "network";
        if let Some(v) = section.get("requests_per_second") {
            config.network.requests_per_second = parse_positive(s, "requests_per_second", v)?;
        }
        if let Some(v) = section.get("request_concurrency") {
            config.network.request_concurrency = parse_positive(s, "request_concurrency", v)?;
        }
        if let Some(v) = section.get("starting_delay_ms") {
            config.network.starting_delay_ms =
                parse_value(s, "starting_delay_ms", v, "must be a whole number of milliseconds")?;
        }
        if let Some(v) = section.get("backoff_factor") {
            let factor: f64 = parse_value(s, "backoff_factor", v, "must be a number")?;
            if !factor.is_finite() || factor < 1.0 {
                return Err(invalid(s, "backoff_factor", v, "must be at least 1.0"));
            }
            config.network.backoff_factor = factor;
        }
        if let Some(v) = section.get("max_delay_ms") {
            config.network.max_delay_ms =
                parse_value(s, "max_delay_ms", v, "must be a whole number of milliseconds")?;
        }
        if let Some(v) = section.get("backpressure_target") {
            config.network.backpressure_target = parse_positive(s, "backpressure_target", v)?;
        }
        if let Some(v) = section.get("tile_url") {
            let v = v.trim();
            if !v.is_empty() {
                config.network.tile_url = TileUrlTemplate::new(v)
                    .ok_or_else(|| invalid(s, "tile_url", v, "must contain {x} and {y}"))?;
            }
        }
    }

    // [flood] section
    if let Some(section) = ini.section(Some("flood")) {
        let s = "flood";
        if let Some(v) = section.get("starting_tile") {
            config.flood.starting_tile = v
                .trim()
                .parse::<TilePosition>()
                .map_err(|_| invalid(s, "starting_tile", v, "expected 'x,y'"))?;
        }
        if let Some(v) = section.get("search_radius") {
            config.flood.search_radius = parse_radius(s, "search_radius", v)?;
        }
        if let Some(v) = section.get("tolerance_radius") {
            config.flood.tolerance_radius = parse_radius(s, "tolerance_radius", v)?;
        }
        if let Some(v) = section.get("pixel_threshold") {
            config.flood.pixel_threshold =
                parse_value(s, "pixel_threshold", v, "must be a non-negative integer")?;
        }
        if let Some(v) = section.get("concurrency") {
            config.flood.concurrency = parse_positive(s, "concurrency", v)?;
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        let s = "output";
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.output.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("cycles") {
            config.output.cycles =
                parse_value(s, "cycles", v, "must be a non-negative integer (0 = forever)")?;
        }
        if let Some(v) = section.get("interval_secs") {
            config.output.interval_secs =
                parse_value(s, "interval_secs", v, "must be a whole number of seconds")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        let s = "logging";
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
        if let Some(v) = section.get("stdout") {
            config.logging.stdout = parse_bool(s, "stdout", v)?;
        }
    }

    Ok(config)
}
