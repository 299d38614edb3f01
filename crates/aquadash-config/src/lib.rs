//! Shared configuration for the aquadash binary.
//!
//! TOML profiles, session token resolution (env + keyring + plaintext),
//! and translation to `aquadash_core::EngineConfig`. The CLI adds
//! flag-aware overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aquadash_core::EngineConfig;

/// Env var that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "AQUADASH_CONFIG";

/// Keyring service name; entries are keyed `<profile>/session-id`.
pub const KEYRING_SERVICE: &str = "aquadash";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no session id configured for profile '{profile}'")]
    NoSession { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named dashboard servers.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, else `default_profile`,
    /// else `"default"`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Seconds one-shot commands wait for the server.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_reconnect_delay_ms() -> u64 {
    3000
}

/// A named dashboard server profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// WebSocket endpoint (e.g., "ws://localhost:8000/ws").
    pub endpoint: String,

    /// Session id (plaintext, prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Environment variable name containing the session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id_env: Option<String>,

    /// Override the reconnect delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,

    /// Override the handshake timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

impl Profile {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            session_id: None,
            session_id_env: None,
            reconnect_delay_ms: None,
            connect_timeout_secs: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `AQUADASH_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("dev", "aquadash", "aquadash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("aquadash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Layer defaults → TOML file at `path` → `AQUADASH_DEFAULTS_*` env vars
/// (e.g. `AQUADASH_DEFAULTS_TIMEOUT=5`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AQUADASH_DEFAULTS_").map(|key| format!("defaults.{key}").into()));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "using default config");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session resolution (without CLI flags) ──────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/session-id"),
    )?)
}

/// Resolve a session id from the chain: `session_id_env` → keyring →
/// plaintext.
pub fn resolve_session_id(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's session_id_env → env var lookup
    if let Some(ref env_name) = profile.session_id_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref id) = profile.session_id {
        return Ok(SecretString::from(id.clone()));
    }

    Err(ConfigError::NoSession {
        profile: profile_name.into(),
    })
}

/// Store a session id in the OS keyring for `profile_name`.
pub fn store_session_id(profile_name: &str, session_id: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(session_id)?;
    Ok(())
}

/// Parse and check an endpoint string.
pub fn parse_endpoint(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "endpoint".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("expected ws:// or wss://, got {}://", url.scheme()),
        });
    }
    Ok(url)
}

/// Assemble an `EngineConfig` from already-resolved endpoint and session.
pub fn build_engine_config(
    endpoint: url::Url,
    session_id: SecretString,
    profile: &Profile,
    defaults: &Defaults,
) -> Result<EngineConfig, ConfigError> {
    let delay = profile.reconnect_delay_ms.unwrap_or(defaults.reconnect_delay_ms);
    let config = EngineConfig::new(endpoint, session_id)
        .map_err(|e| ConfigError::Validation {
            field: "endpoint".into(),
            reason: e.to_string(),
        })?
        .with_reconnect_delay(Duration::from_millis(delay));

    Ok(match profile.connect_timeout_secs {
        Some(secs) => config.with_connect_timeout(Duration::from_secs(secs)),
        None => config,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        figment::Jail::expect_with(|_| {
            let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
            assert_eq!(cfg, Config::default());
            Ok(())
        });
    }

    #[test]
    fn toml_profiles_and_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "roof"

                [defaults]
                timeout = 20

                [profiles.roof]
                endpoint = "ws://10.0.0.5:8000/ws"
                session_id_env = "ROOF_SESSION"
                reconnect_delay_ms = 500
                "#,
            )?;
            jail.set_env("AQUADASH_DEFAULTS_OUTPUT", "json");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.active_profile_name(None), "roof");
            assert_eq!(cfg.active_profile_name(Some("lab")), "lab");
            assert_eq!(cfg.defaults.timeout, 20);
            assert_eq!(cfg.defaults.output, "json");
            assert_eq!(cfg.defaults.color, "auto");

            let roof = cfg.profile("roof").unwrap();
            assert_eq!(roof.endpoint, "ws://10.0.0.5:8000/ws");
            assert_eq!(roof.reconnect_delay_ms, Some(500));
            assert!(matches!(
                cfg.profile("lab"),
                Err(ConfigError::ProfileNotFound { .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("wss://tanks.example/ws");
        profile.connect_timeout_secs = Some(4);
        cfg.profiles.insert("default".into(), profile);
        save_config_to(&cfg, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[profiles.default]"));
        assert!(!written.contains("session_id"));

        figment::Jail::expect_with(|_| {
            assert_eq!(load_config_from(&path).unwrap(), cfg);
            Ok(())
        });
    }

    #[test]
    fn session_env_var_wins_over_plaintext() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("AQUADASH_TEST_SESSION", "from-env");
            let mut profile = Profile::new("ws://localhost/ws");
            profile.session_id_env = Some("AQUADASH_TEST_SESSION".into());
            profile.session_id = Some("plain".into());

            let secret = resolve_session_id(&profile, "aquadash-test-env").unwrap();
            assert_eq!(secret.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn endpoint_validation() {
        assert!(parse_endpoint("ws://localhost:8000/ws").is_ok());
        assert!(matches!(
            parse_endpoint("https://localhost/ws"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn engine_config_uses_profile_then_defaults() {
        let mut profile = Profile::new("ws://localhost:8000/ws");
        profile.session_id = Some("abc".into());
        let defaults = Defaults::default();

        let cfg = build_engine_config(
            parse_endpoint(&profile.endpoint).unwrap(),
            SecretString::from("abc"),
            &profile,
            &defaults,
        )
        .unwrap();
        assert_eq!(cfg.reconnect.delay, Duration::from_millis(3000));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));

        profile.reconnect_delay_ms = Some(750);
        profile.connect_timeout_secs = Some(2);
        let cfg = build_engine_config(
            parse_endpoint(&profile.endpoint).unwrap(),
            SecretString::from("abc"),
            &profile,
            &defaults,
        )
        .unwrap();
        assert_eq!(cfg.reconnect.delay, Duration::from_millis(750));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(2));
        assert_eq!(cfg.session_url().as_str(), "ws://localhost:8000/ws?session_id=abc");
    }
}
