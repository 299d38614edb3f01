//! CLI configuration: thin wrapper around `aquadash_config`.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--endpoint, --session-id).

use clap::ValueEnum;
use secrecy::SecretString;

use aquadash_core::EngineConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use aquadash_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Fill output, color and timeout from `[defaults]` where no flag or env
/// var set them.
pub fn apply_defaults(global: &mut GlobalOpts, defaults: &Defaults) {
    if global.output.is_none() {
        global.output = parse_default::<OutputFormat>("output", &defaults.output);
    }
    if global.color.is_none() {
        global.color = parse_default::<ColorMode>("color", &defaults.color);
    }
    if global.timeout.is_none() {
        global.timeout = Some(defaults.timeout);
    }
}

fn parse_default<T: ValueEnum>(key: &str, raw: &str) -> Option<T> {
    T::from_str(raw, true)
        .inspect_err(|_| tracing::warn!(key, value = raw, "ignoring invalid value in [defaults]"))
        .ok()
}

/// Build the `EngineConfig` for this invocation.
///
/// Flags and `AQUADASH_*` env vars win over the profile. Without a profile,
/// `--endpoint` and `--session-id` alone are enough.
pub fn resolve_engine_config(global: &GlobalOpts) -> Result<EngineConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            let available: Vec<_> = cfg.profiles.keys().cloned().collect();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            let endpoint = global.endpoint.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(endpoint)
        }
    };

    // 1. Endpoint (flag > env > profile)
    let endpoint_str = global.endpoint.as_deref().unwrap_or(&profile.endpoint);
    let endpoint = aquadash_config::parse_endpoint(endpoint_str)?;

    // 2. Session id (flag > env > profile chain)
    let session_id = match global.session_id {
        Some(ref id) if !id.is_empty() => SecretString::from(id.clone()),
        _ => aquadash_config::resolve_session_id(&profile, &profile_name)?,
    };

    Ok(aquadash_config::build_engine_config(
        endpoint,
        session_id,
        &profile,
        &cfg.defaults,
    )?)
}
