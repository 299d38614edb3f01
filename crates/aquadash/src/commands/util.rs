//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use aquadash_core::{CoreError, Delivery, DeviceFilter, DeviceMode, Engine};

use crate::cli::{FilterArgs, FilterMode, GlobalOpts, PumpArg};
use crate::error::CliError;

/// How long one-shot commands wait on the server.
pub fn wait_budget(global: &GlobalOpts) -> Duration {
    Duration::from_secs(global.timeout().max(1))
}

/// Start `engine` and wait for the socket to open.
///
/// On failure the engine is shut down before returning, so callers never
/// leak a reconnect loop.
pub async fn open(engine: Engine, global: &GlobalOpts) -> Result<Engine, CliError> {
    engine.start().await?;

    let spinner = spinner(global, format!("Connecting to {}", engine.config().endpoint));
    let result = engine.wait_until_open(wait_budget(global)).await;
    if let Some(ref pb) = spinner {
        pb.finish_and_clear();
    }

    match result {
        Ok(()) => Ok(engine),
        Err(CoreError::Timeout { timeout_secs }) => {
            engine.shutdown().await;
            Err(CliError::connection_failed(
                Some(engine.config().endpoint.as_str()),
                format!("no open connection after {timeout_secs}s"),
            ))
        }
        Err(CoreError::ConnectionFailed { reason }) => {
            engine.shutdown().await;
            Err(CliError::connection_failed(
                Some(engine.config().endpoint.as_str()),
                reason,
            ))
        }
        Err(e) => {
            engine.shutdown().await;
            Err(e.into())
        }
    }
}

/// Connect a headless engine for a one-shot command.
pub async fn connect(global: &GlobalOpts) -> Result<Engine, CliError> {
    let config = crate::config::resolve_engine_config(global)?;
    open(Engine::new(config), global).await
}

/// Wait for the first snapshot after connecting.
pub async fn first_snapshot(engine: &Engine, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = spinner(global, "Waiting for device snapshot".into());
    let result = engine.wait_for_snapshot(1, wait_budget(global)).await;
    if let Some(ref pb) = spinner {
        pb.finish_and_clear();
    }
    result.map(|_| ()).map_err(CliError::from)
}

/// After a successful send, give the server one broadcast to reflect it,
/// then disconnect.
///
/// The server is authoritative: a missing confirmation is not an error,
/// only a warning.
pub async fn settle(engine: &Engine, global: &GlobalOpts) {
    if let Err(e) = engine.next_snapshot(wait_budget(global)).await {
        tracing::warn!(error = %e, "no snapshot after command");
    }
    engine.shutdown().await;
}

/// A dropped message means the socket closed under us.
pub fn ensure_sent(delivery: Delivery, action: &str) -> Result<(), CliError> {
    if delivery.is_sent() {
        Ok(())
    } else {
        Err(CliError::NotConnected {
            action: action.into(),
        })
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, global: &GlobalOpts) -> Result<bool, CliError> {
    if global.yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Combine the filter flags into one predicate.
pub fn to_filter(args: &FilterArgs) -> DeviceFilter {
    let mode = args.mode.map(|m| match m {
        FilterMode::Manual => DeviceMode::Manual,
        FilterMode::Automatic => DeviceMode::Automatic,
    });
    let pump = args.pump;
    let alerting = args.alerting;

    if mode.is_none() && pump.is_none() && !alerting {
        return DeviceFilter::All;
    }

    DeviceFilter::Custom(Box::new(move |d| {
        mode.is_none_or(|m| d.mode == m)
            && pump.is_none_or(|p| d.pump_status == (p == PumpArg::On))
            && (!alerting || d.alert.is_some())
    }))
}

fn spinner(global: &GlobalOpts, message: String) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aquadash_core::Device;

    fn args(mode: Option<FilterMode>, pump: Option<PumpArg>, alerting: bool) -> FilterArgs {
        FilterArgs {
            mode,
            pump,
            alerting,
        }
    }

    fn device(mode: DeviceMode, pump_status: bool, alert: Option<&str>) -> Device {
        Device {
            id: "d1".into(),
            name: "North".into(),
            location: None,
            mode,
            pump_status,
            water_level: 50.0,
            alert: alert.map(str::to_owned),
        }
    }

    #[test]
    fn no_flags_matches_everything() {
        assert!(matches!(to_filter(&args(None, None, false)), DeviceFilter::All));
    }

    #[test]
    fn flags_combine_with_and() {
        let filter = to_filter(&args(Some(FilterMode::Manual), Some(PumpArg::On), false));
        assert!(filter.matches(&device(DeviceMode::Manual, true, None)));
        assert!(!filter.matches(&device(DeviceMode::Manual, false, None)));
        assert!(!filter.matches(&device(DeviceMode::Automatic, true, None)));
    }

    #[test]
    fn alerting_requires_an_alert() {
        let filter = to_filter(&args(None, None, true));
        assert!(filter.matches(&device(DeviceMode::Manual, false, Some("low"))));
        assert!(!filter.matches(&device(DeviceMode::Manual, false, None)));
    }

    #[test]
    fn dropped_delivery_is_not_connected() {
        assert!(ensure_sent(Delivery::Sent, "pump").is_ok());
        let err = ensure_sent(Delivery::Dropped, "pump").unwrap_err();
        assert!(matches!(err, CliError::NotConnected { .. }));
    }
}
