//! Device command handlers.
//!
//! Every handler connects, does one thing, and disconnects. Mutations are
//! fire-and-forget on the wire; the handler waits for one more snapshot so
//! the server has a chance to apply them before the socket closes.

use std::sync::Arc;

use serde_json::Value;

use aquadash_core::{Device, DeviceDraft, DeviceMode, Engine};

use crate::cli::{AddArgs, GlobalOpts, ListArgs, ModeArg, PumpArg, SendArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(d: &Arc<Device>) -> String {
    let mut lines = vec![
        format!("ID:       {}", d.id),
        format!("Name:     {}", d.name),
        format!("Location: {}", d.location_label()),
        format!("Mode:     {}", d.mode),
        format!("Pump:     {}", if d.pump_status { "on" } else { "off" }),
        format!("Water:    {:.1}%", d.water_level),
    ];
    if let Some(ref alert) = d.alert {
        lines.push(format!("Alert:    {alert}"));
    }
    lines.join("\n")
}

/// Look a device up in the current snapshot.
fn find(engine: &Engine, id: &str) -> Result<Arc<Device>, CliError> {
    engine
        .store()
        .device_by_id(id)
        .ok_or_else(|| CliError::DeviceNotFound {
            identifier: id.into(),
        })
}

// ── Read ────────────────────────────────────────────────────────────

pub async fn list(args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let engine = util::connect(global).await?;
    let result = util::first_snapshot(&engine, global).await;
    engine.shutdown().await;
    result?;

    let filter = util::to_filter(&args.filter);
    let devices = engine.store().subscribe_devices().latest_matching(&filter);

    let out = output::render_devices(global.output(), &devices, output::should_color(global.color()));
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn show(device: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let engine = util::connect(global).await?;
    let result = util::first_snapshot(&engine, global).await;
    engine.shutdown().await;
    result?;

    let found = find(&engine, device)?;
    let out = output::render_single(global.output(), &found, detail, |d| d.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Add / remove ────────────────────────────────────────────────────

pub async fn add(args: AddArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let draft = DeviceDraft::new(args.id, args.name, args.location);

    // Reject locally before touching the network.
    aquadash_core::validate(&draft).map_err(|errors| CliError::Validation {
        field: "device".into(),
        reason: errors.to_string(),
    })?;

    let engine = util::connect(global).await?;
    let delivery = engine
        .dispatcher()
        .submit_add(&draft)
        .map_err(|errors| CliError::Validation {
            field: "device".into(),
            reason: errors.to_string(),
        });

    let sent = delivery.and_then(|d| util::ensure_sent(d, "add_device"));
    if let Err(e) = sent {
        engine.shutdown().await;
        return Err(e);
    }

    util::settle(&engine, global).await;
    if !global.quiet {
        let id = draft.id.trim();
        if engine.store().device_by_id(id).is_some() {
            eprintln!("✓ Device '{id}' added");
        } else {
            eprintln!("✓ add_device sent for '{id}' (not yet in the device list)");
        }
    }
    Ok(())
}

pub async fn remove(device: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let engine = util::connect(global).await?;
    let outcome = remove_on(&engine, device, global).await;
    if outcome.is_err() {
        engine.shutdown().await;
    }
    outcome
}

async fn remove_on(engine: &Engine, device: &str, global: &GlobalOpts) -> Result<(), CliError> {
    util::first_snapshot(engine, global).await?;
    let found = find(engine, device)?;

    let store = engine.store();
    store.request_delete(found.id.as_str());

    let prompt = format!("Remove device '{}' ({})?", found.name, found.id);
    if !util::confirm(&prompt, global)? {
        store.cancel_delete();
        engine.shutdown().await;
        if !global.quiet {
            eprintln!("Cancelled");
        }
        return Ok(());
    }

    match engine.dispatcher().submit_remove() {
        Some(delivery) => util::ensure_sent(delivery, "remove_device")?,
        // A snapshot dropped the device while the prompt was open.
        None => {
            return Err(CliError::DeviceNotFound {
                identifier: device.into(),
            });
        }
    }

    util::settle(engine, global).await;
    if !global.quiet {
        eprintln!("✓ Device '{}' removed", found.id);
    }
    Ok(())
}

// ── Commands ────────────────────────────────────────────────────────

pub async fn mode(device: &str, mode: ModeArg, global: &GlobalOpts) -> Result<(), CliError> {
    let engine = util::connect(global).await?;
    let outcome: Result<(), CliError> = async {
        let delivery = match mode {
            ModeArg::Manual => engine.dispatcher().set_mode(device, DeviceMode::Manual),
            ModeArg::Automatic => engine.dispatcher().set_mode(device, DeviceMode::Automatic),
            ModeArg::Toggle => {
                util::first_snapshot(&engine, global).await?;
                engine.dispatcher().toggle_mode(device)?
            }
        };
        util::ensure_sent(delivery, "setMode")
    }
    .await;

    if outcome.is_err() {
        engine.shutdown().await;
        return outcome;
    }

    util::settle(&engine, global).await;
    if !global.quiet {
        if let Some(d) = engine.store().device_by_id(device) {
            eprintln!("✓ {} is now {}", d.id, d.mode);
        } else {
            eprintln!("✓ setMode sent to {device}");
        }
    }
    Ok(())
}

pub async fn pump(device: &str, state: PumpArg, global: &GlobalOpts) -> Result<(), CliError> {
    let engine = util::connect(global).await?;
    let outcome: Result<(), CliError> = async {
        util::first_snapshot(&engine, global).await?;
        let found = find(&engine, device)?;
        // The server decides whether to honor it.
        if !found.pump_controllable() && !global.quiet {
            eprintln!(
                "⚠ '{}' is in {} mode; the server may ignore this pump change",
                found.id, found.mode
            );
        }
        let delivery = engine
            .dispatcher()
            .set_pump(device, state == PumpArg::On);
        util::ensure_sent(delivery, "setPumpStatus")
    }
    .await;

    if outcome.is_err() {
        engine.shutdown().await;
        return outcome;
    }

    util::settle(&engine, global).await;
    if !global.quiet {
        let label = if state == PumpArg::On { "on" } else { "off" };
        eprintln!("✓ Pump {label} requested for {device}");
    }
    Ok(())
}

pub async fn send(args: SendArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Parse before connecting so a typo never costs a round trip.
    let params: Value = serde_json::from_str(&args.params)?;

    let engine = util::connect(global).await?;
    let delivery = engine
        .dispatcher()
        .send_command(&args.device, &args.command, params);
    if let Err(e) = util::ensure_sent(delivery, &args.command) {
        engine.shutdown().await;
        return Err(e);
    }

    util::settle(&engine, global).await;
    if !global.quiet {
        eprintln!("✓ {} sent to {}", args.command, args.device);
    }
    Ok(())
}
