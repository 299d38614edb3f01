//! `watch`: a live terminal presenter.
//!
//! Prints every snapshot the server pushes, and connection changes on
//! stderr, until Ctrl-C or `--count` snapshots.

use std::sync::Arc;

use owo_colors::OwoColorize;
use tokio::sync::watch;

use aquadash_core::{ConnectionState, Device, DeviceFilter, DeviceStore, Engine, RenderSink};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

struct TerminalSink {
    store: Arc<DeviceStore>,
    filter: DeviceFilter,
    format: OutputFormat,
    color: bool,
    quiet: bool,
    rendered: watch::Sender<u64>,
}

impl TerminalSink {
    fn header(&self, shown: usize, total: usize) -> String {
        let at = self
            .store
            .last_snapshot_at()
            .map_or_else(|| "-".into(), |t| t.format("%H:%M:%S UTC").to_string());
        let line = if shown == total {
            format!("── {total} devices · {at} ──")
        } else {
            format!("── {shown} of {total} devices · {at} ──")
        };
        if self.color {
            line.dimmed().to_string()
        } else {
            line
        }
    }

    /// Outside `Open`, the line also says how stale the table on screen is.
    fn connection_line(&self, state: ConnectionState) -> String {
        let label = state.to_string();
        let label = match (self.color, state) {
            (false, _) => label,
            (true, ConnectionState::Open) => label.green().to_string(),
            (true, ConnectionState::Connecting) => label.yellow().to_string(),
            (true, ConnectionState::Closed) => label.red().to_string(),
        };
        match self.store.data_age() {
            Some(age) if state != ConnectionState::Open => {
                format!("connection: {label} (last snapshot {}s ago)", age.num_seconds())
            }
            _ => format!("connection: {label}"),
        }
    }
}

impl RenderSink for TerminalSink {
    fn render(&self, devices: &[Arc<Device>]) {
        let shown: Vec<Arc<Device>> = devices
            .iter()
            .filter(|d| self.filter.matches(d))
            .cloned()
            .collect();

        if !self.quiet {
            if matches!(self.format, OutputFormat::Table) {
                println!("{}", self.header(shown.len(), devices.len()));
            }
            let out = output::render_devices(self.format, &shown, self.color);
            output::print_output(&out, false);
        }

        self.rendered.send_modify(|n| *n += 1);
    }

    fn connection_changed(&self, state: ConnectionState) {
        if !self.quiet {
            eprintln!("{}", self.connection_line(state));
        }
    }
}

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = crate::config::resolve_engine_config(global)?;
    let (rendered, mut rendered_rx) = watch::channel(0_u64);

    let filter = util::to_filter(&args.filter);
    let format = global.output();
    let color = output::should_color(global.color());
    let quiet = global.quiet;

    let engine = Engine::with_render_sink(config, |dispatcher| TerminalSink {
        store: Arc::clone(dispatcher.store()),
        filter,
        format,
        color,
        quiet,
        rendered,
    });

    // No initial-connect deadline: watching rides out a server that is
    // not up yet.
    engine.start().await?;

    let limit = async {
        match args.count {
            Some(n) => {
                let _ = rendered_rx.wait_for(|c| *c >= n).await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        () = limit => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
            }
            tracing::info!("interrupted");
        }
    }

    engine.shutdown().await;
    Ok(())
}
