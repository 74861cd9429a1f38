//! typebus demo
//!
//! Wires a bus, the syslog forwarder and a shutdown hook group together and
//! runs a small job through a few status updates.
//!
//! Configuration comes from an optional file given as the first argument,
//! overridden by `TYPEBUS_*` environment variables; log output is controlled
//! with `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use typebus::{
    clock_from_config, BusResult, Clock, Config, Event, EventBus, HasStatus, Hooks, Probe,
    Severity, StatusUpdate, SyslogForwarder, Syslogger,
};

/// Progress of one demo job.
#[derive(Debug, Default)]
struct JobStatus {
    status: StatusUpdate,
    job: String,
}

impl HasStatus for JobStatus {
    fn status_mut(&mut self) -> &mut StatusUpdate {
        &mut self.status
    }
}

impl Syslogger for JobStatus {
    fn syslog(&self) -> (Severity, String) {
        let severity = if self.status.status == "failed" {
            Severity::Error
        } else {
            Severity::Info
        };
        (
            severity,
            format!("job {} [{}]: {}", self.job, self.status.event_id, self.status.status),
        )
    }
}

impl Event for JobStatus {
    fn conform(&self, probe: &mut Probe<'_>) {
        probe.offer::<dyn Syslogger>(self);
    }
}

fn run(config: &Config) -> BusResult<()> {
    let clock = clock_from_config(&config.clock);
    let bus = EventBus::new();

    let forwarder = Arc::new(SyslogForwarder::from_config(&config.syslog));
    info!(connected = forwarder.is_connected(), "Syslog forwarder ready");
    forwarder.install(&bus)?;

    let updates = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&updates);
    bus.add_listener(move |ev: &JobStatus| {
        seen.fetch_add(1, Ordering::Relaxed);
        info!(job = %ev.job, status = %ev.status.status, "Job status changed");
    })?;

    let shutdown = Hooks::new();
    let flushed = Arc::clone(&updates);
    shutdown.add(move || info!(updates = flushed.load(Ordering::Relaxed), "Flushed job log"))?;
    shutdown.add(|| info!("Released job slots"))?;

    let mut job = JobStatus {
        job: "nightly-backup".to_string(),
        ..JobStatus::default()
    };
    for step in ["queued", "running", "done"] {
        let at = clock.now()?;
        info!(at = %at, step, "Updating job");
        bus.dispatch_update(&mut job, step.to_string())?;
        if let Some(manual) = clock.manual() {
            manual.advance(chrono::Duration::seconds(1));
        }
    }

    shutdown.fire()
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let file = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match Config::load(file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(clock = %config.clock.kind, syslog = config.syslog.enabled, "typebus demo starting");

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Demo failed");
            ExitCode::FAILURE
        }
    }
}
