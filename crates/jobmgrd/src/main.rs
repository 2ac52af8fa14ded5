//! The allocation core's daemon: owns the scheduler-facing and
//! administrative Unix sockets and drives `alloc_core::AllocCore` from a
//! single-threaded tokio `LocalSet`.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use alloc_core::AllocCore;
use anyhow::Context;
use clap::Parser;
use tokio::sync::Notify;

use jobmgrd::server::active_jobs::DaemonActiveJobs;
use jobmgrd::server::admin_listener::run_admin_listener;
use jobmgrd::server::drain::DaemonDrainSupervisor;
use jobmgrd::server::event_log::JsonlEventLog;
use jobmgrd::server::reactor::run_scheduler_listener;
use jobmgrd::server::transport::NullTransport;

/// The allocation core's daemon.
#[derive(Parser, Debug)]
#[command(name = "jobmgrd", about = "Allocation core daemon")]
struct Args {
    /// Unix socket the scheduler dials in on for sched-hello/sched-ready.
    #[arg(long, default_value = "/tmp/jobmgrd-sched.sock")]
    sched_socket: PathBuf,

    /// Unix socket `jobmgr-admin` dials in on.
    #[arg(long, default_value = "/tmp/jobmgrd-admin.sock")]
    admin_socket: PathBuf,

    /// Append-only JSON-lines event journal path.
    #[arg(long, default_value = "/tmp/jobmgrd-events.jsonl")]
    event_log: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let event_log = JsonlEventLog::open(args.event_log.clone())
        .with_context(|| format!("opening event log at {}", args.event_log.display()))?;

    let shutdown_requested = Rc::new(Cell::new(false));
    let maybe_drained = Rc::new(Cell::new(false));
    let drained = Rc::new(Notify::new());

    let core = alloc_core::CoreRef::wrap(AllocCore::new(
        Box::new(DaemonActiveJobs::new()),
        Box::new(event_log),
        Box::new(NullTransport),
        Box::new(DaemonDrainSupervisor::new(
            shutdown_requested.clone(),
            maybe_drained.clone(),
        )),
    ));

    log::info!("jobmgrd starting");

    let sched = tokio::task::spawn_local(run_scheduler_listener(
        args.sched_socket.clone(),
        core.clone(),
        shutdown_requested.clone(),
        maybe_drained.clone(),
        drained.clone(),
    ));
    let admin = tokio::task::spawn_local(run_admin_listener(args.admin_socket.clone(), core.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("shutdown requested, waiting for outstanding allocations to drain");
            shutdown_requested.set(true);
            if core.get().alloc_pending_count() == 0 && core.get().free_pending_count() == 0 {
                drained.notify_waiters();
            }
            let _ = tokio::time::timeout(std::time::Duration::from_secs(10), drained.notified()).await;
        }
        res = sched => res.context("scheduler listener task panicked")?.context("scheduler listener failed")?,
        res = admin => res.context("admin listener task panicked")?.context("admin listener failed")?,
    }

    log::info!("jobmgrd shutting down");
    Ok(())
}
