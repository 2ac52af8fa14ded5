//! The scheduler-facing reactor: one Unix socket, one connection at a
//! time expected (the scheduler itself only ever runs one instance), but
//! written to tolerate reconnects the way `sched-hello`/`sched-ready`
//! imply a real one will.
//!
//! Accept loop on an `UnixListener`, one `spawn_local` task per
//! connection, a `Framed` split into independent read/write halves.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use alloc_core::CoreRef;
use futures::{SinkExt, StreamExt};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Notify};

use crate::error::JobmgrdError;
use crate::server::codec::{decode, encode, make_protocol_builder};
use crate::server::transport::DaemonTransport;
use crate::transfer::{SchedMessage, SchedReply};

fn new_route_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("sched-{suffix}")
}

pub async fn run_scheduler_listener(
    socket_path: PathBuf,
    core: CoreRef,
    shutdown_requested: Rc<Cell<bool>>,
    maybe_drained: Rc<Cell<bool>>,
    drained: Rc<Notify>,
) -> Result<(), JobmgrdError> {
    let _ = std::fs::remove_file(&socket_path);
    let listener = UnixListener::bind(&socket_path)?;
    log::info!("scheduler socket listening at {}", socket_path.display());

    loop {
        let (stream, _addr) = listener.accept().await?;
        let core = core.clone();
        let shutdown_requested = shutdown_requested.clone();
        let maybe_drained = maybe_drained.clone();
        let drained = drained.clone();
        tokio::task::spawn_local(async move {
            let route = new_route_id();
            log::debug!("scheduler connected: {route}");
            if let Err(e) =
                handle_scheduler_connection(&core, &route, stream, &shutdown_requested, &maybe_drained, &drained)
                    .await
            {
                log::warn!("scheduler connection {route} ended: {e}");
            }
            core.get_mut().disconnect(&route);
        });
    }
}

async fn handle_scheduler_connection(
    core: &CoreRef,
    route: &str,
    stream: UnixStream,
    shutdown_requested: &Rc<Cell<bool>>,
    maybe_drained: &Rc<Cell<bool>>,
    drained: &Rc<Notify>,
) -> Result<(), JobmgrdError> {
    let (mut write, mut read) = make_protocol_builder().new_framed(stream).split();
    let (tx, mut rx) = mpsc::unbounded_channel::<SchedReply>();

    core.get_mut()
        .rebind_transport(Box::new(DaemonTransport::new(tx.clone())));

    let writer = async {
        while let Some(reply) = rx.recv().await {
            let bytes = encode(&reply)?;
            write.send(bytes).await.map_err(JobmgrdError::Io)?;
        }
        Ok::<(), JobmgrdError>(())
    };

    let reader = async {
        while let Some(frame) = read.next().await {
            let frame = frame.map_err(JobmgrdError::Io)?;
            let msg: SchedMessage = decode(&frame)?;
            if let Err(e) = handle_message(core, route, &tx, msg) {
                if e_requires_teardown(&e) {
                    core.get_mut().interface_teardown();
                }
                return Err(e);
            }
            resolve_drain(core, shutdown_requested, maybe_drained, drained);
        }
        Ok::<(), JobmgrdError>(())
    };

    tokio::select! {
        r = reader => r,
        r = writer => r,
    }
}

fn e_requires_teardown(err: &JobmgrdError) -> bool {
    matches!(err, JobmgrdError::Core(inner) if inner.requires_teardown())
}

fn handle_message(
    core: &CoreRef,
    route: &str,
    tx: &mpsc::UnboundedSender<SchedReply>,
    msg: SchedMessage,
) -> Result<(), JobmgrdError> {
    match msg {
        SchedMessage::Hello => {
            for item in core.get().hello_replay() {
                let _ = tx.send(SchedReply::Hello(item));
            }
        }
        SchedMessage::Ready { mode } => {
            let resp = core.get_mut().handle_ready(mode, Some(route.to_string()))?;
            let _ = tx.send(SchedReply::Ready(resp));
        }
        SchedMessage::Alloc(resp) => core.get_mut().handle_alloc_response(resp)?,
        SchedMessage::Free(resp) => core.get_mut().handle_free_response(resp)?,
    }
    dispatch_available_work(core)?;
    Ok(())
}

/// Drains the waiting queue one job at a time until nothing more can be
/// dispatched — the async stand-in for the core's `prep`/`check` pair,
/// which assumes an idle watcher retriggering `check` every iteration.
/// There's no idle watcher in tokio, so this runs the equivalent loop
/// inline right after whatever state change might have made a dispatch
/// possible.
fn dispatch_available_work(core: &CoreRef) -> Result<(), JobmgrdError> {
    while core.get().prep() {
        if !core.get_mut().check()? {
            break;
        }
    }
    Ok(())
}

fn resolve_drain(
    core: &CoreRef,
    shutdown_requested: &Rc<Cell<bool>>,
    maybe_drained: &Rc<Cell<bool>>,
    drained: &Rc<Notify>,
) {
    if !shutdown_requested.get() || !maybe_drained.take() {
        return;
    }
    let c = core.get();
    if c.alloc_pending_count() == 0 && c.free_pending_count() == 0 {
        drained.notify_waiters();
    }
}
