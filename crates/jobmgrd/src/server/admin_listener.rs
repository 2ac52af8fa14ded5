//! The administrative socket `jobmgr-admin` talks to. One request per
//! connection, unlike the scheduler socket — there's no handshake and no
//! streaming reply.

use std::path::PathBuf;

use alloc_core::CoreRef;
use futures::{SinkExt, StreamExt};
use tokio::net::{UnixListener, UnixStream};

use crate::error::JobmgrdError;
use crate::server::codec::{decode, encode, make_protocol_builder};
use crate::transfer::{AdminMessage, AdminReply};

pub async fn run_admin_listener(socket_path: PathBuf, core: CoreRef) -> Result<(), JobmgrdError> {
    let _ = std::fs::remove_file(&socket_path);
    let listener = UnixListener::bind(&socket_path)?;
    log::info!("admin socket listening at {}", socket_path.display());

    loop {
        let (stream, _addr) = listener.accept().await?;
        let core = core.clone();
        tokio::task::spawn_local(async move {
            if let Err(e) = handle_admin_connection(&core, stream).await {
                log::warn!("admin connection error: {e}");
            }
        });
    }
}

async fn handle_admin_connection(core: &CoreRef, stream: UnixStream) -> Result<(), JobmgrdError> {
    let (mut write, mut read) = make_protocol_builder().new_framed(stream).split();

    let frame = match read.next().await {
        Some(frame) => frame.map_err(JobmgrdError::Io)?,
        None => return Ok(()),
    };
    let msg: AdminMessage = decode(&frame)?;

    let reply = match msg {
        AdminMessage::Admin(req) => AdminReply::Admin(core.get_mut().handle_admin_request(req)?),
        AdminMessage::QueueList => AdminReply::QueueList(core.get().list_waiting()),
    };

    write.send(encode(&reply)?).await.map_err(JobmgrdError::Io)?;
    Ok(())
}
