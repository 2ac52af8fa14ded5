//! `jobmgr-admin`: a one-shot CLI that dials the daemon's administrative
//! socket for a single request/response round trip. Each invocation opens
//! the socket, sends one message, and exits.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;

use jobmgrd::server::codec::{decode, encode, make_protocol_builder};
use jobmgrd::transfer::{AdminMessage, AdminReply};

#[derive(Parser)]
#[command(name = "jobmgr-admin", about = "Inspect or control the allocation core")]
struct Opts {
    /// Unix socket the daemon's admin listener is bound to.
    #[arg(long, default_value = "/tmp/jobmgrd-admin.sock")]
    admin_socket: PathBuf,

    #[clap(subcommand)]
    subcmd: Command,
}

#[derive(Parser)]
enum Command {
    /// Report whether the allocation core is currently accepting requests.
    Status,
    /// Re-enable request acceptance after a previous `disable`.
    Enable,
    /// Stop accepting new allocation requests and cancel the waiting queue.
    Disable(DisableOpts),
    /// List the job IDs currently in the waiting queue, in dispatch order.
    Queue,
}

#[derive(Parser)]
struct DisableOpts {
    /// Human-readable reason recorded for `jobmgr-admin status`.
    #[arg(long)]
    reason: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    rt.block_on(run(opts))
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    let message = match opts.subcmd {
        Command::Status => AdminMessage::Admin(alloc_core::AdminRequest {
            query_only: true,
            enable: false,
            reason: None,
            is_owner: false,
        }),
        Command::Enable => AdminMessage::Admin(alloc_core::AdminRequest {
            query_only: false,
            enable: true,
            reason: None,
            is_owner: true,
        }),
        Command::Disable(DisableOpts { reason }) => AdminMessage::Admin(alloc_core::AdminRequest {
            query_only: false,
            enable: false,
            reason,
            is_owner: true,
        }),
        Command::Queue => AdminMessage::QueueList,
    };

    let reply = send(&opts.admin_socket, message).await?;

    match reply {
        AdminReply::Admin(resp) => {
            let status = if resp.enable { "enabled" } else { "disabled" };
            println!("allocation core: {status}");
            if !resp.reason.is_empty() {
                println!("reason: {}", resp.reason);
            }
            println!("queue length: {}", resp.queue_length);
            println!("alloc pending: {}", resp.alloc_pending);
            println!("free pending: {}", resp.free_pending);
            println!("running: {}", resp.running);
        }
        AdminReply::QueueList(ids) => {
            for id in ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

async fn send(socket_path: &PathBuf, message: AdminMessage) -> anyhow::Result<AdminReply> {
    let stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("connecting to {}", socket_path.display()))?;
    let (mut write, mut read) = make_protocol_builder().new_framed(stream).split();

    write.send(encode(&message)?).await.context("sending request")?;

    let frame = read
        .next()
        .await
        .context("daemon closed the connection without replying")?
        .context("reading reply")?;
    Ok(decode(&frame)?)
}
