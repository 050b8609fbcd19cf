//! Entry point for `gbn-transfer`.
//!
//! Parses CLI arguments and dispatches into either **server** or **client**
//! mode.  All actual protocol work is delegated to library modules; `main.rs`
//! owns only process setup (logging, argument parsing) and file I/O framing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use gbn_transfer::session::{chunk_payload, RecvSession, SendSession, DEFAULT_WINDOW};
use gbn_transfer::socket::Socket;

/// Reliable file transfer over UDP using Go-Back-N ARQ.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run as a server, receiving one file.
    Server {
        /// Local address to bind (e.g. 0.0.0.0:9000).
        #[arg(short, long, default_value = "0.0.0.0:9000")]
        bind: SocketAddr,
        /// Path the received file is written to.
        #[arg(short, long, default_value = "received_file")]
        output: PathBuf,
        /// Sequence number to discard once (fault injection for testing).
        #[arg(short, long)]
        discard: Option<u16>,
    },
    /// Run as a client, sending one file to a server.
    Client {
        /// Remote server address (e.g. 127.0.0.1:9000).
        #[arg(short, long)]
        server: SocketAddr,
        /// Path of the file to send.
        #[arg(short, long)]
        file: PathBuf,
        /// Sliding window size in packets.
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: u16,
        /// Retransmission timeout in milliseconds.
        #[arg(long, default_value_t = 500)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Server {
            bind,
            output,
            discard,
        } => {
            log::info!("listening on {bind}");
            let socket = Socket::bind(bind).await?;
            let mut session = RecvSession::accept(socket).await?;

            let file = File::create(&output)
                .with_context(|| format!("creating output file {}", output.display()))?;
            let mut sink = BufWriter::new(file);
            let stats = session.receive(&mut sink, discard).await?;
            sink.flush().context("flushing output file")?;

            println!(
                "received {} byte(s) in {} packet(s); throughput {:.2} Mbps",
                stats.bytes,
                stats.packets,
                stats.throughput_mbps()
            );
        }
        Mode::Client {
            server,
            file,
            window,
            timeout_ms,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading input file {}", file.display()))?;
            let chunks = chunk_payload(&bytes);

            let socket = Socket::bind("0.0.0.0:0".parse().unwrap()).await?;
            let timeout = Duration::from_millis(timeout_ms);
            let mut session = SendSession::connect(socket, server, timeout).await?;

            session.transfer(chunks, window).await?;
            let confirmed = session.close().await?;
            if !confirmed {
                eprintln!("warning: teardown unconfirmed (data transfer itself completed)");
            }
        }
    }

    Ok(())
}
