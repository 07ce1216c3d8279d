//! Interactive client: connect, give a name, wait for a role, then talk.
//!
//! The privileged player types `/accuse <name>` to end the game; everyone
//! else just types. Incoming chat prints as `sender: message`.

use std::io::Write as _;

use callout_client::{outbound_for_line, render};
use callout_protocol::{Codec, Envelope, JsonCodec, Role};
use callout_transport::{FrameReader, TcpConnection};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Chat goes to stdout; keep the log level quiet unless asked.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let addr = match parse_addr(std::env::args().skip(1)) {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: callout-client [--host <HOST>] [--port <PORT>]");
            std::process::exit(2);
        }
    };

    let codec = JsonCodec;
    let conn = TcpConnection::connect(&addr).await?;
    let (mut reader, mut writer) = conn.into_split();

    // Name prompt, then the one admission envelope.
    print!("Enter your name: ");
    std::io::stdout().flush()?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let name = match stdin.next_line().await? {
        Some(line) if !line.trim().is_empty() => line.trim().to_string(),
        _ => {
            eprintln!("a name is required");
            std::process::exit(2);
        }
    };
    writer
        .send(&codec.encode(&Envelope::PlayerName { name })?)
        .await?;

    println!("Waiting for three players...");

    // The first envelope back is the dealt role.
    let role = match receive(&mut reader, &codec).await? {
        Some(Envelope::RoleReveal { role }) => role,
        Some(other) => {
            eprintln!("unexpected first message from server: {other:?}");
            std::process::exit(1);
        }
        None => {
            // Most likely a full session; the server says so before closing.
            eprintln!("server closed the connection");
            std::process::exit(1);
        }
    };
    println!("SERVER: your role is {role}");
    if role == Role::Privileged {
        println!("SERVER: end the game with: /accuse <name>");
    }

    // Receiver task: print everything the server relays.
    let mut receive_task = tokio::spawn(async move {
        loop {
            match receive(&mut reader, &codec).await {
                Ok(Some(envelope)) => match render(&envelope) {
                    Some(line) => println!("{line}"),
                    None => {
                        eprintln!("unexpected message from server: {envelope:?}");
                        break;
                    }
                },
                Ok(None) => {
                    println!("SERVER closed the connection");
                    break;
                }
                Err(e) => {
                    eprintln!("connection lost: {e}");
                    break;
                }
            }
        }
    });

    // Input loop: every line goes out until the server hangs up or stdin ends.
    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                if let Some(envelope) = outbound_for_line(role, &line) {
                    let payload = codec.encode(&envelope)?;
                    if writer.send(&payload).await.is_err() {
                        break;
                    }
                }
            }
            _ = &mut receive_task => break,
        }
    }

    Ok(())
}

/// Receives and decodes one envelope; `Ok(None)` on clean close.
async fn receive(
    reader: &mut FrameReader,
    codec: &JsonCodec,
) -> Result<Option<Envelope>, Box<dyn std::error::Error + Send + Sync>> {
    match reader.recv().await? {
        Some(payload) => Ok(Some(codec.decode(&payload)?)),
        None => Ok(None),
    }
}

/// Parses `--host`/`--port` into an address string.
fn parse_addr<I>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = String>,
{
    let mut host = "127.0.0.1".to_string();
    let mut port: u16 = 12345;
    let mut args = args.into_iter();

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--host" => {
                host = args
                    .next()
                    .ok_or_else(|| "--host requires a value".to_string())?;
            }
            "--port" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--port requires a value".to_string())?;
                port = value
                    .parse()
                    .map_err(|_| format!("--port: \"{value}\" is not a valid port"))?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(format!("{host}:{port}"))
}
