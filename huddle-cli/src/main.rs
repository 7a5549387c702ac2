use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use huddle::client::{
    ClientConfig, ClientEvent, ClientSession, LoginTokenProvider, StaticMedia,
    WebRtcTransportFactory, WsConnector,
};
use huddle::ParticipantId;
use huddle::server::{Credential, ServerConfig, SignalingService, signaling_router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Signaling registry and client for small WebRTC rooms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the room registry.
    Serve {
        #[arg(long, default_value = "0.0.0.0:9090")]
        bind: SocketAddr,

        #[arg(long, default_value_t = 5)]
        otp_retention_secs: u64,

        /// Accepted login as `name:password`. Repeatable.
        #[arg(long = "user")]
        users: Vec<String>,
    },

    /// Join a room and negotiate with everyone in it. Lines typed on stdin are sent
    /// to the room as chat.
    Join {
        #[arg(long, default_value = "http://127.0.0.1:9090")]
        url: String,

        #[arg(long)]
        room: String,

        /// Participant id. A random one is generated when omitted.
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            bind,
            otp_retention_secs,
            users,
        } => serve(bind, otp_retention_secs, users).await,
        Commands::Join {
            url,
            room,
            id,
            username,
            password,
        } => join(url, room, id, username, password).await,
    }
}

async fn serve(bind: SocketAddr, otp_retention_secs: u64, users: Vec<String>) -> Result<()> {
    let credentials = users
        .iter()
        .map(|raw| {
            Credential::parse(raw).with_context(|| format!("`{raw}` is not name:password"))
        })
        .collect::<Result<Vec<_>>>()?;

    let config = ServerConfig {
        bind_addr: bind,
        otp_retention: Duration::from_secs(otp_retention_secs),
        credentials,
        ..Default::default()
    };
    let service = SignalingService::new(&config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = signaling_router(service).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    println!("{}", "📡 huddle registry".green().bold());
    println!("   login:     http://{}/login", config.bind_addr);
    println!("   signaling: ws://{}/ws?otp=<token>", config.bind_addr);
    info!("Signaling server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server stopped unexpectedly")?;
    Ok(())
}

async fn join(
    url: String,
    room: String,
    id: Option<String>,
    username: String,
    password: String,
) -> Result<()> {
    let id = id.map_or_else(ParticipantId::generate, ParticipantId::from);
    let config = ClientConfig::new(url, room, id);
    let tokens = LoginTokenProvider::new(config.http_url(), username, password);
    let connector = WsConnector::new(config.ws_url(), Arc::new(tokens));
    let factory = WebRtcTransportFactory::new(config.ice_servers.clone());

    let (mut session, mut events) =
        ClientSession::new(&config, Arc::new(connector), Arc::new(factory));
    if let Err(e) = session.start().await {
        bail!("could not join {}: {}", config.room, e);
    }

    println!(
        "{} {} {}",
        "🚀 Joined".green().bold(),
        config.room.to_string().bold(),
        format!("as {}", config.participant_id).dimmed()
    );

    let handle = session.handle();
    let task = tokio::spawn(session.run());
    handle
        .attach_media(Arc::new(StaticMedia::camera_and_microphone("huddle")))
        .await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => print_event(&event),
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if !line.trim().is_empty() => {
                    handle.send_message(line).await;
                }
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                handle.leave().await;
                handle.shutdown().await;
                break;
            }
        }
    }

    task.await.context("session task panicked")?;
    Ok(())
}

fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::Connected => println!("{}", "● signaling connected".green()),
        ClientEvent::Disconnected => println!("{}", "● signaling lost".yellow()),
        ClientEvent::Reconnecting { attempt } => {
            println!("{}", format!("↻ reconnecting (attempt {attempt})").yellow())
        }
        ClientEvent::ReconnectFailed { reason } => {
            println!("{}", format!("✖ giving up: {reason}").red().bold())
        }
        ClientEvent::PeerConnected(peer) => println!("{} {}", "⇄ connected to".cyan(), peer),
        ClientEvent::PeerClosed(peer) => println!("{} {}", "✕ closed link to".dimmed(), peer),
        ClientEvent::NegotiationFailed { peer, reason } => {
            println!("{}", format!("✖ negotiation with {peer} failed: {reason}").red())
        }
        ClientEvent::RoutingFailed { kind, to, reason } => {
            let to = to.as_ref().map(|p| p.to_string()).unwrap_or_default();
            println!("{}", format!("✖ {kind} to {to} not delivered: {reason}").red())
        }
        ClientEvent::Message { from, message, .. } => {
            println!("{} {}", format!("{from}:").bold(), message)
        }
    }
}
