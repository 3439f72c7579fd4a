//! Palabra Viva binary: drives the learning core over JSON lines on stdin and stdout.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use futures::StreamExt;
use palabra_viva::{
    config::AppConfig,
    dao::{catalog::Catalog, store::JsonFileStore},
    dto::{
        host::{HostCommand, OutboundLine},
        intent::HostMessage,
        surface::SurfaceEvent,
    },
    services::{
        app::{App, AppDeps, AppEvent},
        host_bridge::HostBridge,
        surface::HubSurface,
    },
    state::EventHub,
};
use rand::{SeedableRng, rngs::StdRng};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    sync::{broadcast, mpsc, oneshot},
    time::timeout,
};
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Surface events buffered for a slow stdout before the oldest are dropped.
const HUB_CAPACITY: usize = 256;
/// Time left to the writer to flush the last lines on shutdown.
const WRITER_GRACE: Duration = Duration::from_millis(500);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::builtin().context("loading built-in catalog")?,
    };
    let store = JsonFileStore::new(config.stars_path.clone());

    let hub = EventHub::new(HUB_CAPACITY);
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let bridge = HostBridge::new(commands_tx, config.speech.language.clone());
    let writer = tokio::spawn(write_lines(hub.subscribe(), commands_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let Some(voice_supported) = wait_for_ready(&mut lines)
        .await
        .context("reading host handshake")?
    else {
        info!("stdin closed before the host was ready");
        return Ok(());
    };
    bridge.set_voice_supported(voice_supported);
    info!(voice_supported, "host ready");

    let deps = AppDeps {
        config,
        content: Arc::new(catalog),
        surface: Arc::new(HubSurface::new(hub.clone())),
        audio: Arc::new(bridge.clone()),
        speech: Arc::new(bridge.clone()),
        voice: Arc::new(bridge.clone()),
        store: Arc::new(store),
    };
    let mut app = App::new(deps, StdRng::from_os_rng()).await;
    app.init();

    let (closed_tx, closed_rx) = oneshot::channel();
    let reader = tokio::spawn(read_lines(lines, bridge.clone(), app.sender(), closed_tx));

    app.run(async {
        tokio::select! {
            _ = closed_rx => info!("stdin closed; shutting down"),
            _ = shutdown_signal() => info!("signal received; shutting down"),
        }
    })
    .await;

    reader.abort();
    let _ = reader.await;
    drop(bridge);
    drop(hub);
    if timeout(WRITER_GRACE, writer).await.is_err() {
        debug!("writer still busy at shutdown");
    }

    Ok(())
}

/// Read lines until the host's `ready` message. Returns `None` on end of input.
async fn wait_for_ready<R>(lines: &mut Lines<R>) -> std::io::Result<Option<bool>>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        match parse(&line) {
            Some(HostMessage::Ready { voice_supported }) => return Ok(Some(voice_supported)),
            Some(other) => debug!(message = ?other, "ignoring message before ready"),
            None => {}
        }
    }
    Ok(None)
}

/// Forward host lines to the bridge and the controller until end of input.
async fn read_lines<R>(
    mut lines: Lines<R>,
    bridge: HostBridge,
    events: mpsc::UnboundedSender<AppEvent>,
    closed: oneshot::Sender<()>,
) where
    R: AsyncBufRead + Unpin,
{
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(message) = parse(&line) else {
                    continue;
                };
                if let Some(event) = bridge.route(message) {
                    if events.send(event).is_err() {
                        break;
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                error!(error = %err, "failed to read stdin");
                break;
            }
        }
    }
    let _ = closed.send(());
}

fn parse(line: &str) -> Option<HostMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(message) => Some(message),
        Err(err) => {
            warn!(error = %err, "ignoring malformed host line");
            None
        }
    }
}

/// Write surface events and host commands to stdout, one JSON document per line.
async fn write_lines(
    events: broadcast::Receiver<SurfaceEvent>,
    mut commands: mpsc::UnboundedReceiver<HostCommand>,
) {
    let mut events = BroadcastStream::new(events);
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            Some(event) = events.next() => match event {
                Ok(event) => serde_json::to_string(&OutboundLine::Surface(&event)),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "stdout lagging; surface events dropped");
                    continue;
                }
            },
            Some(command) = commands.recv() => serde_json::to_string(&OutboundLine::Host(&command)),
            else => break,
        };

        let mut line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed to serialize outbound line");
                continue;
            }
        };
        line.push('\n');
        if let Err(err) = stdout.write_all(line.as_bytes()).await {
            error!(error = %err, "failed to write stdout");
            break;
        }
        if let Err(err) = stdout.flush().await {
            error!(error = %err, "failed to flush stdout");
            break;
        }
    }
}

/// Configure tracing on stderr; stdout carries the host protocol.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
