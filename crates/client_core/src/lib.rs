pub mod config;
pub mod error;
pub mod framebuffer;
pub mod gate;
pub mod input;
pub mod render;
pub mod session;
pub mod view_store;

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, Stream, StreamExt};
use shared::{
    domain::{Direction, MoveIntent},
    protocol::{ClientRequest, ServerEvent},
};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

pub use config::{load_settings, ClientSettings};
pub use error::ClientError;
pub use framebuffer::Framebuffer;
pub use gate::{GateState, LockReason, MoveRejection, MovementGate};
pub use input::direction_for_key;
pub use render::{IncrementalRenderer, Palette, Repaint, Rgb, Surface};
pub use session::{ClientEvent, GameSession, SessionIdentity, TrialInfo};
pub use view_store::ViewStore;

const EVENT_CAPACITY: usize = 256;
const COMMAND_CAPACITY: usize = 64;

#[async_trait]
pub trait GameHandle: Send + Sync {
    async fn move_piece(&self, direction: Direction) -> Result<()>;
    async fn shutdown(&self) -> Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
}

#[derive(Debug)]
enum ClientCommand {
    Move(Direction),
    Shutdown,
}

pub struct GameClient {
    commands: mpsc::Sender<ClientCommand>,
    events: broadcast::Sender<ClientEvent>,
    // Held from before the join is sent so the first subscriber sees the trial start.
    first_subscriber: Mutex<Option<broadcast::Receiver<ClientEvent>>>,
}

/// `http(s)://host` becomes `ws(s)://host/ws?room_code=..&player_id=..`.
pub fn websocket_url(server_url: &str, identity: &SessionIdentity) -> Result<Url, ClientError> {
    let invalid = || ClientError::InvalidServerUrl(server_url.to_string());
    let mut url = Url::parse(server_url.trim()).map_err(|_| invalid())?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(invalid()),
    };
    url.set_scheme(scheme).map_err(|_| invalid())?;
    url.set_path("/ws");
    url.query_pairs_mut()
        .clear()
        .append_pair("room_code", identity.room_code.as_str())
        .append_pair("player_id", identity.player_id.as_str());
    Ok(url)
}

impl GameClient {
    pub async fn connect<S>(
        settings: &ClientSettings,
        identity: SessionIdentity,
        surface: Option<S>,
    ) -> Result<Arc<Self>>
    where
        S: Surface + Send + 'static,
    {
        let ws_url = websocket_url(&settings.server_url, &identity)?;
        let (ws_stream, _) = connect_async(ws_url.as_str())
            .await
            .with_context(|| format!("failed to connect websocket: {ws_url}"))?;
        info!(room_code = %identity.room_code, player_id = %identity.player_id, "connected to game server");
        let (mut ws_writer, ws_reader) = ws_stream.split();

        let session = match surface {
            Some(surface) => GameSession::with_surface(identity, settings, surface),
            None => GameSession::new(identity, settings),
        };

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<ClientRequest>(COMMAND_CAPACITY);
        tokio::spawn(async move {
            while let Some(request) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&request) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(error = %err, "failed to encode client request");
                        continue;
                    }
                };
                if let Err(err) = ws_writer.send(Message::Text(text)).await {
                    warn!(error = %err, "websocket write failed");
                    break;
                }
            }
            let _ = ws_writer.close().await;
        });

        for request in session.join_requests() {
            outbound_tx
                .send(request)
                .await
                .map_err(|_| anyhow!(ClientError::SessionClosed))?;
        }

        let (events, first_rx) = broadcast::channel(EVENT_CAPACITY);
        let (commands, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        tokio::spawn(run_session(
            session,
            ws_reader,
            commands_rx,
            outbound_tx,
            events.clone(),
        ));

        Ok(Arc::new(Self {
            commands,
            events,
            first_subscriber: Mutex::new(Some(first_rx)),
        }))
    }

    async fn send_command(&self, command: ClientCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!(ClientError::SessionClosed))
    }
}

#[async_trait]
impl GameHandle for GameClient {
    async fn move_piece(&self, direction: Direction) -> Result<()> {
        self.send_command(ClientCommand::Move(direction)).await
    }

    async fn shutdown(&self) -> Result<()> {
        self.send_command(ClientCommand::Shutdown).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        let first = self
            .first_subscriber
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        first.unwrap_or_else(|| self.events.subscribe())
    }
}

async fn run_session<S, R, E>(
    mut session: GameSession<S>,
    mut ws_reader: R,
    mut commands: mpsc::Receiver<ClientCommand>,
    outbound: mpsc::Sender<ClientRequest>,
    events: broadcast::Sender<ClientEvent>,
) where
    S: Surface,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    loop {
        tokio::select! {
            frame = ws_reader.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => {
                        for client_event in session.handle_server_event(event) {
                            let _ = events.send(client_event);
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "invalid server event");
                        let _ = events.send(ClientEvent::Error(format!("invalid server event: {err}")));
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("game server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(error = %err, "websocket read failed");
                    let _ = events.send(ClientEvent::Error(format!("websocket error: {err}")));
                    break;
                }
            },
            command = commands.recv() => match command {
                Some(ClientCommand::Move(direction)) => {
                    let request = match session.try_move(direction, Instant::now()) {
                        Ok(request) => request,
                        Err(reason) => {
                            debug!(?direction, ?reason, "move not sent");
                            continue;
                        }
                    };
                    let intent = match &request {
                        ClientRequest::Move { role, delta, .. } => Some(MoveIntent { role: *role, delta: *delta }),
                        _ => None,
                    };
                    if outbound.send(request).await.is_err() {
                        warn!("websocket writer stopped");
                        break;
                    }
                    if let Some(intent) = intent {
                        let _ = events.send(ClientEvent::IntentSent(intent));
                    }
                }
                Some(ClientCommand::Shutdown) | None => {
                    info!("game session shutting down");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
