use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use axum::extract::State;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use sapper_core::Millis;
use sapper_protocol::{ClientMessage, MatchSnapshot, ServerMessage};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{Args, GameHost, HostError, clock};

/// Cadence of the timeout check.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Every frame is a full snapshot, so a short backlog is enough.
const UPDATE_BACKLOG: usize = 16;

/// Error replies queued for one socket, further ones are dropped.
const REPLY_BACKLOG: usize = 8;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    host: Mutex<GameHost>,
    updates: broadcast::Sender<Utf8Bytes>,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(host: GameHost) -> SharedState {
        let (updates, _) = broadcast::channel(UPDATE_BACKLOG);
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            host: Mutex::new(host),
            updates,
            shutdown,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Utf8Bytes> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        self.host().snapshot()
    }

    /// Decodes and applies one client frame, broadcasting the new state if anything changed.
    pub fn apply_frame(&self, text: &str, now: Millis) -> Result<(), HostError> {
        let action = ClientMessage::from_json(text)?;
        log::debug!("Client action: {:?}", action);

        let mut host = self.host();
        let applied = host.on_client_action(action, now)?;
        if applied.changed {
            // published under the lock so subscribers see states in the order they happened
            self.publish(applied.snapshot);
        }
        Ok(())
    }

    /// Runs one timeout check, returns whether the match expired.
    pub fn tick(&self, now: Millis) -> bool {
        let mut host = self.host();
        match host.on_tick(now) {
            Some(snapshot) => {
                self.publish(snapshot);
                true
            }
            None => false,
        }
    }

    /// Stops the ticker and closes every socket.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn host(&self) -> MutexGuard<'_, GameHost> {
        self.host.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: MatchSnapshot) {
        let Some(frame) = encode(&ServerMessage::from(snapshot)) else {
            return;
        };
        // an error only means nobody is connected
        let sockets = self.updates.send(frame).unwrap_or(0);
        log::trace!("Broadcast state to {} sockets", sockets);
    }
}

fn encode(message: &ServerMessage) -> Option<Utf8Bytes> {
    match message.to_json() {
        Ok(json) => Some(json.into()),
        Err(err) => {
            log::error!("Could not encode {:?}: {}", message, err);
            None
        }
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/state", get(current_state))
        .with_state(state)
}

async fn current_state(State(state): State<SharedState>) -> Json<MatchSnapshot> {
    Json(state.snapshot())
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sink, mut stream) = socket.split();
    // subscribe first so nothing published after the initial snapshot is missed
    let mut updates = state.subscribe();
    let mut shutdown = state.shutdown.subscribe();
    let (replies, mut pending_replies) = mpsc::channel::<Utf8Bytes>(REPLY_BACKLOG);

    log::debug!("Socket connected");
    if let Some(frame) = encode(&ServerMessage::from(state.snapshot())) {
        if sink.send(Message::Text(frame)).await.is_err() {
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                update = updates.recv() => match update {
                    Ok(frame) => frame,
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Socket fell {} states behind, skipping ahead", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                Some(reply) = pending_replies.recv() => reply,
                _ = shutdown.changed() => break,
            };
            if sink.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => {
                    if let Err(err) = state.apply_frame(text.as_str(), clock::now_millis()) {
                        log::warn!("Rejected frame {:?}: {}", text.as_str(), err);
                        queue_reply(&replies, err.to_string());
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    log::debug!("Socket disconnected");
}

/// Queues an error frame for the sender only, returns `false` when it was dropped.
fn queue_reply(replies: &mpsc::Sender<Utf8Bytes>, message: String) -> bool {
    let Some(frame) = encode(&ServerMessage::Error { message }) else {
        return false;
    };
    match replies.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            log::debug!("Reply queue full, dropping error frame");
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// Spawns the 1-second timeout check, it runs until [`AppState::shutdown`].
pub fn spawn_ticker(state: SharedState, now: impl Fn() -> Millis + Send + 'static) -> JoinHandle<()> {
    let mut shutdown = state.shutdown.subscribe();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if state.tick(now()) {
                        log::debug!("Broadcast timeout");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        log::debug!("Ticker stopped");
    })
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.board_config().context("Invalid board arguments")?;
    let seed = args.seed.unwrap_or_else(clock::clock_seed);
    log::debug!("seed: {}", seed);

    let host = GameHost::new(config, seed, args.snapshot_mode(), clock::now_millis());
    let state = AppState::new(host);
    let ticker = spawn_ticker(state.clone(), clock::now_millis);

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Could not bind {}", args.listen))?;
    log::info!("Listening on {}", listener.local_addr()?);

    let signal_state = state.clone();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::error!("Could not listen for Ctrl-C: {}", err);
                std::future::pending::<()>().await;
            }
            log::info!("Shutting down");
            signal_state.shutdown();
        })
        .await
        .context("Server stopped with an error")?;

    ticker.await.context("Ticker task failed")?;
    Ok(())
}
