//! WebSocket transport: connection handling and room broadcast.

use crate::config::ServerConfig;
use crate::directory::{DirectoryError, PeerSender, Room, RoomDirectory};
use crate::protocol::{ClientMessage, EdgeCoords, ServerMessage};
use crate::room_id::{ROOM_ID_ALPHABET, RoomId};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use dotgrid_core::{Dot, PlayerId};
use futures::{SinkExt, StreamExt};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Shared state handed to every connection.
#[derive(Debug)]
pub struct AppState {
    /// Room registry.
    pub directory: RoomDirectory,
    /// Runtime configuration.
    pub config: ServerConfig,
}

impl AppState {
    /// Creates shared state from configuration.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            directory: RoomDirectory::new(config.max_grid_size),
            config,
        })
    }
}

/// Builds the router with the WebSocket endpoint.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .layer(tower::ServiceBuilder::new().map_request(
            |req: axum::http::Request<axum::body::Body>| {
                debug!(method = %req.method(), uri = %req.uri(), "incoming request");
                req
            },
        ))
        .with_state(state)
}

/// Binds the listener, starts the eviction sweeper, and serves forever.
///
/// # Errors
///
/// Fails when the listener cannot bind or the server loop aborts.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(config);
    let app = router(Arc::clone(&state));

    let sweeper_state = Arc::clone(&state);
    tokio::spawn(async move {
        let ttl = Duration::from_secs(sweeper_state.config.room_ttl_secs);
        let mut interval =
            tokio::time::interval(Duration::from_secs(sweeper_state.config.sweep_interval_secs));
        loop {
            interval.tick().await;
            let evicted = sweeper_state.directory.sweep(ttl);
            if evicted > 0 {
                info!(evicted, rooms = sweeper_state.directory.len(), "sweep finished");
            }
        }
    });

    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening for websocket connections at /ws");
    axum::serve(listener, app).await?;
    Ok(())
}

const PLAYER_ID_LEN: usize = 12;

/// Draws a connection-scoped player identity, the analogue of a socket
/// id: fresh per connection, never reused across reconnects.
fn connection_id<R: Rng + ?Sized>(rng: &mut R) -> PlayerId {
    let suffix: String = (0..PLAYER_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect();
    format!("conn-{suffix}")
}

#[instrument(skip(ws, state))]
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drives one client connection until it closes.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let player_id = connection_id(&mut rand::rng());
    info!(player_id, "client connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer task: drain the outbound queue into the socket.
    let writer_id = player_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let frame = match serde_json::to_string(&message) {
                Ok(frame) => frame,
                Err(error) => {
                    warn!(player_id = %writer_id, %error, "failed to encode frame");
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut conn = Connection {
        player_id: player_id.clone(),
        tx,
        joined: HashMap::new(),
        state,
    };

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(error) => {
                debug!(player_id, %error, "socket error");
                break;
            }
        };
        match frame {
            Message::Text(text) => conn.dispatch(text.as_str()),
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part of
            // the protocol.
            _ => {}
        }
    }

    conn.disconnect();
    writer.abort();
    info!(player_id, "client disconnected");
}

/// Per-connection state: identity, outbound queue, joined rooms.
struct Connection {
    player_id: PlayerId,
    tx: PeerSender,
    joined: HashMap<RoomId, Arc<Room>>,
    state: Arc<AppState>,
}

impl Connection {
    fn send(&self, message: ServerMessage) {
        let _ = self.tx.send(message);
    }

    /// Parses one frame and runs the request it carries.
    fn dispatch(&mut self, raw: &str) {
        let message: ClientMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(error) => {
                debug!(player_id = %self.player_id, %error, "unparseable frame");
                self.send(ServerMessage::bad_request(format!(
                    "unparseable message: {error}"
                )));
                return;
            }
        };
        match message {
            ClientMessage::CreateRoom { grid_size } => self.create_room(grid_size),
            ClientMessage::JoinRoom { room_id } => self.join_room(&room_id),
            ClientMessage::MakeMove { room_id, edge } => self.make_move(&room_id, edge),
            ClientMessage::LeaveRoom { room_id } => self.leave_room(&room_id),
        }
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    fn create_room(&mut self, grid_size: Option<u32>) {
        let grid_size = grid_size.unwrap_or(self.state.config.default_grid_size);
        match self.state.directory.create_room(&self.player_id, grid_size) {
            Ok((room_id, room)) => {
                room.attach_peer(&self.player_id, self.tx.clone());
                let state = room.snapshot();
                self.joined.insert(room_id.clone(), room);
                self.send(ServerMessage::RoomCreated { room_id, state });
            }
            Err(error) => {
                warn!(%error, "create_room failed");
                self.send(ServerMessage::from_directory_error(error));
            }
        }
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    fn join_room(&mut self, raw_room_id: &str) {
        let Ok(room_id) = RoomId::parse(raw_room_id) else {
            // An id that cannot exist is indistinguishable from a
            // missing room.
            self.send(ServerMessage::from_directory_error(
                DirectoryError::RoomNotFound,
            ));
            return;
        };
        match self.state.directory.join_room(&room_id, &self.player_id) {
            Ok((room, _seat)) => {
                room.attach_peer(&self.player_id, self.tx.clone());
                let state = room.snapshot();
                self.send(ServerMessage::RoomJoined {
                    state: state.clone(),
                });
                room.broadcast(&ServerMessage::GameUpdate { state });
                self.joined.insert(room_id, room);
            }
            Err(error) => {
                debug!(%error, "join_room failed");
                self.send(ServerMessage::from_directory_error(error));
            }
        }
    }

    #[instrument(skip(self, edge), fields(player_id = %self.player_id))]
    fn make_move(&mut self, raw_room_id: &str, edge: EdgeCoords) {
        let room = match self.lookup(raw_room_id) {
            Ok(room) => room,
            Err(reply) => {
                self.send(reply);
                return;
            }
        };
        let from = Dot::new(edge.x1, edge.y1);
        let to = Dot::new(edge.x2, edge.y2);
        let result = room.with_game(|game| game.attempt_move(&self.player_id, from, to));
        match result {
            Ok(outcome) => {
                debug!(
                    completed = outcome.completed_boxes,
                    next = %outcome.next_turn,
                    "move applied"
                );
                room.broadcast(&ServerMessage::GameUpdate {
                    state: room.snapshot(),
                });
            }
            Err(error) => {
                debug!(%error, "move rejected");
                self.send(ServerMessage::from_move_error(error));
            }
        }
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    fn leave_room(&mut self, raw_room_id: &str) {
        let Ok(room_id) = RoomId::parse(raw_room_id) else {
            self.send(ServerMessage::from_directory_error(
                DirectoryError::RoomNotFound,
            ));
            return;
        };
        if let Some(room) = self.joined.remove(&room_id) {
            self.depart(&room);
        }
    }

    fn lookup(&self, raw_room_id: &str) -> Result<Arc<Room>, ServerMessage> {
        let room_id = RoomId::parse(raw_room_id)
            .map_err(|_| ServerMessage::from_directory_error(DirectoryError::RoomNotFound))?;
        self.state
            .directory
            .get(&room_id)
            .ok_or_else(|| ServerMessage::from_directory_error(DirectoryError::RoomNotFound))
    }

    /// Removes this player from a room and tells the survivors.
    fn depart(&self, room: &Arc<Room>) {
        room.detach_peer(&self.player_id);
        room.with_game(|game| game.remove_player(&self.player_id));
        room.broadcast(&ServerMessage::GameUpdate {
            state: room.snapshot(),
        });
    }

    /// Cleans up every joined room when the socket goes away.
    fn disconnect(&mut self) {
        let rooms: Vec<Arc<Room>> = self.joined.drain().map(|(_, room)| room).collect();
        for room in rooms {
            self.depart(&room);
        }
    }
}
