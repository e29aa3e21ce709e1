use std::io::{Error, ErrorKind};
use std::sync::{Arc, Mutex};

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{error, info};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;

use knockout::board::{Board, Color, Move};
use knockout::engine::Automa;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 3999)]
    port: u16,
    /// Difficulty used when the client does not request one (2-4 minimax
    /// depth, 5 evolutionary).
    #[arg(long, default_value_t = 2)]
    difficulty: u8,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    simple_logger::init_with_level(log::Level::Info).unwrap();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let listener = TcpListener::bind(address.clone()).await.expect("Failed to bind");
    info!("Listening on: {}", address);

    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(accept_connection(stream, args.difficulty));
    }

    Ok(())
}

struct Game {
    started: bool,
    difficulty: u8,
    board: Board,
    automa: Automa,
}

impl Game {
    fn new(difficulty: u8) -> Self {
        Self {
            started: false,
            difficulty,
            board: new_board(),
            automa: Automa::new(),
        }
    }
}

/// Fresh board with a randomized starting player. The human plays P1, the
/// engine plays P2.
fn new_board() -> Board {
    let first_player = if rand::random::<bool>() { Color::P1 } else { Color::P2 };
    Board::new(first_player)
}

async fn accept_connection(stream: TcpStream, default_difficulty: u8) -> Result<(), Error> {
    let addr = stream.peer_addr()?;
    info!("Peer address: {}", addr);

    let ws_stream = tokio_tungstenite::accept_async(stream)
        .await
        .expect("Error during the websocket handshake occurred");
    info!("New WebSocket connection: {}", addr);

    let (mut write, mut read) = ws_stream.split();

    let game_mutex = Arc::new(Mutex::new(Game::new(default_difficulty)));

    while let Some(raw_message) = read.next().await {
        match raw_message {
            Ok(text_message) => {
                if !text_message.is_text() && !text_message.is_binary() {
                    continue;
                }
                match serde_json::from_slice::<Value>(&text_message.into_data()) {
                    Ok(data) => {
                        info!("Received: {}", data);
                        let result: Result<Value, Error> = handle_message(&game_mutex, data);
                        let response = match result {
                            Ok(resp) => resp,
                            Err(e) => {
                                error!("Error handling message: {:?}", e);
                                json!({"error": format!("{:?}", e)})
                            }
                        };
                        let response_str = response.to_string();
                        write
                            .send(Message::text(response_str.clone()))
                            .await
                            .expect(&format!("Failed to send message: {}", response_str));
                        info!("Sent: {}", response_str);
                    }
                    Err(e) => {
                        error!("Error parsing JSON: {:?}", e);
                    }
                }
            }
            Err(e) => {
                error!("Error reading websocket message: {:?}", e);
            }
        }
    }

    Ok(())
}

fn handle_message(game_mutex: &Arc<Mutex<Game>>, data: Value) -> Result<Value, Error> {
    let mut game = game_mutex.lock().unwrap();

    let map = data
        .as_object()
        .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Expected a dict"))?;

    // client message protocol: "start", "move"
    // server message protocol: "move", "board", "error", "end"
    if map.contains_key("start") {
        let difficulty = match &data["start"] {
            Value::Null => game.difficulty,
            value => value["difficulty"].as_u64().map_or(game.difficulty, |d| d as u8),
        };
        if !(2..=5).contains(&difficulty) {
            return Err(Error::new(ErrorKind::InvalidInput, "Difficulty must be 2-5"));
        }
        handle_start(&mut game, difficulty)
    } else if map.contains_key("move") {
        if !game.started {
            return Err(Error::new(ErrorKind::InvalidInput, "Game has not started yet"));
        }
        let mv: Move = serde_json::from_value(data["move"].clone())?;
        handle_move(&mut game, mv)
    } else {
        Err(Error::new(ErrorKind::InvalidInput, format!("Invalid message: {}", data)))
    }
}

fn handle_start(game: &mut Game, difficulty: u8) -> Result<Value, Error> {
    game.started = true;
    game.difficulty = difficulty;
    game.board = new_board();
    info!("New game at difficulty {}", difficulty);
    if game.board.turn_player() == Color::P1 {
        Ok(board_response(game, None))
    } else {
        make_engine_move(game)
    }
}

fn handle_move(game: &mut Game, mv: Move) -> Result<Value, Error> {
    if game.board.turn_player() != Color::P1 {
        return Err(Error::new(ErrorKind::InvalidInput, "Not your turn"));
    }
    // The client may only move its own pieces or the Hole, never the
    // engine's.
    let mover_allowed = game
        .board
        .piece_at(mv.from_row, mv.from_col)
        .is_some_and(|piece| game.board.is_turn(piece));
    if !mover_allowed {
        return Err(Error::new(ErrorKind::InvalidInput, "Not your piece"));
    }
    if !game.board.take_turn(mv.from_row, mv.from_col, mv.to_row, mv.to_col, false) {
        return Err(Error::new(ErrorKind::InvalidInput, "Illegal move"));
    }
    match check_game_over(game) {
        Some(game_over) => Ok(game_over),
        None => make_engine_move(game),
    }
}

fn make_engine_move(game: &mut Game) -> Result<Value, Error> {
    let difficulty = game.difficulty;
    let (score, mv) = game.automa.find_move(&mut game.board, difficulty);
    let Some(mv) = mv else {
        // Nothing playable for the engine and no pass rule exists, so the
        // game cannot continue; report it ended with no winner.
        info!("Engine has no legal move, game is stuck");
        return Ok(stalled_response(game));
    };
    info!("Engine plays {:?} (score {})", mv, score);
    if !game.board.take_turn(mv.from_row, mv.from_col, mv.to_row, mv.to_col, false) {
        return Err(Error::new(ErrorKind::Other, "Engine selected an illegal move"));
    }
    match check_game_over(game) {
        Some(game_over) => Ok(game_over),
        None => Ok(board_response(game, Some(mv))),
    }
}

fn stalled_response(game: &Game) -> Value {
    json!({
        "end": Value::Null,
        "board": game.board.to_string(),
        "p1_score": game.board.p1_score(),
        "p2_score": game.board.p2_score(),
    })
}

fn board_response(game: &Game, mv: Option<Move>) -> Value {
    json!({
        "move": mv,
        "board": game.board.to_string(),
        "turn": game.board.turn_player(),
        "p1_score": game.board.p1_score(),
        "p2_score": game.board.p2_score(),
    })
}

fn check_game_over(game: &Game) -> Option<Value> {
    game.board.winner().map(|winner| {
        json!({
            "end": winner,
            "board": game.board.to_string(),
            "p1_score": game.board.p1_score(),
            "p2_score": game.board.p2_score(),
        })
    })
}
