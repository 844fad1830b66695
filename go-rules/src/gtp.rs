use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use tracing::{debug, warn};

use crate::Point;
use crate::error::GoError;
use crate::game::Game;
use crate::game_move::Move;
use crate::grid::Grid;
use crate::stone::Stone;

/// An external engine that answers a sequence of GTP commands, one per line,
/// with the concatenated responses.
pub trait DeadStoneEngine: Send + 'static {
    fn execute(&mut self, commands: &str) -> Result<String, GoError>;
}

impl<F> DeadStoneEngine for F
where
    F: FnMut(&str) -> Result<String, GoError> + Send + 'static,
{
    fn execute(&mut self, commands: &str) -> Result<String, GoError> {
        self(commands)
    }
}

fn color_name(stone: Stone) -> &'static str {
    match stone {
        Stone::Black => "black",
        Stone::White => "white",
    }
}

fn play_command(grid: &Grid, mv: &Move) -> String {
    let vertex = match mv.point {
        Some(point) => grid.vertex(point),
        None => "pass".to_string(),
    };
    format!("play {} {}", color_name(mv.player), vertex)
}

/// Commands that recreate the current position of `game` in an engine and
/// ask it which stones are dead.
///
/// Moves are replayed when the line has no setup. Otherwise the stones on
/// the board are placed one by one, which never captures because the
/// position is legal.
pub fn dead_stones_request(game: &Game) -> Result<String, GoError> {
    let grid = game.grid();
    if !grid.is_square() {
        return Err(GoError::Engine(format!(
            "GTP cannot describe a {}x{} board",
            grid.cols(),
            grid.rows()
        )));
    }

    let mut commands = vec![
        format!("boardsize {}", grid.cols()),
        "clear_board".to_string(),
        format!("komi {}", game.komi()),
    ];
    if game.has_setup() {
        for (point, stone) in game.board().stones() {
            commands.push(format!("play {} {}", color_name(stone), grid.vertex(point)));
        }
    } else {
        if !game.handicap_points().is_empty() {
            let vertices: Vec<String> = game.handicap_points().iter().map(|&p| grid.vertex(p)).collect();
            commands.push(format!("set_free_handicap {}", vertices.join(" ")));
        }
        commands.extend(game.moves().map(|mv| play_command(grid, mv)));
    }
    commands.push("final_status_list dead".to_string());

    debug!(commands = commands.len(), "dead stone request built");
    let mut request = commands.join("\n");
    request.push('\n');
    Ok(request)
}

/// Strips the `=` or `?` marker and an optional numeric id.
fn response_body(block: &str) -> &str {
    block[1..].trim_start_matches(|c: char| c.is_ascii_digit()).trim()
}

/// Parses the engine's answer to a request built by `dead_stones_request`.
/// Responses are separated by blank lines; any failure response fails the
/// whole estimate and the last response lists the dead stones.
pub fn parse_dead_stones_response(grid: &Grid, response: &str) -> Result<Vec<Point>, GoError> {
    let normalized = response.replace("\r\n", "\n");
    let blocks: Vec<&str> = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect();

    if let Some(failure) = blocks.iter().find(|b| b.starts_with('?')) {
        return Err(GoError::Engine(response_body(failure).to_string()));
    }
    let last = match blocks.last() {
        Some(block) if block.starts_with('=') => *block,
        _ => return Err(GoError::Engine("malformed response".to_string())),
    };

    let mut points = Vec::new();
    for vertex in response_body(last).split_whitespace() {
        let point = grid
            .parse_vertex(vertex)
            .ok_or_else(|| GoError::Engine(format!("invalid vertex {vertex}")))?;
        if !points.contains(&point) {
            points.push(point);
        }
    }
    Ok(points)
}

/// A dead stone estimate running on a worker thread.
///
/// The query can be abandoned at any time; the worker then finishes on its
/// own and its answer is dropped.
pub struct DeadStoneQuery {
    grid: Grid,
    receiver: Receiver<Result<String, GoError>>,
    cancelled: Arc<AtomicBool>,
}

impl DeadStoneQuery {
    pub fn start(mut engine: impl DeadStoneEngine, grid: Grid, request: String) -> Self {
        let (tx, rx) = bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::spawn(move || {
            let result = engine.execute(&request);
            if flag.load(Ordering::Acquire) {
                warn!("dead stone estimate finished after it was abandoned");
                return;
            }
            let _ = tx.send(result);
        });
        debug!("dead stone query started");
        DeadStoneQuery {
            grid,
            receiver: rx,
            cancelled,
        }
    }

    fn finish(&self, result: Result<String, GoError>) -> Result<Vec<Point>, GoError> {
        let points = result.and_then(|response| parse_dead_stones_response(&self.grid, &response));
        if let Err(e) = &points {
            warn!(error = %e, "dead stone estimate failed");
        }
        points
    }

    /// Blocks until the engine answers.
    pub fn wait(self) -> Result<Vec<Point>, GoError> {
        let result = self
            .receiver
            .recv()
            .unwrap_or_else(|_| Err(GoError::Engine("engine worker stopped".to_string())));
        self.finish(result)
    }

    /// The answer if the engine already gave one.
    pub fn try_result(&self) -> Option<Result<Vec<Point>, GoError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(self.finish(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(self.finish(Err(GoError::Engine("engine worker stopped".to_string()))))
            }
        }
    }

    /// Abandons the estimate. Scoring proceeds with every stone alive.
    pub fn cancel(self) {
        self.cancelled.store(true, Ordering::Release);
        warn!("dead stone estimate abandoned");
    }
}
