pub mod board;
pub mod board_position;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod game_move;
pub mod game_tree;
pub mod grid;
pub mod gtp;
pub mod handicap;
pub mod region;
pub mod rules;
pub mod score;
pub mod setup;
pub mod stone;
pub mod zobrist;

pub type Point = (u8, u8);

pub use board::Board;
pub use board_position::{BoardPosition, PositionStep};
pub use config::GameConfig;
pub use error::{GoError, IllegalMoveReason, IllegalSetupReason};
pub use events::{Event, EventBus, Topic};
pub use game::{Game, GameEndReason, GameState};
pub use game_move::{Move, MoveKind};
pub use game_tree::{GameTree, NodeId, ROOT, TreeNode};
pub use grid::Grid;
pub use region::{Region, RegionId, StoneGroupState};
pub use rules::Rules;
pub use score::{GameResult, Score};
pub use setup::BoardSetup;
pub use stone::Stone;
pub use zobrist::PositionHash;
