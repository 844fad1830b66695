use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Point;

/// Why a play is not legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalMoveReason {
    Occupied,
    Suicide,
    SimpleKo,
    Superko,
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMoveReason::Occupied => write!(f, "intersection is occupied"),
            IllegalMoveReason::Suicide => write!(f, "suicide"),
            IllegalMoveReason::SimpleKo => write!(f, "ko violation"),
            IllegalMoveReason::Superko => write!(f, "superko violation"),
        }
    }
}

/// Why placing a setup stone is not legal. Setup never captures, so every
/// variant describes a stone group that would be left without liberties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalSetupReason {
    /// The setup stone on its own has no liberties.
    SuicideSetupStone,
    /// The setup stone takes the last liberty of the friendly group it joins.
    SuicideFriendlyStoneGroup,
    /// The setup stone takes the last liberty of an adjacent opposing group.
    SuicideOpposingStoneGroup,
    /// Replacing an opposing stone splits its group and leaves a part of it
    /// without liberties.
    SuicideOpposingColorSubgroup,
}

impl fmt::Display for IllegalSetupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalSetupReason::SuicideSetupStone => write!(f, "setup stone has no liberties"),
            IllegalSetupReason::SuicideFriendlyStoneGroup => {
                write!(f, "setup stone takes the last liberty of its own group")
            }
            IllegalSetupReason::SuicideOpposingStoneGroup => {
                write!(f, "setup stone takes the last liberty of an opposing group")
            }
            IllegalSetupReason::SuicideOpposingColorSubgroup => {
                write!(f, "setup stone leaves part of an opposing group without liberties")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoError {
    #[error("board size {cols}x{rows} is not supported")]
    InvalidBoardSize { cols: u8, rows: u8 },
    #[error("handicap {count} is not possible on a {cols}x{rows} board")]
    InvalidHandicap { count: u8, cols: u8, rows: u8 },
    #[error("point {0:?} is not on the board")]
    NotOnBoard(Point),
    #[error("illegal move: {0}")]
    IllegalMove(IllegalMoveReason),
    #[error("illegal board setup: {0}")]
    IllegalSetup(IllegalSetupReason),
    #[error("handicap point {0:?} conflicts with the board setup")]
    HandicapSetupConflict(Point),
    #[error("the game has ended")]
    GameHasEnded,
    #[error("the game has not ended")]
    GameHasNotEnded,
    #[error("the board is not at the last position")]
    NotAtLastPosition,
    #[error("moves have already been played")]
    MovesExist,
    #[error("there is nothing to undo")]
    NothingToUndo,
    #[error("scoring is in progress")]
    ScoringInProgress,
    #[error("scoring is not enabled")]
    ScoringNotEnabled,
    #[error("there is no stone at {0:?}")]
    NoStone(Point),
    #[error("the game was decided and cannot be resumed")]
    CannotResume,
    #[error("the next move color cannot be switched")]
    CannotSwitchNextMoveColor,
    #[error("node {0} is not part of the game tree")]
    UnknownNode(usize),
    #[error("background calculation failed")]
    CalculationFailed,
    #[error("engine error: {0}")]
    Engine(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl From<IllegalMoveReason> for GoError {
    fn from(reason: IllegalMoveReason) -> Self {
        GoError::IllegalMove(reason)
    }
}

impl From<IllegalSetupReason> for GoError {
    fn from(reason: IllegalSetupReason) -> Self {
        GoError::IllegalSetup(reason)
    }
}
