use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Point;
use crate::board::Board;
use crate::stone::Stone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    Play,
    Pass,
}

impl std::str::FromStr for MoveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(MoveKind::Play),
            "pass" => Ok(MoveKind::Pass),
            _ => Err(format!("invalid move: {s}")),
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveKind::Play => write!(f, "play"),
            MoveKind::Pass => write!(f, "pass"),
        }
    }
}

/// One ply. A play remembers the stones it captured so it can be reverted.
///
/// `do_it` and `undo` must alternate, starting with `do_it`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub kind: MoveKind,
    pub player: Stone,
    pub point: Option<Point>,
    captured: Vec<Point>,
    applied: bool,
}

impl Move {
    pub fn play(player: Stone, point: Point) -> Self {
        Move {
            kind: MoveKind::Play,
            player,
            point: Some(point),
            captured: Vec::new(),
            applied: false,
        }
    }

    pub fn pass(player: Stone) -> Self {
        Move {
            kind: MoveKind::Pass,
            player,
            point: None,
            captured: Vec::new(),
            applied: false,
        }
    }

    pub fn is_play(&self) -> bool {
        self.kind == MoveKind::Play
    }

    pub fn is_pass(&self) -> bool {
        self.kind == MoveKind::Pass
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Points of opposing stones removed by this move. Empty until applied.
    pub fn captured(&self) -> &[Point] {
        &self.captured
    }

    /// Same ply, ignoring application state.
    pub fn same_ply(&self, other: &Move) -> bool {
        self.kind == other.kind && self.player == other.player && self.point == other.point
    }

    /// Places the stone and removes every opposing group left without
    /// liberties. The move must be legal.
    pub fn do_it(&mut self, board: &mut Board) {
        assert!(!self.applied, "move applied twice in a row");
        self.captured.clear();
        if let Some(point) = self.point {
            board.place_stone(point, self.player);
            for n in board.grid().neighbors(point) {
                if board.stone_at(n) != Some(self.player.opp()) {
                    continue;
                }
                let group = board.region_of(n);
                if board.liberties(group) == 0 {
                    self.captured.extend(board.capture(group));
                }
            }
        }
        self.applied = true;
        debug!(%self, captured = self.captured.len(), "move applied");
    }

    /// Takes the stone back and restores the captured stones.
    pub fn undo(&mut self, board: &mut Board) {
        assert!(self.applied, "move reverted before it was applied");
        if let Some(point) = self.point {
            board.remove_stone(point);
            for &p in &self.captured {
                board.place_stone(p, self.player.opp());
            }
        }
        self.applied = false;
        debug!(%self, "move reverted");
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.point {
            Some((col, row)) => write!(f, "{} {} ({col}, {row})", self.player, self.kind),
            None => write!(f, "{} {}", self.player, self.kind),
        }
    }
}
