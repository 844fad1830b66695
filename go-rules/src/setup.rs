use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Point;
use crate::board::Board;
use crate::error::GoError;
use crate::stone::Stone;

/// Stones forced onto or off the board by a node, independent of moves,
/// plus an optional override of who plays next.
///
/// A point appears in at most one of the three instruction lists. For every
/// listed point the state before the setup is remembered so the setup can
/// be reverted. `apply` and `revert` must alternate, starting with `apply`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSetup {
    black: Vec<Point>,
    white: Vec<Point>,
    no_stone: Vec<Point>,
    previous: Vec<(Point, Option<Stone>)>,
    first_move_color: Option<Stone>,
    applied: bool,
}

impl BoardSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty setup attached to a node that is already on the board.
    pub(crate) fn new_applied() -> Self {
        BoardSetup {
            applied: true,
            ..Self::default()
        }
    }

    // -- Accessors --

    pub fn black(&self) -> &[Point] {
        &self.black
    }

    pub fn white(&self) -> &[Point] {
        &self.white
    }

    pub fn no_stone(&self) -> &[Point] {
        &self.no_stone
    }

    pub fn first_move_color(&self) -> Option<Stone> {
        self.first_move_color
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// No stone instructions and no first move override.
    pub fn is_empty(&self) -> bool {
        self.black.is_empty()
            && self.white.is_empty()
            && self.no_stone.is_empty()
            && self.first_move_color.is_none()
    }

    /// The instructed state of `point`, if this setup touches it.
    pub fn target(&self, point: Point) -> Option<Option<Stone>> {
        if self.black.contains(&point) {
            Some(Some(Stone::Black))
        } else if self.white.contains(&point) {
            Some(Some(Stone::White))
        } else if self.no_stone.contains(&point) {
            Some(None)
        } else {
            None
        }
    }

    /// State of `point` before this setup, if this setup touches it.
    pub fn previous(&self, point: Point) -> Option<Option<Stone>> {
        self.previous
            .iter()
            .find(|(p, _)| *p == point)
            .map(|&(_, state)| state)
    }

    // -- Editing --

    /// Records that `point` should end up as `target`. `board_state` is the
    /// state of the point on the board right now; it is only used as the
    /// previous state when this setup does not touch the point yet.
    ///
    /// A target equal to the previous state removes the instruction.
    pub fn record(&mut self, point: Point, target: Option<Stone>, board_state: Option<Stone>) {
        self.forget(point);
        let previous = match self.previous(point) {
            Some(previous) => previous,
            None => {
                self.previous.push((point, board_state));
                board_state
            }
        };

        if target == previous {
            self.previous.retain(|(p, _)| *p != point);
            return;
        }
        match target {
            Some(Stone::Black) => self.black.push(point),
            Some(Stone::White) => self.white.push(point),
            None => self.no_stone.push(point),
        }
    }

    pub fn set_first_move_color(&mut self, color: Option<Stone>) {
        self.first_move_color = color;
    }

    fn forget(&mut self, point: Point) {
        self.black.retain(|&p| p != point);
        self.white.retain(|&p| p != point);
        self.no_stone.retain(|&p| p != point);
    }

    /// Adjusts the remembered previous states after the handicap stones
    /// below this setup changed. A new handicap point that this setup also
    /// makes black, or a removed one that this setup clears, is a
    /// contradiction and is reported without changing anything.
    pub fn update_for_handicap(&mut self, added: &[Point], removed: &[Point]) -> Result<(), GoError> {
        if let Some(point) = self.handicap_conflict(added, removed) {
            return Err(GoError::HandicapSetupConflict(point));
        }
        for (point, state) in &mut self.previous {
            if added.contains(point) {
                *state = Some(Stone::Black);
            } else if removed.contains(point) {
                *state = None;
            }
        }
        Ok(())
    }

    pub fn handicap_conflict(&self, added: &[Point], removed: &[Point]) -> Option<Point> {
        let added = added.iter().find(|p| self.black.contains(p));
        let removed = removed.iter().find(|p| self.no_stone.contains(p));
        added.or(removed).copied()
    }

    // -- Application --

    pub fn apply(&mut self, board: &mut Board) {
        assert!(!self.applied, "setup applied twice in a row");
        for &p in &self.no_stone {
            board.set_point(p, None);
        }
        for &p in &self.black {
            board.set_point(p, Some(Stone::Black));
        }
        for &p in &self.white {
            board.set_point(p, Some(Stone::White));
        }
        self.applied = true;
        debug!(
            black = self.black.len(),
            white = self.white.len(),
            cleared = self.no_stone.len(),
            "setup applied"
        );
    }

    pub fn revert(&mut self, board: &mut Board) {
        assert!(self.applied, "setup reverted before it was applied");
        for &(p, state) in &self.previous {
            if state.is_none() {
                board.set_point(p, None);
            }
        }
        for &(p, state) in &self.previous {
            if state.is_some() {
                board.set_point(p, state);
            }
        }
        self.applied = false;
        debug!("setup reverted");
    }
}
