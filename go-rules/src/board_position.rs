use serde::{Deserialize, Serialize};
use tracing::debug;

/// One single-position transition performed while moving to a new position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStep {
    /// Apply the node at this index of the active line.
    Apply(usize),
    /// Revert the node at this index of the active line.
    Revert(usize),
}

/// Index into the active line of nodes. Position 0 is the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPosition {
    current: usize,
    number_of_positions: usize,
}

impl BoardPosition {
    pub fn new() -> Self {
        BoardPosition {
            current: 0,
            number_of_positions: 1,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn number_of_positions(&self) -> usize {
        self.number_of_positions
    }

    pub fn last(&self) -> usize {
        self.number_of_positions - 1
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current == self.last()
    }

    /// The current position must stay inside the new range.
    pub(crate) fn set_number_of_positions(&mut self, count: usize) {
        assert!(count >= 1, "there is always at least one position");
        assert!(
            self.current < count,
            "board position {} would fall outside 0..{count}",
            self.current
        );
        self.number_of_positions = count;
    }

    /// Walks to `target` one node at a time, calling `step` for each node
    /// that has to be applied or reverted. Returns whether the position
    /// changed.
    ///
    /// Panics if `target` is out of range.
    pub fn set_position(&mut self, target: usize, mut step: impl FnMut(PositionStep)) -> bool {
        assert!(
            target < self.number_of_positions,
            "board position {target} is out of range 0..{}",
            self.number_of_positions
        );
        if target == self.current {
            return false;
        }
        let from = self.current;
        while self.current < target {
            self.current += 1;
            step(PositionStep::Apply(self.current));
        }
        while self.current > target {
            step(PositionStep::Revert(self.current));
            self.current -= 1;
        }
        debug!(from, to = target, "board position changed");
        true
    }
}

impl Default for BoardPosition {
    fn default() -> Self {
        Self::new()
    }
}
