use std::fmt;
use std::ops::{BitXor, BitXorAssign};

use once_cell::sync::Lazy;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::grid::MAX_BOARD_SIZE;
use crate::stone::Stone;

const SEED: u64 = 0x5EC1_60BA_2D0F_1A77;
const SLOTS: usize = MAX_BOARD_SIZE as usize * MAX_BOARD_SIZE as usize;

/// One key per (intersection, color). Keys are laid out on a
/// `MAX_BOARD_SIZE`-wide grid so a point hashes the same on every board size.
static KEYS: Lazy<Vec<u64>> = Lazy::new(|| {
    let mut rng = Xoshiro256StarStar::seed_from_u64(SEED);
    (0..2 * SLOTS).map(|_| rng.next_u64()).collect()
});

/// Order-independent fingerprint of board occupancy.
///
/// Placing and removing a stone are the same XOR, so the hash after any
/// sequence of changes only depends on which stones end up on the board.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionHash(u64);

impl PositionHash {
    pub const EMPTY: PositionHash = PositionHash(0);

    pub fn for_stone(stone: Stone, (col, row): Point) -> Self {
        let slot = row as usize * MAX_BOARD_SIZE as usize + col as usize;
        PositionHash(KEYS[stone.index() * SLOTS + slot])
    }

    /// Recalculates the hash of a whole position from scratch.
    pub fn of_stones(stones: impl IntoIterator<Item = (Point, Stone)>) -> Self {
        stones
            .into_iter()
            .fold(PositionHash::EMPTY, |hash, (point, stone)| {
                hash ^ PositionHash::for_stone(stone, point)
            })
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PositionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionHash({:#018x})", self.0)
    }
}

impl BitXor for PositionHash {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        PositionHash(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for PositionHash {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}
