use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;
use std::ops::Neg;

/// Color of a stone, and of the player who owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize_repr, Deserialize_repr)]
#[repr(i8)]
pub enum Stone {
    Black = 1,
    White = -1,
}

impl Stone {
    pub const BOTH: [Stone; 2] = [Stone::Black, Stone::White];

    pub fn opp(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }

    /// Dense index (Black = 0, White = 1) for per-color tables.
    pub fn index(self) -> usize {
        match self {
            Stone::Black => 0,
            Stone::White => 1,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Stone::Black => "B",
            Stone::White => "W",
        }
    }

    /// Parses a GTP color argument ("b", "black", "W", ...).
    pub fn from_gtp(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Stone::Black),
            "w" | "white" => Some(Stone::White),
            _ => None,
        }
    }
}

impl Neg for Stone {
    type Output = Self;

    fn neg(self) -> Self {
        self.opp()
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::Black => write!(f, "Black"),
            Stone::White => write!(f, "White"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_and_negation_agree() {
        for stone in Stone::BOTH {
            assert_eq!(-stone, stone.opp());
            assert_ne!(stone, stone.opp());
        }
    }

    #[test]
    fn dense_indices() {
        assert_eq!(Stone::Black.index(), 0);
        assert_eq!(Stone::White.index(), 1);
    }

    #[test]
    fn gtp_colors() {
        assert_eq!(Stone::from_gtp("b"), Some(Stone::Black));
        assert_eq!(Stone::from_gtp("WHITE"), Some(Stone::White));
        assert_eq!(Stone::from_gtp("x"), None);
    }

    #[test]
    fn serializes_as_signed_int() {
        assert_eq!(serde_json::to_string(&Stone::Black).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Stone::White).unwrap(), "-1");
        let white: Stone = serde_json::from_str("-1").unwrap();
        assert_eq!(white, Stone::White);
    }
}
