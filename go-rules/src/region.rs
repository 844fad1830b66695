use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Point;
use crate::stone::Stone;

/// Index of a region in the board's region arena. Ids of discarded regions
/// are recycled, so an id is only meaningful until the next board mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub(crate) u32);

impl RegionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// Life-and-death status of a stone group while scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoneGroupState {
    #[default]
    Alive,
    Dead,
    Seki,
}

/// Transient attributes assigned while scoring. Reset when scoring ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoringMarks {
    /// Stone groups only.
    pub group_state: StoneGroupState,
    /// Who is credited with the points of this region. `None` is neutral.
    pub territory: Option<Stone>,
    /// Empty regions whose neighbors carry contradictory markings.
    pub inconsistent: bool,
}

/// Derived values cached while the board is in scoring mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCache {
    pub size: usize,
    pub liberties: usize,
    pub adjacent: Vec<RegionId>,
}

/// A maximal connected set of points that are either all empty or all
/// stones of one color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub(crate) points: Vec<Point>,
    pub(crate) color: Option<Stone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cache: Option<RegionCache>,
    #[serde(default)]
    pub(crate) marks: ScoringMarks,
}

impl Region {
    pub(crate) fn new(color: Option<Stone>, points: Vec<Point>) -> Self {
        Region {
            points,
            color,
            cache: None,
            marks: ScoringMarks::default(),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn color(&self) -> Option<Stone> {
        self.color
    }

    pub fn is_stone_group(&self) -> bool {
        self.color.is_some()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.points.contains(&point)
    }

    pub fn marks(&self) -> &ScoringMarks {
        &self.marks
    }

    pub fn cache(&self) -> Option<&RegionCache> {
        self.cache.as_ref()
    }

    pub fn is_dead(&self) -> bool {
        self.is_stone_group() && self.marks.group_state == StoneGroupState::Dead
    }

    pub fn is_seki(&self) -> bool {
        self.is_stone_group() && self.marks.group_state == StoneGroupState::Seki
    }
}
