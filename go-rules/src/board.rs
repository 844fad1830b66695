use std::collections::BTreeSet;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::Point;
use crate::error::{GoError, IllegalSetupReason};
use crate::grid::Grid;
use crate::region::{Region, RegionCache, RegionId, ScoringMarks};
use crate::stone::Stone;
use crate::zobrist::PositionHash;

/// Point grid plus the partition of all points into regions.
///
/// Every point belongs to exactly one region. Regions are kept maximal and
/// uniform by the mutating operations: placing a stone splits the empty
/// region it lands in and merges neighboring friendly groups, removing a
/// stone does the reverse. Splits are found by flood fill from the former
/// neighbors of the changed point.
///
/// The position hash is updated on every stone change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    grid: Grid,
    stones: Vec<Option<Stone>>,
    owners: Vec<RegionId>,
    regions: Vec<Option<Region>>,
    free: Vec<RegionId>,
    hash: PositionHash,
    scoring_mode: bool,
}

impl Board {
    /// An empty board: a single empty region covering every point.
    pub fn new(grid: Grid) -> Self {
        Board {
            grid,
            stones: vec![None; grid.area()],
            owners: vec![RegionId(0); grid.area()],
            regions: vec![Some(Region::new(None, grid.points().collect()))],
            free: Vec::new(),
            hash: PositionHash::EMPTY,
            scoring_mode: false,
        }
    }

    pub fn with_dimensions(cols: u8, rows: u8) -> Result<Self, GoError> {
        Ok(Self::new(Grid::new(cols, rows)?))
    }

    /// Build a board from an ASCII layout. `B` = Black, `W` = White, anything
    /// else is empty. Row 0 is the top row.
    pub fn from_layout(layout: &[&str]) -> Result<Self, GoError> {
        let rows = layout.len();
        let cols = layout.first().map_or(0, |row| row.chars().count());
        if let Some(row) = layout.iter().position(|row| row.chars().count() != cols) {
            return Err(GoError::Config(format!(
                "board layout row {row} does not have {cols} points"
            )));
        }
        let (cols, rows) = match (u8::try_from(cols), u8::try_from(rows)) {
            (Ok(cols), Ok(rows)) => (cols, rows),
            _ => return Err(GoError::InvalidBoardSize { cols: u8::MAX, rows: u8::MAX }),
        };

        let mut board = Board::with_dimensions(cols, rows)?;
        for (row, line) in layout.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                let stone = match c {
                    'B' => Stone::Black,
                    'W' => Stone::White,
                    _ => continue,
                };
                board.place_stone((col as u8, row as u8), stone);
            }
        }
        Ok(board)
    }

    // -- Accessors --

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cols(&self) -> u8 {
        self.grid.cols()
    }

    pub fn rows(&self) -> u8 {
        self.grid.rows()
    }

    pub fn hash(&self) -> PositionHash {
        self.hash
    }

    pub fn is_scoring_mode(&self) -> bool {
        self.scoring_mode
    }

    pub fn stone_at(&self, point: Point) -> Option<Stone> {
        if self.grid.on_board(point) {
            self.stones[self.grid.index(point)]
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stones.iter().all(Option::is_none)
    }

    /// All stones on the board in row-major order.
    pub fn stones(&self) -> impl Iterator<Item = (Point, Stone)> + '_ {
        self.stones
            .iter()
            .enumerate()
            .filter_map(|(i, stone)| stone.map(|s| (self.grid.point(i), s)))
    }

    pub fn stone_count(&self, stone: Stone) -> usize {
        self.stones.iter().filter(|&&s| s == Some(stone)).count()
    }

    /// Hash of the current occupancy computed from scratch.
    pub fn recalculate_hash(&self) -> PositionHash {
        PositionHash::of_stones(self.stones())
    }

    // -- Region queries --

    pub fn region_of(&self, point: Point) -> RegionId {
        self.owners[self.grid.index(point)]
    }

    pub fn region(&self, id: RegionId) -> &Region {
        match self.regions.get(id.index()) {
            Some(Some(region)) => region,
            _ => panic!("{id} does not exist"),
        }
    }

    fn region_mut(&mut self, id: RegionId) -> &mut Region {
        match self.regions.get_mut(id.index()) {
            Some(Some(region)) => region,
            _ => panic!("{id} does not exist"),
        }
    }

    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &Region)> + '_ {
        self.regions
            .iter()
            .enumerate()
            .filter_map(|(i, region)| region.as_ref().map(|r| (RegionId(i as u32), r)))
    }

    pub fn region_ids(&self) -> Vec<RegionId> {
        self.regions().map(|(id, _)| id).collect()
    }

    pub fn region_count(&self) -> usize {
        self.regions.iter().flatten().count()
    }

    pub fn size(&self, id: RegionId) -> usize {
        let region = self.region(id);
        region.cache.as_ref().map_or(region.size(), |cache| cache.size)
    }

    pub fn is_stone_group(&self, id: RegionId) -> bool {
        self.region(id).is_stone_group()
    }

    pub fn color(&self, id: RegionId) -> Option<Stone> {
        self.region(id).color
    }

    /// Number of distinct empty points adjacent to a stone group. Empty
    /// regions have no liberties.
    pub fn liberties(&self, id: RegionId) -> usize {
        let region = self.region(id);
        match &region.cache {
            Some(cache) => cache.liberties,
            None => self.count_liberties(region),
        }
    }

    /// The distinct regions bordering any point of `id`, in id order.
    pub fn adjacent_regions(&self, id: RegionId) -> Vec<RegionId> {
        let region = self.region(id);
        match &region.cache {
            Some(cache) => cache.adjacent.clone(),
            None => self.find_adjacent(id, region),
        }
    }

    fn count_liberties(&self, region: &Region) -> usize {
        if !region.is_stone_group() {
            return 0;
        }
        let mut seen = vec![false; self.grid.area()];
        let mut count = 0;
        for &p in &region.points {
            for n in self.grid.neighbors(p) {
                let ni = self.grid.index(n);
                if self.stones[ni].is_none() && !seen[ni] {
                    seen[ni] = true;
                    count += 1;
                }
            }
        }
        count
    }

    fn find_adjacent(&self, id: RegionId, region: &Region) -> Vec<RegionId> {
        let mut adjacent = BTreeSet::new();
        for &p in &region.points {
            for n in self.grid.neighbors(p) {
                let owner = self.owners[self.grid.index(n)];
                if owner != id {
                    adjacent.insert(owner);
                }
            }
        }
        adjacent.into_iter().collect()
    }

    // -- Region manager primitives --

    fn alloc(&mut self, region: Region) -> RegionId {
        match self.free.pop() {
            Some(id) => {
                self.regions[id.index()] = Some(region);
                id
            }
            None => {
                let id = RegionId(self.regions.len() as u32);
                self.regions.push(Some(region));
                id
            }
        }
    }

    fn discard(&mut self, id: RegionId) {
        trace!(%id, "discarding empty region");
        self.regions[id.index()] = None;
        self.free.push(id);
    }

    /// Moves `point` out of its region into a new region of its own.
    pub(crate) fn create_singleton(&mut self, point: Point) -> RegionId {
        let i = self.grid.index(point);
        let old = self.owners[i];
        let id = self.alloc(Region::new(self.stones[i], vec![point]));
        self.remove_point(old, point);
        self.owners[i] = id;
        id
    }

    /// Moves `point` from its current region into `id`. The caller
    /// guarantees that the point matches the region's type and touches it.
    pub(crate) fn add_point(&mut self, id: RegionId, point: Point) {
        let i = self.grid.index(point);
        let old = self.owners[i];
        if old == id {
            return;
        }
        debug_assert_eq!(self.region(id).color, self.stones[i]);
        self.remove_point(old, point);
        self.region_mut(id).points.push(point);
        self.owners[i] = id;
    }

    /// Takes `point` out of `id` without assigning it anywhere else. A region
    /// left without points is discarded.
    pub(crate) fn remove_point(&mut self, id: RegionId, point: Point) {
        let region = self.region_mut(id);
        region.points.retain(|&p| p != point);
        region.cache = None;
        if region.points.is_empty() {
            self.discard(id);
        }
    }

    /// Merges two regions of the same type. The larger one survives and its
    /// id is returned.
    pub(crate) fn join_regions(&mut self, a: RegionId, b: RegionId) -> RegionId {
        if a == b {
            return a;
        }
        debug_assert_eq!(self.region(a).color, self.region(b).color);
        let (keep, absorb) = if self.region(a).size() >= self.region(b).size() {
            (a, b)
        } else {
            (b, a)
        };
        trace!(%keep, %absorb, "joining regions");
        let moved = match self.regions[absorb.index()].take() {
            Some(region) => region.points,
            None => panic!("{absorb} does not exist"),
        };
        self.free.push(absorb);
        for &p in &moved {
            self.owners[self.grid.index(p)] = keep;
        }
        let region = self.region_mut(keep);
        region.points.extend(moved);
        region.cache = None;
        keep
    }

    /// After a point left region `id`, redistribute the remaining points if
    /// they are no longer connected. `seeds` are the former neighbors of the
    /// point that belonged to `id`.
    fn split_disconnected(&mut self, id: RegionId, seeds: &[Point]) {
        if seeds.len() < 2 {
            return;
        }
        let total = self.region(id).size();
        let color = self.region(id).color;
        let mut visited = vec![false; self.grid.area()];
        let mut first = true;

        for &seed in seeds {
            if visited[self.grid.index(seed)] {
                continue;
            }
            let component = self.flood(seed, id, &mut visited);
            if first {
                first = false;
                if component.len() == total {
                    return;
                }
                continue;
            }

            trace!(%id, size = component.len(), "splitting off disconnected part");
            let new_id = self.alloc(Region::new(color, component.clone()));
            for &p in &component {
                self.owners[self.grid.index(p)] = new_id;
            }
            let owners = &self.owners;
            let grid = self.grid;
            if let Some(Some(region)) = self.regions.get_mut(id.index()) {
                region.points.retain(|&p| owners[grid.index(p)] == id);
            }
        }
    }

    fn flood(&self, seed: Point, id: RegionId, visited: &mut [bool]) -> Vec<Point> {
        let mut component = Vec::new();
        let mut stack = vec![seed];
        while let Some(p) = stack.pop() {
            let i = self.grid.index(p);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            component.push(p);
            for n in self.grid.neighbors(p) {
                let ni = self.grid.index(n);
                if !visited[ni] && self.owners[ni] == id {
                    stack.push(n);
                }
            }
        }
        component
    }

    // -- Stone changes --

    fn assert_mutable(&self) {
        assert!(
            !self.scoring_mode,
            "board mutated while scoring mode is enabled"
        );
    }

    /// Puts a stone on an empty point. Does not capture.
    pub fn place_stone(&mut self, point: Point, stone: Stone) {
        self.assert_mutable();
        let i = self.grid.index(point);
        assert!(self.stones[i].is_none(), "{point:?} is already occupied");

        let empty = self.owners[i];
        let seeds: ArrayVec<Point, 4> = self
            .grid
            .neighbors(point)
            .into_iter()
            .filter(|&n| self.owners[self.grid.index(n)] == empty)
            .collect();

        self.stones[i] = Some(stone);
        self.hash ^= PositionHash::for_stone(stone, point);

        let friendly = self
            .grid
            .neighbors(point)
            .into_iter()
            .find(|&n| self.stones[self.grid.index(n)] == Some(stone));
        let mut id = match friendly {
            Some(n) => {
                let group = self.owners[self.grid.index(n)];
                self.add_point(group, point);
                group
            }
            None => self.create_singleton(point),
        };
        self.split_disconnected(empty, &seeds);
        for n in self.grid.neighbors(point) {
            let ni = self.grid.index(n);
            if self.stones[ni] == Some(stone) {
                id = self.join_regions(id, self.owners[ni]);
            }
        }
    }

    /// Takes a single stone off the board.
    pub fn remove_stone(&mut self, point: Point) -> Stone {
        self.assert_mutable();
        let i = self.grid.index(point);
        let Some(stone) = self.stones[i] else {
            panic!("there is no stone at {point:?}");
        };

        let group = self.owners[i];
        let seeds: ArrayVec<Point, 4> = self
            .grid
            .neighbors(point)
            .into_iter()
            .filter(|&n| self.owners[self.grid.index(n)] == group)
            .collect();

        self.stones[i] = None;
        self.hash ^= PositionHash::for_stone(stone, point);

        let liberty = self
            .grid
            .neighbors(point)
            .into_iter()
            .find(|&n| self.stones[self.grid.index(n)].is_none());
        let mut id = match liberty {
            Some(n) => {
                let region = self.owners[self.grid.index(n)];
                self.add_point(region, point);
                region
            }
            None => self.create_singleton(point),
        };
        self.split_disconnected(group, &seeds);
        for n in self.grid.neighbors(point) {
            let ni = self.grid.index(n);
            if self.stones[ni].is_none() {
                id = self.join_regions(id, self.owners[ni]);
            }
        }
        stone
    }

    /// Removes a whole stone group at once and returns its points.
    pub fn capture(&mut self, id: RegionId) -> Vec<Point> {
        self.assert_mutable();
        let region = self.region_mut(id);
        let Some(stone) = region.color.take() else {
            panic!("{id} is not a stone group");
        };
        let points = region.points.clone();

        for &p in &points {
            self.stones[self.grid.index(p)] = None;
            self.hash ^= PositionHash::for_stone(stone, p);
        }

        let mut merged = id;
        for &p in &points {
            for n in self.grid.neighbors(p) {
                let ni = self.grid.index(n);
                if self.stones[ni].is_none() && self.owners[ni] != merged {
                    merged = self.join_regions(merged, self.owners[ni]);
                }
            }
        }
        points
    }

    /// Forces a point to the given state, keeping regions consistent.
    pub fn set_point(&mut self, point: Point, target: Option<Stone>) {
        let current = self.stone_at(point);
        if current == target {
            return;
        }
        if current.is_some() {
            self.remove_stone(point);
        }
        if let Some(stone) = target {
            self.place_stone(point, stone);
        }
    }

    // -- Legality support --

    /// Opposing groups that `stone` at the empty `point` would capture.
    pub fn captures_by(&self, point: Point, stone: Stone) -> ArrayVec<RegionId, 4> {
        let mut result = ArrayVec::new();
        for n in self.grid.neighbors(point) {
            if self.stones[self.grid.index(n)] != Some(stone.opp()) {
                continue;
            }
            let id = self.region_of(n);
            if !result.contains(&id) && self.liberties(id) == 1 {
                result.push(id);
            }
        }
        result
    }

    /// Would `stone` at the empty `point` end up without liberties?
    pub fn is_suicide(&self, point: Point, stone: Stone) -> bool {
        let neighbors = self.grid.neighbors(point);
        if neighbors.iter().any(|&n| self.stone_at(n).is_none()) {
            return false;
        }
        let connects_to_liberty = neighbors.iter().any(|&n| {
            self.stone_at(n) == Some(stone) && self.liberties(self.region_of(n)) > 1
        });
        if connects_to_liberty {
            return false;
        }
        self.captures_by(point, stone).is_empty()
    }

    /// Position hash after `stone` is played at `point`, captures included.
    pub fn hash_after_play(&self, point: Point, stone: Stone) -> PositionHash {
        let mut hash = self.hash ^ PositionHash::for_stone(stone, point);
        for id in self.captures_by(point, stone) {
            for &p in &self.region(id).points {
                hash ^= PositionHash::for_stone(stone.opp(), p);
            }
        }
        hash
    }

    /// Checks whether a setup stone may be placed. Setup never captures, so
    /// a setup that leaves any group without liberties is rejected.
    pub fn check_setup_stone(&self, point: Point, stone: Stone) -> Result<(), IllegalSetupReason> {
        let previous = self.stone_at(point);
        if previous == Some(stone) {
            return Ok(());
        }

        let mut board = self.clone();
        board.disable_scoring_mode();
        board.set_point(point, Some(stone));

        let own = board.region_of(point);
        if board.liberties(own) == 0 {
            return Err(if board.size(own) == 1 {
                IllegalSetupReason::SuicideSetupStone
            } else {
                IllegalSetupReason::SuicideFriendlyStoneGroup
            });
        }

        for n in board.grid.neighbors(point) {
            if board.stone_at(n) != Some(stone.opp()) {
                continue;
            }
            if board.liberties(board.region_of(n)) == 0 {
                // Every opposing neighbor was part of the replaced group.
                return Err(if previous == Some(stone.opp()) {
                    IllegalSetupReason::SuicideOpposingColorSubgroup
                } else {
                    IllegalSetupReason::SuicideOpposingStoneGroup
                });
            }
        }
        Ok(())
    }

    // -- Scoring mode --

    /// Caches size, liberties and adjacency of every region and resets all
    /// scoring marks. The board must not be mutated until scoring mode ends.
    pub fn enable_scoring_mode(&mut self) {
        if self.scoring_mode {
            return;
        }
        for id in self.region_ids() {
            let region = self.region(id);
            let cache = RegionCache {
                size: region.size(),
                liberties: self.count_liberties(region),
                adjacent: self.find_adjacent(id, region),
            };
            let region = self.region_mut(id);
            region.cache = Some(cache);
            region.marks = ScoringMarks::default();
        }
        self.scoring_mode = true;
    }

    /// Drops cached values and scoring marks.
    pub fn disable_scoring_mode(&mut self) {
        for region in self.regions.iter_mut().flatten() {
            region.cache = None;
            region.marks = ScoringMarks::default();
        }
        self.scoring_mode = false;
    }

    pub(crate) fn marks_mut(&mut self, id: RegionId) -> &mut ScoringMarks {
        &mut self.region_mut(id).marks
    }

    // -- Verification --

    /// Canonical view of the partition: each region as its type plus sorted
    /// points. Independent of region ids.
    pub fn partition(&self) -> BTreeSet<(Option<Stone>, Vec<Point>)> {
        self.regions
            .iter()
            .flatten()
            .map(|region| {
                let mut points = region.points.clone();
                points.sort_unstable();
                (region.color, points)
            })
            .collect()
    }

    /// A fresh board with the same stones, built without any history.
    pub fn rebuild(&self) -> Board {
        let mut board = Board::new(self.grid);
        for (point, stone) in self.stones() {
            board.place_stone(point, stone);
        }
        board
    }

    /// Checks every structural invariant and reports the first violation.
    pub fn verify(&self) -> Result<(), String> {
        let mut covered = 0;
        for (id, region) in self.regions() {
            if region.points.is_empty() {
                return Err(format!("{id} has no points"));
            }
            for &p in &region.points {
                let i = self.grid.index(p);
                if self.owners[i] != id {
                    return Err(format!("{p:?} is listed in {id} but owned by {}", self.owners[i]));
                }
                if self.stones[i] != region.color {
                    return Err(format!("{p:?} does not match the color of {id}"));
                }
            }
            let mut visited = vec![false; self.grid.area()];
            if self.flood(region.points[0], id, &mut visited).len() != region.size() {
                return Err(format!("{id} is not connected"));
            }
            covered += region.size();
        }
        if covered != self.grid.area() {
            return Err(format!("regions cover {covered} of {} points", self.grid.area()));
        }
        for p in self.grid.points() {
            for n in self.grid.neighbors(p) {
                if self.stone_at(p) == self.stone_at(n) && self.region_of(p) != self.region_of(n) {
                    return Err(format!("{p:?} and {n:?} should share a region"));
                }
            }
        }
        if self.hash != self.recalculate_hash() {
            return Err("incremental hash differs from recalculated hash".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rows: &[&str]) -> Board {
        Board::from_layout(rows).unwrap()
    }

    #[test]
    fn empty_board_is_one_region() {
        let board = Board::with_dimensions(9, 9).unwrap();
        assert_eq!(board.region_count(), 1);
        let id = board.region_of((4, 4));
        assert_eq!(board.size(id), 81);
        assert!(!board.is_stone_group(id));
        assert_eq!(board.liberties(id), 0);
        board.verify().unwrap();
    }

    #[test]
    fn ragged_layout_is_rejected() {
        assert!(matches!(
            Board::from_layout(&["B+", "+", "++"]),
            Err(GoError::Config(_))
        ));
    }

    #[test]
    fn stone_next_to_friend_extends_its_group() {
        let mut board = layout(&["B++", "+++", "+++"]);
        let group = board.region_of((0, 0));
        board.place_stone((1, 0), Stone::Black);
        assert_eq!(board.region_of((1, 0)), group);
        assert_eq!(board.size(group), 2);

        let empty = board.region_of((2, 2));
        board.remove_stone((1, 0));
        assert_eq!(board.region_of((1, 0)), empty);
        assert_eq!(board.size(group), 1);
        board.verify().unwrap();
    }

    #[test]
    fn single_stone_region() {
        let mut board = Board::with_dimensions(9, 9).unwrap();
        board.place_stone((4, 4), Stone::Black);
        let id = board.region_of((4, 4));
        assert_eq!(board.size(id), 1);
        assert_eq!(board.color(id), Some(Stone::Black));
        assert_eq!(board.liberties(id), 4);
        assert_eq!(board.adjacent_regions(id).len(), 1);
        assert_eq!(board.region_count(), 2);
        board.verify().unwrap();
    }

    #[test]
    fn placing_stone_joins_friendly_groups() {
        let mut board = layout(&["B+B", "+++", "+++"]);
        assert_ne!(board.region_of((0, 0)), board.region_of((2, 0)));
        board.place_stone((1, 0), Stone::Black);
        let id = board.region_of((0, 0));
        assert_eq!(id, board.region_of((2, 0)));
        assert_eq!(board.size(id), 3);
        assert_eq!(board.liberties(id), 3);
        board.verify().unwrap();
    }

    #[test]
    fn wall_splits_empty_region() {
        let mut board = layout(&["+B+", "+B+", "+++"]);
        assert_eq!(board.region_of((0, 0)), board.region_of((2, 0)));
        board.place_stone((1, 2), Stone::Black);
        assert_ne!(board.region_of((0, 0)), board.region_of((2, 0)));
        assert_eq!(board.size(board.region_of((0, 0))), 3);
        assert_eq!(board.size(board.region_of((2, 2))), 3);
        board.verify().unwrap();
    }

    #[test]
    fn removing_stone_splits_group_and_merges_empty() {
        let mut board = layout(&["+B+", "BBB", "+B+"]);
        let before = board.region_count();
        board.remove_stone((1, 1));
        for p in [(1, 0), (0, 1), (2, 1), (1, 2)] {
            assert_eq!(board.size(board.region_of(p)), 1);
        }
        assert_eq!(board.size(board.region_of((1, 1))), 1);
        assert_eq!(board.region_count(), before + 4);
        board.verify().unwrap();
    }

    #[test]
    fn capture_merges_into_surrounding_empty_area() {
        let mut board = layout(&["+B+", "BWB", "+B+"]);
        let white = board.region_of((1, 1));
        assert_eq!(board.liberties(white), 0);
        let captured = board.capture(white);
        assert_eq!(captured, vec![(1, 1)]);
        assert_eq!(board.stone_at((1, 1)), None);
        assert_eq!(board.size(board.region_of((1, 1))), 1);
        board.verify().unwrap();
    }

    #[test]
    fn capture_connects_separate_empty_regions() {
        let mut board = layout(&["+WB", "WWB", "BB+"]);
        let white = board.region_of((1, 1));
        board.capture(white);
        let empty = board.region_of((0, 0));
        assert_eq!(board.size(empty), 4);
        board.verify().unwrap();
    }

    #[test]
    fn region_primitives() {
        let mut board = layout(&["BB+", "+++", "+++"]);
        let before = board.region_count();
        let group = board.region_of((0, 0));
        let single = board.create_singleton((1, 0));
        assert_eq!(board.size(group), 1);
        assert_eq!(board.size(single), 1);

        board.add_point(group, (1, 0));
        assert_eq!(board.size(group), 2);
        assert_eq!(board.region_count(), before);
        board.verify().unwrap();

        let single = board.create_singleton((1, 0));
        let joined = board.join_regions(group, single);
        assert_eq!(board.size(joined), 2);
        board.verify().unwrap();
    }

    #[test]
    fn hash_tracks_changes() {
        let mut board = Board::with_dimensions(5, 5).unwrap();
        board.place_stone((1, 1), Stone::Black);
        board.place_stone((2, 2), Stone::White);
        let hash = board.hash();
        board.remove_stone((1, 1));
        board.place_stone((1, 1), Stone::Black);
        assert_eq!(board.hash(), hash);
        assert_eq!(board.hash(), board.recalculate_hash());
    }

    #[test]
    fn suicide_and_capture_detection() {
        let board = layout(&["+B++", "B+++", "++++", "++++"]);
        assert!(board.is_suicide((0, 0), Stone::White));
        assert!(!board.is_suicide((0, 0), Stone::Black));

        let board = layout(&["+BW+", "BW+W", "+BW+", "++++"]);
        assert!(!board.is_suicide((2, 1), Stone::Black));
        assert_eq!(board.captures_by((2, 1), Stone::Black).len(), 1);
    }

    #[test]
    fn hash_after_play_matches_actual_play() {
        let mut board = layout(&["+BW+", "BW+W", "+BW+", "++++"]);
        let predicted = board.hash_after_play((2, 1), Stone::Black);
        let captured = board.captures_by((2, 1), Stone::Black);
        board.place_stone((2, 1), Stone::Black);
        for id in captured {
            board.capture(id);
        }
        assert_eq!(board.hash(), predicted);
    }

    #[test]
    fn setup_legality() {
        let board = layout(&["+B++", "B+++", "++++", "++++"]);
        assert_eq!(
            board.check_setup_stone((0, 0), Stone::White),
            Err(IllegalSetupReason::SuicideSetupStone)
        );

        let board = layout(&["W+++", "B+++", "++++", "++++"]);
        assert_eq!(
            board.check_setup_stone((1, 0), Stone::Black),
            Err(IllegalSetupReason::SuicideOpposingStoneGroup)
        );

        let board = layout(&["BW++", "+B++", "++++", "++++"]);
        assert_eq!(
            board.check_setup_stone((1, 1), Stone::White),
            Ok(())
        );
        let board = layout(&["+BW", "BW+", "W++"]);
        assert_eq!(
            board.check_setup_stone((0, 0), Stone::Black),
            Err(IllegalSetupReason::SuicideFriendlyStoneGroup)
        );

        let board = layout(&["BWB", "+W+", "+++"]);
        assert_eq!(
            board.check_setup_stone((1, 1), Stone::Black),
            Err(IllegalSetupReason::SuicideOpposingColorSubgroup)
        );
    }

    #[test]
    fn scoring_mode_caches_and_resets() {
        let mut board = layout(&["+B+", "BBB", "+++"]);
        board.enable_scoring_mode();
        let group = board.region_of((1, 1));
        assert_eq!(board.region(group).cache().map(|c| c.liberties), Some(5));
        board.marks_mut(group).inconsistent = true;
        board.disable_scoring_mode();
        assert!(board.region(group).cache().is_none());
        assert!(!board.region(group).marks().inconsistent);
    }

    #[test]
    #[should_panic(expected = "scoring mode")]
    fn mutation_in_scoring_mode_panics() {
        let mut board = Board::with_dimensions(3, 3).unwrap();
        board.enable_scoring_mode();
        board.place_stone((0, 0), Stone::Black);
    }

    #[test]
    fn rebuild_keeps_partition() {
        let mut board = layout(&["+BW+", "BW+W", "+BW+", "++++"]);
        board.remove_stone((1, 1));
        board.place_stone((2, 1), Stone::Black);
        let rebuilt = board.rebuild();
        assert_eq!(board.partition(), rebuilt.partition());
        assert_eq!(board.hash(), rebuilt.hash());
    }
}
