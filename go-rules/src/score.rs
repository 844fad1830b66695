use std::collections::HashSet;
use std::fmt;
use std::thread;

use crossbeam_channel::{Receiver, bounded};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Point;
use crate::board::Board;
use crate::error::GoError;
use crate::region::{RegionId, StoneGroupState};
use crate::rules::{Rules, ScoringSystem};
use crate::stone::Stone;

/// Inputs to a score calculation that do not live on the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringContext {
    pub rules: Rules,
    pub komi: f32,
    pub handicap: u32,
    /// Stones captured during play, indexed by the capturing player.
    pub captures: [u32; 2],
    pub stones_played: [u32; 2],
    pub passes: [u32; 2],
}

/// Per-color score breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPoints {
    /// Prisoners taken during play.
    pub captures: u32,
    /// Opposing stones marked dead.
    pub dead_stones: u32,
    /// Empty points owned plus the points of dead opposing stones.
    pub territory: u32,
    /// Own stones that stay on the board, seki included.
    pub alive: u32,
    /// Area scoring only: one point per handicap stone, White only.
    pub handicap_compensation: u32,
    pub stones_played: u32,
    pub passes: u32,
}

impl PlayerPoints {
    pub fn points(&self, scoring: ScoringSystem) -> u32 {
        match scoring {
            ScoringSystem::TerritoryScoring => self.captures + self.dead_stones + self.territory,
            ScoringSystem::AreaScoring => self.alive + self.territory + self.handicap_compensation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    BlackWins,
    WhiteWins,
    Draw,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::BlackWins => write!(f, "Black wins"),
            GameResult::WhiteWins => write!(f, "White wins"),
            GameResult::Draw => write!(f, "Draw"),
        }
    }
}

/// Full score breakdown. Always recomputed as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub black: PlayerPoints,
    pub white: PlayerPoints,
    pub komi: f32,
    pub scoring: ScoringSystem,
    /// Empty regions whose neighbors are marked in a contradictory way.
    /// They are scored neutral.
    pub inconsistent_regions: Vec<RegionId>,
}

impl Score {
    fn new(ctx: &ScoringContext) -> Self {
        let mut score = Score {
            black: PlayerPoints::default(),
            white: PlayerPoints::default(),
            komi: ctx.komi,
            scoring: ctx.rules.scoring,
            inconsistent_regions: Vec::new(),
        };
        for stone in Stone::BOTH {
            let i = stone.index();
            let player = score.player_mut(stone);
            player.captures = ctx.captures[i];
            player.stones_played = ctx.stones_played[i];
            player.passes = ctx.passes[i];
        }
        if ctx.rules.is_area_scoring() {
            score.white.handicap_compensation = ctx.handicap;
        }
        score
    }

    pub fn player(&self, stone: Stone) -> &PlayerPoints {
        match stone {
            Stone::Black => &self.black,
            Stone::White => &self.white,
        }
    }

    fn player_mut(&mut self, stone: Stone) -> &mut PlayerPoints {
        match stone {
            Stone::Black => &mut self.black,
            Stone::White => &mut self.white,
        }
    }

    pub fn black_total(&self) -> f32 {
        self.black.points(self.scoring) as f32
    }

    pub fn white_total(&self) -> f32 {
        self.white.points(self.scoring) as f32 + self.komi
    }

    pub fn result(&self) -> GameResult {
        let (black, white) = (self.black_total(), self.white_total());
        if black > white {
            GameResult::BlackWins
        } else if white > black {
            GameResult::WhiteWins
        } else {
            GameResult::Draw
        }
    }

    pub fn result_string(&self) -> String {
        format_result(self.black_total(), self.white_total())
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistent_regions.is_empty()
    }
}

/// Format the game result string from final scores.
///
/// Returns "B+{diff}", "W+{diff}", or "Draw".
pub fn format_result(black_score: f32, white_score: f32) -> String {
    let diff = black_score - white_score;
    if diff > 0.0 {
        format!("B+{}", diff)
    } else if diff < 0.0 {
        format!("W+{}", -diff)
    } else {
        "Draw".to_string()
    }
}

// -- Marking --

fn group_at(board: &Board, point: Point) -> Result<RegionId, GoError> {
    if !board.is_scoring_mode() {
        return Err(GoError::ScoringNotEnabled);
    }
    board.grid().check(point)?;
    if board.stone_at(point).is_none() {
        return Err(GoError::NoStone(point));
    }
    Ok(board.region_of(point))
}

/// Marks the groups containing `points` dead. Empty points are ignored.
pub fn mark_dead_stones(board: &mut Board, points: &[Point]) -> Result<(), GoError> {
    if !board.is_scoring_mode() {
        return Err(GoError::ScoringNotEnabled);
    }
    for &point in points {
        if board.grid().on_board(point) && board.stone_at(point).is_some() {
            let id = board.region_of(point);
            board.marks_mut(id).group_state = StoneGroupState::Dead;
        }
    }
    Ok(())
}

/// Stone groups of the same color reachable from `start` through empty
/// regions and groups of that color. Groups of the other color bound the
/// search.
pub fn shared_territory_groups(board: &Board, start: RegionId) -> Vec<RegionId> {
    let Some(color) = board.color(start) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut pending = vec![start];
    let mut groups = Vec::new();
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        if board.color(id) == Some(color) {
            groups.push(id);
        }
        for adjacent in board.adjacent_regions(id) {
            if board.color(adjacent) != Some(color.opp()) && !seen.contains(&adjacent) {
                pending.push(adjacent);
            }
        }
    }
    groups.sort_unstable();
    groups
}

/// Flips the group at `point` between dead and alive. A seki group becomes
/// dead. With `cascade` the new state is also given to every group of the
/// same color in the shared territory; the other color is never touched.
///
/// Returns the groups that changed state.
pub fn toggle_dead_state(board: &mut Board, point: Point, cascade: bool) -> Result<Vec<RegionId>, GoError> {
    let id = group_at(board, point)?;
    let state = match board.region(id).marks().group_state {
        StoneGroupState::Dead => StoneGroupState::Alive,
        StoneGroupState::Alive | StoneGroupState::Seki => StoneGroupState::Dead,
    };
    let targets = if cascade {
        shared_territory_groups(board, id)
    } else {
        vec![id]
    };
    let mut changed = Vec::new();
    for target in targets {
        let marks = board.marks_mut(target);
        if marks.group_state != state {
            marks.group_state = state;
            changed.push(target);
        }
    }
    debug!(?point, ?state, changed = changed.len(), "toggled dead state");
    Ok(changed)
}

/// Flips the group at `point` between seki and alive. A dead group becomes
/// seki.
pub fn toggle_seki_state(board: &mut Board, point: Point) -> Result<StoneGroupState, GoError> {
    let id = group_at(board, point)?;
    let marks = board.marks_mut(id);
    marks.group_state = match marks.group_state {
        StoneGroupState::Seki => StoneGroupState::Alive,
        StoneGroupState::Alive | StoneGroupState::Dead => StoneGroupState::Seki,
    };
    debug!(?point, state = ?marks.group_state, "toggled seki state");
    Ok(marks.group_state)
}

// -- Calculation --

/// Assigns territory to every region of a board in scoring mode and sums
/// up the score. Stone groups are settled first; empty regions are then
/// judged by the groups around them.
pub fn calculate(board: &mut Board, ctx: &ScoringContext) -> Result<Score, GoError> {
    if !board.is_scoring_mode() {
        return Err(GoError::ScoringNotEnabled);
    }
    let area = ctx.rules.is_area_scoring();
    let mut score = Score::new(ctx);
    let ids = board.region_ids();

    for &id in &ids {
        let Some(color) = board.color(id) else {
            continue;
        };
        let size = board.size(id) as u32;
        let territory = match board.region(id).marks().group_state {
            StoneGroupState::Alive | StoneGroupState::Seki => {
                score.player_mut(color).alive += size;
                area.then_some(color)
            }
            StoneGroupState::Dead => {
                let owner = score.player_mut(color.opp());
                owner.dead_stones += size;
                owner.territory += size;
                Some(color.opp())
            }
        };
        let marks = board.marks_mut(id);
        marks.territory = territory;
        marks.inconsistent = false;
    }

    for &id in &ids {
        if board.is_stone_group(id) {
            continue;
        }
        let (territory, inconsistent) = empty_region_owner(board, id, area);
        if let Some(owner) = territory {
            score.player_mut(owner).territory += board.size(id) as u32;
        }
        if inconsistent {
            score.inconsistent_regions.push(id);
        }
        let marks = board.marks_mut(id);
        marks.territory = territory;
        marks.inconsistent = inconsistent;
    }

    if !score.is_consistent() {
        warn!(regions = score.inconsistent_regions.len(), "inconsistent dead stone markings");
    }
    debug!(black = score.black_total(), white = score.white_total(), "score calculated");
    Ok(score)
}

/// Owner of an empty region and whether the surrounding marks contradict
/// each other.
fn empty_region_owner(board: &Board, id: RegionId, area: bool) -> (Option<Stone>, bool) {
    let mut alive = [false; 2];
    let mut seki = [false; 2];
    let mut dead = [false; 2];
    for adjacent in board.adjacent_regions(id) {
        let Some(color) = board.color(adjacent) else {
            continue;
        };
        let i = color.index();
        match board.region(adjacent).marks().group_state {
            StoneGroupState::Alive => alive[i] = true,
            StoneGroupState::Seki => seki[i] = true,
            StoneGroupState::Dead => dead[i] = true,
        }
    }

    if !dead.contains(&true) {
        let colors: Vec<Stone> = Stone::BOTH
            .into_iter()
            .filter(|c| alive[c.index()] || seki[c.index()])
            .collect();
        return match colors.as_slice() {
            [color] if !seki[color.index()] => (Some(*color), false),
            // An eye shared by seki groups.
            [color] => (area.then_some(*color), false),
            _ => (None, false),
        };
    }

    for color in Stone::BOTH {
        let (d, o) = (color.index(), color.opp().index());
        if dead[d] && !dead[o] && !alive[d] && !seki[d] && !seki[o] {
            return (Some(color.opp()), false);
        }
    }
    (None, true)
}

/// A score calculation running on a copy of the board.
pub struct ScoreCalculation {
    session: u64,
    receiver: Receiver<Result<(Board, Score), GoError>>,
}

impl ScoreCalculation {
    /// Starts calculating on a worker thread. `session` identifies the
    /// state of the scoring marks the copy was taken from.
    pub fn start(mut board: Board, ctx: ScoringContext, session: u64) -> Self {
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let result = calculate(&mut board, &ctx).map(|score| (board, score));
            // The receiver may be gone if the caller lost interest.
            let _ = tx.send(result);
        });
        info!(session, "background score calculation started");
        ScoreCalculation {
            session,
            receiver: rx,
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Blocks until the calculation finishes.
    pub fn wait(self) -> Result<(u64, Board, Score), GoError> {
        let (board, score) = self
            .receiver
            .recv()
            .map_err(|_| GoError::CalculationFailed)??;
        Ok((self.session, board, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(rules: Rules, komi: f32) -> ScoringContext {
        ScoringContext {
            rules,
            komi,
            handicap: 0,
            captures: [0, 0],
            stones_played: [0, 0],
            passes: [0, 0],
        }
    }

    fn scoring_board(layout: &[&str]) -> Board {
        let mut board = Board::from_layout(layout).unwrap();
        board.enable_scoring_mode();
        board
    }

    fn territory_of(board: &Board, point: Point) -> Option<Stone> {
        board.region(board.region_of(point)).marks().territory
    }

    #[test]
    fn single_stone_area_scoring() {
        let mut board = Board::with_dimensions(9, 9).unwrap();
        board.place_stone((4, 4), Stone::Black);
        board.enable_scoring_mode();
        let score = calculate(&mut board, &context(Rules::chinese(), 6.5)).unwrap();
        assert_eq!(score.black.alive, 1);
        assert_eq!(score.black.territory, 80);
        assert_eq!(score.black_total(), 81.0);
        assert_eq!(score.white_total(), 6.5);
        assert_eq!(score.result(), GameResult::BlackWins);
        assert_eq!(score.result_string(), "B+74.5");
        assert_eq!(territory_of(&board, (0, 0)), Some(Stone::Black));
    }

    #[test]
    fn empty_board_is_neutral() {
        let mut board = scoring_board(&["+++", "+++", "+++"]);
        let score = calculate(&mut board, &context(Rules::japanese(), 6.5)).unwrap();
        assert_eq!(score.black.territory, 0);
        assert_eq!(score.white.territory, 0);
        assert_eq!(score.result_string(), "W+6.5");
    }

    #[test]
    fn requires_scoring_mode() {
        let mut board = Board::with_dimensions(3, 3).unwrap();
        assert_eq!(
            calculate(&mut board, &context(Rules::japanese(), 0.0)),
            Err(GoError::ScoringNotEnabled)
        );
    }

    #[test]
    fn territory_scoring_counts_dead_stones_twice() {
        let mut board = scoring_board(&[
            "+BW++",
            "+BW+B",
            "+BW++",
            "+BWB+",
            "+BW++",
        ]);
        toggle_dead_state(&mut board, (4, 1), true).unwrap();
        let score = calculate(&mut board, &context(Rules::japanese(), 6.5)).unwrap();
        assert_eq!(score.black.territory, 5);
        assert_eq!(score.white.dead_stones, 2);
        assert_eq!(score.white.territory, 10);
        assert_eq!(score.black_total(), 5.0);
        assert_eq!(score.white_total(), 18.5);
        assert!(score.is_consistent());
    }

    #[test]
    fn cascade_stays_within_one_color() {
        let mut board = scoring_board(&[
            "+BW++",
            "+BW+B",
            "+BW++",
            "+BWB+",
            "+BW++",
        ]);
        let changed = toggle_dead_state(&mut board, (4, 1), true).unwrap();
        assert_eq!(changed.len(), 2);
        assert!(board.region(board.region_of((3, 3))).is_dead());
        assert!(!board.region(board.region_of((1, 0))).is_dead());
        assert!(!board.region(board.region_of((2, 0))).is_dead());
    }

    #[test]
    fn without_cascade_only_one_group_changes() {
        let mut board = scoring_board(&[
            "+BW++",
            "+BW+B",
            "+BW++",
            "+BWB+",
            "+BW++",
        ]);
        let changed = toggle_dead_state(&mut board, (4, 1), false).unwrap();
        assert_eq!(changed, vec![board.region_of((4, 1))]);
        assert!(!board.region(board.region_of((3, 3))).is_dead());

        // The dead stone and the live one share an empty region.
        let score = calculate(&mut board, &context(Rules::japanese(), 0.0)).unwrap();
        assert_eq!(score.inconsistent_regions, vec![board.region_of((3, 0))]);
        assert_eq!(territory_of(&board, (3, 0)), None);
        assert!(board.region(board.region_of((3, 0))).marks().inconsistent);
    }

    #[test]
    fn toggling_dead_and_back_restores_territory() {
        let mut board = scoring_board(&[
            "+BW++",
            "+BW++",
            "+BW+B",
            "+BWW+",
            "+BW++",
        ]);
        let ctx = context(Rules::japanese(), 6.5);
        let before_score = calculate(&mut board, &ctx).unwrap();
        let before: Vec<_> = board.regions().map(|(id, r)| (id, r.marks().territory)).collect();
        assert_eq!(territory_of(&board, (3, 0)), None);

        toggle_dead_state(&mut board, (4, 2), true).unwrap();
        calculate(&mut board, &ctx).unwrap();
        assert_eq!(territory_of(&board, (3, 0)), Some(Stone::White));
        assert_eq!(territory_of(&board, (4, 4)), Some(Stone::White));

        toggle_dead_state(&mut board, (4, 2), true).unwrap();
        let after_score = calculate(&mut board, &ctx).unwrap();
        let after: Vec<_> = board.regions().map(|(id, r)| (id, r.marks().territory)).collect();
        assert_eq!(before, after);
        assert_eq!(before_score, after_score);
    }

    #[test]
    fn seki_eyes_depend_on_scoring_system() {
        let layout = ["+BW+", "+BW+", "+BW+"];

        let mut board = scoring_board(&layout);
        toggle_seki_state(&mut board, (1, 0)).unwrap();
        let score = calculate(&mut board, &context(Rules::japanese(), 0.0)).unwrap();
        assert_eq!(territory_of(&board, (0, 0)), None);
        assert_eq!(score.black.territory, 0);
        assert_eq!(score.white.territory, 3);

        let mut board = scoring_board(&layout);
        toggle_seki_state(&mut board, (1, 0)).unwrap();
        let score = calculate(&mut board, &context(Rules::chinese(), 0.0)).unwrap();
        assert_eq!(territory_of(&board, (0, 0)), Some(Stone::Black));
        assert_eq!(score.black.territory, 3);
        assert_eq!(score.black.alive, 3);
    }

    #[test]
    fn dead_next_to_seki_is_inconsistent() {
        let mut board = scoring_board(&["B+W", "B+W", "B+W"]);
        toggle_dead_state(&mut board, (0, 0), false).unwrap();
        let score = calculate(&mut board, &context(Rules::japanese(), 0.0)).unwrap();
        assert_eq!(territory_of(&board, (1, 1)), Some(Stone::White));
        assert_eq!(score.white.territory, 6);

        toggle_seki_state(&mut board, (2, 0)).unwrap();
        let score = calculate(&mut board, &context(Rules::japanese(), 0.0)).unwrap();
        assert_eq!(territory_of(&board, (1, 1)), None);
        assert_eq!(score.inconsistent_regions.len(), 1);
        assert_eq!(score.white.territory, 3);
    }

    #[test]
    fn marking_requires_a_stone() {
        let mut board = scoring_board(&["B+", "++"]);
        assert_eq!(
            toggle_dead_state(&mut board, (1, 1), false),
            Err(GoError::NoStone((1, 1)))
        );
        assert_eq!(
            toggle_seki_state(&mut board, (5, 5)),
            Err(GoError::NotOnBoard((5, 5)))
        );
    }

    #[test]
    fn handicap_compensation_under_area_scoring() {
        let mut board = scoring_board(&["+++", "+++", "+++"]);
        let mut ctx = context(Rules::chinese(), 0.5);
        ctx.handicap = 2;
        let score = calculate(&mut board, &ctx).unwrap();
        assert_eq!(score.white.handicap_compensation, 2);
        assert_eq!(score.white_total(), 2.5);

        ctx.rules = Rules::japanese();
        let score = calculate(&mut board, &ctx).unwrap();
        assert_eq!(score.white.handicap_compensation, 0);
    }

    #[test]
    fn background_calculation_matches() {
        let mut board = scoring_board(&["+B+", "BB+", "+++"]);
        let ctx = context(Rules::chinese(), 0.5);
        let expected = calculate(&mut board.clone(), &ctx).unwrap();
        let (session, calculated, score) = ScoreCalculation::start(board.clone(), ctx, 7).wait().unwrap();
        assert_eq!(session, 7);
        assert_eq!(score, expected);
        assert_eq!(calculated.partition(), board.partition());
        board.disable_scoring_mode();
    }

    #[test]
    fn format_result_strings() {
        assert_eq!(format_result(10.0, 5.5), "B+4.5");
        assert_eq!(format_result(5.0, 11.5), "W+6.5");
        assert_eq!(format_result(5.0, 5.0), "Draw");
    }
}
