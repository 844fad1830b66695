use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Point;
use crate::board::Board;
use crate::board_position::{BoardPosition, PositionStep};
use crate::config::GameConfig;
use crate::error::{GoError, IllegalMoveReason};
use crate::events::{Event, EventBus, Topic};
use crate::game_move::{Move, MoveKind};
use crate::game_tree::{GameTree, NodeId, ROOT};
use crate::grid::Grid;
use crate::handicap;
use crate::rules::{DisputeResolutionRule, FourPassesRule, KoRule, LifeAndDeathSettlingRule, Rules};
use crate::score::{self, Score, ScoreCalculation, ScoringContext};
use crate::setup::BoardSetup;
use crate::stone::Stone;
use crate::zobrist::PositionHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEndReason {
    TwoPasses,
    ThreePasses,
    FourPasses,
    /// Carries the player who resigned.
    Resigned(Stone),
}

impl fmt::Display for GameEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEndReason::TwoPasses => write!(f, "two passes"),
            GameEndReason::ThreePasses => write!(f, "three passes"),
            GameEndReason::FourPasses => write!(f, "four passes"),
            GameEndReason::Resigned(stone) => write!(f, "{stone} resigned"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Started,
    Ended(GameEndReason),
}

/// A game in progress: the board, the tree of nodes, the active line through
/// that tree and the board position within it.
///
/// All mutation goes through `&mut self`; callers serialize access.
#[derive(Debug, Serialize, Deserialize)]
pub struct Game {
    config: GameConfig,
    board: Board,
    tree: GameTree,
    active_line: Vec<NodeId>,
    position: BoardPosition,
    handicap: Vec<Point>,
    state: GameState,
    /// Position at which play was last resumed. Passes up to it do not count
    /// towards ending the game.
    resumed_at: Option<usize>,
    /// Chosen after resuming under non-alternating play. Only valid at the
    /// last position.
    next_color_override: Option<Stone>,
    score: Option<Score>,
    /// Changes whenever scoring marks change, so stale background results
    /// can be told apart.
    scoring_session: u64,
    #[serde(skip)]
    events: EventBus,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self, GoError> {
        config.validate()?;
        let grid = config.grid()?;
        let handicap = handicap::handicap_points(&grid, config.handicap)?;

        let mut board = Board::new(grid);
        for &p in &handicap {
            board.place_stone(p, Stone::Black);
        }
        let mut tree = GameTree::new();
        tree.node_mut(ROOT).hash = board.hash();

        info!(
            cols = grid.cols(),
            rows = grid.rows(),
            komi = config.komi,
            handicap = handicap.len(),
            rules = ?config.rules,
            "new game"
        );
        Ok(Game {
            config,
            board,
            tree,
            active_line: vec![ROOT],
            position: BoardPosition::new(),
            handicap,
            state: GameState::Started,
            resumed_at: None,
            next_color_override: None,
            score: None,
            scoring_session: 0,
            events: EventBus::new(),
        })
    }

    // -- Accessors --

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rules(&self) -> &Rules {
        &self.config.rules
    }

    pub fn komi(&self) -> f32 {
        self.config.komi
    }

    pub fn grid(&self) -> &Grid {
        self.board.grid()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    /// Node ids from the root down to the end of the active line.
    pub fn active_line(&self) -> &[NodeId] {
        &self.active_line
    }

    pub fn board_position(&self) -> &BoardPosition {
        &self.position
    }

    pub fn current_node(&self) -> NodeId {
        self.active_line[self.position.current()]
    }

    pub fn handicap_points(&self) -> &[Point] {
        &self.handicap
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn has_ended(&self) -> bool {
        matches!(self.state, GameState::Ended(_))
    }

    pub fn is_scoring(&self) -> bool {
        self.board.is_scoring_mode()
    }

    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    pub fn subscribe(&mut self, topic: Topic) -> crossbeam_channel::Receiver<Event> {
        self.events.subscribe(topic)
    }

    pub fn subscribe_all(&mut self) -> crossbeam_channel::Receiver<Event> {
        self.events.subscribe_all()
    }

    /// Moves on the active line up to the current position.
    pub fn moves(&self) -> impl Iterator<Item = &Move> + '_ {
        self.active_line[1..=self.position.current()]
            .iter()
            .filter_map(|&id| self.tree.node(id).mv.as_ref())
    }

    /// Does any node up to the current position carry a setup?
    pub fn has_setup(&self) -> bool {
        self.active_line[..=self.position.current()]
            .iter()
            .any(|&id| self.tree.node(id).setup.is_some())
    }

    fn position_hash(&self, index: usize) -> PositionHash {
        self.tree.node(self.active_line[index]).hash
    }

    /// Player to move after each position of the active line, ignoring the
    /// non-alternating override.
    fn colors_to_move(&self) -> Vec<Stone> {
        let mut color = if self.handicap.is_empty() {
            Stone::Black
        } else {
            Stone::White
        };
        let mut colors = Vec::with_capacity(self.active_line.len());
        for &id in &self.active_line {
            let node = self.tree.node(id);
            if let Some(mv) = &node.mv {
                color = mv.player.opp();
            }
            if let Some(first) = node.setup.as_ref().and_then(BoardSetup::first_move_color) {
                color = first;
            }
            colors.push(color);
        }
        colors
    }

    pub fn next_move_color(&self) -> Stone {
        match self.next_color_override {
            Some(color) if self.position.is_last() => color,
            _ => self.colors_to_move()[self.position.current()],
        }
    }

    // -- Moves --

    /// Checks, in order: occupied, suicide, ko. Does not touch the board.
    pub fn is_legal_move(&self, point: Point, stone: Stone) -> Result<(), GoError> {
        self.board.grid().check(point)?;
        if self.board.stone_at(point).is_some() {
            return Err(IllegalMoveReason::Occupied.into());
        }
        if self.board.is_suicide(point, stone) {
            return Err(IllegalMoveReason::Suicide.into());
        }

        let hash = self.board.hash_after_play(point, stone);
        let current = self.position.current();
        // Setup-only nodes after the last move do not shift the ko position.
        let last_move = (1..=current)
            .rev()
            .find(|&i| self.tree.node(self.active_line[i]).mv.is_some());
        if last_move.is_some_and(|i| self.position_hash(i - 1) == hash) {
            return Err(IllegalMoveReason::SimpleKo.into());
        }
        let repeated = match self.config.rules.ko {
            KoRule::Simple => false,
            KoRule::PositionalSuperko => (0..=current).any(|i| self.position_hash(i) == hash),
            KoRule::SituationalSuperko => {
                let colors = self.colors_to_move();
                (0..=current).any(|i| self.position_hash(i) == hash && colors[i] == stone.opp())
            }
        };
        if repeated {
            return Err(IllegalMoveReason::Superko.into());
        }
        Ok(())
    }

    fn check_can_move(&self) -> Result<(), GoError> {
        if self.board.is_scoring_mode() {
            return Err(GoError::ScoringInProgress);
        }
        if self.has_ended() {
            return Err(GoError::GameHasEnded);
        }
        Ok(())
    }

    /// Plays a stone for the player to move. When the board is not at the
    /// last position the move starts a new variation, which becomes the
    /// active line.
    pub fn play(&mut self, point: Point) -> Result<(), GoError> {
        self.check_can_move()?;
        let stone = self.next_move_color();
        self.is_legal_move(point, stone)?;
        self.add_move(Move::play(stone, point));
        Ok(())
    }

    pub fn pass(&mut self) -> Result<(), GoError> {
        self.check_can_move()?;
        let stone = self.next_move_color();
        self.add_move(Move::pass(stone));
        self.check_passes();
        Ok(())
    }

    fn add_move(&mut self, mv: Move) {
        let current = self.position.current();
        let parent = self.active_line[current];
        let node = match self.tree.find_child(parent, &mv) {
            Some(existing) => existing,
            None => self.tree.add_child(parent, Some(mv)),
        };
        let line = self.tree.line_through(node);
        self.replace_active_line(line);
        self.next_color_override = None;
        self.move_to(current + 1);
    }

    /// Ends the game when enough consecutive passes were played.
    fn check_passes(&mut self) {
        let last = self.position.current();
        let trailing = self.active_line[1..=last]
            .iter()
            .rev()
            .take_while(|&&id| self.tree.node(id).mv.as_ref().is_some_and(Move::is_pass))
            .count();
        let since_resume = match self.resumed_at {
            Some(resumed) => trailing.min(last - resumed),
            None => trailing,
        };

        let rules = self.config.rules;
        let reason = if rules.four_passes == FourPassesRule::FourPassesEndTheGame && trailing >= 4 {
            Some(GameEndReason::FourPasses)
        } else if since_resume >= rules.passes_to_end() {
            Some(match rules.settling {
                LifeAndDeathSettlingRule::TwoPasses => GameEndReason::TwoPasses,
                LifeAndDeathSettlingRule::ThreePasses => GameEndReason::ThreePasses,
            })
        } else {
            None
        };
        if let Some(reason) = reason {
            self.end(reason);
        }
    }

    fn end(&mut self, reason: GameEndReason) {
        self.state = GameState::Ended(reason);
        info!(%reason, "game ended");
        self.events.publish(Event::GameStateChanged(self.state));
    }

    /// The player to move resigns.
    pub fn resign(&mut self) -> Result<(), GoError> {
        self.check_can_move()?;
        let stone = self.next_move_color();
        self.end(GameEndReason::Resigned(stone));
        Ok(())
    }

    /// Resumes a game that ended by passing so a life-and-death dispute can
    /// be played out.
    pub fn resume_play(&mut self) -> Result<(), GoError> {
        match self.state {
            GameState::Started => return Err(GoError::GameHasNotEnded),
            GameState::Ended(GameEndReason::Resigned(_) | GameEndReason::FourPasses) => {
                return Err(GoError::CannotResume);
            }
            GameState::Ended(_) => {}
        }
        if self.board.is_scoring_mode() {
            return Err(GoError::ScoringInProgress);
        }
        if !self.position.is_last() {
            return Err(GoError::NotAtLastPosition);
        }
        self.resumed_at = Some(self.position.current());
        self.next_color_override = None;
        self.state = GameState::Started;
        info!(position = self.position.current(), "play resumed");
        self.events.publish(Event::GameStateChanged(self.state));
        Ok(())
    }

    /// Under non-alternating dispute resolution the players may choose who
    /// moves first right after play was resumed. Returns the new color.
    pub fn switch_next_move_color(&mut self) -> Result<Stone, GoError> {
        let allowed = self.config.rules.dispute_resolution == DisputeResolutionRule::NonAlternatingPlay
            && self.state == GameState::Started
            && self.position.is_last()
            && self.resumed_at == Some(self.position.current());
        if !allowed {
            return Err(GoError::CannotSwitchNextMoveColor);
        }
        let color = self.next_move_color().opp();
        self.next_color_override = Some(color);
        debug!(%color, "next move color switched");
        Ok(color)
    }

    /// Discards the last node of the active line. Undoing after a
    /// resignation only reopens the game.
    pub fn undo(&mut self) -> Result<(), GoError> {
        if self.board.is_scoring_mode() {
            return Err(GoError::ScoringInProgress);
        }
        if let GameState::Ended(GameEndReason::Resigned(_)) = self.state {
            self.reopen();
            return Ok(());
        }
        if !self.position.is_last() {
            return Err(GoError::NotAtLastPosition);
        }
        let current = self.position.current();
        if current == 0 {
            return Err(GoError::NothingToUndo);
        }

        let node = self.active_line[current];
        self.move_to(current - 1);
        self.tree.remove_subtree(node);
        let mut line = self.active_line.clone();
        line.pop();
        self.replace_active_line(line);
        self.resumed_at = self.resumed_at.map(|resumed| resumed.min(current - 1));
        self.next_color_override = None;
        if self.has_ended() {
            self.reopen();
        }
        debug!(node, "node undone");
        Ok(())
    }

    fn reopen(&mut self) {
        self.state = GameState::Started;
        info!("game reopened");
        self.events.publish(Event::GameStateChanged(self.state));
    }

    // -- Board position --

    fn replace_active_line(&mut self, line: Vec<NodeId>) {
        let count = line.len();
        self.active_line = line;
        if count != self.position.number_of_positions() {
            self.position.set_number_of_positions(count);
            self.events.publish(Event::NumberOfPositionsChanged { count });
        }
    }

    fn move_to(&mut self, target: usize) {
        let line = &self.active_line;
        let tree = &mut self.tree;
        let board = &mut self.board;
        let events = &mut self.events;
        let changed = self.position.set_position(target, |step| {
            match step {
                PositionStep::Apply(i) => apply_node(tree, board, line[i]),
                PositionStep::Revert(i) => revert_node(tree, board, line[i]),
            }
            events.publish(Event::BoardPositionStep(step));
        });
        if changed {
            self.score = None;
            self.events.publish(Event::BoardPositionChanged { position: target });
        }
    }

    /// Walks the board to position `target` of the active line.
    ///
    /// Panics if `target` is not a valid position.
    pub fn set_board_position(&mut self, target: usize) -> Result<(), GoError> {
        if self.board.is_scoring_mode() {
            return Err(GoError::ScoringInProgress);
        }
        self.move_to(target);
        Ok(())
    }

    /// Makes the line through `node` the active line and moves the board to
    /// `node`.
    pub fn change_active_line(&mut self, node: NodeId) -> Result<(), GoError> {
        if !self.tree.contains(node) {
            return Err(GoError::UnknownNode(node));
        }
        if self.board.is_scoring_mode() {
            return Err(GoError::ScoringInProgress);
        }
        if self.has_ended() {
            return Err(GoError::GameHasEnded);
        }

        let line = self.tree.line_through(node);
        let common = self
            .active_line
            .iter()
            .zip(&line)
            .take_while(|(a, b)| a == b)
            .count();
        if self.position.current() >= common {
            self.move_to(common - 1);
        }
        self.replace_active_line(line);
        self.resumed_at = self.resumed_at.filter(|&resumed| resumed < common);
        self.next_color_override = None;
        let target = self.tree.depth(node);
        self.move_to(target);
        debug!(node, "active line changed");
        Ok(())
    }

    // -- Handicap --

    pub fn set_handicap(&mut self, count: u8) -> Result<(), GoError> {
        let points = handicap::handicap_points(self.board.grid(), count)?;
        self.set_handicap_points(points)
    }

    /// Replaces the handicap stones. Only possible while the tree holds
    /// nothing but the root.
    pub fn set_handicap_points(&mut self, mut points: Vec<Point>) -> Result<(), GoError> {
        if self.board.is_scoring_mode() {
            return Err(GoError::ScoringInProgress);
        }
        if self.tree.len() > 1 {
            return Err(GoError::MovesExist);
        }
        for &p in &points {
            self.board.grid().check(p)?;
        }
        points.sort_unstable();
        points.dedup();

        let added: Vec<Point> = points.iter().filter(|p| !self.handicap.contains(p)).copied().collect();
        let removed: Vec<Point> = self.handicap.iter().filter(|p| !points.contains(p)).copied().collect();

        let root = self.tree.node_mut(ROOT);
        if let Some(point) = root.setup.as_ref().and_then(|s| s.handicap_conflict(&added, &removed)) {
            return Err(GoError::HandicapSetupConflict(point));
        }
        if let Some(setup) = root.setup.as_mut() {
            setup.revert(&mut self.board);
        }
        for &p in &removed {
            self.board.set_point(p, None);
        }
        for &p in &added {
            self.board.set_point(p, Some(Stone::Black));
        }
        if let Some(setup) = root.setup.as_mut() {
            setup.update_for_handicap(&added, &removed)?;
            setup.apply(&mut self.board);
        }
        root.hash = self.board.hash();

        self.handicap = points;
        self.score = None;
        info!(count = self.handicap.len(), "handicap changed");
        self.events.publish(Event::HandicapPointsChanged(self.handicap.clone()));
        Ok(())
    }

    // -- Board setup --

    fn check_can_edit_setup(&self) -> Result<(), GoError> {
        self.check_can_move()?;
        if !self.position.is_last() {
            return Err(GoError::NotAtLastPosition);
        }
        Ok(())
    }

    /// The node whose setup is edited: the last node, or a new setup-only
    /// child when the last node carries a move.
    fn setup_node(&mut self) -> NodeId {
        let current = self.position.current();
        let id = self.active_line[current];
        if self.tree.node(id).mv.is_none() {
            return id;
        }
        let child = self.tree.add_child(id, None);
        let mut line = self.active_line.clone();
        line.push(child);
        self.replace_active_line(line);
        self.move_to(current + 1);
        child
    }

    /// Drops the setup-only node at the last position once it holds no
    /// setup anymore.
    fn remove_empty_setup_node(&mut self) {
        let current = self.position.current();
        let id = self.active_line[current];
        let node = self.tree.node(id);
        if current == 0 || node.mv.is_some() || node.setup.is_some() || node.first_child.is_some() {
            return;
        }
        self.move_to(current - 1);
        self.tree.remove_subtree(id);
        let mut line = self.active_line.clone();
        line.pop();
        self.replace_active_line(line);
        self.resumed_at = self.resumed_at.map(|resumed| resumed.min(current - 1));
        debug!(node = id, "empty setup node removed");
    }

    pub fn is_legal_board_setup(&self, point: Point, stone: Stone) -> Result<(), GoError> {
        self.board.grid().check(point)?;
        self.board.check_setup_stone(point, stone)?;
        Ok(())
    }

    /// Forces `point` to `stone` (or empty) at the last position.
    pub fn setup_stone(&mut self, point: Point, stone: Option<Stone>) -> Result<(), GoError> {
        self.check_can_edit_setup()?;
        self.board.grid().check(point)?;
        if let Some(stone) = stone {
            self.board.check_setup_stone(point, stone)?;
        }
        if self.board.stone_at(point) == stone {
            return Ok(());
        }

        let id = self.setup_node();
        let board_state = self.board.stone_at(point);
        let node = self.tree.node_mut(id);
        let setup = node.setup.get_or_insert_with(BoardSetup::new_applied);
        setup.record(point, stone, board_state);
        if setup.is_empty() {
            node.setup = None;
        }
        self.board.set_point(point, stone);
        node.hash = self.board.hash();

        self.score = None;
        debug!(?point, ?stone, "setup point changed");
        self.events.publish(Event::SetupPointChanged { point, stone });
        self.remove_empty_setup_node();
        Ok(())
    }

    /// Overrides who plays first after the last position.
    pub fn setup_first_move_color(&mut self, color: Option<Stone>) -> Result<(), GoError> {
        self.check_can_edit_setup()?;
        let last = self.tree.node(self.current_node());
        let existing = match &last.mv {
            Some(_) => None,
            None => last.setup.as_ref().and_then(BoardSetup::first_move_color),
        };
        if existing == color {
            return Ok(());
        }

        let id = self.setup_node();
        let node = self.tree.node_mut(id);
        let setup = node.setup.get_or_insert_with(BoardSetup::new_applied);
        setup.set_first_move_color(color);
        if setup.is_empty() {
            node.setup = None;
        }
        self.next_color_override = None;
        self.events.publish(Event::SetupFirstMoveColorChanged(color));
        self.remove_empty_setup_node();
        Ok(())
    }

    /// Removes every setup instruction of the node at the last position.
    pub fn discard_all_setup(&mut self) -> Result<(), GoError> {
        self.check_can_edit_setup()?;
        let id = self.current_node();
        let node = self.tree.node_mut(id);
        let Some(mut setup) = node.setup.take() else {
            return Ok(());
        };
        setup.revert(&mut self.board);
        node.hash = self.board.hash();

        let points: Vec<Point> = setup
            .black()
            .iter()
            .chain(setup.white())
            .chain(setup.no_stone())
            .copied()
            .collect();
        self.score = None;
        for point in points {
            let stone = self.board.stone_at(point);
            self.events.publish(Event::SetupPointChanged { point, stone });
        }
        if setup.first_move_color().is_some() {
            self.events.publish(Event::SetupFirstMoveColorChanged(None));
        }
        debug!(node = id, "setup discarded");
        self.remove_empty_setup_node();
        Ok(())
    }

    // -- Scoring --

    fn scoring_context(&self) -> ScoringContext {
        let mut ctx = ScoringContext {
            rules: self.config.rules,
            komi: self.config.komi,
            handicap: self.handicap.len() as u32,
            captures: [0; 2],
            stones_played: [0; 2],
            passes: [0; 2],
        };
        for mv in self.moves() {
            let i = mv.player.index();
            match mv.kind {
                MoveKind::Play => {
                    ctx.stones_played[i] += 1;
                    ctx.captures[i] += mv.captured().len() as u32;
                }
                MoveKind::Pass => ctx.passes[i] += 1,
            }
        }
        ctx
    }

    /// Starts scoring the current position. Groups containing a point of
    /// `dead_seed` start out dead; everything else is alive. After four
    /// passes every stone is alive regardless of the seed.
    pub fn enable_scoring(&mut self, dead_seed: Option<&[Point]>) -> Result<&Score, GoError> {
        if self.board.is_scoring_mode() {
            return Err(GoError::ScoringInProgress);
        }
        self.board.enable_scoring_mode();
        self.scoring_session += 1;
        let four_passes = self.state == GameState::Ended(GameEndReason::FourPasses);
        if let Some(points) = dead_seed.filter(|_| !four_passes) {
            score::mark_dead_stones(&mut self.board, points)?;
        }
        info!(position = self.position.current(), "scoring started");
        self.events.publish(Event::ScoringStarted);
        self.calculate_score()
    }

    pub fn disable_scoring(&mut self) {
        if !self.board.is_scoring_mode() {
            return;
        }
        self.board.disable_scoring_mode();
        self.scoring_session += 1;
        self.score = None;
        info!("scoring ended");
        self.events.publish(Event::ScoringEnded);
    }

    pub fn toggle_dead_state(&mut self, point: Point, cascade: bool) -> Result<&Score, GoError> {
        score::toggle_dead_state(&mut self.board, point, cascade)?;
        self.scoring_session += 1;
        self.calculate_score()
    }

    pub fn toggle_seki_state(&mut self, point: Point) -> Result<&Score, GoError> {
        score::toggle_seki_state(&mut self.board, point)?;
        self.scoring_session += 1;
        self.calculate_score()
    }

    /// Recomputes the score from the current marks.
    pub fn calculate_score(&mut self) -> Result<&Score, GoError> {
        let ctx = self.scoring_context();
        let score = score::calculate(&mut self.board, &ctx)?;
        self.events.publish(Event::ScoreCalculated(Box::new(score.clone())));
        Ok(&*self.score.insert(score))
    }

    /// Calculates the score on a copy of the board on a worker thread.
    pub fn start_score_calculation(&self) -> Result<ScoreCalculation, GoError> {
        if !self.board.is_scoring_mode() {
            return Err(GoError::ScoringNotEnabled);
        }
        Ok(ScoreCalculation::start(
            self.board.clone(),
            self.scoring_context(),
            self.scoring_session,
        ))
    }

    /// Waits for a background calculation and adopts its result unless the
    /// marks changed in the meantime. Returns whether the result was used.
    pub fn finish_score_calculation(&mut self, calculation: ScoreCalculation) -> Result<bool, GoError> {
        let (session, board, score) = calculation.wait()?;
        if session != self.scoring_session || !self.board.is_scoring_mode() {
            warn!(session, current = self.scoring_session, "discarding stale score calculation");
            return Ok(false);
        }
        self.board = board;
        self.events.publish(Event::ScoreCalculated(Box::new(score.clone())));
        self.score = Some(score);
        Ok(true)
    }

    // -- Snapshot --

    pub fn to_snapshot(&self) -> Result<String, GoError> {
        serde_json::to_string(self).map_err(|e| GoError::Snapshot(e.to_string()))
    }

    /// Restores a game written by `to_snapshot`. Event subscribers are not
    /// part of a snapshot.
    pub fn from_snapshot(json: &str) -> Result<Self, GoError> {
        let game: Game = serde_json::from_str(json).map_err(|e| GoError::Snapshot(e.to_string()))?;
        game.board.verify().map_err(GoError::Snapshot)?;
        game.check_history().map_err(GoError::Snapshot)?;
        Ok(game)
    }

    /// The active line must be a root-to-leaf chain of live nodes, with
    /// exactly the nodes up to the current position applied to the board.
    fn check_history(&self) -> Result<(), String> {
        let count = self.position.number_of_positions();
        let current = self.position.current();
        if self.active_line.len() != count {
            return Err("active line does not match the board position".to_string());
        }
        if current >= count {
            return Err(format!("board position {current} is out of range 0..{count}"));
        }
        if self.resumed_at.is_some_and(|resumed| resumed >= count) {
            return Err("resume position is out of range".to_string());
        }
        if self.active_line.first() != Some(&ROOT) {
            return Err("active line does not start at the root".to_string());
        }

        for (i, &id) in self.active_line.iter().enumerate() {
            if !self.tree.contains(id) {
                return Err(format!("node {id} is not part of the tree"));
            }
            let node = self.tree.node(id);
            if i > 0 && node.parent != Some(self.active_line[i - 1]) {
                return Err(format!("node {id} is not a child of the previous node"));
            }
            let applied = i <= current;
            let move_applied = node.mv.as_ref().is_none_or(|mv| mv.is_applied() == applied);
            let setup_applied = node.setup.as_ref().is_none_or(|setup| setup.is_applied() == applied);
            if !move_applied || !setup_applied {
                return Err(format!("node {id} does not match the board position"));
            }
        }
        if self.tree.node(self.active_line[current]).hash != self.board.hash() {
            return Err("board does not match the current node".to_string());
        }
        Ok(())
    }
}

fn apply_node(tree: &mut GameTree, board: &mut Board, id: NodeId) {
    let node = tree.node_mut(id);
    if let Some(setup) = node.setup.as_mut() {
        setup.apply(board);
    }
    if let Some(mv) = node.mv.as_mut() {
        mv.do_it(board);
    }
    node.hash = board.hash();
}

fn revert_node(tree: &mut GameTree, board: &mut Board, id: NodeId) {
    let node = tree.node_mut(id);
    if let Some(mv) = node.mv.as_mut() {
        mv.undo(board);
    }
    if let Some(setup) = node.setup.as_mut() {
        setup.revert(board);
    }
}
