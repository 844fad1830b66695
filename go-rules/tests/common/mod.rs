#![allow(dead_code)]

use std::sync::Once;

use go_rules::{Board, Game, GameConfig, Rules};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Routes `tracing` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn new_game(size: u8, rules: Rules) -> Game {
    init_tracing();
    Game::new(GameConfig {
        cols: size,
        rows: size,
        rules,
        ..GameConfig::default()
    })
    .unwrap()
}

/// Regions and total liberties, the figures that must agree between the
/// incremental board and one rebuilt from scratch.
pub fn region_totals(board: &Board) -> (usize, usize) {
    let liberties = board.region_ids().into_iter().map(|id| board.liberties(id)).sum();
    (board.region_count(), liberties)
}
