mod common;

use go_rules::{Game, GoError, Point, ROOT, Rules, Stone};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use common::{new_game, region_totals};

fn legal_points(game: &Game) -> Vec<Point> {
    let color = game.next_move_color();
    game.grid()
        .points()
        .filter(|&p| game.is_legal_move(p, color).is_ok())
        .collect()
}

/// Plays up to `plies` random legal stones. Returns the stone layout after
/// every position.
fn play_randomly(game: &mut Game, rng: &mut Xoshiro256StarStar, plies: usize) -> Vec<Vec<Option<Stone>>> {
    let snapshot = |game: &Game| -> Vec<Option<Stone>> {
        game.grid().points().map(|p| game.board().stone_at(p)).collect()
    };
    let mut layouts = vec![snapshot(game)];
    for _ in 0..plies {
        let legal = legal_points(game);
        let Some(&point) = legal.choose(rng) else {
            break;
        };
        game.play(point).unwrap();
        layouts.push(snapshot(game));
    }
    layouts
}

#[test]
fn incremental_regions_match_rebuild() {
    for seed in 0..6 {
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let mut game = new_game(7, Rules::chinese());
        for _ in 0..150 {
            let legal = legal_points(&game);
            let Some(&point) = legal.choose(&mut rng) else {
                break;
            };
            game.play(point).unwrap();

            let board = game.board();
            board.verify().unwrap();
            let rebuilt = board.rebuild();
            assert_eq!(board.partition(), rebuilt.partition(), "seed {seed}");
            assert_eq!(region_totals(board), region_totals(&rebuilt), "seed {seed}");
            assert_eq!(board.hash(), board.recalculate_hash(), "seed {seed}");
        }
    }
}

#[test]
fn play_then_undo_restores_the_board() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(42);
    let mut game = new_game(9, Rules::japanese());
    play_randomly(&mut game, &mut rng, 60);

    for _ in 0..20 {
        let legal = legal_points(&game);
        let Some(&point) = legal.choose(&mut rng) else {
            break;
        };
        let before = game.board().partition();
        let hash = game.board().hash();
        game.play(point).unwrap();
        game.undo().unwrap();
        assert_eq!(game.board().partition(), before);
        assert_eq!(game.board().hash(), hash);
        game.board().verify().unwrap();

        // Keep the game moving so later iterations see other positions.
        game.play(point).unwrap();
    }
}

#[test]
fn position_round_trip_through_history() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(7);
    let mut game = new_game(9, Rules::aga());
    let layouts = play_randomly(&mut game, &mut rng, 80);
    let last = game.board_position().last();
    assert_eq!(layouts.len(), last + 1);

    game.set_board_position(0).unwrap();
    assert!(game.board().is_empty());
    game.set_board_position(last).unwrap();

    for _ in 0..40 {
        let target = rng.gen_range(0..=last);
        game.set_board_position(target).unwrap();
        let layout: Vec<_> = game.grid().points().map(|p| game.board().stone_at(p)).collect();
        assert_eq!(layout, layouts[target], "position {target}");
        assert_eq!(game.board().hash(), game.tree().node(game.current_node()).hash);
        game.board().verify().unwrap();
    }
}

#[test]
fn positional_superko_never_repeats_a_position() {
    for seed in 0..4 {
        let mut rng = Xoshiro256StarStar::seed_from_u64(100 + seed);
        let mut game = new_game(5, Rules::chinese());
        play_randomly(&mut game, &mut rng, 120);

        let hashes: Vec<_> = game
            .active_line()
            .iter()
            .map(|&id| game.tree().node(id).hash)
            .collect();
        let mut unique = hashes.clone();
        unique.sort_unstable_by_key(|h| h.value());
        unique.dedup();
        assert_eq!(unique.len(), hashes.len(), "seed {seed}");
    }
}

fn play_or_pass(game: &mut Game, rng: &mut Xoshiro256StarStar) {
    let legal = legal_points(game);
    match legal.choose(rng) {
        Some(&point) => game.play(point).unwrap(),
        None => game.pass().unwrap(),
    }
}

fn check_consistency(game: &Game, context: &str) {
    let board = game.board();
    board.verify().unwrap_or_else(|e| panic!("{context}: {e}"));
    let rebuilt = board.rebuild();
    assert_eq!(board.partition(), rebuilt.partition(), "{context}");
    assert_eq!(region_totals(board), region_totals(&rebuilt), "{context}");
    assert_eq!(board.hash(), board.recalculate_hash(), "{context}");
    assert_eq!(board.hash(), game.tree().node(game.current_node()).hash, "{context}");
}

/// Moves, passes, setup edits, undo, jumps into the past and line changes in
/// random order. The board must stay consistent with the history after each.
#[test]
fn mixed_history_keeps_board_consistent() {
    for seed in 0..5 {
        let mut rng = Xoshiro256StarStar::seed_from_u64(500 + seed);
        let mut game = new_game(7, Rules::japanese());
        for step in 0..250 {
            let context = format!("seed {seed} step {step}");
            if game.has_ended() {
                let last = game.board_position().last();
                game.set_board_position(last).unwrap();
                if game.resume_play().is_err() {
                    game.undo().unwrap();
                }
                check_consistency(&game, &context);
            }

            match rng.gen_range(0..10) {
                0 => game.pass().unwrap(),
                1 | 2 => {
                    let last = game.board_position().last();
                    game.set_board_position(last).unwrap();
                    let points: Vec<Point> = game.grid().points().collect();
                    let point = *points.choose(&mut rng).unwrap();
                    let stone = [None, Some(Stone::Black), Some(Stone::White)].choose(&mut rng).copied().flatten();
                    match game.setup_stone(point, stone) {
                        Ok(()) | Err(GoError::IllegalSetup(_)) => {}
                        Err(e) => panic!("{context}: {e}"),
                    }
                }
                3 => {
                    let last = game.board_position().last();
                    game.set_board_position(rng.gen_range(0..=last)).unwrap();
                    check_consistency(&game, &context);
                    play_or_pass(&mut game, &mut rng);
                }
                4 => match game.undo() {
                    Ok(()) | Err(GoError::NothingToUndo) | Err(GoError::NotAtLastPosition) => {}
                    Err(e) => panic!("{context}: {e}"),
                },
                5 => {
                    let mut nodes = vec![ROOT];
                    let mut pending = vec![ROOT];
                    while let Some(id) = pending.pop() {
                        let children = game.tree().children(id);
                        nodes.extend(&children);
                        pending.extend(children);
                    }
                    let node = *nodes.choose(&mut rng).unwrap();
                    game.change_active_line(node).unwrap();
                }
                _ => play_or_pass(&mut game, &mut rng),
            }
            check_consistency(&game, &context);

            if step % 50 == 49 {
                let restored = Game::from_snapshot(&game.to_snapshot().unwrap()).unwrap();
                assert_eq!(restored.board().partition(), game.board().partition(), "{context}");
                assert_eq!(restored.tree(), game.tree(), "{context}");
            }
        }
    }
}
