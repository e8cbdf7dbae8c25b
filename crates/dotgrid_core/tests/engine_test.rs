//! Scenario tests for the game engine rules.

use dotgrid_core::{Dot, Game, GameStatus, MoveError, MoveOutcome, Seat, Winner};

fn two_player_game(grid_size: u32) -> Game {
    let mut game = Game::new("TEST01", grid_size);
    game.add_player("alice").expect("first seat");
    game.add_player("bob").expect("second seat");
    game
}

fn play(game: &mut Game, player: &str, from: (i32, i32), to: (i32, i32)) -> MoveOutcome {
    game.attempt_move(player, Dot::new(from.0, from.1), Dot::new(to.0, to.1))
        .expect("legal move")
}

#[test]
fn minimal_board_is_won_by_the_closing_player() {
    let mut game = two_player_game(2);

    let top = play(&mut game, "alice", (0, 0), (1, 0));
    assert_eq!(top.completed_boxes, 0);
    assert_eq!(top.next_turn, "bob");

    play(&mut game, "bob", (0, 0), (0, 1));
    play(&mut game, "alice", (1, 0), (1, 1));
    let closing = play(&mut game, "bob", (0, 1), (1, 1));

    assert_eq!(closing.completed_boxes, 1);
    assert_eq!(closing.next_turn, "bob");
    assert_eq!(game.status(), GameStatus::Finished);

    let snapshot = game.snapshot();
    assert_eq!(snapshot.winner, Some(Winner::Player("bob".into())));
    assert_eq!(snapshot.scores["bob"], 1);
    assert_eq!(snapshot.scores["alice"], 0);
    assert_eq!(snapshot.boxes["0,0"], "bob");
}

#[test]
fn shared_interior_edge_completes_two_boxes_at_once() {
    // Two-box strip on the top row of a 3x3-dot board: fill every edge
    // of boxes (0,0) and (1,0) except the shared interior edge, then
    // close both with one move.
    let mut game = two_player_game(3);

    play(&mut game, "alice", (0, 0), (1, 0));
    play(&mut game, "bob", (0, 0), (0, 1));
    play(&mut game, "alice", (0, 1), (1, 1));
    play(&mut game, "bob", (1, 0), (2, 0));
    play(&mut game, "alice", (2, 0), (2, 1));
    play(&mut game, "bob", (1, 1), (2, 1));

    let double = play(&mut game, "alice", (1, 0), (1, 1));
    assert_eq!(double.completed_boxes, 2);
    assert_eq!(double.next_turn, "alice");

    let snapshot = game.snapshot();
    assert_eq!(snapshot.scores["alice"], 2);
    assert_eq!(snapshot.boxes["0,0"], "alice");
    assert_eq!(snapshot.boxes["1,0"], "alice");
    // Two of four boxes claimed: the game goes on.
    assert_eq!(snapshot.status, GameStatus::Playing);
    assert_eq!(snapshot.current_turn, Some("alice".into()));
}

#[test]
fn full_game_can_end_in_a_draw() {
    let mut game = two_player_game(3);

    play(&mut game, "alice", (0, 0), (1, 0));
    play(&mut game, "bob", (0, 0), (0, 1));
    play(&mut game, "alice", (0, 1), (1, 1));
    play(&mut game, "bob", (1, 0), (2, 0));
    // Alice closes box (0,0) and keeps the turn.
    let capture = play(&mut game, "alice", (1, 0), (1, 1));
    assert_eq!(capture.completed_boxes, 1);
    assert_eq!(capture.next_turn, "alice");
    play(&mut game, "alice", (2, 0), (2, 1));
    // Bob closes box (1,0) and keeps the turn.
    let capture = play(&mut game, "bob", (1, 1), (2, 1));
    assert_eq!(capture.completed_boxes, 1);
    play(&mut game, "bob", (0, 1), (0, 2));
    play(&mut game, "alice", (0, 2), (1, 2));
    // Bob closes box (0,1) and keeps the turn.
    let capture = play(&mut game, "bob", (1, 1), (1, 2));
    assert_eq!(capture.completed_boxes, 1);
    play(&mut game, "bob", (2, 1), (2, 2));
    // Alice closes the last box.
    let last = play(&mut game, "alice", (1, 2), (2, 2));
    assert_eq!(last.completed_boxes, 1);

    let snapshot = game.snapshot();
    assert_eq!(snapshot.status, GameStatus::Finished);
    assert_eq!(snapshot.scores["alice"], 2);
    assert_eq!(snapshot.scores["bob"], 2);
    assert_eq!(snapshot.winner, Some(Winner::Draw));
}

#[test]
fn turn_passes_only_without_a_capture() {
    let mut game = two_player_game(4);
    let outcome = play(&mut game, "alice", (0, 0), (1, 0));
    assert_eq!(outcome.next_turn, "bob");
    assert_eq!(game.snapshot().current_turn, Some("bob".into()));
}

#[test]
fn duplicate_edge_fails_and_leaves_state_unchanged() {
    let mut game = two_player_game(4);
    play(&mut game, "alice", (0, 0), (1, 0));
    let before = game.snapshot();

    // Same edge, opposite orientation: canonicalization must catch it.
    let result = game.attempt_move("bob", Dot::new(1, 0), Dot::new(0, 0));
    assert_eq!(result, Err(MoveError::EdgeTaken));
    assert_eq!(game.snapshot(), before);
}

#[test]
fn moving_out_of_turn_is_rejected() {
    let mut game = two_player_game(4);
    let result = game.attempt_move("bob", Dot::new(0, 0), Dot::new(1, 0));
    assert_eq!(result, Err(MoveError::NotYourTurn));

    // An id that never joined is treated the same way.
    let result = game.attempt_move("mallory", Dot::new(0, 0), Dot::new(1, 0));
    assert_eq!(result, Err(MoveError::NotYourTurn));
}

#[test]
fn malformed_edges_are_rejected() {
    let mut game = two_player_game(4);
    for (from, to) in [
        ((0, 0), (1, 1)), // diagonal
        ((0, 0), (2, 0)), // two dots apart
        ((2, 2), (2, 2)), // degenerate
        ((3, 3), (4, 3)), // endpoint off the board
        ((-1, 0), (0, 0)),
    ] {
        let result = game.attempt_move(
            "alice",
            Dot::new(from.0, from.1),
            Dot::new(to.0, to.1),
        );
        assert!(
            matches!(result, Err(MoveError::InvalidEdge(_))),
            "{from:?}-{to:?} should be invalid"
        );
    }
    // None of the rejections consumed the turn.
    assert_eq!(game.snapshot().current_turn, Some("alice".into()));
}

#[test]
fn moves_are_rejected_until_both_seats_fill() {
    let mut game = Game::new("TEST01", 3);
    game.add_player("alice").unwrap();
    let result = game.attempt_move("alice", Dot::new(0, 0), Dot::new(1, 0));
    assert_eq!(result, Err(MoveError::GameNotActive));
}

#[test]
fn moves_are_rejected_after_the_game_finishes() {
    let mut game = two_player_game(2);
    play(&mut game, "alice", (0, 0), (1, 0));
    play(&mut game, "bob", (0, 0), (0, 1));
    play(&mut game, "alice", (1, 0), (1, 1));
    play(&mut game, "bob", (0, 1), (1, 1));
    assert_eq!(game.status(), GameStatus::Finished);

    let result = game.attempt_move("bob", Dot::new(0, 1), Dot::new(0, 0));
    assert_eq!(result, Err(MoveError::GameNotActive));
}

#[test]
fn rejoining_is_idempotent() {
    let mut game = two_player_game(3);
    assert_eq!(game.add_player("alice"), Ok(Seat::P1));
    assert_eq!(game.add_player("bob"), Ok(Seat::P2));
    assert_eq!(game.players().len(), 2);
    assert_eq!(game.status(), GameStatus::Playing);
}

#[test]
fn third_player_is_turned_away() {
    let mut game = two_player_game(3);
    assert!(game.add_player("carol").is_err());
    assert_eq!(game.players().len(), 2);
}

#[test]
fn exhausting_every_edge_claims_every_box() {
    for grid_size in 2..=4u32 {
        let mut game = two_player_game(grid_size);
        let n = grid_size as i32;

        let mut edges = Vec::new();
        for y in 0..n {
            for x in 0..n - 1 {
                edges.push(((x, y), (x + 1, y)));
            }
        }
        for x in 0..n {
            for y in 0..n - 1 {
                edges.push(((x, y), (x, y + 1)));
            }
        }
        assert_eq!(edges.len() as u32, 2 * grid_size * (grid_size - 1));

        for (from, to) in edges {
            let mover = game
                .snapshot()
                .current_turn
                .expect("a seat holds the turn");
            play(&mut game, &mover, from, to);

            // Score sum tracks claimed boxes after every single move.
            let snapshot = game.snapshot();
            let score_sum: u32 = snapshot.scores.values().sum();
            assert_eq!(score_sum, snapshot.boxes.len() as u32);
        }

        let snapshot = game.snapshot();
        assert_eq!(snapshot.status, GameStatus::Finished);
        assert_eq!(
            snapshot.boxes.len() as u32,
            (grid_size - 1) * (grid_size - 1)
        );
        assert!(snapshot.winner.is_some(), "grid {grid_size} has no winner");
    }
}

#[test]
fn snapshots_are_independent_of_later_moves() {
    let mut game = two_player_game(3);
    let before = game.snapshot();
    play(&mut game, "alice", (0, 0), (1, 0));
    assert!(before.edges.is_empty());
    assert_eq!(game.snapshot().edges, vec!["0,0-1,0".to_string()]);
}

#[test]
fn snapshot_edges_are_sorted_canonical_strings() {
    let mut game = two_player_game(3);
    play(&mut game, "alice", (1, 1), (2, 1));
    play(&mut game, "bob", (0, 0), (1, 0));
    let snapshot = game.snapshot();
    assert_eq!(snapshot.edges, vec!["0,0-1,0".to_string(), "1,1-2,1".to_string()]);
}
