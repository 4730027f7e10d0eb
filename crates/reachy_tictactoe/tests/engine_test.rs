//! Decision engine properties over every reachable position.

use reachy_tictactoe::{
    Board, CellValue, EngineError, Move, Mover, Outcome, Position, choose_move, evaluate,
    minimax_value,
};
use std::collections::HashSet;

/// Every board reachable by legal alternating play, with the side to move.
fn reachable() -> Vec<(Board, Mover)> {
    let mut seen = HashSet::new();
    let mut stack = vec![(Board::EMPTY, Mover::Robot), (Board::EMPTY, Mover::Human)];
    let mut out = Vec::new();
    while let Some((board, to_move)) = stack.pop() {
        if !seen.insert((board, to_move)) {
            continue;
        }
        if evaluate(&board).unwrap().is_terminal() {
            continue;
        }
        out.push((board, to_move));
        for position in board.vacant_positions() {
            let next = board.apply(Move::new(position, to_move)).unwrap();
            stack.push((next, to_move.opponent()));
        }
    }
    out
}

fn value_after(board: &Board, mv: Move) -> i8 {
    let next = board.apply(mv).unwrap();
    minimax_value(&next, mv.mover.opponent()).unwrap()
}

#[test]
fn test_choice_is_never_worse_than_best() {
    for (board, mover) in reachable() {
        let decision = choose_move(&board, mover).unwrap();
        let values: Vec<i8> = board
            .vacant_positions()
            .map(|p| value_after(&board, Move::new(p, mover)))
            .collect();
        let best = match mover {
            Mover::Robot => *values.iter().max().unwrap(),
            Mover::Human => *values.iter().min().unwrap(),
        };
        assert_eq!(decision.value, best, "board {board}, {mover} to move");
        assert_eq!(
            value_after(&board, decision.mv),
            best,
            "board {board}, {mover} to move"
        );
        assert!(board.is_vacant(decision.mv.position));
        assert_eq!(decision.mv.mover, mover);
    }
}

#[test]
fn test_immediate_win_always_taken() {
    for (board, _) in reachable() {
        let winning: Vec<Position> = board
            .vacant_positions()
            .filter(|p| {
                let next = board.apply(Move::new(*p, Mover::Robot)).unwrap();
                evaluate(&next) == Ok(Outcome::Won(Mover::Robot))
            })
            .collect();
        if winning.is_empty() {
            continue;
        }
        let decision = choose_move(&board, Mover::Robot).unwrap();
        assert!(
            winning.contains(&decision.mv.position),
            "board {board}: chose {} over {winning:?}",
            decision.mv.position
        );
    }
}

#[test]
fn test_immediate_threat_blocked_without_own_win() {
    for (board, _) in reachable() {
        let own_win = board.vacant_positions().any(|p| {
            let next = board.apply(Move::new(p, Mover::Robot)).unwrap();
            evaluate(&next) == Ok(Outcome::Won(Mover::Robot))
        });
        let threats: Vec<Position> = board
            .vacant_positions()
            .filter(|p| {
                let next = board.apply(Move::new(*p, Mover::Human)).unwrap();
                evaluate(&next) == Ok(Outcome::Won(Mover::Human))
            })
            .collect();
        if own_win || threats.len() != 1 {
            continue;
        }
        let decision = choose_move(&board, Mover::Robot).unwrap();
        assert_eq!(decision.mv.position, threats[0], "board {board}");
    }
}

#[test]
fn test_deterministic_across_calls() {
    for (board, mover) in reachable().into_iter().take(200) {
        assert_eq!(choose_move(&board, mover), choose_move(&board, mover));
    }
}

#[test]
fn test_safe_to_call_from_many_threads() {
    let positions = reachable();
    let expected: Vec<_> = positions
        .iter()
        .map(|(b, m)| choose_move(b, *m).unwrap())
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = positions
            .chunks(positions.len() / 4 + 1)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|(b, m)| choose_move(b, *m).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let actual: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(actual, expected);
    });
}

#[test]
fn test_perfect_play_always_draws() {
    for first in [Mover::Robot, Mover::Human] {
        let mut board = Board::EMPTY;
        let mut to_move = first;
        let predicted = minimax_value(&board, to_move).unwrap();
        while !evaluate(&board).unwrap().is_terminal() {
            let decision = choose_move(&board, to_move).unwrap();
            assert_eq!(decision.value, predicted, "value drifted on {board}");
            board = board.apply(decision.mv).unwrap();
            to_move = to_move.opponent();
        }
        assert_eq!(evaluate(&board), Ok(Outcome::Draw));
        assert_eq!(board.count(CellValue::Empty), 0);
    }
}

#[test]
fn test_full_board_reports_game_over() {
    let board: Board = "HRH/HRR/RHH".parse().unwrap();
    assert_eq!(
        choose_move(&board, Mover::Robot),
        Err(EngineError::GameOver {
            outcome: Outcome::Draw
        })
    );
}
