//! Move selection. `Automa` runs a depth-limited minimax with alpha-beta
//! pruning over the board's snapshot/restore protocol; the top difficulty
//! tier delegates to the single-generation evolutionary engine instead.

use log::debug;

use crate::board::{Board, Color, Move};
use crate::eval::evaluate;
use crate::genetic;

/// Difficulty 5 switches from minimax to the evolutionary engine; lower
/// levels are used directly as the minimax depth.
const GENETIC_DIFFICULTY: u8 = 5;

pub struct Automa {
    nodes: u64,
}

impl Automa {
    pub fn new() -> Self {
        Self { nodes: 0 }
    }

    /// Nodes expanded by the most recent search.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Pick a move for P2 on the given board. The board is mutated during
    /// the search but is always back in its starting state on return. The
    /// move is `None` only when no legal candidate exists.
    pub fn find_move(&mut self, board: &mut Board, difficulty: u8) -> (i32, Option<Move>) {
        if difficulty == GENETIC_DIFFICULTY {
            return genetic::evolve(board);
        }

        self.nodes = 0;
        let result = self.minmax(board, i32::from(difficulty), true, i32::MIN, i32::MAX);
        debug!("minimax depth {} searched {} nodes", difficulty, self.nodes);
        result
    }

    /// Depth-limited minimax. The maximizing side is always P2; the reported
    /// move is only meaningful at the top-level maximizing call.
    fn minmax(
        &mut self,
        board: &mut Board,
        depth: i32,
        maximizing: bool,
        mut alpha: i32,
        mut beta: i32,
    ) -> (i32, Option<Move>) {
        if depth == 0 || board.p1_score() == 2 || board.p2_score() == 2 {
            return (evaluate(board, depth), None);
        }
        self.nodes += 1;

        let side = if maximizing { Color::P2 } else { Color::P1 };
        let candidates = board.candidate_moves(side);

        if maximizing {
            let mut best_move = None;
            let mut current_max = i32::MIN;
            for mv in candidates {
                let Some(chain) = board.try_move(mv.from_row, mv.from_col, mv.to_row, mv.to_col)
                else {
                    continue;
                };
                let state = board.save_state(&chain);
                if !board.take_turn(mv.from_row, mv.from_col, mv.to_row, mv.to_col, true) {
                    continue;
                }
                // Keep the first legal move as a fallback so a move is
                // always reported when one exists.
                if best_move.is_none() {
                    best_move = Some(mv);
                }
                let (score, _) = self.minmax(board, depth - 1, false, alpha, beta);
                board.restore_state(state);
                if score > current_max {
                    current_max = score;
                    best_move = Some(mv);
                    alpha = alpha.max(score);
                    if score >= beta {
                        break;
                    }
                }
            }
            (current_max, best_move)
        } else {
            let mut current_min = i32::MAX;
            for mv in candidates {
                let Some(chain) = board.try_move(mv.from_row, mv.from_col, mv.to_row, mv.to_col)
                else {
                    continue;
                };
                let state = board.save_state(&chain);
                if !board.take_turn(mv.from_row, mv.from_col, mv.to_row, mv.to_col, true) {
                    continue;
                }
                let (score, _) = self.minmax(board, depth - 1, true, alpha, beta);
                board.restore_state(state);
                if score < current_min {
                    current_min = score;
                    beta = beta.min(score);
                    if score <= alpha {
                        break;
                    }
                }
            }
            (current_min, None)
        }
    }
}

impl Default for Automa {
    fn default() -> Self {
        Self::new()
    }
}
