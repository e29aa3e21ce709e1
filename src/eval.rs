//! Position evaluation, shared by the minimax search and the evolutionary
//! engine. Scores are from P2's (the maximizing side's) perspective.

use crate::board::{Board, Color, Piece, ORTHOGONAL, ROWS, COLS};

/// Score a board. `depth` is the search depth remaining at the node being
/// evaluated; it sweetens terminal wins so that faster wins rank higher.
/// The evolutionary fitness function is `evaluate(board, 0)`.
pub fn evaluate(board: &Board, depth: i32) -> i32 {
    // Victories outweigh everything else.
    if board.p2_score() == 2 {
        return 100 + depth;
    }
    if board.p1_score() == 2 {
        return -100 - depth;
    }

    let mut score = 0;

    // Being one capture from winning.
    if board.p1_score() == 1 {
        score -= 10;
    }
    if board.p2_score() == 1 {
        score += 10;
    }

    for piece in board.side_pieces(Color::P1) {
        score -= piece_score(piece);
    }
    for piece in board.side_pieces(Color::P2) {
        score += piece_score(piece);
    }

    // Standing next to the Hole is an exploitable liability.
    let hole = board.hole();
    for (dr, dc) in ORTHOGONAL {
        match board.piece_at(hole.row + dr, hole.col + dc).map(|p| p.color) {
            Some(Color::P1) => score += 1,
            Some(Color::P2) => score -= 1,
            _ => {}
        }
    }

    score
}

/// Centrality of one piece: 2 for a fully interior cell, 1 less for each
/// coordinate sitting on the edge of the playable area, 0 once captured.
fn piece_score(piece: &Piece) -> i32 {
    if piece.is_captured() {
        return 0;
    }
    let mut score = 2;
    if piece.row == 1 || piece.row == ROWS as i32 - 2 {
        score -= 1;
    }
    if piece.col == 1 || piece.col == COLS as i32 - 2 {
        score -= 1;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_scores_dominate() {
        let mut won = Board::with_pieces(&[(2, 2)], &[(4, 4)], (3, 3), Color::P1);
        won.set_scores(0, 2);
        let mut lost = Board::with_pieces(&[(2, 2)], &[(4, 4)], (3, 3), Color::P1);
        lost.set_scores(2, 0);
        let open = Board::new(Color::P1);

        assert_eq!(evaluate(&won, 3), 103);
        assert_eq!(evaluate(&lost, 3), -103);
        assert!(evaluate(&won, 0) > evaluate(&open, 0));
        assert!(evaluate(&lost, 0) < evaluate(&open, 0));
        // Faster wins are preferred.
        assert!(evaluate(&won, 3) > evaluate(&won, 1));
    }

    #[test]
    fn test_one_capture_bonus() {
        let mut board = Board::with_pieces(&[], &[], (3, 3), Color::P1);
        assert_eq!(evaluate(&board, 0), 0);
        board.set_scores(0, 1);
        assert_eq!(evaluate(&board, 0), 10);
        board.set_scores(1, 0);
        assert_eq!(evaluate(&board, 0), -10);
        board.set_scores(1, 1);
        assert_eq!(evaluate(&board, 0), 0);
    }

    #[test]
    fn test_centrality_term() {
        // Fully central P2 piece: +2.
        let board = Board::with_pieces(&[], &[(3, 4)], (1, 1), Color::P1);
        assert_eq!(evaluate(&board, 0), 2);
        // Edge row: +1; playable corner: 0.
        let board = Board::with_pieces(&[], &[(1, 3)], (3, 3), Color::P1);
        assert_eq!(evaluate(&board, 0), 1);
        let board = Board::with_pieces(&[], &[(5, 5)], (3, 3), Color::P1);
        assert_eq!(evaluate(&board, 0), 0);
        // P1 pieces count with the opposite sign.
        let board = Board::with_pieces(&[(3, 4)], &[], (1, 1), Color::P1);
        assert_eq!(evaluate(&board, 0), -2);
    }

    #[test]
    fn test_captured_pieces_score_nothing() {
        let mut board = Board::with_pieces(&[(1, 3)], &[(2, 3)], (5, 5), Color::P2);
        assert!(board.take_turn(2, 3, 1, 3, true));
        // P1's only piece is captured: no centrality for it, +10 for P2's
        // capture, +1 centrality for P2 now on the edge row at (1,3).
        assert_eq!(evaluate(&board, 0), 11);
    }

    #[test]
    fn test_hole_adjacency_term() {
        // P1 next to the Hole is an opportunity for P2.
        let board = Board::with_pieces(&[(3, 4)], &[], (3, 3), Color::P1);
        assert_eq!(evaluate(&board, 0), -2 + 1);
        // P2 next to the Hole is a liability.
        let board = Board::with_pieces(&[], &[(3, 4)], (3, 3), Color::P1);
        assert_eq!(evaluate(&board, 0), 2 - 1);
    }

    #[test]
    fn test_starting_position_is_balanced() {
        let board = Board::new(Color::P1);
        assert_eq!(evaluate(&board, 0), 0);
    }
}
