//! Single-generation evolutionary move selection, the heaviest difficulty
//! tier. One combinatorial pass trades search depth for breadth: every legal
//! move for both sides seeds the population, a binary tournament keeps the
//! fitter half per side, and every surviving P2 move is recombined with every
//! surviving P1 outcome. The best-scoring hybrid decides the move.

use log::debug;
use rand::Rng;

use crate::board::{Board, Color, Move};
use crate::eval::evaluate;

/// One population member: a legal move, the side it belongs to, and the
/// board that results from playing it.
struct Chromosome {
    mv: Move,
    side: Color,
    board: Board,
}

/// Run one generation and return the fittest P2 move. The board is mutated
/// while the population is built but is restored before returning. The move
/// is `None` when no hybrid offspring survives.
pub fn evolve(board: &mut Board) -> (i32, Option<Move>) {
    let population = initialize_population(board);
    debug!("population of {} candidate moves", population.len());

    let mut rng = rand::rng();
    let (p2_selected, p1_selected) = selection(&population, &mut rng);
    debug!(
        "selected {} P2 and {} P1 chromosomes",
        p2_selected.len(),
        p1_selected.len()
    );

    let mut best: Option<(i32, Move)> = None;
    for &x in &p2_selected {
        for &y in &p1_selected {
            // The P2 move may no longer apply on this P1 outcome.
            if y.board.piece_at(x.mv.from_row, x.mv.from_col).is_none() {
                continue;
            }
            let Some(child) = crossover(x.mv, &y.board) else {
                continue;
            };
            let fitness = evaluate(&child, 0);
            if best.map_or(true, |(score, _)| fitness > score) {
                best = Some((fitness, x.mv));
            }
        }
    }

    match best {
        Some((score, mv)) => (score, Some(mv)),
        None => (i32::MIN, None),
    }
}

/// Enumerate every legal move for both sides, applying each hypothetically
/// and keeping a copy of the resulting board.
fn initialize_population(board: &mut Board) -> Vec<Chromosome> {
    let mut population = Vec::new();
    for side in [Color::P2, Color::P1] {
        for mv in board.candidate_moves(side) {
            let Some(chain) = board.try_move(mv.from_row, mv.from_col, mv.to_row, mv.to_col)
            else {
                continue;
            };
            let state = board.save_state(&chain);
            if board.take_turn(mv.from_row, mv.from_col, mv.to_row, mv.to_col, true) {
                population.push(Chromosome {
                    mv,
                    side,
                    board: board.clone(),
                });
                board.restore_state(state);
            }
        }
    }
    population
}

/// Binary tournament per side: repeatedly draw two distinct chromosomes and
/// keep the one fitter for that side's objective (P2 maximizes, P1
/// minimizes), until half of the side's population is selected. Repeated
/// pairs and already-selected winners are skipped.
fn selection<'a, R: Rng>(
    population: &'a [Chromosome],
    rng: &mut R,
) -> (Vec<&'a Chromosome>, Vec<&'a Chromosome>) {
    let mut p2_pool = Vec::new();
    let mut p1_pool = Vec::new();
    for chromosome in population {
        match chromosome.side {
            Color::P2 => p2_pool.push(chromosome),
            _ => p1_pool.push(chromosome),
        }
    }

    let p2_fitness: Vec<i32> = p2_pool.iter().map(|c| evaluate(&c.board, 0)).collect();
    let p1_fitness: Vec<i32> = p1_pool.iter().map(|c| evaluate(&c.board, 0)).collect();

    let p2_winners = tournament(&p2_fitness, true, rng);
    let p1_winners = tournament(&p1_fitness, false, rng);

    (
        p2_winners.into_iter().map(|i| p2_pool[i]).collect(),
        p1_winners.into_iter().map(|i| p1_pool[i]).collect(),
    )
}

/// Select `len / 2` distinct indices by repeated two-way tournaments. Draws
/// are budgeted so an exhausted pool cannot spin forever; running out of
/// budget only shrinks the selection.
fn tournament<R: Rng>(fitness: &[i32], maximizing: bool, rng: &mut R) -> Vec<usize> {
    let len = fitness.len();
    let target = len / 2;
    let mut winners: Vec<usize> = Vec::new();
    let mut tried: Vec<(usize, usize)> = Vec::new();
    let mut budget = 8 * len * len;

    while winners.len() < target && budget > 0 {
        budget -= 1;
        let a = rng.random_range(0..len);
        let b = rng.random_range(0..len);
        if a == b || tried.contains(&(a, b)) {
            continue;
        }
        tried.push((a, b));

        let winner = if maximizing {
            if fitness[b] > fitness[a] { b } else { a }
        } else if fitness[b] < fitness[a] {
            b
        } else {
            a
        };
        if winners.contains(&winner) {
            continue;
        }
        winners.push(winner);
    }
    winners
}

/// Replay a P2 move on a P1 outcome, producing the hybrid child board.
fn crossover(mv: Move, board: &Board) -> Option<Board> {
    let mut child = board.clone();
    child.try_move(mv.from_row, mv.from_col, mv.to_row, mv.to_col)?;
    if child.take_turn(mv.from_row, mv.from_col, mv.to_row, mv.to_col, true) {
        Some(child)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_population_covers_both_sides_and_restores_board() {
        let mut board = Board::new(Color::P2);
        let original = board.clone();
        let population = initialize_population(&mut board);
        assert_eq!(board, original);
        assert!(population.iter().any(|c| c.side == Color::P2));
        assert!(population.iter().any(|c| c.side == Color::P1));
        for chromosome in &population {
            // Each member holds the position after its move, not the origin.
            assert_ne!(chromosome.board, original);
            assert_ne!(chromosome.board.turn_player(), original.turn_player());
        }
    }

    #[test]
    fn test_tournament_selects_half_distinct() {
        let fitness = [5, -3, 12, 0, 7, -8];
        let mut rng = StdRng::seed_from_u64(7);
        let winners = tournament(&fitness, true, &mut rng);
        assert!(winners.len() <= 3);
        let mut sorted = winners.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), winners.len());
        assert!(winners.iter().all(|&i| i < fitness.len()));
    }

    #[test]
    fn test_tournament_small_pools() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(tournament(&[], true, &mut rng).is_empty());
        assert!(tournament(&[3], true, &mut rng).is_empty());
        let winners = tournament(&[3, 9], false, &mut rng);
        assert_eq!(winners, vec![0]);
    }

    #[test]
    fn test_crossover_applies_move_to_other_board() {
        let board = Board::new(Color::P1);
        let mv = Move::new(1, 3, 2, 3);
        let child = crossover(mv, &board).unwrap();
        assert!(child.piece_at(1, 3).is_none());
        assert_eq!(child.piece_at(2, 3).map(|p| p.color), Some(Color::P2));
        // The parent is untouched.
        assert_eq!(board.piece_at(1, 3).map(|p| p.color), Some(Color::P2));
    }

    #[test]
    fn test_crossover_rejects_illegal_move() {
        let board = Board::new(Color::P1);
        // Origin cell is empty.
        assert!(crossover(Move::new(3, 2, 3, 3), &board).is_none());
    }

    #[test]
    fn test_evolve_returns_p2_move_and_restores_board() {
        let mut board = Board::new(Color::P2);
        let original = board.clone();
        let (_, mv) = evolve(&mut board);
        assert_eq!(board, original);
        let mv = mv.expect("standard position has legal moves");
        // The chosen move starts from a live P2 piece or the Hole.
        let mover = board.piece_at(mv.from_row, mv.from_col).unwrap();
        assert!(mover.color == Color::P2 || mover.color == Color::Hole);
    }

    #[test]
    fn test_evolve_with_no_moves() {
        // P2 has nothing to play: no pieces, Hole walled in.
        let mut board =
            Board::with_pieces(&[(2, 3), (4, 3), (3, 2), (3, 4)], &[], (3, 3), Color::P2);
        let (score, mv) = evolve(&mut board);
        assert_eq!(mv, None);
        assert_eq!(score, i32::MIN);
    }
}
