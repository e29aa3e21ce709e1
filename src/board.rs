use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROWS: usize = 7;
pub const COLS: usize = 7;

/// Orthogonal neighbor offsets, the only legal move directions.
pub const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Sentinel last-move entry. A fresh board and any turn that captured a piece
/// record this instead of a real chain, so the anti-reversal check can never
/// match against them.
const VOID_MOVE: (i32, i32) = (-1, -1);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    P1,
    P2,
    Hole,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::P1 => Color::P2,
            Color::P2 => Color::P1,
            Color::Hole => Color::Hole,
        }
    }
}

/// A game token. Captured pieces keep their roster slot but sit at the
/// `(-1, -1)` sentinel until a state restore puts them back on the grid.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    pub color: Color,
    pub row: i32,
    pub col: i32,
}

impl Piece {
    fn new(color: Color, row: i32, col: i32) -> Self {
        Self { color, row, col }
    }

    pub fn is_captured(&self) -> bool {
        self.row == -1
    }

    fn move_to(&mut self, row: i32, col: i32) {
        self.row = row;
        self.col = col;
    }
}

/// One adjacency step. The cells actually displaced by the move can exceed
/// this pair when the target starts a push chain.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Move {
    pub from_row: i32,
    pub from_col: i32,
    pub to_row: i32,
    pub to_col: i32,
}

impl Move {
    pub fn new(from_row: i32, from_col: i32, to_row: i32, to_col: i32) -> Self {
        Self { from_row, from_col, to_row, to_col }
    }
}

type PieceId = usize;

/// Snapshot of the cells a push chain touches plus the turn bookkeeping,
/// taken before a hypothetical move and replayed afterwards.
#[derive(Clone, Debug)]
pub struct SavedState {
    turn: Color,
    p1_score: u8,
    p2_score: u8,
    last_move: Vec<(i32, i32)>,
    cells: Vec<(i32, i32, Option<PieceId>)>,
}

/// The playing field: a `ROWS x COLS` grid whose outermost ring is out of
/// bounds, so the movable interior is 5x5. Pieces live in an arena and the
/// grid stores indices into it; restoring a snapshot rewrites both the grid
/// slots and each piece's own coordinates so the two always agree.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    pieces: Vec<Piece>,
    grid: [[Option<PieceId>; COLS]; ROWS],
    p1_pieces: Vec<PieceId>,
    p2_pieces: Vec<PieceId>,
    hole: PieceId,
    turn: Color,
    p1_score: u8,
    p2_score: u8,
    last_move: Vec<(i32, i32)>,
}

impl Board {
    /// Set up the starting position: one rank of five pieces per player on
    /// the first and last interior rows, the Hole in the center.
    pub fn new(first_player: Color) -> Self {
        let mut board = Self {
            pieces: Vec::new(),
            grid: [[None; COLS]; ROWS],
            p1_pieces: Vec::new(),
            p2_pieces: Vec::new(),
            hole: 0,
            turn: first_player,
            p1_score: 0,
            p2_score: 0,
            last_move: vec![VOID_MOVE],
        };

        let p1_row = ROWS as i32 - 2;
        for col in 1..COLS as i32 - 1 {
            let id = board.insert_piece(Piece::new(Color::P1, p1_row, col));
            board.p1_pieces.push(id);
            let id = board.insert_piece(Piece::new(Color::P2, 1, col));
            board.p2_pieces.push(id);
        }
        board.hole = board.insert_piece(Piece::new(Color::Hole, 3, 3));

        board
    }

    fn insert_piece(&mut self, piece: Piece) -> PieceId {
        let id = self.pieces.len();
        self.grid[piece.row as usize][piece.col as usize] = Some(id);
        self.pieces.push(piece);
        id
    }

    fn slot(&self, row: i32, col: i32) -> Option<PieceId> {
        if row < 0 || row >= ROWS as i32 || col < 0 || col >= COLS as i32 {
            return None;
        }
        self.grid[row as usize][col as usize]
    }

    fn set_slot(&mut self, row: i32, col: i32, id: Option<PieceId>) {
        self.grid[row as usize][col as usize] = id;
    }

    pub fn piece_at(&self, row: i32, col: i32) -> Option<&Piece> {
        self.slot(row, col).map(|id| &self.pieces[id])
    }

    pub fn is_out_of_bounds(row: i32, col: i32) -> bool {
        row < 1 || row > ROWS as i32 - 2 || col < 1 || col > COLS as i32 - 2
    }

    pub fn is_adjacent(from_row: i32, from_col: i32, to_row: i32, to_col: i32) -> bool {
        let row_delta = (from_row - to_row).abs();
        let col_delta = (from_col - to_col).abs();
        (row_delta == 0 && col_delta == 1) || (row_delta == 1 && col_delta == 0)
    }

    /// Whether `piece` may be moved by the player to act: their own pieces
    /// and the Hole.
    pub fn is_turn(&self, piece: &Piece) -> bool {
        piece.color == self.turn || piece.color == Color::Hole
    }

    pub fn turn_player(&self) -> Color {
        self.turn
    }

    pub fn p1_score(&self) -> u8 {
        self.p1_score
    }

    pub fn p2_score(&self) -> u8 {
        self.p2_score
    }

    pub fn winner(&self) -> Option<Color> {
        if self.p1_score == 2 {
            return Some(Color::P1);
        }
        if self.p2_score == 2 {
            return Some(Color::P2);
        }
        None
    }

    pub fn hole(&self) -> &Piece {
        &self.pieces[self.hole]
    }

    /// Roster of one player's pieces, captured ones included.
    pub fn side_pieces(&self, side: Color) -> impl Iterator<Item = &Piece> + '_ {
        let ids = match side {
            Color::P1 => &self.p1_pieces,
            _ => &self.p2_pieces,
        };
        ids.iter().map(move |&id| &self.pieces[id])
    }

    /// Compute the push chain seeded by one adjacency step, without mutating
    /// anything. Returns the ordered cells displaced by the move, from the
    /// mover's origin through every shoved piece to the final destination,
    /// or `None` if the move is illegal.
    pub fn try_move(
        &self,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
    ) -> Option<Vec<(i32, i32)>> {
        self.push_chain(from_row, from_col, to_row, to_col, Vec::new())
    }

    fn push_chain(
        &self,
        current_row: i32,
        current_col: i32,
        target_row: i32,
        target_col: i32,
        mut chain: Vec<(i32, i32)>,
    ) -> Option<Vec<(i32, i32)>> {
        let mover = self.piece_at(current_row, current_col)?;

        // The Hole may never leave the board or land on another piece.
        if mover.color == Color::Hole
            && (Self::is_out_of_bounds(target_row, target_col)
                || self.piece_at(target_row, target_col).is_some())
        {
            return None;
        }

        chain.push((current_row, current_col));

        // An out-of-bounds target, or the Hole sitting on it, ends the chain:
        // the piece in front gets ejected. A capture can never repeat the
        // previous position, so no reversal check is needed here.
        if Self::is_out_of_bounds(target_row, target_col)
            || self
                .piece_at(target_row, target_col)
                .is_some_and(|p| p.color == Color::Hole)
        {
            chain.push((target_row, target_col));
            return Some(chain);
        }

        // An ordinary occupant is itself shoved one cell further in the same
        // direction, with the target becoming the new mover.
        if self.piece_at(target_row, target_col).is_some() {
            let next_row = 2 * target_row - current_row;
            let next_col = 2 * target_col - current_col;
            return self.push_chain(target_row, target_col, next_row, next_col, chain);
        }

        // Empty target. Legal unless the chain exactly reverses the previous
        // move, which would recreate the preceding position.
        chain.push((target_row, target_col));
        if chain.len() == self.last_move.len()
            && chain.iter().eq(self.last_move.iter().rev())
        {
            return None;
        }
        Some(chain)
    }

    fn drop_piece(&mut self, id: PieceId) {
        self.pieces[id].move_to(-1, -1);
        if self.pieces[id].color == Color::P2 {
            self.p1_score += 1;
        } else {
            self.p2_score += 1;
        }
    }

    /// Apply a chain produced by `try_move`, innermost displaced piece first.
    /// Only the far end of a chain can be a capture; every other step is a
    /// plain relocation into the cell its successor just vacated.
    fn move_pieces(&mut self, chain: &[(i32, i32)]) {
        for pair in chain.windows(2).rev() {
            let (src_row, src_col) = pair[0];
            let (dst_row, dst_col) = pair[1];
            let Some(id) = self.slot(src_row, src_col) else {
                continue;
            };
            if Self::is_out_of_bounds(dst_row, dst_col)
                || self
                    .piece_at(dst_row, dst_col)
                    .is_some_and(|p| p.color == Color::Hole)
            {
                self.drop_piece(id);
                self.set_slot(src_row, src_col, None);
                // A capture means the next move cannot recreate the previous
                // position; clear last_move so the reversal check cannot
                // wrongly pin the Hole afterwards.
                self.last_move = vec![VOID_MOVE];
            } else {
                self.pieces[id].move_to(dst_row, dst_col);
                self.set_slot(dst_row, dst_col, Some(id));
                self.set_slot(src_row, src_col, None);
            }
        }
    }

    /// The single mutating entry point for moves. Validates adjacency and
    /// the push chain, applies it, records it as the last move, and flips the
    /// turn. Returns `false` without touching the board on any illegality.
    /// `hypothetical` turns are applied by the engines between a snapshot and
    /// a restore and skip the real-move bookkeeping.
    pub fn take_turn(
        &mut self,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
        hypothetical: bool,
    ) -> bool {
        if self.winner().is_some() {
            return false;
        }
        if !Self::is_adjacent(from_row, from_col, to_row, to_col) {
            return false;
        }
        let Some(chain) = self.try_move(from_row, from_col, to_row, to_col) else {
            return false;
        };

        self.last_move = chain.clone();
        self.move_pieces(&chain);
        self.turn = self.turn.opponent();

        if !hypothetical {
            log::debug!(
                "turn {},{} -> {},{} applied, score {}:{}",
                from_row, from_col, to_row, to_col, self.p1_score, self.p2_score
            );
        }
        true
    }

    /// Capture the state a hypothetical move is about to touch: turn, scores,
    /// the last-move record, and the grid slots of `affected` cells.
    pub fn save_state(&self, affected: &[(i32, i32)]) -> SavedState {
        SavedState {
            turn: self.turn,
            p1_score: self.p1_score,
            p2_score: self.p2_score,
            last_move: self.last_move.clone(),
            cells: affected
                .iter()
                .map(|&(row, col)| (row, col, self.slot(row, col)))
                .collect(),
        }
    }

    /// Undo a hypothetical move. Every restored piece gets its own
    /// coordinates rewritten to the cell it is placed back into, which also
    /// reverses captures (the `(-1, -1)` sentinel is overwritten).
    pub fn restore_state(&mut self, state: SavedState) {
        self.turn = state.turn;
        self.p1_score = state.p1_score;
        self.p2_score = state.p2_score;
        self.last_move = state.last_move;
        for (row, col, id) in state.cells {
            self.set_slot(row, col, id);
            if let Some(id) = id {
                self.pieces[id].move_to(row, col);
            }
        }
    }

    /// All candidate adjacency steps for one side: every live piece of that
    /// side plus the Hole, toward each orthogonal neighbor that is on the
    /// board and not the Hole's cell. Candidates still have to pass
    /// `try_move`; this filter only drops the outright self-destructive ones.
    pub fn candidate_moves(&self, side: Color) -> Vec<Move> {
        let hole = self.hole();
        let mut moves = Vec::new();
        for piece in self.side_pieces(side).chain(std::iter::once(hole)) {
            if piece.is_captured() {
                continue;
            }
            for (dr, dc) in ORTHOGONAL {
                let (row, col) = (piece.row + dr, piece.col + dc);
                if Self::is_out_of_bounds(row, col) || (row == hole.row && col == hole.col) {
                    continue;
                }
                moves.push(Move::new(piece.row, piece.col, row, col));
            }
        }
        moves
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.grid.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for slot in row {
                let ch = match slot.map(|id| self.pieces[id].color) {
                    None => '0',
                    Some(Color::P1) => '1',
                    Some(Color::P2) => '2',
                    Some(Color::Hole) => 'X',
                };
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
impl Board {
    /// Build a board with an arbitrary sparse position.
    pub fn with_pieces(
        p1: &[(i32, i32)],
        p2: &[(i32, i32)],
        hole: (i32, i32),
        first_player: Color,
    ) -> Self {
        let mut board = Self {
            pieces: Vec::new(),
            grid: [[None; COLS]; ROWS],
            p1_pieces: Vec::new(),
            p2_pieces: Vec::new(),
            hole: 0,
            turn: first_player,
            p1_score: 0,
            p2_score: 0,
            last_move: vec![VOID_MOVE],
        };
        for &(row, col) in p1 {
            let id = board.insert_piece(Piece::new(Color::P1, row, col));
            board.p1_pieces.push(id);
        }
        for &(row, col) in p2 {
            let id = board.insert_piece(Piece::new(Color::P2, row, col));
            board.p2_pieces.push(id);
        }
        board.hole = board.insert_piece(Piece::new(Color::Hole, hole.0, hole.1));
        board
    }

    pub fn set_scores(&mut self, p1_score: u8, p2_score: u8) {
        self.p1_score = p1_score;
        self.p2_score = p2_score;
    }

    pub fn last_move(&self) -> &[(i32, i32)] {
        &self.last_move
    }
}
