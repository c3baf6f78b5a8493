/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{cell::OnceCell, fmt};

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::{
    Color, PieceKind, Square, BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS, MAX_RAY_LENGTH,
    QUEEN_DIRECTIONS, ROOK_DIRECTIONS, ROSTER_SIZE,
};

/// Roster slot of the King.
pub const KING_SLOT: usize = 0;
/// Roster slot of the Queen.
pub const QUEEN_SLOT: usize = 1;
/// Roster slot of the Rook that starts on the a-file.
pub const QUEENSIDE_ROOK_SLOT: usize = 6;
/// Roster slot of the Rook that starts on the h-file.
pub const KINGSIDE_ROOK_SLOT: usize = 7;
/// Roster slot of the a-file Pawn. The remaining Pawns follow in file order.
pub const FIRST_PAWN_SLOT: usize = 8;

/// Kind and starting file of the piece in every roster slot.
pub const STARTING_ROSTER: [(PieceKind, u8); ROSTER_SIZE] = [
    (PieceKind::King, 4),
    (PieceKind::Queen, 3),
    (PieceKind::Bishop, 2),
    (PieceKind::Bishop, 5),
    (PieceKind::Knight, 1),
    (PieceKind::Knight, 6),
    (PieceKind::Rook, 0),
    (PieceKind::Rook, 7),
    (PieceKind::Pawn, 0),
    (PieceKind::Pawn, 1),
    (PieceKind::Pawn, 2),
    (PieceKind::Pawn, 3),
    (PieceKind::Pawn, 4),
    (PieceKind::Pawn, 5),
    (PieceKind::Pawn, 6),
    (PieceKind::Pawn, 7),
];

/// Identifies a piece by its side and its slot in that side's roster.
///
/// The board's square mapping stores these instead of references to pieces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PieceId {
    color: Color,
    slot: u8,
}

impl PieceId {
    /// Creates a new [`PieceId`].
    ///
    /// # Panics
    /// If `slot` is not a valid roster slot.
    #[inline(always)]
    pub const fn new(color: Color, slot: usize) -> Self {
        assert!(slot < ROSTER_SIZE, "Roster slot out of range");
        Self {
            color,
            slot: slot as u8,
        }
    }

    /// The [`PieceId`] of `color`'s King.
    #[inline(always)]
    pub const fn king(color: Color) -> Self {
        Self::new(color, KING_SLOT)
    }

    /// The side this piece belongs to.
    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// The roster slot of this piece.
    #[inline(always)]
    pub const fn slot(&self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.color, self.slot)
    }
}

/// A ray of squares extending from a sliding piece in one direction, nearest square first.
pub type Ray = ArrayVec<Square, MAX_RAY_LENGTH>;

/// The squares a piece could move to if the board were otherwise empty.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PseudoMoves {
    /// Individual destinations of a King, Knight, or Pawn.
    Steps(ArrayVec<Square, 8>),

    /// One [`Ray`] per direction for a Queen, Bishop, or Rook.
    Rays(ArrayVec<Ray, 8>),
}

impl PseudoMoves {
    /// Iterates over every destination, ray by ray for sliding pieces.
    pub fn iter(&self) -> impl Iterator<Item = Square> + '_ {
        let (steps, rays): (&[Square], &[Ray]) = match self {
            Self::Steps(steps) => (steps.as_slice(), &[][..]),
            Self::Rays(rays) => (&[][..], rays.as_slice()),
        };

        steps
            .iter()
            .copied()
            .chain(rays.iter().flat_map(|ray| ray.iter().copied()))
    }

    /// Returns `true` if `square` is a destination.
    #[inline(always)]
    pub fn contains(&self, square: Square) -> bool {
        self.iter().any(|sq| sq == square)
    }

    /// Fetches the ray that contains `square`, if this is a sliding piece's move set and any ray reaches it.
    pub fn ray_containing(&self, square: Square) -> Option<&Ray> {
        match self {
            Self::Steps(_) => None,
            Self::Rays(rays) => rays.iter().find(|ray| ray.contains(&square)),
        }
    }

    /// Total number of destinations.
    #[inline(always)]
    pub fn len(&self) -> usize {
        match self {
            Self::Steps(steps) => steps.len(),
            Self::Rays(rays) => rays.iter().map(|ray| ray.len()).sum(),
        }
    }

    /// Returns `true` if there are no destinations at all.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single chess piece, together with every square it has ever stood on.
///
/// The last entry of the history is the piece's current square. The history is never empty:
/// the initial placement is never popped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
    history: Vec<Square>,

    /// Computed on first use and discarded whenever the history changes.
    #[serde(skip)]
    pseudo_moves: OnceCell<PseudoMoves>,
}

impl Piece {
    /// Creates a new [`Piece`] whose history starts at `square`.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let rook = Piece::new(Color::White, PieceKind::Rook, Square::new(0, 0));
    /// assert_eq!(rook.square(), Square::new(0, 0));
    /// assert!(!rook.has_moved());
    /// assert_eq!(rook.pseudo_moves().len(), 14);
    /// ```
    pub fn new(color: Color, kind: PieceKind, square: Square) -> Self {
        Self {
            color,
            kind,
            history: vec![square],
            pseudo_moves: OnceCell::new(),
        }
    }

    /// The side this piece belongs to.
    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// The kind of this piece.
    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// The square this piece currently occupies, or [`Square::OFF_BOARD`] if it was captured.
    #[inline(always)]
    pub fn square(&self) -> Square {
        self.history.last().copied().unwrap_or(Square::OFF_BOARD)
    }

    /// Every square this piece has occupied, oldest first.
    #[inline(always)]
    pub fn history(&self) -> &[Square] {
        &self.history
    }

    /// The square this piece occupied before its most recent move, if it has moved.
    #[inline(always)]
    pub fn previous_square(&self) -> Option<Square> {
        self.history.iter().rev().nth(1).copied()
    }

    /// Returns `true` if this piece has moved (or been captured) since it was placed.
    #[inline(always)]
    pub fn has_moved(&self) -> bool {
        self.history.len() > 1
    }

    /// Returns `true` if this piece is on the board.
    #[inline(always)]
    pub fn is_on_board(&self) -> bool {
        self.square().is_on_board()
    }

    /// Returns `true` if this piece was captured.
    #[inline(always)]
    pub fn is_captured(&self) -> bool {
        !self.is_on_board()
    }

    /// Returns `true` if this piece is a Pawn whose last move was a two-square step.
    pub fn just_double_stepped(&self) -> bool {
        self.kind == PieceKind::Pawn
            && self.is_on_board()
            && self
                .previous_square()
                .is_some_and(|prev| prev.is_on_board() && prev.distance_ranks(self.square()) == 2)
    }

    /// Letter of this piece: uppercase for White, lowercase for Black.
    #[inline(always)]
    pub const fn char(&self) -> char {
        self.kind.char_for(self.color)
    }

    /// The squares this piece could reach on an otherwise empty board.
    ///
    /// Sliding pieces produce one ray per direction, nearest square first.
    /// Captured pieces have no pseudo-moves.
    pub fn pseudo_moves(&self) -> &PseudoMoves {
        self.pseudo_moves.get_or_init(|| {
            pseudo_moves_for(self.color, self.kind, self.square(), !self.has_moved())
        })
    }

    /// The two squares diagonally in front of this piece, which a Pawn of this color attacks.
    pub fn pawn_attacks(&self) -> ArrayVec<Square, 2> {
        let forward = self.color.forward();
        [-1, 1]
            .into_iter()
            .filter_map(|files| self.square().offset(files, forward))
            .collect()
    }

    /// Records a move to `to`. The board mapping is the caller's responsibility.
    #[inline(always)]
    pub(crate) fn push_square(&mut self, to: Square) {
        self.history.push(to);
        self.pseudo_moves.take();
    }

    /// Reverts the most recent move, returning the square that was left.
    ///
    /// # Panics
    /// If the only remaining entry is the initial placement.
    #[inline(always)]
    pub(crate) fn pop_square(&mut self) -> Square {
        assert!(
            self.history.len() > 1,
            "Cannot undo the initial placement of {self}"
        );
        self.pseudo_moves.take();
        self.history.pop().unwrap_or(Square::OFF_BOARD)
    }
}

impl PartialEq for Piece {
    fn eq(&self, other: &Self) -> bool {
        self.color == other.color && self.kind == other.kind && self.history == other.history
    }
}

impl Eq for Piece {}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} on {}", self.color.name(), self.kind, self.square())
    }
}

/// Generates the pseudo-moves of a `color` `kind` standing on `square`.
fn pseudo_moves_for(color: Color, kind: PieceKind, square: Square, first_move: bool) -> PseudoMoves {
    match kind {
        PieceKind::King => PseudoMoves::Steps(steps(square, &KING_OFFSETS)),
        PieceKind::Knight => PseudoMoves::Steps(steps(square, &KNIGHT_OFFSETS)),
        PieceKind::Queen => PseudoMoves::Rays(rays(square, &QUEEN_DIRECTIONS)),
        PieceKind::Bishop => PseudoMoves::Rays(rays(square, &BISHOP_DIRECTIONS)),
        PieceKind::Rook => PseudoMoves::Rays(rays(square, &ROOK_DIRECTIONS)),
        PieceKind::Pawn => {
            let forward = color.forward();
            let mut moves = ArrayVec::new();

            if let Some(single) = square.offset(0, forward) {
                moves.push(single);

                // Only from the pawn's own starting rank, and only before it has ever moved
                if first_move && square.rank() == color.pawn_rank() {
                    moves.extend(square.offset(0, 2 * forward));
                }
            }

            moves.extend(square.offset(1, forward));
            moves.extend(square.offset(-1, forward));
            PseudoMoves::Steps(moves)
        }
    }
}

fn steps(square: Square, offsets: &[(i8, i8)]) -> ArrayVec<Square, 8> {
    offsets
        .iter()
        .filter_map(|&(files, ranks)| square.offset(files, ranks))
        .collect()
}

fn rays(square: Square, directions: &[(i8, i8)]) -> ArrayVec<Ray, 8> {
    directions
        .iter()
        .map(|&(files, ranks)| {
            std::iter::successors(square.offset(files, ranks), |sq| sq.offset(files, ranks))
                .collect::<Ray>()
        })
        .filter(|ray| !ray.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_set_sizes() {
        let corner = Square::new(0, 0);
        let center = Square::new(3, 3);

        assert_eq!(Piece::new(Color::White, PieceKind::King, corner).pseudo_moves().len(), 3);
        assert_eq!(Piece::new(Color::White, PieceKind::King, center).pseudo_moves().len(), 8);
        assert_eq!(Piece::new(Color::White, PieceKind::Knight, corner).pseudo_moves().len(), 2);
        assert_eq!(Piece::new(Color::White, PieceKind::Knight, center).pseudo_moves().len(), 8);
        assert_eq!(Piece::new(Color::White, PieceKind::Queen, center).pseudo_moves().len(), 27);
        assert_eq!(Piece::new(Color::White, PieceKind::Bishop, center).pseudo_moves().len(), 13);
        assert_eq!(Piece::new(Color::White, PieceKind::Rook, center).pseudo_moves().len(), 14);
    }

    #[test]
    fn rays_are_ordered_nearest_first() {
        let rook = Piece::new(Color::White, PieceKind::Rook, Square::new(4, 4));
        let ray = rook.pseudo_moves().ray_containing(Square::new(4, 7)).unwrap();
        assert_eq!(
            ray.as_slice(),
            &[Square::new(4, 5), Square::new(4, 6), Square::new(4, 7)]
        );

        // Non-sliders have no rays
        let knight = Piece::new(Color::White, PieceKind::Knight, Square::new(4, 4));
        assert!(knight.pseudo_moves().ray_containing(Square::new(5, 6)).is_none());
    }

    #[test]
    fn pawn_double_step_only_before_first_move() {
        let mut pawn = Piece::new(Color::White, PieceKind::Pawn, Square::new(1, 1));
        assert!(pawn.pseudo_moves().contains(Square::new(1, 3)));
        assert!(pawn.pseudo_moves().contains(Square::new(0, 2)));
        assert!(pawn.pseudo_moves().contains(Square::new(2, 2)));

        pawn.push_square(Square::new(1, 2));
        assert!(!pawn.pseudo_moves().contains(Square::new(1, 4)));
        assert!(pawn.pseudo_moves().contains(Square::new(1, 3)));

        pawn.pop_square();
        assert!(pawn.pseudo_moves().contains(Square::new(1, 3)));
    }

    #[test]
    fn pawn_off_its_starting_rank_never_double_steps() {
        let pawn = Piece::new(Color::Black, PieceKind::Pawn, Square::new(0, 4));
        assert_eq!(pawn.pseudo_moves().len(), 2);
        assert!(pawn.pseudo_moves().contains(Square::new(0, 3)));
        assert!(pawn.pseudo_moves().contains(Square::new(1, 3)));
    }

    #[test]
    fn captured_pieces_have_no_moves() {
        let mut queen = Piece::new(Color::Black, PieceKind::Queen, Square::new(3, 7));
        assert!(!queen.pseudo_moves().is_empty());

        queen.push_square(Square::OFF_BOARD);
        assert!(queen.is_captured());
        assert!(queen.pseudo_moves().is_empty());
    }

    #[test]
    fn double_step_detection() {
        let mut pawn = Piece::new(Color::Black, PieceKind::Pawn, Square::new(0, 6));
        assert!(!pawn.just_double_stepped());

        pawn.push_square(Square::new(0, 4));
        assert!(pawn.just_double_stepped());

        pawn.push_square(Square::new(0, 3));
        assert!(!pawn.just_double_stepped());
    }

    #[test]
    #[should_panic]
    fn initial_placement_cannot_be_popped() {
        let mut king = Piece::new(Color::White, PieceKind::King, Square::new(4, 0));
        king.pop_square();
    }
}
