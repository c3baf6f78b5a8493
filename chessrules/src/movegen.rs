/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use super::{
    attacks::is_ray_clear, is_square_attacked_through, Board, Color, Move, PieceId, PieceKind,
    Square, MAX_NUM_MOVES, MAX_PIECE_MOVES,
};

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = ArrayVec<Move, MAX_NUM_MOVES>;

/// Returns `true` if the piece `id` may move to `to`, considering obstruction and (for Kings) attacked squares.
///
/// This does not consider castling or en passant, and does not check whether a non-King move exposes
/// its own King. Those are resolved by [`crate::Game`].
///
/// # Example
/// ```
/// # use chessrules::*;
/// let mut board = Board::empty();
/// let rook = PieceId::new(Color::White, 7);
/// board.place(rook, PieceKind::Rook, Square::new(4, 4)).unwrap();
/// board.place(PieceId::new(Color::Black, 8), PieceKind::Pawn, Square::new(4, 5)).unwrap();
///
/// assert!(is_legal(&board, rook, Square::new(4, 5)));
/// assert!(!is_legal(&board, rook, Square::new(4, 6)));
/// assert!(!is_legal(&board, rook, Square::new(4, 7)));
/// ```
pub fn is_legal(board: &Board, id: PieceId, to: Square) -> bool {
    let piece = board.piece(id);
    let from = piece.square();
    let color = piece.color();

    if !from.is_on_board() || !to.is_on_board() || board.color_at(to) == Some(color) {
        return false;
    }

    let pseudo_moves = piece.pseudo_moves();
    match piece.kind() {
        PieceKind::Knight => pseudo_moves.contains(to),

        // The King's own square is treated as vacant, so it cannot retreat along a checking ray
        PieceKind::King => {
            pseudo_moves.contains(to) && !is_square_attacked_through(board, color, to, from)
        }

        PieceKind::Queen | PieceKind::Bishop | PieceKind::Rook => pseudo_moves
            .ray_containing(to)
            .is_some_and(|ray| is_ray_clear(board, ray, to, None)),

        PieceKind::Pawn => {
            if !pseudo_moves.contains(to) {
                return false;
            }

            if from.file() == to.file() {
                let skipped_is_empty = from.distance_ranks(to) == 1
                    || from.forward_by(color, 1).is_some_and(|sq| !board.has(sq));
                !board.has(to) && skipped_is_empty
            } else {
                board.color_at(to) == Some(color.opponent())
            }
        }
    }
}

/// Every square the piece `id` may move to according to [`is_legal`].
///
/// # Example
/// ```
/// # use chessrules::*;
/// let board = Board::new();
/// let knight = PieceId::new(Color::White, 5);
/// let destinations = legal_destinations(&board, knight);
/// assert_eq!(destinations.as_slice(), &[Square::new(5, 2), Square::new(7, 2)]);
/// ```
pub fn legal_destinations(board: &Board, id: PieceId) -> ArrayVec<Square, MAX_PIECE_MOVES> {
    board
        .piece(id)
        .pseudo_moves()
        .iter()
        .filter(|&to| is_legal(board, id, to))
        .collect()
}

/// Returns `true` if `color`'s King has nowhere to go.
pub fn no_legal_moves(board: &Board, color: Color) -> bool {
    let king = PieceId::king(color);
    !board
        .piece(king)
        .pseudo_moves()
        .iter()
        .any(|to| is_legal(board, king, to))
}
