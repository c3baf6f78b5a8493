/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use super::{Board, Color, Piece, PieceId, PieceKind, Ray, Square, ROSTER_SIZE};

/// Returns `true` if any piece of `defender`'s opponent attacks `square`.
///
/// A square holding one of the opponent's own pieces still counts as attacked if another opposing piece
/// defends it.
///
/// # Example
/// ```
/// # use chessrules::*;
/// let board = Board::new();
/// // Black's pawns cover the sixth rank
/// assert!(is_square_attacked(&board, Color::White, Square::new(3, 5)));
/// assert!(!is_square_attacked(&board, Color::White, Square::new(3, 4)));
/// ```
#[inline(always)]
pub fn is_square_attacked(board: &Board, defender: Color, square: Square) -> bool {
    attackers(board, defender, square, None).next().is_some()
}

/// Like [`is_square_attacked`], but pretends `vacated` is empty.
///
/// Used for King safety, where the King's own square must not shield the squares behind it.
#[inline(always)]
pub fn is_square_attacked_through(
    board: &Board,
    defender: Color,
    square: Square,
    vacated: Square,
) -> bool {
    attackers(board, defender, square, Some(vacated))
        .next()
        .is_some()
}

/// Every piece of `defender`'s opponent that attacks `square`.
pub fn attackers_of(board: &Board, defender: Color, square: Square) -> ArrayVec<PieceId, ROSTER_SIZE> {
    attackers(board, defender, square, None).collect()
}

fn attackers(
    board: &Board,
    defender: Color,
    square: Square,
    vacated: Option<Square>,
) -> impl Iterator<Item = PieceId> + '_ {
    board
        .pieces(defender.opponent())
        .filter(move |(_, piece)| attacks(board, piece, square, vacated))
        .map(|(id, _)| id)
}

/// Returns `true` if `piece` attacks `target`, treating `vacated` (if any) as empty.
///
/// Kings attack adjacent squares and Pawns attack their forward diagonals, regardless of what
/// stands there. Every other piece attacks the squares it could move to, ignoring who occupies
/// the target.
pub fn attacks(board: &Board, piece: &Piece, target: Square, vacated: Option<Square>) -> bool {
    let from = piece.square();
    if !from.is_on_board() || !target.is_on_board() || from == target {
        return false;
    }

    match piece.kind() {
        PieceKind::King => from.distance_files(target) <= 1 && from.distance_ranks(target) <= 1,
        PieceKind::Pawn => piece.pawn_attacks().contains(&target),
        PieceKind::Knight => piece.pseudo_moves().contains(target),
        PieceKind::Queen | PieceKind::Bishop | PieceKind::Rook => piece
            .pseudo_moves()
            .ray_containing(target)
            .is_some_and(|ray| is_ray_clear(board, ray, target, vacated)),
    }
}

/// Returns `true` if nothing stands on `ray` before `target`.
///
/// The scan goes nearest-first and stops at `target`, so whatever is on `target` itself does not matter.
pub(crate) fn is_ray_clear(board: &Board, ray: &Ray, target: Square, vacated: Option<Square>) -> bool {
    ray.iter()
        .take_while(|&&square| square != target)
        .all(|&square| Some(square) == vacated || !board.has(square))
}
