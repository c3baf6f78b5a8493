/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Maximum number of legal moves that can exist in any chess position.
pub const MAX_NUM_MOVES: usize = 218;

/// Maximum number of destinations a single piece can have (a Queen in the center of an empty board).
pub const MAX_PIECE_MOVES: usize = 27;

/// Longest possible ray from a sliding piece.
pub const MAX_RAY_LENGTH: usize = 7;

/// Number of pieces each side starts with.
pub const ROSTER_SIZE: usize = 16;

/// `(files, ranks)` steps of a King.
pub const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// `(files, ranks)` jumps of a Knight.
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// Ray directions of a Rook.
pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Ray directions of a Bishop.
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (-1, -1), (-1, 1), (1, -1)];

/// Ray directions of a Queen.
pub const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (1, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
];
