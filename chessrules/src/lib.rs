/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![doc = include_str!("../README.md")]

pub use chessrules_types::*;

/// Detecting which squares are attacked, and by whom.
mod attacks;
/// High-level abstraction of the game of chess, including legality checks, special moves, and game outcomes.
mod game;
/// Filtering a piece's destinations by obstruction, occupancy, and King safety.
mod movegen;
/// Enums and structs for modeling the movement of a piece on a chessboard.
mod moves;
/// Pieces, their identities, and the squares they could move to.
mod piece;
/// A chessboard, complete with piece placements, turn, and en passant state.
mod position;

pub use attacks::*;
pub use game::*;
pub use movegen::*;
pub use moves::*;
pub use piece::*;
pub use position::*;

/// Re-exports all the things you'll need.
pub mod prelude {
    pub use crate::attacks::*;
    pub use crate::game::*;
    pub use crate::movegen::*;
    pub use crate::moves::*;
    pub use crate::piece::*;
    pub use crate::position::*;
    pub use chessrules_types::*;
}
