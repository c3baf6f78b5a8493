/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![doc = include_str!("../README.md")]

/// Enums for piece kinds and colors.
mod piece;
/// Squares on a chessboard, including the off-board sentinel for captured pieces.
mod square;
/// Movement offset tables and misc constants.
mod utils;

pub use piece::*;
pub use square::*;
pub use utils::*;

/// Re-exports all the things you'll need.
pub mod prelude {
    pub use crate::piece::*;
    pub use crate::square::*;
    pub use crate::utils::*;
}
