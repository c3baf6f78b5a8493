/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use super::Color;

/// A square on the chessboard, addressed by `(file, rank)` with both in `0..8`.
///
/// File 0 is the a-file and rank 0 is White's home rank, so `a1` is `(0, 0)` and `h8` is `(7, 7)`.
///
/// Captured pieces are parked on [`Square::OFF_BOARD`], which is the only valid square outside of the board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Number of squares on the board.
    pub const COUNT: usize = 64;

    /// Sentinel position for pieces that are not on the board (captured).
    pub const OFF_BOARD: Self = Self { file: 99, rank: 99 };

    /// Creates a new on-board [`Square`].
    ///
    /// # Panics
    /// If `file` or `rank` is not in `0..8`.
    ///
    /// # Example
    /// ```
    /// # use chessrules_types::Square;
    /// let e4 = Square::new(4, 3);
    /// assert_eq!(e4.to_uci(), "e4");
    /// ```
    #[inline(always)]
    pub const fn new(file: u8, rank: u8) -> Self {
        assert!(file < 8 && rank < 8, "Square coordinates must be in 0..8");
        Self { file, rank }
    }

    /// Creates a new [`Square`] from signed coordinates, returning `None` if they fall off the board.
    #[inline(always)]
    pub const fn try_new(file: i8, rank: i8) -> Option<Self> {
        if file >= 0 && file < 8 && rank >= 0 && rank < 8 {
            Some(Self {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// Creates a [`Square`] from an index in `0..64`, counting a1, b1, ..., h1, a2, ..., h8.
    #[inline(always)]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self {
                file: (index % 8) as u8,
                rank: (index / 8) as u8,
            })
        } else {
            None
        }
    }

    /// An iterator over all 64 on-board squares, starting at a1 and ending at h8.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT).filter_map(Self::from_index)
    }

    /// The file of this square (0 is the a-file).
    #[inline(always)]
    pub const fn file(&self) -> u8 {
        self.file
    }

    /// The rank of this square (0 is the first rank).
    #[inline(always)]
    pub const fn rank(&self) -> u8 {
        self.rank
    }

    /// Returns `true` unless this is [`Square::OFF_BOARD`].
    #[inline(always)]
    pub const fn is_on_board(&self) -> bool {
        self.file < 8 && self.rank < 8
    }

    /// Index of this square in `0..64`, for mailbox lookups.
    ///
    /// Must not be called on [`Square::OFF_BOARD`].
    #[inline(always)]
    pub const fn index(&self) -> usize {
        debug_assert!(self.is_on_board());
        self.rank as usize * 8 + self.file as usize
    }

    /// Shifts this square by `(files, ranks)`, returning `None` if the result is not on the board.
    ///
    /// The sentinel never shifts onto the board.
    ///
    /// # Example
    /// ```
    /// # use chessrules_types::Square;
    /// assert_eq!(Square::new(0, 0).offset(1, 2), Some(Square::new(1, 2)));
    /// assert_eq!(Square::new(0, 0).offset(-1, 0), None);
    /// assert_eq!(Square::OFF_BOARD.offset(-95, -95), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, files: i8, ranks: i8) -> Option<Self> {
        if !self.is_on_board() {
            return None;
        }
        Self::try_new(self.file as i8 + files, self.rank as i8 + ranks)
    }

    /// Shifts this square `n` ranks towards `color`'s opponent.
    #[inline(always)]
    pub const fn forward_by(&self, color: Color, n: i8) -> Option<Self> {
        self.offset(0, color.forward() * n)
    }

    /// Shifts this square `n` ranks towards `color`'s own home rank.
    #[inline(always)]
    pub const fn backward_by(&self, color: Color, n: i8) -> Option<Self> {
        self.offset(0, -color.forward() * n)
    }

    /// Absolute distance between the files of two squares.
    #[inline(always)]
    pub const fn distance_files(&self, other: Self) -> u8 {
        self.file.abs_diff(other.file)
    }

    /// Absolute distance between the ranks of two squares.
    #[inline(always)]
    pub const fn distance_ranks(&self, other: Self) -> u8 {
        self.rank.abs_diff(other.rank)
    }

    /// Parses a square from algebraic notation, like `"e4"`.
    ///
    /// # Example
    /// ```
    /// # use chessrules_types::Square;
    /// assert_eq!(Square::from_uci("a1").unwrap(), Square::new(0, 0));
    /// assert_eq!(Square::from_uci("h8").unwrap(), Square::new(7, 7));
    /// assert!(Square::from_uci("i9").is_err());
    /// ```
    pub fn from_uci(square: &str) -> Result<Self> {
        let mut chars = square.trim().chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid square {square:?}: must be exactly two characters, like \"e4\"");
        };

        let file = match file.to_ascii_lowercase() {
            f @ 'a'..='h' => f as u8 - b'a',
            f => bail!("Invalid file {f:?} in square {square:?}"),
        };
        let rank = rank
            .to_digit(10)
            .filter(|r| (1..=8).contains(r))
            .ok_or(anyhow!("Invalid rank {rank:?} in square {square:?}"))?;

        Ok(Self::new(file, rank as u8 - 1))
    }

    /// Converts this square to algebraic notation, like `"e4"`.
    ///
    /// [`Square::OFF_BOARD`] becomes `"-"`.
    pub fn to_uci(&self) -> String {
        if self.is_on_board() {
            format!("{}{}", (b'a' + self.file) as char, self.rank + 1)
        } else {
            String::from("-")
        }
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_on_board() {
            write!(f, "{}({}, {})", self.to_uci(), self.file, self.rank)
        } else {
            write!(f, "OFF_BOARD")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrips_for_every_square() {
        for (i, square) in Square::iter().enumerate() {
            assert_eq!(square.index(), i);
            assert_eq!(Square::from_index(i), Some(square));
        }
        assert_eq!(Square::from_index(64), None);
    }

    #[test]
    fn sentinel_is_off_board() {
        assert!(!Square::OFF_BOARD.is_on_board());
        assert_eq!(Square::OFF_BOARD.file(), 99);
        assert_eq!(Square::OFF_BOARD.rank(), 99);
        assert_eq!(Square::OFF_BOARD.to_string(), "-");
    }

    #[test]
    fn forward_depends_on_color() {
        let e4 = Square::new(4, 3);
        assert_eq!(e4.forward_by(Color::White, 1), Some(Square::new(4, 4)));
        assert_eq!(e4.forward_by(Color::Black, 1), Some(Square::new(4, 2)));
        assert_eq!(e4.backward_by(Color::White, 2), Some(Square::new(4, 1)));
        assert_eq!(Square::new(4, 7).forward_by(Color::White, 1), None);
    }

    #[test]
    fn uci_parsing() {
        assert_eq!("e2".parse::<Square>().unwrap(), Square::new(4, 1));
        assert_eq!(Square::from_uci("C7").unwrap(), Square::new(2, 6));
        assert!(Square::from_uci("e").is_err());
        assert!(Square::from_uci("e0").is_err());
        assert!(Square::from_uci("e10").is_err());
        assert!(Square::from_uci("z1").is_err());
    }
}
