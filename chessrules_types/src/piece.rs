/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Represents the color of a player or piece.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// An array of both colors, starting with White.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Index of this color, for indexing into per-color arrays.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Returns this color's opponent.
    ///
    /// # Example
    /// ```
    /// # use chessrules_types::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Rank direction that this color's pawns advance in: `1` for White, `-1` for Black.
    #[inline(always)]
    pub const fn forward(&self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// The rank this color's back row of pieces starts on.
    #[inline(always)]
    pub const fn home_rank(&self) -> u8 {
        match self {
            Self::White => 0,
            Self::Black => 7,
        }
    }

    /// The rank this color's pawns start on.
    #[inline(always)]
    pub const fn pawn_rank(&self) -> u8 {
        match self {
            Self::White => 1,
            Self::Black => 6,
        }
    }

    /// The rank a pawn of this color must stand on to capture en passant.
    #[inline(always)]
    pub const fn en_passant_rank(&self) -> u8 {
        match self {
            Self::White => 4,
            Self::Black => 3,
        }
    }

    /// The rank on which this color's pawns promote.
    #[inline(always)]
    pub const fn promotion_rank(&self) -> u8 {
        self.opponent().home_rank()
    }

    /// Parses a color from `'w'` or `'b'`, case-insensitively.
    pub fn from_char(color: char) -> Result<Self> {
        match color.to_ascii_lowercase() {
            'w' => Ok(Self::White),
            'b' => Ok(Self::Black),
            _ => bail!("Invalid color {color:?}: expected 'w' or 'b'"),
        }
    }

    /// The single-character name of this color, `'w'` or `'b'`.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    /// The capitalized name of this color.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => bail!("Invalid color {s:?}: expected 'w' or 'b'"),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// Represents the kind (or "class") of a chess piece.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum PieceKind {
    King,
    Queen,
    Bishop,
    Knight,
    Rook,
    Pawn,
}

impl PieceKind {
    /// Number of piece kinds.
    pub const COUNT: usize = 6;

    /// The kinds a pawn may promote to, strongest first.
    pub const PROMOTIONS: [Self; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    /// An array of every piece kind.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::King,
            Self::Queen,
            Self::Bishop,
            Self::Knight,
            Self::Rook,
            Self::Pawn,
        ]
    }

    /// Returns `true` for the pieces that move along rays: Queen, Bishop and Rook.
    #[inline(always)]
    pub const fn is_slider(&self) -> bool {
        matches!(self, Self::Queen | Self::Bishop | Self::Rook)
    }

    /// Returns `true` if a pawn may promote to this kind.
    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        matches!(self, Self::Queen | Self::Rook | Self::Bishop | Self::Knight)
    }

    /// Parses a piece kind from its letter (`K`, `Q`, `B`, `N`, `R`, `P`), case-insensitively.
    ///
    /// # Example
    /// ```
    /// # use chessrules_types::PieceKind;
    /// assert_eq!(PieceKind::from_char('n').unwrap(), PieceKind::Knight);
    /// assert!(PieceKind::from_char('x').is_err());
    /// ```
    pub fn from_char(kind: char) -> Result<Self> {
        match kind.to_ascii_uppercase() {
            'K' => Ok(Self::King),
            'Q' => Ok(Self::Queen),
            'B' => Ok(Self::Bishop),
            'N' => Ok(Self::Knight),
            'R' => Ok(Self::Rook),
            'P' => Ok(Self::Pawn),
            _ => bail!("Invalid piece kind {kind:?}: expected one of K, Q, B, N, R, P"),
        }
    }

    /// The uppercase letter of this piece kind.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::King => 'K',
            Self::Queen => 'Q',
            Self::Bishop => 'B',
            Self::Knight => 'N',
            Self::Rook => 'R',
            Self::Pawn => 'P',
        }
    }

    /// The letter of this kind for a piece of `color`: uppercase for White, lowercase for Black.
    #[inline(always)]
    pub const fn char_for(&self, color: Color) -> char {
        match color {
            Color::White => self.char(),
            Color::Black => self.char().to_ascii_lowercase(),
        }
    }

    /// The full name of this piece kind.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::King => "King",
            Self::Queen => "Queen",
            Self::Bishop => "Bishop",
            Self::Knight => "Knight",
            Self::Rook => "Rook",
            Self::Pawn => "Pawn",
        }
    }
}

impl FromStr for PieceKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => bail!("Invalid piece kind {s:?}: expected a single letter"),
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_ranks_are_opposite_home_ranks() {
        assert_eq!(Color::White.promotion_rank(), 7);
        assert_eq!(Color::Black.promotion_rank(), 0);
        assert_eq!(Color::White.en_passant_rank(), 4);
        assert_eq!(Color::Black.en_passant_rank(), 3);
    }

    #[test]
    fn only_four_kinds_promote() {
        let promotable = PieceKind::all()
            .into_iter()
            .filter(PieceKind::is_promotion)
            .collect::<Vec<_>>();
        assert_eq!(promotable.len(), 4);
        assert!(promotable.iter().all(|k| PieceKind::PROMOTIONS.contains(k)));
    }

    #[test]
    fn chars_roundtrip() {
        for kind in PieceKind::all() {
            assert_eq!(PieceKind::from_char(kind.char()).unwrap(), kind);
            assert_eq!(
                PieceKind::from_char(kind.char_for(Color::Black)).unwrap(),
                kind
            );
        }
        assert_eq!("b".parse::<Color>().unwrap(), Color::Black);
        assert!("white".parse::<Color>().is_err());
    }
}
