/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, ensure, Result};
use arrayvec::ArrayVec;

use super::{
    Color, PieceKind, Position, Square, KINGSIDE_ROOK_SLOT, QUEENSIDE_ROOK_SLOT,
};

/// File that both Kings start on.
pub const KING_START_FILE: u8 = 4;

/// The side of the board a King castles towards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CastleSide {
    /// Towards the a-file Rook ("long" castling).
    Queenside,
    /// Towards the h-file Rook ("short" castling).
    Kingside,
}

impl CastleSide {
    /// Both castling sides.
    #[inline(always)]
    pub const fn all() -> [Self; 2] {
        [Self::Queenside, Self::Kingside]
    }

    /// Infers the castling side from the file a King lands on.
    #[inline(always)]
    pub const fn from_king_destination_file(file: u8) -> Option<Self> {
        match file {
            2 => Some(Self::Queenside),
            6 => Some(Self::Kingside),
            _ => None,
        }
    }

    /// Roster slot of the Rook that castles on this side.
    #[inline(always)]
    pub const fn rook_slot(&self) -> usize {
        match self {
            Self::Queenside => QUEENSIDE_ROOK_SLOT,
            Self::Kingside => KINGSIDE_ROOK_SLOT,
        }
    }

    /// The square `color`'s King starts on.
    #[inline(always)]
    pub const fn king_square(color: Color) -> Square {
        Square::new(KING_START_FILE, color.home_rank())
    }

    /// The square the castling Rook must stand on.
    #[inline(always)]
    pub const fn rook_square(&self, color: Color) -> Square {
        let file = match self {
            Self::Queenside => 0,
            Self::Kingside => 7,
        };
        Square::new(file, color.home_rank())
    }

    /// The square the King lands on.
    #[inline(always)]
    pub const fn king_destination(&self, color: Color) -> Square {
        let file = match self {
            Self::Queenside => 2,
            Self::Kingside => 6,
        };
        Square::new(file, color.home_rank())
    }

    /// The square the Rook lands on, which is the square the King crosses.
    #[inline(always)]
    pub const fn rook_destination(&self, color: Color) -> Square {
        let file = match self {
            Self::Queenside => 3,
            Self::Kingside => 5,
        };
        Square::new(file, color.home_rank())
    }

    /// Squares strictly between the King and the Rook, all of which must be empty.
    pub fn squares_between(&self, color: Color) -> ArrayVec<Square, 3> {
        let files = match self {
            Self::Queenside => 1..=3,
            Self::Kingside => 5..=6,
        };
        files
            .map(|file| Square::new(file, color.home_rank()))
            .collect()
    }

    /// Squares the King passes through or lands on, none of which may be attacked.
    #[inline(always)]
    pub const fn king_path(&self, color: Color) -> [Square; 2] {
        [self.rook_destination(color), self.king_destination(color)]
    }
}

impl fmt::Display for CastleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queenside => write!(f, "queenside"),
            Self::Kingside => write!(f, "kingside"),
        }
    }
}

/// What a [`Move`] does beyond relocating the moving piece.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MoveKind {
    /// Moves to an empty square.
    Quiet,
    /// Captures the enemy piece on the destination.
    Capture,
    /// A Pawn advancing two squares from its starting rank.
    DoubleStep,
    /// The King moves two squares towards a Rook, which jumps over it.
    Castle(CastleSide),
    /// A Pawn captures an enemy Pawn that just double-stepped past it.
    EnPassant,
    /// A Pawn reaches its last rank (capturing or not) and becomes the given kind.
    Promotion(PieceKind),
}

/// A move of a piece from one square to another.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    kind: MoveKind,
}

impl Move {
    /// Creates a new [`Move`]. Nothing is checked.
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self { from, to, kind }
    }

    /// Constructs a [`Move`] from `from` to `to` in `position`, inferring its [`MoveKind`].
    ///
    /// `promotion` must be provided exactly when a Pawn moves onto its last rank.
    /// The move's legality is not checked.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let position = Position::default();
    /// let mv = Move::infer(&position, Square::new(4, 1), Square::new(4, 3), None).unwrap();
    /// assert_eq!(mv.kind(), MoveKind::DoubleStep);
    /// assert!(mv.is_double_step());
    ///
    /// assert!(Move::infer(&position, Square::new(4, 4), Square::new(4, 5), None).is_err());
    /// ```
    pub fn infer(
        position: &Position,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Self> {
        ensure!(to.is_on_board(), "Cannot move off of the board");
        let Some(piece) = position.piece_at(from) else {
            bail!("No piece on {from} to move");
        };
        let color = piece.color();
        let home = color.home_rank();

        let kind = match piece.kind() {
            PieceKind::King
                if from == CastleSide::king_square(color)
                    && to.rank() == home
                    && from.distance_files(to) == 2 =>
            {
                match CastleSide::from_king_destination_file(to.file()) {
                    Some(side) => MoveKind::Castle(side),
                    None => bail!("Invalid castling destination {to}"),
                }
            }

            PieceKind::Pawn if to.rank() == color.promotion_rank() => {
                let Some(promotion) = promotion else {
                    bail!("A Pawn reaching {to} must promote to a Queen, Rook, Bishop, or Knight");
                };
                ensure!(promotion.is_promotion(), "Cannot promote a Pawn to a {promotion}");
                MoveKind::Promotion(promotion)
            }

            PieceKind::Pawn if from.file() != to.file() && !position.has(to) => MoveKind::EnPassant,

            PieceKind::Pawn if from.distance_ranks(to) == 2 => MoveKind::DoubleStep,

            _ if position.has(to) => MoveKind::Capture,

            _ => MoveKind::Quiet,
        };

        if let Some(promotion) = promotion {
            ensure!(
                matches!(kind, MoveKind::Promotion(_)),
                "Cannot promote to a {promotion}: only a Pawn reaching its last rank may promote"
            );
        }

        Ok(Self::new(from, to, kind))
    }

    /// Parses a move in coordinate notation (`"e2e4"`, `"a7a8q"`) in the context of `position`.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let position = Position::default();
    /// let mv = Move::from_uci(&position, "g1f3").unwrap();
    /// assert_eq!(mv.from(), Square::new(6, 0));
    /// assert_eq!(mv.to(), Square::new(5, 2));
    /// assert_eq!(mv.to_string(), "g1f3");
    /// ```
    pub fn from_uci(position: &Position, uci: &str) -> Result<Self> {
        let uci = uci.trim();
        ensure!(
            uci.is_ascii() && (4..=5).contains(&uci.len()),
            "Invalid move {uci:?}: expected something like \"e2e4\" or \"a7a8q\""
        );

        let from = Square::from_uci(&uci[0..2])?;
        let to = Square::from_uci(&uci[2..4])?;
        let promotion = uci[4..]
            .chars()
            .next()
            .map(PieceKind::from_char)
            .transpose()?;

        Self::infer(position, from, to, promotion)
    }

    /// The square the moving piece starts on.
    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    /// The square the moving piece lands on.
    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// What kind of move this is.
    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    /// Returns the origin, destination, and kind of this move.
    #[inline(always)]
    pub const fn parts(&self) -> (Square, Square, MoveKind) {
        (self.from, self.to, self.kind)
    }

    /// The castling side, if this move is a castle.
    #[inline(always)]
    pub const fn castle_side(&self) -> Option<CastleSide> {
        match self.kind {
            MoveKind::Castle(side) => Some(side),
            _ => None,
        }
    }

    /// The kind being promoted to, if this move is a promotion.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        match self.kind {
            MoveKind::Promotion(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns `true` if this move is an en passant capture.
    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        matches!(self.kind, MoveKind::EnPassant)
    }

    /// Returns `true` if this move is a Pawn's two-square advance.
    #[inline(always)]
    pub const fn is_double_step(&self) -> bool {
        matches!(self.kind, MoveKind::DoubleStep)
    }

    /// Converts this move to coordinate notation, like `"e7e8q"`.
    pub fn to_uci(&self) -> String {
        match self.promotion() {
            Some(kind) => format!(
                "{}{}{}",
                self.from,
                self.to,
                kind.char().to_ascii_lowercase()
            ),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.to_uci(), self.kind)
    }
}
