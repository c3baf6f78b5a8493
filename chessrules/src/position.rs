/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref};

use anyhow::{anyhow, bail, ensure, Result};
use serde::{Deserialize, Serialize};

use super::{
    Color, Move, MoveKind, Piece, PieceId, PieceKind, Square, FIRST_PAWN_SLOT, KING_SLOT,
    ROSTER_SIZE, STARTING_ROSTER,
};

/// Represents the current state of the game, including the positions of all pieces, the side to move,
/// and which Pawn (if any) may be captured en passant.
///
/// Moves are applied with [`Position::make_move`], which returns a [`Transaction`] that
/// [`Position::unmake_move`] uses to restore the exact previous state.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Position {
    /// Placement of every piece.
    board: Board,

    /// The [`Color`] of the current player.
    side_to_move: Color,

    /// The Pawn that advanced two squares on the previous move.
    en_passant: Option<PieceId>,
}

impl Position {
    /// Creates a new [`Position`] with the standard setup and White to move.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let position = Position::new();
    /// assert_eq!(position.side_to_move(), Color::White);
    /// assert_eq!(position.pieces(Color::Black).count(), 16);
    /// ```
    #[inline(always)]
    pub fn new() -> Self {
        Self::from_board(Board::new(), Color::White)
    }

    /// Creates a [`Position`] from an arbitrary [`Board`], with no Pawn eligible for en passant.
    #[inline(always)]
    pub const fn from_board(board: Board, side_to_move: Color) -> Self {
        Self {
            board,
            side_to_move,
            en_passant: None,
        }
    }

    /// Returns a reference to the underlying [`Board`] of this [`Position`].
    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Returns a mutable reference to the underlying [`Board`], for setting up positions.
    #[inline(always)]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// The [`Color`] of the player whose turn it is.
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Hands the turn to `color`.
    #[inline(always)]
    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    /// The Pawn that double-stepped on the previous move, if any.
    #[inline(always)]
    pub const fn en_passant_pawn(&self) -> Option<PieceId> {
        self.en_passant
    }

    /// The square an en passant capture would land on, if one is available.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut position = Position::new();
    /// let mv = Move::from_uci(&position, "d2d4").unwrap();
    /// position.make_move(mv);
    /// assert_eq!(position.en_passant_square(), Some(Square::new(3, 2)));
    /// ```
    pub fn en_passant_square(&self) -> Option<Square> {
        let pawn = self.piece(self.en_passant?);
        pawn.square().backward_by(pawn.color(), 1)
    }

    /// Applies `mv` without checking its legality, returning the [`Transaction`] that undoes it.
    ///
    /// Captures, en passant, castling, and promotion are all carried out according to the move's [`MoveKind`].
    ///
    /// # Panics
    /// If there is no piece on the move's origin, or the move would capture a friendly piece.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut position = Position::new();
    /// let before = position.clone();
    ///
    /// let mv = Move::from_uci(&position, "g1f3").unwrap();
    /// let tx = position.make_move(mv);
    /// assert_eq!(position.side_to_move(), Color::Black);
    /// assert!(position.has(Square::new(5, 2)));
    ///
    /// position.unmake_move(tx);
    /// assert_eq!(position, before);
    /// ```
    pub fn make_move(&mut self, mv: Move) -> Transaction {
        let (from, to, kind) = mv.parts();
        let Some(mover) = self.id_at(from) else {
            panic!("Cannot apply {mv:?}: there is no piece on {from}");
        };
        let color = mover.color();

        let captured = match kind {
            MoveKind::EnPassant => to.backward_by(color, 1).and_then(|sq| self.id_at(sq)),
            MoveKind::Castle(_) => None,
            _ => self.id_at(to),
        };

        let tx = Transaction {
            mv,
            mover,
            captured,
            rook: None,
            promoted_from: None,
            previous_side: self.side_to_move,
            previous_en_passant: self.en_passant,
        };

        if let Some(victim) = captured {
            assert_ne!(
                victim.color(),
                color,
                "Cannot apply {mv:?}: {} cannot capture its own piece",
                self.piece(mover)
            );
            self.board.move_piece(victim, Square::OFF_BOARD);
        }

        self.board.move_piece(mover, to);

        let rook = if let MoveKind::Castle(side) = kind {
            let rook = PieceId::new(color, side.rook_slot());
            self.board.move_piece(rook, side.rook_destination(color));
            Some(rook)
        } else {
            None
        };

        let promoted_from = if let MoveKind::Promotion(promotion) = kind {
            Some(self.board.replace(mover, promotion))
        } else {
            None
        };

        self.en_passant = self.piece(mover).just_double_stepped().then_some(mover);
        self.side_to_move = color.opponent();

        Transaction {
            rook,
            promoted_from,
            ..tx
        }
    }

    /// Reverts a move applied by [`Position::make_move`].
    ///
    /// Transactions must be unmade in the reverse order they were made.
    pub fn unmake_move(&mut self, tx: Transaction) {
        if let Some(pawn) = tx.promoted_from {
            self.board.set_piece(tx.mover, pawn);
        }

        if let Some(rook) = tx.rook {
            self.board.undo_move(rook);
        }

        self.board.undo_move(tx.mover);

        if let Some(victim) = tx.captured {
            self.board.undo_move(victim);
        }

        self.side_to_move = tx.previous_side;
        self.en_passant = tx.previous_en_passant;
    }

    /// Promotes the Pawn on `square` to `kind`, for callers that resolve promotion as a separate step.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut board = Board::empty();
    /// let pawn = PieceId::new(Color::Black, 12);
    /// board.place(pawn, PieceKind::Pawn, Square::new(4, 0)).unwrap();
    /// let mut position = Position::from_board(board, Color::White);
    ///
    /// assert!(position.promote(Square::new(4, 0), PieceKind::King).is_err());
    /// position.promote(Square::new(4, 0), PieceKind::Queen).unwrap();
    /// assert_eq!(position.piece(pawn).kind(), PieceKind::Queen);
    /// ```
    pub fn promote(&mut self, square: Square, kind: PieceKind) -> Result<()> {
        let Some(id) = self.id_at(square) else {
            bail!("There is no piece on {square} to promote");
        };
        let piece = self.piece(id);

        ensure!(
            piece.kind() == PieceKind::Pawn,
            "Only Pawns can promote, but {piece} is not a Pawn"
        );
        ensure!(
            square.rank() == piece.color().promotion_rank(),
            "{piece} has not reached its last rank"
        );
        ensure!(
            kind.is_promotion(),
            "Cannot promote to a {kind}: expected a Queen, Rook, Bishop, or Knight"
        );

        self.board.replace(id, kind);
        Ok(())
    }

    /// Captures everything needed to restore this [`Position`] later.
    pub fn snapshot(&self) -> Snapshot {
        let [white, black] = self.board.rosters.clone();
        Snapshot {
            mailbox: self.board.mailbox.to_vec(),
            white: white.to_vec(),
            black: black.to_vec(),
            side_to_move: self.side_to_move,
            en_passant: self.en_passant,
        }
    }

    /// Restores a [`Position`] from a [`Snapshot`], validating its shape and consistency.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut position = Position::new();
    /// position.make_move(Move::from_uci(&position, "e2e4").unwrap());
    ///
    /// let restored = Position::from_snapshot(position.snapshot()).unwrap();
    /// assert_eq!(restored, position);
    /// ```
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let Snapshot {
            mailbox,
            white,
            black,
            side_to_move,
            en_passant,
        } = snapshot;

        let mailbox: [Option<PieceId>; Square::COUNT] = mailbox.try_into().map_err(
            |mailbox: Vec<_>| {
                anyhow!(
                    "Snapshot maps {} squares; expected {}",
                    mailbox.len(),
                    Square::COUNT
                )
            },
        )?;

        let board = Board {
            mailbox,
            rosters: [
                roster_from(Color::White, white)?,
                roster_from(Color::Black, black)?,
            ],
        };
        board.check_consistency()?;

        if let Some(id) = en_passant {
            ensure!(id.slot() < ROSTER_SIZE, "Invalid en passant piece {id}");
            let pawn = board.piece(id);
            ensure!(
                pawn.just_double_stepped(),
                "{pawn} cannot be captured en passant: it did not just advance two squares"
            );
        }

        Ok(Self {
            board,
            side_to_move,
            en_passant,
        })
    }
}

fn roster_from(color: Color, pieces: Vec<Piece>) -> Result<[Piece; ROSTER_SIZE]> {
    pieces.try_into().map_err(|pieces: Vec<_>| {
        anyhow!(
            "{} roster has {} pieces; expected {ROSTER_SIZE}",
            color.name(),
            pieces.len()
        )
    })
}

impl Deref for Position {
    type Target = Board;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.board()
    }
}

impl Default for Position {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let en_passant = self
            .en_passant_square()
            .map(|sq| sq.to_string())
            .unwrap_or(String::from("-"));

        writeln!(f, "{}", self.board)?;
        writeln!(f)?;
        writeln!(f, "Side to move: {}", self.side_to_move.name())?;
        write!(f, "En passant: {en_passant}")
    }
}

/// Everything needed to revert a move applied by [`Position::make_move`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
    mv: Move,
    mover: PieceId,
    captured: Option<PieceId>,
    rook: Option<PieceId>,
    promoted_from: Option<Piece>,
    previous_side: Color,
    previous_en_passant: Option<PieceId>,
}

impl Transaction {
    /// The move that was applied.
    #[inline(always)]
    pub const fn mv(&self) -> Move {
        self.mv
    }

    /// The piece that moved.
    #[inline(always)]
    pub const fn mover(&self) -> PieceId {
        self.mover
    }

    /// The piece that was captured, if any.
    #[inline(always)]
    pub const fn captured(&self) -> Option<PieceId> {
        self.captured
    }
}

/// A serializable copy of a [`Position`], for persisting a game between sessions.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Occupant of each square, a1 through h8.
    pub mailbox: Vec<Option<PieceId>>,
    /// White's roster, in slot order.
    pub white: Vec<Piece>,
    /// Black's roster, in slot order.
    pub black: Vec<Piece>,
    /// Whose turn it is.
    pub side_to_move: Color,
    /// The Pawn that double-stepped on the previous move, if any.
    pub en_passant: Option<PieceId>,
}

/// The placement of every piece: a mapping of squares to pieces and a fixed roster of 16 pieces per side.
///
/// The mapping and the rosters always agree: the occupant of a square stands on that square, and every
/// piece that is not captured occupies the square it stands on.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    /// Occupant of each square, indexed by [`Square::index`].
    mailbox: [Option<PieceId>; Square::COUNT],

    /// Every piece of each side, indexed by roster slot.
    rosters: [[Piece; ROSTER_SIZE]; Color::COUNT],
}

impl Board {
    /// Creates a [`Board`] with the standard setup of 32 pieces.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let board = Board::new();
    /// assert_eq!(board.piece_at(Square::new(4, 0)).unwrap().kind(), PieceKind::King);
    /// assert_eq!(board.piece_at(Square::new(0, 6)).unwrap().color(), Color::Black);
    /// assert!(board.piece_at(Square::new(4, 4)).is_none());
    /// ```
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.place_initial_setup();
        board
    }

    /// Creates a [`Board`] with no pieces on it.
    ///
    /// Every roster slot holds its standard kind, captured. Use [`Board::place`] to set up a position.
    pub fn empty() -> Self {
        Self {
            mailbox: [None; Square::COUNT],
            rosters: Color::all().map(|color| {
                std::array::from_fn(|slot| {
                    Piece::new(color, STARTING_ROSTER[slot].0, Square::OFF_BOARD)
                })
            }),
        }
    }

    /// Places all 32 pieces on their starting squares, discarding whatever was on the board.
    pub fn place_initial_setup(&mut self) {
        self.mailbox = [None; Square::COUNT];

        for color in Color::all() {
            for (slot, (kind, file)) in STARTING_ROSTER.into_iter().enumerate() {
                let rank = if slot >= FIRST_PAWN_SLOT {
                    color.pawn_rank()
                } else {
                    color.home_rank()
                };
                let square = Square::new(file, rank);

                self.rosters[color.index()][slot] = Piece::new(color, kind, square);
                self.mailbox[square.index()] = Some(PieceId::new(color, slot));
            }
        }

        debug_assert!(self.check_consistency().is_ok());
    }

    /// Places a fresh piece of `kind` in roster slot `id` on `square`, replacing whatever was in that slot.
    ///
    /// Slot 0 is reserved for the King, so there is never more than one King per side.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut board = Board::empty();
    /// let rook = PieceId::new(Color::White, 6);
    /// board.place(rook, PieceKind::Rook, Square::new(4, 4)).unwrap();
    /// assert_eq!(board.id_at(Square::new(4, 4)), Some(rook));
    ///
    /// // Occupied
    /// assert!(board.place(PieceId::new(Color::Black, 8), PieceKind::Pawn, Square::new(4, 4)).is_err());
    /// // Not a King
    /// assert!(board.place(PieceId::king(Color::Black), PieceKind::Queen, Square::new(0, 0)).is_err());
    /// ```
    pub fn place(&mut self, id: PieceId, kind: PieceKind, square: Square) -> Result<()> {
        ensure!(
            square.is_on_board(),
            "Cannot place a piece on {square:?}: it is not on the board"
        );
        ensure!(
            (id.slot() == KING_SLOT) == (kind == PieceKind::King),
            "Cannot place a {kind} in slot {}: slot {KING_SLOT} is reserved for the King",
            id.slot()
        );
        if let Some(occupant) = self.id_at(square).filter(|&occupant| occupant != id) {
            bail!(
                "Cannot place a {kind} on {square}: it is occupied by {}",
                self.piece(occupant)
            );
        }

        let previous = self.piece(id).square();
        if self.id_at(previous) == Some(id) {
            self.mailbox[previous.index()] = None;
        }

        self.rosters[id.color().index()][id.slot()] = Piece::new(id.color(), kind, square);
        self.mailbox[square.index()] = Some(id);

        debug_assert!(self.check_consistency().is_ok());
        Ok(())
    }

    /// Fetches the [`PieceId`] of the occupant of `square`, if there is one.
    #[inline(always)]
    pub fn id_at(&self, square: Square) -> Option<PieceId> {
        if square.is_on_board() {
            self.mailbox[square.index()]
        } else {
            None
        }
    }

    /// Fetches the occupant of `square`, if there is one.
    #[inline(always)]
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.id_at(square).map(|id| self.piece(id))
    }

    /// Fetches the [`Color`] of the occupant of `square`, if there is one.
    #[inline(always)]
    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.id_at(square).map(|id| id.color())
    }

    /// Returns `true` if `square` is occupied.
    #[inline(always)]
    pub fn has(&self, square: Square) -> bool {
        self.id_at(square).is_some()
    }

    /// Fetches the piece in roster slot `id`, whether or not it is on the board.
    #[inline(always)]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.rosters[id.color().index()][id.slot()]
    }

    /// All 16 pieces of `color`, captured or not, in slot order.
    #[inline(always)]
    pub fn roster(&self, color: Color) -> &[Piece; ROSTER_SIZE] {
        &self.rosters[color.index()]
    }

    /// Iterates over the pieces of `color` that are still on the board.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (PieceId, &Piece)> + '_ {
        self.rosters[color.index()]
            .iter()
            .enumerate()
            .filter(|(_, piece)| piece.is_on_board())
            .map(move |(slot, piece)| (PieceId::new(color, slot), piece))
    }

    /// Iterates over every occupied square and its occupant, starting at a1.
    pub fn iter(&self) -> impl Iterator<Item = (Square, PieceId)> + '_ {
        Square::iter().filter_map(|square| self.id_at(square).map(|id| (square, id)))
    }

    /// Fetches `color`'s King.
    #[inline(always)]
    pub fn king(&self, color: Color) -> &Piece {
        self.piece(PieceId::king(color))
    }

    /// The square of `color`'s King, or [`Square::OFF_BOARD`] if it is not on the board.
    #[inline(always)]
    pub fn king_square(&self, color: Color) -> Square {
        self.king(color).square()
    }

    /// Moves the piece `id` to `to`, recording the move in its history.
    ///
    /// Moving to [`Square::OFF_BOARD`] captures the piece. Any piece on `to` must be captured first.
    ///
    /// # Panics
    /// If `to` is occupied by a different piece.
    pub fn move_piece(&mut self, id: PieceId, to: Square) {
        if let Some(occupant) = self.id_at(to).filter(|&occupant| occupant != id) {
            panic!(
                "Cannot move {} to {to}: it is occupied by {}",
                self.piece(id),
                self.piece(occupant)
            );
        }

        let from = self.piece(id).square();
        if self.id_at(from) == Some(id) {
            self.mailbox[from.index()] = None;
        }

        self.piece_mut(id).push_square(to);
        if to.is_on_board() {
            self.mailbox[to.index()] = Some(id);
        }

        debug_assert!(self.check_consistency().is_ok(), "{:?}", self.check_consistency());
    }

    /// Reverts the most recent move of the piece `id`, returning the square it left.
    ///
    /// Pieces involved in the same move may be restored in any order. A piece restored onto a square
    /// that another piece still stands on waits for that square, and claims it once the other piece
    /// leaves. The board is only checked for consistency while no two pieces share a square.
    ///
    /// # Panics
    /// If the piece has never moved.
    pub fn undo_move(&mut self, id: PieceId) -> Square {
        let left = self.piece(id).square();
        if self.id_at(left) == Some(id) {
            self.mailbox[left.index()] = self.other_piece_on(left, id);
        }

        self.piece_mut(id).pop_square();

        let restored = self.piece(id).square();
        let contested = self.other_piece_on(restored, id).is_some();
        if restored.is_on_board() && !contested {
            self.mailbox[restored.index()] = Some(id);
        }

        debug_assert!(
            contested || self.check_consistency().is_ok(),
            "{:?}",
            self.check_consistency()
        );
        left
    }

    /// Finds a piece other than `id` whose history places it on `square`.
    fn other_piece_on(&self, square: Square, id: PieceId) -> Option<PieceId> {
        if !square.is_on_board() {
            return None;
        }

        Color::all()
            .into_iter()
            .flat_map(|color| self.pieces(color))
            .find(|&(other, piece)| other != id && piece.square() == square)
            .map(|(other, _)| other)
    }

    /// Replaces the piece `id` with a fresh piece of `kind` on the same square, returning the old piece.
    pub fn replace(&mut self, id: PieceId, kind: PieceKind) -> Piece {
        let square = self.piece(id).square();
        self.set_piece(id, Piece::new(id.color(), kind, square))
    }

    /// Swaps `piece` into slot `id`. Both must stand on the same square.
    pub(crate) fn set_piece(&mut self, id: PieceId, piece: Piece) -> Piece {
        assert_eq!(
            self.piece(id).square(),
            piece.square(),
            "Cannot swap {piece} into the slot of {}",
            self.piece(id)
        );
        let old = std::mem::replace(&mut self.rosters[id.color().index()][id.slot()], piece);

        debug_assert!(self.check_consistency().is_ok(), "{:?}", self.check_consistency());
        old
    }

    #[inline(always)]
    fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.rosters[id.color().index()][id.slot()]
    }

    /// Verifies that the square mapping and the rosters agree with each other.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// assert!(Board::new().check_consistency().is_ok());
    /// assert!(Board::empty().check_consistency().is_ok());
    /// ```
    pub fn check_consistency(&self) -> Result<()> {
        for (square, id) in Square::iter().zip(self.mailbox) {
            let Some(id) = id else {
                continue;
            };
            ensure!(id.slot() < ROSTER_SIZE, "{square} maps to invalid slot {id}");

            let piece = self.piece(id);
            ensure!(
                piece.square() == square,
                "{square} maps to {id}, but that piece is a {piece}"
            );
        }

        for color in Color::all() {
            for (slot, piece) in self.rosters[color.index()].iter().enumerate() {
                let id = PieceId::new(color, slot);

                ensure!(!piece.history().is_empty(), "{id} has an empty history");
                ensure!(
                    piece.color() == color,
                    "{piece} is in {}'s roster",
                    color.name()
                );
                ensure!(
                    (slot == KING_SLOT) == (piece.kind() == PieceKind::King),
                    "{piece} is in slot {slot}, but slot {KING_SLOT} is reserved for the King"
                );

                let square = piece.square();
                ensure!(
                    !square.is_on_board() || self.mailbox[square.index()] == Some(id),
                    "{piece} is not mapped to its square"
                );
                ensure!(
                    square.is_on_board() || square == Square::OFF_BOARD,
                    "{id} stands on invalid square {square:?}"
                );
            }
        }

        Ok(())
    }
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Allocate just enough capacity
        let mut board = String::with_capacity(198);

        for rank in (0..8).rev() {
            board += &format!("{}| ", rank + 1);

            for file in 0..8 {
                let occupant = self
                    .piece_at(Square::new(file, rank))
                    .map(Piece::char)
                    .unwrap_or('.');

                board += &format!("{occupant} ");
            }

            board += "\n"
        }
        board += " +";
        for _ in 0..8 {
            board += "--";
        }
        board += "\n   ";
        for file in b'a'..=b'h' {
            board += &format!("{} ", file as char);
        }

        write!(f, "{board}")
    }
}
