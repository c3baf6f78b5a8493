/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref};

use anyhow::{bail, ensure, Result};
use arrayvec::ArrayVec;

use super::{
    attackers_of, is_legal, is_square_attacked, is_square_attacked_through, legal_destinations,
    no_legal_moves, CastleSide, Color, Move, MoveKind, MoveList, PieceId, PieceKind, Position,
    Square, Transaction, KING_SLOT, MAX_PIECE_MOVES, ROSTER_SIZE,
};

/// How the game stands for one side.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GameOutcome {
    /// Nothing special.
    Ongoing,
    /// The given side is in check, but has a way out.
    Check(Color),
    /// The given side is in check and has no way out. Its opponent wins.
    Checkmate(Color),
    /// The given side is not in check but its lone King cannot move.
    Stalemate(Color),
}

impl GameOutcome {
    /// Returns `true` if no more moves can be played.
    #[inline(always)]
    pub const fn is_over(&self) -> bool {
        matches!(self, Self::Checkmate(_) | Self::Stalemate(_))
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ongoing => write!(f, "Ongoing"),
            Self::Check(color) => write!(f, "{} is in check", color.name()),
            Self::Checkmate(color) => write!(
                f,
                "Checkmate: {} wins",
                color.opponent().name()
            ),
            Self::Stalemate(color) => write!(f, "Stalemate: {} cannot move", color.name()),
        }
    }
}

/// A game of chess: a [`Position`] together with the rules that decide which moves may be played on it.
///
/// Every query that has to try a move out takes `&mut self`; the position is always restored before it returns.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Game {
    /// The current [`Position`] of the game, including piece layouts, move histories, and turn.
    position: Position,
}

impl Game {
    /// Creates a new [`Game`] from the provided [`Position`].
    #[inline(always)]
    pub const fn new(position: Position) -> Self {
        Self { position }
    }

    /// Returns a reference to the underlying [`Position`] of this [`Game`].
    #[inline(always)]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// Returns a mutable reference to the underlying [`Position`], for setting up scenarios.
    #[inline(always)]
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    /// Consumes this [`Game`], returning its [`Position`].
    #[inline(always)]
    pub fn into_position(self) -> Position {
        self.position
    }

    /// Returns `true` if `color`'s King is attacked. A King that is not on the board is never in check.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut game = Game::default();
    /// for uci in ["e2e4", "f7f6", "d2d4", "g7g5", "d1h5"] {
    ///     game.make_move_checked(Move::from_uci(&game, uci).unwrap()).unwrap();
    /// }
    /// assert!(game.in_check(Color::Black));
    /// assert!(!game.in_check(Color::White));
    /// ```
    pub fn in_check(&self, color: Color) -> bool {
        let king = self.king_square(color);
        king.is_on_board() && is_square_attacked(self.board(), color, king)
    }

    /// Every enemy piece attacking `color`'s King.
    #[inline(always)]
    pub fn checkers(&self, color: Color) -> ArrayVec<PieceId, ROSTER_SIZE> {
        attackers_of(self.board(), color, self.king_square(color))
    }

    /// Returns `true` if `color` is in check and cannot get out of it.
    ///
    /// The King must have no legal move. With two or more checkers that settles it. With a single checker, no
    /// other piece may be able to capture it (en passant included) or, if it is a sliding piece, step
    /// between it and the King, without exposing the King.
    pub fn in_checkmate(&mut self, color: Color) -> bool {
        if !self.in_check(color) || !no_legal_moves(self.board(), color) {
            return false;
        }

        let checkers = self.checkers(color);
        let &[checker] = checkers.as_slice() else {
            return true;
        };

        let king_square = self.king_square(color);
        let checker_piece = self.piece(checker);
        let checker_square = checker_piece.square();
        let capturable_en_passant = self.en_passant_pawn() == Some(checker);

        let between: ArrayVec<Square, 7> = if checker_piece.kind().is_slider() {
            checker_piece
                .pseudo_moves()
                .ray_containing(king_square)
                .into_iter()
                .flatten()
                .copied()
                .take_while(|&square| square != king_square)
                .collect()
        } else {
            ArrayVec::new()
        };

        let defenders = self
            .pieces(color)
            .map(|(id, _)| id)
            .filter(|id| id.slot() != KING_SLOT)
            .collect::<ArrayVec<PieceId, ROSTER_SIZE>>();

        for defender in defenders {
            let resolves = self.legal_moves_for(defender).iter().any(|mv| {
                mv.to() == checker_square
                    || (mv.is_en_passant() && capturable_en_passant)
                    || between.contains(&mv.to())
            });

            if resolves {
                return false;
            }
        }

        true
    }

    /// Returns `true` if `color` is not in check, has nothing left but its King, and the King cannot move.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut board = Board::empty();
    /// board.place(PieceId::king(Color::White), PieceKind::King, Square::new(0, 0)).unwrap();
    /// board.place(PieceId::king(Color::Black), PieceKind::King, Square::new(0, 2)).unwrap();
    /// board.place(PieceId::new(Color::Black, 6), PieceKind::Rook, Square::new(1, 7)).unwrap();
    ///
    /// let game = Game::new(Position::from_board(board, Color::White));
    /// assert!(game.in_stalemate(Color::White));
    /// assert!(!game.in_stalemate(Color::Black));
    /// ```
    pub fn in_stalemate(&self, color: Color) -> bool {
        self.king(color).is_on_board()
            && !self.in_check(color)
            && self.pieces(color).all(|(id, _)| id.slot() == KING_SLOT)
            && no_legal_moves(self.board(), color)
    }

    /// Classifies the game from the point of view of the side to move.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut game = Game::default();
    /// assert_eq!(game.outcome(), GameOutcome::Ongoing);
    ///
    /// for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
    ///     game.make_move_checked(Move::from_uci(&game, uci).unwrap()).unwrap();
    /// }
    /// assert_eq!(game.outcome(), GameOutcome::Checkmate(Color::White));
    /// ```
    pub fn outcome(&mut self) -> GameOutcome {
        let color = self.side_to_move();

        if self.in_checkmate(color) {
            GameOutcome::Checkmate(color)
        } else if self.in_stalemate(color) {
            GameOutcome::Stalemate(color)
        } else if self.in_check(color) {
            GameOutcome::Check(color)
        } else {
            GameOutcome::Ongoing
        }
    }

    /// Returns `true` if `color` may castle towards `side` right now.
    ///
    /// Neither the King nor that Rook may have ever moved, the squares between them must be empty, and the
    /// King may not be in check, pass through an attacked square, or land on one.
    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        let king_square = CastleSide::king_square(color);
        let king = self.king(color);
        if king.square() != king_square || king.has_moved() {
            return false;
        }

        let rook = self.piece(PieceId::new(color, side.rook_slot()));
        if rook.kind() != PieceKind::Rook
            || rook.square() != side.rook_square(color)
            || rook.has_moved()
        {
            return false;
        }

        if side.squares_between(color).iter().any(|&sq| self.has(sq)) {
            return false;
        }

        !self.in_check(color)
            && !side
                .king_path(color)
                .iter()
                .any(|&sq| is_square_attacked_through(self.board(), color, sq, king_square))
    }

    /// Returns `true` if the Pawn on `from` may capture en passant by moving to `to`.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut game = Game::default();
    /// for uci in ["e2e4", "a7a6", "e4e5", "d7d5"] {
    ///     game.make_move_checked(Move::from_uci(&game, uci).unwrap()).unwrap();
    /// }
    /// assert!(game.can_en_passant(Square::new(4, 4), Square::new(3, 5)));
    /// assert!(!game.can_en_passant(Square::new(4, 4), Square::new(5, 5)));
    /// ```
    pub fn can_en_passant(&self, from: Square, to: Square) -> bool {
        let Some(pawn) = self.piece_at(from) else {
            return false;
        };
        let color = pawn.color();

        if pawn.kind() != PieceKind::Pawn
            || from.rank() != color.en_passant_rank()
            || from.distance_files(to) != 1
            || from.forward_by(color, 1).map(|sq| sq.rank()) != Some(to.rank())
            || self.has(to)
        {
            return false;
        }

        let Some(victim) = to.backward_by(color, 1).and_then(|sq| self.id_at(sq)) else {
            return false;
        };

        victim.color() == color.opponent()
            && self.piece(victim).kind() == PieceKind::Pawn
            && self.en_passant_pawn() == Some(victim)
    }

    /// Returns `true` if the move obeys how its piece moves, ignoring whether it exposes its own King.
    ///
    /// The move's [`MoveKind`] must be the one [`Move::infer`] would give it.
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        let (from, to, kind) = mv.parts();
        let Some(id) = self.id_at(from) else {
            return false;
        };
        let color = id.color();

        if Move::infer(self.position(), from, to, mv.promotion()).ok() != Some(mv) {
            return false;
        }

        match kind {
            MoveKind::Castle(side) => {
                id.slot() == KING_SLOT
                    && to == side.king_destination(color)
                    && self.can_castle(color, side)
            }
            MoveKind::EnPassant => self.can_en_passant(from, to),
            _ => is_legal(self.board(), id, to),
        }
    }

    /// Returns `true` if making `mv` would leave the mover's own King in check.
    ///
    /// The move is applied, the King's safety evaluated, and the move reverted.
    pub fn leaves_king_in_check(&mut self, mv: Move) -> bool {
        let Some(id) = self.id_at(mv.from()) else {
            return false;
        };

        let tx = self.position.make_move(mv);
        let in_check = self.in_check(id.color());
        self.position.unmake_move(tx);

        in_check
    }

    /// Returns `true` if `mv` may be played, regardless of whose turn it is.
    #[inline(always)]
    pub fn is_legal_move(&mut self, mv: Move) -> bool {
        self.is_pseudo_legal(mv) && !self.leaves_king_in_check(mv)
    }

    /// Every legal move of the piece `id`, including castling, en passant, and each choice of promotion.
    pub fn legal_moves_for(&mut self, id: PieceId) -> MoveList {
        let mut moves = MoveList::new();
        let piece = self.piece(id);
        if piece.is_captured() {
            return moves;
        }

        let from = piece.square();
        let color = piece.color();
        let is_pawn = piece.kind() == PieceKind::Pawn;

        for to in legal_destinations(self.board(), id) {
            if is_pawn && to.rank() == color.promotion_rank() {
                for promotion in PieceKind::PROMOTIONS {
                    moves.push(Move::new(from, to, MoveKind::Promotion(promotion)));
                }
            } else if is_pawn && from.distance_ranks(to) == 2 {
                moves.push(Move::new(from, to, MoveKind::DoubleStep));
            } else if self.has(to) {
                moves.push(Move::new(from, to, MoveKind::Capture));
            } else {
                moves.push(Move::new(from, to, MoveKind::Quiet));
            }
        }

        if is_pawn {
            for files in [-1, 1] {
                if let Some(to) = from.offset(files, color.forward()) {
                    if self.can_en_passant(from, to) {
                        moves.push(Move::new(from, to, MoveKind::EnPassant));
                    }
                }
            }
        }

        if id.slot() == KING_SLOT {
            for side in CastleSide::all() {
                if self.can_castle(color, side) {
                    moves.push(Move::new(from, side.king_destination(color), MoveKind::Castle(side)));
                }
            }
        }

        moves.retain(|mv| !self.leaves_king_in_check(*mv));
        moves
    }

    /// Every legal move of the side to move.
    ///
    /// # Panics
    /// If there are more than [`crate::MAX_NUM_MOVES`] of them, which cannot happen in a game that began from the
    /// standard setup.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut game = Game::default();
    /// assert_eq!(game.legal_moves().len(), 20);
    /// ```
    pub fn legal_moves(&mut self) -> MoveList {
        let ids = self
            .pieces(self.side_to_move())
            .map(|(id, _)| id)
            .collect::<ArrayVec<PieceId, ROSTER_SIZE>>();

        let mut moves = MoveList::new();
        for id in ids {
            moves.extend(self.legal_moves_for(id));
        }
        moves
    }

    /// Every square the piece on `square` may legally move to.
    pub fn legal_destinations(&mut self, square: Square) -> ArrayVec<Square, MAX_PIECE_MOVES> {
        let Some(id) = self.id_at(square) else {
            return ArrayVec::new();
        };

        let mut destinations = ArrayVec::new();
        for mv in self.legal_moves_for(id) {
            if !destinations.contains(&mv.to()) {
                destinations.push(mv.to());
            }
        }
        destinations
    }

    /// Applies the move, if it is legal to make. If it is not legal, returns an `Err` explaining why.
    ///
    /// # Example
    /// ```
    /// # use chessrules::*;
    /// let mut game = Game::default();
    /// let mv = Move::from_uci(&game, "e7e5").unwrap();
    /// assert!(game.make_move_checked(mv).is_err());
    ///
    /// let mv = Move::from_uci(&game, "e2e4").unwrap();
    /// assert!(game.make_move_checked(mv).is_ok());
    /// ```
    pub fn make_move_checked(&mut self, mv: Move) -> Result<Transaction> {
        let (from, to, _) = mv.parts();
        let Some(piece) = self.piece_at(from) else {
            bail!("There is no piece on {from} to move");
        };
        let color = piece.color();
        let description = piece.to_string();

        ensure!(
            color == self.side_to_move(),
            "It is {}'s turn, but {description} belongs to {}",
            self.side_to_move().name(),
            color.name()
        );
        if let Some(castle) = mv.castle_side() {
            ensure!(
                self.can_castle(color, castle),
                "{} cannot castle {castle}",
                color.name()
            );
        }
        ensure!(
            self.is_pseudo_legal(mv),
            "{description} cannot move to {to}"
        );
        ensure!(
            !self.leaves_king_in_check(mv),
            "Moving {description} to {to} would leave the {} King in check",
            color.name()
        );

        Ok(self.make_move(mv))
    }

    /// Applies the provided move without checking its legality.
    #[inline(always)]
    pub fn make_move(&mut self, mv: Move) -> Transaction {
        self.position.make_move(mv)
    }

    /// Reverts a move applied by [`Game::make_move`] or [`Game::make_move_checked`].
    #[inline(always)]
    pub fn unmake_move(&mut self, tx: Transaction) {
        self.position.unmake_move(tx)
    }
}

impl Deref for Game {
    type Target = Position;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.position
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Board;

    type Placement = (Color, usize, PieceKind, Square);

    fn sq(file: u8, rank: u8) -> Square {
        Square::new(file, rank)
    }

    fn game_with(side_to_move: Color, pieces: &[Placement]) -> Game {
        let mut board = Board::empty();
        for &(color, slot, kind, square) in pieces {
            board.place(PieceId::new(color, slot), kind, square).unwrap();
        }
        Game::new(Position::from_board(board, side_to_move))
    }

    fn play(game: &mut Game, moves: &[&str]) -> Vec<Transaction> {
        moves
            .iter()
            .map(|uci| {
                let mv = Move::from_uci(game, uci).unwrap();
                game.make_move_checked(mv).unwrap()
            })
            .collect()
    }

    #[test]
    fn mate_by_rook_behind_pawns() {
        let mut game = game_with(
            Color::White,
            &[
                (Color::White, 0, PieceKind::King, sq(0, 0)),
                (Color::White, 8, PieceKind::Pawn, sq(0, 1)),
                (Color::White, 9, PieceKind::Pawn, sq(1, 1)),
                (Color::Black, 1, PieceKind::Queen, sq(0, 2)),
                (Color::Black, 6, PieceKind::Rook, sq(2, 0)),
            ],
        );
        assert!(game.in_check(Color::White));
        assert!(game.in_checkmate(Color::White));
        assert_eq!(game.outcome(), GameOutcome::Checkmate(Color::White));
    }

    #[test]
    fn no_mate_without_check() {
        let mut game = game_with(
            Color::White,
            &[
                (Color::White, 0, PieceKind::King, sq(0, 0)),
                (Color::White, 8, PieceKind::Pawn, sq(0, 1)),
                (Color::White, 9, PieceKind::Pawn, sq(1, 1)),
                (Color::Black, 1, PieceKind::Queen, sq(0, 2)),
            ],
        );
        assert!(!game.in_check(Color::White));
        assert!(!game.in_checkmate(Color::White));
        assert_eq!(game.outcome(), GameOutcome::Ongoing);
    }

    fn back_rank(extra: &[Placement]) -> Game {
        let mut pieces = vec![
            (Color::White, 0, PieceKind::King, sq(7, 0)),
            (Color::White, 14, PieceKind::Pawn, sq(6, 1)),
            (Color::White, 15, PieceKind::Pawn, sq(7, 1)),
            (Color::Black, 6, PieceKind::Rook, sq(0, 0)),
        ];
        pieces.extend_from_slice(extra);
        game_with(Color::White, &pieces)
    }

    #[test]
    fn back_rank_mate() {
        let mut game = back_rank(&[]);
        assert!(game.in_checkmate(Color::White));
    }

    #[test]
    fn no_mate_when_checker_can_be_captured() {
        let mut game = back_rank(&[(Color::White, 6, PieceKind::Rook, sq(0, 7))]);
        assert!(game.in_check(Color::White));
        assert!(!game.in_checkmate(Color::White));
        assert_eq!(game.outcome(), GameOutcome::Check(Color::White));
    }

    #[test]
    fn no_mate_when_check_can_be_blocked() {
        let mut game = back_rank(&[(Color::White, 2, PieceKind::Bishop, sq(4, 2))]);
        assert!(!game.in_checkmate(Color::White));
        assert!(game.legal_destinations(sq(4, 2)).contains(&sq(2, 0)));
    }

    #[test]
    fn double_check_is_mate_even_if_one_checker_can_be_captured() {
        let mut game = back_rank(&[
            (Color::White, 6, PieceKind::Rook, sq(0, 7)),
            (Color::Black, 4, PieceKind::Knight, sq(5, 1)),
        ]);
        assert_eq!(game.checkers(Color::White).len(), 2);
        assert!(game.in_checkmate(Color::White));
    }

    #[test]
    fn pinned_blocker_cannot_save_the_king() {
        let pieces: [Placement; 4] = [
            (Color::White, 0, PieceKind::King, sq(7, 0)),
            (Color::White, 14, PieceKind::Pawn, sq(6, 1)),
            (Color::White, 2, PieceKind::Bishop, sq(7, 1)),
            (Color::Black, 6, PieceKind::Rook, sq(0, 0)),
        ];
        let mut game = game_with(Color::White, &pieces);
        assert!(!game.in_checkmate(Color::White));

        // Blocking on g1 would open the h-file
        let mut pieces = pieces.to_vec();
        pieces.push((Color::Black, 7, PieceKind::Rook, sq(7, 7)));
        let mut game = game_with(Color::White, &pieces);
        assert!(game.in_checkmate(Color::White));
    }

    fn en_passant_check(with_capturer: bool) -> Game {
        let mut pieces: Vec<Placement> = vec![
            (Color::White, 0, PieceKind::King, sq(7, 3)),
            (Color::Black, 6, PieceKind::Rook, sq(6, 0)),
            (Color::Black, 7, PieceKind::Rook, sq(0, 2)),
            (Color::Black, 3, PieceKind::Bishop, sq(5, 6)),
            (Color::Black, 4, PieceKind::Knight, sq(4, 5)),
            (Color::Black, 14, PieceKind::Pawn, sq(6, 6)),
        ];
        if with_capturer {
            pieces.push((Color::White, 13, PieceKind::Pawn, sq(5, 4)));
        }

        let mut game = game_with(Color::Black, &pieces);
        play(&mut game, &["g7g5"]);
        game
    }

    #[test]
    fn en_passant_can_capture_a_checking_pawn() {
        let mut game = en_passant_check(true);
        assert!(game.in_check(Color::White));
        assert!(game.can_en_passant(sq(5, 4), sq(6, 5)));
        assert!(!game.in_checkmate(Color::White));
        assert_eq!(game.legal_moves().len(), 1);

        let mut game = en_passant_check(false);
        assert!(game.in_checkmate(Color::White));
    }

    #[test]
    fn stalemate_requires_a_lone_king() {
        let pieces: [Placement; 3] = [
            (Color::White, 0, PieceKind::King, sq(0, 0)),
            (Color::Black, 0, PieceKind::King, sq(0, 2)),
            (Color::Black, 6, PieceKind::Rook, sq(1, 7)),
        ];
        let mut game = game_with(Color::White, &pieces);
        assert!(game.in_stalemate(Color::White));
        assert_eq!(game.outcome(), GameOutcome::Stalemate(Color::White));

        // A blocked Pawn still prevents stalemate
        let mut pieces = pieces.to_vec();
        pieces.push((Color::White, 15, PieceKind::Pawn, sq(7, 3)));
        pieces.push((Color::Black, 15, PieceKind::Pawn, sq(7, 4)));
        let game = game_with(Color::White, &pieces);
        assert!(!game.in_stalemate(Color::White));
    }

    fn castling_setup(extra: &[Placement]) -> Game {
        let mut pieces = vec![
            (Color::White, 0, PieceKind::King, sq(4, 0)),
            (Color::White, 6, PieceKind::Rook, sq(0, 0)),
            (Color::White, 7, PieceKind::Rook, sq(7, 0)),
            (Color::Black, 0, PieceKind::King, sq(4, 7)),
        ];
        pieces.extend_from_slice(extra);
        game_with(Color::White, &pieces)
    }

    #[test]
    fn castling_both_sides() {
        let game = castling_setup(&[]);
        assert!(game.can_castle(Color::White, CastleSide::Queenside));
        assert!(game.can_castle(Color::White, CastleSide::Kingside));
        assert!(!game.can_castle(Color::Black, CastleSide::Kingside));

        let mut game = castling_setup(&[]);
        let destinations = game.legal_destinations(sq(4, 0));
        assert!(destinations.contains(&sq(2, 0)));
        assert!(destinations.contains(&sq(6, 0)));

        let mut game = castling_setup(&[]);
        let mv = Move::infer(&game, sq(4, 0), sq(6, 0), None).unwrap();
        game.make_move_checked(mv).unwrap();
        assert_eq!(game.king_square(Color::White), sq(6, 0));
        assert_eq!(game.id_at(sq(5, 0)), Some(PieceId::new(Color::White, 7)));

        let mut game = castling_setup(&[]);
        let mv = Move::infer(&game, sq(4, 0), sq(2, 0), None).unwrap();
        game.make_move_checked(mv).unwrap();
        assert_eq!(game.king_square(Color::White), sq(2, 0));
        assert_eq!(game.id_at(sq(3, 0)), Some(PieceId::new(Color::White, 6)));
    }

    #[test]
    fn castling_refused_through_attacked_squares() {
        // Check, passing through d1, and landing on c1
        for file in [4, 3, 2] {
            let game = castling_setup(&[(Color::Black, 6, PieceKind::Rook, sq(file, 6))]);
            assert!(!game.can_castle(Color::White, CastleSide::Queenside), "{file}");
        }

        // b1 is only crossed by the Rook
        let game = castling_setup(&[(Color::Black, 6, PieceKind::Rook, sq(1, 6))]);
        assert!(game.can_castle(Color::White, CastleSide::Queenside));
        assert!(game.can_castle(Color::White, CastleSide::Kingside));
    }

    #[test]
    fn castling_refused_when_blocked() {
        let game = castling_setup(&[(Color::White, 4, PieceKind::Knight, sq(1, 0))]);
        assert!(!game.can_castle(Color::White, CastleSide::Queenside));
        assert!(game.can_castle(Color::White, CastleSide::Kingside));
    }

    #[test]
    fn castling_refused_after_rook_returns() {
        let mut game = castling_setup(&[]);
        play(&mut game, &["a1a2", "e8d8", "a2a1", "d8e8"]);
        assert!(!game.can_castle(Color::White, CastleSide::Queenside));
        assert!(game.can_castle(Color::White, CastleSide::Kingside));

        let mv = Move::infer(&game, sq(4, 0), sq(2, 0), None).unwrap();
        assert!(game.make_move_checked(mv).is_err());
    }

    #[test]
    fn en_passant_capture() {
        let mut game = game_with(
            Color::Black,
            &[
                (Color::White, 0, PieceKind::King, sq(4, 0)),
                (Color::White, 9, PieceKind::Pawn, sq(1, 4)),
                (Color::Black, 0, PieceKind::King, sq(4, 7)),
                (Color::Black, 8, PieceKind::Pawn, sq(0, 6)),
            ],
        );
        play(&mut game, &["a7a5"]);
        assert!(game.legal_destinations(sq(1, 4)).contains(&sq(0, 5)));

        let tx = play(&mut game, &["b5a6"]).remove(0);
        assert_eq!(tx.mv().kind(), MoveKind::EnPassant);
        assert!(!game.has(sq(0, 4)));
        assert!(game.piece(PieceId::new(Color::Black, 8)).is_captured());
        assert_eq!(game.id_at(sq(0, 5)), Some(PieceId::new(Color::White, 9)));
    }

    #[test]
    fn en_passant_expires_after_one_move() {
        let mut game = game_with(
            Color::Black,
            &[
                (Color::White, 0, PieceKind::King, sq(4, 0)),
                (Color::White, 9, PieceKind::Pawn, sq(1, 4)),
                (Color::Black, 0, PieceKind::King, sq(4, 7)),
                (Color::Black, 8, PieceKind::Pawn, sq(0, 6)),
            ],
        );
        play(&mut game, &["a7a5", "e1e2", "e8e7"]);
        assert!(!game.can_en_passant(sq(1, 4), sq(0, 5)));
        assert!(!game.legal_destinations(sq(1, 4)).contains(&sq(0, 5)));
    }

    #[test]
    fn pinned_pieces_cannot_expose_their_king() {
        let mut game = game_with(
            Color::White,
            &[
                (Color::White, 0, PieceKind::King, sq(4, 0)),
                (Color::White, 6, PieceKind::Rook, sq(4, 1)),
                (Color::Black, 0, PieceKind::King, sq(0, 7)),
                (Color::Black, 7, PieceKind::Rook, sq(4, 7)),
            ],
        );
        let sideways = Move::new(sq(4, 1), sq(3, 1), MoveKind::Quiet);
        let forward = Move::new(sq(4, 1), sq(4, 4), MoveKind::Quiet);

        assert!(game.is_pseudo_legal(sideways));
        assert!(game.leaves_king_in_check(sideways));
        assert!(!game.is_legal_move(sideways));
        assert!(game.is_legal_move(forward));
        assert!(game.make_move_checked(sideways).is_err());

        let capture = Move::new(sq(4, 1), sq(4, 7), MoveKind::Capture);
        assert!(game.is_legal_move(capture));
    }

    #[test]
    fn promotion_offers_every_piece() {
        let mut game = game_with(
            Color::White,
            &[
                (Color::White, 0, PieceKind::King, sq(4, 0)),
                (Color::White, 8, PieceKind::Pawn, sq(0, 6)),
                (Color::Black, 0, PieceKind::King, sq(4, 7)),
            ],
        );
        let moves = game.legal_moves_for(PieceId::new(Color::White, 8));
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|mv| mv.promotion().is_some()));

        let mv = Move::infer(&game, sq(0, 6), sq(0, 7), Some(PieceKind::Knight)).unwrap();
        game.make_move_checked(mv).unwrap();
        assert_eq!(game.piece_at(sq(0, 7)).unwrap().kind(), PieceKind::Knight);
        assert_eq!(game.piece_at(sq(0, 7)).unwrap().char(), 'N');
    }

    #[test]
    fn checked_moves_explain_themselves() {
        let mut game = Game::default();

        let err = game
            .make_move_checked(Move::new(sq(4, 3), sq(4, 4), MoveKind::Quiet))
            .unwrap_err();
        assert!(err.to_string().contains("no piece"));

        let err = game
            .make_move_checked(Move::new(sq(0, 6), sq(0, 5), MoveKind::Quiet))
            .unwrap_err();
        assert!(err.to_string().contains("turn"));

        let err = game
            .make_move_checked(Move::new(sq(0, 0), sq(0, 3), MoveKind::Quiet))
            .unwrap_err();
        assert!(err.to_string().contains("cannot move"));

        // A Quiet move that is really a double step is rejected
        assert!(game
            .make_move_checked(Move::new(sq(4, 1), sq(4, 3), MoveKind::Quiet))
            .is_err());
    }

    #[test]
    fn moves_never_leave_the_king_in_check() {
        let mut game = Game::default();
        play(&mut game, &["e2e4", "d7d5", "f1b5"]);

        for mv in game.legal_moves() {
            let color = game.side_to_move();
            let tx = game.make_move(mv);
            assert!(!game.in_check(color), "{mv:?} leaves {} in check", color.name());
            game.unmake_move(tx);
        }

        // Black is in check, so only a few replies exist
        assert!(game.in_check(Color::Black));
        let replies = game.legal_moves();
        assert_eq!(replies.len(), 5);
    }

    #[test]
    fn unmaking_every_move_restores_the_start() {
        let mut game = Game::default();
        let start = game.clone();

        let mut transactions = play(
            &mut game,
            &[
                "e2e4", "d7d5", "e4d5", "g8f6", "f1c4", "c7c5", "d5c6", "b8c6", "g1f3", "e7e5",
                "e1g1", "e8e7",
            ],
        );
        assert_eq!(game.king_square(Color::White), sq(6, 0));
        assert!(game.piece(PieceId::new(Color::Black, 10)).is_captured());

        while let Some(tx) = transactions.pop() {
            game.unmake_move(tx);
        }
        assert_eq!(game, start);
        assert!(game.board().check_consistency().is_ok());
    }

    #[test]
    fn turn_can_be_handed_over_through_the_position() {
        let mut game = Game::default();
        game.position_mut().set_side_to_move(Color::Black);

        let e4 = Move::from_uci(&game, "e2e4").unwrap();
        assert!(game.make_move_checked(e4).is_err());
        play(&mut game, &["e7e5"]);
        assert_eq!(game.side_to_move(), Color::White);

        let position = game.into_position();
        assert_eq!(position.id_at(sq(4, 4)), Some(PieceId::new(Color::Black, 12)));
    }
}
