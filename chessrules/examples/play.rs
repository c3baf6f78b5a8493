/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use chessrules::{Color, Game, GameOutcome, Move, Square};

/// Replay a sequence of moves from the standard setup, printing the board and the state of the game.
#[derive(Debug, Parser)]
struct Cli {
    /// Moves to play, in coordinate notation (`e2e4`, `e7e8q`).
    moves: Vec<String>,

    /// Print the board after every move, not just at the end.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Print the final position as a JSON snapshot.
    #[arg(short, long, default_value = "false")]
    json: bool,
}

fn render(game: &Game) -> String {
    let mut board = String::new();

    for rank in (0..8).rev() {
        board += &format!("{}| ", rank + 1);
        for file in 0..8 {
            let occupant = match game.piece_at(Square::new(file, rank)) {
                Some(piece) if piece.color() == Color::White => piece.char().to_string().bold(),
                Some(piece) => piece.char().to_string().red().bold(),
                None => ".".dimmed(),
            };
            board += &format!("{occupant} ");
        }
        board += "\n";
    }
    board += " +----------------\n   a b c d e f g h";

    board
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let mut game = Game::default();

    for (i, uci) in args.moves.iter().enumerate() {
        let mover = game.side_to_move();
        let mv = Move::from_uci(&game, uci)
            .and_then(|mv| game.make_move_checked(mv).map(|_| mv))
            .with_context(|| format!("Move #{} ({uci}) by {} was rejected", i + 1, mover.name()))?;

        if args.verbose {
            println!("{} plays {mv}\n{}\n", mover.name(), render(&game));
        }

        let outcome = game.outcome();
        if outcome.is_over() && i + 1 < args.moves.len() {
            println!("{outcome}; ignoring the remaining moves");
            break;
        }
    }

    if !args.verbose {
        println!("{}\n", render(&game));
    }

    let outcome = game.outcome();
    match outcome {
        GameOutcome::Ongoing => println!("{} to move", game.side_to_move().name()),
        GameOutcome::Check(_) => println!("{}", outcome.to_string().yellow()),
        GameOutcome::Checkmate(_) | GameOutcome::Stalemate(_) => {
            println!("{}", outcome.to_string().green().bold())
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&game.snapshot())?);
    }

    Ok(())
}
