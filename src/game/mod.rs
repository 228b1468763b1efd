//! Core 4x5 Connect Four rules: board, players, and the game session used by
//! both the learner and any front end.

mod board;
mod player;
mod session;

pub use board::{Board, Cell, CELLS, COLS, ROWS, WIN_LENGTH};
pub use player::Player;
pub use session::{Action, GameSession, StateKey, TerminalState};
