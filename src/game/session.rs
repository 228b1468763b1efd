use rand::seq::SliceRandom;
use rand::Rng;

use super::board::{Board, Cell, CELLS, COLS};
use super::Player;

/// A move: the landing cell, with `row` counted from the bottom of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action {
    pub row: usize,
    pub col: usize,
}

impl Action {
    pub fn new(row: usize, col: usize) -> Self {
        Action { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Ongoing,
    Draw,
    Won(Player),
}

impl TerminalState {
    pub fn is_terminal(self) -> bool {
        self != TerminalState::Ongoing
    }
}

/// Full board contents, top row first. Two sessions with the same cells have
/// the same key regardless of move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey([Cell; CELLS]);

impl StateKey {
    pub fn from_cells(cells: [Cell; CELLS]) -> Self {
        StateKey(cells)
    }

    pub fn cells(&self) -> &[Cell; CELLS] {
        &self.0
    }
}

/// A game in progress. Copying a session yields a fully independent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSession {
    board: Board,
    colored: [usize; 2],
    free_cells: usize,
}

impl GameSession {
    pub fn new() -> Self {
        GameSession {
            board: Board::new(),
            colored: [0, 0],
            free_cells: CELLS,
        }
    }

    /// Return to an empty board.
    pub fn reset(&mut self) {
        *self = GameSession::new();
    }

    /// Yellow moves whenever Red has strictly more marks on the board,
    /// otherwise Red does.
    pub fn current_player(&self) -> Player {
        if self.colored[Player::Red.index()] > self.colored[Player::Yellow.index()] {
            Player::Yellow
        } else {
            Player::Red
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn colored_cells(&self, player: Player) -> usize {
        self.colored[player.index()]
    }

    pub fn free_cells(&self) -> usize {
        self.free_cells
    }

    /// Share of the board still empty, as a percentage in [0, 100].
    pub fn remaining_percentage(&self) -> f64 {
        let filled = (CELLS - self.free_cells) as f64;
        100.0 - filled / CELLS as f64 * 100.0
    }

    pub fn column_has_space(&self, col: usize) -> bool {
        self.board.column_has_space(col)
    }

    /// Row (from the bottom) a piece dropped in `col` would land on.
    pub fn lowest_free_row(&self, col: usize) -> Option<usize> {
        self.board.lowest_free_row(col)
    }

    pub fn action_for_column(&self, col: usize) -> Option<Action> {
        self.lowest_free_row(col).map(|row| Action::new(row, col))
    }

    /// One action per column with free space, in ascending column order.
    pub fn legal_moves(&self) -> Vec<Action> {
        (0..COLS).filter_map(|col| self.action_for_column(col)).collect()
    }

    /// Same set as [`legal_moves`](Self::legal_moves) in random column order.
    pub fn shuffled_legal_moves<R: Rng>(&self, rng: &mut R) -> Vec<Action> {
        let mut actions = self.legal_moves();
        actions.shuffle(rng);
        actions
    }

    /// Mark the action's cell for the current player.
    ///
    /// No room check is made: callers must confirm
    /// [`column_has_space`](Self::column_has_space) first. Targeting an
    /// occupied cell panics in debug builds and is unspecified otherwise.
    pub fn apply(&mut self, action: Action) -> bool {
        let player = self.current_player();
        self.board.place(action.row, action.col, player.to_cell());
        self.colored[player.index()] += 1;
        self.free_cells -= 1;
        true
    }

    pub fn winner(&self) -> Option<Player> {
        self.board.winner().and_then(Player::from_cell)
    }

    /// Win takes precedence over draw; draw means no free cells remain.
    pub fn terminal_state(&self) -> TerminalState {
        if let Some(player) = self.winner() {
            TerminalState::Won(player)
        } else if self.free_cells == 0 {
            TerminalState::Draw
        } else {
            TerminalState::Ongoing
        }
    }

    pub fn state_key(&self) -> StateKey {
        StateKey(self.board.flatten())
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ROWS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn play_columns(columns: &[usize]) -> GameSession {
        let mut session = GameSession::new();
        for &col in columns {
            let action = session.action_for_column(col).unwrap();
            session.apply(action);
        }
        session
    }

    fn assert_counters_balanced(session: &GameSession) {
        assert_eq!(
            session.free_cells()
                + session.colored_cells(Player::Red)
                + session.colored_cells(Player::Yellow),
            CELLS
        );
    }

    #[test]
    fn test_initial_session() {
        let session = GameSession::new();
        assert_eq!(session.current_player(), Player::Red);
        assert_eq!(session.free_cells(), CELLS);
        assert_eq!(session.terminal_state(), TerminalState::Ongoing);
        assert_eq!(session.legal_moves().len(), COLS);
        assert!(session.legal_moves().iter().all(|a| a.row == 0));
        assert!((session.remaining_percentage() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_current_player_follows_counts() {
        let mut session = GameSession::new();
        session.apply(Action::new(0, 1));
        assert_eq!(session.current_player(), Player::Yellow);
        assert_eq!(session.board().get(ROWS - 1, 1), Cell::Red);

        session.apply(Action::new(0, 2));
        assert_eq!(session.current_player(), Player::Red);
        assert_eq!(session.board().get(ROWS - 1, 2), Cell::Yellow);
        assert_counters_balanced(&session);
    }

    #[test]
    fn test_apply_reports_success() {
        let mut session = GameSession::new();
        let action = session.action_for_column(0).unwrap();
        assert!(session.apply(action));
        assert_eq!(session.colored_cells(Player::Red), 1);
        assert_eq!(session.free_cells(), CELLS - 1);
    }

    #[test]
    fn test_filling_a_column_removes_it_from_legal_moves() {
        let mut session = GameSession::new();
        for expected_row in 0..ROWS {
            assert!(session.column_has_space(2));
            assert_eq!(session.lowest_free_row(2), Some(expected_row));
            let action = session.action_for_column(2).unwrap();
            session.apply(action);
        }

        // Four alternating moves: Red, Yellow, Red, Yellow.
        assert_eq!(session.colored_cells(Player::Red), 2);
        assert_eq!(session.colored_cells(Player::Yellow), 2);
        assert!(!session.column_has_space(2));
        assert_eq!(session.lowest_free_row(2), None);
        assert!(session.legal_moves().iter().all(|a| a.col != 2));
        assert_eq!(session.legal_moves().len(), COLS - 1);
        assert_counters_balanced(&session);
    }

    #[test]
    fn test_horizontal_win_on_bottom_row() {
        // Red takes columns 0..4 on the bottom row, Yellow stacks on top.
        let session = play_columns(&[0, 0, 1, 1, 2, 2, 3]);
        assert_eq!(session.winner(), Some(Player::Red));
        assert_eq!(session.terminal_state(), TerminalState::Won(Player::Red));
    }

    #[test]
    fn test_draw_on_full_board() {
        let session = play_columns(&[4, 3, 0, 2, 0, 1, 2, 4, 2, 1, 3, 3, 2, 0, 3, 0, 1, 4, 4, 1]);
        assert_eq!(session.free_cells(), 0);
        assert!(session.legal_moves().is_empty());
        assert_eq!(session.terminal_state(), TerminalState::Draw);
    }

    #[test]
    fn test_win_on_last_cell_beats_draw() {
        let session = play_columns(&[1, 0, 2, 0, 2, 1, 4, 4, 1, 3, 4, 3, 3, 4, 0, 2, 0, 1, 2, 3]);
        assert_eq!(session.free_cells(), 0);
        assert_eq!(session.terminal_state(), TerminalState::Won(Player::Yellow));
    }

    #[test]
    fn test_copy_is_independent() {
        let original = play_columns(&[0, 1]);
        let mut lookahead = original;
        lookahead.apply(lookahead.action_for_column(4).unwrap());

        assert_eq!(original.free_cells(), CELLS - 2);
        assert_eq!(lookahead.free_cells(), CELLS - 3);
        assert_ne!(original.state_key(), lookahead.state_key());
        assert!(original.column_has_space(4));
        assert_eq!(original.lowest_free_row(4), Some(0));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = play_columns(&[0, 1, 2, 3]);
        session.reset();
        assert_eq!(session, GameSession::new());
    }

    #[test]
    fn test_state_key_ignores_history() {
        let a = play_columns(&[0, 1, 2, 3]);
        let b = play_columns(&[2, 3, 0, 1]);
        assert_eq!(a.state_key(), b.state_key());
    }

    #[test]
    fn test_shuffled_moves_are_same_set() {
        let session = play_columns(&[3, 3, 3, 3]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut shuffled = session.shuffled_legal_moves(&mut rng);
            shuffled.sort();
            assert_eq!(shuffled, session.legal_moves());
        }
    }

    #[test]
    fn test_remaining_percentage() {
        let session = play_columns(&[0, 1, 2, 3, 4, 0]);
        assert!((session.remaining_percentage() - 70.0).abs() < 1e-9);
    }
}
