use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::TableError;
use crate::game::{Action, Cell, Player, StateKey, CELLS, COLS, ROWS};

/// Estimate returned for a (player, state, action) that has never been updated.
pub const DEFAULT_VALUE: f64 = 0.5;

/// Identity of one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueKey {
    pub player: Player,
    pub state: StateKey,
    pub action: Action,
}

impl ValueKey {
    pub fn new(player: Player, state: StateKey, action: Action) -> Self {
        ValueKey {
            player,
            state,
            action,
        }
    }
}

/// Text form used in persisted tables, e.g.
/// `(2, (0, 1, 0, ..., 2), (-4, 4))`. The action row is written as a negative
/// offset from the bottom (`-1` is the bottom row).
impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, (", self.player.number())?;
        for (i, cell) in self.state.cells().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", cell.code())?;
        }
        write!(f, "), (-{}, {}))", self.action.row + 1, self.action.col)
    }
}

impl FromStr for ValueKey {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TableError::MalformedKey(s.to_string());

        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(malformed)?;
        let (player, rest) = inner.split_once(',').ok_or_else(malformed)?;
        let (cells, rest) = rest
            .trim_start()
            .strip_prefix('(')
            .and_then(|rest| rest.split_once(')'))
            .ok_or_else(malformed)?;
        let (row, col) = rest
            .trim_start()
            .strip_prefix(',')
            .map(str::trim)
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|rest| rest.split_once(','))
            .ok_or_else(malformed)?;

        let player = player
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(Player::from_number)
            .ok_or_else(malformed)?;

        let codes = cells
            .split(',')
            .map(|code| code.trim().parse::<u8>().ok().and_then(Cell::from_code))
            .collect::<Option<Vec<Cell>>>()
            .ok_or_else(malformed)?;
        let state: [Cell; CELLS] = codes.try_into().map_err(|_| malformed())?;

        let row = row.trim().parse::<i64>().map_err(|_| malformed())?;
        let col = col.trim().parse::<usize>().map_err(|_| malformed())?;
        if !(-(ROWS as i64)..=-1).contains(&row) || col >= COLS {
            return Err(malformed());
        }
        let action = Action::new((-row - 1) as usize, col);

        Ok(ValueKey::new(player, StateKey::from_cells(state), action))
    }
}

/// Learned reward estimates keyed by (player, state, action).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    entries: HashMap<ValueKey, f64>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored estimate, or [`DEFAULT_VALUE`] for unseen keys.
    pub fn value(&self, player: Player, state: &StateKey, action: Action) -> f64 {
        self.get(&ValueKey::new(player, *state, action))
    }

    pub fn get(&self, key: &ValueKey) -> f64 {
        self.entries.get(key).copied().unwrap_or(DEFAULT_VALUE)
    }

    /// Create or overwrite an entry.
    pub fn set(&mut self, player: Player, state: &StateKey, action: Action, value: f64) {
        self.entries
            .insert(ValueKey::new(player, *state, action), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ValueKey, &f64)> {
        self.entries.iter()
    }

    /// Text-keyed view of the whole table, sorted by key text.
    pub fn to_text_map(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|(key, &value)| (key.to_string(), value))
            .collect()
    }

    /// Rebuild a table from text keys. Any malformed key rejects the whole
    /// mapping.
    pub fn from_text_map<I>(entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| Ok((key.parse::<ValueKey>()?, value)))
            .collect::<Result<HashMap<_, _>, TableError>>()?;
        Ok(ValueTable { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameSession;

    const SAMPLE_KEY: &str =
        "(2, (0, 1, 0, 2, 0, 2, 2, 0, 1, 2, 1, 2, 0, 1, 1, 1, 2, 1, 1, 2), (-4, 4))";

    #[test]
    fn test_unseen_key_is_default() {
        let table = ValueTable::new();
        let session = GameSession::new();
        let action = session.legal_moves()[0];
        assert_eq!(
            table.value(Player::Red, &session.state_key(), action),
            0.5
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let mut table = ValueTable::new();
        let state = GameSession::new().state_key();
        let action = Action::new(0, 2);

        table.set(Player::Red, &state, action, 1.25);
        assert_eq!(table.value(Player::Red, &state, action), 1.25);

        table.set(Player::Red, &state, action, -0.75);
        assert_eq!(table.value(Player::Red, &state, action), -0.75);
        assert_eq!(table.len(), 1);

        // Same state and action for the other player is a separate entry.
        assert_eq!(table.value(Player::Yellow, &state, action), DEFAULT_VALUE);
    }

    #[test]
    fn test_parse_sample_key() {
        let key: ValueKey = SAMPLE_KEY.parse().unwrap();
        assert_eq!(key.player, Player::Yellow);
        assert_eq!(key.action, Action::new(3, 4));
        assert_eq!(key.state.cells()[0], Cell::Empty);
        assert_eq!(key.state.cells()[1], Cell::Red);
        assert_eq!(key.state.cells()[3], Cell::Yellow);
        assert_eq!(key.to_string(), SAMPLE_KEY);
    }

    #[test]
    fn test_key_text_for_opening_move() {
        let session = GameSession::new();
        let key = ValueKey::new(Player::Red, session.state_key(), Action::new(0, 2));
        assert_eq!(
            key.to_string(),
            "(1, (0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0), (-1, 2))"
        );
    }

    #[test]
    fn test_malformed_keys_are_rejected() {
        let bad = [
            "",
            "garbage",
            "(3, (0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0), (-1, 2))",
            "(1, (0, 0, 0), (-1, 2))",
            "(1, (0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4), (-1, 2))",
            "(1, (0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0), (0, 2))",
            "(1, (0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0), (-5, 2))",
            "(1, (0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0), (-1, 5))",
            "(1, (0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0), -1, 2)",
        ];
        for key in bad {
            assert!(
                matches!(key.parse::<ValueKey>(), Err(TableError::MalformedKey(_))),
                "accepted malformed key {key:?}"
            );
        }
    }

    #[test]
    fn test_text_map_restores_table() {
        let mut table = ValueTable::new();
        let mut session = GameSession::new();
        for col in [0, 1, 2] {
            let action = session.action_for_column(col).unwrap();
            let player = session.current_player();
            table.set(player, &session.state_key(), action, 0.1 * col as f64 - 0.3);
            session.apply(action);
        }

        let text = table.to_text_map();
        assert_eq!(text.len(), 3);
        let restored = ValueTable::from_text_map(text).unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn test_from_text_map_fails_on_any_bad_key() {
        let mut entries = ValueTable::new().to_text_map();
        entries.insert(SAMPLE_KEY.to_string(), 0.08);
        entries.insert("(1, oops)".to_string(), 0.5);
        assert!(ValueTable::from_text_map(entries).is_err());
    }
}
