//! Value table files.
//!
//! ```text
//! Full form (<stem>.json):
//!   {"(P, (c0, ..., c19), (R, C))": value, ...}   4-space indented, sorted keys
//!
//! Compressed form (<stem>.zst):
//!   zstd stream (level 3) of the same mapping as compact JSON
//! ```
//!
//! Both forms hold the whole table; there is no incremental write. Files are
//! written beside the target as `<name>.tmp` and renamed into place.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::ai::ValueTable;
use crate::error::TableError;

const ZSTD_LEVEL: i32 = 3;

/// On-disk representation of a value table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Full,
    Compressed,
}

impl TableFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Full => "json",
            TableFormat::Compressed => "zst",
        }
    }

    /// Parse a user-facing format name.
    pub fn from_name(name: &str) -> Option<TableFormat> {
        match name {
            "full" | "json" => Some(TableFormat::Full),
            "compressed" | "zst" => Some(TableFormat::Compressed),
            _ => None,
        }
    }
}

/// Serialize the whole table in `format` and atomically replace `path`.
pub fn write_table(table: &ValueTable, path: &Path, format: TableFormat) -> Result<(), TableError> {
    let entries = table.to_text_map();
    let bytes = match format {
        TableFormat::Full => {
            let mut buf = Vec::new();
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            entries.serialize(&mut serializer)?;
            buf
        }
        TableFormat::Compressed => {
            let json = serde_json::to_vec(&entries)?;
            zstd::encode_all(&json[..], ZSTD_LEVEL).map_err(|source| TableError::Write {
                path: path.to_path_buf(),
                source,
            })?
        }
    };

    let tmp_path = tmp_path_for(path);
    let write_err = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp_path, &bytes).map_err(write_err)?;
    fs::rename(&tmp_path, path).map_err(write_err)?;
    Ok(())
}

/// Load a table written in `format`. Any read, decode or key error fails the
/// whole load.
pub fn read_table(path: &Path, format: TableFormat) -> Result<ValueTable, TableError> {
    let bytes = fs::read(path).map_err(|source| TableError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let json = match format {
        TableFormat::Full => bytes,
        TableFormat::Compressed => {
            zstd::decode_all(&bytes[..]).map_err(|source| TableError::Decompress {
                path: path.to_path_buf(),
                source,
            })?
        }
    };

    let entries: HashMap<String, f64> =
        serde_json::from_slice(&json).map_err(|source| TableError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    ValueTable::from_text_map(entries)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameSession, Player};

    fn sample_table() -> ValueTable {
        let mut table = ValueTable::new();
        let mut session = GameSession::new();
        for (i, col) in [2, 2, 3, 1].into_iter().enumerate() {
            let action = session.action_for_column(col).unwrap();
            let player = session.current_player();
            table.set(player, &session.state_key(), action, 0.08698737399252718 * i as f64 - 1.0);
            session.apply(action);
        }
        table.set(Player::Yellow, &session.state_key(), session.legal_moves()[0], 2.25);
        table
    }

    #[test]
    fn test_full_form_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("4x5.json");
        let table = sample_table();

        write_table(&table, &path, TableFormat::Full).unwrap();
        let loaded = read_table(&path, TableFormat::Full).unwrap();
        assert_eq!(loaded, table);
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_full_form_is_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("4x5.json");
        write_table(&sample_table(), &path, TableFormat::Full).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"("));
        let parsed: HashMap<String, f64> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 5);
    }

    #[test]
    fn test_compressed_form_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("4x5.zst");
        let table = sample_table();

        write_table(&table, &path, TableFormat::Compressed).unwrap();
        let loaded = read_table(&path, TableFormat::Compressed).unwrap();
        assert_eq!(loaded, table);
    }

    /// Values shaped like repeated TD updates, spread over many reachable keys.
    fn td_valued_table(games: usize) -> ValueTable {
        use rand::rngs::StdRng;
        use rand::seq::IndexedRandom;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(2024);
        let mut table = ValueTable::new();
        for _ in 0..games {
            let mut session = GameSession::new();
            while !session.terminal_state().is_terminal() {
                let player = session.current_player();
                let state = session.state_key();
                let moves = session.legal_moves();
                for &action in &moves {
                    let mut value = table.value(player, &state, action);
                    for _ in 0..3 {
                        let reward = [3.0, -3.0, -1.0, 0.0][rng.random_range(0..4)];
                        let future: f64 = rng.random_range(-3.0..3.0);
                        value += 0.7 * (reward + 0.55 * future - value);
                    }
                    table.set(player, &state, action, value);
                }
                let Some(&action) = moves.choose(&mut rng) else {
                    break;
                };
                session.apply(action);
            }
        }
        table
    }

    #[test]
    fn test_values_survive_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let table = td_valued_table(300);
        assert!(table.len() > 1000, "only {} entries", table.len());

        for format in [TableFormat::Full, TableFormat::Compressed] {
            let path = dir.path().join(format!("4x5.{}", format.extension()));
            write_table(&table, &path, format).unwrap();
            let loaded = read_table(&path, format).unwrap();

            assert_eq!(loaded.len(), table.len());
            let mismatches: Vec<(f64, f64)> = table
                .iter()
                .filter(|(key, value)| loaded.get(key).to_bits() != value.to_bits())
                .map(|(key, &value)| (value, loaded.get(key)))
                .take(5)
                .collect();
            assert!(mismatches.is_empty(), "{format:?} drifted: {mismatches:?}");
        }
    }

    #[test]
    fn test_accepts_tables_from_other_writers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        fs::write(
            &path,
            r#"{"(2, (0, 1, 0, 2, 0, 2, 2, 0, 1, 2, 1, 2, 0, 1, 1, 1, 2, 1, 1, 2), (-4, 4))": 0.08698737399252718}"#,
        )
        .unwrap();

        let table = read_table(&path, TableFormat::Full).unwrap();
        assert_eq!(table.len(), 1);
        let (_, &value) = table.iter().next().unwrap();
        assert_eq!(value, 0.08698737399252718);
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table(&dir.path().join("absent.json"), TableFormat::Full).unwrap_err();
        assert!(matches!(err, TableError::Read { .. }), "got {err}");
    }

    #[test]
    fn test_malformed_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"(1, (0), (-1, 0))\": ").unwrap();
        let err = read_table(&path, TableFormat::Full).unwrap_err();
        assert!(matches!(err, TableError::Parse { .. }), "got {err}");
    }

    #[test]
    fn test_malformed_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badkey.json");
        fs::write(&path, r#"{"not a key": 0.5}"#).unwrap();
        let err = read_table(&path, TableFormat::Full).unwrap_err();
        assert!(matches!(err, TableError::MalformedKey(_)), "got {err}");
    }

    #[test]
    fn test_wrong_format_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("4x5.json");
        write_table(&sample_table(), &path, TableFormat::Full).unwrap();
        let err = read_table(&path, TableFormat::Compressed).unwrap_err();
        assert!(matches!(err, TableError::Decompress { .. }), "got {err}");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(TableFormat::from_name("full"), Some(TableFormat::Full));
        assert_eq!(TableFormat::from_name("compressed"), Some(TableFormat::Compressed));
        assert_eq!(TableFormat::from_name("gzip"), None);
        assert_eq!(TableFormat::Compressed.extension(), "zst");
    }
}
