//! # TD Connect Four
//!
//! A tabular temporal-difference learner for Connect Four on a 4x5 board.
//! The agent plays both sides of many self-play games, keeps an explicit
//! table of (player, board, move) value estimates, and exports that table so
//! it can later drive move selection.
//!
//! ## Modules
//!
//! - [`game`]: board, player identity, game session and terminal detection
//! - [`ai`]: agent trait, value table, bucketed and near-greedy move selection
//! - [`training`]: self-play episodes, rolling metrics, checkpointing trainer
//! - [`checkpoint`]: table export and import in full or compressed form
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
