use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::agent::{Agent, Experience, UpdateMetrics};
use super::policy;
use super::value_table::ValueTable;
use crate::game::{Action, GameSession, Player};

/// Temporal-difference hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TdConfig {
    /// Step size.
    pub alpha: f64,
    /// Discount on the bootstrapped future estimate.
    pub gamma: f64,
}

impl Default for TdConfig {
    fn default() -> Self {
        TdConfig {
            alpha: 0.7,
            gamma: 0.55,
        }
    }
}

impl TdConfig {
    /// `reward + gamma * future - old`.
    pub fn td_error(&self, old: f64, reward: f64, future: f64) -> f64 {
        reward + self.gamma * future - old
    }

    /// One-step update: `old + alpha * (reward + gamma * future - old)`.
    pub fn updated_value(&self, old: f64, reward: f64, future: f64) -> f64 {
        old + self.alpha * self.td_error(old, reward, future)
    }
}

/// Self-play learner backed by an explicit value table.
///
/// The generator is injected so tests and reproducible runs can fix the seed.
pub struct TabularAgent<R = StdRng> {
    table: ValueTable,
    config: TdConfig,
    rng: R,
}

impl TabularAgent<StdRng> {
    /// Fresh table, OS-seeded generator.
    pub fn new(config: TdConfig) -> Self {
        Self::from_table(config, ValueTable::new())
    }

    pub fn from_table(config: TdConfig, table: ValueTable) -> Self {
        TabularAgent::with_rng(config, table, StdRng::from_os_rng())
    }

    pub fn seeded(config: TdConfig, table: ValueTable, seed: u64) -> Self {
        TabularAgent::with_rng(config, table, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TabularAgent<R> {
    pub fn with_rng(config: TdConfig, table: ValueTable, rng: R) -> Self {
        TabularAgent { table, config, rng }
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ValueTable {
        &mut self.table
    }

    pub fn into_table(self) -> ValueTable {
        self.table
    }

    pub fn config(&self) -> &TdConfig {
        &self.config
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Best stored estimate among `player`'s legal actions in `session`;
    /// zero once the game is over.
    pub fn future_estimate(&self, session: &GameSession, player: Player) -> f64 {
        if session.terminal_state().is_terminal() {
            return 0.0;
        }
        let state = session.state_key();
        session
            .legal_moves()
            .into_iter()
            .map(|action| self.table.value(player, &state, action))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Choose a move for the player to act in `session`. Legal moves are
    /// shuffled first so the order-dependent greedy pass breaks ties randomly.
    pub fn select_move(&mut self, session: &GameSession, training: bool) -> Action {
        let actions = session.shuffled_legal_moves(&mut self.rng);
        if training {
            policy::sample_by_bucket(&mut self.rng, &self.table, session, &actions)
        } else {
            policy::select_near_greedy(&mut self.rng, &self.table, session, &actions)
        }
    }
}

impl<R: Rng> Agent for TabularAgent<R> {
    fn select_action(&mut self, session: &GameSession, training: bool) -> Action {
        self.select_move(session, training)
    }

    fn name(&self) -> &str {
        "Tabular TD"
    }

    fn update(&mut self, experience: &Experience) -> UpdateMetrics {
        let old = self
            .table
            .value(experience.player, &experience.state, experience.action);
        let future = self.future_estimate(&experience.next_state, experience.player);
        let td_error = self.config.td_error(old, experience.reward, future);
        let new_value = self.config.updated_value(old, experience.reward, future);
        self.table.set(
            experience.player,
            &experience.state,
            experience.action,
            new_value,
        );
        UpdateMetrics {
            td_error,
            new_value,
        }
    }
}
