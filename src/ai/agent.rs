use crate::game::{Action, GameSession, Player, StateKey};

/// One learning signal: `player` took `action` in `state`, received `reward`,
/// and play continued from `next_state`.
#[derive(Debug, Clone)]
pub struct Experience {
    pub player: Player,
    pub state: StateKey,
    pub action: Action,
    pub reward: f64,
    pub next_state: GameSession,
}

/// Metrics returned from a training update.
#[derive(Debug, Clone, Default)]
pub struct UpdateMetrics {
    /// `reward + gamma * future - old` before the step size is applied.
    pub td_error: f64,
    pub new_value: f64,
}

/// Universal interface for all agents.
pub trait Agent {
    /// Select an action given the current session.
    /// When `training` is true, the agent may explore; otherwise it exploits.
    fn select_action(&mut self, session: &GameSession, training: bool) -> Action;

    /// Return the agent's display name.
    fn name(&self) -> &str;

    /// Learn from a single experience. Returns training metrics.
    fn update(&mut self, _experience: &Experience) -> UpdateMetrics {
        UpdateMetrics::default()
    }
}
