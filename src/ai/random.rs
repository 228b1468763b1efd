use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::agent::Agent;
use crate::game::{Action, GameSession};

/// An agent that selects uniformly at random from legal actions.
pub struct RandomAgent<R = StdRng> {
    rng: R,
}

impl RandomAgent<StdRng> {
    pub fn new() -> Self {
        RandomAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomAgent::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomAgent<R> {
    pub fn with_rng(rng: R) -> Self {
        RandomAgent { rng }
    }
}

impl Default for RandomAgent<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Agent for RandomAgent<R> {
    fn select_action(&mut self, session: &GameSession, _training: bool) -> Action {
        let actions = session.legal_moves();
        assert!(!actions.is_empty(), "No legal actions available");
        let idx = self.rng.random_range(0..actions.len());
        actions[idx]
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TerminalState;

    #[test]
    fn test_random_agent_selects_legal_action() {
        let mut agent = RandomAgent::seeded(11);
        let mut session = GameSession::new();
        for col in [1, 1, 1, 1] {
            session.apply(session.action_for_column(col).unwrap());
        }
        let legal = session.legal_moves();

        for _ in 0..100 {
            let action = agent.select_action(&session, false);
            assert!(legal.contains(&action), "Action {:?} is not legal", action);
        }
    }

    #[test]
    fn test_random_agents_play_full_game() {
        let mut agent1 = RandomAgent::seeded(1);
        let mut agent2 = RandomAgent::seeded(2);
        let mut session = GameSession::new();

        let mut turn = 0;
        while session.terminal_state() == TerminalState::Ongoing {
            let action = if turn % 2 == 0 {
                agent1.select_action(&session, false)
            } else {
                agent2.select_action(&session, false)
            };
            assert!(session.column_has_space(action.col));
            session.apply(action);
            turn += 1;
        }

        assert!(session.terminal_state().is_terminal());
        assert!(turn <= crate::game::CELLS);
    }

    #[test]
    fn test_random_agent_name() {
        let agent = RandomAgent::new();
        assert_eq!(agent.name(), "Random");
    }
}
