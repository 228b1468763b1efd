use crate::ai::{Agent, Experience};
use crate::game::{Action, GameSession, Player, StateKey, TerminalState};
use crate::training::metrics::EpisodeResult;

/// Reward for the move that completes a line.
pub const WIN_REWARD: f64 = 3.0;
/// Reward for the loser's last move when the opponent completes a line.
pub const LOSS_REWARD: f64 = -3.0;
/// Reward for each player's last move when the board fills without a line.
pub const DRAW_REWARD: f64 = -1.0;
/// Reward for a move once the game has moved on without ending.
pub const STEP_REWARD: f64 = 0.0;

/// Result of playing a single self-play episode.
#[derive(Debug, Clone)]
pub struct EpisodeTrace {
    pub result: EpisodeResult,
    /// Number of table updates applied during the episode.
    pub updates: usize,
    /// Mean absolute TD error over those updates.
    pub mean_abs_td_error: f64,
}

#[derive(Default)]
struct UpdateStats {
    count: usize,
    abs_error_sum: f64,
}

/// Play one self-play episode. The agent plays both sides and learns after
/// every half-move:
///
/// - game continues: the waiting player's previous move gets [`STEP_REWARD`]
/// - win: the mover gets [`WIN_REWARD`], the other player's previous move
///   gets [`LOSS_REWARD`]
/// - draw: both players' previous moves get [`DRAW_REWARD`]
///
/// A player with no recorded move yet is not updated.
pub fn play_self_play_episode<A: Agent + ?Sized>(agent: &mut A) -> EpisodeTrace {
    let mut session = GameSession::new();
    let mut previous: [Option<(StateKey, Action)>; 2] = [None; 2];
    let mut stats = UpdateStats::default();
    let mut game_length = 0;

    let winner = loop {
        let mover = session.current_player();
        let state = session.state_key();
        let action = agent.select_action(&session, true);
        debug_assert!(
            session.column_has_space(action.col),
            "agent selected full column {}",
            action.col
        );
        previous[mover.index()] = Some((state, action));
        session.apply(action);
        game_length += 1;

        let waiting = mover.other();
        match session.terminal_state() {
            TerminalState::Ongoing => {
                learn(agent, waiting, previous[waiting.index()], STEP_REWARD, &session, &mut stats);
            }
            TerminalState::Won(winner) => {
                learn(agent, mover, previous[mover.index()], WIN_REWARD, &session, &mut stats);
                learn(agent, waiting, previous[waiting.index()], LOSS_REWARD, &session, &mut stats);
                break Some(winner);
            }
            TerminalState::Draw => {
                learn(agent, waiting, previous[waiting.index()], DRAW_REWARD, &session, &mut stats);
                learn(agent, mover, previous[mover.index()], DRAW_REWARD, &session, &mut stats);
                break None;
            }
        }
    };

    let mean_abs_td_error = if stats.count == 0 {
        0.0
    } else {
        stats.abs_error_sum / stats.count as f64
    };

    EpisodeTrace {
        result: EpisodeResult {
            winner,
            game_length,
        },
        updates: stats.count,
        mean_abs_td_error,
    }
}

fn learn<A: Agent + ?Sized>(
    agent: &mut A,
    player: Player,
    pair: Option<(StateKey, Action)>,
    reward: f64,
    next_state: &GameSession,
    stats: &mut UpdateStats,
) {
    let Some((state, action)) = pair else {
        return;
    };
    let metrics = agent.update(&Experience {
        player,
        state,
        action,
        reward,
        next_state: *next_state,
    });
    stats.count += 1;
    stats.abs_error_sum += metrics.td_error.abs();
}

/// Play a single evaluation game between two agents.
/// Returns Some(true) if agent won, Some(false) if agent lost, None if draw.
pub fn play_eval_game<A, O>(agent: &mut A, opponent: &mut O, agent_is_red: bool) -> Option<bool>
where
    A: Agent + ?Sized,
    O: Agent + ?Sized,
{
    let mut session = GameSession::new();

    while !session.terminal_state().is_terminal() {
        let is_agent_turn = (session.current_player() == Player::Red) == agent_is_red;
        let action = if is_agent_turn {
            agent.select_action(&session, false)
        } else {
            opponent.select_action(&session, false)
        };
        session.apply(action);
    }

    session
        .winner()
        .map(|winner| (winner == Player::Red) == agent_is_red)
}

/// Evaluate `agent` against `opponent` over N games, alternating sides.
pub fn evaluate<A, O>(agent: &mut A, opponent: &mut O, eval_games: usize) -> f32
where
    A: Agent + ?Sized,
    O: Agent + ?Sized,
{
    if eval_games == 0 {
        return 0.0;
    }
    let mut wins = 0;
    for game_idx in 0..eval_games {
        let agent_is_red = game_idx % 2 == 0;
        if let Some(true) = play_eval_game(agent, opponent, agent_is_red) {
            wins += 1;
        }
    }
    wins as f32 / eval_games as f32
}
