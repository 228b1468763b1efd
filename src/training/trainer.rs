use std::time::Instant;

use log::{debug, info};
use rand::Rng;

use crate::ai::{RandomAgent, TabularAgent};
use crate::checkpoint::{CheckpointManager, CheckpointMetrics, TableFormat};
use crate::error::TrainingError;
use crate::game::Player;
use crate::training::episode::{evaluate, play_self_play_episode};
use crate::training::metrics::{Throughput, TrainingMetrics};

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    /// Export the full-form table every this many episodes; 0 leaves only
    /// the final export.
    pub checkpoint_interval: usize,
    /// Games against a random opponent at each checkpoint; 0 disables.
    pub eval_games: usize,
    /// Rolling window for the self-play metrics.
    pub metrics_window: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 100_000,
            checkpoint_interval: 10_000,
            eval_games: 100,
            metrics_window: 1000,
        }
    }
}

/// Outcome of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub episodes_run: usize,
    pub last_episode: usize,
    pub table_entries: usize,
    pub metrics: CheckpointMetrics,
}

/// Self-play trainer for the tabular agent.
pub struct Trainer {
    config: TrainerConfig,
    checkpoint_manager: CheckpointManager,
}

impl Trainer {
    pub fn new(config: TrainerConfig, checkpoint_manager: CheckpointManager) -> Self {
        Trainer {
            config,
            checkpoint_manager,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run `num_episodes` self-play episodes numbered after `completed_episodes`.
    ///
    /// The full-form table is exported every `checkpoint_interval` episodes and
    /// both forms are exported once the last episode finishes. A failed export
    /// aborts the run.
    pub fn train<R: Rng>(
        &self,
        agent: &mut TabularAgent<R>,
        completed_episodes: usize,
    ) -> Result<TrainingSummary, TrainingError> {
        let mut metrics = TrainingMetrics::with_capacity(self.config.metrics_window);
        let mut throughput = Throughput::new();

        let start_episode = completed_episodes + 1;
        let end_episode = completed_episodes + self.config.num_episodes;

        info!(
            "Starting self-play training for {} episodes (episodes {}..={}), {} table entries",
            self.config.num_episodes,
            start_episode,
            end_episode,
            agent.table().len()
        );

        for episode in start_episode..=end_episode {
            let trace = play_self_play_episode(agent);
            metrics.record_episode(trace.result);
            if trace.updates > 0 {
                metrics.record_td_error(trace.mean_abs_td_error);
            }
            throughput.record_episode();

            if self.is_interval_checkpoint(episode) && episode != end_episode {
                let started = Instant::now();
                let snapshot = self.checkpoint_metrics(agent, &metrics);
                throughput.record_overhead(started.elapsed());
                self.log_progress(episode, end_episode, agent, &snapshot, &throughput);
                self.checkpoint_manager.save_checkpoint(
                    agent.table(),
                    agent.config(),
                    &snapshot,
                    episode,
                    &[TableFormat::Full],
                )?;
                throughput.reset_window();
            }
        }

        let started = Instant::now();
        let snapshot = self.checkpoint_metrics(agent, &metrics);
        throughput.record_overhead(started.elapsed());
        self.log_progress(end_episode, end_episode, agent, &snapshot, &throughput);
        self.checkpoint_manager.save_checkpoint(
            agent.table(),
            agent.config(),
            &snapshot,
            end_episode,
            &[TableFormat::Full, TableFormat::Compressed],
        )?;

        info!(
            "Training complete. Total episodes: {}",
            metrics.total_episodes()
        );

        Ok(TrainingSummary {
            episodes_run: metrics.total_episodes(),
            last_episode: end_episode,
            table_entries: agent.table().len(),
            metrics: snapshot,
        })
    }

    /// Evaluate the agent in inference mode against a random opponent over
    /// `eval_games`, alternating first player. The opponent is seeded from the
    /// agent's generator so seeded runs stay reproducible.
    pub fn evaluate<R: Rng>(&self, agent: &mut TabularAgent<R>) -> f32 {
        let mut random = RandomAgent::seeded(agent.rng_mut().random());
        let win_rate = evaluate(agent, &mut random, self.config.eval_games);
        debug!(
            "Eval vs Random ({} games): {:.1}% win rate",
            self.config.eval_games,
            win_rate * 100.0
        );
        win_rate
    }

    fn is_interval_checkpoint(&self, episode: usize) -> bool {
        episode.checked_rem(self.config.checkpoint_interval) == Some(0)
    }

    fn checkpoint_metrics<R: Rng>(
        &self,
        agent: &mut TabularAgent<R>,
        metrics: &TrainingMetrics,
    ) -> CheckpointMetrics {
        let eval_win_rate = (self.config.eval_games > 0).then(|| self.evaluate(agent));
        metrics.snapshot(eval_win_rate)
    }

    fn log_progress<R: Rng>(
        &self,
        episode: usize,
        end_episode: usize,
        agent: &TabularAgent<R>,
        snapshot: &CheckpointMetrics,
        throughput: &Throughput,
    ) {
        info!(
            "Episode {}/{} | entries: {} | |td|: {:.4} | {} win_rate({}): {:.1}% | draw: {:.1}% | avg_len: {:.1} | {:.0} ep/s",
            episode,
            end_episode,
            agent.table().len(),
            snapshot.mean_abs_td_error,
            Player::Red.name(),
            self.config.metrics_window,
            snapshot.red_win_rate * 100.0,
            snapshot.draw_rate * 100.0,
            snapshot.average_game_length,
            throughput.episodes_per_sec(),
        );
        if let Some(eval_wr) = snapshot.eval_win_rate {
            info!(
                "  >> Eval vs Random ({} games): {:.1}% win rate",
                self.config.eval_games,
                eval_wr * 100.0
            );
        }
    }
}
