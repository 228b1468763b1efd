use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::checkpoint::CheckpointMetrics;
use crate::game::Player;

/// Result of a single episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeResult {
    pub winner: Option<Player>,
    pub game_length: usize,
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    td_errors: VecDeque<f64>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            td_errors: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    /// Record the mean absolute TD error of one episode's updates.
    pub fn record_td_error(&mut self, abs_error: f64) {
        self.td_errors.push_back(abs_error);
        if self.td_errors.len() > self.capacity {
            self.td_errors.pop_front();
        }
    }

    fn recent(&self, last_n: usize) -> impl Iterator<Item = &EpisodeResult> {
        self.episode_results.iter().rev().take(last_n)
    }

    /// Win rate for `player` in the last N episodes.
    pub fn win_rate(&self, player: Player, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let wins = self.recent(n).filter(|r| r.winner == Some(player)).count();
        wins as f32 / n as f32
    }

    /// Draw rate in the last N episodes.
    pub fn draw_rate(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let draws = self.recent(n).filter(|r| r.winner.is_none()).count();
        draws as f32 / n as f32
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.recent(n).map(|r| r.game_length).sum();
        total as f32 / n as f32
    }

    /// Mean absolute TD error over the last N recorded episodes.
    pub fn average_td_error(&self, last_n: usize) -> f32 {
        let n = self.td_errors.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self.td_errors.iter().rev().take(n).sum();
        (sum / n as f64) as f32
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// Snapshot over the whole window for checkpoint metadata.
    pub fn snapshot(&self, eval_win_rate: Option<f32>) -> CheckpointMetrics {
        let n = self.capacity;
        CheckpointMetrics {
            red_win_rate: self.win_rate(Player::Red, n),
            draw_rate: self.draw_rate(n),
            average_game_length: self.average_game_length(n),
            mean_abs_td_error: self.average_td_error(n),
            eval_win_rate,
        }
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Episode throughput between progress reports.
pub struct Throughput {
    window_start: Instant,
    window_count: usize,
    window_overhead: Duration, // eval/checkpoint time excluded from throughput
}

impl Throughput {
    pub fn new() -> Self {
        Throughput {
            window_start: Instant::now(),
            window_count: 0,
            window_overhead: Duration::ZERO,
        }
    }

    pub fn record_episode(&mut self) {
        self.window_count += 1;
    }

    pub fn record_overhead(&mut self, d: Duration) {
        self.window_overhead += d;
    }

    /// Episodes per second since the last `reset_window` call, excluding
    /// recorded overhead.
    pub fn episodes_per_sec(&self) -> f32 {
        let net = self.window_start.elapsed().saturating_sub(self.window_overhead);
        if net.is_zero() {
            return 0.0;
        }
        self.window_count as f32 / net.as_secs_f32()
    }

    pub fn reset_window(&mut self) {
        *self = Throughput::new();
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new()
    }
}
