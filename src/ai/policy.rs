//! Action selection over the value table.
//!
//! Training mode samples a reward band by prior weight and then an action
//! uniformly inside it. Inference mode is greedy, optionally relaxed to admit
//! near-ties while the board is still mostly empty.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::value_table::ValueTable;
use crate::game::{Action, GameSession};

/// Band boundaries, best first. A value falls in the first band whose
/// threshold it strictly exceeds, or in the last band otherwise.
pub const BUCKET_THRESHOLDS: [f64; 7] = [2.25, 1.5, 0.75, 0.0, -0.75, -1.5, -2.25];

/// Prior weight of each band, best first.
pub const BUCKET_WEIGHTS: [f64; 8] = [0.35, 0.25, 0.15, 0.08, 0.06, 0.05, 0.04, 0.02];

pub const NUM_BUCKETS: usize = BUCKET_WEIGHTS.len();

/// Greatest distance from the running best that still counts as a near-tie.
pub const NEAR_TIE_TOLERANCE: f64 = 0.2;

// Leniency is zero at 30% empty and reaches one on an empty board.
const LENIENCY_FLOOR: f64 = 30.0;
const LENIENCY_SPAN: f64 = 70.0;

/// Band index for a stored value (0 is the best band).
pub fn bucket_index(value: f64) -> usize {
    BUCKET_THRESHOLDS
        .iter()
        .position(|&threshold| value > threshold)
        .unwrap_or(NUM_BUCKETS - 1)
}

/// Legal actions grouped by reward band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardBuckets {
    buckets: [Vec<Action>; NUM_BUCKETS],
}

impl RewardBuckets {
    pub fn categorize<F>(actions: &[Action], mut value_of: F) -> Self
    where
        F: FnMut(Action) -> f64,
    {
        let mut buckets: [Vec<Action>; NUM_BUCKETS] = Default::default();
        for &action in actions {
            buckets[bucket_index(value_of(action))].push(action);
        }
        RewardBuckets { buckets }
    }

    pub fn bucket(&self, index: usize) -> &[Action] {
        &self.buckets[index]
    }

    /// Non-empty bands paired with their prior weights rescaled to sum to one.
    pub fn normalized(&self) -> Vec<(f64, &[Action])> {
        let occupied = || {
            self.buckets
                .iter()
                .zip(BUCKET_WEIGHTS)
                .filter(|(actions, _)| !actions.is_empty())
        };
        let total: f64 = occupied().map(|(_, weight)| weight).sum();
        occupied()
            .map(|(actions, weight)| (weight / total, actions.as_slice()))
            .collect()
    }

    /// Pick a band by normalized weight, then an action uniformly within it.
    ///
    /// # Panics
    ///
    /// Panics if every band is empty, i.e. there was no legal action.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Action {
        let bands = self.normalized();
        let weights: Vec<f64> = bands.iter().map(|(weight, _)| *weight).collect();
        let dist: WeightedIndex<f64> =
            WeightedIndex::new(&weights).expect("sampling requires at least one legal action");
        let (_, actions) = bands[dist.sample(rng)];
        *actions
            .choose(rng)
            .expect("normalized bands are never empty")
    }
}

/// Probability of running the lenient pass in inference mode. Negative once
/// more than 70% of the board is filled, one on an empty board.
pub fn leniency_chance(session: &GameSession) -> f64 {
    (session.remaining_percentage() - LENIENCY_FLOOR) / LENIENCY_SPAN
}

/// Single left-to-right pass over `actions`.
///
/// A strict improvement over the running best replaces every contender
/// gathered so far. Otherwise, when `lenient`, an action within
/// [`NEAR_TIE_TOLERANCE`] of the running best joins the contenders. Near-ties
/// collected before a later improvement do not survive it.
pub fn contenders<F>(actions: &[Action], mut value_of: F, lenient: bool) -> Vec<Action>
where
    F: FnMut(Action) -> f64,
{
    let Some((&first, rest)) = actions.split_first() else {
        return Vec::new();
    };
    let mut best = value_of(first);
    let mut chosen = vec![first];

    for &action in rest {
        let value = value_of(action);
        if value > best {
            best = value;
            chosen.clear();
            chosen.push(action);
        } else if lenient && (value - best).abs() <= NEAR_TIE_TOLERANCE && chosen[0] != action {
            chosen.push(action);
        }
    }
    chosen
}

/// Training-mode choice for the player to move.
pub fn sample_by_bucket<R: Rng>(
    rng: &mut R,
    table: &ValueTable,
    session: &GameSession,
    actions: &[Action],
) -> Action {
    let player = session.current_player();
    let state = session.state_key();
    RewardBuckets::categorize(actions, |action| table.value(player, &state, action)).sample(rng)
}

/// Inference-mode choice for the player to move: one uniform draw decides
/// between the strict and the lenient pass, then the final pick is uniform
/// over the surviving contenders.
pub fn select_near_greedy<R: Rng>(
    rng: &mut R,
    table: &ValueTable,
    session: &GameSession,
    actions: &[Action],
) -> Action {
    let player = session.current_player();
    let state = session.state_key();
    let lenient = rng.random::<f64>() < leniency_chance(session);

    let pool = contenders(
        actions,
        |action| {
            let value = table.value(player, &state, action);
            log::trace!("action {:?} value {:.4}", action, value);
            value
        },
        lenient,
    );
    let chosen = *pool
        .choose(rng)
        .expect("selection requires at least one legal action");
    log::trace!(
        "chose {:?} from {} contender(s) (lenient: {})",
        chosen,
        pool.len(),
        lenient
    );
    chosen
}
