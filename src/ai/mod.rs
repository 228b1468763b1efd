//! Agents and learning: the agent trait, the value table, action-selection
//! policies, the tabular TD learner and a uniform random baseline.

mod agent;
pub mod policy;
mod random;
mod tabular;
pub mod value_table;

pub use agent::{Agent, Experience, UpdateMetrics};
pub use random::RandomAgent;
pub use tabular::{TabularAgent, TdConfig};
pub use value_table::{ValueKey, ValueTable, DEFAULT_VALUE};
