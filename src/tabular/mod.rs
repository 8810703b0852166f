//! Tabular temporal-difference learning
//!
//! The learned artifact is an [`ActionTable`]: a lazily grown map from
//! [`StateKey`](crate::types::StateKey) to a row of action values and visit
//! counters. Around it sit the pieces that read and write it:
//!
//! - [`ExplorationSchedule`] turns visit counts into ε and α
//! - [`PolicySelector`] picks an action ε-greedily among the legal ones
//! - [`TdLearner`] applies a Q-learning or SARSA update to one cell
//! - [`SavedModel`] wraps a table for persistence
//!
//! ## Usage Example
//!
//! ```no_run
//! use battlebot::tabular::{
//!     ActionTable, AgentMode, ExplorationSchedule, PolicySelector, TdLearner, VisitBasis,
//! };
//! use battlebot::types::StateKey;
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut table = ActionTable::new(4)?;
//! let schedule = ExplorationSchedule::default();
//! let learner = TdLearner::new(0.2, VisitBasis::Action, schedule);
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let state = StateKey::from_ints(&[1, 0]);
//! let row = table.get_or_create(&state);
//! let epsilon = schedule.epsilon(row.visits(), AgentMode::Training);
//! let action = PolicySelector::default().select(row, &[0, 1, 3], epsilon, &mut rng)?;
//!
//! learner.update_q(&mut table, &state, action, 1.0, None, AgentMode::Training)?;
//! # Ok::<(), battlebot::Error>(())
//! ```

pub mod action_table;
pub mod learner;
pub mod schedule;
pub mod selector;
pub mod serialization;

pub use action_table::{ActionRow, ActionTable};
pub use learner::{TdAlgorithm, TdLearner, TdUpdate, VisitBasis};
pub use schedule::{AgentMode, ExplorationSchedule};
pub use selector::{PolicySelector, TieBreak, greedy_actions};
pub use serialization::{SavedModel, TrainingMetadata};
