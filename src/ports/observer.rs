//! Observer port - abstraction for training observation and data collection
//!
//! This port defines the interface for observing training events,
//! allowing composable data collection without coupling the training
//! loop to specific output formats or metrics.

use crate::{Result, battle::BattleOutcome, tabular::TdUpdate};

/// One decision taken by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionEvent<'a> {
    pub episode: usize,
    /// Decision index within the episode, from 0
    pub turn: usize,
    pub action: usize,
    pub legal: &'a [usize],
}

/// What happened in a finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub episode: usize,
    /// Environment name at the start of the episode
    pub opponent: String,
    pub outcome: BattleOutcome,
    /// Decisions taken by the agent
    pub turns: usize,
    /// Update applied on the terminal snapshot, if the agent was learning
    pub terminal_update: Option<TdUpdate>,
    /// Rows in the table after the episode
    pub states_known: usize,
}

/// Observer trait for monitoring training
///
/// Observers can be composed to collect different types of data during
/// training, e.g. progress bars, outcome metrics or milestone logs.
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - Once at the beginning
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_decision(...)` - For each decision the agent takes
///    - `on_episode_end(report)`
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use battlebot::ports::{EpisodeReport, Observer};
///
/// struct CountingObserver {
///     episodes: usize,
/// }
///
/// impl Observer for CountingObserver {
///     fn on_episode_end(&mut self, _report: &EpisodeReport) -> battlebot::Result<()> {
///         self.episodes += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    fn on_decision(&mut self, _event: &DecisionEvent<'_>) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _report: &EpisodeReport) -> Result<()> {
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
