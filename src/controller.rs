//! Decision-point driver for a tabular agent
//!
//! [`TabularAgent`] is called once per decision with the current snapshot
//! and the legal action indices, and once more when the battle ends. It
//! owns the learned table and at most one pending transition:
//!
//! ```text
//!   Idle ──choose_action (learning)──▶ ActionChosen
//!    ▲                                    │
//!    │◀──── choose_action consumes ───────┤ (then records the new choice)
//!    └────── on_episode_finished ─────────┘
//! ```
//!
//! A pending transition stores the encoded [`StateKey`], the action taken
//! and a [`BattleSummary`] of the snapshot it was taken in, so the reward
//! can be shaped once the next snapshot arrives.
//!
//! The agent is single-threaded: one decision is fully processed before the
//! next call. Sharing one table across concurrent battles requires an
//! external lock around the whole agent.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Error, Result,
    app::AgentConfig,
    battle::{BattleSnapshot, BattleSummary},
    formats::{FormatProfile, StateEncoder},
    reward::RewardShaper,
    tabular::{
        ActionRow, ActionTable, AgentMode, ExplorationSchedule, PolicySelector, SavedModel,
        TdAlgorithm, TdLearner, TdUpdate, TieBreak, TrainingMetadata,
    },
    types::StateKey,
};

/// The (state, action) pair awaiting its reward.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition {
    pub state: StateKey,
    pub action: usize,
    pub summary: BattleSummary,
}

/// Tabular Q-learning / SARSA agent for one battle format.
pub struct TabularAgent<S> {
    format: String,
    mode: AgentMode,
    algorithm: TdAlgorithm,
    encoder: Arc<dyn StateEncoder<S>>,
    table: ActionTable,
    schedule: ExplorationSchedule,
    learner: TdLearner,
    shaper: RewardShaper,
    rng: StdRng,
    seed: u64,
    pending: Option<PendingTransition>,
    key_arity: Option<usize>,
    episodes_finished: u64,
}

impl<S: BattleSnapshot> TabularAgent<S> {
    /// Create an agent with an empty table.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfiguration`] if `config` fails validation
    /// - [`Error::ActionSpaceMismatch`] if `config` pins an action space size
    ///   different from the profile's
    pub fn new(config: &AgentConfig, profile: &FormatProfile<S>) -> Result<Self> {
        let table = ActionTable::new(profile.action_space_size())?;
        Self::with_table(config, profile, table)
    }

    /// Create an agent around an existing (e.g. loaded) table.
    pub fn with_table(
        config: &AgentConfig,
        profile: &FormatProfile<S>,
        table: ActionTable,
    ) -> Result<Self> {
        config.validate()?;
        profile.validate()?;

        let expected = profile.action_space_size();
        if let Some(configured) = config.action_space_size
            && configured != expected
        {
            return Err(Error::ActionSpaceMismatch {
                expected,
                got: configured,
            });
        }
        if table.action_space_size() != expected {
            return Err(Error::ActionSpaceMismatch {
                expected,
                got: table.action_space_size(),
            });
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let key_arity = table.key_arity();
        Ok(Self {
            format: profile.id().to_string(),
            mode: config.mode,
            algorithm: config.algorithm,
            encoder: Arc::clone(profile.encoder()),
            table,
            schedule: config.schedule,
            learner: TdLearner::new(config.discount_factor, config.rate_basis, config.schedule),
            shaper: RewardShaper::new(config.reward),
            rng: StdRng::seed_from_u64(seed),
            seed,
            pending: None,
            key_arity,
            episodes_finished: 0,
        })
    }

    /// Choose an action for the current decision point.
    ///
    /// In a learning mode the pending transition (if any) is first rewarded
    /// and learned from, then the chosen action becomes the new pending
    /// transition. Q-learning updates before selecting; SARSA selects first
    /// so that its bootstrap uses the action actually taken.
    ///
    /// # Errors
    ///
    /// - [`Error::NoLegalActions`] if `legal` is empty
    /// - [`Error::ActionOutOfRange`] if `legal` names an index outside the
    ///   action space
    /// - [`Error::StateKeyArity`] if the encoder changed key length
    pub fn choose_action(&mut self, snapshot: &S, legal: &[usize]) -> Result<usize> {
        self.check_legal(legal)?;
        let state = self.encode(snapshot)?;
        let summary = snapshot.summary();

        if !self.mode.is_learning() {
            self.pending = None;
            return self.select(&state, legal);
        }

        let action = match (self.pending.take(), self.algorithm) {
            (Some(previous), TdAlgorithm::QLearning) => {
                let reward = self.shaper.shape(&previous.summary, &summary);
                self.learner.update_q(
                    &mut self.table,
                    &previous.state,
                    previous.action,
                    reward,
                    Some((&state, legal)),
                    self.mode,
                )?;
                self.select(&state, legal)?
            }
            (Some(previous), TdAlgorithm::Sarsa) => {
                let action = self.select(&state, legal)?;
                let reward = self.shaper.shape(&previous.summary, &summary);
                self.learner.update_sarsa(
                    &mut self.table,
                    &previous.state,
                    previous.action,
                    reward,
                    Some((&state, action)),
                    self.mode,
                )?;
                action
            }
            (None, _) => self.select(&state, legal)?,
        };

        log::debug!("pending transition {state} a={action}");
        self.pending = Some(PendingTransition {
            state,
            action,
            summary,
        });
        Ok(action)
    }

    /// Close the episode on its terminal snapshot.
    ///
    /// The pending transition is always cleared. In a learning mode it
    /// receives a terminal update (no bootstrap) and the applied update is
    /// returned.
    ///
    /// # Errors
    ///
    /// [`Error::EpisodeNotFinished`] if `final_snapshot` is not terminal.
    pub fn on_episode_finished(&mut self, final_snapshot: &S) -> Result<Option<TdUpdate>> {
        let pending = self.pending.take();
        let summary = final_snapshot.summary();
        if !summary.is_finished() {
            return Err(Error::EpisodeNotFinished);
        }
        if self.mode.is_learning() {
            self.episodes_finished += 1;
        }

        let Some(previous) = pending else {
            return Ok(None);
        };
        if !self.mode.is_learning() {
            return Ok(None);
        }

        let reward = self.shaper.shape(&previous.summary, &summary);
        let update = match self.algorithm {
            TdAlgorithm::QLearning => self.learner.update_q(
                &mut self.table,
                &previous.state,
                previous.action,
                reward,
                None,
                self.mode,
            )?,
            TdAlgorithm::Sarsa => self.learner.update_sarsa(
                &mut self.table,
                &previous.state,
                previous.action,
                reward,
                None,
                self.mode,
            )?,
        };
        Ok(Some(update))
    }

    /// Encode a snapshot, enforcing a fixed key arity.
    pub fn encode(&mut self, snapshot: &S) -> Result<StateKey> {
        let state = self.encoder.encode(snapshot);
        match self.key_arity {
            Some(expected) if expected != state.arity() => Err(Error::StateKeyArity {
                expected,
                got: state.arity(),
                state: state.to_string(),
            }),
            Some(_) => Ok(state),
            None => {
                self.key_arity = Some(state.arity());
                Ok(state)
            }
        }
    }

    fn select(&mut self, state: &StateKey, legal: &[usize]) -> Result<usize> {
        let selector = self.selector();
        let action = if self.mode.is_learning() {
            let row = self.table.get_or_create(state);
            let epsilon = self.schedule.epsilon(row.visits(), self.mode);
            selector.select(row, legal, epsilon, &mut self.rng)?
        } else {
            // Frozen play never grows the table.
            let blank;
            let row = match self.table.get(state) {
                Some(row) => row,
                None => {
                    blank = ActionRow::new(self.table.action_space_size());
                    &blank
                }
            };
            selector.select(row, legal, 0.0, &mut self.rng)?
        };
        log::trace!("state {state} -> action {action} ({})", self.mode);
        Ok(action)
    }

    fn selector(&self) -> PolicySelector {
        match self.mode {
            AgentMode::PlayingFixed => PolicySelector::new(TieBreak::LowestIndex),
            AgentMode::Training | AgentMode::PlayingWhileLearning => {
                PolicySelector::new(TieBreak::Uniform)
            }
        }
    }

    fn check_legal(&self, legal: &[usize]) -> Result<()> {
        if legal.is_empty() {
            return Err(Error::NoLegalActions);
        }
        let size = self.table.action_space_size();
        match legal.iter().find(|&&a| a >= size) {
            Some(&action) => Err(Error::ActionOutOfRange {
                action,
                action_space_size: size,
            }),
            None => Ok(()),
        }
    }
}

impl<S> TabularAgent<S> {
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    /// Switch mode. Leaving a learning mode drops the pending transition.
    pub fn set_mode(&mut self, mode: AgentMode) {
        if !mode.is_learning() && self.pending.take().is_some() {
            log::debug!("dropping pending transition on switch to {mode}");
        }
        self.mode = mode;
    }

    pub fn algorithm(&self) -> TdAlgorithm {
        self.algorithm
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    pub fn into_table(self) -> ActionTable {
        self.table
    }

    pub fn pending(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    /// Drop the pending transition of a battle that ended without a
    /// terminal snapshot. Nothing is learned from it.
    pub fn abandon_episode(&mut self) {
        if let Some(pending) = self.pending.take() {
            log::debug!(
                "abandoning pending transition {} a={}",
                pending.state,
                pending.action
            );
        }
    }

    /// The seed the agent's RNG was last seeded with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Episodes finished in a learning mode by this instance.
    pub fn episodes_finished(&self) -> u64 {
        self.episodes_finished
    }

    /// Zero every visit counter, keeping the learned values.
    pub fn reset_visit_counts(&mut self) {
        self.table.reset_visit_counts();
    }

    /// Package the table for persistence.
    ///
    /// `prior_episodes` is added to the episodes finished by this instance.
    pub fn to_saved_model(&self, prior_episodes: u64, opponents: Vec<String>) -> SavedModel {
        SavedModel::new(
            self.algorithm,
            self.format.clone(),
            self.table.clone(),
            TrainingMetadata {
                episodes_trained: prior_episodes + self.episodes_finished,
                opponents,
                seed: Some(self.seed),
                mode: self.mode,
            },
        )
    }
}
