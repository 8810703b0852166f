//! Training pipeline for tabular agents

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    battle::{BattleOutcome, BattleSnapshot},
    controller::TabularAgent,
    ports::{BattleEnvironment, DecisionEvent, EpisodeReport, Observer},
    tabular::AgentMode,
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of episodes (battles) to play
    pub episodes: usize,

    /// Random seed for the agent; the environment gets `seed + 1`
    pub seed: Option<u64>,

    /// Decisions after which a battle is considered stuck
    pub max_decisions: usize,
    /// Field the environment's opponents in turn, one per episode
    pub rotate_opponents: bool,
    /// Evaluate the frozen policy every N learning episodes (0 disables)
    pub checkpoint_interval: usize,
    /// Episodes per checkpoint evaluation
    pub checkpoint_episodes: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            seed: None,
            max_decisions: 1_000,
            rotate_opponents: false,
            checkpoint_interval: 0,
            checkpoint_episodes: 50,
        }
    }
}

/// Frozen-policy evaluation taken during a learning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Episodes of the run played before the evaluation
    pub episodes: usize,
    pub win_rate: f64,
    /// Rows in the table at the time
    pub states: usize,
}

/// Result of a training or evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Total episodes played
    pub total_episodes: usize,

    pub wins: usize,
    pub ties: usize,
    pub losses: usize,

    pub win_rate: f64,
    pub tie_rate: f64,
    pub loss_rate: f64,

    /// Decisions taken across all episodes
    pub decisions: usize,

    /// States added to the table during the run
    pub states_discovered: usize,
    /// Evaluations at every checkpoint, including before the first and
    /// after the last episode
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

impl TrainingResult {
    /// Create a new training result
    pub fn new(total_episodes: usize, wins: usize, ties: usize, losses: usize) -> Self {
        let rate = |count: usize| {
            if total_episodes > 0 {
                count as f64 / total_episodes as f64
            } else {
                0.0
            }
        };

        Self {
            total_episodes,
            wins,
            ties,
            losses,
            win_rate: rate(wins),
            tie_rate: rate(ties),
            loss_rate: rate(losses),
            decisions: 0,
            states_discovered: 0,
            checkpoints: Vec::new(),
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Plays episodes between an agent and an environment, notifying observers.
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run `config.episodes` episodes in the agent's current mode.
    ///
    /// A learning run with a checkpoint interval also evaluates the frozen
    /// policy before its first episode, every interval and after its last
    /// episode. If an episode fails, the agent's pending transition is
    /// dropped before the error is returned.
    pub fn run<E: BattleEnvironment>(
        &mut self,
        agent: &mut TabularAgent<E::Snapshot>,
        env: &mut E,
    ) -> Result<TrainingResult> {
        if let Some(seed) = self.config.seed {
            agent.reseed(seed);
            env.reseed(seed.wrapping_add(1));
        }
        let states_before = agent.table().len();
        let (mut wins, mut ties, mut losses, mut decisions) = (0, 0, 0, 0);
        let interval = self.config.checkpoint_interval;
        let checkpointing = interval > 0 && agent.mode().is_learning();
        let mut checkpoints = Vec::new();

        log::info!(
            "playing {} episodes against {} ({})",
            self.config.episodes,
            env.name(),
            agent.mode()
        );
        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        for episode in 0..self.config.episodes {
            if checkpointing && episode % interval == 0 {
                checkpoints.push(self.checkpoint(episode, agent, env)?);
            }
            if self.config.rotate_opponents {
                env.select_opponent(episode);
            }

            let report = play_episode(
                &mut self.observers,
                self.config.max_decisions,
                episode,
                agent,
                env,
            )?;
            match report.outcome {
                BattleOutcome::Won => wins += 1,
                BattleOutcome::Lost => losses += 1,
                BattleOutcome::Tie | BattleOutcome::Ongoing => ties += 1,
            }
            decisions += report.turns;

            for observer in &mut self.observers {
                observer.on_episode_end(&report)?;
            }
        }
        if checkpointing {
            checkpoints.push(self.checkpoint(self.config.episodes, agent, env)?);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let mut result = TrainingResult::new(self.config.episodes, wins, ties, losses);
        result.decisions = decisions;
        result.states_discovered = agent.table().len().saturating_sub(states_before);
        result.checkpoints = checkpoints;
        log::info!(
            "finished: {} wins, {} ties, {} losses, {} new states",
            result.wins,
            result.ties,
            result.losses,
            result.states_discovered
        );
        Ok(result)
    }

    /// Run the same loop with the policy frozen, restoring the mode after.
    pub fn evaluate<E: BattleEnvironment>(
        &mut self,
        agent: &mut TabularAgent<E::Snapshot>,
        env: &mut E,
    ) -> Result<TrainingResult> {
        let mode = agent.mode();
        agent.set_mode(AgentMode::PlayingFixed);
        let result = self.run(agent, env);
        agent.set_mode(mode);
        result
    }

    /// Silent frozen evaluation between learning episodes.
    fn checkpoint<E: BattleEnvironment>(
        &self,
        episodes: usize,
        agent: &mut TabularAgent<E::Snapshot>,
        env: &mut E,
    ) -> Result<Checkpoint> {
        let mode = agent.mode();
        agent.set_mode(AgentMode::PlayingFixed);
        let wins = self.count_frozen_wins(agent, env);
        agent.set_mode(mode);
        let wins = wins?;

        let played = self.config.checkpoint_episodes;
        let checkpoint = Checkpoint {
            episodes,
            win_rate: if played > 0 {
                wins as f64 / played as f64
            } else {
                0.0
            },
            states: agent.table().len(),
        };
        log::info!(
            "checkpoint after {} episodes: win rate {:.1}%, {} states",
            checkpoint.episodes,
            100.0 * checkpoint.win_rate,
            checkpoint.states
        );
        Ok(checkpoint)
    }

    fn count_frozen_wins<E: BattleEnvironment>(
        &self,
        agent: &mut TabularAgent<E::Snapshot>,
        env: &mut E,
    ) -> Result<usize> {
        let mut wins = 0;
        for episode in 0..self.config.checkpoint_episodes {
            if self.config.rotate_opponents {
                env.select_opponent(episode);
            }
            let report = play_episode(&mut [], self.config.max_decisions, episode, agent, env)?;
            if report.outcome == BattleOutcome::Won {
                wins += 1;
            }
        }
        Ok(wins)
    }
}

/// Play one battle to its end, abandoning the agent's pending transition if
/// the battle cannot be finished.
fn play_episode<E: BattleEnvironment>(
    observers: &mut [Box<dyn Observer>],
    max_decisions: usize,
    episode: usize,
    agent: &mut TabularAgent<E::Snapshot>,
    env: &mut E,
) -> Result<EpisodeReport> {
    let report = play_to_end(observers, max_decisions, episode, agent, env);
    if report.is_err() {
        agent.abandon_episode();
    }
    report
}

fn play_to_end<E: BattleEnvironment>(
    observers: &mut [Box<dyn Observer>],
    max_decisions: usize,
    episode: usize,
    agent: &mut TabularAgent<E::Snapshot>,
    env: &mut E,
) -> Result<EpisodeReport> {
    for observer in observers.iter_mut() {
        observer.on_episode_start(episode)?;
    }

    let opponent = env.name().to_string();
    let mut snapshot = env.start()?;
    let mut turns = 0;
    while !snapshot.is_finished() {
        if turns >= max_decisions {
            return Err(Error::TurnLimitExceeded {
                limit: max_decisions,
            });
        }
        let legal = env.legal_actions(&snapshot);
        let action = agent.choose_action(&snapshot, &legal)?;

        let event = DecisionEvent {
            episode,
            turn: turns,
            action,
            legal: &legal,
        };
        for observer in observers.iter_mut() {
            observer.on_decision(&event)?;
        }

        snapshot = env.step(action)?;
        turns += 1;
    }

    let terminal_update = agent.on_episode_finished(&snapshot)?;
    Ok(EpisodeReport {
        episode,
        opponent,
        outcome: snapshot.summary().outcome,
        turns,
        terminal_update,
        states_known: agent.table().len(),
    })
}
