//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! the training loop to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    battle::BattleOutcome,
    ports::{DecisionEvent, EpisodeReport, Observer},
};

/// Progress bar observer - Shows training progress
#[derive(Default)]
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    wins: usize,
    ties: usize,
    losses: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self::default()
    }

    fn message(&self) -> String {
        format!("{} T:{} L:{}", self.wins, self.ties, self.losses)
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} battles (W:{msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, report: &EpisodeReport) -> Result<()> {
        match report.outcome {
            BattleOutcome::Won => self.wins += 1,
            BattleOutcome::Lost => self.losses += 1,
            BattleOutcome::Tie | BattleOutcome::Ongoing => self.ties += 1,
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(report.episode as u64 + 1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks outcome and length statistics
#[derive(Debug, Default)]
pub struct MetricsObserver {
    wins: usize,
    ties: usize,
    losses: usize,
    total_episodes: usize,
    decision_counts: Vec<usize>,
    terminal_rewards: Vec<f64>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn rate(&self, count: usize) -> f64 {
        if self.total_episodes == 0 {
            0.0
        } else {
            count as f64 / self.total_episodes as f64
        }
    }

    pub fn win_rate(&self) -> f64 {
        self.rate(self.wins)
    }

    pub fn tie_rate(&self) -> f64 {
        self.rate(self.ties)
    }

    pub fn loss_rate(&self) -> f64 {
        self.rate(self.losses)
    }

    /// Mean number of agent decisions per episode.
    pub fn avg_episode_length(&self) -> f64 {
        mean(self.decision_counts.iter().map(|&n| n as f64))
    }

    /// Mean reward of the terminal transition, over learning episodes.
    pub fn avg_terminal_reward(&self) -> f64 {
        mean(self.terminal_rewards.iter().copied())
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_episodes: self.total_episodes,
            wins: self.wins,
            ties: self.ties,
            losses: self.losses,
            win_rate: self.win_rate(),
            tie_rate: self.tie_rate(),
            loss_rate: self.loss_rate(),
            avg_episode_length: self.avg_episode_length(),
            avg_terminal_reward: self.avg_terminal_reward(),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Snapshot of [`MetricsObserver`] statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_episodes: usize,
    pub wins: usize,
    pub ties: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub tie_rate: f64,
    pub loss_rate: f64,
    pub avg_episode_length: f64,
    pub avg_terminal_reward: f64,
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, report: &EpisodeReport) -> Result<()> {
        self.total_episodes += 1;
        match report.outcome {
            BattleOutcome::Won => self.wins += 1,
            BattleOutcome::Lost => self.losses += 1,
            BattleOutcome::Tie | BattleOutcome::Ongoing => self.ties += 1,
        }
        self.decision_counts.push(report.turns);
        if let Some(update) = &report.terminal_update {
            self.terminal_rewards.push(update.reward);
        }
        Ok(())
    }
}

/// One line of [`JsonlObserver`] output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub opponent: String,
    pub outcome: BattleOutcome,
    /// Actions chosen, in order
    pub actions: Vec<usize>,
    pub terminal_reward: Option<f64>,
    pub states_known: usize,
}

/// JSONL observer - Writes one record per episode for offline analysis
pub struct JsonlObserver {
    writer: BufWriter<File>,
    actions: Vec<usize>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| crate::Error::Io {
            operation: format!("create episode log {}", path.display()),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
            actions: Vec::new(),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        self.actions.clear();
        Ok(())
    }

    fn on_decision(&mut self, event: &DecisionEvent<'_>) -> Result<()> {
        self.actions.push(event.action);
        Ok(())
    }

    fn on_episode_end(&mut self, report: &EpisodeReport) -> Result<()> {
        let record = EpisodeRecord {
            episode: report.episode,
            opponent: report.opponent.clone(),
            outcome: report.outcome,
            actions: std::mem::take(&mut self.actions),
            terminal_reward: report.terminal_update.as_ref().map(|u| u.reward),
            states_known: report.states_known,
        };

        serde_json::to_writer(&mut self.writer, &record)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Milestone observer - Logs learning progress at a fixed interval
///
/// Tracks the first win and last loss, and every `interval` episodes logs
/// the win rate over that window together with the table size.
pub struct MilestoneObserver {
    opponent_name: String,
    interval: usize,
    first_win: Option<usize>,
    last_loss: Option<usize>,
    window_wins: usize,
    window_len: usize,
}

impl MilestoneObserver {
    pub fn new(opponent_name: impl Into<String>, interval: usize) -> Self {
        Self {
            opponent_name: opponent_name.into(),
            interval: interval.max(1),
            first_win: None,
            last_loss: None,
            window_wins: 0,
            window_len: 0,
        }
    }

    pub fn first_win(&self) -> Option<usize> {
        self.first_win
    }

    pub fn last_loss(&self) -> Option<usize> {
        self.last_loss
    }

    pub fn opponent_name(&self) -> &str {
        &self.opponent_name
    }
}

impl Observer for MilestoneObserver {
    fn on_episode_end(&mut self, report: &EpisodeReport) -> Result<()> {
        match report.outcome {
            BattleOutcome::Won => {
                if self.first_win.is_none() {
                    log::info!(
                        "first win against {} in episode {}",
                        self.opponent_name,
                        report.episode + 1
                    );
                    self.first_win = Some(report.episode);
                }
                self.window_wins += 1;
            }
            BattleOutcome::Lost => self.last_loss = Some(report.episode),
            BattleOutcome::Tie | BattleOutcome::Ongoing => {}
        }

        self.window_len += 1;
        if self.window_len == self.interval {
            log::info!(
                "episodes {}-{} vs {}: win rate {:.1}%, {} states known",
                report.episode + 2 - self.window_len,
                report.episode + 1,
                self.opponent_name,
                100.0 * self.window_wins as f64 / self.window_len as f64,
                report.states_known
            );
            self.window_wins = 0;
            self.window_len = 0;
        }
        Ok(())
    }
}
