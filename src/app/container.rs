//! Dependency injection container for the battlebot application.
//!
//! The container owns infrastructure dependencies (model persistence, default
//! seeding) and provides factory methods for creating agents.

use std::{path::Path, sync::Arc};

use super::config::AgentConfig;
use crate::{
    Error, Result,
    adapters::MsgPackRepository,
    battle::BattleSnapshot,
    controller::TabularAgent,
    formats::FormatRegistry,
    ports::ModelRepository,
    tabular::{SavedModel, TrainingMetadata},
};

/// Application with dependency injection.
///
/// Centralizes creation and wiring of dependencies following hexagonal architecture.
/// All infrastructure dependencies are owned by the app and injected into
/// domain objects and use cases.
///
/// # Examples
///
/// ## Production usage
///
/// ```
/// use battlebot::app::{App, AgentConfig};
/// use battlebot::arena::arena_registry;
///
/// let app = App::new();
/// let registry = arena_registry()?;
///
/// let config = AgentConfig::new("arena").with_seed(42);
/// let agent = app.create_agent(config, &registry)?;
/// # Ok::<(), battlebot::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use battlebot::app::App;
/// use battlebot::adapters::InMemoryRepository;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    /// Repository for model persistence
    repository: Arc<dyn ModelRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

/// An agent restored from storage with the provenance it was saved with.
pub struct LoadedAgent<S> {
    pub agent: TabularAgent<S>,
    pub metadata: TrainingMetadata,
}

impl App {
    /// Create a new app with production defaults.
    ///
    /// Uses:
    /// - `MsgPackRepository` for model persistence
    /// - No default seed (non-deterministic RNG)
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing app with custom dependencies.
    ///
    /// Primarily used for testing with in-memory dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    /// Get the model repository.
    pub fn repository(&self) -> Arc<dyn ModelRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    /// Create an agent with an empty table for the configured format.
    ///
    /// The seed comes from `config`, falling back to the app default.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedFormat`] if `config.format` is not registered
    /// - [`Error::InvalidConfiguration`] or [`Error::ActionSpaceMismatch`] from
    ///   agent construction
    pub fn create_agent<S: BattleSnapshot>(
        &self,
        config: AgentConfig,
        registry: &FormatRegistry<S>,
    ) -> Result<TabularAgent<S>> {
        let config = self.seeded(config);
        let profile = registry.get(&config.format)?;
        TabularAgent::new(&config, profile)
    }

    /// Load a saved model and wrap it in an agent configured by `config`.
    ///
    /// The saved format and algorithm must match the configuration; the
    /// table's action space must match the format's.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use battlebot::app::{App, AgentConfig};
    /// use battlebot::arena::arena_registry;
    /// use std::path::Path;
    ///
    /// let app = App::new();
    /// let registry = arena_registry()?;
    /// let loaded = app.load_agent(
    ///     AgentConfig::new("arena"),
    ///     &registry,
    ///     Path::new("arena.msgpack"),
    /// )?;
    /// println!("{} episodes so far", loaded.metadata.episodes_trained);
    /// # Ok::<(), battlebot::Error>(())
    /// ```
    pub fn load_agent<S: BattleSnapshot>(
        &self,
        config: AgentConfig,
        registry: &FormatRegistry<S>,
        path: &Path,
    ) -> Result<LoadedAgent<S>> {
        let model = self.repository.load(path)?;
        self.restore_agent(config, registry, model)
    }

    /// Wrap an already loaded model in an agent configured by `config`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlgorithmMismatch`] if the model was trained with another
    ///   TD rule
    /// - [`Error::InvalidConfiguration`] if the model's format differs
    /// - [`Error::ActionSpaceMismatch`] if the table does not fit the format
    pub fn restore_agent<S: BattleSnapshot>(
        &self,
        config: AgentConfig,
        registry: &FormatRegistry<S>,
        model: SavedModel,
    ) -> Result<LoadedAgent<S>> {
        let config = self.seeded(config);
        if model.algorithm != config.algorithm {
            return Err(Error::AlgorithmMismatch {
                saved: model.algorithm.to_string(),
                configured: config.algorithm.to_string(),
            });
        }
        if model.format != config.format {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "model was trained for format '{}', not '{}'",
                    model.format,
                    config.format
                ),
            });
        }

        let profile = registry.get(&config.format)?;
        let agent = TabularAgent::with_table(&config, profile, model.table)?;
        log::debug!(
            "loaded {} states for {} ({} episodes trained)",
            agent.table().len(),
            config.format,
            model.metadata.episodes_trained
        );
        Ok(LoadedAgent {
            agent,
            metadata: model.metadata,
        })
    }

    /// Save an agent's table through the configured repository.
    ///
    /// `history` is the metadata the table was loaded with (default for a
    /// fresh agent); the saved episode count adds this agent's episodes.
    pub fn save_agent<S>(
        &self,
        agent: &TabularAgent<S>,
        history: &TrainingMetadata,
        path: &Path,
    ) -> Result<()> {
        let model = agent.to_saved_model(history.episodes_trained, history.opponents.clone());
        self.repository.save(&model, path)
    }

    /// Zero the visit counters of a saved model in place.
    ///
    /// Returns the number of states in the table.
    pub fn reset_visit_counts(&self, path: &Path) -> Result<usize> {
        let mut model = self.repository.load(path)?;
        model.table.reset_visit_counts();
        self.repository.save(&model, path)?;
        Ok(model.table.len())
    }

    fn seeded(&self, mut config: AgentConfig) -> AgentConfig {
        if config.seed.is_none() {
            config.seed = self.default_seed;
        }
        config
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing app with custom dependencies.
///
/// # Examples
///
/// ```
/// use battlebot::app::AppBuilder;
/// use battlebot::adapters::JsonRepository;
///
/// let app = AppBuilder::new()
///     .with_repository(JsonRepository::new())
///     .with_default_seed(7)
///     .build();
/// ```
pub struct AppBuilder {
    repository: Option<Arc<dyn ModelRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            repository: None,
            default_seed: None,
        }
    }

    /// Set a custom model repository.
    pub fn with_repository<R: ModelRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for agents whose config has none.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app with the configured dependencies.
    ///
    /// If no repository was specified, uses `MsgPackRepository` by default.
    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
