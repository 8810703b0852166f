//! Battle-format capability table
//!
//! A format id resolves to a [`FormatProfile`]: the state encoder for that
//! format's snapshots, the translator between action indices and battle
//! orders, and the size of the action space. Agents are built from a profile
//! looked up in a [`FormatRegistry`], so supporting a new format is a
//! registration rather than a new code path.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, types::StateKey};

/// Maps a raw battle snapshot to a discrete [`StateKey`].
///
/// Implementations must be pure and must produce keys of a fixed arity.
pub trait StateEncoder<S>: Send + Sync {
    fn encode(&self, snapshot: &S) -> StateKey;

    /// Column names for the key's features, if known.
    fn feature_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A [`StateEncoder`] backed by a plain function or closure.
pub struct FnEncoder<F> {
    encode: F,
    feature_names: Vec<String>,
}

impl<F> FnEncoder<F> {
    pub fn new(encode: F) -> Self {
        Self {
            encode,
            feature_names: Vec::new(),
        }
    }

    pub fn with_feature_names<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.feature_names = names.into_iter().map(Into::into).collect();
        self
    }
}

impl<S, F> StateEncoder<S> for FnEncoder<F>
where
    F: Fn(&S) -> StateKey + Send + Sync,
{
    fn encode(&self, snapshot: &S) -> StateKey {
        (self.encode)(snapshot)
    }

    fn feature_names(&self) -> Vec<String> {
        self.feature_names.clone()
    }
}

/// Battle gimmick attached to a move order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gimmick {
    Mega,
    ZMove,
    Dynamax,
}

/// A concrete command for the battle layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOrder {
    Move { slot: usize, gimmick: Option<Gimmick> },
    Switch { slot: usize },
    Forfeit,
}

impl fmt::Display for BattleOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleOrder::Move { slot, gimmick: None } => write!(f, "move {}", slot + 1),
            BattleOrder::Move {
                slot,
                gimmick: Some(Gimmick::Mega),
            } => write!(f, "move {} + mega", slot + 1),
            BattleOrder::Move {
                slot,
                gimmick: Some(Gimmick::ZMove),
            } => write!(f, "z-move {}", slot + 1),
            BattleOrder::Move {
                slot,
                gimmick: Some(Gimmick::Dynamax),
            } => write!(f, "move {} + dynamax", slot + 1),
            BattleOrder::Switch { slot } => write!(f, "switch {}", slot + 1),
            BattleOrder::Forfeit => f.write_str("forfeit"),
        }
    }
}

/// What the battle layer reports as executable at a decision point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAvailability {
    /// Move slots that can be used this turn
    pub moves: Vec<usize>,
    /// Move slots that can be used as a Z-move
    pub z_moves: Vec<usize>,
    pub can_mega: bool,
    pub can_dynamax: bool,
    /// Bench slots that can be switched in
    pub switches: Vec<usize>,
    /// Only switches are allowed (active unit fainted)
    pub force_switch: bool,
    pub can_forfeit: bool,
}

/// Converts between action indices and [`BattleOrder`]s for one format.
pub trait ActionTranslator: Send + Sync {
    fn action_space_size(&self) -> usize;

    /// Human-readable name of every action slot, in index order.
    fn action_labels(&self) -> Vec<String>;

    /// The order an index stands for, if it is executable given `availability`.
    fn to_order(&self, action: usize, availability: &ActionAvailability) -> Option<BattleOrder>;

    /// Indices executable given `availability`, ascending.
    fn legal_actions(&self, availability: &ActionAvailability) -> Vec<usize> {
        (0..self.action_space_size())
            .filter(|&action| self.to_order(action, availability).is_some())
            .collect()
    }
}

/// Single-battle layout with every generation 8 gimmick.
///
/// | Index | Order |
/// |---|---|
/// | 0..4 | move |
/// | 4..8 | move + mega evolution |
/// | 8..12 | Z-move |
/// | 12..16 | move + dynamax |
/// | 16..21 | switch |
/// | 21 | forfeit |
#[derive(Debug, Clone, Copy, Default)]
pub struct Gen8SinglesTranslator;

impl Gen8SinglesTranslator {
    pub const MOVE_SLOTS: usize = 4;
    pub const SWITCH_SLOTS: usize = 5;
    pub const ACTION_SPACE_SIZE: usize = 4 * Self::MOVE_SLOTS + Self::SWITCH_SLOTS + 1;
    pub const FORFEIT: usize = Self::ACTION_SPACE_SIZE - 1;
}

impl ActionTranslator for Gen8SinglesTranslator {
    fn action_space_size(&self) -> usize {
        Self::ACTION_SPACE_SIZE
    }

    fn action_labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(Self::ACTION_SPACE_SIZE);
        labels.extend((1..=4).map(|i| format!("Use move {i}")));
        labels.extend((1..=4).map(|i| format!("Use move {i} and mega evolve")));
        labels.extend((1..=4).map(|i| format!("Use move {i} as Z move")));
        labels.extend((1..=4).map(|i| format!("Use move {i} and Dynamax")));
        labels.extend((1..=5).map(|i| format!("Switch {i}")));
        labels.push("Forfeit".to_string());
        labels
    }

    fn to_order(&self, action: usize, availability: &ActionAvailability) -> Option<BattleOrder> {
        let moves = Self::MOVE_SLOTS;
        if action == Self::FORFEIT {
            return availability.can_forfeit.then_some(BattleOrder::Forfeit);
        }
        if action >= 4 * moves {
            let slot = action - 4 * moves;
            return (slot < Self::SWITCH_SLOTS && availability.switches.contains(&slot))
                .then_some(BattleOrder::Switch { slot });
        }
        if availability.force_switch {
            return None;
        }

        let slot = action % moves;
        let gimmick = match action / moves {
            0 => None,
            1 if availability.can_mega => Some(Gimmick::Mega),
            2 if availability.z_moves.contains(&slot) => Some(Gimmick::ZMove),
            3 if availability.can_dynamax => Some(Gimmick::Dynamax),
            _ => return None,
        };
        availability
            .moves
            .contains(&slot)
            .then_some(BattleOrder::Move { slot, gimmick })
    }
}

/// Everything an agent needs to play one battle format.
pub struct FormatProfile<S> {
    id: String,
    encoder: Arc<dyn StateEncoder<S>>,
    translator: Arc<dyn ActionTranslator>,
}

impl<S> Clone for FormatProfile<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            encoder: Arc::clone(&self.encoder),
            translator: Arc::clone(&self.translator),
        }
    }
}

impl<S> fmt::Debug for FormatProfile<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatProfile")
            .field("id", &self.id)
            .field("action_space_size", &self.action_space_size())
            .finish()
    }
}

impl<S> FormatProfile<S> {
    pub fn new(
        id: impl Into<String>,
        encoder: Arc<dyn StateEncoder<S>>,
        translator: Arc<dyn ActionTranslator>,
    ) -> Self {
        Self {
            id: id.into(),
            encoder,
            translator,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn encoder(&self) -> &Arc<dyn StateEncoder<S>> {
        &self.encoder
    }

    pub fn translator(&self) -> &Arc<dyn ActionTranslator> {
        &self.translator
    }

    pub fn action_space_size(&self) -> usize {
        self.translator.action_space_size()
    }

    pub fn action_labels(&self) -> Vec<String> {
        self.translator.action_labels()
    }

    /// Check the translator's labels cover its action space.
    pub fn validate(&self) -> Result<()> {
        let size = self.action_space_size();
        if size == 0 {
            return Err(Error::InvalidConfiguration {
                message: format!("format '{}' has an empty action space", self.id),
            });
        }
        let labels = self.action_labels().len();
        if labels != size {
            return Err(Error::ActionSpaceMismatch {
                expected: size,
                got: labels,
            });
        }
        Ok(())
    }
}

/// Lookup from format id to [`FormatProfile`].
pub struct FormatRegistry<S> {
    profiles: BTreeMap<String, FormatProfile<S>>,
}

impl<S> Default for FormatRegistry<S> {
    fn default() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }
}

impl<S> FormatRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile, replacing any profile registered under the same id.
    pub fn register(&mut self, profile: FormatProfile<S>) -> Result<()> {
        profile.validate()?;
        if self.profiles.contains_key(profile.id()) {
            log::warn!("replacing registered format '{}'", profile.id());
        }
        self.profiles.insert(profile.id().to_string(), profile);
        Ok(())
    }

    pub fn with_profile(mut self, profile: FormatProfile<S>) -> Result<Self> {
        self.register(profile)?;
        Ok(self)
    }

    pub fn get(&self, format: &str) -> Result<&FormatProfile<S>> {
        self.profiles
            .get(format)
            .ok_or_else(|| Error::UnsupportedFormat {
                format: format.to_string(),
                known: self.known_formats().join(", "),
            })
    }

    pub fn known_formats(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

/// Buckets an hp fraction: 3 full, 2 above two thirds, 1 above one third,
/// 0 alive, -1 fainted.
pub fn hp_bucket(hp_fraction: f64, fainted: bool) -> i64 {
    if fainted || hp_fraction <= 0.0 {
        -1
    } else if hp_fraction >= 1.0 {
        3
    } else if hp_fraction > 0.66 {
        2
    } else if hp_fraction > 0.33 {
        1
    } else {
        0
    }
}
