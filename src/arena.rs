//! Reference battle environment
//!
//! A small seeded 3-vs-3 duel used to train and evaluate agents without an
//! external simulator. Each side fields three units of one of three
//! elements (fire beats grass beats water beats fire). Every unit knows the
//! same four moves and may switch to a healthy bench unit. The opponent
//! follows an [`OpponentPolicy`]; an arena can hold several and field them
//! in rotation.
//!
//! When the agent's active unit faints it must switch before the next turn;
//! the opponent sends its next unit in automatically. A battle that runs
//! past the turn cap ends in a tie.

use std::{fmt, str::FromStr, sync::Arc};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    battle::{BattleOutcome, BattleSnapshot, BattleSummary, StatusCondition, UnitSummary},
    formats::{
        ActionAvailability, ActionTranslator, BattleOrder, FnEncoder, FormatProfile,
        FormatRegistry, hp_bucket,
    },
    ports::BattleEnvironment,
    types::{Feature, StateKey},
};

/// Format id of the arena.
pub const ARENA_FORMAT: &str = "arena";

const TEAM_SIZE: usize = 3;
const MOVE_SLOTS: usize = 4;
const SWITCH_SLOTS: usize = TEAM_SIZE - 1;
const MAX_HP: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Water,
    Grass,
}

impl Element {
    const ALL: [Element; 3] = [Element::Fire, Element::Water, Element::Grass];

    /// The element this one is strong against.
    fn prey(self) -> Element {
        match self {
            Element::Fire => Element::Grass,
            Element::Grass => Element::Water,
            Element::Water => Element::Fire,
        }
    }

    /// Damage multiplier of an attack of this element against `defender`.
    pub fn effectiveness(self, defender: Element) -> f64 {
        if self.prey() == defender {
            2.0
        } else if defender.prey() == self {
            0.5
        } else {
            1.0
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Grass => "grass",
        };
        f.write_str(name)
    }
}

/// The four moves every unit knows, by slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArenaMove {
    /// Neutral hit
    Tackle,
    /// Hit of the user's own element
    Signature,
    /// Hit of the element that beats the user's
    Coverage,
    /// Poisons the target, no damage
    Toxin,
}

impl ArenaMove {
    const SLOTS: [ArenaMove; MOVE_SLOTS] = [
        ArenaMove::Tackle,
        ArenaMove::Signature,
        ArenaMove::Coverage,
        ArenaMove::Toxin,
    ];

    fn power(self) -> f64 {
        match self {
            ArenaMove::Tackle => 30.0,
            ArenaMove::Signature => 40.0,
            ArenaMove::Coverage => 35.0,
            ArenaMove::Toxin => 0.0,
        }
    }

    fn element(self, user: Element) -> Option<Element> {
        match self {
            ArenaMove::Tackle | ArenaMove::Toxin => None,
            ArenaMove::Signature => Some(user),
            ArenaMove::Coverage => Element::ALL.into_iter().find(|e| e.prey() == user),
        }
    }
}

/// How the arena's opponent picks its action each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentPolicy {
    /// Uniformly random move
    #[default]
    Random,
    /// Move with the highest expected damage against the agent's active unit
    MaxPower,
    /// Leaves losing matchups, poisons healthy targets, otherwise max power
    Heuristic,
}

impl OpponentPolicy {
    pub const ALL: [OpponentPolicy; 3] = [
        OpponentPolicy::Random,
        OpponentPolicy::MaxPower,
        OpponentPolicy::Heuristic,
    ];

    const EXPECTED: &'static str = "random, max-power, heuristic";

    /// Environment name while this opponent is fielded.
    pub fn env_name(self) -> &'static str {
        match self {
            OpponentPolicy::Random => "arena-random",
            OpponentPolicy::MaxPower => "arena-max-power",
            OpponentPolicy::Heuristic => "arena-heuristic",
        }
    }
}

impl fmt::Display for OpponentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpponentPolicy::Random => "random",
            OpponentPolicy::MaxPower => "max-power",
            OpponentPolicy::Heuristic => "heuristic",
        };
        f.write_str(name)
    }
}

impl FromStr for OpponentPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "random" => Ok(OpponentPolicy::Random),
            "max-power" | "maxpower" | "max-base-power" => Ok(OpponentPolicy::MaxPower),
            "heuristic" | "heuristics" | "simple-heuristics" => Ok(OpponentPolicy::Heuristic),
            _ => Err(Error::ParseOpponent {
                input: s.to_string(),
                expected: Self::EXPECTED.to_string(),
            }),
        }
    }
}

/// What the opponent does in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FoeAction {
    Move(ArenaMove),
    /// Bring in the team member at this index
    Switch(usize),
}

/// Damage of `mv` before the random roll.
fn expected_damage(mv: ArenaMove, attacker: &UnitView, defender: &UnitView) -> f64 {
    let multiplier = mv
        .element(attacker.element)
        .map_or(1.0, |e| e.effectiveness(defender.element));
    mv.power() * multiplier
}

/// The move with the highest expected damage, lowest slot on ties.
fn max_power_move(attacker: &UnitView, defender: &UnitView) -> ArenaMove {
    ArenaMove::SLOTS
        .into_iter()
        .fold((ArenaMove::Tackle, f64::NEG_INFINITY), |(best, best_damage), mv| {
            let damage = expected_damage(mv, attacker, defender);
            if damage > best_damage {
                (mv, damage)
            } else {
                (best, best_damage)
            }
        })
        .0
}

/// Above 1 when `unit` has the type advantage over `target`.
fn matchup(unit: &UnitView, target: &UnitView) -> f64 {
    unit.element.effectiveness(target.element) / target.element.effectiveness(unit.element)
}

/// One unit as visible in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    pub element: Element,
    pub hp: u32,
    pub speed: u32,
    pub poisoned: bool,
    /// Whether the agent has seen this unit
    pub revealed: bool,
}

impl UnitView {
    pub fn hp_fraction(&self) -> f64 {
        f64::from(self.hp) / f64::from(MAX_HP)
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    fn summary(&self) -> UnitSummary {
        UnitSummary {
            hp_fraction: self.hp_fraction(),
            fainted: self.is_fainted(),
            status: self.poisoned.then_some(StatusCondition::Poison),
        }
    }

    fn take_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
    }
}

/// Immutable view of the arena at a decision point or at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub own: [UnitView; TEAM_SIZE],
    pub opponent: [UnitView; TEAM_SIZE],
    pub own_active: usize,
    pub opponent_active: usize,
    /// The agent must replace a fainted active unit
    pub force_switch: bool,
    pub turn: usize,
    pub outcome: BattleOutcome,
}

impl ArenaSnapshot {
    pub fn own_active(&self) -> &UnitView {
        &self.own[self.own_active]
    }

    pub fn opponent_active(&self) -> &UnitView {
        &self.opponent[self.opponent_active]
    }

    /// Team index targeted by switch slot `slot`.
    pub fn switch_target(&self, slot: usize) -> Option<usize> {
        (0..TEAM_SIZE).filter(|&i| i != self.own_active).nth(slot)
    }

    /// What the agent can do right now.
    pub fn availability(&self) -> ActionAvailability {
        if self.outcome.is_terminal() {
            return ActionAvailability::default();
        }
        let switches = (0..SWITCH_SLOTS)
            .filter(|&slot| {
                self.switch_target(slot)
                    .is_some_and(|i| !self.own[i].is_fainted())
            })
            .collect();
        ActionAvailability {
            moves: if self.force_switch {
                Vec::new()
            } else {
                (0..MOVE_SLOTS).collect()
            },
            switches,
            force_switch: self.force_switch,
            ..ActionAvailability::default()
        }
    }
}

impl BattleSnapshot for ArenaSnapshot {
    fn summary(&self) -> BattleSummary {
        let own = self
            .own
            .iter()
            .enumerate()
            .map(|(i, unit)| (format!("own-{i}"), unit.summary()))
            .collect();
        let opponent = self
            .opponent
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.revealed)
            .map(|(i, unit)| (format!("opponent-{i}"), unit.summary()))
            .collect();
        BattleSummary {
            own,
            opponent,
            outcome: self.outcome,
        }
    }

    fn is_finished(&self) -> bool {
        self.outcome.is_terminal()
    }
}

/// Action layout of the arena: four moves then two switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArenaTranslator;

impl ActionTranslator for ArenaTranslator {
    fn action_space_size(&self) -> usize {
        MOVE_SLOTS + SWITCH_SLOTS
    }

    fn action_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = ["Tackle", "Signature", "Coverage", "Toxin"]
            .iter()
            .map(|name| format!("Use {name}"))
            .collect();
        labels.extend((1..=SWITCH_SLOTS).map(|i| format!("Switch {i}")));
        labels
    }

    fn to_order(&self, action: usize, availability: &ActionAvailability) -> Option<BattleOrder> {
        if action < MOVE_SLOTS {
            return availability.moves.contains(&action).then_some(BattleOrder::Move {
                slot: action,
                gimmick: None,
            });
        }
        let slot = action - MOVE_SLOTS;
        availability
            .switches
            .contains(&slot)
            .then_some(BattleOrder::Switch { slot })
    }
}

/// Feature names of [`encode_arena`] keys.
pub const ARENA_FEATURES: [&str; 10] = [
    "opponent_hp",
    "opponent_poisoned",
    "own_hp",
    "own_poisoned",
    "own_matchup",
    "bench_1_hp",
    "bench_1_matchup",
    "bench_2_hp",
    "bench_2_matchup",
    "force_switch",
];

/// Bucketed state key for an arena snapshot.
pub fn encode_arena(snapshot: &ArenaSnapshot) -> StateKey {
    let foe = snapshot.opponent_active();
    let own = snapshot.own_active();
    let mut features = vec![
        Feature::Int(hp_bucket(foe.hp_fraction(), foe.is_fainted())),
        Feature::from(foe.poisoned),
        Feature::Int(hp_bucket(own.hp_fraction(), own.is_fainted())),
        Feature::from(own.poisoned),
        Feature::real(own.element.effectiveness(foe.element)),
    ];
    for slot in 0..SWITCH_SLOTS {
        let (bucket, matchup) = match snapshot.switch_target(slot) {
            Some(i) => {
                let unit = &snapshot.own[i];
                (
                    hp_bucket(unit.hp_fraction(), unit.is_fainted()),
                    unit.element.effectiveness(foe.element),
                )
            }
            None => (-1, 1.0),
        };
        features.push(Feature::Int(bucket));
        features.push(Feature::real(matchup));
    }
    features.push(Feature::from(snapshot.force_switch));
    StateKey::new(features)
}

/// Format profile for the arena.
pub fn arena_profile() -> FormatProfile<ArenaSnapshot> {
    FormatProfile::new(
        ARENA_FORMAT,
        Arc::new(FnEncoder::new(encode_arena).with_feature_names(ARENA_FEATURES)),
        Arc::new(ArenaTranslator),
    )
}

/// Registry containing every built-in format for arena snapshots.
pub fn arena_registry() -> Result<FormatRegistry<ArenaSnapshot>> {
    FormatRegistry::new().with_profile(arena_profile())
}

/// Seeded arena environment.
pub struct Arena {
    rng: StdRng,
    max_turns: usize,
    state: Option<ArenaSnapshot>,
    roster: Vec<OpponentPolicy>,
    current: usize,
}

impl Arena {
    pub const DEFAULT_MAX_TURNS: usize = 200;

    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_turns: Self::DEFAULT_MAX_TURNS,
            state: None,
            roster: vec![OpponentPolicy::Random],
            current: 0,
        }
    }

    pub fn with_opponent(self, policy: OpponentPolicy) -> Self {
        self.with_opponents([policy])
    }

    /// Opponents to rotate through. An empty roster keeps the current one.
    pub fn with_opponents(mut self, roster: impl IntoIterator<Item = OpponentPolicy>) -> Self {
        let roster: Vec<OpponentPolicy> = roster.into_iter().collect();
        if !roster.is_empty() {
            self.roster = roster;
            self.current = 0;
        }
        self
    }

    pub fn roster(&self) -> &[OpponentPolicy] {
        &self.roster
    }

    /// The opponent fielded in the next battle.
    pub fn opponent(&self) -> OpponentPolicy {
        self.roster.get(self.current).copied().unwrap_or_default()
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// Start a battle from hand-picked teams.
    pub fn start_with(
        &mut self,
        own: [UnitView; TEAM_SIZE],
        opponent: [UnitView; TEAM_SIZE],
    ) -> ArenaSnapshot {
        let mut snapshot = ArenaSnapshot {
            own: own.map(|u| UnitView { revealed: true, ..u }),
            opponent: opponent.map(|u| UnitView {
                revealed: false,
                ..u
            }),
            own_active: 0,
            opponent_active: 0,
            force_switch: false,
            turn: 0,
            outcome: BattleOutcome::Ongoing,
        };
        snapshot.opponent[0].revealed = true;
        self.state = Some(snapshot.clone());
        snapshot
    }

    fn random_unit(&mut self) -> UnitView {
        let element = *Element::ALL.choose(&mut self.rng).unwrap_or(&Element::Fire);
        UnitView {
            element,
            hp: MAX_HP,
            speed: self.rng.random_range(50..=100),
            poisoned: false,
            revealed: false,
        }
    }

    fn damage(&mut self, mv: ArenaMove, attacker: &UnitView, defender: &UnitView) -> u32 {
        let roll: f64 = self.rng.random_range(0.85..=1.0);
        (expected_damage(mv, attacker, defender) * roll)
            .round()
            .max(1.0) as u32
    }

    fn opponent_action(&mut self, state: &ArenaSnapshot) -> FoeAction {
        let foe = state.opponent_active();
        let target = state.own_active();
        match self.opponent() {
            OpponentPolicy::Random => FoeAction::Move(
                *ArenaMove::SLOTS
                    .choose(&mut self.rng)
                    .unwrap_or(&ArenaMove::Tackle),
            ),
            OpponentPolicy::MaxPower => FoeAction::Move(max_power_move(foe, target)),
            OpponentPolicy::Heuristic => {
                if matchup(foe, target) < 1.0 {
                    let replacement = (0..TEAM_SIZE)
                        .filter(|&i| i != state.opponent_active && !state.opponent[i].is_fainted())
                        .filter(|&i| matchup(&state.opponent[i], target) > 1.0)
                        .max_by_key(|&i| state.opponent[i].hp);
                    if let Some(index) = replacement {
                        return FoeAction::Switch(index);
                    }
                }
                let best = max_power_move(foe, target);
                if !target.poisoned
                    && target.hp_fraction() > 0.5
                    && expected_damage(best, foe, target) <= ArenaMove::Signature.power()
                {
                    FoeAction::Move(ArenaMove::Toxin)
                } else {
                    FoeAction::Move(best)
                }
            }
        }
    }
}

/// Who acts in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Own,
    Opponent,
}

impl BattleEnvironment for Arena {
    type Snapshot = ArenaSnapshot;

    fn name(&self) -> &str {
        self.opponent().env_name()
    }

    fn start(&mut self) -> Result<ArenaSnapshot> {
        let own = [self.random_unit(), self.random_unit(), self.random_unit()];
        let opponent = [self.random_unit(), self.random_unit(), self.random_unit()];
        Ok(self.start_with(own, opponent))
    }

    fn legal_actions(&self, snapshot: &ArenaSnapshot) -> Vec<usize> {
        ArenaTranslator.legal_actions(&snapshot.availability())
    }

    fn step(&mut self, action: usize) -> Result<ArenaSnapshot> {
        let Some(mut state) = self.state.take() else {
            return Err(Error::BattleNotRunning);
        };
        if state.outcome.is_terminal() {
            self.state = Some(state);
            return Err(Error::BattleNotRunning);
        }
        let Some(order) = ArenaTranslator.to_order(action, &state.availability()) else {
            self.state = Some(state);
            return Err(Error::ActionNotExecutable { action });
        };
        // Both sides commit before either order resolves.
        let foe_action = (!state.force_switch).then(|| self.opponent_action(&state));

        let own_move = match order {
            BattleOrder::Switch { slot } => {
                if let Some(target) = state.switch_target(slot) {
                    state.own_active = target;
                }
                None
            }
            BattleOrder::Move { slot, .. } => ArenaMove::SLOTS.get(slot).copied(),
            BattleOrder::Forfeit => None,
        };

        if let Some(foe_action) = foe_action {
            let foe_move = match foe_action {
                FoeAction::Move(mv) => Some(mv),
                FoeAction::Switch(index) => {
                    state.opponent_active = index;
                    state.opponent[index].revealed = true;
                    None
                }
            };
            let own_first = match (own_move, foe_move) {
                (Some(_), Some(_)) => {
                    let own_speed = state.own_active().speed;
                    let foe_speed = state.opponent_active().speed;
                    own_speed > foe_speed || (own_speed == foe_speed && self.rng.random_bool(0.5))
                }
                _ => true,
            };
            let turn_order = if own_first {
                [(Side::Own, own_move), (Side::Opponent, foe_move)]
            } else {
                [(Side::Opponent, foe_move), (Side::Own, own_move)]
            };
            for (side, mv) in turn_order {
                let Some(mv) = mv else { continue };
                if state.own_active().is_fainted() || state.opponent_active().is_fainted() {
                    break;
                }
                self.execute(&mut state, side, mv);
            }
            end_of_turn(&mut state);
        } else {
            state.force_switch = false;
        }

        state.turn += 1;
        settle(&mut state, self.max_turns);
        self.state = Some(state.clone());
        Ok(state)
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn opponent_count(&self) -> usize {
        self.roster.len()
    }

    fn select_opponent(&mut self, index: usize) {
        self.current = index % self.roster.len().max(1);
    }
}

impl Arena {
    fn execute(&mut self, state: &mut ArenaSnapshot, side: Side, mv: ArenaMove) {
        let (attacker, defender) = match side {
            Side::Own => (*state.own_active(), *state.opponent_active()),
            Side::Opponent => (*state.opponent_active(), *state.own_active()),
        };
        let amount = match mv {
            ArenaMove::Toxin => 0,
            _ => self.damage(mv, &attacker, &defender),
        };
        let target = match side {
            Side::Own => &mut state.opponent[state.opponent_active],
            Side::Opponent => &mut state.own[state.own_active],
        };
        match mv {
            ArenaMove::Toxin => target.poisoned = true,
            _ => target.take_damage(amount),
        }
    }
}

/// Poison ticks for both active units.
fn end_of_turn(state: &mut ArenaSnapshot) {
    for unit in [
        &mut state.own[state.own_active],
        &mut state.opponent[state.opponent_active],
    ] {
        if unit.poisoned && !unit.is_fainted() {
            unit.take_damage(MAX_HP / 8);
        }
    }
}

/// Replace fainted units and decide the outcome.
fn settle(state: &mut ArenaSnapshot, max_turns: usize) {
    let own_alive = state.own.iter().any(|u| !u.is_fainted());
    let foe_alive = state.opponent.iter().any(|u| !u.is_fainted());
    state.outcome = match (own_alive, foe_alive) {
        (false, false) => BattleOutcome::Tie,
        (false, true) => BattleOutcome::Lost,
        (true, false) => BattleOutcome::Won,
        (true, true) if state.turn >= max_turns => BattleOutcome::Tie,
        (true, true) => BattleOutcome::Ongoing,
    };
    if state.outcome.is_terminal() {
        state.force_switch = false;
        return;
    }

    if state.opponent_active().is_fainted()
        && let Some(next) = state.opponent.iter().position(|u| !u.is_fainted())
    {
        state.opponent_active = next;
        state.opponent[next].revealed = true;
    }
    state.force_switch = state.own_active().is_fainted();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(element: Element, hp: u32, speed: u32) -> UnitView {
        UnitView {
            element,
            hp,
            speed,
            poisoned: false,
            revealed: false,
        }
    }

    #[test]
    fn test_effectiveness_cycle() {
        assert_eq!(Element::Fire.effectiveness(Element::Grass), 2.0);
        assert_eq!(Element::Grass.effectiveness(Element::Fire), 0.5);
        assert_eq!(Element::Water.effectiveness(Element::Water), 1.0);
        assert_eq!(ArenaMove::Coverage.element(Element::Fire), Some(Element::Water));
    }

    #[test]
    fn test_opening_snapshot() {
        let mut arena = Arena::new(1);
        let snapshot = arena.start().unwrap();
        assert_eq!(snapshot.outcome, BattleOutcome::Ongoing);
        assert_eq!(arena.legal_actions(&snapshot), vec![0, 1, 2, 3, 4, 5]);

        let summary = snapshot.summary();
        assert_eq!(summary.own.len(), 3);
        assert_eq!(summary.opponent.len(), 1);
        assert_eq!(encode_arena(&snapshot).arity(), ARENA_FEATURES.len());
    }

    #[test]
    fn test_forced_switch_only_allows_live_bench() {
        let mut arena = Arena::new(2);
        let mut snapshot = arena.start_with(
            [
                unit(Element::Fire, 0, 60),
                unit(Element::Water, 0, 60),
                unit(Element::Grass, 50, 60),
            ],
            [
                unit(Element::Fire, 100, 60),
                unit(Element::Fire, 100, 60),
                unit(Element::Fire, 100, 60),
            ],
        );
        snapshot.force_switch = true;
        assert_eq!(arena.legal_actions(&snapshot), vec![5]);
    }

    #[test]
    fn test_switch_takes_effect_before_opponent_moves() {
        let mut arena = Arena::new(3);
        arena.start_with(
            [
                unit(Element::Grass, 100, 10),
                unit(Element::Water, 100, 10),
                unit(Element::Fire, 100, 10),
            ],
            [
                unit(Element::Fire, 100, 90),
                unit(Element::Fire, 100, 90),
                unit(Element::Fire, 100, 90),
            ],
        );
        let after = arena.step(5).unwrap();
        assert_eq!(after.own_active, 2);
        assert_eq!(after.own[0].hp, 100);
        assert_eq!(after.turn, 1);
    }

    #[test]
    fn test_illegal_action_is_rejected() {
        let mut arena = Arena::new(4);
        arena.start().unwrap();
        assert!(matches!(
            arena.step(6),
            Err(Error::ActionNotExecutable { action: 6 })
        ));
        assert!(arena.step(0).is_ok());
    }

    #[test]
    fn test_step_before_start_fails() {
        let mut arena = Arena::new(5);
        assert!(matches!(arena.step(0), Err(Error::BattleNotRunning)));
    }

    #[test]
    fn test_random_battles_terminate() {
        let mut arena = Arena::new(6).with_max_turns(50);
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..20 {
            let mut snapshot = arena.start().unwrap();
            while !snapshot.is_finished() {
                let legal = arena.legal_actions(&snapshot);
                let action = *legal.choose(&mut rng).unwrap();
                snapshot = arena.step(action).unwrap();
                assert!(snapshot.turn <= 50);
            }
            assert!(arena.legal_actions(&snapshot).is_empty());
            assert!(arena.step(0).is_err());
        }
    }

    #[test]
    fn test_turn_cap_ends_in_tie() {
        let mut arena = Arena::new(7).with_max_turns(1);
        arena.start_with(
            [
                unit(Element::Fire, 100, 60),
                unit(Element::Fire, 100, 60),
                unit(Element::Fire, 100, 60),
            ],
            [
                unit(Element::Fire, 100, 60),
                unit(Element::Fire, 100, 60),
                unit(Element::Fire, 100, 60),
            ],
        );
        let after = arena.step(3).unwrap();
        assert_eq!(after.outcome, BattleOutcome::Tie);
    }

    #[test]
    fn test_max_power_move_prefers_super_effective_hits() {
        let fire = unit(Element::Fire, 100, 60);
        assert_eq!(
            max_power_move(&fire, &unit(Element::Grass, 100, 60)),
            ArenaMove::Signature
        );
        assert_eq!(
            max_power_move(&fire, &unit(Element::Water, 100, 60)),
            ArenaMove::Coverage
        );
    }

    #[test]
    fn test_max_power_opponent_hits_hard() {
        let mut arena = Arena::new(8).with_opponent(OpponentPolicy::MaxPower);
        arena.start_with(
            [
                unit(Element::Grass, 100, 10),
                unit(Element::Grass, 100, 10),
                unit(Element::Grass, 100, 10),
            ],
            [
                unit(Element::Fire, 100, 90),
                unit(Element::Fire, 100, 90),
                unit(Element::Fire, 100, 90),
            ],
        );
        let after = arena.step(3).unwrap();
        // Signature fire hit: 80 expected, rolled down to at most 15%.
        assert!((20..=32).contains(&after.own[0].hp), "hp was {}", after.own[0].hp);
        assert!(!after.own[0].poisoned);
        assert!(after.opponent[0].poisoned);
    }

    #[test]
    fn test_heuristic_opponent_leaves_a_losing_matchup() {
        let mut arena = Arena::new(9).with_opponent(OpponentPolicy::Heuristic);
        arena.start_with(
            [
                unit(Element::Fire, 100, 10),
                unit(Element::Fire, 100, 10),
                unit(Element::Fire, 100, 10),
            ],
            [
                unit(Element::Grass, 100, 90),
                unit(Element::Water, 100, 90),
                unit(Element::Grass, 100, 90),
            ],
        );
        let after = arena.step(3).unwrap();
        assert_eq!(after.opponent_active, 1);
        assert!(after.opponent[1].revealed);
        assert_eq!(after.opponent[0].hp, 100);
        // The agent's toxin lands on the unit that came in.
        assert!(after.opponent[1].poisoned);
        assert_eq!(after.opponent[1].hp, 100 - MAX_HP / 8);
        assert_eq!(after.own[0].hp, 100);
    }

    #[test]
    fn test_heuristic_opponent_poisons_healthy_targets() {
        let mut arena = Arena::new(10).with_opponent(OpponentPolicy::Heuristic);
        arena.start_with(
            [
                unit(Element::Water, 100, 10),
                unit(Element::Water, 100, 10),
                unit(Element::Water, 100, 10),
            ],
            [
                unit(Element::Fire, 100, 90),
                unit(Element::Fire, 100, 90),
                unit(Element::Fire, 100, 90),
            ],
        );
        let first = arena.step(3).unwrap();
        assert!(first.own[0].poisoned);
        assert_eq!(first.own[0].hp, 100 - MAX_HP / 8);

        // Once poisoned, the target takes the strongest hit instead.
        let second = arena.step(3).unwrap();
        assert!(second.own[0].hp < first.own[0].hp - MAX_HP / 8);
    }

    #[test]
    fn test_roster_rotation_changes_the_name() {
        let mut arena = Arena::new(11).with_opponents(OpponentPolicy::ALL);
        assert_eq!(arena.opponent_count(), 3);
        assert_eq!(arena.name(), "arena-random");
        arena.select_opponent(4);
        assert_eq!(arena.name(), "arena-max-power");
        arena.select_opponent(2);
        assert_eq!(arena.opponent(), OpponentPolicy::Heuristic);

        let unchanged = Arena::new(11).with_opponents([]);
        assert_eq!(unchanged.roster(), &[OpponentPolicy::Random]);
    }

    #[test]
    fn test_opponent_policy_parsing() {
        assert_eq!("max_power".parse::<OpponentPolicy>().unwrap(), OpponentPolicy::MaxPower);
        assert_eq!(" Heuristic ".parse::<OpponentPolicy>().unwrap(), OpponentPolicy::Heuristic);
        for policy in OpponentPolicy::ALL {
            assert_eq!(policy.to_string().parse::<OpponentPolicy>().unwrap(), policy);
        }
        assert!(matches!(
            "minimax".parse::<OpponentPolicy>(),
            Err(Error::ParseOpponent { .. })
        ));
    }
}
