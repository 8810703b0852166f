//! Decision-loop scenarios for the tabular controller

mod common;

use battlebot::{
    BattleOutcome, Error, StateKey, TabularAgent,
    app::AgentConfig,
    tabular::{
        ActionRow, ActionTable, AgentMode, ExplorationSchedule, PolicySelector, TdAlgorithm,
        TdLearner, TieBreak, VisitBasis,
    },
};
use common::{DUEL_FORMAT, DuelSnapshot, duel_profile, play_scripted};
use rand::{SeedableRng, rngs::StdRng};

fn scenario_table() -> ActionTable {
    let mut table = ActionTable::new(2).unwrap();
    table
        .insert_row(
            StateKey::from_ints(&[1, 0]),
            ActionRow::from_parts(vec![0.4, 0.6], 3, vec![3, 5]).unwrap(),
        )
        .unwrap();
    table
}

#[test]
fn test_scenario_greedy_pick_and_bounded_update() {
    let state = StateKey::from_ints(&[1, 0]);
    let schedule = ExplorationSchedule {
        learning_rate_scale: 2.0,
        ..Default::default()
    };
    let mut table = scenario_table();

    let epsilon = schedule.epsilon(3, AgentMode::Training);
    assert!((epsilon - 1.0 / 3f64.ln()).abs() < 1e-12);

    let mut rng = StdRng::seed_from_u64(0);
    let greedy = PolicySelector::new(TieBreak::Uniform)
        .select(table.get(&state).unwrap(), &[0, 1], 0.0, &mut rng)
        .unwrap();
    assert_eq!(greedy, 1);

    let learner = TdLearner::new(0.0, VisitBasis::Action, schedule);
    let update = learner
        .update_q(&mut table, &state, 1, 1.0, None, AgentMode::Training)
        .unwrap();

    // alpha = 2 / 5
    assert!((update.learning_rate - 0.4).abs() < 1e-12);
    let row = table.get(&state).unwrap();
    assert!(row.value(1) > 0.6 && row.value(1) < 1.0);
    assert!((row.value(1) - 0.76).abs() < 1e-12);
    assert_eq!(row.action_visits(), &[3, 6]);
    assert_eq!(row.visits(), 4);
    assert_eq!(row.value(0), 0.4);
}

#[test]
fn test_scenario_default_schedule_never_overshoots_reward() {
    let state = StateKey::from_ints(&[1, 0]);
    let mut table = scenario_table();
    let learner = TdLearner::new(0.0, VisitBasis::Action, ExplorationSchedule::default());

    learner
        .update_q(&mut table, &state, 1, 1.0, None, AgentMode::Training)
        .unwrap();
    let row = table.get(&state).unwrap();
    assert!(row.value(1) > 0.6 && row.value(1) <= 1.0);
    assert_eq!(row.action_visits()[1], 6);

    // Far past the scale the rate decays below one.
    let mut table = ActionTable::new(2).unwrap();
    table
        .insert_row(
            state.clone(),
            ActionRow::from_parts(vec![0.4, 0.6], 200, vec![41, 159]).unwrap(),
        )
        .unwrap();
    learner
        .update_q(&mut table, &state, 1, 1.0, None, AgentMode::Training)
        .unwrap();
    let value = table.get(&state).unwrap().value(1);
    assert!(value > 0.6 && value < 1.0);
}

#[test]
fn test_single_action_space_always_returns_zero() {
    let config = AgentConfig::new(DUEL_FORMAT).with_seed(3);
    let mut agent = TabularAgent::new(&config, &duel_profile(1)).unwrap();

    for episode in 0..20 {
        let actions = play_scripted(
            &mut agent,
            &[[episode, 0], [episode, 1], [0, 0]],
            &[0],
            BattleOutcome::Lost,
        );
        assert!(actions.iter().all(|&a| a == 0));
    }
}

#[test]
fn test_frozen_policy_is_a_function_of_table_and_snapshot() {
    let config = AgentConfig::new(DUEL_FORMAT).with_seed(5);
    let mut trainer = TabularAgent::new(&config, &duel_profile(3)).unwrap();
    for episode in 0..30 {
        let outcome = if episode % 3 == 0 {
            BattleOutcome::Won
        } else {
            BattleOutcome::Lost
        };
        play_scripted(
            &mut trainer,
            &[[0, 0], [0, 1], [1, 1]],
            &[0, 1, 2],
            outcome,
        );
    }
    let table = trainer.into_table();

    let frozen = |seed: u64| {
        let config = AgentConfig::new(DUEL_FORMAT)
            .with_mode(AgentMode::PlayingFixed)
            .with_seed(seed);
        TabularAgent::with_table(&config, &duel_profile(3), table.clone()).unwrap()
    };
    let mut first = frozen(1);
    let mut second = frozen(999);

    let snapshots = [[0, 0], [0, 1], [1, 1], [7, 7]];
    for key in snapshots {
        let snapshot = DuelSnapshot::ongoing(&key);
        let a = first.choose_action(&snapshot, &[0, 1, 2]).unwrap();
        for _ in 0..5 {
            assert_eq!(first.choose_action(&snapshot, &[0, 1, 2]).unwrap(), a);
        }
        assert_eq!(second.choose_action(&snapshot, &[0, 1, 2]).unwrap(), a);
    }

    // Unseen states are not added and ties resolve to the lowest index.
    assert_eq!(first.table(), &table);
    assert_eq!(
        first
            .choose_action(&DuelSnapshot::ongoing(&[7, 7]), &[2, 1])
            .unwrap(),
        1
    );
    assert!(first.pending().is_none());
}

#[test]
fn test_sarsa_bootstraps_from_the_action_it_takes() {
    let schedule = ExplorationSchedule {
        playing_epsilon: 0.0,
        playing_learning_rate: 0.5,
        ..Default::default()
    };
    let mut table = ActionTable::new(2).unwrap();
    table
        .insert_row(
            StateKey::from_ints(&[2, 0]),
            ActionRow::from_parts(vec![0.0, 5.0], 0, vec![0, 0]).unwrap(),
        )
        .unwrap();
    let config = AgentConfig::new(DUEL_FORMAT)
        .with_algorithm(TdAlgorithm::Sarsa)
        .with_mode(AgentMode::PlayingWhileLearning)
        .with_discount_factor(1.0)
        .with_schedule(schedule)
        .with_seed(17);
    let mut agent = TabularAgent::with_table(&config, &duel_profile(2), table).unwrap();

    let first = agent
        .choose_action(&DuelSnapshot::ongoing(&[1, 0]), &[0, 1])
        .unwrap();
    let next = agent
        .choose_action(&DuelSnapshot::ongoing(&[2, 0]), &[0, 1])
        .unwrap();
    assert_eq!(next, 1);

    // target = 0 + 1.0 * Q([2,0], 1) = 5, alpha = 0.5
    let row = agent.table().get(&StateKey::from_ints(&[1, 0])).unwrap();
    assert!((row.value(first) - 2.5).abs() < 1e-12);
    assert_eq!(row.action_visits()[first], 1);

    let pending = agent.pending().unwrap();
    assert_eq!(pending.state, StateKey::from_ints(&[2, 0]));
    assert_eq!(pending.action, 1);
}

#[test]
fn test_q_learning_bootstraps_only_over_next_legal_actions() {
    let schedule = ExplorationSchedule {
        playing_epsilon: 0.0,
        playing_learning_rate: 0.5,
        ..Default::default()
    };
    let mut table = ActionTable::new(2).unwrap();
    table
        .insert_row(
            StateKey::from_ints(&[2, 0]),
            ActionRow::from_parts(vec![0.0, 5.0], 0, vec![0, 0]).unwrap(),
        )
        .unwrap();
    let config = AgentConfig::new(DUEL_FORMAT)
        .with_mode(AgentMode::PlayingWhileLearning)
        .with_discount_factor(1.0)
        .with_schedule(schedule)
        .with_seed(17);
    let mut agent = TabularAgent::with_table(&config, &duel_profile(2), table).unwrap();

    let first = agent
        .choose_action(&DuelSnapshot::ongoing(&[1, 0]), &[0, 1])
        .unwrap();
    let next = agent
        .choose_action(&DuelSnapshot::ongoing(&[2, 0]), &[0])
        .unwrap();
    assert_eq!(next, 0);

    // Only action 0 is legal next, so the bootstrap is Q([2,0], 0) = 0.
    let row = agent.table().get(&StateKey::from_ints(&[1, 0])).unwrap();
    assert_eq!(row.value(first), 0.0);
    assert_eq!(row.action_visits()[first], 1);
    assert_eq!(row.visits(), 1);
}

#[test]
fn test_rows_are_created_lazily_and_persist() {
    let config = AgentConfig::new(DUEL_FORMAT).with_seed(1);
    let mut agent = TabularAgent::new(&config, &duel_profile(4)).unwrap();
    assert!(agent.table().is_empty());

    agent
        .choose_action(&DuelSnapshot::ongoing(&[3, 3]), &[0, 1, 2, 3])
        .unwrap();
    let row = agent.table().get(&StateKey::from_ints(&[3, 3])).unwrap();
    assert_eq!(row.values(), &[0.0; 4]);
    assert_eq!(row.visits(), 0);
    assert_eq!(row.action_visits(), &[0; 4]);
    assert_eq!(agent.table().len(), 1);

    agent
        .choose_action(&DuelSnapshot::ongoing(&[3, 3]), &[0, 1, 2, 3])
        .unwrap();
    assert_eq!(agent.table().len(), 1);
}

#[test]
fn test_every_update_adds_exactly_one_visit() {
    let config = AgentConfig::new(DUEL_FORMAT)
        .with_mode(AgentMode::PlayingWhileLearning)
        .with_seed(8);
    let mut agent = TabularAgent::new(&config, &duel_profile(2)).unwrap();

    play_scripted(&mut agent, &[[0, 0], [0, 0], [0, 0]], &[0, 1], BattleOutcome::Tie);

    // Three decisions in the same state: two mid-battle updates plus the terminal one.
    let row = agent.table().get(&StateKey::from_ints(&[0, 0])).unwrap();
    assert_eq!(row.visits(), 3);
    assert_eq!(row.action_visits().iter().sum::<u64>(), 3);
}

#[test]
fn test_contract_violations_are_errors() {
    let config = AgentConfig::new(DUEL_FORMAT).with_seed(2);
    let mut agent = TabularAgent::new(&config, &duel_profile(2)).unwrap();
    let snapshot = DuelSnapshot::ongoing(&[0, 0]);

    assert!(matches!(
        agent.choose_action(&snapshot, &[]),
        Err(Error::NoLegalActions)
    ));
    assert!(matches!(
        agent.choose_action(&snapshot, &[0, 2]),
        Err(Error::ActionOutOfRange { action: 2, .. })
    ));
    assert!(matches!(
        agent.on_episode_finished(&snapshot),
        Err(Error::EpisodeNotFinished)
    ));

    let mismatched = AgentConfig::new(DUEL_FORMAT).with_action_space_size(3);
    assert!(matches!(
        TabularAgent::new(&mismatched, &duel_profile(2)),
        Err(Error::ActionSpaceMismatch {
            expected: 2,
            got: 3
        })
    ));
}
