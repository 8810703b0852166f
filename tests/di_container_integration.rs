//! Integration tests for dependency injection.
//!
//! These tests demonstrate the benefits of the DI app:
//! - Easy testing with in-memory repositories (no file I/O)
//! - Deterministic behavior with fixed seeds
//! - Centralized dependency management

mod common;

use std::path::Path;

use battlebot::{
    BattleOutcome, Error,
    adapters::{InMemoryRepository, MsgPackRepository},
    app::{AgentConfig, App},
    tabular::TrainingMetadata,
};
use common::{DUEL_FORMAT, duel_registry, play_scripted};
use tempfile::TempDir;

#[test]
fn test_app_with_in_memory_repository() {
    let app = App::for_testing()
        .with_repository(InMemoryRepository::new())
        .with_default_seed(42)
        .build();
    let registry = duel_registry(2);

    let mut agent = app
        .create_agent(AgentConfig::new(DUEL_FORMAT), &registry)
        .unwrap();
    play_scripted(&mut agent, &[[0, 0], [0, 1]], &[0, 1], BattleOutcome::Won);

    let path = Path::new("test_agent");
    app.save_agent(&agent, &TrainingMetadata::default(), path)
        .unwrap();
    let loaded = app
        .load_agent(AgentConfig::new(DUEL_FORMAT), &registry, path)
        .unwrap();

    assert_eq!(loaded.agent.table(), agent.table());
    assert_eq!(loaded.metadata.episodes_trained, 1);
    assert_eq!(loaded.metadata.seed, Some(42));
}

#[test]
fn test_deterministic_training_with_seed() {
    let registry = duel_registry(3);
    let config = AgentConfig::new(DUEL_FORMAT).with_seed(42);

    let app1 = App::for_testing().build();
    let app2 = App::for_testing().build();
    let mut agent1 = app1.create_agent(config.clone(), &registry).unwrap();
    let mut agent2 = app2.create_agent(config, &registry).unwrap();

    for _ in 0..10 {
        let a = play_scripted(&mut agent1, &[[0, 0], [1, 0]], &[0, 1, 2], BattleOutcome::Lost);
        let b = play_scripted(&mut agent2, &[[0, 0], [1, 0]], &[0, 1, 2], BattleOutcome::Lost);
        assert_eq!(a, b);
    }
    assert_eq!(agent1.table(), agent2.table());
}

#[test]
fn test_history_accumulates_across_saves() {
    let app = App::for_testing()
        .with_repository(InMemoryRepository::new())
        .with_default_seed(1)
        .build();
    let registry = duel_registry(2);
    let path = Path::new("resumable");

    let mut agent = app
        .create_agent(AgentConfig::new(DUEL_FORMAT), &registry)
        .unwrap();
    for _ in 0..3 {
        play_scripted(&mut agent, &[[0, 0]], &[0, 1], BattleOutcome::Tie);
    }
    app.save_agent(&agent, &TrainingMetadata::default(), path)
        .unwrap();

    let mut loaded = app
        .load_agent(AgentConfig::new(DUEL_FORMAT), &registry, path)
        .unwrap();
    for _ in 0..2 {
        play_scripted(&mut loaded.agent, &[[0, 0]], &[0, 1], BattleOutcome::Tie);
    }
    app.save_agent(&loaded.agent, &loaded.metadata, path).unwrap();

    let reloaded = app
        .load_agent(AgentConfig::new(DUEL_FORMAT), &registry, path)
        .unwrap();
    assert_eq!(reloaded.metadata.episodes_trained, 5);
}

#[test]
fn test_reset_visit_counts_through_app() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("agent.msgpack");
    let app = App::for_testing()
        .with_repository(MsgPackRepository::new())
        .with_default_seed(9)
        .build();
    let registry = duel_registry(2);

    let mut agent = app
        .create_agent(AgentConfig::new(DUEL_FORMAT), &registry)
        .unwrap();
    play_scripted(&mut agent, &[[0, 0], [0, 1], [0, 2]], &[0, 1], BattleOutcome::Won);
    app.save_agent(&agent, &TrainingMetadata::default(), &path)
        .unwrap();

    assert_eq!(app.reset_visit_counts(&path).unwrap(), 3);
    let model = app.repository().load(&path).unwrap();
    assert_eq!(model.table.total_visits(), 0);
}

#[test]
fn test_unknown_format_lists_known_ones() {
    let app = App::new();
    let err = app
        .create_agent(AgentConfig::new("gen8randombattle"), &duel_registry(2))
        .err()
        .unwrap();
    match err {
        Error::UnsupportedFormat { format, known } => {
            assert_eq!(format, "gen8randombattle");
            assert_eq!(known, DUEL_FORMAT);
        }
        other => panic!("unexpected error: {other}"),
    }
}
