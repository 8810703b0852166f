//! CLI subcommands

pub mod evaluate;
pub mod export;
pub mod inspect;
pub mod reset_visits;
pub mod train;
