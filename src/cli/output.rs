//! Output formatting for CLI

use crate::pipeline::TrainingResult;

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Print the outcome counts of a run
pub fn print_result(result: &TrainingResult) {
    print_kv("Episodes", &format_number(result.total_episodes));
    print_kv(
        "Wins",
        &format!("{} ({:.1}%)", result.wins, 100.0 * result.win_rate),
    );
    print_kv(
        "Ties",
        &format!("{} ({:.1}%)", result.ties, 100.0 * result.tie_rate),
    );
    print_kv(
        "Losses",
        &format!("{} ({:.1}%)", result.losses, 100.0 * result.loss_rate),
    );
    print_kv("Decisions", &format_number(result.decisions));
    print_kv("New states", &format_number(result.states_discovered));

    if !result.checkpoints.is_empty() {
        print_subsection("Checkpoints (frozen policy)");
        for checkpoint in &result.checkpoints {
            println!(
                "  after {:>8} episodes  win rate {:5.1}%  {} states",
                format_number(checkpoint.episodes),
                100.0 * checkpoint.win_rate,
                format_number(checkpoint.states)
            );
        }
    }
}
