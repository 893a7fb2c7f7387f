//! Render a batch plan as an `INSERT OR IGNORE` script for the game database.

use chrono::{DateTime, Utc};
use screendle_core::{BatchPlan, ClassicAssignment, ScalesRound, format_date};

fn movie_ref(tmdb_id: i64) -> String {
    format!("(SELECT id FROM movies WHERE tmdb_id = {tmdb_id})")
}

pub fn classic_insert(a: &ClassicAssignment) -> String {
    format!(
        "INSERT OR IGNORE INTO daily_puzzles (date, movie_id, category) VALUES ('{}', {}, 'default');",
        format_date(a.date),
        movie_ref(a.movie)
    )
}

pub fn scales_insert(r: &ScalesRound) -> String {
    format!(
        "INSERT OR IGNORE INTO scales_rounds (date, round_number, movie_a_id, movie_b_id) VALUES ('{}', {}, {}, {});",
        format_date(r.date),
        r.round,
        movie_ref(r.movie_a),
        movie_ref(r.movie_b)
    )
}

pub fn render(plan: &BatchPlan, source: &str, generated_at: DateTime<Utc>) -> String {
    let mut lines = vec![
        "-- Screendle schedule".to_string(),
        format!("-- Generated: {}", generated_at.to_rfc3339()),
        format!(
            "-- Range: {} -> {} ({} days)",
            format_date(plan.span.start),
            format_date(plan.span.end),
            plan.span.len()
        ),
        format!("-- Lookback: {} days", plan.lookback),
        format!("-- Source: {source}"),
        String::new(),
        "-- Classic (daily_puzzles)".to_string(),
        String::new(),
    ];
    lines.extend(plan.classic_assignments().iter().map(classic_insert));

    lines.push(String::new());
    lines.push("-- Scales (scales_rounds)".to_string());
    lines.push(String::new());
    lines.extend(plan.scales_rounds().iter().map(scales_insert));

    let mut sql = lines.join("\n");
    sql.push('\n');
    sql
}
