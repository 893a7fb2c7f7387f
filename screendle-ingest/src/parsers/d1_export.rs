//! Result exports from the D1 database CLI.
//!
//! `wrangler d1 execute --file=...` prints banner text followed by a JSON
//! array of statement results:
//!
//!   [ { "results": [ {"tmdb_id": 155, ...}, ... ], "success": true, ... } ]
//!
//! Row shapes expected by the converters (column names as selected):
//! - movies:  `SELECT id, tmdb_id, title, imdb_rating FROM movies`
//! - classic: `SELECT dp.date, m.tmdb_id FROM daily_puzzles dp JOIN movies m ON m.id = dp.movie_id`
//! - scales:  `SELECT s.date, s.round_number, a.tmdb_id AS movie_a_tmdb_id, b.tmdb_id AS movie_b_tmdb_id
//!             FROM scales_rounds s JOIN movies a ON a.id = s.movie_a_id JOIN movies b ON b.id = s.movie_b_id`

use anyhow::{Context, Result, bail};
use regex::Regex;
use screendle_core::{CandidateMovie, ClassicAssignment, ScalesRound, parse_date};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::parsers::catalog_csv::parse_rating;
use crate::types::ParsedRows;

pub type Row = Map<String, Value>;

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    results: Vec<Row>,
}

/// Pull every result row out of raw CLI output.
pub fn extract_d1_rows(raw: &str) -> Result<Vec<Row>> {
    let array_re = Regex::new(r"(?s)\[.*\]")?;
    let Some(m) = array_re.find(raw) else {
        let preview: String = raw.chars().take(200).collect();
        bail!("D1 output contains no JSON array. Raw output: {preview}");
    };
    let statements: Vec<StatementResult> =
        serde_json::from_str(m.as_str()).context("parsing D1 JSON result")?;
    Ok(statements.into_iter().flat_map(|s| s.results).collect())
}

fn int_field(row: &Row, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| match row.get(*k)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn str_field<'a>(row: &'a Row, key: &str) -> Option<&'a str> {
    row.get(key).and_then(Value::as_str)
}

fn rating_field(row: &Row) -> Option<f64> {
    match row.get("imdb_rating")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_rating(s),
        _ => None,
    }
}

pub fn movies_from_rows(rows: &[Row]) -> ParsedRows<CandidateMovie> {
    let mut out = ParsedRows::default();
    for (i, row) in rows.iter().enumerate() {
        let Some(tmdb_id) = int_field(row, &["tmdb_id"]) else {
            out.skip(i + 1, "missing tmdb_id");
            continue;
        };
        out.records.push(CandidateMovie {
            catalog_id: int_field(row, &["id"]).unwrap_or(tmdb_id),
            external_id: tmdb_id,
            title: str_field(row, "title").unwrap_or_default().to_string(),
            rating: rating_field(row),
        });
    }
    out
}

pub fn classic_from_rows(rows: &[Row]) -> ParsedRows<ClassicAssignment> {
    let mut out = ParsedRows::default();
    for (i, row) in rows.iter().enumerate() {
        let date = str_field(row, "date").and_then(|s| parse_date(s).ok());
        let movie = int_field(row, &["tmdb_id", "movie_tmdb_id"]);
        match (date, movie) {
            (Some(date), Some(movie)) => out.records.push(ClassicAssignment { date, movie }),
            _ => out.skip(i + 1, "needs date and tmdb_id"),
        }
    }
    out
}

pub fn scales_from_rows(rows: &[Row]) -> ParsedRows<ScalesRound> {
    let mut out = ParsedRows::default();
    for (i, row) in rows.iter().enumerate() {
        let date = str_field(row, "date").and_then(|s| parse_date(s).ok());
        let round = int_field(row, &["round_number", "round"])
            .filter(|r| (1..=10).contains(r))
            .map(|r| r as u8);
        let movie_a = int_field(row, &["movie_a_tmdb_id", "movie_a"]);
        let movie_b = int_field(row, &["movie_b_tmdb_id", "movie_b"]);
        match (date, round, movie_a, movie_b) {
            (Some(date), Some(round), Some(movie_a), Some(movie_b)) => out.records.push(ScalesRound {
                date,
                round,
                movie_a,
                movie_b,
            }),
            _ => out.skip(i + 1, "needs date, round_number 1-10 and both movie ids"),
        }
    }
    out
}
